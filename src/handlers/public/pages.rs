// handlers/public/pages.rs - GET /login and GET /register

use askama::Template;
use axum::{extract::Query, response::IntoResponse};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub link_sent: bool,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {}

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub sent: Option<String>,
}

/// `?sent=1` is where the magic-link form lands
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> impl IntoResponse {
    LoginTemplate {
        link_sent: query.sent.is_some(),
    }
}

pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_mentions_sent_link_only_when_asked() {
        let plain = LoginTemplate { link_sent: false }.render().unwrap();
        assert!(plain.contains("action=\"/auth/login\""));
        assert!(!plain.contains("Check your inbox"));

        let sent = LoginTemplate { link_sent: true }.render().unwrap();
        assert!(sent.contains("Check your inbox"));
    }
}
