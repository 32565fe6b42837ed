mod common;

use axum::body::Body;
use axum::http::{header, StatusCode};
use common::*;
use serde_json::json;
use tenant_portal::database::models::MembershipRole;

#[tokio::test]
async fn profile_is_null_until_saved() {
    let app = TestApp::development();
    let (user, token) = app.auth.add_user("ana@acme.test");

    let response = app
        .send(
            get("/api/user/profile")
                .header(header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(read_json(response).await["data"]["profile"], serde_json::Value::Null);

    let response = app
        .send(
            post("/api/user/profile")
                .header(header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["profile"]["id"], user.id.to_string());
    assert_eq!(body["data"]["profile"]["email"], "ana@acme.test");
    assert_eq!(body["data"]["profile"]["is_super_admin"], false);
}

#[tokio::test]
async fn memberships_list_embeds_tenants_oldest_first() {
    let app = TestApp::development();
    let (user, token) = app.auth.add_user("ana@acme.test");
    app.tenant_with_member(&user, "acme", None, MembershipRole::Owner).await;
    app.tenant_with_member(&user, "globex", Some("globex.io"), MembershipRole::Member).await;

    let response = app
        .send(
            get("/api/user/memberships")
                .header(header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_status(&response, StatusCode::OK);
    let body = read_json(response).await;
    let memberships = body["data"]["memberships"].as_array().unwrap();
    assert_eq!(memberships.len(), 2);
    assert_eq!(memberships[0]["role"], "owner");
    assert_eq!(memberships[0]["tenant"]["slug"], "acme");
    assert_eq!(memberships[1]["tenant"], json!({
        "id": memberships[1]["tenant_id"],
        "name": "globex",
        "slug": "globex",
        "domain": "globex.io"
    }));
}

#[tokio::test]
async fn dashboard_without_tenant_goes_to_onboarding() {
    let app = TestApp::development();
    let (_, token) = app.auth.add_user("ana@acme.test");

    let response = app
        .send(
            get("/dashboard")
                .header(header::COOKIE, format!("sb-access-token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_status(&response, StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/onboarding"));
}

#[tokio::test]
async fn dashboard_renders_tenant_of_first_membership() {
    let app = TestApp::development();
    let (user, token) = app.auth.add_user("ana@acme.test");
    let tenant = app.tenant_with_member(&user, "acme", None, MembershipRole::Owner).await;

    let response = app
        .send(
            get("/dashboard")
                .header(header::COOKIE, format!("sb-access-token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_status(&response, StatusCode::OK);
    assert!(cookie_named(&response, "tenant_slug").is_some());
    let html = read_text(response).await;
    assert!(html.contains(&format!("<h1>{}</h1>", tenant.name)));
}

#[tokio::test]
async fn onboarding_renders_tenant_form() {
    let app = TestApp::development();
    let (_, token) = app.auth.add_user("ana@acme.test");

    let response = app
        .send(
            get("/onboarding")
                .header(header::COOKIE, format!("sb-access-token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_status(&response, StatusCode::OK);
    assert!(read_text(response).await.contains("action=\"/api/tenants\""));
}
