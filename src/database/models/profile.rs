use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::ProviderUser;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpsert {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&ProviderUser> for ProfileUpsert {
    fn from(user: &ProviderUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name(),
            avatar_url: user.avatar_url(),
        }
    }
}

/// What to do when the profile already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    KeepExisting,
    Overwrite,
}
