//! User document schema
//!
//! Stores account credentials and profile fields. The password is held
//! verbatim (see `auth::credentials`); it is stripped from every outbound
//! payload via `SanitizedUser`.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, Stamped};

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Account email, unique across all users, case-sensitive as stored
    pub email: String,

    /// Opaque credential, compared verbatim at login
    pub password: String,

    pub full_name: String,

    /// Open string set; no enumeration enforced
    #[serde(default = "default_role")]
    pub role: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

fn default_role() -> String {
    "developer".to_string()
}

impl UserDoc {
    /// Create a new user document; timestamps are stamped at insert
    pub fn new(email: String, password: String, full_name: String, role: String) -> Self {
        Self {
            id: None,
            email,
            password,
            full_name,
            role,
            created_at: None,
            updated_at: None,
        }
    }

    /// The outbound projection of this user, password stripped
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role.clone(),
            created_at: self
                .created_at
                .and_then(|d| d.try_to_rfc3339_string().ok()),
            updated_at: self
                .updated_at
                .and_then(|d| d.try_to_rfc3339_string().ok()),
        }
    }
}

/// User view returned to clients; never carries the password
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        // Unique index so concurrent registrations with the same email
        // resolve to a duplicate-key failure instead of two accounts
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl Stamped for UserDoc {
    fn stamp(&mut self, now: DateTime) {
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }
}
