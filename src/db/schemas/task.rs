//! Task document schema
//!
//! `created_by` is always the verified caller's subject claim, never a
//! client-supplied value. Assignee and creator ids are plain strings with
//! no referential check against the users collection.

use bson::{oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, Stamped};

/// Collection name for tasks
pub const TASK_COLLECTION: &str = "tasks";

/// Task document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TaskDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_priority")]
    pub priority: String,

    #[serde(default = "default_status")]
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    /// Subject claim of the creating caller, immutable after creation
    pub created_by: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

fn default_priority() -> String {
    "medium".to_string()
}

fn default_status() -> String {
    "todo".to_string()
}

impl TaskDoc {
    /// The outbound projection of this task
    pub fn view(&self) -> TaskView {
        TaskView {
            id: self.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority.clone(),
            status: self.status.clone(),
            due_date: self.due_date.clone(),
            assignee_id: self.assignee_id.clone(),
            created_by: self.created_by.clone(),
            tags: self.tags.clone(),
            created_at: self
                .created_at
                .and_then(|d| d.try_to_rfc3339_string().ok()),
            updated_at: self
                .updated_at
                .and_then(|d| d.try_to_rfc3339_string().ok()),
        }
    }
}

/// Task view returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    pub created_by: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl IntoIndexes for TaskDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![]
    }
}

impl Stamped for TaskDoc {
    fn stamp(&mut self, now: DateTime) {
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }
}
