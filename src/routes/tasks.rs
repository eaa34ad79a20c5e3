//! HTTP routes for task CRUD
//!
//! Every endpoint requires a verified bearer token. Authentication is the
//! only gate: any authenticated caller may read or mutate any task, and
//! ownership is recorded (`created_by`) but never enforced.

use bson::{doc, oid::ObjectId, DateTime, Document};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::{authenticate, Claims};
use crate::db::schemas::{TaskDoc, TaskView, TASK_COLLECTION};
use crate::routes::{
    cors_preflight, error_response, json_response, parse_json_body, BoxBody, ErrorResponse,
};
use crate::server::AppState;
use crate::types::ApiError;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_priority() -> String {
    "medium".to_string()
}

fn default_status() -> String {
    "todo".to_string()
}

/// Partial update: only submitted (non-null) fields are applied
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    pub assignee_id: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl TaskUpdateRequest {
    /// Build the `$set` document: every submitted field plus a fresh
    /// `updated_at`, which is refreshed even when nothing else changed.
    fn into_set_document(self, now: DateTime) -> Document {
        let mut set = doc! { "updated_at": now };
        if let Some(title) = self.title {
            set.insert("title", title);
        }
        if let Some(description) = self.description {
            set.insert("description", description);
        }
        if let Some(priority) = self.priority {
            set.insert("priority", priority);
        }
        if let Some(status) = self.status {
            set.insert("status", status);
        }
        if let Some(due_date) = self.due_date {
            set.insert("due_date", due_date);
        }
        if let Some(assignee_id) = self.assignee_id {
            set.insert("assignee_id", assignee_id);
        }
        if let Some(tags) = self.tags {
            set.insert("tags", tags);
        }
        set
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub data: Vec<TaskView>,
    pub total: u64,
    pub skip: u64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub status: &'static str,
    pub data: TaskView,
}

#[derive(Debug, Serialize)]
pub struct TaskDataResponse {
    pub data: TaskView,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Pagination parameters for listing
#[derive(Debug, PartialEq)]
struct ListQuery {
    skip: u64,
    limit: i64,
}

impl ListQuery {
    fn from_query_string(query: Option<&str>) -> Self {
        let mut params = Self { skip: 0, limit: 10 };

        if let Some(q) = query {
            for pair in q.split('&') {
                if let Some((key, value)) = pair.split_once('=') {
                    let value = urlencoding::decode(value).unwrap_or_default();
                    match key {
                        "skip" => params.skip = value.parse().unwrap_or(0),
                        "limit" => params.limit = value.parse().unwrap_or(10),
                        _ => {}
                    }
                }
            }
        }

        params
    }
}

// =============================================================================
// Endpoint Handlers
// =============================================================================

/// GET /tasks - List tasks with pagination and total count
async fn handle_list(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    _claims: Claims,
) -> Result<Response<BoxBody>, ApiError> {
    let params = ListQuery::from_query_string(req.uri().query());

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;

    let page = tasks.find_page(doc! {}, params.skip, params.limit).await?;
    let total = tasks.count(doc! {}).await?;

    Ok(json_response(
        StatusCode::OK,
        &TaskListResponse {
            data: page.iter().map(TaskDoc::view).collect(),
            total,
            skip: params.skip,
            limit: params.limit,
        },
    ))
}

/// POST /tasks - Create a task attributed to the caller
async fn handle_create(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    claims: Claims,
) -> Result<Response<BoxBody>, ApiError> {
    let body: TaskCreateRequest = parse_json_body(req).await?;

    if body.title.is_empty() {
        return Err(ApiError::BadRequest("Missing required field: title".into()));
    }

    // Creator always comes from the verified identity, never the body
    let created_by = claims.sub.unwrap_or_default();

    let mut task = TaskDoc {
        id: None,
        title: body.title,
        description: body.description,
        priority: body.priority,
        status: body.status,
        due_date: body.due_date,
        assignee_id: body.assignee_id,
        created_by,
        tags: body.tags,
        created_at: None,
        updated_at: None,
    };

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    let inserted_id = tasks.insert_one(&mut task).await?;
    task.id = Some(inserted_id);

    info!("Created task {} by {}", inserted_id.to_hex(), task.created_by);

    Ok(json_response(
        StatusCode::OK,
        &TaskResponse {
            status: "success",
            data: task.view(),
        },
    ))
}

/// GET /tasks/{id}
async fn handle_get(
    state: Arc<AppState>,
    task_id: &str,
) -> Result<Response<BoxBody>, ApiError> {
    let oid = parse_task_id(task_id)?;

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    let task = tasks
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    Ok(json_response(StatusCode::OK, &TaskDataResponse { data: task.view() }))
}

/// PUT /tasks/{id} - Apply submitted fields, refresh updated_at
async fn handle_update(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    task_id: &str,
) -> Result<Response<BoxBody>, ApiError> {
    let oid = parse_task_id(task_id)?;
    let body: TaskUpdateRequest = parse_json_body(req).await?;

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;

    let set = body.into_set_document(DateTime::now());
    let result = tasks
        .update_one(doc! { "_id": oid }, doc! { "$set": set })
        .await?;

    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Task"));
    }

    // Re-read so the response reflects the stored document
    let task = tasks
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    Ok(json_response(
        StatusCode::OK,
        &TaskResponse {
            status: "success",
            data: task.view(),
        },
    ))
}

/// DELETE /tasks/{id}
async fn handle_delete(
    state: Arc<AppState>,
    task_id: &str,
) -> Result<Response<BoxBody>, ApiError> {
    let oid = parse_task_id(task_id)?;

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    let result = tasks.delete_one(doc! { "_id": oid }).await?;

    if result.deleted_count == 0 {
        return Err(ApiError::NotFound("Task"));
    }

    info!("Deleted task {}", task_id);

    Ok(json_response(
        StatusCode::OK,
        &DeleteResponse {
            status: "success",
            message: "Task deleted",
        },
    ))
}

fn parse_task_id(task_id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(task_id).map_err(|_| ApiError::BadRequest("Invalid task ID".into()))
}

// =============================================================================
// Main Router
// =============================================================================

/// Handle /tasks requests.
///
/// Returns Some(response) if the request was handled, None if not a tasks
/// route.
pub async fn handle_tasks_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method().clone();

    if path != "/tasks" && !path.starts_with("/tasks/") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    // Every task operation runs under a verified identity
    let claims = match authenticate(req.headers(), &state.codec) {
        Ok(c) => c,
        Err(e) => return Some(error_response(&e)),
    };

    let subpath = path
        .strip_prefix("/tasks")
        .unwrap_or("")
        .trim_start_matches('/')
        .to_string();

    let response = match (method, subpath.as_str()) {
        (Method::GET, "") => handle_list(req, state, claims).await,
        (Method::POST, "") => handle_create(req, state, claims).await,

        (Method::GET, id) if !id.contains('/') => handle_get(state, id).await,
        (Method::PUT, id) if !id.contains('/') => handle_update(req, state, id).await,
        (Method::DELETE, id) if !id.contains('/') => handle_delete(state, id).await,

        (_, id) if !id.contains('/') => Ok(json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse {
                error: "Method not allowed".into(),
                code: None,
            },
        )),

        _ => Ok(json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                error: "Not found".into(),
                code: None,
            },
        )),
    };

    Some(response.unwrap_or_else(|e| error_response(&e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let params = ListQuery::from_query_string(None);
        assert_eq!(params, ListQuery { skip: 0, limit: 10 });
    }

    #[test]
    fn test_list_query_parsing() {
        let params = ListQuery::from_query_string(Some("skip=20&limit=5"));
        assert_eq!(params, ListQuery { skip: 20, limit: 5 });
    }

    #[test]
    fn test_list_query_garbage_falls_back() {
        let params = ListQuery::from_query_string(Some("skip=abc&limit="));
        assert_eq!(params, ListQuery { skip: 0, limit: 10 });
    }

    #[test]
    fn test_set_document_includes_only_submitted_fields() {
        let update = TaskUpdateRequest {
            status: Some("done".to_string()),
            ..Default::default()
        };
        let set = update.into_set_document(DateTime::now());

        assert!(set.contains_key("status"));
        assert!(set.contains_key("updated_at"));
        assert!(!set.contains_key("title"));
        assert!(!set.contains_key("description"));
        assert!(!set.contains_key("tags"));
    }

    #[test]
    fn test_set_document_always_refreshes_updated_at() {
        let set = TaskUpdateRequest::default().into_set_document(DateTime::now());
        assert_eq!(set.len(), 1);
        assert!(set.contains_key("updated_at"));
    }

    #[test]
    fn test_create_request_defaults() {
        let body: TaskCreateRequest = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        assert_eq!(body.priority, "medium");
        assert_eq!(body.status, "todo");
        assert!(body.tags.is_empty());
        assert!(body.description.is_none());
    }

    #[test]
    fn test_update_request_null_fields_ignored() {
        let body: TaskUpdateRequest =
            serde_json::from_str(r#"{"title":null,"status":"done"}"#).unwrap();
        assert!(body.title.is_none());
        assert_eq!(body.status.as_deref(), Some("done"));
    }

    #[test]
    fn test_parse_task_id() {
        assert!(parse_task_id("64f0c1a2b3d4e5f6a7b8c9d0").is_ok());
        assert!(matches!(
            parse_task_id("nope"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
