//! Taskgate - token-gated task management backend
//!
//! Taskgate fronts a MongoDB document store with a small authenticated
//! HTTP API: account registration/login, JWT issuance, and task CRUD in
//! which every non-public operation executes under a verified identity.
//!
//! ## Components
//!
//! - **Token codec** (`auth::jwt`): HS256-signed, expiring access tokens
//! - **Authenticator** (`routes::auth_routes`): register/login against the
//!   users collection
//! - **Verifier** (`auth::verifier`): bearer-token guard in front of every
//!   protected operation
//! - **Task service** (`routes::tasks`): creator-attributed CRUD

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ApiError, Result};
