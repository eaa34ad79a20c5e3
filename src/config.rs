//! Configuration for Taskgate
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Default signing secret, matching the development fallback of the
/// deployments this service replaces. Never use in production.
pub const DEV_SECRET_KEY: &str = "your-secret-key-here";

/// Taskgate - token-gated task management backend
#[derive(Parser, Debug, Clone)]
#[command(name = "taskgate")]
#[command(about = "JWT-authenticated task management API backed by MongoDB")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URL", default_value = "mongodb://localhost:27017")]
    pub mongodb_url: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB_NAME", default_value = "task_management")]
    pub mongodb_db_name: String,

    /// Secret key for token signing. Defaults to an insecure development
    /// value; set explicitly in any real deployment.
    #[arg(long, env = "SECRET_KEY", default_value = DEV_SECRET_KEY)]
    pub secret_key: String,

    /// Access token lifetime in minutes, used at login
    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES", default_value = "30")]
    pub access_token_expire_minutes: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Whether the signing secret is still the insecure development default
    pub fn using_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.secret_key.is_empty() {
            return Err("SECRET_KEY must not be empty".to_string());
        }
        if self.access_token_expire_minutes == 0 {
            return Err("ACCESS_TOKEN_EXPIRE_MINUTES must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_from(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("parse args")
    }

    #[test]
    fn test_defaults() {
        let args = args_from(&["taskgate"]);
        assert_eq!(args.mongodb_db_name, "task_management");
        assert_eq!(args.access_token_expire_minutes, 30);
        assert!(args.using_dev_secret());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_explicit_secret_not_flagged() {
        let args = args_from(&["taskgate", "--secret-key", "s3cr3t"]);
        assert!(!args.using_dev_secret());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let args = args_from(&["taskgate", "--access-token-expire-minutes", "0"]);
        assert!(args.validate().is_err());
    }
}
