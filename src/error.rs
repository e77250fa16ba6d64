use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::handlers::found;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Login required")]
    LoginRequired { next: Option<String> },

    #[error("Email and password do not match")]
    InvalidCredentials,

    #[error("Invalid session")]
    InvalidSession,
}

impl AuthError {
    pub fn login_redirect_target(next: Option<&str>) -> String {
        match next {
            Some(next) => format!("/login?next={}", urlencoding::encode(next)),
            None => "/login".to_string(),
        }
    }
}

fn internal_error(error: &'static str, message: &'static str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": error,
            "message": message,
        })),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Auth(AuthError::LoginRequired { ref next }) => {
                tracing::warn!("Authentication required, redirecting to login");
                found(&AuthError::login_redirect_target(next.as_deref()))
            }

            AppError::Auth(AuthError::InvalidSession) => {
                tracing::warn!("Invalid session, redirecting to login");
                found("/login")
            }

            // Handlers recover from this locally; reaching here means a handler forgot to.
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!("Unhandled credential mismatch, redirecting to login");
                found("/login")
            }

            AppError::Database(ref db_error) => {
                tracing::error!("Database error: {}", db_error);
                internal_error("Database error", "A database error occurred. Please try again later.")
            }

            AppError::Template(ref template_error) => {
                tracing::error!("Template error: {}", template_error);
                internal_error("Template error", "A page rendering error occurred.")
            }

            AppError::Task(ref join_error) => {
                tracing::error!("Background task failed: {}", join_error);
                internal_error("Internal error", "Failed to process the request.")
            }

            AppError::Migration(ref migration_error) => {
                tracing::error!("Migration error: {}", migration_error);
                internal_error("Database migration error", "Database initialization failed.")
            }

            AppError::PasswordHash(ref hash_error) => {
                tracing::error!("Password hashing error: {}", hash_error);
                internal_error("Password hashing error", "Failed to process credentials.")
            }
        }
    }
}
