use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};
use uuid::Uuid;

use crate::{
    error::{AppError, AuthError},
    flash::Flash,
    models::{Employee, SessionData},
};

// Session keys
const USER_SESSION_KEY: &str = "user_session";
const FLASHES_KEY: &str = "_flashes";
const CSRF_TOKEN_KEY: &str = "csrf_token";

pub const SESSION_COOKIE_NAME: &str = "department_session";

#[derive(Debug, Clone)]
pub struct SessionManager {
    store: MemoryStore,
    secure: bool,
}

impl SessionManager {
    pub fn new(secure: bool) -> Self {
        Self {
            store: MemoryStore::default(),
            secure,
        }
    }

    pub fn layer(&self) -> SessionManagerLayer<MemoryStore> {
        SessionManagerLayer::new(self.store.clone())
            .with_secure(self.secure)
            .with_same_site(tower_sessions::cookie::SameSite::Lax)
            .with_http_only(true)
            .with_name(SESSION_COOKIE_NAME)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(false)
    }
}

fn session_error(action: &str, e: tower_sessions::session::Error) -> AppError {
    tracing::error!("Failed to {}: {}", action, e);
    AppError::Auth(AuthError::InvalidSession)
}

/// Session helpers for the authenticated identity, flash queue and CSRF token.
pub trait SessionExt {
    async fn get_user_session(&self) -> Result<Option<SessionData>, AppError>;
    async fn set_user_session(&self, employee: &Employee) -> Result<(), AppError>;
    async fn clear_user_session(&self) -> Result<(), AppError>;
    async fn push_flash(&self, flash: Flash) -> Result<(), AppError>;
    async fn take_flashes(&self) -> Result<Vec<Flash>, AppError>;
    async fn get_csrf_token(&self) -> Result<Option<String>, AppError>;
    async fn ensure_csrf_token(&self) -> Result<String, AppError>;
}

impl SessionExt for Session {
    async fn get_user_session(&self) -> Result<Option<SessionData>, AppError> {
        self.get::<SessionData>(USER_SESSION_KEY)
            .await
            .map_err(|e| session_error("get user session", e))
    }

    /// Marks the session as authenticated. The session id is rotated first so
    /// an identifier issued before login cannot be reused afterwards.
    async fn set_user_session(&self, employee: &Employee) -> Result<(), AppError> {
        self.cycle_id()
            .await
            .map_err(|e| session_error("cycle session id", e))?;

        self.insert(USER_SESSION_KEY, SessionData::from(employee))
            .await
            .map_err(|e| session_error("set user session", e))?;

        tracing::info!("User session created for employee ID: {}", employee.id);
        Ok(())
    }

    async fn clear_user_session(&self) -> Result<(), AppError> {
        self.remove::<SessionData>(USER_SESSION_KEY)
            .await
            .map_err(|e| session_error("clear user session", e))?;

        tracing::info!("User session cleared");
        Ok(())
    }

    async fn push_flash(&self, flash: Flash) -> Result<(), AppError> {
        let mut flashes = self
            .get::<Vec<Flash>>(FLASHES_KEY)
            .await
            .map_err(|e| session_error("read flashes", e))?
            .unwrap_or_default();
        flashes.push(flash);

        self.insert(FLASHES_KEY, flashes)
            .await
            .map_err(|e| session_error("store flash", e))
    }

    async fn take_flashes(&self) -> Result<Vec<Flash>, AppError> {
        let flashes = self
            .remove::<Vec<Flash>>(FLASHES_KEY)
            .await
            .map_err(|e| session_error("take flashes", e))?;

        Ok(flashes.unwrap_or_default())
    }

    async fn get_csrf_token(&self) -> Result<Option<String>, AppError> {
        self.get::<String>(CSRF_TOKEN_KEY)
            .await
            .map_err(|e| session_error("get CSRF token", e))
    }

    async fn ensure_csrf_token(&self) -> Result<String, AppError> {
        if let Some(token) = self.get_csrf_token().await? {
            return Ok(token);
        }

        let token = Uuid::new_v4().simple().to_string();
        self.insert(CSRF_TOKEN_KEY, token.clone())
            .await
            .map_err(|e| session_error("set CSRF token", e))?;
        Ok(token)
    }
}

/// Extractor for login-required routes.
///
/// Anonymous requests are rejected with a redirect to the login page that
/// carries the original path in `next`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub session_data: SessionData,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Auth(AuthError::InvalidSession))?;

        match session.get_user_session().await? {
            Some(session_data) => Ok(AuthenticatedUser { session_data }),
            None => {
                session
                    .push_flash(Flash::info("Please log in to access this page."))
                    .await?;
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|path| path.as_str().to_string());
                Err(AppError::Auth(AuthError::LoginRequired { next }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use axum_test::{TestServer, TestServerConfig};

    async fn push_handler(session: Session) -> Result<&'static str, AppError> {
        session.push_flash(Flash::success("first")).await?;
        session.push_flash(Flash::danger("second")).await?;
        Ok("pushed")
    }

    async fn take_handler(session: Session) -> Result<String, AppError> {
        let flashes = session.take_flashes().await?;
        Ok(flashes
            .into_iter()
            .map(|flash| format!("{}:{}", flash.category.as_str(), flash.message))
            .collect::<Vec<_>>()
            .join(","))
    }

    async fn csrf_handler(session: Session) -> Result<String, AppError> {
        session.ensure_csrf_token().await
    }

    async fn protected_handler(user: AuthenticatedUser) -> String {
        user.session_data.username
    }

    fn test_server() -> TestServer {
        let app = Router::new()
            .route("/push", get(push_handler))
            .route("/take", get(take_handler))
            .route("/csrf", get(csrf_handler))
            .route("/protected", get(protected_handler))
            .layer(SessionManager::default().layer());

        let config = TestServerConfig {
            save_cookies: true,
            ..TestServerConfig::default()
        };
        TestServer::new_with_config(app, config).unwrap()
    }

    #[tokio::test]
    async fn test_flashes_are_consumed_once_in_order() {
        let server = test_server();

        server.get("/push").await;

        let first = server.get("/take").await;
        assert_eq!(first.text(), "success:first,danger:second");

        let second = server.get("/take").await;
        assert_eq!(second.text(), "");
    }

    #[tokio::test]
    async fn test_csrf_token_is_stable_per_session() {
        let server = test_server();

        let first = server.get("/csrf").await.text();
        let second = server.get("/csrf").await.text();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_anonymous_request_to_protected_route_is_redirected() {
        let server = test_server();

        let response = server.get("/protected").await;
        assert_eq!(response.status_code(), axum::http::StatusCode::FOUND);
        let location = response.headers().get("location").unwrap().to_str().unwrap();
        assert_eq!(location, "/login?next=%2Fprotected");

        let flashes = server.get("/take").await;
        assert_eq!(flashes.text(), "info:Please log in to access this page.");
    }

    #[test]
    fn test_session_manager_layer() {
        let _layer = SessionManager::new(true).layer();
    }
}
