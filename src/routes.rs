use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{
        account_handler, home_handler, login_handler, login_page_handler, logout_handler,
        register_handler, register_page_handler, AppState,
    },
    session::SessionManager,
};

/// Builds the application router with session and tracing layers applied.
pub fn app(state: AppState, session_manager: &SessionManager) -> Router {
    Router::new()
        .route("/", get(home_handler))
        // Authentication routes (public)
        .route("/register", get(register_page_handler).post(register_handler))
        .route("/login", get(login_page_handler).post(login_handler))
        // Protected routes (require authentication)
        .route("/logout", get(logout_handler))
        .route("/account", get(account_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(session_manager.layer()),
        )
}
