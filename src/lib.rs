pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod flash;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod session;
pub mod templates;

pub use config::{Config, ConfigError};
pub use error::{AppError, AuthError};
pub use database::{Database, EmployeeRepository};
pub use auth::AuthService;
pub use flash::{Flash, FlashCategory};
pub use forms::{LoginForm, RegisterForm};
pub use models::{Employee, NewEmployee, SessionData};
pub use routes::app;
pub use session::{AuthenticatedUser, SessionExt, SessionManager};
pub use handlers::{
    account_handler, home_handler, login_handler, login_page_handler, logout_handler,
    register_handler, register_page_handler, AppState,
};
