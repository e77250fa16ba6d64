use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use askama::Template;
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    auth::AuthService,
    error::{AppError, AuthError},
    flash::Flash,
    forms::{csrf_error, FieldError, LoginForm, RegisterForm},
    session::{AuthenticatedUser, SessionExt},
    templates::{AccountTemplate, HomeTemplate, LoginTemplate, RegisterTemplate},
};

const HOME_ROUTE: &str = "/";

// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub auth_service: AuthService,
}

// Query parameters for the login page
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// 302 Found redirect.
pub fn found(uri: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, uri.to_string())]).into_response()
}

/// Only same-site absolute paths are accepted as post-login targets.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|next| {
        next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\")
    })
}

async fn render_register(session: &Session, form: RegisterForm) -> Result<Response, AppError> {
    let template = RegisterTemplate {
        flashes: session.take_flashes().await?,
        current_user: session.get_user_session().await?,
        csrf_token: session.ensure_csrf_token().await?,
        form,
    };
    Ok(Html(template.render()?).into_response())
}

async fn render_login(
    session: &Session,
    email: String,
    next: Option<String>,
) -> Result<Response, AppError> {
    let template = LoginTemplate {
        flashes: session.take_flashes().await?,
        current_user: session.get_user_session().await?,
        csrf_token: session.ensure_csrf_token().await?,
        email,
        next,
    };
    Ok(Html(template.render()?).into_response())
}

pub async fn home_handler(session: Session) -> Result<impl IntoResponse, AppError> {
    let template = HomeTemplate {
        flashes: session.take_flashes().await?,
        current_user: session.get_user_session().await?,
    };
    Ok(Html(template.render()?))
}

pub async fn register_page_handler(session: Session) -> Result<Response, AppError> {
    render_register(&session, RegisterForm::default()).await
}

pub async fn register_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let expected_token = session.get_csrf_token().await?;
    let mut errors: Vec<FieldError> = csrf_error(expected_token.as_deref(), &form.csrf_token)
        .into_iter()
        .chain(form.field_errors())
        .collect();

    if errors.is_empty() {
        errors = state.auth_service.availability_errors(&form).await?;
    }

    if !errors.is_empty() {
        tracing::debug!("Registration rejected with {} invalid field(s)", errors.len());
        for error in &errors {
            session
                .push_flash(Flash::danger(format!(
                    "There was an error with creating a user: {}",
                    error.joined()
                )))
                .await?;
        }
        return render_register(&session, form.without_secrets()).await;
    }

    let employee = state.auth_service.register(&form).await?;
    session.set_user_session(&employee).await?;
    session
        .push_flash(Flash::success(format!(
            "Account created successfully! You are now logged in as {}",
            employee.username
        )))
        .await?;

    Ok(found(HOME_ROUTE))
}

pub async fn login_page_handler(
    Query(query): Query<LoginQuery>,
    session: Session,
) -> Result<Response, AppError> {
    render_login(&session, String::new(), query.next).await
}

pub async fn login_handler(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let expected_token = session.get_csrf_token().await?;
    let errors: Vec<FieldError> = csrf_error(expected_token.as_deref(), &form.csrf_token)
        .into_iter()
        .chain(form.field_errors())
        .collect();

    if !errors.is_empty() {
        for error in &errors {
            session
                .push_flash(Flash::danger(format!(
                    "There was an error with logging in: {}",
                    error.joined()
                )))
                .await?;
        }
        return render_login(&session, form.email, query.next).await;
    }

    let result = state.auth_service.authenticate(&form.email, &form.password).await;
    match result {
        Ok(employee) => {
            session.set_user_session(&employee).await?;
            session
                .push_flash(Flash::success(format!(
                    "Success! You are logged in as: {}",
                    employee.email
                )))
                .await?;

            let target = safe_next(query.next.as_deref()).unwrap_or(HOME_ROUTE);
            Ok(found(target))
        }
        Err(AppError::Auth(AuthError::InvalidCredentials)) => {
            session
                .push_flash(Flash::danger(
                    "Email and password do not match! Please try again!",
                ))
                .await?;
            render_login(&session, form.email, query.next).await
        }
        Err(e) => Err(e),
    }
}

// Protected route handlers
pub async fn account_handler(
    authenticated_user: AuthenticatedUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let employee_id = authenticated_user.session_data.employee_id;

    let Some(employee) = state.auth_service.employees().find_by_id(employee_id).await? else {
        tracing::warn!("Session refers to missing employee {}", employee_id);
        session.clear_user_session().await?;
        return Err(AuthError::LoginRequired {
            next: Some("/account".to_string()),
        }
        .into());
    };

    let template = AccountTemplate {
        flashes: session.take_flashes().await?,
        current_user: Some(authenticated_user.session_data),
        employee,
    };
    Ok(Html(template.render()?).into_response())
}

pub async fn logout_handler(
    authenticated_user: AuthenticatedUser,
    session: Session,
) -> Result<Response, AppError> {
    session.clear_user_session().await?;
    session
        .push_flash(Flash::info("You have been logged out!"))
        .await?;

    tracing::info!(
        "Employee {} logged out",
        authenticated_user.session_data.employee_id
    );
    Ok(found(HOME_ROUTE))
}
