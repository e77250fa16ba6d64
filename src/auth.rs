use std::sync::OnceLock;

use crate::{
    database::EmployeeRepository,
    error::{AppError, AuthError},
    forms::{FieldError, RegisterForm},
    models::{hash_password, verify_password, Employee, NewEmployee},
};

static DUMMY_PASSWORD_HASH: OnceLock<String> = OnceLock::new();

/// Hash verified against when the email is unknown, so that path costs one
/// argon2 verification just like a wrong password does.
fn dummy_password_hash() -> Result<&'static str, AppError> {
    if let Some(hash) = DUMMY_PASSWORD_HASH.get() {
        return Ok(hash);
    }
    let hash = hash_password("unknown-account-placeholder")?;
    Ok(DUMMY_PASSWORD_HASH.get_or_init(|| hash))
}

#[derive(Debug, Clone)]
pub struct AuthService {
    employee_repository: EmployeeRepository,
}

impl AuthService {
    pub fn new(employee_repository: EmployeeRepository) -> Self {
        Self { employee_repository }
    }

    pub fn employees(&self) -> &EmployeeRepository {
        &self.employee_repository
    }

    /// Checks that neither the username nor the email is taken yet.
    ///
    /// This only gives the user a friendly message. Two concurrent
    /// registrations can both pass it; the UNIQUE constraints decide.
    pub async fn availability_errors(&self, form: &RegisterForm) -> Result<Vec<FieldError>, AppError> {
        let mut errors = Vec::new();

        if self
            .employee_repository
            .find_by_username(&form.username)
            .await?
            .is_some()
        {
            errors.push(FieldError::new(
                "username",
                "Username already exists! Please try a different username",
            ));
        }

        if self
            .employee_repository
            .find_by_email(&form.email)
            .await?
            .is_some()
        {
            errors.push(FieldError::new(
                "email",
                "Email address already exists! Please try a different email address",
            ));
        }

        Ok(errors)
    }

    /// Hashes the password and persists a new employee.
    pub async fn register(&self, form: &RegisterForm) -> Result<Employee, AppError> {
        let form = form.clone();
        let new_employee = tokio::task::spawn_blocking(move || {
            NewEmployee::new(
                form.username,
                form.email,
                form.first_name,
                form.last_name,
                &form.password,
            )
        })
        .await??;

        let employee = self.employee_repository.create_employee(new_employee).await?;
        tracing::info!("Registered employee {} ({})", employee.username, employee.id);
        Ok(employee)
    }

    /// Looks up the employee by email and verifies the password.
    ///
    /// An unknown email and a wrong password both yield
    /// `AuthError::InvalidCredentials`, and both run exactly one argon2
    /// verification.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Employee, AppError> {
        let employee = self.employee_repository.find_by_email(email).await?;

        let stored_hash = match &employee {
            Some(employee) => employee.password_hash.clone(),
            None => dummy_password_hash()?.to_string(),
        };
        let attempted_password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || {
            verify_password(&stored_hash, &attempted_password)
        })
        .await?;

        match employee {
            Some(employee) if matches => {
                tracing::info!("Employee {} authenticated", employee.id);
                Ok(employee)
            }
            Some(_) | None => {
                tracing::debug!("Credential check failed");
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }
}
