//! Registration and login forms.
//!
//! Fields default to empty strings so a partially submitted form fails
//! validation instead of being rejected by the extractor.

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub messages: Vec<String>,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            messages: vec![message.into()],
        }
    }

    pub fn joined(&self) -> String {
        self.messages.join(" ")
    }
}

/// Collects validator errors in the order the form declares its fields.
fn collect_errors(errors: &ValidationErrors, fields: &[&'static str]) -> Vec<FieldError> {
    let field_errors = errors.field_errors();
    fields
        .iter()
        .filter_map(|field| {
            let errors = field_errors.get(*field)?;
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({}).", error.code),
                })
                .collect();
            Some(FieldError {
                field: *field,
                messages,
            })
        })
        .collect()
}

/// Checks a submitted CSRF token against the one stored in the session.
pub fn csrf_error(expected: Option<&str>, submitted: &str) -> Option<FieldError> {
    if submitted.is_empty() {
        return Some(FieldError::new("csrf_token", "The CSRF token is missing."));
    }
    match expected {
        Some(expected) if expected == submitted => None,
        _ => Some(FieldError::new("csrf_token", "The CSRF token does not match.")),
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(length(min = 2, max = 30, message = "Username must be between 2 and 30 characters."))]
    pub username: String,

    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters."))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters."))]
    pub last_name: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub password_confirm: String,

    pub csrf_token: String,
}

impl RegisterForm {
    pub const FIELDS: [&'static str; 6] = [
        "username",
        "email",
        "first_name",
        "last_name",
        "password",
        "password_confirm",
    ];

    pub fn field_errors(&self) -> Vec<FieldError> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => collect_errors(&errors, &Self::FIELDS),
        }
    }

    /// Copy of the form safe to echo back into a re-rendered page.
    pub fn without_secrets(&self) -> Self {
        Self {
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,

    pub csrf_token: String,
}

impl LoginForm {
    pub const FIELDS: [&'static str; 2] = ["email", "password"];

    pub fn field_errors(&self) -> Vec<FieldError> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => collect_errors(&errors, &Self::FIELDS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_register_form() -> RegisterForm {
        RegisterForm {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            password: "Secret1!".to_string(),
            password_confirm: "Secret1!".to_string(),
            csrf_token: "token".to_string(),
        }
    }

    #[test]
    fn test_valid_register_form() {
        assert!(valid_register_form().field_errors().is_empty());
    }

    #[test]
    fn test_register_form_reports_fields_in_declaration_order() {
        let form = RegisterForm {
            username: "a".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            password_confirm: "different".to_string(),
            ..valid_register_form()
        };

        let errors = form.field_errors();
        let fields: Vec<_> = errors.iter().map(|error| error.field).collect();
        assert_eq!(fields, vec!["username", "email", "password", "password_confirm"]);
        assert_eq!(errors[0].joined(), "Username must be between 2 and 30 characters.");
        assert_eq!(errors[3].joined(), "Passwords must match.");
    }

    #[test]
    fn test_empty_register_form_fails_every_field() {
        let form: RegisterForm = serde_json::from_str("{}").unwrap();
        let errors = form.field_errors();
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().all(|error| error.field != "password_confirm"));
    }

    #[test]
    fn test_without_secrets_drops_passwords() {
        let form = valid_register_form().without_secrets();
        assert_eq!(form.username, "alice");
        assert!(form.password.is_empty());
        assert!(form.password_confirm.is_empty());
        assert!(form.csrf_token.is_empty());
    }

    #[test]
    fn test_login_form_validation() {
        let form = LoginForm {
            email: "a@x.com".to_string(),
            password: "Secret1!".to_string(),
            csrf_token: "token".to_string(),
        };
        assert!(form.field_errors().is_empty());

        let form = LoginForm::default();
        let fields: Vec<_> = form.field_errors().iter().map(|error| error.field).collect();
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[test]
    fn test_csrf_error() {
        assert_eq!(csrf_error(Some("abc"), "abc"), None);
        assert_eq!(
            csrf_error(Some("abc"), "").unwrap().joined(),
            "The CSRF token is missing."
        );
        assert_eq!(
            csrf_error(Some("abc"), "abd").unwrap().joined(),
            "The CSRF token does not match."
        );
        assert_eq!(
            csrf_error(None, "abc").unwrap().joined(),
            "The CSRF token does not match."
        );
    }
}
