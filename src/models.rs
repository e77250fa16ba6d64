use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Serialize)]
pub struct Employee {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Compares an attempted password against the stored argon2 hash.
    pub fn check_password(&self, attempted_password: &str) -> bool {
        verify_password(&self.password_hash, attempted_password)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Debug for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Employee")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for Employee {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;

        let created_at_str: String = row.try_get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "created_at".to_string(),
                source: Box::new(e),
            })?
            .with_timezone(&Utc);

        Ok(Employee {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            password_hash: row.try_get("password_hash")?,
            created_at,
        })
    }
}

/// An employee that has not been persisted yet. The plaintext password is
/// hashed when the value is built and is never kept.
#[derive(Clone)]
pub struct NewEmployee {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    password_hash: String,
}

impl NewEmployee {
    pub fn new(
        username: String,
        email: String,
        first_name: String,
        last_name: String,
        password: &str,
    ) -> Result<Self, argon2::password_hash::Error> {
        Ok(Self {
            username,
            email,
            first_name,
            last_name,
            password_hash: hash_password(password)?,
        })
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

impl fmt::Debug for NewEmployee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewEmployee")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

/// Verifies a plaintext against a PHC hash string.
///
/// A stored value that is not a valid PHC string never matches.
pub fn verify_password(password_hash: &str, attempted_password: &str) -> bool {
    let parsed_hash = match PasswordHash::new(password_hash) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Stored password hash is malformed: {}", e);
            return false;
        }
    };
    Argon2::default()
        .verify_password(attempted_password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionData {
    pub employee_id: i64,
    pub username: String,
    pub email: String,
}

impl From<&Employee> for SessionData {
    fn from(employee: &Employee) -> Self {
        Self {
            employee_id: employee.id,
            username: employee.username.clone(),
            email: employee.email.clone(),
        }
    }
}
