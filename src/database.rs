use sqlx::{sqlite::SqlitePool, migrate::MigrateDatabase, Sqlite};
use crate::{models::{Employee, NewEmployee}, error::AppError};

const EMPLOYEE_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, created_at";

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            tracing::info!("Creating database {}", database_url);
            Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Inserts the employee and reads it back inside one transaction.
    ///
    /// Duplicate usernames or emails fail on the table's UNIQUE constraints
    /// and surface as `AppError::Database`.
    pub async fn create_employee(&self, employee: NewEmployee) -> Result<Employee, AppError> {
        let now = chrono::Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO employees (username, email, first_name, last_name, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&employee.username)
        .bind(&employee.email)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(employee.password_hash())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let employee_id = result.last_insert_rowid();

        let created = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
        ))
        .bind(employee_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let database_url = format!("sqlite:{}", temp_dir.path().join("test.db").display());
        let db = Database::new(&database_url).await.unwrap();
        (db, temp_dir)
    }

    fn new_employee(username: &str, email: &str) -> NewEmployee {
        NewEmployee::new(
            username.to_string(),
            email.to_string(),
            "Test".to_string(),
            "User".to_string(),
            "Secret1!",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_employee() {
        let (db, _dir) = setup_test_db().await;
        let repo = EmployeeRepository::new(db.pool().clone());

        let created = repo
            .create_employee(new_employee("alice", "a@x.com"))
            .await
            .unwrap();
        assert!(created.id > 0);
        assert_eq!(created.username, "alice");
        assert_eq!(created.email, "a@x.com");
        assert_eq!(created.first_name, "Test");
        assert_eq!(created.last_name, "User");
        assert!(created.check_password("Secret1!"));

        let by_email = repo.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_username = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_username.id, created.id);

        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_find_nonexistent_employee() {
        let (db, _dir) = setup_test_db().await;
        let repo = EmployeeRepository::new(db.pool().clone());

        assert!(repo.find_by_email("nobody@x.com").await.unwrap().is_none());
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
        assert!(repo.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let (db, _dir) = setup_test_db().await;
        let repo = EmployeeRepository::new(db.pool().clone());

        repo.create_employee(new_employee("alice", "a@x.com"))
            .await
            .unwrap();

        let result = repo.create_employee(new_employee("alice2", "a@x.com")).await;
        assert!(matches!(result, Err(AppError::Database(_))));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_unique_username_constraint() {
        let (db, _dir) = setup_test_db().await;
        let repo = EmployeeRepository::new(db.pool().clone());

        repo.create_employee(new_employee("alice", "a@x.com"))
            .await
            .unwrap();

        let result = repo.create_employee(new_employee("alice", "b@x.com")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_password_hash_is_persisted_not_plaintext() {
        let (db, _dir) = setup_test_db().await;
        let repo = EmployeeRepository::new(db.pool().clone());

        repo.create_employee(new_employee("alice", "a@x.com"))
            .await
            .unwrap();

        let stored: String =
            sqlx::query_scalar("SELECT password_hash FROM employees WHERE email = ?")
                .bind("a@x.com")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_ne!(stored, "Secret1!");
        assert!(stored.starts_with("$argon2"));
    }
}
