//! SQLite employee store.
//!
//! The persistent backend for employee records. Every mutation runs inside a
//! transaction and re-verifies existence immediately before writing, so a
//! failed commit never leaves a partially-updated row.

use super::{Employee, EmployeeStatus, EmployeeStore, NewEmployee, Role};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

type EmployeeRow = (
    i64,
    String,
    String,
    String,
    Option<i64>,
    i64,
    String,
    String,
);

/// SQLite-backed employee store.
pub struct SqliteEmployeeStore {
    pool: SqlitePool,
}

impl SqliteEmployeeStore {
    /// Open (or create) the store at the given path.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Store(format!("failed to create database directory: {e}"))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| Error::Store(format!("invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Store(format!("failed to connect to SQLite: {e}")))?;

        let store = Self { pool };
        store.init_schema().await?;

        info!(path = %path.display(), "SQLite employee store initialized");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS employees (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL,
                manager_id INTEGER,
                salary INTEGER NOT NULL,
                status TEXT NOT NULL,
                location TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("failed to create employees table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_employees_email ON employees(email)")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Store(format!("failed to create email index: {e}")))?;

        debug!("SQLite employee schema initialized");
        Ok(())
    }

    fn from_row(row: EmployeeRow) -> Result<Employee> {
        let (id, name, email, role, manager_id, salary, status, location) = row;
        let status = EmployeeStatus::parse(&status)
            .ok_or_else(|| Error::Store(format!("invalid status for employee {id}: {status}")))?;
        Ok(Employee {
            id,
            name,
            email,
            role: Role::parse(&role),
            manager_id,
            salary,
            status,
            location,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, name, email, role, manager_id, salary, status, location FROM employees";

#[async_trait]
impl EmployeeStore for SqliteEmployeeStore {
    async fn get(&self, id: i64) -> Result<Option<Employee>> {
        let row: Option<EmployeeRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| Error::Store(format!("failed to get employee: {e}")))?;

        row.map(Self::from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let row: Option<EmployeeRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE email = ?"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| Error::Store(format!("failed to look up email: {e}")))?;

        row.map(Self::from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Employee>> {
        let rows: Vec<EmployeeRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| Error::Store(format!("failed to list employees: {e}")))?;

        rows.into_iter().map(Self::from_row).collect()
    }

    async fn insert(&self, new: NewEmployee) -> Result<Employee> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Store(format!("failed to begin transaction: {e}")))?;

        let result = sqlx::query(
            r#"
            INSERT INTO employees (name, email, role, manager_id, salary, status, location)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(new.role.as_str())
        .bind(new.manager_id)
        .bind(new.salary)
        .bind(new.status.as_str())
        .bind(&new.location)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Store(format!("failed to insert employee: {e}")))?;

        let id = result.last_insert_rowid();

        tx.commit()
            .await
            .map_err(|e| Error::Store(format!("failed to commit insert: {e}")))?;

        debug!(employee_id = id, email = %new.email, "employee inserted");
        Ok(Employee {
            id,
            name: new.name,
            email: new.email,
            role: new.role,
            manager_id: new.manager_id,
            salary: new.salary,
            status: new.status,
            location: new.location,
        })
    }

    async fn update(&self, employee: &Employee) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Store(format!("failed to begin transaction: {e}")))?;

        // Re-verify existence inside the transaction
        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM employees WHERE id = ?")
            .bind(employee.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| Error::Store(format!("failed to check employee: {e}")))?;

        if exists.is_none() {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE employees
            SET name = ?, email = ?, role = ?, manager_id = ?, salary = ?, status = ?, location = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(employee.role.as_str())
        .bind(employee.manager_id)
        .bind(employee.salary)
        .bind(employee.status.as_str())
        .bind(&employee.location)
        .bind(employee.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Store(format!("failed to update employee: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| Error::Store(format!("failed to commit update: {e}")))?;

        debug!(employee_id = employee.id, "employee updated");
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Store(format!("failed to begin transaction: {e}")))?;

        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Store(format!("failed to delete employee: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| Error::Store(format!("failed to commit delete: {e}")))?;

        let deleted = result.rows_affected() > 0;
        debug!(employee_id = id, deleted = deleted, "employee delete attempted");
        Ok(deleted)
    }

    async fn count(&self) -> Result<usize> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Store(format!("failed to count employees: {e}")))?;

        Ok(row.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (SqliteEmployeeStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_employees.db");
        let store = SqliteEmployeeStore::new(&db_path).await.unwrap();
        (store, temp_dir)
    }

    fn new_employee(name: &str, email: &str, role: Role) -> NewEmployee {
        NewEmployee {
            name: name.to_string(),
            email: email.to_string(),
            role,
            manager_id: None,
            salary: 100_000,
            status: EmployeeStatus::Active,
            location: "Seattle".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_get_round_trip() {
        let (store, _temp) = create_test_store().await;

        let emp = store
            .insert(new_employee("Mark Jensen", "mark.jensen@company.com", Role::Hr))
            .await
            .unwrap();

        let loaded = store.get(emp.id).await.unwrap().unwrap();
        assert_eq!(loaded, emp);
        assert_eq!(loaded.role, Role::Hr);
        assert_eq!(loaded.status, EmployeeStatus::Active);
    }

    #[tokio::test]
    async fn test_unique_email_enforced() {
        let (store, _temp) = create_test_store().await;

        store
            .insert(new_employee("A", "dup@company.com", Role::Employee))
            .await
            .unwrap();
        let result = store
            .insert(new_employee("B", "dup@company.com", Role::Employee))
            .await;
        assert!(result.is_err());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_ascending_and_find_by_email() {
        let (store, _temp) = create_test_store().await;

        let a = store
            .insert(new_employee("A", "a@company.com", Role::Employee))
            .await
            .unwrap();
        let b = store
            .insert(new_employee("B", "b@company.com", Role::Manager))
            .await
            .unwrap();

        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        assert!(a.id < b.id);

        let found = store.find_by_email("b@company.com").await.unwrap().unwrap();
        assert_eq!(found.id, b.id);
    }

    #[tokio::test]
    async fn test_update_missing_record_returns_false() {
        let (store, _temp) = create_test_store().await;

        let mut emp = store
            .insert(new_employee("A", "a@company.com", Role::Employee))
            .await
            .unwrap();
        store.delete(emp.id).await.unwrap();

        emp.location = "London".to_string();
        assert!(!store.update(&emp).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_on_missing() {
        let (store, _temp) = create_test_store().await;

        let emp = store
            .insert(new_employee("A", "a@company.com", Role::Employee))
            .await
            .unwrap();
        assert!(store.delete(emp.id).await.unwrap());
        assert!(!store.delete(emp.id).await.unwrap());
        assert!(store.get(emp.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_role_survives_round_trip() {
        let (store, _temp) = create_test_store().await;

        // Parse falls back to Unknown rather than erroring; authorization
        // denies Unknown everywhere.
        let emp = store
            .insert(NewEmployee {
                role: Role::Unknown,
                ..new_employee("X", "x@company.com", Role::Employee)
            })
            .await
            .unwrap();
        let loaded = store.get(emp.id).await.unwrap().unwrap();
        assert_eq!(loaded.role, Role::Unknown);
    }
}
