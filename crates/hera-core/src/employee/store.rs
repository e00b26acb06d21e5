//! Employee store trait and the in-memory backend.
//!
//! The store is an abstract keyed record store with all-or-nothing commits.
//! `MemoryEmployeeStore` is for development and tests; `SqliteEmployeeStore`
//! is the persistent backend.

use super::{Employee, NewEmployee};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Abstract employee record store.
///
/// Mutations are each a single all-or-nothing commit. Implementations
/// re-verify existence inside the commit, so a failed commit never leaves a
/// partially-updated record.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Fetch one record by id.
    async fn get(&self, id: i64) -> Result<Option<Employee>>;

    /// Fetch one record by its unique email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>>;

    /// All records in ascending id order.
    ///
    /// The planner depends on this ordering: entity resolution picks the
    /// first match by id, deterministically.
    async fn list(&self) -> Result<Vec<Employee>>;

    /// Insert a new record and return it with its assigned id.
    async fn insert(&self, new: NewEmployee) -> Result<Employee>;

    /// Replace the full row for `employee.id`. Returns false if the record
    /// no longer exists.
    async fn update(&self, employee: &Employee) -> Result<bool>;

    /// Delete one record. Returns false if the record no longer exists.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize>;
}

struct MemoryInner {
    records: BTreeMap<i64, Employee>,
    next_id: i64,
}

/// In-memory employee store for development and tests.
pub struct MemoryEmployeeStore {
    inner: RwLock<MemoryInner>,
}

impl Default for MemoryEmployeeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEmployeeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                records: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn get(&self, id: i64) -> Result<Option<Employee>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let inner = self.inner.read().await;
        Ok(inner.records.values().find(|e| e.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<Employee>> {
        let inner = self.inner.read().await;
        // BTreeMap iteration is already ascending by id
        Ok(inner.records.values().cloned().collect())
    }

    async fn insert(&self, new: NewEmployee) -> Result<Employee> {
        let mut inner = self.inner.write().await;
        if inner.records.values().any(|e| e.email == new.email) {
            return Err(Error::Store(format!(
                "email already exists: {}",
                new.email
            )));
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let employee = Employee {
            id,
            name: new.name,
            email: new.email,
            role: new.role,
            manager_id: new.manager_id,
            salary: new.salary,
            status: new.status,
            location: new.location,
        };
        inner.records.insert(id, employee.clone());
        Ok(employee)
    }

    async fn update(&self, employee: &Employee) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if !inner.records.contains_key(&employee.id) {
            return Ok(false);
        }
        inner.records.insert(employee.id, employee.clone());
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.records.remove(&id).is_some())
    }

    async fn count(&self) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner.records.len())
    }
}
