//! Sample employee roster.

use crate::employee::{EmployeeStatus, EmployeeStore, NewEmployee, Role};
use crate::error::Result;
use tracing::info;

/// Populate the store with the sample roster.
///
/// Idempotent: a non-empty store is left untouched. Records are inserted in
/// roster order so ids are assigned 1..=12 on a fresh store.
pub async fn seed_employees(store: &dyn EmployeeStore) -> Result<()> {
    if store.count().await? > 0 {
        info!("employees already seeded, skipping");
        return Ok(());
    }

    let roster: [(&str, &str, Role, Option<i64>, i64, EmployeeStatus, &str); 12] = [
        // HR
        ("Anita Rao", "anita.rao@company.com", Role::Hr, None, 180_000, EmployeeStatus::Active, "Bangalore"),
        ("Mark Jensen", "mark.jensen@company.com", Role::Hr, None, 190_000, EmployeeStatus::Active, "New York"),
        // Managers
        ("Ravi Mehta", "ravi.mehta@company.com", Role::Manager, Some(1), 150_000, EmployeeStatus::Active, "Bangalore"),
        ("Susan Lee", "susan.lee@company.com", Role::Manager, Some(2), 155_000, EmployeeStatus::Active, "San Francisco"),
        ("Daniel Kim", "daniel.kim@company.com", Role::Manager, Some(2), 145_000, EmployeeStatus::Active, "Seattle"),
        // Reports
        ("Priya Nair", "priya.nair@company.com", Role::Employee, Some(3), 90_000, EmployeeStatus::Active, "Bangalore"),
        ("Arjun Patel", "arjun.patel@company.com", Role::Employee, Some(3), 95_000, EmployeeStatus::Active, "Bangalore"),
        ("Neha Sharma", "neha.sharma@company.com", Role::Employee, Some(4), 105_000, EmployeeStatus::Active, "San Francisco"),
        ("Kevin Brown", "kevin.brown@company.com", Role::Employee, Some(4), 100_000, EmployeeStatus::Active, "San Francisco"),
        ("Emily Chen", "emily.chen@company.com", Role::Employee, Some(5), 98_000, EmployeeStatus::Active, "Seattle"),
        ("Michael Torres", "michael.torres@company.com", Role::Employee, Some(5), 102_000, EmployeeStatus::Active, "Seattle"),
        // Terminated employee kept as an edge case
        ("John Miller", "john.miller@company.com", Role::Employee, Some(3), 92_000, EmployeeStatus::Terminated, "Bangalore"),
    ];

    for (name, email, role, manager_id, salary, status, location) in roster {
        store
            .insert(NewEmployee {
                name: name.to_string(),
                email: email.to_string(),
                role,
                manager_id,
                salary,
                status,
                location: location.to_string(),
            })
            .await?;
    }

    info!(count = 12, "seeded sample employees");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::employee::MemoryEmployeeStore;

    #[tokio::test]
    async fn test_seed_assigns_expected_ids() {
        let store = MemoryEmployeeStore::new();
        seed_employees(&store).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 12);

        let anita = store.get(1).await.unwrap().unwrap();
        assert_eq!(anita.name, "Anita Rao");
        assert_eq!(anita.role, Role::Hr);

        let priya = store.get(6).await.unwrap().unwrap();
        assert_eq!(priya.name, "Priya Nair");
        assert_eq!(priya.manager_id, Some(3));

        let john = store.get(12).await.unwrap().unwrap();
        assert_eq!(john.status, EmployeeStatus::Terminated);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryEmployeeStore::new();
        seed_employees(&store).await.unwrap();
        seed_employees(&store).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 12);
    }
}
