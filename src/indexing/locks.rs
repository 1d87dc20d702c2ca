use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use sea_orm::{ConnectionTrait, DbBackend, DbErr, Statement};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async lock per vehicle, so the route and nearby builders of a vehicle
/// never overlap within this process. Writers in other processes (the
/// `build_indexes` binary) are kept out by [`lock_vehicle_index`].
#[derive(Clone, Default)]
pub struct IndexLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl IndexLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other index job holds `vehicle_id`.
    pub async fn acquire(&self, vehicle_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(vehicle_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop the lock entry of a deleted vehicle.
    pub fn forget(&self, vehicle_id: Uuid) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.remove(&vehicle_id);
    }
}

/// Advisory lock key of a vehicle: the high half of its UUID.
pub fn advisory_key(vehicle_id: Uuid) -> i64 {
    let (high, _) = vehicle_id.as_u64_pair();
    high as i64
}

/// Takes the vehicle's Postgres advisory lock for the rest of the
/// transaction `txn` runs in. Other backends have no such lock.
pub async fn lock_vehicle_index<C: ConnectionTrait>(
    txn: &C,
    vehicle_id: Uuid,
) -> Result<(), DbErr> {
    if txn.get_database_backend() != DbBackend::Postgres {
        return Ok(());
    }
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock($1)",
        [advisory_key(vehicle_id).into()],
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_vehicle_is_serialized() {
        let locks = IndexLocks::new();
        let vehicle = Uuid::new_v4();

        let guard = locks.acquire(vehicle).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(vehicle)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.acquire(vehicle)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_vehicles_do_not_block() {
        let locks = IndexLocks::new();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(Uuid::new_v4())).await;
        assert!(b.is_ok());
    }

    #[test]
    fn test_advisory_key_is_stable_per_vehicle() {
        let id = Uuid::parse_str("0000000000000001ffffffffffffffff").unwrap();
        assert_eq!(advisory_key(id), 1);

        let other = Uuid::parse_str("8000000000000000ffffffffffffffff").unwrap();
        assert_eq!(advisory_key(other), i64::MIN);
        assert_eq!(advisory_key(other), advisory_key(other));
    }
}
