//! Driver and restaurant availability, with optimistic toggles.

pub mod entity;
pub mod error;

pub use entity::*;
pub use error::*;

use crate::clients::StatusClient;
use reconcile_actor::ResourceActor;

/// Creates a new status actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<StatusBoard>, StatusClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, StatusBoard::new());
    (actor, StatusClient::new(generic_client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, OrderingApi};
    use crate::model::{DriverId, DriverStatus, RestaurantId, RestaurantStatus};
    use crate::sandbox::{fixtures, Endpoint, SandboxBackend};
    use reconcile_actor::ActorClient;
    use std::sync::Arc;
    use std::time::Duration;

    fn spawn(backend: &Arc<SandboxBackend>, session: crate::api::Session) -> StatusClient {
        let (actor, client) = new(8);
        let api: Arc<dyn OrderingApi> = backend.clone();
        tokio::spawn(actor.run((api, session)));
        client
    }

    #[tokio::test]
    async fn test_driver_goes_online() {
        let backend = Arc::new(SandboxBackend::seeded());
        let client = spawn(&backend, fixtures::driver());

        let driver = client.set_own_status(DriverStatus::Online).await.unwrap();

        assert_eq!(driver.status, DriverStatus::Online);
        let own = client.snapshot().own.unwrap();
        assert_eq!(own.status, DriverStatus::Online);
        assert!(!own.pending);
        assert_eq!(
            backend.driver(fixtures::DRIVER).unwrap().status,
            DriverStatus::Online
        );
    }

    #[tokio::test]
    async fn test_rejected_toggle_reverts_to_prior_value() {
        let backend = Arc::new(SandboxBackend::seeded().with_latency(Duration::from_millis(30)));
        let client = spawn(&backend, fixtures::driver());
        client.set_own_status(DriverStatus::Online).await.unwrap();

        backend.fail_next(
            Endpoint::SetDriverStatus,
            ApiError::rejected(409, "finish your delivery first"),
        );
        let mut watcher = client.subscribe();
        let toggle = {
            let client = client.clone();
            tokio::spawn(async move { client.set_own_status(DriverStatus::Offline).await })
        };

        // The flip shows up before the server answers.
        let shown = watcher
            .wait_for(|s| s.own.is_some_and(|own| own.pending))
            .await
            .unwrap()
            .own
            .unwrap();
        assert_eq!(shown.status, DriverStatus::Offline);

        let err = toggle.await.unwrap().unwrap_err();
        assert_eq!(
            err,
            StatusError::Api(ApiError::rejected(409, "finish your delivery first"))
        );
        let snapshot = client.snapshot();
        assert_eq!(snapshot.own.unwrap().status, DriverStatus::Online);
        assert!(!snapshot.own.unwrap().pending);
        assert_eq!(
            snapshot.last_error.as_deref(),
            Some("finish your delivery first")
        );
    }

    #[tokio::test]
    async fn test_failed_admin_override_on_unknown_status_leaves_nothing_behind() {
        let backend = Arc::new(SandboxBackend::seeded());
        let client = spawn(&backend, fixtures::admin());

        backend.fail_next(
            Endpoint::AdminSetRestaurantStatus,
            ApiError::Network("connection reset".into()),
        );
        let err = client
            .admin_set_restaurant_status(RestaurantId(1), RestaurantStatus::Inactive)
            .await
            .unwrap_err();

        assert!(matches!(err, StatusError::Api(ApiError::Network(_))));
        assert_eq!(client.snapshot().restaurant(RestaurantId(1)), None);
        assert_eq!(
            backend.restaurant(RestaurantId(1)).unwrap().status,
            RestaurantStatus::Active
        );
    }

    #[tokio::test]
    async fn test_admin_override_reverts_prior_driver_status() {
        let backend = Arc::new(SandboxBackend::seeded());
        let client = spawn(&backend, fixtures::admin());
        let driver = DriverId(32);

        client
            .admin_set_driver_status(driver, DriverStatus::Online)
            .await
            .unwrap();
        backend.fail_next(
            Endpoint::AdminSetDriverStatus,
            ApiError::rejected(500, "database unavailable"),
        );
        client
            .admin_set_driver_status(driver, DriverStatus::Offline)
            .await
            .unwrap_err();

        assert_eq!(client.snapshot().driver(driver), Some(DriverStatus::Online));
    }

    #[tokio::test]
    async fn test_roles_are_checked_before_any_call() {
        let backend = Arc::new(SandboxBackend::seeded());
        let client = spawn(&backend, fixtures::customer());

        let err = client
            .admin_set_driver_status(DriverId(31), DriverStatus::Online)
            .await
            .unwrap_err();

        assert!(matches!(err, StatusError::Forbidden { .. }));
        assert_eq!(backend.calls(Endpoint::AdminSetDriverStatus), 0);
    }

    #[tokio::test]
    async fn test_toggles_on_one_driver_apply_in_order() {
        let backend = Arc::new(SandboxBackend::seeded().with_latency(Duration::from_millis(10)));
        let client = spawn(&backend, fixtures::admin());
        let driver = DriverId(31);

        let first = client.admin_set_driver_status(driver, DriverStatus::Online);
        let second = client.admin_set_driver_status(driver, DriverStatus::Offline);
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap().status, DriverStatus::Online);
        assert_eq!(second.unwrap().status, DriverStatus::Offline);
        assert_eq!(client.snapshot().driver(driver), Some(DriverStatus::Offline));
        assert_eq!(backend.driver(driver).unwrap().status, DriverStatus::Offline);
    }

    #[tokio::test]
    async fn test_list_drivers_filters_by_status() {
        let backend = Arc::new(SandboxBackend::seeded());
        let admin = spawn(&backend, fixtures::admin());
        admin
            .admin_set_driver_status(DriverId(32), DriverStatus::Online)
            .await
            .unwrap();

        let online = admin.list_drivers(DriverStatus::Online).await.unwrap();
        let offline = admin.list_drivers(DriverStatus::Offline).await.unwrap();

        assert_eq!(online.iter().map(|d| d.id).collect::<Vec<_>>(), vec![DriverId(32)]);
        assert!(offline.iter().all(|d| d.status == DriverStatus::Offline));
        assert_eq!(admin.snapshot().driver(DriverId(31)), Some(DriverStatus::Offline));
    }
}
