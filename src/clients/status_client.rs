use crate::model::{Driver, DriverId, DriverStatus, Restaurant, RestaurantId, RestaurantStatus};
use crate::status_actor::{StatusBoard, StatusCommand, StatusError, StatusOutput};
use reconcile_actor::{ActorClient, ResourceClient};
use tracing::{debug, instrument};

/// Client for the Actor Status Manager.
#[derive(Clone)]
pub struct StatusClient {
    inner: ResourceClient<StatusBoard>,
}

impl StatusClient {
    pub fn new(inner: ResourceClient<StatusBoard>) -> Self {
        Self { inner }
    }

    /// Self-service toggle for the signed-in driver.
    #[instrument(skip(self))]
    pub async fn set_own_status(&self, status: DriverStatus) -> Result<Driver, StatusError> {
        debug!("Sending request");
        match self.inner.send(StatusCommand::SetOwn(status)).await? {
            StatusOutput::Driver(driver) => Ok(driver),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn admin_set_driver_status(
        &self,
        driver_id: DriverId,
        status: DriverStatus,
    ) -> Result<Driver, StatusError> {
        debug!("Sending request");
        let command = StatusCommand::AdminSetDriver { driver_id, status };
        match self.inner.send(command).await? {
            StatusOutput::Driver(driver) => Ok(driver),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn admin_set_restaurant_status(
        &self,
        restaurant_id: RestaurantId,
        status: RestaurantStatus,
    ) -> Result<Restaurant, StatusError> {
        debug!("Sending request");
        let command = StatusCommand::AdminSetRestaurant {
            restaurant_id,
            status,
        };
        match self.inner.send(command).await? {
            StatusOutput::Restaurant(restaurant) => Ok(restaurant),
            other => Err(unexpected(other)),
        }
    }

    /// All drivers currently in `status`.
    #[instrument(skip(self))]
    pub async fn list_drivers(&self, status: DriverStatus) -> Result<Vec<Driver>, StatusError> {
        debug!("Sending request");
        match self.inner.send(StatusCommand::ListDrivers(status)).await? {
            StatusOutput::Drivers(drivers) => Ok(drivers),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(output: StatusOutput) -> StatusError {
    StatusError::UnexpectedOutput(format!("{output:?}"))
}

impl ActorClient<StatusBoard> for StatusClient {
    fn inner(&self) -> &ResourceClient<StatusBoard> {
        &self.inner
    }
}
