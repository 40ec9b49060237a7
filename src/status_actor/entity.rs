//! [`ActorEntity`] implementation for [`StatusBoard`].
//!
//! Every status change is optimistic: the requested value is displayed at once, marked
//! pending, and replaced by the server's answer or reverted to the prior value when the
//! call fails. Changes to the same driver or restaurant queue behind each other so the
//! value captured for a revert is always a settled one.

use crate::api::{ApiError, OrderingApi, Session};
use crate::model::{
    Driver, DriverId, DriverStatus, Restaurant, RestaurantId, RestaurantStatus, Role,
};
use crate::status_actor::StatusError;
use reconcile_actor::{ActorEntity, Lane, Step};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

pub type StatusContext = (Arc<dyn OrderingApi>, Session);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKey {
    /// The signed-in driver's own status.
    Own,
    Driver(DriverId),
    Restaurant(RestaurantId),
}

impl Display for StatusKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusKey::Own => f.write_str("own"),
            StatusKey::Driver(id) => id.fmt(f),
            StatusKey::Restaurant(id) => id.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCommand {
    SetOwn(DriverStatus),
    AdminSetDriver {
        driver_id: DriverId,
        status: DriverStatus,
    },
    AdminSetRestaurant {
        restaurant_id: RestaurantId,
        status: RestaurantStatus,
    },
    ListDrivers(DriverStatus),
}

pub enum StatusReply {
    Own {
        previous: Option<DriverStatus>,
        result: Result<Driver, ApiError>,
    },
    Driver {
        driver_id: DriverId,
        previous: Option<DriverStatus>,
        result: Result<Driver, ApiError>,
    },
    Restaurant {
        restaurant_id: RestaurantId,
        previous: Option<RestaurantStatus>,
        result: Result<Restaurant, ApiError>,
    },
    Drivers(Result<Vec<Driver>, ApiError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutput {
    Driver(Driver),
    Restaurant(Restaurant),
    Drivers(Vec<Driver>),
}

/// A status as shown to the user. `pending` is true while a change is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Displayed<S> {
    pub status: S,
    pub pending: bool,
}

impl<S> Displayed<S> {
    fn settled(status: S) -> Self {
        Self {
            status,
            pending: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub own: Option<Displayed<DriverStatus>>,
    pub drivers: BTreeMap<DriverId, Displayed<DriverStatus>>,
    pub restaurants: BTreeMap<RestaurantId, Displayed<RestaurantStatus>>,
    pub last_error: Option<String>,
}

impl StatusSnapshot {
    pub fn driver(&self, id: DriverId) -> Option<DriverStatus> {
        self.drivers.get(&id).map(|d| d.status)
    }

    pub fn restaurant(&self, id: RestaurantId) -> Option<RestaurantStatus> {
        self.restaurants.get(&id).map(|r| r.status)
    }
}

/// Working copy of every status this session has seen or changed.
#[derive(Debug, Default)]
pub struct StatusBoard {
    view: StatusSnapshot,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, error: ApiError) -> Step<Self> {
        self.view.last_error = Some(error.to_string());
        Step::err(error)
    }
}

fn require(session: &Session, role: Role, action: &'static str) -> Result<(), StatusError> {
    if !session.is_authenticated() {
        return Err(StatusError::NotAuthenticated);
    }
    if session.role != role {
        return Err(StatusError::Forbidden {
            role: session.role,
            action,
        });
    }
    Ok(())
}

/// Shows `status` as pending and returns the settled value it replaced.
fn flip<K: Ord, S: Copy>(map: &mut BTreeMap<K, Displayed<S>>, key: K, status: S) -> Option<S> {
    map.insert(
        key,
        Displayed {
            status,
            pending: true,
        },
    )
    .map(|previous| previous.status)
}

fn revert<K: Ord, S>(map: &mut BTreeMap<K, Displayed<S>>, key: K, previous: Option<S>) {
    match previous {
        Some(status) => {
            map.insert(key, Displayed::settled(status));
        }
        None => {
            map.remove(&key);
        }
    }
}

impl ActorEntity for StatusBoard {
    type Key = StatusKey;
    type Command = StatusCommand;
    type Reply = StatusReply;
    type Output = StatusOutput;
    type Error = StatusError;
    type Context = StatusContext;
    type Snapshot = StatusSnapshot;

    fn lane(command: &StatusCommand) -> Lane<StatusKey> {
        match command {
            StatusCommand::SetOwn(_) => Lane::queue(StatusKey::Own),
            StatusCommand::AdminSetDriver { driver_id, .. } => {
                Lane::queue(StatusKey::Driver(*driver_id))
            }
            StatusCommand::AdminSetRestaurant { restaurant_id, .. } => {
                Lane::queue(StatusKey::Restaurant(*restaurant_id))
            }
            StatusCommand::ListDrivers(_) => Lane::Free,
        }
    }

    fn begin(&mut self, command: StatusCommand, (api, session): &StatusContext) -> Step<Self> {
        let api = api.clone();
        let session = session.clone();

        match command {
            StatusCommand::SetOwn(status) => {
                if let Err(e) = require(&session, Role::Driver, "change a driver's own status") {
                    return Step::err(e);
                }
                let previous = self.view.own.map(|own| own.status);
                self.view.own = Some(Displayed {
                    status,
                    pending: true,
                });
                self.view.last_error = None;
                Step::remote(async move {
                    let result = api.set_driver_status(&session, status).await;
                    StatusReply::Own { previous, result }
                })
            }
            StatusCommand::AdminSetDriver { driver_id, status } => {
                if let Err(e) = require(&session, Role::Admin, "override a driver's status") {
                    return Step::err(e);
                }
                let previous = flip(&mut self.view.drivers, driver_id, status);
                self.view.last_error = None;
                Step::remote(async move {
                    let result = api
                        .admin_set_driver_status(&session, driver_id, status)
                        .await;
                    StatusReply::Driver {
                        driver_id,
                        previous,
                        result,
                    }
                })
            }
            StatusCommand::AdminSetRestaurant {
                restaurant_id,
                status,
            } => {
                if let Err(e) = require(&session, Role::Admin, "override a restaurant's status") {
                    return Step::err(e);
                }
                let previous = flip(&mut self.view.restaurants, restaurant_id, status);
                self.view.last_error = None;
                Step::remote(async move {
                    let result = api
                        .admin_set_restaurant_status(&session, restaurant_id, status)
                        .await;
                    StatusReply::Restaurant {
                        restaurant_id,
                        previous,
                        result,
                    }
                })
            }
            StatusCommand::ListDrivers(status) => {
                if !session.is_authenticated() {
                    return Step::err(StatusError::NotAuthenticated);
                }
                Step::remote(async move {
                    StatusReply::Drivers(api.list_drivers(&session, status).await)
                })
            }
        }
    }

    fn resume(&mut self, reply: StatusReply, _ctx: &StatusContext) -> Step<Self> {
        match reply {
            StatusReply::Own { previous, result } => match result {
                Ok(driver) => {
                    self.view.own = Some(Displayed::settled(driver.status));
                    self.view
                        .drivers
                        .insert(driver.id, Displayed::settled(driver.status));
                    Step::ok(StatusOutput::Driver(driver))
                }
                Err(e) => {
                    self.view.own = previous.map(Displayed::settled);
                    self.fail(e)
                }
            },
            StatusReply::Driver {
                driver_id,
                previous,
                result,
            } => match result {
                Ok(driver) => {
                    self.view
                        .drivers
                        .insert(driver.id, Displayed::settled(driver.status));
                    Step::ok(StatusOutput::Driver(driver))
                }
                Err(e) => {
                    revert(&mut self.view.drivers, driver_id, previous);
                    self.fail(e)
                }
            },
            StatusReply::Restaurant {
                restaurant_id,
                previous,
                result,
            } => match result {
                Ok(restaurant) => {
                    self.view
                        .restaurants
                        .insert(restaurant.id, Displayed::settled(restaurant.status));
                    Step::ok(StatusOutput::Restaurant(restaurant))
                }
                Err(e) => {
                    revert(&mut self.view.restaurants, restaurant_id, previous);
                    self.fail(e)
                }
            },
            StatusReply::Drivers(result) => match result {
                Ok(drivers) => {
                    for driver in &drivers {
                        // An in-flight change owns its entry until it settles.
                        let pending = self
                            .view
                            .drivers
                            .get(&driver.id)
                            .is_some_and(|shown| shown.pending);
                        if !pending {
                            self.view
                                .drivers
                                .insert(driver.id, Displayed::settled(driver.status));
                        }
                    }
                    Step::ok(StatusOutput::Drivers(drivers))
                }
                Err(e) => Step::err(e),
            },
        }
    }

    fn snapshot(&self) -> StatusSnapshot {
        self.view.clone()
    }
}
