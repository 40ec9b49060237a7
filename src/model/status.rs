use crate::model::{DriverId, RestaurantId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Whether a driver is accepting deliveries. There is no in-between value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Online,
    Offline,
}

impl DriverStatus {
    pub fn toggled(self) -> Self {
        match self {
            DriverStatus::Online => DriverStatus::Offline,
            DriverStatus::Offline => DriverStatus::Online,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DriverStatus::Online => "online",
            DriverStatus::Offline => "offline",
        }
    }
}

impl Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a restaurant is accepting orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestaurantStatus {
    Active,
    Inactive,
}

impl Display for RestaurantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RestaurantStatus::Active => "active",
            RestaurantStatus::Inactive => "inactive",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    pub status: DriverStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub status: RestaurantStatus,
}
