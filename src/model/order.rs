use crate::model::{CartItem, CustomerId, DriverId, OrderId, RestaurantId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The canonical order statuses, in lifecycle order.
///
/// `Completed` is terminal. There is no rejected or cancelled status in the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Ready,
    Delivering,
    Completed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Ready,
        OrderStatus::Delivering,
        OrderStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Completed => "completed",
        }
    }

    /// The next status in the normal flow, `None` once terminal.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Accepted),
            OrderStatus::Accepted => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Delivering),
            OrderStatus::Delivering => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Completed
    }

    pub fn category(self) -> StatusCategory {
        match self {
            OrderStatus::Pending => StatusCategory::Pending,
            OrderStatus::Accepted => StatusCategory::Accepted,
            OrderStatus::Ready => StatusCategory::Ready,
            OrderStatus::Delivering => StatusCategory::Delivering,
            OrderStatus::Completed => StatusCategory::History,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter accepted by "list my orders". `History` holds completed orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Pending,
    Accepted,
    Ready,
    Delivering,
    History,
}

impl StatusCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCategory::Pending => "pending",
            StatusCategory::Accepted => "accepted",
            StatusCategory::Ready => "ready",
            StatusCategory::Delivering => "delivering",
            StatusCategory::History => "history",
        }
    }

    pub fn contains(self, status: OrderStatus) -> bool {
        status.category() == self
    }
}

/// Who is acting. Decides which order transitions are permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Restaurant,
    Driver,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Customer => "customer",
            Role::Restaurant => "restaurant",
            Role::Driver => "driver",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Where the customer wants the order delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLocation {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// An order as the server reports it.
///
/// `driver_id` stays empty until a driver takes the delivery or an admin assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub restaurant_id: RestaurantId,
    pub customer_id: CustomerId,
    pub driver_id: Option<DriverId>,
    pub items: Vec<CartItem>,
    pub total: u64,
    pub status: OrderStatus,
    pub customer_location: DeliveryLocation,
}
