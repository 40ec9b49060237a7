//! # Ordering API Contract
//!
//! [`OrderingApi`] is the one seam between the engine and the backend: one method per
//! endpoint, typed requests and replies, and a single error taxonomy ([`ApiError`]).
//!
//! Two implementations ship with the crate:
//! - [`HttpApi`] speaks JSON through any [`Transport`].
//! - `SandboxBackend` (feature `sandbox`) keeps the whole backend in memory.
//!
//! Every call takes the caller's [`Session`] explicitly. There is no global auth state.

pub mod error;
pub mod http;
pub mod mock;
pub mod transport;

pub use error::*;
pub use http::HttpApi;
pub use transport::*;

use crate::model::{
    CartItem, CustomerId, DeliveryLocation, Driver, DriverId, DriverStatus, MenuItemId, Order,
    OrderId, OrderStatus, Restaurant, RestaurantId, RestaurantStatus, Role, ServerCart,
    StatusCategory,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who is calling, and with which bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: u64,
    pub role: Role,
    pub token: Option<String>,
}

impl Session {
    pub fn new(user_id: u64, role: Role, token: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            token: Some(token.into()),
        }
    }

    /// A session that has not logged in yet.
    pub fn anonymous(role: Role) -> Self {
        Self {
            user_id: 0,
            role,
            token: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }

    pub fn customer_id(&self) -> CustomerId {
        CustomerId(self.user_id)
    }

    pub fn driver_id(&self) -> DriverId {
        DriverId(self.user_id)
    }

    pub fn restaurant_id(&self) -> RestaurantId {
        RestaurantId(self.user_id)
    }
}

/// Body of "initialize checkout".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub restaurant_id: RestaurantId,
    pub total: u64,
    pub callback_id: String,
    /// Where the gateway sends the browser back, with `reference` appended as a query
    /// parameter.
    pub callback_url: String,
    pub location: DeliveryLocation,
    pub items: Vec<CartItem>,
}

/// Reply of "initialize checkout": where to send the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInit {
    pub authorization_url: String,
}

/// Reply of "verify payment".
///
/// Verifying the same reference twice returns the same order with
/// `already_verified` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub order_id: OrderId,
    pub confirmation_code: String,
    pub order: Order,
    #[serde(default)]
    pub already_verified: bool,
}

/// The backend endpoints the engine relies on.
#[async_trait]
pub trait OrderingApi: Send + Sync + 'static {
    // --- Cart ---

    async fn add_cart_item(&self, session: &Session, item: MenuItemId) -> Result<(), ApiError>;

    async fn remove_cart_item(&self, session: &Session, item: MenuItemId)
        -> Result<(), ApiError>;

    async fn view_cart(&self, session: &Session) -> Result<ServerCart, ApiError>;

    // --- Checkout ---

    async fn initialize_checkout(
        &self,
        session: &Session,
        request: CheckoutRequest,
    ) -> Result<CheckoutInit, ApiError>;

    async fn verify_payment(
        &self,
        session: &Session,
        restaurant_id: RestaurantId,
        reference: &str,
    ) -> Result<PaymentReceipt, ApiError>;

    // --- Orders ---

    async fn list_orders(
        &self,
        session: &Session,
        category: StatusCategory,
    ) -> Result<Vec<Order>, ApiError>;

    async fn update_order_status(
        &self,
        session: &Session,
        order_id: OrderId,
        status: OrderStatus,
        confirmation_code: Option<String>,
    ) -> Result<Order, ApiError>;

    async fn admin_update_order(
        &self,
        session: &Session,
        order_id: OrderId,
        status: OrderStatus,
        driver_id: Option<DriverId>,
    ) -> Result<Order, ApiError>;

    // --- Actor status ---

    async fn set_driver_status(
        &self,
        session: &Session,
        status: DriverStatus,
    ) -> Result<Driver, ApiError>;

    async fn admin_set_driver_status(
        &self,
        session: &Session,
        driver_id: DriverId,
        status: DriverStatus,
    ) -> Result<Driver, ApiError>;

    async fn admin_set_restaurant_status(
        &self,
        session: &Session,
        restaurant_id: RestaurantId,
        status: RestaurantStatus,
    ) -> Result<Restaurant, ApiError>;

    async fn list_drivers(
        &self,
        session: &Session,
        status: DriverStatus,
    ) -> Result<Vec<Driver>, ApiError>;
}
