//! # JSON over a Transport
//!
//! [`HttpApi`] maps each [`OrderingApi`] call onto a path, a method and a camelCase JSON
//! body, attaches the session's bearer token and applies a fixed timeout.
//!
//! | Call | Request |
//! |------|---------|
//! | add cart item | `POST /cart/items` `{menuItemId}` |
//! | remove cart item | `DELETE /cart/items/{id}` |
//! | view cart | `GET /cart` |
//! | initialize checkout | `POST /checkout/initialize` |
//! | verify payment | `POST /checkout/verify` `{restaurantId, reference}` |
//! | list orders | `GET /orders?status={category}` |
//! | update order status | `PATCH /orders/{id}/status` `{status, code}` |
//! | admin update order | `PATCH /admin/orders/{id}` `{status, driverId}` |
//! | set own driver status | `PATCH /drivers/me/status` `{status}` |
//! | admin driver status | `PATCH /admin/drivers/{id}/status` `{status}` |
//! | admin restaurant status | `PATCH /admin/restaurants/{id}/status` `{status}` |
//! | list drivers | `GET /drivers?status={status}` |
//!
//! Non-2xx responses become [`ApiError::Rejected`] with the body's `message` field.

use crate::api::{
    ApiError, ApiRequest, CheckoutInit, CheckoutRequest, Method, OrderingApi, PaymentReceipt,
    Session, Transport,
};
use crate::model::{
    Driver, DriverId, DriverStatus, MenuItemId, Order, OrderId, OrderStatus, Restaurant,
    RestaurantId, RestaurantStatus, ServerCart, StatusCategory,
};
use crate::config::EngineConfig;
use async_trait::async_trait;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub struct HttpApi<T> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> HttpApi<T> {
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn from_config(transport: T, config: &EngineConfig) -> Self {
        Self::new(transport, config.request_timeout)
    }

    async fn call<R: DeserializeOwned>(
        &self,
        session: &Session,
        method: Method,
        path: String,
        body: Option<Value>,
    ) -> Result<R, ApiError> {
        let request = ApiRequest {
            method,
            path,
            bearer: session.token.clone(),
            body,
        };
        debug!(?method, path = %request.path, "Sending request");

        let response = tokio::time::timeout(self.timeout, self.transport.send(request))
            .await
            .map_err(|_| ApiError::Timeout(self.timeout))?
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.is_success() {
            let message = response
                .body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("request failed with status {}", response.status));
            warn!(status = response.status, %message, "Request rejected");
            return Err(ApiError::Rejected {
                status: response.status,
                message,
            });
        }

        serde_json::from_value(response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl<T: Transport> OrderingApi for HttpApi<T> {
    #[instrument(skip(self, session))]
    async fn add_cart_item(&self, session: &Session, item: MenuItemId) -> Result<(), ApiError> {
        let body = json!({ "menuItemId": item });
        self.call::<IgnoredAny>(session, Method::Post, "/cart/items".into(), Some(body))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self, session))]
    async fn remove_cart_item(
        &self,
        session: &Session,
        item: MenuItemId,
    ) -> Result<(), ApiError> {
        let path = format!("/cart/items/{}", item.0);
        self.call::<IgnoredAny>(session, Method::Delete, path, None)
            .await
            .map(|_| ())
    }

    #[instrument(skip(self, session))]
    async fn view_cart(&self, session: &Session) -> Result<ServerCart, ApiError> {
        self.call(session, Method::Get, "/cart".into(), None).await
    }

    #[instrument(skip(self, session, request))]
    async fn initialize_checkout(
        &self,
        session: &Session,
        request: CheckoutRequest,
    ) -> Result<CheckoutInit, ApiError> {
        let body = serde_json::to_value(&request).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.call(session, Method::Post, "/checkout/initialize".into(), Some(body))
            .await
    }

    #[instrument(skip(self, session))]
    async fn verify_payment(
        &self,
        session: &Session,
        restaurant_id: RestaurantId,
        reference: &str,
    ) -> Result<PaymentReceipt, ApiError> {
        let body = json!({ "restaurantId": restaurant_id, "reference": reference });
        self.call(session, Method::Post, "/checkout/verify".into(), Some(body))
            .await
    }

    #[instrument(skip(self, session))]
    async fn list_orders(
        &self,
        session: &Session,
        category: StatusCategory,
    ) -> Result<Vec<Order>, ApiError> {
        let path = format!("/orders?status={}", category.as_str());
        self.call(session, Method::Get, path, None).await
    }

    #[instrument(skip(self, session, confirmation_code))]
    async fn update_order_status(
        &self,
        session: &Session,
        order_id: OrderId,
        status: OrderStatus,
        confirmation_code: Option<String>,
    ) -> Result<Order, ApiError> {
        let path = format!("/orders/{}/status", order_id.0);
        let body = json!({ "status": status, "code": confirmation_code });
        self.call(session, Method::Patch, path, Some(body)).await
    }

    #[instrument(skip(self, session))]
    async fn admin_update_order(
        &self,
        session: &Session,
        order_id: OrderId,
        status: OrderStatus,
        driver_id: Option<DriverId>,
    ) -> Result<Order, ApiError> {
        let path = format!("/admin/orders/{}", order_id.0);
        let body = json!({ "status": status, "driverId": driver_id });
        self.call(session, Method::Patch, path, Some(body)).await
    }

    #[instrument(skip(self, session))]
    async fn set_driver_status(
        &self,
        session: &Session,
        status: DriverStatus,
    ) -> Result<Driver, ApiError> {
        let body = json!({ "status": status });
        self.call(session, Method::Patch, "/drivers/me/status".into(), Some(body))
            .await
    }

    #[instrument(skip(self, session))]
    async fn admin_set_driver_status(
        &self,
        session: &Session,
        driver_id: DriverId,
        status: DriverStatus,
    ) -> Result<Driver, ApiError> {
        let path = format!("/admin/drivers/{}/status", driver_id.0);
        let body = json!({ "status": status });
        self.call(session, Method::Patch, path, Some(body)).await
    }

    #[instrument(skip(self, session))]
    async fn admin_set_restaurant_status(
        &self,
        session: &Session,
        restaurant_id: RestaurantId,
        status: RestaurantStatus,
    ) -> Result<Restaurant, ApiError> {
        let path = format!("/admin/restaurants/{}/status", restaurant_id.0);
        let body = json!({ "status": status });
        self.call(session, Method::Patch, path, Some(body)).await
    }

    #[instrument(skip(self, session))]
    async fn list_drivers(
        &self,
        session: &Session,
        status: DriverStatus,
    ) -> Result<Vec<Driver>, ApiError> {
        let path = format!("/drivers?status={}", status.as_str());
        self.call(session, Method::Get, path, None).await
    }
}
