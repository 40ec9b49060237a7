//! # Sandbox Backend
//!
//! An in-memory [`OrderingApi`] that plays the server's side of the contract: role and
//! ownership checks, membership-only carts, a payment gateway, idempotent verification,
//! confirmation codes and driver eligibility.
//!
//! It exists for the demo binary and for tests, so it can also misbehave on request:
//!
//! - [`fail_next`](SandboxBackend::fail_next) refuses the next call to an endpoint
//!   without applying it.
//! - [`lose_next_reply`](SandboxBackend::lose_next_reply) applies the next call and then
//!   reports a network failure, the case where the client cannot know what happened.
//! - [`with_latency`](SandboxBackend::with_latency) delays every call.

pub mod fixtures;

use crate::api::{
    ApiError, CheckoutInit, CheckoutRequest, OrderingApi, PaymentReceipt, Session,
};
use crate::model::{
    CartItem, CustomerId, Driver, DriverId, DriverStatus, MenuItem, MenuItemId, Order, OrderId,
    OrderStatus, Restaurant, RestaurantId, RestaurantStatus, Role, ServerCart, StatusCategory,
};
use crate::order_actor::transitions::{permitted, side_effect, SideEffect, RULES};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

const GATEWAY_URL: &str = "https://gateway.sandbox/authorize";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    AddCartItem,
    RemoveCartItem,
    ViewCart,
    InitializeCheckout,
    VerifyPayment,
    ListOrders,
    UpdateOrderStatus,
    AdminUpdateOrder,
    SetDriverStatus,
    AdminSetDriverStatus,
    AdminSetRestaurantStatus,
    ListDrivers,
}

enum Fault {
    Refuse(ApiError),
    LoseReply,
}

/// How the result of an admitted call reaches the caller.
enum Delivery {
    Normal,
    LoseReply,
}

impl Delivery {
    fn deliver<T>(self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        match self {
            Delivery::Normal => result,
            Delivery::LoseReply => Err(ApiError::Network(
                "connection reset before reply".to_string(),
            )),
        }
    }
}

struct Payment {
    customer: CustomerId,
    request: CheckoutRequest,
    approved: Option<bool>,
    order_id: Option<OrderId>,
}

#[derive(Default)]
struct Backend {
    restaurants: BTreeMap<RestaurantId, Restaurant>,
    menu: BTreeMap<MenuItemId, MenuItem>,
    drivers: BTreeMap<DriverId, Driver>,
    carts: HashMap<CustomerId, Vec<MenuItemId>>,
    payments: HashMap<String, Payment>,
    orders: BTreeMap<OrderId, Order>,
    codes: HashMap<OrderId, String>,
    next_order: u64,
    next_reference: u64,
    preset_references: VecDeque<String>,
    faults: HashMap<Endpoint, VecDeque<Fault>>,
    calls: HashMap<Endpoint, usize>,
}

fn not_found(what: &str) -> ApiError {
    ApiError::rejected(404, format!("{what} not found"))
}

fn caller(session: &Session, allowed: &[Role]) -> Result<(), ApiError> {
    if !session.is_authenticated() {
        return Err(ApiError::rejected(401, "missing or invalid token"));
    }
    if !allowed.contains(&session.role) {
        return Err(ApiError::rejected(
            403,
            format!("a {} may not call this endpoint", session.role),
        ));
    }
    Ok(())
}

/// Deterministic four-digit code, so tests and the demo can predict it.
fn confirmation_code_for(order_id: OrderId) -> String {
    format!("{:04}", (order_id.0 * 7919 + 1234) % 10_000)
}

/// Escapes everything outside the unreserved set, as a gateway building a redirect would.
fn encode_query_value(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                char::from(b).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

impl Backend {
    fn place_order(
        &mut self,
        restaurant_id: RestaurantId,
        customer_id: CustomerId,
        items: Vec<CartItem>,
        total: u64,
        location: crate::model::DeliveryLocation,
    ) -> Order {
        self.next_order += 1;
        let order_id = OrderId(self.next_order);
        let order = Order {
            order_id,
            restaurant_id,
            customer_id,
            driver_id: None,
            items,
            total,
            status: OrderStatus::Pending,
            customer_location: location,
        };
        self.codes.insert(order_id, confirmation_code_for(order_id));
        self.orders.insert(order_id, order.clone());
        order
    }

    fn receipt(&self, order_id: OrderId, already_verified: bool) -> Result<PaymentReceipt, ApiError> {
        let order = self.orders.get(&order_id).ok_or_else(|| not_found("order"))?;
        Ok(PaymentReceipt {
            order_id,
            confirmation_code: self.codes.get(&order_id).cloned().unwrap_or_default(),
            order: order.clone(),
            already_verified,
        })
    }

    fn accepting_orders(&self, restaurant_id: RestaurantId) -> Result<(), ApiError> {
        let restaurant = self
            .restaurants
            .get(&restaurant_id)
            .ok_or_else(|| not_found("restaurant"))?;
        if restaurant.status != RestaurantStatus::Active {
            return Err(ApiError::rejected(409, "restaurant is not accepting orders"));
        }
        Ok(())
    }

    // --- Cart ---

    fn add_cart_item(&mut self, session: &Session, item: MenuItemId) -> Result<(), ApiError> {
        caller(session, &[Role::Customer])?;
        let menu_item = self.menu.get(&item).ok_or_else(|| not_found("menu item"))?;
        let restaurant_id = menu_item.restaurant_id;
        self.accepting_orders(restaurant_id)?;

        let cart = self.carts.entry(session.customer_id()).or_default();
        let holds_other = cart
            .first()
            .and_then(|first| self.menu.get(first))
            .is_some_and(|first| first.restaurant_id != restaurant_id);
        if holds_other {
            return Err(ApiError::rejected(
                409,
                "cart holds items from another restaurant",
            ));
        }
        if !cart.contains(&item) {
            cart.push(item);
        }
        Ok(())
    }

    fn remove_cart_item(&mut self, session: &Session, item: MenuItemId) -> Result<(), ApiError> {
        caller(session, &[Role::Customer])?;
        let cart = self.carts.entry(session.customer_id()).or_default();
        let pos = cart
            .iter()
            .position(|i| *i == item)
            .ok_or_else(|| not_found("cart item"))?;
        cart.remove(pos);
        Ok(())
    }

    fn server_cart(&self, customer: CustomerId) -> ServerCart {
        let items: Vec<CartItem> = self
            .carts
            .get(&customer)
            .into_iter()
            .flatten()
            .filter_map(|id| self.menu.get(id))
            .map(|m| CartItem {
                menu_item_id: m.id,
                name: m.name.clone(),
                unit_price: m.price,
                quantity: 1,
                image_ref: m.image_ref.clone(),
            })
            .collect();
        let restaurant_id = items
            .first()
            .and_then(|i| self.menu.get(&i.menu_item_id))
            .map(|m| m.restaurant_id);
        ServerCart {
            restaurant_id,
            items,
        }
    }

    // --- Checkout ---

    fn initialize_checkout(
        &mut self,
        session: &Session,
        request: CheckoutRequest,
    ) -> Result<CheckoutInit, ApiError> {
        caller(session, &[Role::Customer])?;
        if request.items.is_empty() {
            return Err(ApiError::rejected(400, "checkout needs at least one item"));
        }
        if request.total == 0 {
            return Err(ApiError::rejected(400, "total must be positive"));
        }
        self.accepting_orders(request.restaurant_id)?;
        let foreign = request.items.iter().any(|item| {
            self.menu
                .get(&item.menu_item_id)
                .map_or(true, |m| m.restaurant_id != request.restaurant_id)
        });
        if foreign {
            return Err(ApiError::rejected(400, "item is not on this restaurant's menu"));
        }

        let reference = match self.preset_references.pop_front() {
            Some(preset) if !self.payments.contains_key(&preset) => preset,
            _ => {
                self.next_reference += 1;
                format!("ref_{:06}", self.next_reference)
            }
        };
        self.payments.insert(
            reference.clone(),
            Payment {
                customer: session.customer_id(),
                request,
                approved: None,
                order_id: None,
            },
        );
        Ok(CheckoutInit {
            authorization_url: format!("{GATEWAY_URL}/{reference}"),
        })
    }

    fn verify_payment(
        &mut self,
        session: &Session,
        restaurant_id: RestaurantId,
        reference: &str,
    ) -> Result<PaymentReceipt, ApiError> {
        caller(session, &[Role::Customer])?;
        let payment = self
            .payments
            .get(reference)
            .ok_or_else(|| not_found("payment reference"))?;
        if payment.customer != session.customer_id() {
            return Err(ApiError::rejected(403, "payment belongs to another customer"));
        }
        if payment.request.restaurant_id != restaurant_id {
            return Err(ApiError::rejected(400, "reference does not match restaurant"));
        }
        if let Some(order_id) = payment.order_id {
            return self.receipt(order_id, true);
        }
        match payment.approved {
            None => return Err(ApiError::rejected(402, "payment not completed")),
            Some(false) => return Err(ApiError::rejected(402, "payment declined")),
            Some(true) => {}
        }

        let request = payment.request.clone();
        let customer = payment.customer;
        let order = self.place_order(
            request.restaurant_id,
            customer,
            request.items,
            request.total,
            request.location,
        );
        if let Some(payment) = self.payments.get_mut(reference) {
            payment.order_id = Some(order.order_id);
        }
        self.carts.remove(&customer);
        info!(order_id = %order.order_id, reference, "Payment verified, order placed");
        self.receipt(order.order_id, false)
    }

    // --- Orders ---

    fn list_orders(
        &self,
        session: &Session,
        category: StatusCategory,
    ) -> Result<Vec<Order>, ApiError> {
        caller(
            session,
            &[Role::Customer, Role::Restaurant, Role::Driver, Role::Admin],
        )?;
        let visible = |o: &&Order| match session.role {
            Role::Customer => o.customer_id == session.customer_id(),
            Role::Restaurant => o.restaurant_id == session.restaurant_id(),
            Role::Driver => {
                o.driver_id == Some(session.driver_id())
                    || (o.status == OrderStatus::Ready && o.driver_id.is_none())
            }
            Role::Admin => true,
        };
        Ok(self
            .orders
            .values()
            .filter(visible)
            .filter(|o| category.contains(o.status))
            .cloned()
            .collect())
    }

    fn update_order_status(
        &mut self,
        session: &Session,
        order_id: OrderId,
        to: OrderStatus,
        code: Option<String>,
    ) -> Result<Order, ApiError> {
        caller(
            session,
            &[Role::Customer, Role::Restaurant, Role::Driver, Role::Admin],
        )?;
        let role = session.role;
        let order = self.orders.get(&order_id).ok_or_else(|| not_found("order"))?;
        let from = order.status;

        if !permitted(role, from, to) {
            let known_target = RULES.iter().any(|r| r.role == role && r.to == to);
            return Err(if role == Role::Admin || known_target {
                ApiError::rejected(409, format!("cannot move an order from {from} to {to}"))
            } else {
                ApiError::rejected(403, format!("a {role} may not set an order to {to}"))
            });
        }

        let me = session.driver_id();
        match (role, side_effect(role, from, to)) {
            (Role::Restaurant, _) if order.restaurant_id != session.restaurant_id() => {
                return Err(ApiError::rejected(403, "order belongs to another restaurant"));
            }
            (Role::Driver, SideEffect::AssignDriver) => {
                let online = self
                    .drivers
                    .get(&me)
                    .is_some_and(|d| d.status == DriverStatus::Online);
                if !online {
                    return Err(ApiError::rejected(409, "driver is offline"));
                }
                if order.driver_id.is_some_and(|d| d != me) {
                    return Err(ApiError::rejected(409, "order is assigned to another driver"));
                }
            }
            (Role::Driver, SideEffect::ConfirmDelivery) => {
                if order.driver_id != Some(me) {
                    return Err(ApiError::rejected(403, "order is assigned to another driver"));
                }
                if code.as_deref() != self.codes.get(&order_id).map(String::as_str) {
                    return Err(ApiError::rejected(400, "invalid confirmation code"));
                }
            }
            _ => {}
        }

        let effect = side_effect(role, from, to);
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| not_found("order"))?;
        order.status = to;
        if effect == SideEffect::AssignDriver {
            order.driver_id = Some(me);
        }
        debug!(%order_id, %from, %to, %role, "Order moved");
        Ok(order.clone())
    }

    fn admin_update_order(
        &mut self,
        session: &Session,
        order_id: OrderId,
        to: OrderStatus,
        driver_id: Option<DriverId>,
    ) -> Result<Order, ApiError> {
        caller(session, &[Role::Admin])?;
        if let Some(driver_id) = driver_id {
            if !self.drivers.contains_key(&driver_id) {
                return Err(not_found("driver"));
            }
        }
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| not_found("order"))?;
        if !permitted(Role::Admin, order.status, to) {
            return Err(ApiError::rejected(409, "order is already completed"));
        }
        order.status = to;
        if driver_id.is_some() {
            order.driver_id = driver_id;
        }
        Ok(order.clone())
    }

    // --- Actor status ---

    fn set_driver(&mut self, driver_id: DriverId, status: DriverStatus) -> Result<Driver, ApiError> {
        let driver = self
            .drivers
            .get_mut(&driver_id)
            .ok_or_else(|| not_found("driver"))?;
        driver.status = status;
        Ok(driver.clone())
    }

    fn set_restaurant(
        &mut self,
        restaurant_id: RestaurantId,
        status: RestaurantStatus,
    ) -> Result<Restaurant, ApiError> {
        let restaurant = self
            .restaurants
            .get_mut(&restaurant_id)
            .ok_or_else(|| not_found("restaurant"))?;
        restaurant.status = status;
        Ok(restaurant.clone())
    }

    fn list_drivers(&self, session: &Session, status: DriverStatus) -> Result<Vec<Driver>, ApiError> {
        caller(session, &[Role::Restaurant, Role::Driver, Role::Admin])?;
        Ok(self
            .drivers
            .values()
            .filter(|d| d.status == status)
            .cloned()
            .collect())
    }
}

/// In-memory ordering backend. Share it behind an `Arc`.
#[derive(Default)]
pub struct SandboxBackend {
    state: Mutex<Backend>,
    latency: Duration,
}

impl SandboxBackend {
    /// An empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend holding the [`fixtures`]: two restaurants, three dishes and two offline
    /// drivers.
    pub fn seeded() -> Self {
        let backend = Self::new();
        backend.add_restaurant(fixtures::RESTAURANT, "Mama Put");
        backend.add_restaurant(fixtures::OTHER_RESTAURANT, "Suya Spot");
        for item in [fixtures::jollof(), fixtures::plantain(), fixtures::suya()] {
            backend.add_menu_item(item);
        }
        backend.add_driver(fixtures::DRIVER, "Ada", DriverStatus::Offline);
        backend.add_driver(fixtures::OTHER_DRIVER, "Bayo", DriverStatus::Offline);
        backend
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn state(&self) -> MutexGuard<'_, Backend> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, endpoint: Endpoint) -> Result<Delivery, ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut state = self.state();
        *state.calls.entry(endpoint).or_default() += 1;
        debug!(?endpoint, "Sandbox call");
        match state.faults.get_mut(&endpoint).and_then(VecDeque::pop_front) {
            None => Ok(Delivery::Normal),
            Some(Fault::LoseReply) => Ok(Delivery::LoseReply),
            Some(Fault::Refuse(error)) => Err(error),
        }
    }

    // --- Setup ---

    pub fn add_restaurant(&self, id: RestaurantId, name: &str) {
        self.state().restaurants.insert(
            id,
            Restaurant {
                id,
                name: name.to_string(),
                status: RestaurantStatus::Active,
            },
        );
    }

    pub fn add_menu_item(&self, item: MenuItem) {
        self.state().menu.insert(item.id, item);
    }

    pub fn add_driver(&self, id: DriverId, name: &str, status: DriverStatus) {
        self.state().drivers.insert(
            id,
            Driver {
                id,
                name: name.to_string(),
                status,
            },
        );
    }

    /// The next payment initialized gets this reference, as if the gateway chose it.
    pub fn queue_reference(&self, reference: impl Into<String>) {
        self.state().preset_references.push_back(reference.into());
    }

    /// Places a paid order directly, skipping cart and checkout.
    pub fn seed_order(
        &self,
        restaurant_id: RestaurantId,
        customer_id: CustomerId,
        status: OrderStatus,
        driver_id: Option<DriverId>,
    ) -> Order {
        let mut state = self.state();
        let item = state
            .menu
            .values()
            .find(|m| m.restaurant_id == restaurant_id)
            .map(|m| CartItem {
                menu_item_id: m.id,
                name: m.name.clone(),
                unit_price: m.price,
                quantity: 1,
                image_ref: m.image_ref.clone(),
            });
        let total = item.as_ref().map_or(0, CartItem::line_total);
        let mut order = state.place_order(
            restaurant_id,
            customer_id,
            item.into_iter().collect(),
            total,
            fixtures::location(),
        );
        order.status = status;
        order.driver_id = driver_id;
        state.orders.insert(order.order_id, order.clone());
        order
    }

    // --- Faults ---

    /// The next call to `endpoint` fails with `error` and changes nothing.
    pub fn fail_next(&self, endpoint: Endpoint, error: ApiError) {
        self.state()
            .faults
            .entry(endpoint)
            .or_default()
            .push_back(Fault::Refuse(error));
    }

    /// The next call to `endpoint` is applied, but the caller sees a network failure.
    pub fn lose_next_reply(&self, endpoint: Endpoint) {
        self.state()
            .faults
            .entry(endpoint)
            .or_default()
            .push_back(Fault::LoseReply);
    }

    // --- Gateway ---

    /// Plays the customer's visit to the payment page. Returns the URL the gateway sends
    /// the browser back to, carrying the `reference` query parameter.
    pub fn complete_gateway(&self, authorization_url: &str, approve: bool) -> Result<String, ApiError> {
        let reference = authorization_url
            .strip_prefix(GATEWAY_URL)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| ApiError::rejected(400, "not a sandbox authorization url"))?;
        let mut state = self.state();
        let payment = state
            .payments
            .get_mut(reference)
            .ok_or_else(|| not_found("payment reference"))?;
        payment.approved = Some(approve);
        Ok(format!(
            "{}?reference={}",
            payment.request.callback_url,
            encode_query_value(reference)
        ))
    }

    // --- Inspection ---

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state().calls.get(&endpoint).copied().unwrap_or(0)
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.state().orders.get(&order_id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.state().orders.len()
    }

    pub fn confirmation_code(&self, order_id: OrderId) -> Option<String> {
        self.state().codes.get(&order_id).cloned()
    }

    pub fn server_cart(&self, customer: CustomerId) -> ServerCart {
        self.state().server_cart(customer)
    }

    pub fn driver(&self, driver_id: DriverId) -> Option<Driver> {
        self.state().drivers.get(&driver_id).cloned()
    }

    pub fn restaurant(&self, restaurant_id: RestaurantId) -> Option<Restaurant> {
        self.state().restaurants.get(&restaurant_id).cloned()
    }

    /// Changes a driver's status behind the clients' backs.
    pub fn set_driver(&self, driver_id: DriverId, status: DriverStatus) {
        let _ = self.state().set_driver(driver_id, status);
    }

    /// Moves an order behind the clients' backs, as another dashboard would.
    pub fn set_order_status(&self, order_id: OrderId, status: OrderStatus) {
        if let Some(order) = self.state().orders.get_mut(&order_id) {
            order.status = status;
        }
    }
}

#[async_trait]
impl OrderingApi for SandboxBackend {
    async fn add_cart_item(&self, session: &Session, item: MenuItemId) -> Result<(), ApiError> {
        let delivery = self.enter(Endpoint::AddCartItem).await?;
        let result = self.state().add_cart_item(session, item);
        delivery.deliver(result)
    }

    async fn remove_cart_item(
        &self,
        session: &Session,
        item: MenuItemId,
    ) -> Result<(), ApiError> {
        let delivery = self.enter(Endpoint::RemoveCartItem).await?;
        let result = self.state().remove_cart_item(session, item);
        delivery.deliver(result)
    }

    async fn view_cart(&self, session: &Session) -> Result<ServerCart, ApiError> {
        let delivery = self.enter(Endpoint::ViewCart).await?;
        let result = caller(session, &[Role::Customer])
            .map(|()| self.state().server_cart(session.customer_id()));
        delivery.deliver(result)
    }

    async fn initialize_checkout(
        &self,
        session: &Session,
        request: CheckoutRequest,
    ) -> Result<CheckoutInit, ApiError> {
        let delivery = self.enter(Endpoint::InitializeCheckout).await?;
        let result = self.state().initialize_checkout(session, request);
        delivery.deliver(result)
    }

    async fn verify_payment(
        &self,
        session: &Session,
        restaurant_id: RestaurantId,
        reference: &str,
    ) -> Result<PaymentReceipt, ApiError> {
        let delivery = self.enter(Endpoint::VerifyPayment).await?;
        let result = self
            .state()
            .verify_payment(session, restaurant_id, reference);
        delivery.deliver(result)
    }

    async fn list_orders(
        &self,
        session: &Session,
        category: StatusCategory,
    ) -> Result<Vec<Order>, ApiError> {
        let delivery = self.enter(Endpoint::ListOrders).await?;
        let result = self.state().list_orders(session, category);
        delivery.deliver(result)
    }

    async fn update_order_status(
        &self,
        session: &Session,
        order_id: OrderId,
        status: OrderStatus,
        confirmation_code: Option<String>,
    ) -> Result<Order, ApiError> {
        let delivery = self.enter(Endpoint::UpdateOrderStatus).await?;
        let result = self
            .state()
            .update_order_status(session, order_id, status, confirmation_code);
        delivery.deliver(result)
    }

    async fn admin_update_order(
        &self,
        session: &Session,
        order_id: OrderId,
        status: OrderStatus,
        driver_id: Option<DriverId>,
    ) -> Result<Order, ApiError> {
        let delivery = self.enter(Endpoint::AdminUpdateOrder).await?;
        let result = self
            .state()
            .admin_update_order(session, order_id, status, driver_id);
        delivery.deliver(result)
    }

    async fn set_driver_status(
        &self,
        session: &Session,
        status: DriverStatus,
    ) -> Result<Driver, ApiError> {
        let delivery = self.enter(Endpoint::SetDriverStatus).await?;
        let result = caller(session, &[Role::Driver])
            .and_then(|()| self.state().set_driver(session.driver_id(), status));
        delivery.deliver(result)
    }

    async fn admin_set_driver_status(
        &self,
        session: &Session,
        driver_id: DriverId,
        status: DriverStatus,
    ) -> Result<Driver, ApiError> {
        let delivery = self.enter(Endpoint::AdminSetDriverStatus).await?;
        let result = caller(session, &[Role::Admin])
            .and_then(|()| self.state().set_driver(driver_id, status));
        delivery.deliver(result)
    }

    async fn admin_set_restaurant_status(
        &self,
        session: &Session,
        restaurant_id: RestaurantId,
        status: RestaurantStatus,
    ) -> Result<Restaurant, ApiError> {
        let delivery = self.enter(Endpoint::AdminSetRestaurantStatus).await?;
        let result = caller(session, &[Role::Admin])
            .and_then(|()| self.state().set_restaurant(restaurant_id, status));
        delivery.deliver(result)
    }

    async fn list_drivers(
        &self,
        session: &Session,
        status: DriverStatus,
    ) -> Result<Vec<Driver>, ApiError> {
        let delivery = self.enter(Endpoint::ListDrivers).await?;
        let result = self.state().list_drivers(session, status);
        delivery.deliver(result)
    }
}
