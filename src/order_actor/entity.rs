//! [`ActorEntity`] implementation for [`OrderBoard`].
//!
//! The board mirrors the orders a dashboard shows. Unlike the cart, nothing here is
//! optimistic: a transition marks its target as pending, but the displayed status only
//! changes once the server returns the updated order. Each order is a lane with the
//! `Reject` policy, so a second transition on an order that is still awaiting
//! acknowledgement fails fast instead of racing the first.

use crate::api::{ApiError, OrderingApi, Session};
use crate::checkout::CheckoutStore;
use crate::clients::StatusClient;
use crate::model::{
    Driver, DriverId, DriverStatus, Order, OrderId, OrderStatus, Role, StatusCategory,
};
use crate::order_actor::transitions::{permitted, side_effect, SideEffect};
use crate::order_actor::OrderError;
use crate::status_actor::StatusError;
use reconcile_actor::{ActorEntity, Lane, Step};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Dependencies of the order actor. The status client answers the driver search that
/// follows a restaurant marking an order ready.
pub type OrderContext = (Arc<dyn OrderingApi>, Session, StatusClient, CheckoutStore);

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedOrder {
    pub order: Order,
    /// Target of a transition that has not been acknowledged yet.
    pub pending: Option<OrderStatus>,
    pub last_error: Option<String>,
}

impl TrackedOrder {
    fn new(order: Order) -> Self {
        Self {
            order,
            pending: None,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBoardSnapshot {
    pub orders: BTreeMap<OrderId, TrackedOrder>,
    pub last_error: Option<String>,
}

impl OrderBoardSnapshot {
    pub fn get(&self, id: OrderId) -> Option<&TrackedOrder> {
        self.orders.get(&id)
    }

    pub fn status_of(&self, id: OrderId) -> Option<OrderStatus> {
        self.get(id).map(|t| t.order.status)
    }

    pub fn in_category(&self, category: StatusCategory) -> Vec<&Order> {
        self.orders
            .values()
            .map(|t| &t.order)
            .filter(|o| category.contains(o.status))
            .collect()
    }
}

/// Result of the driver search after an order becomes ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverAvailability {
    /// The transition has no driver search.
    NotChecked,
    Available(Vec<Driver>),
    /// The transition succeeded, but no driver is online to take the delivery.
    NoneOnline,
    /// The search itself failed; the transition still succeeded.
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub order: Order,
    pub drivers: DriverAvailability,
}

impl TransitionOutcome {
    pub fn no_driver_available(&self) -> bool {
        self.drivers == DriverAvailability::NoneOnline
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderCommand {
    /// Poll the server's list for one category.
    Refresh(StatusCategory),
    Transition {
        order_id: OrderId,
        to: OrderStatus,
        code: Option<String>,
    },
    /// Admin only: force any transition and optionally reassign the driver.
    AdminOverride {
        order_id: OrderId,
        to: OrderStatus,
        driver_id: Option<DriverId>,
    },
    /// Put an order the caller already holds on the board.
    Track(Order),
}

pub enum OrderReply {
    Listed {
        category: StatusCategory,
        result: Result<Vec<Order>, ApiError>,
    },
    Moved {
        order_id: OrderId,
        effect: SideEffect,
        result: Result<Order, ApiError>,
    },
    DriversChecked {
        order: Order,
        result: Result<Vec<Driver>, StatusError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutput {
    Orders(Vec<Order>),
    Transitioned(TransitionOutcome),
    Tracked(Order),
}

#[derive(Debug, Default)]
pub struct OrderBoard {
    orders: BTreeMap<OrderId, TrackedOrder>,
    last_error: Option<String>,
}

impl OrderBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn upsert(&mut self, order: Order) {
        self.orders
            .entry(order.order_id)
            .and_modify(|tracked| tracked.order = order.clone())
            .or_insert_with(|| TrackedOrder::new(order));
    }

    /// Replace what the board knows about `category` with a fresh listing.
    ///
    /// Orders that have left the category are dropped, unless a transition on them is
    /// still pending.
    fn merge(&mut self, category: StatusCategory, orders: &[Order], store: &CheckoutStore) {
        let listed: BTreeSet<OrderId> = orders.iter().map(|o| o.order_id).collect();
        self.orders.retain(|id, tracked| {
            listed.contains(id) || tracked.pending.is_some() || !category.contains(tracked.order.status)
        });
        for order in orders {
            self.upsert(order.clone());
        }
        forget_code_if_delivered(orders, store);
    }

    fn begin_transition(
        &mut self,
        order_id: OrderId,
        to: OrderStatus,
        code: Option<String>,
        api: Arc<dyn OrderingApi>,
        session: Session,
    ) -> Step<Self> {
        let Some(tracked) = self.orders.get_mut(&order_id) else {
            return Step::err(OrderError::UnknownOrder(order_id));
        };
        let from = tracked.order.status;
        let role = session.role;
        if !permitted(role, from, to) {
            return Step::err(OrderError::NotPermitted { role, from, to });
        }
        let effect = side_effect(role, from, to);
        if effect == SideEffect::ConfirmDelivery && code.as_deref().map_or(true, str::is_empty) {
            return Step::err(OrderError::MissingConfirmationCode);
        }

        tracked.pending = Some(to);
        tracked.last_error = None;
        Step::remote(async move {
            let result = api
                .update_order_status(&session, order_id, to, code)
                .await;
            OrderReply::Moved {
                order_id,
                effect,
                result,
            }
        })
    }

    fn begin_override(
        &mut self,
        order_id: OrderId,
        to: OrderStatus,
        driver_id: Option<DriverId>,
        api: Arc<dyn OrderingApi>,
        session: Session,
    ) -> Step<Self> {
        let Some(tracked) = self.orders.get_mut(&order_id) else {
            return Step::err(OrderError::UnknownOrder(order_id));
        };
        let from = tracked.order.status;
        if session.role != Role::Admin || !permitted(Role::Admin, from, to) {
            return Step::err(OrderError::NotPermitted {
                role: session.role,
                from,
                to,
            });
        }

        tracked.pending = Some(to);
        tracked.last_error = None;
        Step::remote(async move {
            let result = api
                .admin_update_order(&session, order_id, to, driver_id)
                .await;
            OrderReply::Moved {
                order_id,
                effect: SideEffect::None,
                result,
            }
        })
    }
}

/// The confirmation code is only needed until the delivery it confirms is done.
///
/// Reads the stored receipt at most once, and not at all unless `orders` holds a completed
/// order.
fn forget_code_if_delivered(orders: &[Order], store: &CheckoutStore) {
    let completed: BTreeSet<OrderId> = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .map(|o| o.order_id)
        .collect();
    if completed.is_empty() {
        return;
    }
    match store.receipt() {
        Ok(Some(receipt)) if completed.contains(&receipt.order_id) => {
            match store.clear_receipt() {
                Ok(()) => info!(order_id = %receipt.order_id, "Delivered, confirmation code cleared"),
                Err(e) => warn!(order_id = %receipt.order_id, error = %e, "Failed to clear receipt"),
            }
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Failed to read receipt"),
    }
}

impl ActorEntity for OrderBoard {
    type Key = OrderId;
    type Command = OrderCommand;
    type Reply = OrderReply;
    type Output = OrderOutput;
    type Error = OrderError;
    type Context = OrderContext;
    type Snapshot = OrderBoardSnapshot;

    fn lane(command: &OrderCommand) -> Lane<OrderId> {
        match command {
            OrderCommand::Transition { order_id, .. }
            | OrderCommand::AdminOverride { order_id, .. } => Lane::reject(*order_id),
            OrderCommand::Refresh(_) | OrderCommand::Track(_) => Lane::Free,
        }
    }

    fn begin(
        &mut self,
        command: OrderCommand,
        (api, session, _status, store): &OrderContext,
    ) -> Step<Self> {
        // Tracking is local; everything else talks to the server.
        if !matches!(command, OrderCommand::Track(_)) && !session.is_authenticated() {
            return Step::err(OrderError::NotAuthenticated);
        }
        let api = api.clone();
        let session = session.clone();

        match command {
            OrderCommand::Track(order) => {
                forget_code_if_delivered(std::slice::from_ref(&order), store);
                self.upsert(order.clone());
                Step::ok(OrderOutput::Tracked(order))
            }
            OrderCommand::Refresh(category) => Step::remote(async move {
                let result = api.list_orders(&session, category).await;
                OrderReply::Listed { category, result }
            }),
            OrderCommand::Transition { order_id, to, code } => {
                self.begin_transition(order_id, to, code, api, session)
            }
            OrderCommand::AdminOverride {
                order_id,
                to,
                driver_id,
            } => self.begin_override(order_id, to, driver_id, api, session),
        }
    }

    fn resume(
        &mut self,
        reply: OrderReply,
        (_api, _session, status, store): &OrderContext,
    ) -> Step<Self> {
        match reply {
            OrderReply::Listed { category, result } => match result {
                Ok(orders) => {
                    self.merge(category, &orders, store);
                    self.last_error = None;
                    Step::ok(OrderOutput::Orders(orders))
                }
                Err(e) => {
                    self.last_error = Some(e.to_string());
                    Step::err(e)
                }
            },
            OrderReply::Moved {
                order_id,
                effect,
                result,
            } => match result {
                Ok(order) => {
                    if let Some(tracked) = self.orders.get_mut(&order_id) {
                        tracked.pending = None;
                    }
                    forget_code_if_delivered(std::slice::from_ref(&order), store);
                    self.upsert(order.clone());
                    if effect == SideEffect::DriverSearch {
                        let status = status.clone();
                        return Step::remote(async move {
                            let result = status.list_drivers(DriverStatus::Online).await;
                            OrderReply::DriversChecked { order, result }
                        });
                    }
                    Step::ok(OrderOutput::Transitioned(TransitionOutcome {
                        order,
                        drivers: DriverAvailability::NotChecked,
                    }))
                }
                Err(e) => {
                    if let Some(tracked) = self.orders.get_mut(&order_id) {
                        tracked.pending = None;
                        tracked.last_error = Some(e.to_string());
                    }
                    Step::err(e)
                }
            },
            OrderReply::DriversChecked { order, result } => {
                let drivers = match result {
                    Ok(drivers) if drivers.is_empty() => {
                        warn!(order_id = %order.order_id, "Order ready but no driver is online");
                        DriverAvailability::NoneOnline
                    }
                    Ok(drivers) => DriverAvailability::Available(drivers),
                    Err(e) => {
                        warn!(order_id = %order.order_id, error = %e, "Driver search failed");
                        DriverAvailability::Unknown(e.to_string())
                    }
                };
                Step::ok(OrderOutput::Transitioned(TransitionOutcome { order, drivers }))
            }
        }
    }

    fn snapshot(&self) -> OrderBoardSnapshot {
        OrderBoardSnapshot {
            orders: self.orders.clone(),
            last_error: self.last_error.clone(),
        }
    }
}
