//! [`ActorEntity`] implementation for [`CartState`].
//!
//! The server tracks which menu items are in the cart, not how many of each. So:
//!
//! - The first add of an item inserts it locally at once, then calls the server. A rejection
//!   rolls the insertion back; a network failure refetches the cart instead of guessing.
//!   A successful add refetches too, so name, price and image come from the server.
//! - Further adds and every remove above quantity 1 only touch the local counter.
//! - The last remove calls the server and drops the line once the call succeeds. A failure
//!   refetches the cart.
//!
//! Each menu item is its own queued lane, so a second add or remove on an item waits for
//! the first to settle. Different items proceed independently.

use crate::api::{ApiError, OrderingApi, Session};
use crate::cart_actor::CartError;
use crate::model::{CartEntry, CartItem, MenuItemId, RestaurantId, Role, ServerCart};
use reconcile_actor::{ActorEntity, Lane, Step};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

pub type CartContext = (Arc<dyn OrderingApi>, Session);

/// Whether a line's membership is settled with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSync {
    Confirmed,
    /// Shown optimistically; the server has not confirmed it yet.
    Adding,
    /// Still shown; waiting for the server to drop it.
    Removing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item: CartItem,
    pub sync: LineSync,
}

/// The working copy as published to views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    pub restaurant_id: Option<RestaurantId>,
    pub lines: Vec<CartLine>,
    pub last_error: Option<String>,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, item: MenuItemId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item.menu_item_id == item)
    }

    pub fn quantity_of(&self, item: MenuItemId) -> u32 {
        self.line(item).map_or(0, |l| l.item.quantity)
    }

    /// False while any membership change is in flight.
    pub fn is_settled(&self) -> bool {
        self.lines.iter().all(|l| l.sync == LineSync::Confirmed)
    }

    pub fn subtotal(&self) -> u64 {
        self.lines.iter().map(|l| l.item.line_total()).sum()
    }

    /// The explicit item list, quantities included, that checkout sends.
    pub fn items(&self) -> Vec<CartItem> {
        self.lines.iter().map(|l| l.item.clone()).collect()
    }

    pub fn members(&self) -> BTreeSet<MenuItemId> {
        self.lines.iter().map(|l| l.item.menu_item_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartCommand {
    Add(CartEntry),
    Remove(MenuItemId),
    View,
    Clear,
}

pub enum CartReply {
    Added {
        item: MenuItemId,
        result: Result<(), ApiError>,
    },
    Removed {
        item: MenuItemId,
        result: Result<(), ApiError>,
    },
    /// A fetched server cart. `settling` is the item whose command triggered the fetch;
    /// `cause` is the failure that made a resync necessary.
    Fetched {
        settling: Option<MenuItemId>,
        cause: Option<ApiError>,
        result: Result<ServerCart, ApiError>,
    },
}

/// The customer's working cart.
#[derive(Debug, Default)]
pub struct CartState {
    restaurant_id: Option<RestaurantId>,
    lines: Vec<CartLine>,
    last_error: Option<String>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, item: MenuItemId) -> Option<usize> {
        self.lines.iter().position(|l| l.item.menu_item_id == item)
    }

    fn add(&mut self, entry: CartEntry, api: Arc<dyn OrderingApi>, session: Session) -> Step<Self> {
        let item = entry.menu_item_id();
        let requested = entry.restaurant_id();
        if let Some(current) = self.restaurant_id.filter(|_| !self.lines.is_empty()) {
            if current != requested {
                return Step::err(CartError::DifferentRestaurant { current, requested });
            }
        }

        if let Some(pos) = self.position(item) {
            let line = &mut self.lines[pos];
            line.item.quantity = line.item.quantity.saturating_add(1);
            return Step::ok(self.snapshot());
        }

        self.restaurant_id = Some(requested);
        self.lines.push(CartLine {
            item: entry.into_line(),
            sync: LineSync::Adding,
        });
        self.last_error = None;
        Step::remote(async move {
            let result = api.add_cart_item(&session, item).await;
            CartReply::Added { item, result }
        })
    }

    fn remove(&mut self, item: MenuItemId, api: Arc<dyn OrderingApi>, session: Session) -> Step<Self> {
        let Some(pos) = self.position(item) else {
            return Step::err(CartError::NotInCart(item));
        };

        let line = &mut self.lines[pos];
        if line.item.quantity > 1 {
            line.item.quantity -= 1;
            return Step::ok(self.snapshot());
        }

        line.sync = LineSync::Removing;
        self.last_error = None;
        Step::remote(async move {
            let result = api.remove_cart_item(&session, item).await;
            CartReply::Removed { item, result }
        })
    }

    /// Replace membership and server-derived fields with `cart`, keeping local quantities.
    ///
    /// Lines with a membership change in flight (other than `settling`) are left alone:
    /// their own command settles them.
    fn reconcile(&mut self, cart: ServerCart, settling: Option<MenuItemId>) {
        let ServerCart {
            restaurant_id,
            items: mut server,
        } = cart;
        let local = std::mem::take(&mut self.lines);

        for line in local {
            let id = line.item.menu_item_id;
            let in_flight = line.sync != LineSync::Confirmed && Some(id) != settling;
            match server.iter().position(|s| s.menu_item_id == id) {
                Some(pos) => {
                    let fresh = server.remove(pos);
                    self.lines.push(CartLine {
                        item: CartItem {
                            quantity: line.item.quantity,
                            ..fresh
                        },
                        sync: if in_flight { line.sync } else { LineSync::Confirmed },
                    });
                }
                None if in_flight => self.lines.push(line),
                None => {}
            }
        }
        self.lines.extend(server.into_iter().map(|item| CartLine {
            item: CartItem {
                quantity: item.quantity.max(1),
                ..item
            },
            sync: LineSync::Confirmed,
        }));

        self.restaurant_id = if self.lines.is_empty() {
            None
        } else {
            restaurant_id.or(self.restaurant_id)
        };
    }

    /// Undo the optimistic part of an unsettled command on `item`.
    fn rollback(&mut self, item: MenuItemId) {
        if let Some(pos) = self.position(item) {
            match self.lines[pos].sync {
                LineSync::Adding => {
                    self.lines.remove(pos);
                }
                LineSync::Removing => self.lines[pos].sync = LineSync::Confirmed,
                LineSync::Confirmed => {}
            }
        }
        if self.lines.is_empty() {
            self.restaurant_id = None;
        }
    }

    fn drop_line(&mut self, item: MenuItemId) {
        self.lines.retain(|l| l.item.menu_item_id != item);
        if self.lines.is_empty() {
            self.restaurant_id = None;
        }
    }

    fn confirm(&mut self, item: MenuItemId) {
        if let Some(pos) = self.position(item) {
            self.lines[pos].sync = LineSync::Confirmed;
        }
    }

    fn fail(&mut self, error: ApiError) -> Step<Self> {
        self.last_error = Some(error.to_string());
        Step::err(error)
    }
}

fn gate(session: &Session) -> Result<(), CartError> {
    if !session.is_authenticated() {
        return Err(CartError::NotAuthenticated);
    }
    if session.role != Role::Customer {
        return Err(CartError::NotCustomer(session.role));
    }
    Ok(())
}

async fn fetch(
    api: Arc<dyn OrderingApi>,
    session: Session,
    settling: Option<MenuItemId>,
    cause: Option<ApiError>,
) -> CartReply {
    let result = api.view_cart(&session).await;
    CartReply::Fetched {
        settling,
        cause,
        result,
    }
}

impl ActorEntity for CartState {
    type Key = MenuItemId;
    type Command = CartCommand;
    type Reply = CartReply;
    type Output = CartSnapshot;
    type Error = CartError;
    type Context = CartContext;
    type Snapshot = CartSnapshot;

    fn lane(command: &CartCommand) -> Lane<MenuItemId> {
        match command {
            CartCommand::Add(entry) => Lane::queue(entry.menu_item_id()),
            CartCommand::Remove(item) => Lane::queue(*item),
            CartCommand::View | CartCommand::Clear => Lane::Free,
        }
    }

    fn begin(&mut self, command: CartCommand, (api, session): &CartContext) -> Step<Self> {
        if let Err(e) = gate(session) {
            return Step::err(e);
        }
        let api = api.clone();
        let session = session.clone();

        match command {
            CartCommand::Add(entry) => self.add(entry, api, session),
            CartCommand::Remove(item) => self.remove(item, api, session),
            CartCommand::View => Step::remote(fetch(api, session, None, None)),
            CartCommand::Clear => {
                self.lines.clear();
                self.restaurant_id = None;
                self.last_error = None;
                Step::ok(self.snapshot())
            }
        }
    }

    fn resume(&mut self, reply: CartReply, (api, session): &CartContext) -> Step<Self> {
        match reply {
            CartReply::Added { item, result } => match result {
                Ok(()) => Step::remote(fetch(api.clone(), session.clone(), Some(item), None)),
                Err(e) if e.is_network() => {
                    warn!(%item, error = %e, "Add outcome unknown, resyncing");
                    Step::remote(fetch(api.clone(), session.clone(), Some(item), Some(e)))
                }
                Err(e) => {
                    self.rollback(item);
                    self.fail(e)
                }
            },
            CartReply::Removed { item, result } => match result {
                Ok(()) => {
                    self.drop_line(item);
                    Step::ok(self.snapshot())
                }
                Err(e) => {
                    warn!(%item, error = %e, "Remove failed, resyncing");
                    Step::remote(fetch(api.clone(), session.clone(), Some(item), Some(e)))
                }
            },
            CartReply::Fetched {
                settling,
                cause,
                result,
            } => match (result, cause) {
                (Ok(cart), None) => {
                    self.reconcile(cart, settling);
                    self.last_error = None;
                    Step::ok(self.snapshot())
                }
                (Ok(cart), Some(cause)) => {
                    self.reconcile(cart, settling);
                    self.fail(cause)
                }
                // The add went through; only the refresh of server fields failed.
                (Err(e), None) if settling.is_some() => {
                    if let Some(item) = settling {
                        self.confirm(item);
                    }
                    warn!(error = %e, "Cart refetch failed after add");
                    self.last_error = Some(e.to_string());
                    Step::ok(self.snapshot())
                }
                (Err(e), None) => self.fail(e),
                (Err(e), Some(cause)) => {
                    warn!(error = %e, "Cart refetch failed");
                    if let Some(item) = settling {
                        self.rollback(item);
                    }
                    self.fail(cause)
                }
            },
        }
    }

    fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            restaurant_id: self.restaurant_id,
            lines: self.lines.clone(),
            last_error: self.last_error.clone(),
        }
    }
}
