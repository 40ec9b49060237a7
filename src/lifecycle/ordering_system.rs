use crate::api::{OrderingApi, Session};
use crate::checkout::{CheckoutCoordinator, CheckoutStore};
use crate::clients::{CartClient, OrderClient, StatusClient};
use crate::config::EngineConfig;
use crate::store::KeyValueStore;
use std::sync::Arc;
use tracing::{error, info};

/// The engine for one signed-in session.
///
/// Owns the running actors and hands out their clients:
/// - **Cart actor**: context `(api, session)`.
/// - **Status actor**: context `(api, session)`.
/// - **Order actor**: context `(api, session, StatusClient, CheckoutStore)`, so a
///   restaurant marking an order ready can look for drivers, and a completed order can drop
///   the customer's stored confirmation code.
///
/// The [`CheckoutCoordinator`] is not an actor. It drives the cart and order clients and
/// keeps its state in the store.
///
/// # Example
///
/// ```ignore
/// let system = OrderingSystem::start(api, session, store, &EngineConfig::default());
/// system.cart.add_item(CartEntry::FromMenu(item)).await?;
/// let redirect = system.checkout.begin(Some(location)).await?;
/// // ... the browser visits redirect.authorization_url and comes back ...
/// let receipt = system.checkout.resume(&callback_query).await?;
/// system.shutdown().await?;
/// ```
pub struct OrderingSystem {
    pub cart: CartClient,
    pub orders: OrderClient,
    pub status: StatusClient,
    pub checkout: CheckoutCoordinator,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl OrderingSystem {
    /// Creates the actors, injects their contexts and spawns each on its own task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        api: Arc<dyn OrderingApi>,
        session: Session,
        store: Arc<dyn KeyValueStore>,
        config: &EngineConfig,
    ) -> Self {
        let checkout_store = CheckoutStore::new(store);

        let (cart_actor, cart) = crate::cart_actor::new(config.channel_capacity);
        let (status_actor, status) = crate::status_actor::new(config.channel_capacity);
        let (order_actor, orders) = crate::order_actor::new(config.channel_capacity);

        let cart_handle = tokio::spawn(cart_actor.run((api.clone(), session.clone())));
        let status_handle = tokio::spawn(status_actor.run((api.clone(), session.clone())));
        let order_handle = tokio::spawn(order_actor.run((
            api.clone(),
            session.clone(),
            status.clone(),
            checkout_store.clone(),
        )));

        let checkout = CheckoutCoordinator::new(
            api,
            session.clone(),
            checkout_store,
            cart.clone(),
            orders.clone(),
            config.delivery_fee,
            config.callback_base_url.clone(),
        );

        info!(user_id = session.user_id, role = %session.role, "Ordering system started");
        Self {
            cart,
            orders,
            status,
            checkout,
            handles: vec![cart_handle, status_handle, order_handle],
        }
    }

    /// Drops every client and waits for the actors to drain and exit.
    ///
    /// Clones of the clients held elsewhere keep their actors alive, so drop those first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down ordering system...");

        // The coordinator and the order actor's context hold client clones too.
        drop(self.checkout);
        drop(self.cart);
        drop(self.orders);
        drop(self.status);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Ordering system shutdown complete.");
        Ok(())
    }
}
