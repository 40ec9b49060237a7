use crate::cart_actor::{CartCommand, CartError, CartSnapshot, CartState};
use crate::model::{CartEntry, MenuItemId};
use reconcile_actor::{ActorClient, ResourceClient};
use tracing::{debug, instrument};

/// Client for the Cart Store.
///
/// Every method resolves once the command has fully settled, including any refetch, and
/// returns the cart as it stands at that moment. Views that want the optimistic state while
/// a call is in flight should [`subscribe`](ActorClient::subscribe) instead.
#[derive(Clone)]
pub struct CartClient {
    inner: ResourceClient<CartState>,
}

impl CartClient {
    pub fn new(inner: ResourceClient<CartState>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, entry), fields(item = %entry.menu_item_id()))]
    pub async fn add_item(&self, entry: CartEntry) -> Result<CartSnapshot, CartError> {
        debug!("Sending request");
        self.inner.send(CartCommand::Add(entry)).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, item: MenuItemId) -> Result<CartSnapshot, CartError> {
        debug!("Sending request");
        self.inner.send(CartCommand::Remove(item)).await
    }

    /// Fetches the server's cart and reconciles the working copy with it.
    #[instrument(skip(self))]
    pub async fn view_cart(&self) -> Result<CartSnapshot, CartError> {
        debug!("Sending request");
        self.inner.send(CartCommand::View).await
    }

    /// Empties the working copy without calling the server.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartSnapshot, CartError> {
        self.inner.send(CartCommand::Clear).await
    }
}

impl ActorClient<CartState> for CartClient {
    fn inner(&self) -> &ResourceClient<CartState> {
        &self.inner
    }
}
