//! The customer's cart: an optimistic working copy reconciled against the server's.

pub mod entity;
pub mod error;

pub use entity::*;
pub use error::*;

use crate::clients::CartClient;
use reconcile_actor::ResourceActor;

/// Creates a new cart actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<CartState>, CartClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, CartState::new());
    (actor, CartClient::new(generic_client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, OrderingApi, Session};
    use crate::model::{CartEntry, MenuItemId, Role};
    use crate::sandbox::{fixtures, Endpoint, SandboxBackend};
    use reconcile_actor::ActorClient;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    fn spawn(backend: &Arc<SandboxBackend>, session: Session) -> CartClient {
        let (actor, client) = new(8);
        let api: Arc<dyn OrderingApi> = backend.clone();
        tokio::spawn(actor.run((api, session)));
        client
    }

    fn jollof() -> CartEntry {
        CartEntry::FromMenu(fixtures::jollof())
    }

    #[tokio::test]
    async fn test_first_add_is_optimistic_then_confirmed_with_server_fields() {
        let backend = Arc::new(SandboxBackend::seeded().with_latency(Duration::from_millis(30)));
        let cart = spawn(&backend, fixtures::customer());

        let mut stale = fixtures::jollof();
        stale.price = 1;
        stale.name = "old name".into();

        let mut watcher = cart.subscribe();
        let adding = {
            let cart = cart.clone();
            tokio::spawn(async move { cart.add_item(CartEntry::FromMenu(stale)).await })
        };

        let shown = watcher
            .wait_for(|c| !c.is_empty())
            .await
            .unwrap()
            .lines[0]
            .clone();
        assert_eq!(shown.sync, LineSync::Adding);
        assert_eq!(shown.item.unit_price, 1);

        let settled = adding.await.unwrap().unwrap();
        let line = settled.line(MenuItemId(7)).unwrap();
        assert_eq!(line.sync, LineSync::Confirmed);
        assert_eq!(line.item.unit_price, 1500);
        assert_eq!(line.item.name, "Jollof rice");
        assert_eq!(backend.calls(Endpoint::AddCartItem), 1);
        assert_eq!(backend.calls(Endpoint::ViewCart), 1);
    }

    #[tokio::test]
    async fn test_repeat_add_and_partial_remove_stay_local() {
        let backend = Arc::new(SandboxBackend::seeded());
        let cart = spawn(&backend, fixtures::customer());

        cart.add_item(jollof()).await.unwrap();
        cart.add_item(jollof()).await.unwrap();
        let snapshot = cart.add_item(jollof()).await.unwrap();
        assert_eq!(snapshot.quantity_of(MenuItemId(7)), 3);
        assert_eq!(snapshot.subtotal(), 4500);

        let snapshot = cart.remove_item(MenuItemId(7)).await.unwrap();
        assert_eq!(snapshot.quantity_of(MenuItemId(7)), 2);

        assert_eq!(backend.calls(Endpoint::AddCartItem), 1);
        assert_eq!(backend.calls(Endpoint::RemoveCartItem), 0);
    }

    #[tokio::test]
    async fn test_last_remove_waits_for_server() {
        let backend = Arc::new(SandboxBackend::seeded().with_latency(Duration::from_millis(30)));
        let cart = spawn(&backend, fixtures::customer());
        cart.add_item(jollof()).await.unwrap();

        let mut watcher = cart.subscribe();
        let removing = {
            let cart = cart.clone();
            tokio::spawn(async move { cart.remove_item(MenuItemId(7)).await })
        };
        let shown = watcher
            .wait_for(|c| c.lines.iter().any(|l| l.sync == LineSync::Removing))
            .await
            .unwrap()
            .clone();
        assert_eq!(shown.quantity_of(MenuItemId(7)), 1);

        let settled = removing.await.unwrap().unwrap();
        assert!(settled.is_empty());
        assert_eq!(settled.restaurant_id, None);
        assert!(backend.server_cart(fixtures::CUSTOMER).items.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_add_rolls_back() {
        let backend = Arc::new(SandboxBackend::seeded());
        let cart = spawn(&backend, fixtures::customer());
        cart.add_item(CartEntry::FromMenu(fixtures::plantain()))
            .await
            .unwrap();

        backend.fail_next(
            Endpoint::AddCartItem,
            ApiError::rejected(404, "menu item unavailable"),
        );
        let err = cart.add_item(jollof()).await.unwrap_err();
        assert_eq!(
            err,
            CartError::Api(ApiError::rejected(404, "menu item unavailable"))
        );

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.members(), BTreeSet::from([MenuItemId(8)]));
        assert_eq!(snapshot.last_error.as_deref(), Some("menu item unavailable"));

        let viewed = cart.view_cart().await.unwrap();
        assert!(viewed.line(MenuItemId(7)).is_none());
    }

    #[tokio::test]
    async fn test_lost_reply_on_add_resyncs_to_server_truth() {
        let backend = Arc::new(SandboxBackend::seeded());
        let cart = spawn(&backend, fixtures::customer());

        // Applied on the server, but the reply never arrives.
        backend.lose_next_reply(Endpoint::AddCartItem);
        let err = cart.add_item(jollof()).await.unwrap_err();
        assert!(matches!(err, CartError::Api(ApiError::Network(_))));

        let snapshot = cart.snapshot();
        assert_eq!(
            snapshot.line(MenuItemId(7)).unwrap().sync,
            LineSync::Confirmed
        );
        assert_eq!(backend.calls(Endpoint::ViewCart), 1);
    }

    #[tokio::test]
    async fn test_lost_request_on_add_resyncs_to_absence() {
        let backend = Arc::new(SandboxBackend::seeded());
        let cart = spawn(&backend, fixtures::customer());

        backend.fail_next(Endpoint::AddCartItem, ApiError::Timeout(Duration::from_secs(10)));
        cart.add_item(jollof()).await.unwrap_err();

        assert!(cart.snapshot().is_empty());
        assert_eq!(cart.view_cart().await.unwrap().members(), BTreeSet::new());
    }

    #[tokio::test]
    async fn test_failed_remove_resyncs_instead_of_guessing() {
        let backend = Arc::new(SandboxBackend::seeded());
        let cart = spawn(&backend, fixtures::customer());
        cart.add_item(jollof()).await.unwrap();

        backend.fail_next(
            Endpoint::RemoveCartItem,
            ApiError::Network("connection reset".into()),
        );
        cart.remove_item(MenuItemId(7)).await.unwrap_err();

        let line = cart.snapshot().line(MenuItemId(7)).cloned().unwrap();
        assert_eq!(line.sync, LineSync::Confirmed);
        assert_eq!(line.item.quantity, 1);
    }

    #[tokio::test]
    async fn test_items_from_another_restaurant_are_refused_locally() {
        let backend = Arc::new(SandboxBackend::seeded());
        let cart = spawn(&backend, fixtures::customer());
        cart.add_item(jollof()).await.unwrap();

        let err = cart
            .add_item(CartEntry::FromMenu(fixtures::suya()))
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::DifferentRestaurant { .. }));
        assert_eq!(backend.calls(Endpoint::AddCartItem), 1);
    }

    #[tokio::test]
    async fn test_signed_out_session_never_reaches_the_server() {
        let backend = Arc::new(SandboxBackend::seeded());
        let cart = spawn(&backend, Session::anonymous(Role::Customer));

        assert_eq!(
            cart.add_item(jollof()).await.unwrap_err(),
            CartError::NotAuthenticated
        );
        assert_eq!(cart.view_cart().await.unwrap_err(), CartError::NotAuthenticated);
        assert_eq!(backend.calls(Endpoint::AddCartItem), 0);
        assert_eq!(backend.calls(Endpoint::ViewCart), 0);
    }

    #[tokio::test]
    async fn test_view_during_add_keeps_optimistic_line() {
        let backend = Arc::new(SandboxBackend::seeded().with_latency(Duration::from_millis(40)));
        let cart = spawn(&backend, fixtures::customer());

        let adding = {
            let cart = cart.clone();
            tokio::spawn(async move { cart.add_item(jollof()).await })
        };
        cart.subscribe().wait_for(|c| !c.is_empty()).await.unwrap();

        // The view is answered from a server cart that may not hold the item yet.
        let viewed = cart.view_cart().await.unwrap();
        assert!(viewed.line(MenuItemId(7)).is_some());

        let settled = adding.await.unwrap().unwrap();
        assert_eq!(
            settled.line(MenuItemId(7)).unwrap().sync,
            LineSync::Confirmed
        );
    }

    #[tokio::test]
    async fn test_interleaved_same_item_commands_converge() {
        let backend = Arc::new(SandboxBackend::seeded().with_latency(Duration::from_millis(5)));
        let cart = spawn(&backend, fixtures::customer());

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..6 {
            let cart = cart.clone();
            tasks.spawn(async move {
                if i % 2 == 0 {
                    cart.add_item(jollof()).await
                } else {
                    cart.remove_item(MenuItemId(7)).await
                }
            });
        }
        while tasks.join_next().await.is_some() {}

        let viewed = cart.view_cart().await.unwrap();
        let server: BTreeSet<_> = backend
            .server_cart(fixtures::CUSTOMER)
            .items
            .iter()
            .map(|i| i.menu_item_id)
            .collect();
        assert_eq!(viewed.members(), server);
        assert!(viewed.is_settled());
    }
}
