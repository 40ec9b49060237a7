//! # Checkout Coordinator
//!
//! Turns a settled cart into a payment, hands the browser to the gateway and picks the
//! payment back up when the browser returns.
//!
//! Everything needed after the redirect lives in the [`CheckoutStore`], written before the
//! gateway is called, so a coordinator built fresh after a full reload resumes where the
//! last one left off:
//!
//! ```text
//! begin()  -> pending session saved -> initialize_checkout -> authorization URL
//! resume() -> reference saved       -> verify_payment      -> receipt saved, pending cleared
//! ```
//!
//! A failed verification keeps the pending session, so
//! [`retry_verification`](CheckoutCoordinator::retry_verification) can try again without
//! starting a second payment.
//!
//! Clones share one writer lock. A second `begin` while one is in flight is refused with
//! [`CheckoutError::CheckoutInProgress`]; resumes wait their turn.

use crate::api::{CheckoutRequest, OrderingApi, PaymentReceipt, Session};
use crate::checkout::{CheckoutError, CheckoutReceipt, CheckoutStore, PaymentSession};
use crate::clients::{CartClient, OrderClient};
use crate::model::{DeliveryLocation, Role};
use reconcile_actor::ActorClient;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Where to send the browser next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub authorization_url: String,
    pub callback_id: String,
}

/// Where the current checkout stands, read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutPhase {
    Idle,
    /// Waiting for the browser to come back from the gateway.
    Pending,
    /// Back from the gateway with a reference, not verified yet.
    Resumed,
    Verified(CheckoutReceipt),
    /// The last verification failed. Retry it or start over.
    Failed(String),
}

#[derive(Clone)]
pub struct CheckoutCoordinator {
    api: Arc<dyn OrderingApi>,
    session: Session,
    store: CheckoutStore,
    cart: CartClient,
    orders: OrderClient,
    delivery_fee: u64,
    callback_url: String,
    writer: Arc<Mutex<()>>,
}

impl CheckoutCoordinator {
    pub fn new(
        api: Arc<dyn OrderingApi>,
        session: Session,
        store: CheckoutStore,
        cart: CartClient,
        orders: OrderClient,
        delivery_fee: u64,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            api,
            session,
            store,
            cart,
            orders,
            delivery_fee,
            callback_url: callback_url.into(),
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn phase(&self) -> Result<CheckoutPhase, CheckoutError> {
        if let Some(pending) = self.store.pending()? {
            return Ok(match (pending.reference, pending.last_failure) {
                (_, Some(failure)) => CheckoutPhase::Failed(failure),
                (Some(_), None) => CheckoutPhase::Resumed,
                (None, None) => CheckoutPhase::Pending,
            });
        }
        Ok(match self.store.receipt()? {
            Some(receipt) => CheckoutPhase::Verified(receipt),
            None => CheckoutPhase::Idle,
        })
    }

    /// The receipt of the last verified payment, kept until its order completes.
    pub fn receipt(&self) -> Result<Option<CheckoutReceipt>, CheckoutError> {
        Ok(self.store.receipt()?)
    }

    /// Starts a payment for the current cart.
    ///
    /// Preconditions are checked locally, before anything is written or sent. The pending
    /// session is persisted before the gateway call; if the call fails it is discarded,
    /// since no payment exists to resume. Only one `begin` runs at a time.
    #[instrument(skip(self, location))]
    pub async fn begin(
        &self,
        location: Option<DeliveryLocation>,
    ) -> Result<CheckoutRedirect, CheckoutError> {
        self.require_customer()?;
        let _writer = self
            .writer
            .try_lock()
            .map_err(|_| CheckoutError::CheckoutInProgress)?;
        if let Some(pending) = self.store.pending()? {
            if let Some(reference) = pending.reference {
                return Err(CheckoutError::AwaitingVerification(reference));
            }
        }

        let cart = self.cart.snapshot();
        let restaurant_id = match cart.restaurant_id {
            Some(id) if !cart.is_empty() => id,
            _ => return Err(CheckoutError::EmptyCart),
        };
        if !cart.is_settled() {
            return Err(CheckoutError::CartNotSettled);
        }
        let location = location.ok_or(CheckoutError::MissingLocation)?;

        let total = cart.subtotal() + self.delivery_fee;
        let callback_id = Uuid::new_v4().to_string();
        let pending = PaymentSession {
            restaurant_id,
            total,
            callback_id: callback_id.clone(),
            reference: None,
            amount_pending: total,
            location: location.clone(),
            items: cart.items(),
            last_failure: None,
        };
        self.store.save_pending(&pending)?;

        let request = CheckoutRequest {
            restaurant_id,
            total,
            callback_id: callback_id.clone(),
            callback_url: self.callback_url.clone(),
            location,
            items: pending.items,
        };
        match self.api.initialize_checkout(&self.session, request).await {
            Ok(init) => {
                info!(%restaurant_id, total, %callback_id, "Checkout initialized");
                Ok(CheckoutRedirect {
                    authorization_url: init.authorization_url,
                    callback_id,
                })
            }
            Err(e) => {
                warn!(error = %e, %callback_id, "Checkout initialization failed");
                if !self.store.clear_pending_for(&callback_id)? {
                    warn!(%callback_id, "Pending checkout was replaced, leaving it");
                }
                Err(e.into())
            }
        }
    }

    /// Picks the payment back up from the redirect's query string.
    ///
    /// Accepts either the bare query (`reference=abc123`) or the whole callback URL. A
    /// reference that was already verified returns the stored receipt without a call.
    #[instrument(skip(self))]
    pub async fn resume(&self, query: &str) -> Result<CheckoutReceipt, CheckoutError> {
        self.require_customer()?;
        let reference = reference_from_query(query).ok_or(CheckoutError::MissingReference)?;
        let _writer = self.writer.lock().await;

        let Some(mut pending) = self.store.pending()? else {
            return match self.store.receipt()? {
                Some(receipt) if receipt.reference == reference => {
                    info!(%reference, "Payment already verified");
                    Ok(receipt)
                }
                _ => Err(CheckoutError::NoPendingCheckout),
            };
        };

        pending.reference = Some(reference);
        pending.last_failure = None;
        self.store.save_pending(&pending)?;
        self.verify(pending).await
    }

    /// Verifies the pending payment again after a failed [`resume`](Self::resume).
    #[instrument(skip(self))]
    pub async fn retry_verification(&self) -> Result<CheckoutReceipt, CheckoutError> {
        self.require_customer()?;
        let _writer = self.writer.lock().await;
        let pending = self
            .store
            .pending()?
            .ok_or(CheckoutError::NoPendingCheckout)?;
        if pending.reference.is_none() {
            return Err(CheckoutError::MissingReference);
        }
        self.verify(pending).await
    }

    async fn verify(&self, mut pending: PaymentSession) -> Result<CheckoutReceipt, CheckoutError> {
        let reference = pending
            .reference
            .clone()
            .ok_or(CheckoutError::MissingReference)?;

        let reply = self
            .api
            .verify_payment(&self.session, pending.restaurant_id, &reference)
            .await;

        match reply {
            Ok(receipt) => self.finish(receipt, reference).await,
            Err(e) => {
                warn!(reference, error = %e, "Payment verification failed");
                pending.last_failure = Some(e.to_string());
                self.store.save_pending(&pending)?;
                Err(e.into())
            }
        }
    }

    async fn finish(
        &self,
        reply: PaymentReceipt,
        reference: String,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let receipt = CheckoutReceipt {
            order_id: reply.order_id,
            confirmation_code: reply.confirmation_code,
            reference,
            total: reply.order.total,
        };
        self.store.save_receipt(&receipt)?;
        self.store.clear_pending()?;
        info!(
            order_id = %receipt.order_id,
            already_verified = reply.already_verified,
            "Payment verified"
        );

        // The order exists now; local bookkeeping failures are logged, not returned.
        if let Err(e) = self.cart.clear().await {
            warn!(error = %e, "Could not clear cart after checkout");
        }
        if let Err(e) = self.orders.track(reply.order).await {
            warn!(error = %e, "Could not track new order");
        }
        Ok(receipt)
    }

    fn require_customer(&self) -> Result<(), CheckoutError> {
        if !self.session.is_authenticated() {
            return Err(CheckoutError::NotAuthenticated);
        }
        if self.session.role != Role::Customer {
            return Err(CheckoutError::NotCustomer(self.session.role));
        }
        Ok(())
    }
}

fn reference_from_query(query: &str) -> Option<String> {
    let query = query.split_once('?').map_or(query, |(_, q)| q);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "reference")
        .map(|(_, value)| decode_query_value(value))
        .filter(|value| !value.is_empty())
}

/// Form-decodes one query value: `+` is a space and `%XX` a byte. A malformed escape is
/// kept as written.
fn decode_query_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' => {
                let escape = value
                    .get(i + 1..i + 3)
                    .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match escape {
                    Some(byte) => {
                        decoded.push(byte);
                        i += 2;
                    }
                    None => decoded.push(b'%'),
                }
            }
            other => decoded.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::model::{CartEntry, OrderStatus};
    use crate::sandbox::{fixtures, Endpoint, SandboxBackend};
    use crate::store::MemoryStore;
    use std::time::Duration;

    struct Harness {
        backend: Arc<SandboxBackend>,
        store: MemoryStore,
        cart: CartClient,
        orders: OrderClient,
        checkout: CheckoutCoordinator,
    }

    fn harness(backend: SandboxBackend) -> Harness {
        let backend = Arc::new(backend);
        let api: Arc<dyn OrderingApi> = backend.clone();
        let session = fixtures::customer();
        let store = MemoryStore::new();
        let checkout_store = CheckoutStore::new(Arc::new(store.clone()));

        let (cart_actor, cart) = crate::cart_actor::new(8);
        tokio::spawn(cart_actor.run((api.clone(), session.clone())));
        let (status_actor, status) = crate::status_actor::new(8);
        tokio::spawn(status_actor.run((api.clone(), session.clone())));
        let (order_actor, orders) = crate::order_actor::new(8);
        tokio::spawn(order_actor.run((api.clone(), session.clone(), status, checkout_store.clone())));

        let checkout = CheckoutCoordinator::new(
            api,
            session,
            checkout_store,
            cart.clone(),
            orders.clone(),
            300,
            "http://localhost:3000/checkout",
        );
        Harness {
            backend,
            store,
            cart,
            orders,
            checkout,
        }
    }

    /// Rebuilds the coordinator over the same store, as a page reload would.
    fn reloaded(h: &Harness) -> CheckoutCoordinator {
        CheckoutCoordinator::new(
            h.backend.clone(),
            fixtures::customer(),
            CheckoutStore::new(Arc::new(h.store.clone())),
            h.cart.clone(),
            h.orders.clone(),
            300,
            "http://localhost:3000/checkout",
        )
    }

    #[test]
    fn test_reference_parsing() {
        assert_eq!(reference_from_query("reference=abc123").as_deref(), Some("abc123"));
        assert_eq!(
            reference_from_query("http://localhost:3000/checkout?trxref=x&reference=abc123")
                .as_deref(),
            Some("abc123")
        );
        assert_eq!(reference_from_query("?reference="), None);
        assert_eq!(reference_from_query("status=ok"), None);
    }

    #[test]
    fn test_reference_is_percent_decoded() {
        assert_eq!(
            reference_from_query("?reference=ref%2B1%2F2").as_deref(),
            Some("ref+1/2")
        );
        assert_eq!(reference_from_query("reference=a+b").as_deref(), Some("a b"));
        assert_eq!(reference_from_query("reference=caf%C3%A9").as_deref(), Some("café"));
        // Not an escape: kept literally.
        assert_eq!(reference_from_query("reference=50%zz").as_deref(), Some("50%zz"));
        assert_eq!(reference_from_query("reference=100%").as_deref(), Some("100%"));
        assert_eq!(reference_from_query("reference=a%+f").as_deref(), Some("a% f"));
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected_locally() {
        let h = harness(SandboxBackend::seeded());

        let err = h.checkout.begin(Some(fixtures::location())).await.unwrap_err();

        assert_eq!(err, CheckoutError::EmptyCart);
        assert_eq!(h.backend.calls(Endpoint::InitializeCheckout), 0);
        assert_eq!(h.checkout.phase().unwrap(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_missing_location_is_rejected_locally() {
        let h = harness(SandboxBackend::seeded());
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();

        let err = h.checkout.begin(None).await.unwrap_err();

        assert_eq!(err, CheckoutError::MissingLocation);
        assert_eq!(h.backend.calls(Endpoint::InitializeCheckout), 0);
    }

    #[tokio::test]
    async fn test_total_includes_delivery_fee_and_local_quantities() {
        let h = harness(SandboxBackend::seeded());
        h.backend.queue_reference("abc123");
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();

        h.checkout.begin(Some(fixtures::location())).await.unwrap();

        let pending = CheckoutStore::new(Arc::new(h.store.clone()))
            .pending()
            .unwrap()
            .unwrap();
        assert_eq!(pending.total, 2 * 1500 + 300);
        assert_eq!(pending.items[0].quantity, 2);
        assert_eq!(h.checkout.phase().unwrap(), CheckoutPhase::Pending);
    }

    #[tokio::test]
    async fn test_pending_session_is_written_before_the_gateway_call() {
        let h = harness(SandboxBackend::seeded().with_latency(Duration::from_millis(100)));
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();

        let checkout = h.checkout.clone();
        let begin = tokio::spawn(async move { checkout.begin(Some(fixtures::location())).await });
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(h.checkout.phase().unwrap(), CheckoutPhase::Pending);
        begin.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_failed_initialization_discards_pending_session() {
        let h = harness(SandboxBackend::seeded());
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();
        h.backend
            .fail_next(Endpoint::InitializeCheckout, ApiError::Network("down".into()));

        let err = h.checkout.begin(Some(fixtures::location())).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Api(ApiError::Network(_))));
        assert_eq!(h.checkout.phase().unwrap(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_concurrent_begin_starts_one_payment() {
        let h = harness(SandboxBackend::seeded().with_latency(Duration::from_millis(50)));
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();

        let (first, second) = tokio::join!(
            h.checkout.begin(Some(fixtures::location())),
            h.checkout.begin(Some(fixtures::location())),
        );

        let redirect = match (first, second) {
            (Ok(redirect), Err(err)) | (Err(err), Ok(redirect)) => {
                assert_eq!(err, CheckoutError::CheckoutInProgress);
                redirect
            }
            other => panic!("expected exactly one checkout to start, got {other:?}"),
        };
        assert_eq!(h.backend.calls(Endpoint::InitializeCheckout), 1);
        let pending = CheckoutStore::new(Arc::new(h.store.clone()))
            .pending()
            .unwrap()
            .unwrap();
        assert_eq!(pending.callback_id, redirect.callback_id);
    }

    #[tokio::test]
    async fn test_failed_begin_keeps_a_newer_pending_session() {
        let h = harness(SandboxBackend::seeded().with_latency(Duration::from_millis(100)));
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();
        h.backend
            .fail_next(Endpoint::InitializeCheckout, ApiError::Network("down".into()));

        let checkout = h.checkout.clone();
        let failing = tokio::spawn(async move { checkout.begin(Some(fixtures::location())).await });
        tokio::time::sleep(Duration::from_millis(30)).await;

        // A second tab over the same storage starts its own checkout meanwhile.
        let redirect = reloaded(&h).begin(Some(fixtures::location())).await.unwrap();

        assert!(matches!(
            failing.await.unwrap(),
            Err(CheckoutError::Api(ApiError::Network(_)))
        ));
        let pending = CheckoutStore::new(Arc::new(h.store.clone()))
            .pending()
            .unwrap()
            .expect("the second tab's session was discarded");
        assert_eq!(pending.callback_id, redirect.callback_id);
        assert_eq!(h.checkout.phase().unwrap(), CheckoutPhase::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_resumes_verify_once() {
        let h = harness(SandboxBackend::seeded().with_latency(Duration::from_millis(20)));
        h.backend.queue_reference("abc123");
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();
        let redirect = h.checkout.begin(Some(fixtures::location())).await.unwrap();
        let callback = h
            .backend
            .complete_gateway(&redirect.authorization_url, true)
            .unwrap();

        let (first, second) = tokio::join!(h.checkout.resume(&callback), h.checkout.resume(&callback));

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(h.backend.calls(Endpoint::VerifyPayment), 1);
        assert_eq!(h.backend.order_count(), 1);
    }

    #[tokio::test]
    async fn test_encoded_reference_is_verified_decoded() {
        let h = harness(SandboxBackend::seeded());
        h.backend.queue_reference("T+1/2");
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();
        let redirect = h.checkout.begin(Some(fixtures::location())).await.unwrap();
        let callback = h
            .backend
            .complete_gateway(&redirect.authorization_url, true)
            .unwrap();
        assert!(callback.ends_with("?reference=T%2B1%2F2"));

        let receipt = h.checkout.resume(&callback).await.unwrap();
        assert_eq!(receipt.reference, "T+1/2");

        // The stored receipt matches the same redirect delivered again.
        assert_eq!(h.checkout.resume(&callback).await.unwrap(), receipt);
        assert_eq!(h.backend.calls(Endpoint::VerifyPayment), 1);
    }

    #[tokio::test]
    async fn test_resume_after_reload_verifies_and_hands_over_order() {
        let h = harness(SandboxBackend::seeded());
        h.backend.queue_reference("abc123");
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();
        let redirect = h.checkout.begin(Some(fixtures::location())).await.unwrap();
        let callback = h
            .backend
            .complete_gateway(&redirect.authorization_url, true)
            .unwrap();

        let receipt = reloaded(&h).resume(&callback).await.unwrap();

        assert_eq!(receipt.reference, "abc123");
        assert_eq!(receipt.total, 1800);
        assert_eq!(
            Some(receipt.confirmation_code.clone()),
            h.backend.confirmation_code(receipt.order_id)
        );
        assert_eq!(h.checkout.phase().unwrap(), CheckoutPhase::Verified(receipt.clone()));
        assert!(h.cart.snapshot().is_empty());
        assert_eq!(
            h.orders.snapshot().status_of(receipt.order_id),
            Some(OrderStatus::Pending)
        );
    }

    #[tokio::test]
    async fn test_duplicate_resume_does_not_call_again() {
        let h = harness(SandboxBackend::seeded());
        h.backend.queue_reference("abc123");
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();
        let redirect = h.checkout.begin(Some(fixtures::location())).await.unwrap();
        h.backend.complete_gateway(&redirect.authorization_url, true).unwrap();

        let first = h.checkout.resume("reference=abc123").await.unwrap();
        let second = h.checkout.resume("reference=abc123").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.backend.calls(Endpoint::VerifyPayment), 1);
        assert_eq!(h.backend.order_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_verification_can_be_retried() {
        let h = harness(SandboxBackend::seeded());
        h.backend.queue_reference("abc123");
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();
        let redirect = h.checkout.begin(Some(fixtures::location())).await.unwrap();

        // Back from the gateway before the payment went through.
        let err = h.checkout.resume("reference=abc123").await.unwrap_err();
        assert_eq!(
            err,
            CheckoutError::Api(ApiError::rejected(402, "payment not completed"))
        );
        assert_eq!(
            h.checkout.phase().unwrap(),
            CheckoutPhase::Failed("payment not completed".into())
        );

        h.backend.complete_gateway(&redirect.authorization_url, true).unwrap();
        let receipt = h.checkout.retry_verification().await.unwrap();

        assert_eq!(receipt.reference, "abc123");
        assert_eq!(h.backend.calls(Endpoint::InitializeCheckout), 1);
    }

    #[tokio::test]
    async fn test_lost_verification_reply_is_safe_to_retry() {
        let h = harness(SandboxBackend::seeded());
        h.backend.queue_reference("abc123");
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();
        let redirect = h.checkout.begin(Some(fixtures::location())).await.unwrap();
        h.backend.complete_gateway(&redirect.authorization_url, true).unwrap();
        h.backend.lose_next_reply(Endpoint::VerifyPayment);

        assert!(h.checkout.resume("reference=abc123").await.is_err());
        let receipt = h.checkout.retry_verification().await.unwrap();

        assert_eq!(h.backend.order_count(), 1);
        assert_eq!(h.backend.order(receipt.order_id).unwrap().total, 1800);
    }

    #[tokio::test]
    async fn test_no_new_payment_while_one_awaits_verification() {
        let h = harness(SandboxBackend::seeded());
        h.backend.queue_reference("abc123");
        h.cart.add_item(CartEntry::FromMenu(fixtures::jollof())).await.unwrap();
        h.checkout.begin(Some(fixtures::location())).await.unwrap();
        assert!(h.checkout.resume("reference=abc123").await.is_err());

        let err = h.checkout.begin(Some(fixtures::location())).await.unwrap_err();

        assert_eq!(err, CheckoutError::AwaitingVerification("abc123".into()));
        assert_eq!(h.backend.calls(Endpoint::InitializeCheckout), 1);
    }

    #[tokio::test]
    async fn test_resume_without_pending_checkout() {
        let h = harness(SandboxBackend::seeded());

        let err = h.checkout.resume("reference=abc123").await.unwrap_err();

        assert_eq!(err, CheckoutError::NoPendingCheckout);
        assert_eq!(h.backend.calls(Endpoint::VerifyPayment), 0);
    }
}
