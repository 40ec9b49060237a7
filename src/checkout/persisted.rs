//! The checkout state that has to survive the payment redirect.

use crate::model::{CartItem, DeliveryLocation, OrderId, RestaurantId};
use crate::store::{KeyValueStore, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const PENDING_KEY: &str = "checkout.pending";
const RECEIPT_KEY: &str = "checkout.receipt";

/// A payment in progress. Written before the gateway call, removed once verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub restaurant_id: RestaurantId,
    pub total: u64,
    pub callback_id: String,
    /// Assigned by the gateway; known only after the redirect back.
    pub reference: Option<String>,
    pub amount_pending: u64,
    pub location: DeliveryLocation,
    pub items: Vec<CartItem>,
    /// Why the last verification attempt failed, if it did.
    #[serde(default)]
    pub last_failure: Option<String>,
}

/// What the customer keeps after a verified payment. The confirmation code is handed to
/// the driver at the door, so it stays until the order completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub confirmation_code: String,
    pub reference: String,
    pub total: u64,
}

/// Typed view over a [`KeyValueStore`].
#[derive(Clone)]
pub struct CheckoutStore {
    inner: Arc<dyn KeyValueStore>,
}

impl CheckoutStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub fn pending(&self) -> Result<Option<PaymentSession>, StoreError> {
        self.read(PENDING_KEY)
    }

    pub fn save_pending(&self, session: &PaymentSession) -> Result<(), StoreError> {
        self.write(PENDING_KEY, session)
    }

    pub fn clear_pending(&self) -> Result<(), StoreError> {
        self.inner.remove(PENDING_KEY)
    }

    /// Clears the pending session only if it is still the one started under `callback_id`.
    /// Returns whether anything was removed.
    pub fn clear_pending_for(&self, callback_id: &str) -> Result<bool, StoreError> {
        match self.pending()? {
            Some(pending) if pending.callback_id == callback_id => {
                self.clear_pending()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn receipt(&self) -> Result<Option<CheckoutReceipt>, StoreError> {
        self.read(RECEIPT_KEY)
    }

    pub fn save_receipt(&self, receipt: &CheckoutReceipt) -> Result<(), StoreError> {
        self.write(RECEIPT_KEY, receipt)
    }

    pub fn clear_receipt(&self) -> Result<(), StoreError> {
        self.inner.remove(RECEIPT_KEY)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.inner
            .get(key)?
            .map(|raw| serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(e.to_string())))
            .transpose()
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.inner.set(key, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_pending_and_receipt_are_independent() {
        let store = CheckoutStore::new(Arc::new(MemoryStore::new()));
        store
            .save_receipt(&CheckoutReceipt {
                order_id: OrderId(1),
                confirmation_code: "4821".into(),
                reference: "abc123".into(),
                total: 1800,
            })
            .unwrap();
        store
            .save_pending(&PaymentSession {
                restaurant_id: RestaurantId(1),
                total: 900,
                callback_id: "cb".into(),
                reference: None,
                amount_pending: 900,
                location: DeliveryLocation {
                    address: "12 Allen Avenue".into(),
                    latitude: 6.6,
                    longitude: 3.35,
                },
                items: vec![],
                last_failure: None,
            })
            .unwrap();

        store.clear_pending().unwrap();

        assert_eq!(store.pending().unwrap(), None);
        assert_eq!(store.receipt().unwrap().unwrap().confirmation_code, "4821");
    }

    #[test]
    fn test_garbage_under_a_key_is_corrupt() {
        let raw = Arc::new(MemoryStore::new());
        raw.set(PENDING_KEY, "{".into()).unwrap();
        let store = CheckoutStore::new(raw);
        assert!(matches!(store.pending(), Err(StoreError::Corrupt(_))));
    }
}
