//! Demo: one order from cart to doorstep against the in-memory sandbox.
//!
//! Four sessions share one backend: a customer, the restaurant, a driver and an admin. Each
//! runs its own [`OrderingSystem`], as four browsers would.

use food_order_engine::api::{OrderingApi, Session};
use food_order_engine::config::EngineConfig;
use food_order_engine::lifecycle::{setup_tracing, OrderingSystem};
use food_order_engine::model::{CartEntry, DriverStatus, OrderStatus, StatusCategory};
use food_order_engine::sandbox::{fixtures, SandboxBackend};
use food_order_engine::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Instrument};

fn start(api: &Arc<dyn OrderingApi>, session: Session, config: &EngineConfig) -> OrderingSystem {
    OrderingSystem::start(api.clone(), session, Arc::new(MemoryStore::new()), config)
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = EngineConfig::from_env().map_err(|e| e.to_string())?;
    let backend = Arc::new(SandboxBackend::seeded().with_latency(Duration::from_millis(20)));
    let api: Arc<dyn OrderingApi> = backend.clone();

    let customer = start(&api, fixtures::customer(), &config);
    let restaurant = start(&api, fixtures::restaurant(), &config);
    let driver = start(&api, fixtures::driver(), &config);
    let admin = start(&api, fixtures::admin(), &config);

    // Customer: fill the cart and pay.
    let receipt = async {
        customer
            .cart
            .add_item(CartEntry::FromMenu(fixtures::jollof()))
            .await
            .map_err(|e| e.to_string())?;
        let redirect = customer
            .checkout
            .begin(Some(fixtures::location()))
            .await
            .map_err(|e| e.to_string())?;
        info!(url = %redirect.authorization_url, "Redirecting to gateway");

        let callback = backend
            .complete_gateway(&redirect.authorization_url, true)
            .map_err(|e| e.to_string())?;
        customer
            .checkout
            .resume(&callback)
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(tracing::info_span!("checkout"))
    .await?;
    info!(order_id = %receipt.order_id, code = %receipt.confirmation_code, "Order placed");

    // Restaurant: accept and cook.
    let outcome = async {
        restaurant
            .orders
            .refresh(StatusCategory::Pending)
            .await
            .map_err(|e| e.to_string())?;
        restaurant
            .orders
            .transition(receipt.order_id, OrderStatus::Accepted, None)
            .await
            .map_err(|e| e.to_string())?;
        restaurant
            .orders
            .transition(receipt.order_id, OrderStatus::Ready, None)
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(tracing::info_span!("kitchen"))
    .await?;
    if outcome.no_driver_available() {
        info!("No driver online yet");
    }

    // Driver: come online, pick up, deliver.
    let delivery = async {
        driver
            .status
            .set_own_status(DriverStatus::Online)
            .await
            .map_err(|e| e.to_string())?;
        driver
            .orders
            .refresh(StatusCategory::Ready)
            .await
            .map_err(|e| e.to_string())?;
        driver
            .orders
            .transition(receipt.order_id, OrderStatus::Delivering, None)
            .await
            .map_err(|e| e.to_string())?;
        driver
            .orders
            .transition(
                receipt.order_id,
                OrderStatus::Completed,
                Some(receipt.confirmation_code.clone()),
            )
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(tracing::info_span!("delivery"))
    .await;

    match delivery {
        Ok(outcome) => info!(order_id = %outcome.order.order_id, status = %outcome.order.status, "Delivered"),
        Err(e) => error!(error = %e, "Delivery failed"),
    }

    // Admin: a look over everything that finished.
    match admin.orders.refresh(StatusCategory::History).await {
        Ok(history) => info!(completed = history.len(), "Order history"),
        Err(e) => error!(error = %e, "Could not load history"),
    }

    for system in [customer, restaurant, driver, admin] {
        system.shutdown().await?;
    }

    info!("Demo completed successfully");
    Ok(())
}
