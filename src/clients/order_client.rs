use crate::model::{DriverId, Order, OrderId, OrderStatus, StatusCategory};
use crate::order_actor::{OrderBoard, OrderCommand, OrderError, OrderOutput, TransitionOutcome};
use reconcile_actor::{ActorClient, ResourceClient};
use tracing::{debug, instrument};

/// Client for the Order State Machine.
///
/// Transitions on one order are single-flight: while one awaits acknowledgement, another
/// for the same order fails with [`OrderError::is_in_flight`].
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<OrderBoard>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<OrderBoard>) -> Self {
        Self { inner }
    }

    /// Polls the server for one category and updates the board.
    #[instrument(skip(self))]
    pub async fn refresh(&self, category: StatusCategory) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        match self.inner.send(OrderCommand::Refresh(category)).await? {
            OrderOutput::Orders(orders) => Ok(orders),
            other => Err(unexpected(other)),
        }
    }

    /// Moves an order as the session's role. `code` is the customer's confirmation code,
    /// required when a driver completes a delivery.
    #[instrument(skip(self, code))]
    pub async fn transition(
        &self,
        order_id: OrderId,
        to: OrderStatus,
        code: Option<String>,
    ) -> Result<TransitionOutcome, OrderError> {
        debug!("Sending request");
        let command = OrderCommand::Transition { order_id, to, code };
        match self.inner.send(command).await? {
            OrderOutput::Transitioned(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn admin_override(
        &self,
        order_id: OrderId,
        to: OrderStatus,
        driver_id: Option<DriverId>,
    ) -> Result<Order, OrderError> {
        debug!("Sending request");
        let command = OrderCommand::AdminOverride {
            order_id,
            to,
            driver_id,
        };
        match self.inner.send(command).await? {
            OrderOutput::Transitioned(outcome) => Ok(outcome.order),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, order), fields(order_id = %order.order_id))]
    pub async fn track(&self, order: Order) -> Result<Order, OrderError> {
        match self.inner.send(OrderCommand::Track(order)).await? {
            OrderOutput::Tracked(order) => Ok(order),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(output: OrderOutput) -> OrderError {
    OrderError::UnexpectedOutput(format!("{output:?}"))
}

impl ActorClient<OrderBoard> for OrderClient {
    fn inner(&self) -> &ResourceClient<OrderBoard> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_actor::OrderBoardSnapshot;
    use reconcile_actor::mock::{create_mock_client, expect_command};
    use reconcile_actor::FrameworkError;

    #[tokio::test]
    async fn test_transition_carries_code() {
        let (client, mut receiver) =
            create_mock_client::<OrderBoard>(10, OrderBoardSnapshot::default());
        let orders = OrderClient::new(client);

        let handle = tokio::spawn(async move {
            orders
                .transition(OrderId(3), OrderStatus::Completed, Some("9153".into()))
                .await
        });

        let (command, responder) = expect_command(&mut receiver).await.unwrap();
        assert_eq!(
            command,
            OrderCommand::Transition {
                order_id: OrderId(3),
                to: OrderStatus::Completed,
                code: Some("9153".into()),
            }
        );
        responder
            .send(Err(FrameworkError::LaneBusy("order_3".into()).into()))
            .unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert!(err.is_in_flight());
    }
}
