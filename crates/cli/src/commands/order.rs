//! Staff-side order handling.

use tracing::info;

use record_store_core::{OrderId, OrderState};
use record_store_storefront::db::{OrderRepository, RepositoryError};

use super::{CommandError, connect};

/// Move an order to `state`, e.g. once the bank transfer has arrived.
pub async fn set_state(id: OrderId, state: OrderState) -> Result<(), CommandError> {
    let store = connect().await?;

    match store.set_order_state(id, state).await {
        Ok(()) => {
            info!(order_id = %id, state = %state, "Order state updated");
            Ok(())
        }
        Err(RepositoryError::NotFound) => Err(CommandError::InvalidArgument(format!(
            "order {id} does not exist"
        ))),
        Err(e) => Err(e.into()),
    }
}
