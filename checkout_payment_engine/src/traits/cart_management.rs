use crate::{db_types::OwnerId, traits::StoreError};

/// The purchaser's cart, owned by the (out of scope) user store. The reconciliation flow clears it once when a
/// payment succeeds; nothing in this engine reads it.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Empties the cart for the given owner, returning the number of entries removed. Clearing an already empty
    /// cart is a no-op.
    async fn clear_cart(&self, owner_id: &OwnerId) -> Result<u64, StoreError>;
}
