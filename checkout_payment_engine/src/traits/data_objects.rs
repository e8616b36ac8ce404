use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId};

/// Result of a conditional order deletion. Only `Deleted` means a row was removed; the other outcomes exist so
/// that the reconciliation flow can log an accurate account of what a redelivered or out-of-order event did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyPaid,
    NotFound,
}

/// What processing one verified gateway event amounted to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventOutcome {
    /// The order transitioned `Unpaid` -> `Paid` and the owner's cart was cleared.
    Confirmed(Order),
    /// The unpaid order was removed after a failed payment.
    Annulled(OrderId),
    /// A replayed or out-of-order event; nothing changed.
    NoOp,
    /// An event kind outside the recognized set; acknowledged and ignored.
    Ignored,
}
