use crate::types::{Amount, TransactionId};

/// A single financial record and its optional link into the hierarchy.
///
/// Records with no `parent_id` are roots. Every write to the same `id` replaces
/// all of the other fields, including `category` and `parent_id`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Transaction {
    /// Caller supplied identifier, stable for the lifetime of the record.
    pub id: TransactionId,
    /// Strictly positive exact amount.
    pub amount: Amount,
    /// The category label (`type` on the wire).
    pub category: String,
    /// The parent this record rolls up into, if any.
    pub parent_id: Option<TransactionId>
}

impl Transaction {
    pub fn new(id: TransactionId, amount: Amount, category: impl Into<String>, parent_id: Option<TransactionId>) -> Self {
        Self {
            id,
            amount,
            category: category.into(),
            parent_id
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
