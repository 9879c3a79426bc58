mod transaction_storage;

use crate::models::Transaction;
use crate::types::TransactionId;

pub use transaction_storage::TransactionStorage;

/// Read-only view of the parent links, handed to write checks while the writer lock is held.
pub trait Lineage {
    fn contains(&self, transaction_id: TransactionId) -> bool;
    /// The parent of `transaction_id`, or `None` for roots and unknown ids.
    fn parent_of(&self, transaction_id: TransactionId) -> Option<TransactionId>;
}

/// Every collection returned from a `Storage` is an owned copy; nothing aliases internal state.
pub trait Storage: Send + Sync + 'static {
    fn upsert(&self, transaction: Transaction);
    /// Runs `check` and, only if it passes, applies the upsert, all inside one write section.
    fn upsert_if<E, F>(&self, transaction: Transaction, check: F) -> Result<(), E>
    where
        F: FnOnce(&dyn Lineage) -> Result<(), E>;
    fn get(&self, transaction_id: TransactionId) -> Option<Transaction>;
    fn exists_by_id(&self, transaction_id: TransactionId) -> bool;
    fn ids_by_type(&self, category: &str) -> Vec<TransactionId>;
    fn children_of(&self, parent_id: TransactionId) -> Vec<Transaction>;
    fn all(&self) -> Vec<Transaction>;
}
