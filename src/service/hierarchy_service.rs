use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::{HierarchyError, Transaction};
use crate::storage::{Lineage, Storage};
use crate::types::{Amount, TransactionId};

/// The only write path into a [`Storage`].
///
/// Parent references are validated against the live lineage before a record is stored,
/// so the stored graph is always a forest whose parents all exist.
pub struct HierarchyService<S: Storage> {
    storage: Arc<S>
}

impl<S: Storage> HierarchyService<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Creates the transaction or replaces every field of an existing one.
    ///
    /// # Errors
    /// Returns `HierarchyError::InvalidParent` if `parent_id`:
    /// - equals `id`.
    /// - does not reference a stored transaction.
    /// - would put `id` into its own ancestor chain.
    pub fn create_or_update(
        &self,
        id: TransactionId,
        amount: Amount,
        category: impl Into<String>,
        parent_id: Option<TransactionId>
    ) -> Result<Transaction, HierarchyError> {
        let transaction = Transaction::new(id, amount, category, parent_id);

        let result = self.storage.upsert_if(transaction.clone(), |lineage| {
            match parent_id {
                Some(parent_id) => validate_parent(lineage, id, parent_id),
                None => Ok(())
            }
        });

        match result {
            Ok(()) => {
                if transaction.is_root() {
                    debug!("Root transaction [{id}]:[{}] stored", transaction.category);
                } else {
                    debug!("Transaction [{id}]:[{}] stored under parent [{parent_id:?}]", transaction.category);
                }
                Ok(transaction)
            },
            Err(error) => {
                warn!("{error}");
                Err(error)
            }
        }
    }

    pub fn get_by_id(&self, id: TransactionId) -> Result<Transaction, HierarchyError> {
        self.storage.get(id).ok_or_else(|| HierarchyError::not_found(id))
    }

    pub fn ids_by_type(&self, category: &str) -> Vec<TransactionId> {
        self.storage.ids_by_type(category)
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.storage.all()
    }

    /// Sums the amount of `id` and of every transaction below it.
    ///
    /// The walk uses an explicit stack and a visited set, so deep chains cannot exhaust
    /// the call stack and a node reached twice is only counted once.
    ///
    /// # Errors
    /// Returns `HierarchyError::NotFound` if `id` is not stored,
    /// `HierarchyError::Overflow` if the total leaves the decimal range, and
    /// `HierarchyError::PrecisionLoss` if the total would need rounding.
    pub fn calculate_sum(&self, id: TransactionId) -> Result<Decimal, HierarchyError> {
        let root = self.get_by_id(id)?;

        let mut visited = HashSet::from([root.id]);
        let mut pending = vec![root];
        let mut total = Decimal::ZERO;

        while let Some(current) = pending.pop() {
            total = exact_add(total, current.amount.value(), id)?;

            for child in self.storage.children_of(current.id) {
                if visited.insert(child.id) {
                    pending.push(child);
                }
            }
        }

        Ok(total)
    }
}

//NOTE: Decimal rounds away fractional digits once a result needs more than 28 of them, a shrinking scale is how that shows
fn exact_add(total: Decimal, amount: Decimal, id: TransactionId) -> Result<Decimal, HierarchyError> {
    let sum = total.checked_add(amount).ok_or_else(|| HierarchyError::overflow(id))?;

    if sum.scale() < total.scale().max(amount.scale()) {
        return Err(HierarchyError::precision_loss(id));
    }

    Ok(sum)
}

fn validate_parent(lineage: &dyn Lineage, id: TransactionId, parent_id: TransactionId) -> Result<(), HierarchyError> {
    if parent_id == id {
        return Err(HierarchyError::self_parent(id));
    }

    if !lineage.contains(parent_id) {
        return Err(HierarchyError::missing_parent(id, parent_id));
    }

    if would_create_cycle(lineage, id, parent_id) {
        return Err(HierarchyError::cycle(id, parent_id));
    }

    Ok(())
}

/// Walks up from `proposed_parent_id` looking for `transaction_id`.
///
/// A revisited node also counts as a cycle. Reaching a root or a dangling reference ends
/// the walk without one.
pub(crate) fn would_create_cycle(lineage: &dyn Lineage, transaction_id: TransactionId, proposed_parent_id: TransactionId) -> bool {
    let mut visited = HashSet::new();
    let mut current = Some(proposed_parent_id);

    while let Some(current_id) = current {
        if current_id == transaction_id || !visited.insert(current_id) {
            return true;
        }

        current = lineage.parent_of(current_id);
    }

    false
}
