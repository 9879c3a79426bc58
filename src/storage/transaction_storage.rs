use crate::models::Transaction;
use crate::storage::{Lineage, Storage};
use crate::types::TransactionId;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
struct Indexes {
    by_category: HashMap<String, BTreeSet<TransactionId>>,
    by_parent: HashMap<TransactionId, BTreeSet<TransactionId>>
}

impl Indexes {
    fn link(&mut self, transaction: &Transaction) {
        self.by_category.entry(transaction.category.clone())
            .or_default()
            .insert(transaction.id);

        if let Some(parent_id) = transaction.parent_id {
            self.by_parent.entry(parent_id)
                .or_default()
                .insert(transaction.id);
        }
    }

    fn unlink(&mut self, transaction: &Transaction) {
        if let Some(ids) = self.by_category.get_mut(&transaction.category) {
            ids.remove(&transaction.id);

            if ids.is_empty() {
                self.by_category.remove(&transaction.category);
            }
        }

        if let Some(parent_id) = transaction.parent_id {
            if let Some(ids) = self.by_parent.get_mut(&parent_id) {
                ids.remove(&transaction.id);

                if ids.is_empty() {
                    self.by_parent.remove(&parent_id);
                }
            }
        }
    }
}

/// In-memory transaction table with a category index and a parent index.
///
/// Records live in a `DashMap` so point reads only touch one shard. Both indexes sit
/// behind a single `RwLock` and every writer holds it for writing across the table insert
/// and the index updates, which serializes writers and means no index reader ever sees a
/// record in two category buckets (or in none).
pub struct TransactionStorage {
    records: DashMap<TransactionId, Transaction>,
    indexes: RwLock<Indexes>
}

struct LockedLineage<'a> {
    records: &'a DashMap<TransactionId, Transaction>
}

impl Lineage for LockedLineage<'_> {
    fn contains(&self, transaction_id: TransactionId) -> bool {
        self.records.contains_key(&transaction_id)
    }

    fn parent_of(&self, transaction_id: TransactionId) -> Option<TransactionId> {
        self.records.get(&transaction_id).and_then(|record| record.parent_id)
    }
}

impl TransactionStorage {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            indexes: RwLock::new(Indexes::default())
        }
    }

    //NOTE: Callers must hold the index write lock, that is what keeps the table and both indexes in step
    fn apply(&self, indexes: &mut Indexes, transaction: Transaction) {
        let current = transaction.clone();

        if let Some(previous) = self.records.insert(transaction.id, transaction) {
            indexes.unlink(&previous);
        }

        indexes.link(&current);
    }
}

impl Default for TransactionStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for TransactionStorage {
    fn upsert(&self, transaction: Transaction) {
        let mut indexes = self.indexes.write();
        self.apply(&mut indexes, transaction);
    }

    fn upsert_if<E, F>(&self, transaction: Transaction, check: F) -> Result<(), E>
    where
        F: FnOnce(&dyn Lineage) -> Result<(), E>
    {
        let mut indexes = self.indexes.write();

        let lineage = LockedLineage { records: &self.records };
        check(&lineage as &dyn Lineage)?;
        self.apply(&mut indexes, transaction);

        Ok(())
    }

    fn get(&self, transaction_id: TransactionId) -> Option<Transaction> {
        self.records.get(&transaction_id).map(|record| record.value().clone())
    }

    fn exists_by_id(&self, transaction_id: TransactionId) -> bool {
        self.records.contains_key(&transaction_id)
    }

    fn ids_by_type(&self, category: &str) -> Vec<TransactionId> {
        self.indexes.read()
            .by_category
            .get(category)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    fn children_of(&self, parent_id: TransactionId) -> Vec<Transaction> {
        let indexes = self.indexes.read();

        let Some(child_ids) = indexes.by_parent.get(&parent_id) else {
            return Vec::new();
        };

        child_ids.iter()
            .filter_map(|child_id| self.get(*child_id))
            .collect()
    }

    fn all(&self) -> Vec<Transaction> {
        //NOTE: Holding the read lock keeps writers out, so the copy is one consistent state rather than a shard-by-shard blend
        let _indexes = self.indexes.read();

        let mut transactions: Vec<Transaction> = self.records.iter()
            .map(|record| record.value().clone())
            .collect();

        transactions.sort_by_key(|transaction| transaction.id);
        transactions
    }
}
