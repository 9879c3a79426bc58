use super::HierarchyService;
use super::hierarchy_service::would_create_cycle;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::models::{HierarchyError, Transaction};
use crate::storage::{Lineage, Storage, TransactionStorage};
use crate::types::{Amount, TransactionId};

fn create_service() -> (Arc<TransactionStorage>, HierarchyService<TransactionStorage>) {
    let storage = Arc::new(TransactionStorage::new());
    let service = HierarchyService::new(storage.clone());
    (storage, service)
}

fn amount(value: &str) -> Result<Amount> {
    Ok(Amount::from_str(value)?)
}

struct FixedLineage(HashMap<TransactionId, Option<TransactionId>>);

impl Lineage for FixedLineage {
    fn contains(&self, transaction_id: TransactionId) -> bool {
        self.0.contains_key(&transaction_id)
    }

    fn parent_of(&self, transaction_id: TransactionId) -> Option<TransactionId> {
        self.0.get(&transaction_id).copied().flatten()
    }
}

fn reaches_root(storage: &TransactionStorage, start: TransactionId) -> bool {
    let mut steps = 0;
    let mut current = storage.get(start);

    while let Some(transaction) = current {
        steps += 1;
        if steps > 1_000 {
            return false;
        }

        match transaction.parent_id {
            Some(parent_id) => current = storage.get(parent_id),
            None => return true
        }
    }

    false
}

#[test]
fn test_create_then_get_returns_stored_transaction() -> Result<()> {
    let (_, service) = create_service();

    let created = service.create_or_update(10, amount("5000")?, "cars", None)?;
    let fetched = service.get_by_id(10)?;

    assert_eq!(created, fetched);
    assert_eq!(fetched.parent_id, None);

    Ok(())
}

#[test]
fn test_get_missing_transaction_fails_with_not_found() {
    let (_, service) = create_service();

    assert_eq!(service.get_by_id(42), Err(HierarchyError::not_found(42)));
}

#[test]
fn test_update_replaces_every_field() -> Result<()> {
    let (_, service) = create_service();
    service.create_or_update(1, amount("10")?, "cars", None)?;
    service.create_or_update(2, amount("20")?, "cars", None)?;
    service.create_or_update(2, amount("25")?, "shopping", Some(1))?;

    let updated = service.get_by_id(2)?;

    assert_eq!(updated.amount, amount("25")?);
    assert_eq!(updated.category, "shopping");
    assert_eq!(updated.parent_id, Some(1));
    assert_eq!(service.ids_by_type("cars"), vec![1]);
    assert_eq!(service.ids_by_type("shopping"), vec![2]);

    Ok(())
}

#[test]
fn test_resubmitting_identical_write_is_idempotent() -> Result<()> {
    let (storage, service) = create_service();
    service.create_or_update(1, amount("10")?, "cars", None)?;
    service.create_or_update(2, amount("5")?, "cars", Some(1))?;

    let before = storage.all();
    service.create_or_update(2, amount("5")?, "cars", Some(1))?;

    assert_eq!(storage.all(), before);
    assert_eq!(service.ids_by_type("cars"), vec![1, 2]);

    Ok(())
}

#[test]
fn test_self_parent_is_rejected_whether_or_not_the_id_exists() -> Result<()> {
    let (_, service) = create_service();

    let result = service.create_or_update(5, amount("1")?, "cars", Some(5));
    assert!(matches!(result, Err(HierarchyError::InvalidParent { .. })));
    assert!(service.get_by_id(5).is_err());

    service.create_or_update(5, amount("1")?, "cars", None)?;

    let result = service.create_or_update(5, amount("1")?, "cars", Some(5));
    assert!(matches!(result, Err(HierarchyError::InvalidParent { .. })));
    assert_eq!(service.get_by_id(5)?.parent_id, None);

    Ok(())
}

#[test]
fn test_missing_parent_is_rejected() -> Result<()> {
    let (storage, service) = create_service();

    let result = service.create_or_update(1, amount("1")?, "cars", Some(77));

    assert_eq!(result, Err(HierarchyError::missing_parent(1, 77)));
    assert!(!storage.exists_by_id(1));

    Ok(())
}

#[test]
fn test_cycle_is_rejected_and_state_is_unchanged() -> Result<()> {
    let (_, service) = create_service();
    service.create_or_update(1, amount("1")?, "cars", None)?;
    service.create_or_update(2, amount("2")?, "cars", Some(1))?;
    service.create_or_update(3, amount("3")?, "cars", Some(2))?;

    let before = service.get_by_id(1)?;
    let result = service.create_or_update(1, amount("9")?, "travel", Some(3));

    assert_eq!(result, Err(HierarchyError::cycle(1, 3)));
    assert_eq!(service.get_by_id(1)?, before);
    assert!(service.ids_by_type("travel").is_empty());

    Ok(())
}

#[test]
fn test_reparenting_within_a_tree_without_cycle_is_accepted() -> Result<()> {
    let (_, service) = create_service();
    service.create_or_update(1, amount("1")?, "a", None)?;
    service.create_or_update(2, amount("1")?, "a", Some(1))?;
    service.create_or_update(3, amount("1")?, "a", Some(2))?;

    service.create_or_update(3, amount("1")?, "a", Some(1))?;
    service.create_or_update(2, amount("1")?, "a", Some(3))?;

    assert_eq!(service.get_by_id(2)?.parent_id, Some(3));
    assert_eq!(service.calculate_sum(1)?, Decimal::from(3));

    Ok(())
}

#[test]
fn test_cycle_walk_terminates_on_corrupted_lineage() {
    // 2 -> 3 -> 4 -> 2 is already a loop that never reaches 1
    let lineage = FixedLineage(HashMap::from([
        (1, None),
        (2, Some(3)),
        (3, Some(4)),
        (4, Some(2))
    ]));

    assert!(would_create_cycle(&lineage, 1, 2));
}

#[test]
fn test_cycle_walk_stops_at_dangling_reference() {
    let lineage = FixedLineage(HashMap::from([(1, None), (2, Some(99))]));

    assert!(!would_create_cycle(&lineage, 1, 2));
}

#[test]
fn test_sum_of_flat_root_is_its_own_amount() -> Result<()> {
    let (_, service) = create_service();
    service.create_or_update(10, amount("5000")?, "cars", None)?;

    assert_eq!(service.calculate_sum(10)?, Decimal::from(5000));

    Ok(())
}

#[test]
fn test_sum_rolls_up_multiple_levels() -> Result<()> {
    let (_, service) = create_service();
    service.create_or_update(10, amount("5000")?, "cars", None)?;
    service.create_or_update(11, amount("10000")?, "shopping", Some(10))?;
    service.create_or_update(12, amount("5000")?, "shopping", Some(11))?;

    assert_eq!(service.calculate_sum(10)?, Decimal::from(20000));
    assert_eq!(service.calculate_sum(11)?, Decimal::from(15000));
    assert_eq!(service.calculate_sum(12)?, Decimal::from(5000));

    Ok(())
}

#[test]
fn test_sum_covers_siblings_and_ignores_other_trees() -> Result<()> {
    let (_, service) = create_service();
    service.create_or_update(1, amount("0.1")?, "a", None)?;
    service.create_or_update(2, amount("0.2")?, "a", Some(1))?;
    service.create_or_update(3, amount("0.3")?, "a", Some(1))?;
    service.create_or_update(4, amount("0.4")?, "a", Some(3))?;
    service.create_or_update(5, amount("1000")?, "a", None)?;

    assert_eq!(service.calculate_sum(1)?, Decimal::from_str("1.0")?);
    assert_eq!(service.calculate_sum(5)?, Decimal::from(1000));

    Ok(())
}

#[test]
fn test_sum_handles_deep_chains_without_recursion() -> Result<()> {
    let (_, service) = create_service();
    let depth: TransactionId = 5_000;

    service.create_or_update(0, amount("1")?, "chain", None)?;
    for id in 1..depth {
        service.create_or_update(id, amount("1")?, "chain", Some(id - 1))?;
    }

    assert_eq!(service.calculate_sum(0)?, Decimal::from(depth));

    Ok(())
}

#[test]
fn test_sum_of_missing_transaction_fails_with_not_found() {
    let (_, service) = create_service();

    assert_eq!(service.calculate_sum(999), Err(HierarchyError::not_found(999)));
}

#[test]
fn test_sum_reports_overflow() -> Result<()> {
    let (_, service) = create_service();
    let max = Amount::try_from(Decimal::MAX)?;
    service.create_or_update(1, max, "big", None)?;
    service.create_or_update(2, max, "big", Some(1))?;

    assert_eq!(service.calculate_sum(1), Err(HierarchyError::overflow(1)));

    Ok(())
}

#[test]
fn test_sum_reports_precision_loss_instead_of_rounding() -> Result<()> {
    let (_, service) = create_service();
    service.create_or_update(1, amount("10000000000000000000000000000")?, "big", None)?;
    service.create_or_update(2, amount("0.4")?, "small", Some(1))?;
    service.create_or_update(3, amount("0.4")?, "small", Some(1))?;

    assert_eq!(service.calculate_sum(1), Err(HierarchyError::precision_loss(1)));
    assert_eq!(service.calculate_sum(2)?, Decimal::from_str("0.4")?);

    Ok(())
}

#[test]
fn test_sum_counts_each_node_once_when_stored_links_loop() -> Result<()> {
    let (storage, service) = create_service();

    // Written straight to storage, the service would refuse the second link
    storage.upsert(Transaction::new(1, amount("1")?, "a", None));
    storage.upsert(Transaction::new(2, amount("2")?, "a", Some(1)));
    storage.upsert(Transaction::new(1, amount("1")?, "a", Some(2)));

    assert_eq!(service.calculate_sum(1)?, Decimal::from(3));
    assert_eq!(service.calculate_sum(2)?, Decimal::from(3));

    Ok(())
}

#[test]
fn test_ids_by_unknown_type_is_empty() {
    let (_, service) = create_service();

    assert!(service.ids_by_type("nonexistent").is_empty());
}

#[test]
fn test_racing_opposite_parent_assignments_never_form_a_cycle() -> Result<()> {
    let (storage, service) = create_service();
    let service = Arc::new(service);
    service.create_or_update(1, amount("1")?, "a", None)?;
    service.create_or_update(2, amount("1")?, "a", None)?;

    let one = amount("1")?;

    thread::scope(|scope| {
        for writer in 0..8u64 {
            let service = service.clone();
            scope.spawn(move || {
                for _ in 0..500 {
                    let (id, parent_id) = if writer % 2 == 0 { (1, 2) } else { (2, 1) };
                    let _ = service.create_or_update(id, one, "a", Some(parent_id));
                    let _ = service.create_or_update(parent_id, one, "a", None);
                }
            });
        }
    });

    assert!(reaches_root(&storage, 1));
    assert!(reaches_root(&storage, 2));

    Ok(())
}

#[test]
fn test_concurrent_disjoint_creates_are_all_retrievable() -> Result<()> {
    let (_, service) = create_service();
    let service = Arc::new(service);
    service.create_or_update(0, amount("1")?, "root", None)?;

    let one = amount("1")?;

    let failures: usize = thread::scope(|scope| {
        let handles: Vec<_> = (1..=32u64).map(|id| {
            let service = service.clone();
            scope.spawn(move || service.create_or_update(id, one, "leaf", Some(0)).is_err() as usize)
        }).collect();

        handles.into_iter().map(|handle| handle.join().unwrap_or(1)).sum()
    });

    assert_eq!(failures, 0);

    for id in 1..=32 {
        let transaction = service.get_by_id(id)?;
        assert_eq!(transaction.parent_id, Some(0));
    }

    assert_eq!(service.ids_by_type("leaf").len(), 32);
    assert_eq!(service.calculate_sum(0)?, Decimal::from(33));
    assert_eq!(service.transactions().len(), 33);

    Ok(())
}

proptest! {
    #[test]
    fn test_random_writes_keep_the_store_a_forest(
        writes in prop::collection::vec((0u64..10, prop::option::of(0u64..10)), 1..80)
    ) {
        let (storage, service) = create_service();
        let one = Amount::from_str("1").map_err(|error| TestCaseError::fail(error.to_string()))?;

        for (id, parent_id) in writes {
            let _ = service.create_or_update(id, one, "a", parent_id);

            for transaction in storage.all() {
                if let Some(parent_id) = transaction.parent_id {
                    prop_assert!(storage.exists_by_id(parent_id));
                }
                prop_assert!(reaches_root(&storage, transaction.id));
            }
        }
    }
}
