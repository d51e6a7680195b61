use super::models::{Entity as Counter, ORDER_SEQUENCE};
use super::services::{allocate_next_id, format_unique_id, next_value};
use crate::config::test_helpers::setup_inventory_db;
use rstest::rstest;
use sea_orm::EntityTrait;
use std::collections::HashSet;

#[rstest]
#[case(1, "0001")]
#[case(42, "0042")]
#[case(9999, "9999")]
#[case(10000, "10000")]
#[case(123_456, "123456")]
fn test_format_unique_id(#[case] seq: i64, #[case] expected: &str) {
    assert_eq!(format_unique_id(seq), expected);
}

#[tokio::test]
async fn test_first_allocation_creates_counter() {
    let db = setup_inventory_db().await;

    assert_eq!(allocate_next_id(&db).await.unwrap(), "0001");

    let counter = Counter::find_by_id(ORDER_SEQUENCE.to_string())
        .one(&db)
        .await
        .unwrap()
        .expect("counter row should exist after first allocation");
    assert_eq!(counter.seq, 1);
}

#[tokio::test]
async fn test_allocations_are_strictly_increasing() {
    let db = setup_inventory_db().await;

    let ids: Vec<String> = {
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(allocate_next_id(&db).await.unwrap());
        }
        ids
    };

    assert_eq!(ids, vec!["0001", "0002", "0003", "0004", "0005"]);
}

#[tokio::test]
async fn test_sequences_are_independent() {
    let db = setup_inventory_db().await;

    assert_eq!(next_value(&db, "a").await.unwrap(), 1);
    assert_eq!(next_value(&db, "a").await.unwrap(), 2);
    assert_eq!(next_value(&db, "b").await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_allocations_never_collide() {
    let db = setup_inventory_db().await;

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { allocate_next_id(&db).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let id = handle.await.unwrap().unwrap();
        assert!(ids.insert(id), "duplicate id allocated");
    }

    let expected: HashSet<String> = (1..=25).map(format_unique_id).collect();
    assert_eq!(ids, expected);
}
