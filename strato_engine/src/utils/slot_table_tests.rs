use super::*;

// ============================================================================
// Basic allocation tests
// ============================================================================

#[test]
fn test_sequential_alloc() {
    let mut table = SlotTable::new();
    assert_eq!(table.alloc(), 0);
    assert_eq!(table.alloc(), 1);
    assert_eq!(table.alloc(), 2);
    assert_eq!(table.len(), 3);
    assert_eq!(table.occupied(), 3);
}

#[test]
fn test_new_is_empty() {
    let table = SlotTable::new();
    assert!(table.is_empty());
    assert_eq!(table.len(), 0);
    assert_eq!(table.occupied(), 0);
    assert!(!table.is_occupied(0));
}

// ============================================================================
// Free and reuse tests
// ============================================================================

#[test]
fn test_free_keeps_table_size() {
    let mut table = SlotTable::new();
    table.alloc();
    table.alloc();
    assert!(table.free(0));
    assert_eq!(table.len(), 2);
    assert_eq!(table.occupied(), 1);
    assert!(!table.is_occupied(0));
    assert!(table.is_occupied(1));
}

#[test]
fn test_reuse_is_first_free_not_lifo() {
    // Unlike a free-list stack, the lowest tombstone is reused first
    let mut table = SlotTable::new();
    for _ in 0..4 {
        table.alloc();
    }
    table.free(2);
    table.free(0);

    assert_eq!(table.alloc(), 0);
    assert_eq!(table.alloc(), 2);
    assert_eq!(table.alloc(), 4);
}

#[test]
fn test_double_free_is_rejected() {
    let mut table = SlotTable::new();
    let a = table.alloc();
    assert!(table.free(a));
    assert!(!table.free(a));
    assert_eq!(table.occupied(), 0);
}

#[test]
fn test_free_out_of_range_is_rejected() {
    let mut table = SlotTable::new();
    table.alloc();
    assert!(!table.free(5));
    assert_eq!(table.occupied(), 1);
}
