use super::*;

#[derive(Debug, Clone, PartialEq)]
struct Drone {
    id: usize,
    armed: bool,
}

fn drone_pool(capacity: usize) -> ObjectPool<Drone> {
    ObjectPool::from_fn(capacity, |id| Drone { id, armed: false })
}

// ============================================================================
// Construction tests
// ============================================================================

#[test]
fn test_new_clones_prototype() {
    let pool = ObjectPool::new(3, &Drone { id: 9, armed: true });
    assert_eq!(pool.capacity(), 3);
    assert_eq!(pool.active_count(), 0);
    for index in 0..3 {
        let handle = pool.handle(index).unwrap();
        assert_eq!(pool.entity(handle), Some(&Drone { id: 9, armed: true }));
        assert_eq!(pool.state(handle), Some(SlotState::Free));
    }
    assert!(pool.handle(3).is_none());
}

#[test]
fn test_zero_capacity_is_always_exhausted() {
    let mut pool = drone_pool(0);
    assert_eq!(pool.get_available_index(), None);
    assert!(pool.get_available_handle().is_none());
    assert!(pool.get_all_active_handles().is_empty());
}

// ============================================================================
// Allocation tests
// ============================================================================

#[test]
fn test_capacity_two_third_request_fails_then_reuses_released() {
    let mut pool = drone_pool(2);

    let first = pool.get_available_handle();
    let second = pool.get_available_handle();
    let third = pool.get_available_handle();

    assert_eq!(first.map(|h| h.index()), Some(0));
    assert_eq!(second.map(|h| h.index()), Some(1));
    assert!(third.is_none());

    assert!(pool.release(first.unwrap()));
    assert_eq!(pool.get_available_handle(), first);
}

#[test]
fn test_available_index_never_in_use() {
    let mut pool = drone_pool(5);
    let claimed: Vec<_> = (0..3).map(|_| pool.get_available_handle().unwrap()).collect();
    pool.release(claimed[1]);

    for _ in 0..10 {
        let index = pool.get_available_index().unwrap();
        let handle = pool.handle(index).unwrap();
        assert_eq!(pool.state(handle), Some(SlotState::Free));
    }

    while pool.get_available_handle().is_some() {}
    assert_eq!(pool.active_count(), 5);
    assert_eq!(pool.get_available_index(), None);
}

#[test]
fn test_available_index_does_not_claim() {
    let mut pool = drone_pool(3);
    assert_eq!(pool.get_available_index(), Some(0));
    assert_eq!(pool.active_count(), 0);
    // Search resumes after the last index returned
    assert_eq!(pool.get_available_index(), Some(1));
}

#[test]
fn test_search_is_round_robin() {
    let mut pool = drone_pool(4);
    let a = pool.get_available_handle().unwrap(); // 0
    let _b = pool.get_available_handle().unwrap(); // 1
    pool.release(a);

    // Slot 0 is free again but the cursor moves on to 2 and 3 first
    assert_eq!(pool.get_available_handle().map(|h| h.index()), Some(2));
    assert_eq!(pool.get_available_handle().map(|h| h.index()), Some(3));
    assert_eq!(pool.get_available_handle().map(|h| h.index()), Some(0));
    assert!(pool.get_available_handle().is_none());
}

#[test]
fn test_get_available_entity_allows_mutation() {
    let mut pool = drone_pool(2);
    {
        let (handle, drone) = pool.get_available_entity().unwrap();
        assert_eq!(handle.index(), 0);
        drone.armed = true;
    }
    let handle = pool.handle(0).unwrap();
    assert!(pool.entity(handle).unwrap().armed);
    assert_eq!(pool.state(handle), Some(SlotState::InUse));
}

#[test]
fn test_release_twice_is_rejected() {
    let mut pool = drone_pool(1);
    let handle = pool.get_available_handle().unwrap();
    assert!(pool.release(handle));
    assert!(!pool.release(handle));
}

// ============================================================================
// Enumeration tests
// ============================================================================

#[test]
fn test_get_all_active_handles_in_index_order() {
    let mut pool = drone_pool(5);
    let handles: Vec<_> = (0..4).map(|_| pool.get_available_handle().unwrap()).collect();
    pool.release(handles[1]);

    let active = pool.get_all_active_handles();
    let indices: Vec<_> = active.iter().map(|h| h.index()).collect();
    assert_eq!(indices, vec![0, 2, 3]);
    assert_eq!(active.capacity(), 3);
}

#[test]
fn test_iter_active_yields_entities() {
    let mut pool = drone_pool(3);
    pool.get_available_handle();
    pool.get_available_handle();

    let ids: Vec<_> = pool.iter_active().map(|(_, drone)| drone.id).collect();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn test_entity_mut_on_free_slot() {
    let mut pool = drone_pool(2);
    let handle = pool.handle(1).unwrap();
    pool.entity_mut(handle).unwrap().armed = true;
    assert_eq!(pool.state(handle), Some(SlotState::Free));
    assert!(pool.entity(handle).unwrap().armed);
}
