//! Integration test: resolving tickets from scheduler worker threads.

use std::sync::Arc;
use std::thread;

use tessera_core::DevicePtr;
use tessera_memory::DeviceMemoryManager;
use tessera_test_utils::{pattern, small_config, FaultyDevice};

#[test]
fn tickets_resolve_concurrently_after_commit() {
    let device = Arc::new(FaultyDevice::new());
    let mut manager = DeviceMemoryManager::new(device.clone(), small_config(16)).unwrap();

    let mut tickets = Vec::new();
    for op in 0..32u8 {
        let mut scope = manager.open_scope();
        tickets.push(scope.reserve_argspace(&pattern(48, op)).ticket());
        tickets.push(scope.reserve_workspace(256, op % 4 == 0).ticket());
        tickets.push(scope.reserve_workspace(0, false).ticket());
        scope.close();
    }
    manager.allocate().unwrap();

    let expected: Vec<DevicePtr> = tickets
        .iter()
        .map(|&t| manager.resolve(t).unwrap())
        .collect();
    let memsets_before = device.memsets();

    let manager = &manager;
    thread::scope(|s| {
        for worker in 0..4 {
            let tickets = &tickets;
            let expected = &expected;
            s.spawn(move || {
                for _ in 0..50 {
                    for (i, &t) in tickets.iter().enumerate().skip(worker) {
                        assert_eq!(manager.registry().invoke(t), Ok(expected[i]));
                    }
                }
            });
        }
    });

    // Every workspace reservation shares offset 0 of the single buffer.
    let workspace_ptrs: Vec<_> = expected.iter().skip(1).step_by(3).collect();
    assert!(workspace_ptrs.windows(2).all(|w| w[0] == w[1]));
    assert!(device.memsets() > memsets_before);

    for (op, chunk) in expected.chunks(3).enumerate() {
        assert_eq!(
            device.host().read(chunk[0], 48).unwrap(),
            pattern(48, op as u8)
        );
        assert_eq!(chunk[2], DevicePtr::NULL);
    }
}
