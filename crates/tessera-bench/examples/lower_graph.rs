//! End-to-end compilation example.
//!
//! Demonstrates: lower a graph in two incremental passes → commit after each
//! → resolve tickets as a scheduler would → report allocation totals.

use std::sync::Arc;

use tessera_arena::MemoryConfig;
use tessera_bench::{lower_graph, reference_graph};
use tessera_device::HostDevice;
use tessera_memory::DeviceMemoryManager;

fn main() {
    println!("=== Tessera Lowering Example ===\n");

    let device = Arc::new(HostDevice::new());
    let config = MemoryConfig::new(256).with_staging_capacity(64 * 1024);
    let mut manager = DeviceMemoryManager::new(device.clone(), config).unwrap();

    let mut program = Vec::new();
    for pass in 0..2 {
        let ops = reference_graph(4, 128);
        let tickets = lower_graph(&mut manager, &ops).unwrap();
        println!(
            "pass {}: {} ops lowered, {} tickets, {}",
            pass + 1,
            ops.len(),
            tickets.len(),
            manager.stats()
        );
        program.extend(tickets);
    }

    let nulls = program
        .iter()
        .filter(|&&t| manager.resolve(t).unwrap().is_null())
        .count();
    println!(
        "\nresolved {} tickets ({} null); {} bytes committed in {} device buffers",
        program.len(),
        nulls,
        manager.get_allocation_size(),
        device.live_buffers(),
    );
}
