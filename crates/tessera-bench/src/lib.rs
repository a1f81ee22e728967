//! Benchmark profiles and utilities for the Tessera memory manager.
//!
//! Provides a synthetic lowering workload that exercises the manager the
//! way a compiler backend does: one build scope per operator, constant
//! inputs staged as argument space, scratch reserved as workspace, and an
//! occasional nested scope for a fused sub-kernel.
//!
//! - [`reference_graph`]: a 64-operator chain resembling a small MLP
//! - [`lower_graph`]: drive a manager through one compilation pass

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tessera_core::{MemoryError, Ticket};
use tessera_memory::DeviceMemoryManager;

/// Memory demand of one operator being lowered.
#[derive(Clone, Debug)]
pub struct OpProfile {
    /// Operator name, for reporting.
    pub name: String,
    /// Sizes of constant inputs staged as argument space.
    pub constants: Vec<usize>,
    /// Scratch sizes reserved in the operator's own scope.
    pub workspace: Vec<usize>,
    /// Scratch sizes reserved in a nested scope (fused sub-kernel).
    pub nested_workspace: Vec<usize>,
    /// Whether scratch should be zeroed before each kernel launch.
    pub zero_initialize: bool,
}

/// Build the reference graph: `layers` repetitions of
/// matmul → bias-add → gelu → layer-norm with `hidden`-wide tensors.
pub fn reference_graph(layers: usize, hidden: usize) -> Vec<OpProfile> {
    let f32s = |n: usize| n * std::mem::size_of::<f32>();
    let mut ops = Vec::with_capacity(layers * 4);
    for layer in 0..layers {
        ops.push(OpProfile {
            name: format!("matmul_{layer}"),
            constants: vec![f32s(hidden * hidden)],
            workspace: vec![f32s(hidden * 4)],
            nested_workspace: vec![f32s(hidden)],
            zero_initialize: true,
        });
        ops.push(OpProfile {
            name: format!("bias_add_{layer}"),
            constants: vec![f32s(hidden)],
            workspace: Vec::new(),
            nested_workspace: Vec::new(),
            zero_initialize: false,
        });
        ops.push(OpProfile {
            name: format!("gelu_{layer}"),
            constants: Vec::new(),
            workspace: vec![f32s(hidden), 0],
            nested_workspace: Vec::new(),
            zero_initialize: false,
        });
        ops.push(OpProfile {
            name: format!("layer_norm_{layer}"),
            constants: vec![f32s(hidden), f32s(hidden)],
            workspace: vec![f32s(2)],
            nested_workspace: vec![f32s(hidden)],
            zero_initialize: false,
        });
    }
    ops
}

/// Lower every operator in `ops` and commit once.
///
/// Returns the tickets in reservation order, as a compiled program would
/// store them.
pub fn lower_graph(
    manager: &mut DeviceMemoryManager,
    ops: &[OpProfile],
) -> Result<Vec<Ticket>, MemoryError> {
    let mut tickets = Vec::new();
    for op in ops {
        let mut scope = manager.open_scope();
        for &size in &op.constants {
            let data = vec![0x5A; size];
            tickets.push(scope.reserve_argspace(&data).ticket());
        }
        for &size in &op.workspace {
            tickets.push(scope.reserve_workspace(size, op.zero_initialize).ticket());
        }
        if !op.nested_workspace.is_empty() {
            let mut fused = scope.scope();
            for &size in &op.nested_workspace {
                tickets.push(fused.reserve_workspace(size, false).ticket());
            }
            fused.close();
        }
        scope.close();
    }
    manager.allocate()?;
    Ok(tickets)
}
