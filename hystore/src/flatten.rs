//! Compaction of a list into a single gap-free block.
//!
//! Algorithm
//! 1. Reserve one block of [`NodeList::total_size`] bytes.
//! 2. Walk the list in logical order, grouping cells that are adjacent in the same source block
//!    into runs. Each run is copied with a single bulk copy.
//! 3. Fix up every copied cell in old-address order: clear its gap header, and rewrite each
//!    operand through the forwarding table (old location to new offset). Operands always precede
//!    their consumers in logical order, so they are already in the table when their consumer is
//!    reached; a missing entry is an ordering violation.
//! 4. Swap the new block in and drop the old block table as a whole.
//!
//! The old structure is only read until the swap, so a failure at any step leaves the list
//! untouched.
use std::collections::HashMap;

use log::{debug, trace};

use crate::{
    block::Block,
    error::{Error, StoreResult},
    gaps::GapSlot,
    list::{NodeList, ROOT, fresh_generation},
    node::{BlockId, NodeRef},
};

/// Maps the old location `(block, offset)` of a relocated cell to its offset in the new block.
type ForwardingTable = HashMap<(BlockId, u32), u32>;

/// Cells `start..end` of one source block, adjacent in logical order.
#[derive(Debug, Clone, Copy)]
struct Run {
    block: BlockId,
    start: u32,
    end: u32,
}

impl NodeList {
    /// Collapse every chain and gap into one contiguous block, keeping the logical order.
    ///
    /// Every handle obtained before the call becomes stale. Flattening an already flat list
    /// preserves its content and order.
    ///
    /// Complexity: O(occupied bytes), a single pass over the list.
    pub fn flatten(&mut self) -> StoreResult<()> {
        let total = self.total_size();
        let mut dest = Block::new(total, 0, None)?;
        let mut forwarding = ForwardingTable::new();
        forwarding
            .try_reserve(self.len())
            .map_err(|_| Error::AllocationFailure {
                requested: self.len() * std::mem::size_of::<((BlockId, u32), u32)>(),
            })?;

        let mut run: Option<Run> = None;
        for node in self.iter() {
            let cell_len = self.blocks[node.block as usize].cell_len(node.offset) as u32;
            match run.as_mut() {
                Some(r) if r.block == node.block && r.end == node.offset => r.end += cell_len,
                _ => {
                    if let Some(done) = run.take() {
                        self.relocate_run(done, &mut dest, &mut forwarding)?;
                    }
                    run = Some(Run {
                        block: node.block,
                        start: node.offset,
                        end: node.offset + cell_len,
                    });
                }
            }
        }
        if let Some(done) = run {
            self.relocate_run(done, &mut dest, &mut forwarding)?;
        }

        debug!(
            "Flattened {} blocks ({} occupied bytes, {} nodes) into a block of {} bytes",
            self.blocks.len(),
            dest.len(),
            forwarding.len(),
            total
        );

        self.blocks = vec![dest];
        self.generation = fresh_generation();
        Ok(())
    }

    fn relocate_run(
        &self,
        run: Run,
        dest: &mut Block,
        forwarding: &mut ForwardingTable,
    ) -> StoreResult<()> {
        let source = &self.blocks[run.block as usize];
        let base = dest.len() as u32;
        dest.extend_raw(&source.bytes()[run.start as usize..run.end as usize]);
        trace!(
            "Relocating bytes {}..{} of block {} to offset {base}",
            run.start, run.end, run.block
        );

        let mut old = run.start;
        while old < run.end {
            let new = base + (old - run.start);
            dest.set_gap(new, GapSlot::Absent);

            for (index, (block, offset)) in source.operands_at(old)?.into_iter().enumerate() {
                let Some(&target) = forwarding.get(&(block, offset)) else {
                    return Err(Error::InvariantViolation {
                        operand: NodeRef::new(self.generation, block, offset),
                        consumer: NodeRef::new(self.generation, run.block, old),
                    });
                };
                dest.set_operand(new, index, ROOT, target);
            }

            forwarding.insert((run.block, old), new);
            old += source.cell_len(old) as u32;
        }
        Ok(())
    }
}
