//! Textual rendering of nodes, and a structural dump of a list for debugging.
//!
//! A constant renders as its decimal value and an addition as `"<lhs> + <rhs>"`, operands being
//! rendered recursively (without parentheses). Operands are resolved through the list at render
//! time, so rendering is only meaningful with handles of the list's current generation.
use std::fmt;

use smallvec::SmallVec;

use crate::{
    error::StoreResult,
    list::{NodeList, ROOT},
    node::{BlockId, Node, NodeRef},
};

enum Frame {
    Node(NodeRef),
    Text(&'static str),
}

/// Pending work of the structural dump.
enum DumpFrame {
    Block {
        id: BlockId,
        depth: usize,
    },
    Cell {
        id: BlockId,
        offset: u32,
        depth: usize,
        gap_done: bool,
    },
}

/// Indentation of the structural dump stops growing past this many columns.
const MAX_DUMP_INDENT: usize = 64;

#[inline]
fn dump_indent(depth: usize) -> usize {
    (depth * 2).min(MAX_DUMP_INDENT)
}

impl NodeList {
    /// Render `node` and its operands.
    ///
    /// Uses an explicit stack, so deeply nested additions do not overflow the call stack.
    pub fn render(&self, node: NodeRef) -> StoreResult<String> {
        let mut out = String::new();
        let mut stack: SmallVec<[Frame; 16]> = SmallVec::new();
        stack.push(Frame::Node(node));

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Text(text) => out.push_str(text),
                Frame::Node(node) => match self.get(node)? {
                    Node::Constant(value) => out.push_str(&value.to_string()),
                    Node::Add { lhs, rhs } => {
                        stack.push(Frame::Node(rhs));
                        stack.push(Frame::Text(" + "));
                        stack.push(Frame::Node(lhs));
                    }
                },
            }
        }

        Ok(out)
    }

    /// Wrapper implementing [`fmt::Display`] for `node`.
    #[inline]
    pub fn display(&self, node: NodeRef) -> NodeDisplay<'_> {
        NodeDisplay { list: self, node }
    }

    /// Write the chain starting at `head`, with every gap indented under its cell.
    fn dump_chain(&self, f: &mut fmt::Formatter<'_>, head: BlockId, depth: usize) -> fmt::Result {
        let mut stack: SmallVec<[DumpFrame; 16]> = SmallVec::new();
        stack.push(DumpFrame::Block { id: head, depth });

        while let Some(frame) = stack.pop() {
            match frame {
                DumpFrame::Block { id, depth } => {
                    let block = &self.blocks[id as usize];
                    writeln!(
                        f,
                        "{:indent$}block {id} [{}/{} bytes{}]",
                        "",
                        block.len(),
                        block.capacity(),
                        if block.full { ", full" } else { "" },
                        indent = dump_indent(depth)
                    )?;
                    if let Some(next) = block.next {
                        stack.push(DumpFrame::Block { id: next, depth });
                    }
                    if !block.is_empty() {
                        stack.push(DumpFrame::Cell {
                            id,
                            offset: 0,
                            depth,
                            gap_done: false,
                        });
                    }
                }
                DumpFrame::Cell {
                    id,
                    offset,
                    depth,
                    gap_done,
                } => {
                    let block = &self.blocks[id as usize];
                    let indent = dump_indent(depth + 1);

                    // The gap comes first, the cell is resumed once it is written out
                    if let (false, Some(gap)) = (gap_done, block.gap_at(offset).block()) {
                        writeln!(f, "{:indent$}gap:", "")?;
                        stack.push(DumpFrame::Cell {
                            id,
                            offset,
                            depth,
                            gap_done: true,
                        });
                        stack.push(DumpFrame::Block {
                            id: gap,
                            depth: depth + 2,
                        });
                        continue;
                    }

                    let node = NodeRef::new(self.generation, id, offset);
                    match self.get(node) {
                        Ok(Node::Constant(value)) => {
                            writeln!(f, "{:indent$}{node} = {value}", "")?
                        }
                        Ok(Node::Add { lhs, rhs }) => {
                            writeln!(f, "{:indent$}{node} = add {lhs}, {rhs}", "")?
                        }
                        Err(err) => writeln!(f, "{:indent$}{node} = <{err}>", "")?,
                    }

                    let next = offset + block.cell_len(offset) as u32;
                    if (next as usize) < block.len() {
                        stack.push(DumpFrame::Cell {
                            id,
                            offset: next,
                            depth,
                            gap_done: false,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Display adapter returned by [`NodeList::display`].
pub struct NodeDisplay<'a> {
    list: &'a NodeList,
    node: NodeRef,
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.list.render(self.node).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl fmt::Debug for NodeList {
    /// Dump the block structure: chains, gaps (indented under their cell) and decoded cells.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "NodeList (generation {}, {} blocks, {}/{} bytes)",
            self.generation,
            self.blocks.len(),
            self.occupied_bytes(),
            self.total_size()
        )?;
        self.dump_chain(f, ROOT, 1)
    }
}
