use hystore::prelude::*;

fn main() -> StoreResult<()> {
    let mut list = NodeList::with_config(StoreConfig::uniform(64))?;

    // Straight-line code: appended to the root chain
    let one = list.insert(Node::constant(1))?;
    let two = list.insert(Node::constant(2))?;
    let three = list.insert(Node::constant(3))?;
    list.insert(Node::add(one, three))?;

    // Insert a computation right before `two` without moving anything
    let gap = list.insert_before(two)?;
    let forty = list.insert_into(gap, Node::constant(40))?;
    list.insert_into(gap, Node::add(one, forty))?;

    println!("Before flatten ({} blocks, {} gaps):", list.block_count(), list.gap_count());
    for node in &list {
        println!("  {node} = {}", list.display(node));
    }
    println!("{list:?}");

    list.flatten()?;
    println!("After flatten ({} blocks):", list.block_count());
    for node in &list {
        println!("  {node} = {}", list.display(node));
    }

    let frozen = list.freeze()?;
    println!("Frozen list holds {} nodes in {} bytes", frozen.len(), frozen.total_size());
    Ok(())
}
