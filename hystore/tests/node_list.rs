use hystore::prelude::*;

// Helpers
fn rendered(list: &NodeList) -> Vec<String> {
    list.iter().map(|n| list.render(n).unwrap()).collect()
}

fn small(capacity: usize) -> NodeList {
    NodeList::with_config(StoreConfig::uniform(capacity)).unwrap()
}

#[test]
fn constants_traverse_in_insertion_order() {
    let mut list = NodeList::new().unwrap();
    for v in [1, 2, 3] {
        list.insert(Node::constant(v)).unwrap();
    }

    assert_eq!(rendered(&list), ["1", "2", "3"]);
    assert_eq!(list.len(), 3);
    assert!(!list.is_empty());
    assert_eq!(
        list.occupied_bytes(),
        3 * NodeType::Constant.cell_size()
    );
}

#[test]
fn addition_renders_its_operands() {
    let mut list = NodeList::new().unwrap();
    let two = list.insert(Node::constant(2)).unwrap();
    let three = list.insert(Node::constant(3)).unwrap();
    let sum = list.insert(Node::add(two, three)).unwrap();

    assert_eq!(list.render(sum).unwrap(), "2 + 3");
    assert_eq!(list.display(sum).to_string(), "2 + 3");
    assert_eq!(list.get(sum).unwrap(), Node::add(two, three));
    assert_eq!(list.get(sum).unwrap().type_(), NodeType::Add);
    assert_eq!(list.iter().last(), Some(sum));
}

#[test]
fn empty_list_has_nothing_to_traverse() {
    let list = small(64);
    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
    assert!(list.iter().next().is_none());
    assert!(list.iter().is_exhausted());
    assert_eq!(list.nth_node(0), None);
    assert_eq!(list.total_size(), 64);
}

#[test]
fn growth_chains_blocks_and_keeps_order() {
    let cell = NodeType::Constant.cell_size();
    let mut list = small(4 * cell);
    for v in 0..100 {
        list.insert(Node::constant(v)).unwrap();
    }

    assert_eq!(list.block_count(), 25);
    assert_eq!(list.reachable_blocks(), 25);
    assert_eq!(list.total_size(), 25 * 4 * cell);
    let expected: Vec<String> = (0..100).map(|v| v.to_string()).collect();
    assert_eq!(rendered(&list), expected);
}

#[test]
fn operands_may_live_in_earlier_blocks() {
    let mut list = small(2 * NodeType::Add.cell_size());
    let mut acc = list.insert(Node::constant(0)).unwrap();
    for v in 1..=20 {
        let c = list.insert(Node::constant(v)).unwrap();
        acc = list.insert(Node::add(acc, c)).unwrap();
    }

    assert!(list.block_count() > 1);
    let expected = (0..=20)
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" + ");
    assert_eq!(list.render(acc).unwrap(), expected);
}

#[test]
fn node_larger_than_block_capacity_still_fits() {
    let mut list = small(1);
    let a = list.insert(Node::constant(4)).unwrap();
    let b = list.insert(Node::constant(5)).unwrap();
    let sum = list.insert(Node::add(a, b)).unwrap();

    assert_eq!(rendered(&list), ["4", "5", "4 + 5"]);
    assert_eq!(list.render(sum).unwrap(), "4 + 5");
    assert_eq!(
        list.total_size(),
        1 + 2 * NodeType::Constant.cell_size() + NodeType::Add.cell_size()
    );
}

#[test]
fn total_size_counts_capacity_not_occupancy() {
    let config = StoreConfig::default()
        .with_block_capacity(200)
        .with_gap_capacity(50);
    let mut list = NodeList::with_config(config).unwrap();
    let nodes: Vec<_> = (0..10)
        .map(|v| list.insert(Node::constant(v)).unwrap())
        .collect();
    assert_eq!(list.total_size(), 200);

    // One gap with content, one left empty: both count their whole capacity
    let gap = list.insert_before(nodes[3]).unwrap();
    list.insert_into(gap, Node::constant(-1)).unwrap();
    list.insert_before(nodes[7]).unwrap();

    assert_eq!(list.total_size(), 200 + 2 * 50);
    assert!(list.occupied_bytes() < list.total_size());
}

#[test]
fn nth_node_follows_logical_order() {
    let mut list = small(256);
    let a = list.insert(Node::constant(1)).unwrap();
    let b = list.insert(Node::constant(2)).unwrap();
    let gap = list.insert_before(b).unwrap();
    let g = list.insert_into(gap, Node::constant(9)).unwrap();

    assert_eq!(list.nth_node(0), Some(a));
    assert_eq!(list.nth_node(1), Some(g));
    assert_eq!(list.nth_node(2), Some(b));
    assert_eq!(list.nth_node(3), None);
}

#[test]
fn handles_from_another_list_are_rejected() {
    let mut first = small(128);
    let mut second = small(128);
    let foreign = first.insert(Node::constant(1)).unwrap();
    let local = second.insert(Node::constant(2)).unwrap();

    assert!(second.get(foreign).unwrap_err().is_stale_handle());
    assert!(second.render(foreign).unwrap_err().is_stale_handle());
    assert!(second.insert_before(foreign).unwrap_err().is_stale_handle());
    let err = second.insert(Node::add(local, foreign)).unwrap_err();
    assert_eq!(
        err,
        Error::StaleHandle {
            handle: foreign,
            generation: second.generation()
        }
    );
    // Failed insertion did not write anything
    assert_eq!(second.len(), 1);
}

#[test]
fn allocation_failure_is_reported() {
    let err = NodeList::with_config(StoreConfig::uniform(usize::MAX)).unwrap_err();
    assert!(err.is_allocation_failure());
}

#[test]
fn cursor_reports_current_and_exhaustion() {
    let mut list = small(256);
    let a = list.insert(Node::constant(1)).unwrap();
    let b = list.insert(Node::constant(2)).unwrap();

    let mut cursor = list.iter();
    assert_eq!(cursor.current(), Some(a));
    cursor.advance();
    assert_eq!(cursor.current(), Some(b));
    cursor.advance();
    assert!(cursor.is_exhausted());
    assert_eq!(cursor.current(), None);
    cursor.advance();
    assert!(cursor.is_exhausted());
}
