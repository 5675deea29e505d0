use hystore::gaps::GAP_CACHE_CAPACITY;
use hystore::prelude::*;

fn rendered(list: &NodeList) -> Vec<String> {
    list.iter().map(|n| list.render(n).unwrap()).collect()
}

fn abc(list: &mut NodeList) -> [NodeRef; 3] {
    [1, 2, 3].map(|v| list.insert(Node::constant(v)).unwrap())
}

#[test]
fn insert_before_places_node_right_before_cursor() {
    let mut list = NodeList::new().unwrap();
    let [_, b, _] = abc(&mut list);

    let at = list.iter().nth(1).unwrap();
    assert_eq!(at, b);
    let gap = list.insert_before(at).unwrap();
    list.insert_into(gap, Node::constant(99)).unwrap();

    assert_eq!(rendered(&list), ["1", "99", "2", "3"]);
    assert_eq!(list.gap_count(), 1);
}

#[test]
fn insert_before_does_not_move_existing_nodes() {
    let mut list = NodeList::new().unwrap();
    let [a, b, c] = abc(&mut list);
    let before = list.occupied_bytes();

    let gap = list.insert_before(b).unwrap();
    list.insert_into(gap, Node::constant(7)).unwrap();

    // Existing handles still resolve to the same nodes
    assert_eq!(list.get(a).unwrap(), Node::constant(1));
    assert_eq!(list.get(b).unwrap(), Node::constant(2));
    assert_eq!(list.get(c).unwrap(), Node::constant(3));
    assert_eq!(
        list.occupied_bytes(),
        before + NodeType::Constant.cell_size()
    );
}

#[test]
fn repeated_insert_before_reuses_the_gap_and_appends() {
    let mut list = NodeList::new().unwrap();
    let [_, b, _] = abc(&mut list);

    let first = list.insert_before(b).unwrap();
    list.insert_into(first, Node::constant(10)).unwrap();
    let second = list.insert_before(b).unwrap();
    assert_eq!(first, second);
    list.insert_into(second, Node::constant(11)).unwrap();

    assert_eq!(rendered(&list), ["1", "10", "11", "2", "3"]);
    assert_eq!(list.gap_count(), 1);
}

#[test]
fn positional_insertion_law_holds_at_every_position() {
    for position in 0..5 {
        let mut list = NodeList::with_config(StoreConfig::uniform(256)).unwrap();
        for v in 0..5 {
            list.insert(Node::constant(v)).unwrap();
        }
        let mut expected = rendered(&list);

        let at = list.nth_node(position).unwrap();
        let gap = list.insert_before(at).unwrap();
        list.insert_into(gap, Node::constant(42)).unwrap();
        expected.insert(position, "42".to_string());

        assert_eq!(rendered(&list), expected, "inserting before position {position}");
    }
}

#[test]
fn empty_gap_is_skipped_by_traversal() {
    let mut list = NodeList::new().unwrap();
    let [a, _, _] = abc(&mut list);
    list.insert_before(a).unwrap();

    assert_eq!(rendered(&list), ["1", "2", "3"]);
    assert_eq!(list.gap_count(), 1);
    assert_eq!(list.iter().depth(), 0);
}

#[test]
fn nested_gaps_traverse_innermost_first() {
    let mut list = NodeList::new().unwrap();
    let a = list.insert(Node::constant(1)).unwrap();
    let b = list.insert(Node::constant(2)).unwrap();

    let g1 = list.insert_before(b).unwrap();
    let x = list.insert_into(g1, Node::constant(30)).unwrap();
    let g2 = list.insert_before(x).unwrap();
    let y = list.insert_into(g2, Node::constant(20)).unwrap();
    let g3 = list.insert_before(y).unwrap();
    let z = list.insert_into(g3, Node::constant(10)).unwrap();

    assert_eq!(rendered(&list), ["1", "10", "20", "30", "2"]);
    assert_eq!(list.iter().collect::<Vec<_>>(), [a, z, y, x, b]);

    let mut cursor = list.iter();
    cursor.advance();
    assert_eq!(cursor.current(), Some(z));
    assert_eq!(cursor.depth(), 3);
    cursor.advance();
    assert_eq!(cursor.depth(), 2);
    cursor.advance();
    assert_eq!(cursor.depth(), 1);
    cursor.advance();
    assert_eq!(cursor.current(), Some(b));
    assert_eq!(cursor.depth(), 0);
}

#[test]
fn gap_chains_grow_like_the_root_chain() {
    let config = StoreConfig::uniform(1024).with_gap_capacity(2 * NodeType::Constant.cell_size());
    let mut list = NodeList::with_config(config).unwrap();
    let [a, b, c] = abc(&mut list);

    let gap = list.insert_before(c).unwrap();
    for v in 100..110 {
        list.insert_into(gap, Node::constant(v)).unwrap();
    }
    let sum = list.insert_into(gap, Node::add(a, b)).unwrap();

    let mut expected = vec!["1".to_string(), "2".to_string()];
    expected.extend((100..110).map(|v| v.to_string()));
    expected.push("1 + 2".to_string());
    expected.push("3".to_string());
    assert_eq!(rendered(&list), expected);
    assert_eq!(list.render(sum).unwrap(), "1 + 2");

    // Root block, five gap blocks of two constants each, one more for the addition
    assert_eq!(list.block_count(), 7);
    assert_eq!(list.gap_count(), 1);
}

#[test]
fn gaps_in_chained_blocks() {
    let mut list = NodeList::with_config(StoreConfig::uniform(2 * NodeType::Constant.cell_size()))
        .unwrap();
    let nodes: Vec<_> = (0..6)
        .map(|v| list.insert(Node::constant(v)).unwrap())
        .collect();

    // Gaps in the first, second and third block of the chain
    for &at in [nodes[0], nodes[3], nodes[5]].iter() {
        let gap = list.insert_before(at).unwrap();
        list.insert_into(gap, Node::constant(-1)).unwrap();
    }

    assert_eq!(
        rendered(&list),
        ["-1", "0", "1", "2", "-1", "3", "4", "-1", "5"]
    );
}

#[test]
fn operands_after_the_gap_are_rejected() {
    let mut list = NodeList::new().unwrap();
    let [a, b, c] = abc(&mut list);
    let gap = list.insert_before(b).unwrap();

    // `c` comes after the insertion point
    let err = list.insert_into(gap, Node::add(a, c)).unwrap_err();
    assert_eq!(
        err,
        Error::InvariantViolation {
            operand: c,
            consumer: b
        }
    );

    // `b` is the node the insertion point precedes
    assert!(
        list.insert_into(gap, Node::add(b, a))
            .unwrap_err()
            .is_invariant_violation()
    );

    // Nothing was written by the failed attempts
    assert_eq!(rendered(&list), ["1", "2", "3"]);

    // Operands before the gap, or already inside it, are fine
    let g = list.insert_into(gap, Node::constant(5)).unwrap();
    let sum = list.insert_into(gap, Node::add(a, g)).unwrap();
    assert_eq!(list.render(sum).unwrap(), "1 + 5");
    assert_eq!(rendered(&list), ["1", "5", "1 + 5", "2", "3"]);
}

#[test]
fn nested_gap_rejects_its_enclosing_nodes() {
    let mut list = NodeList::new().unwrap();
    let [a, b, _] = abc(&mut list);
    let outer = list.insert_before(b).unwrap();
    let x = list.insert_into(outer, Node::constant(10)).unwrap();
    let inner = list.insert_before(x).unwrap();

    assert!(
        list.insert_into(inner, Node::add(a, x))
            .unwrap_err()
            .is_invariant_violation()
    );
    assert!(
        list.insert_into(inner, Node::add(a, b))
            .unwrap_err()
            .is_invariant_violation()
    );
    let ok = list.insert_into(inner, Node::add(a, a)).unwrap();
    assert_eq!(list.nth_node(1), Some(ok));
}

#[test]
fn gap_cache_overflow_keeps_enumeration_complete() {
    let count = GAP_CACHE_CAPACITY * 2 + 3;
    let config = StoreConfig::uniform(4096).with_gap_capacity(64);
    let mut list = NodeList::with_config(config).unwrap();
    let nodes: Vec<_> = (0..count as i64)
        .map(|v| list.insert(Node::constant(v)).unwrap())
        .collect();

    for (i, &at) in nodes.iter().enumerate() {
        let gap = list.insert_before(at).unwrap();
        list.insert_into(gap, Node::constant(1000 + i as i64)).unwrap();
    }

    assert_eq!(list.len(), 2 * count);
    assert_eq!(list.iter().count(), 2 * count);
    assert_eq!(list.gap_count(), count);
    // Every allocated block is found through the gap enumeration
    assert_eq!(list.reachable_blocks(), list.block_count());
    assert_eq!(list.total_size(), 4096 + count * 64);

    let expected: Vec<String> = (0..count)
        .flat_map(|i| [(1000 + i).to_string(), i.to_string()])
        .collect();
    assert_eq!(rendered(&list), expected);
}

#[test]
fn chain_handles_go_stale_after_flatten() {
    let mut list = NodeList::new().unwrap();
    let [_, b, _] = abc(&mut list);
    let gap = list.insert_before(b).unwrap();
    let root = list.root();

    list.flatten().unwrap();

    assert_eq!(
        list.insert_into(gap, Node::constant(4)).unwrap_err(),
        Error::StaleChain {
            chain: gap,
            generation: list.generation()
        }
    );
    assert!(
        list.insert_into(root, Node::constant(4))
            .unwrap_err()
            .is_stale_chain()
    );
    assert!(list.insert(Node::constant(4)).is_ok());
    assert_eq!(rendered(&list), ["1", "2", "3", "4"]);
}
