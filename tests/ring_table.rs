use std::{collections::HashMap, sync::Arc, thread};

use ringtable::{Config, Member, Murmur3Hasher, Node, RingTable, XxHash64Hasher};

fn owners(table: &RingTable<String>, keys: usize) -> Vec<String> {
    (0..keys)
        .map(|key| {
            table
                .get_node(key.to_string().as_bytes())
                .unwrap()
                .unwrap()
                .to_string()
        })
        .collect()
}

fn small_ring_config() -> Config {
    Config {
        key_count: 7,
        replication_factor: 20,
        load_factor: 1.25,
        ..Default::default()
    }
    .with_hasher(Arc::new(XxHash64Hasher))
}

#[test]
fn test_add_and_remove_node_moves_only_its_keys() {
    let table: RingTable<String> = RingTable::new(vec![], small_ring_config()).unwrap();
    table.add_node("1".to_string()).unwrap();
    table.add_node("80".to_string()).unwrap();
    assert_eq!(table.average_load().unwrap(), 4.0);
    assert_eq!(
        table.snapshot().unwrap(),
        vec!["1", "80", "1", "1", "80", "1", "80"]
    );
    let before = owners(&table, 20);

    table.add_node("34".to_string()).unwrap();
    assert_eq!(table.average_load().unwrap(), 3.0);
    assert_eq!(
        table.snapshot().unwrap(),
        vec!["34", "80", "1", "34", "34", "1", "80"]
    );
    let added = owners(&table, 20);
    for key in 0..20 {
        assert!(
            added[key] == before[key] || added[key] == "34",
            "key {} moved from {} to {}",
            key,
            before[key],
            added[key]
        );
    }
    assert!(added.iter().any(|owner| owner == "34"));

    table.remove_node("34").unwrap();
    let removed = owners(&table, 20);
    for key in 0..20 {
        if added[key] == "34" {
            assert!(removed[key] == "1" || removed[key] == "80");
        } else {
            assert_eq!(removed[key], added[key]);
        }
    }
    assert_eq!(removed, before);
}

#[test]
fn test_load_factor_too_tight_for_the_partitions() {
    let config = Config {
        load_factor: 1.0,
        ..small_ring_config()
    };
    let nodes = vec!["1".to_string(), "80".to_string(), "34".to_string()];
    let err = RingTable::new(nodes, config).err().unwrap();
    assert!(err.is_capacity_exhausted());

    // dropping a node doesn't help: 2 nodes can own at most 3 partitions each
    let config = Config {
        load_factor: 1.0,
        ..small_ring_config()
    };
    let table: RingTable<String> = RingTable::new(vec!["1".to_string()], config).unwrap();
    let err = table.add_node("80".to_string()).err().unwrap();
    assert!(err.is_capacity_exhausted());
    assert_eq!(table.len().unwrap(), 1);
    assert_eq!(table.snapshot().unwrap(), vec!["1"; 7]);
}

#[test]
fn test_adding_a_node_moves_a_bounded_fraction_of_partitions() {
    let key_count = 271;
    let n_nodes = 5;
    let config = Config {
        key_count,
        replication_factor: 20,
        load_factor: 1.25,
        ..Default::default()
    };
    let nodes: Vec<String> = (0..n_nodes).map(|i| format!("node-{}", i)).collect();
    let table = RingTable::new(nodes, config).unwrap();
    let before = table.snapshot().unwrap();

    table.add_node(format!("node-{}", n_nodes)).unwrap();
    let after = table.snapshot().unwrap();

    let moved = before
        .iter()
        .zip(after.iter())
        .filter(|(lhs, rhs)| lhs != rhs)
        .count() as u64;
    let fair_share = key_count / (n_nodes as u64 + 1);
    let new_node_load = table.loads().unwrap()[&format!("node-{}", n_nodes)];

    assert!(moved <= 2 * fair_share, "{} partitions moved", moved);
    assert!(new_node_load >= fair_share / 2);
    assert!(new_node_load as f64 <= table.average_load().unwrap());
}

#[test]
fn test_same_history_same_assignment() {
    let config = Config {
        key_count: 1009,
        replication_factor: 50,
        load_factor: 1.1,
        ..Default::default()
    }
    .with_hasher(Arc::new(Murmur3Hasher));
    let lhs: RingTable<Node> = RingTable::new(vec![], config.clone()).unwrap();
    let rhs: RingTable<Node> = RingTable::new(vec![], config).unwrap();

    for table in [&lhs, &rhs] {
        for i in 0..6 {
            table
                .add_node(Node::new(format!("10.0.0.{}:7000", i)))
                .unwrap();
        }
        table.remove_node("10.0.0.2:7000").unwrap();
        table.add_node(Node::new("10.0.0.9:7000")).unwrap();
    }

    assert_eq!(lhs.snapshot().unwrap(), rhs.snapshot().unwrap());
    assert_eq!(lhs.loads().unwrap(), rhs.loads().unwrap());
    assert_eq!(lhs.snapshot().unwrap().len(), 1009);
}

#[test]
fn test_concurrent_readers_and_writers() {
    let nodes: Vec<Node> = (0..3)
        .map(|i| Node::new(format!("127.0.0.1:{}", 3000 + i)))
        .collect();
    let table = RingTable::new(nodes, Config::default()).unwrap();

    let mut handles = Vec::new();
    for reader in 0..4 {
        let table = table.clone();
        handles.push(thread::spawn(move || {
            for i in 0..500 {
                let key = format!("key-{}-{}", reader, i);
                // the ring is never empty so every key always has an owner
                let owner = table.get_node(key.as_bytes()).unwrap();
                assert!(owner.is_some());
                let snapshot = table.snapshot().unwrap();
                assert_eq!(snapshot.len() as u64, table.config().key_count);
            }
        }));
    }

    let writer = {
        let table = table.clone();
        thread::spawn(move || {
            for i in 0..20 {
                let addr = format!("127.0.0.1:{}", 4000 + (i / 2) % 4);
                if i % 2 == 0 {
                    table.add_node(Node::new(addr)).unwrap();
                } else {
                    table.remove_node(&addr).unwrap();
                }
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    writer.join().unwrap();

    // every add was followed by the removal of the same node
    assert_eq!(table.len().unwrap(), 3);
    let loads: HashMap<String, u64> = table.loads().unwrap();
    assert_eq!(loads.values().sum::<u64>(), table.config().key_count);
    let members: Vec<String> = table
        .members()
        .unwrap()
        .iter()
        .map(|node| node.identity().to_string())
        .collect();
    assert_eq!(members.len(), 3);
}
