use minirel::index::BTreeIndex;
use minirel::{Key, KeyType, MinirelError, PageId, RecordId, SlotId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tempfile::TempDir;

fn rid_for(key: Key) -> RecordId {
    RecordId::new(PageId::new(key as u32 / 100), SlotId::new((key % 100) as u16))
}

fn fresh_tree(dir: &TempDir, order: usize) -> BTreeIndex {
    let path = dir.path().join("tree.idx");
    BTreeIndex::create(&path, KeyType::Int, order).unwrap();
    BTreeIndex::open(&path).unwrap()
}

#[test]
fn test_insert_split_scenario() {
    let dir = TempDir::new().unwrap();
    let mut tree = fresh_tree(&dir, 3);

    tree.insert_key(10, rid_for(10)).unwrap();
    tree.insert_key(20, rid_for(20)).unwrap();
    tree.insert_key(5, rid_for(5)).unwrap();
    tree.insert_key(15, rid_for(15)).unwrap();

    assert_eq!(tree.num_nodes(), 3);
    assert_eq!(tree.num_entries(), 4);
    assert_eq!(
        tree.dump(),
        "[Root] (15)\n  [Leaf] (5, 10)\n  [Leaf] (15, 20)\n"
    );

    // A key equal to the separator lives in the right leaf
    assert_eq!(tree.find_key(15).unwrap(), rid_for(15));
    assert_eq!(tree.find_key(5).unwrap(), rid_for(5));
    assert_eq!(tree.find_key(20).unwrap(), rid_for(20));
}

#[test]
fn test_sequential_insert_then_full_scan() {
    let dir = TempDir::new().unwrap();
    let mut tree = fresh_tree(&dir, 4);

    for key in 1..=200 {
        tree.insert_key(key, rid_for(key)).unwrap();
    }
    assert_eq!(tree.num_entries(), 200);
    assert!(tree.is_consistent());

    let entries: Vec<(Key, RecordId)> = tree.open_scan().collect();
    assert_eq!(entries.len(), 200);
    for (i, &(key, rid)) in entries.iter().enumerate() {
        assert_eq!(key, i as Key + 1);
        assert_eq!(rid, rid_for(key));
    }
}

#[test]
fn test_reverse_insert_keeps_tree_balanced() {
    let dir = TempDir::new().unwrap();
    let mut tree = fresh_tree(&dir, 3);

    for key in (1..=100).rev() {
        tree.insert_key(key, rid_for(key)).unwrap();
        assert!(tree.is_consistent(), "inconsistent after inserting {}", key);
    }

    let keys: Vec<Key> = tree.open_scan().map(|(k, _)| k).collect();
    assert_eq!(keys, (1..=100).collect::<Vec<Key>>());
}

#[test]
fn test_duplicate_keys_rejected_everywhere() {
    let dir = TempDir::new().unwrap();
    let mut tree = fresh_tree(&dir, 3);

    for key in 0..50 {
        tree.insert_key(key, rid_for(key)).unwrap();
    }
    // Retry each key: separators, leaf heads, and interior positions alike
    for key in 0..50 {
        assert!(matches!(
            tree.insert_key(key, rid_for(key)),
            Err(MinirelError::KeyAlreadyExists(_))
        ));
    }
    assert_eq!(tree.num_entries(), 50);
}

#[test]
fn test_scan_next_entry_protocol() {
    let dir = TempDir::new().unwrap();
    let mut tree = fresh_tree(&dir, 3);

    for &key in &[7, 3, 11] {
        tree.insert_key(key, rid_for(key)).unwrap();
    }

    let mut scan = tree.open_scan();
    assert_eq!(scan.next_entry().unwrap(), rid_for(3));
    assert_eq!(scan.next_entry().unwrap(), rid_for(7));
    assert_eq!(scan.next_entry().unwrap(), rid_for(11));
    assert!(matches!(
        scan.next_entry(),
        Err(MinirelError::NoMoreEntries)
    ));
}

#[test]
fn test_delete_with_borrow_and_merge() {
    let dir = TempDir::new().unwrap();
    let mut tree = fresh_tree(&dir, 3);

    for key in 1..=30 {
        tree.insert_key(key, rid_for(key)).unwrap();
    }

    // Deleting from the low end forces borrows from right siblings and
    // merges as leaves drain
    for key in 1..=25 {
        tree.delete_key(key).unwrap();
        assert!(tree.is_consistent(), "inconsistent after deleting {}", key);
        assert!(matches!(
            tree.find_key(key),
            Err(MinirelError::KeyNotFound(_))
        ));
    }

    let keys: Vec<Key> = tree.open_scan().map(|(k, _)| k).collect();
    assert_eq!(keys, (26..=30).collect::<Vec<Key>>());
}

#[test]
fn test_delete_everything_collapses_to_empty_root() {
    let dir = TempDir::new().unwrap();
    let mut tree = fresh_tree(&dir, 4);

    for key in 1..=100 {
        tree.insert_key(key, rid_for(key)).unwrap();
    }
    for key in 1..=100 {
        tree.delete_key(key).unwrap();
    }

    assert_eq!(tree.num_entries(), 0);
    assert_eq!(tree.num_nodes(), 1);
    assert_eq!(tree.height(), 1);
    assert!(tree.is_consistent());

    // The empty tree accepts inserts again
    tree.insert_key(42, rid_for(42)).unwrap();
    assert_eq!(tree.find_key(42).unwrap(), rid_for(42));
}

#[test]
fn test_interleaved_insert_delete_soak() {
    let dir = TempDir::new().unwrap();
    let mut tree = fresh_tree(&dir, 3);
    let mut rng = StdRng::seed_from_u64(0xB17EE);

    let mut keys: Vec<Key> = (0..500).collect();
    keys.shuffle(&mut rng);
    for &key in &keys {
        tree.insert_key(key, rid_for(key)).unwrap();
    }
    assert!(tree.is_consistent());
    assert_eq!(tree.num_entries(), 500);

    // Remove a random half, then verify both halves
    keys.shuffle(&mut rng);
    let (gone, kept) = keys.split_at(250);
    for &key in gone {
        tree.delete_key(key).unwrap();
    }
    assert!(tree.is_consistent());
    assert_eq!(tree.num_entries(), 250);

    for &key in gone {
        assert!(matches!(
            tree.find_key(key),
            Err(MinirelError::KeyNotFound(_))
        ));
    }
    for &key in kept {
        assert_eq!(tree.find_key(key).unwrap(), rid_for(key));
    }

    let mut expected: Vec<Key> = kept.to_vec();
    expected.sort_unstable();
    let scanned: Vec<Key> = tree.open_scan().map(|(k, _)| k).collect();
    assert_eq!(scanned, expected);
}

#[test]
fn test_larger_order_shallow_tree() {
    let dir = TempDir::new().unwrap();
    let mut tree = fresh_tree(&dir, 64);

    for key in 0..1000 {
        tree.insert_key(key, rid_for(key)).unwrap();
    }
    assert!(tree.height() <= 3);
    assert!(tree.is_consistent());
    assert_eq!(tree.find_key(999).unwrap(), rid_for(999));
}

#[test]
fn test_metadata_round_trips_through_close() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("meta.idx");

    BTreeIndex::create(&path, KeyType::Int, 7).unwrap();
    {
        let mut tree = BTreeIndex::open(&path).unwrap();
        for key in 0..25 {
            tree.insert_key(key, rid_for(key)).unwrap();
        }
        tree.close().unwrap();
    }

    let tree = BTreeIndex::open(&path).unwrap();
    assert_eq!(tree.order(), 7);
    assert_eq!(tree.key_type(), KeyType::Int);
    assert_eq!(tree.num_entries(), 25);
}

#[test]
fn test_create_open_delete_lifecycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("life.idx");

    BTreeIndex::create(&path, KeyType::Int, 3).unwrap();
    {
        let tree = BTreeIndex::open(&path).unwrap();
        assert_eq!(tree.num_entries(), 0);
        tree.close().unwrap();
    }

    BTreeIndex::delete(&path).unwrap();
    assert!(matches!(
        BTreeIndex::open(&path),
        Err(MinirelError::FileNotFound(_))
    ));
}
