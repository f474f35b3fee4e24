use minirel::buffer::{BufferPool, ReplacementStrategy};
use minirel::index::BTreeIndex;
use minirel::storage::PageFile;
use minirel::{KeyType, PageId, RecordId, SlotId};

fn main() {
    println!("Minirel - a relational storage stack in Rust");
    println!("============================================\n");

    let pf_path = "demo.pf";
    let idx_path = "demo.idx";

    // Create a page file with a few pages
    PageFile::create(pf_path).expect("Failed to create page file");
    {
        let pf = PageFile::open(pf_path).expect("Failed to open page file");
        pf.ensure_capacity(4).expect("Failed to grow page file");
        println!("Created page file {} with {} pages", pf_path, pf.total_pages());
    }

    // Run some pages through a small LRU buffer pool
    let mut pool =
        BufferPool::new(pf_path, 3, ReplacementStrategy::Lru).expect("Failed to open pool");
    println!("Opened buffer pool with {} frames\n", pool.num_frames());

    for i in 0..4 {
        let handle = pool.pin_page(PageId::new(i)).expect("Failed to pin page");
        pool.page_mut(&handle).expect("Failed to access page")[0] = i as u8;
        pool.mark_dirty(&handle).expect("Failed to mark dirty");
        pool.unpin_page(&handle).expect("Failed to unpin page");
    }
    pool.force_flush().expect("Failed to flush pool");

    println!("Pool stats after writing 4 pages:");
    println!("  - Frame contents: {:?}", pool.frame_contents());
    println!("  - Reads from disk: {}", pool.read_io_count());
    println!("  - Writes to disk: {}", pool.write_io_count());
    pool.shutdown()
        .map_err(|(_, e)| e)
        .expect("Failed to shut down pool");

    // Build a small index and scan it back in order
    BTreeIndex::create(idx_path, KeyType::Int, 3).expect("Failed to create index");
    let mut tree = BTreeIndex::open(idx_path).expect("Failed to open index");

    for (slot, &key) in [10, 20, 5, 15, 25, 1].iter().enumerate() {
        let rid = RecordId::new(PageId::new(0), SlotId::new(slot as u16));
        tree.insert_key(key, rid).expect("Failed to insert key");
    }

    println!("\nIndex after 6 inserts ({} nodes, {} entries):", tree.num_nodes(), tree.num_entries());
    print!("{}", tree.dump());

    println!("\nScanning in key order:");
    for (key, rid) in tree.open_scan() {
        println!("  - {} -> ({}, {})", key, rid.page_id.as_u32(), rid.slot_id.as_u16());
    }

    tree.delete_key(15).expect("Failed to delete key");
    println!("\nAfter deleting 15:");
    print!("{}", tree.dump());

    tree.close().expect("Failed to close index");

    // Clean up
    std::fs::remove_file(pf_path).ok();
    std::fs::remove_file(idx_path).ok();
    println!("\nDemo completed successfully!");
}
