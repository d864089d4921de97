//! Walks a handful of nodes through decode -> mutate -> encode -> store ->
//! fetch, the way the (out-of-scope) enclosing trie would drive this crate.
//! Not part of the crate's public contract; a manual exercise aid only.

use tracing::{info, Level};

use ledger_shamap::codec::{InputFormat, OutputFormat};
use ledger_shamap::item::Item;
use ledger_shamap::{LeafKind, Node, NodeId, NodeStore};

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let store = NodeStore::new();

    let txn = Node::construct_leaf(
        NodeId::new(1),
        Item::new([0xAB; 32], b"hello-ledger".to_vec()),
        LeafKind::TxNoMeta,
        1,
    )
    .expect("payload is >= 12 bytes");
    info!("{}", txn.describe());
    store.put(txn.id(), txn.clone()).expect("store is not poisoned");

    let mut inner = Node::construct_empty(1, NodeId::new(2));
    inner.make_inner();
    for slot in 0..3u8 {
        inner
            .set_child_hash(slot, [slot + 1; 32])
            .expect("node is INNER and slot is in range");
    }
    info!("{}", inner.describe());

    let mut wire = Vec::new();
    inner.encode(&mut wire, OutputFormat::Wire).expect("non-empty inner encodes");
    let roundtripped = Node::decode(inner.id(), &wire, 1, InputFormat::Wire, None)
        .expect("wire bytes just produced by encode");
    assert_eq!(roundtripped.hash(), inner.hash());
    store.put(inner.id(), inner).expect("store is not poisoned");

    let newer = store
        .get(txn.id())
        .expect("store is not poisoned")
        .expect("just inserted")
        .construct_clone(2)
        .expect("fetched node is not in scratch state");
    info!("cloned node under new seq: {}", newer.seq());

    println!("stored {} nodes", store.len());
}
