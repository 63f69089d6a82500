//! avl-hashindex: a persistent, string-keyed open-addressing map whose slot
//! table is an AVL order-statistics tree.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(log n) positional slot access without a flat array, with value
//!   semantics so every earlier version of a store or map stays readable.
//! - Layers:
//!   - Tree<T> (crate-private): tagged `Empty | Node(Rc<Node<T>>)` variant
//!     with cached height and subtree size per node; rank descent,
//!     rotations and rebalancing live here.
//!   - OrderedStore<T>: public positional sequence over one tree root, with
//!     bounds checks, a configurable maximum length and explicit-stack
//!     iterators.
//!   - HashIndex<V, S>: linear-probing map over an
//!     `OrderedStore<Option<Entry<V>>>`; growth, rehash and back-shift
//!     removal.
//!
//! Constraints
//! - Single-threaded: nodes are shared through `Rc`, so stores and maps are
//!   `!Send`/`!Sync`.
//! - Every fallible operation returns `Result<_, Error>`; nothing panics on
//!   bad input and nothing retries.
//! - Tree recursion is bounded by height (O(log n)); traversals use a heap
//!   stack, so large collections never exhaust the call stack.
//!
//! Persistence
//! - `set`/`insert`/`remove`/`put`/`clear` take `&self` and return a new
//!   value. They clone the receiver (O(1): one `Rc` bump) and mutate the
//!   clone; `Rc::make_mut` copies exactly the nodes on the touched path.
//! - The `*_mut` variants mutate in place and only copy nodes still shared
//!   with another version.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its raw `u64` hash; growth re-derives slots from the
//!   stored hash and never re-hashes a key. The hasher is cloned into every
//!   derived map, so a key hashes the same across all versions.
//! - Once `len >= capacity * load_percent / 100` the table grows to
//!   `capacity * 2 + 1` before probing, unless the key already sits in its
//!   home slot. Overwriting a key further down its cluster can still grow
//!   the table.
//!
//! Removal
//! - No tombstones. Removing a slot back-shifts the rest of its cluster so
//!   that no probe chain ever crosses a hole; lookups stop at the first
//!   empty slot.
//!
//! Notes and non-goals
//! - No persistence to disk, no comparator-ordered trees, no concurrent
//!   mutation of one instance.
//! - `keys`, `values`, `entries` and rendering follow table order, not
//!   insertion order.

mod error;
pub mod hash_index;
mod hash_index_proptest;
pub mod ordered_store;
mod tree;

// Public surface
pub use error::Error;
pub use hash_index::{Config, HashIndex, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR};
pub use ordered_store::{OrderedStore, DEFAULT_MAX_LEN};
