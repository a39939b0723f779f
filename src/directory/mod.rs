pub mod types;
pub mod hash_table;
pub mod trie;

pub use types::{Account, Reservation, Role};
pub use hash_table::{AccountDirectory, DEFAULT_BUCKETS};
pub use trie::{IdentifierTrie, TrieNode};
