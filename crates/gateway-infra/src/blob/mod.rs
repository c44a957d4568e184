//! Blob store implementations.

use uuid::Uuid;

#[cfg(feature = "http")]
mod http;
mod memory;

#[cfg(feature = "http")]
pub use http::{HttpBlobStore, HttpBlobStoreConfig};
pub use memory::InMemoryBlobStore;

/// Object key for an upload: owner prefix plus a unique, path-safe name.
pub(crate) fn object_key(owner_id: Uuid, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    format!("{}/{}-{}", owner_id, Uuid::new_v4(), safe)
}
