pub mod pages;
pub mod store;

pub use pages::EventPageCache;
pub use store::{KeyValueStore, MemoryStore, StoreError};
