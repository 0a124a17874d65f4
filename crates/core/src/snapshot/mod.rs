//! Snapshot storage and feed assembly

pub mod feed;
pub mod store;

pub use feed::{AssembledFeed, FeedAssembler};
pub use store::{Insertion, SnapshotStore};
