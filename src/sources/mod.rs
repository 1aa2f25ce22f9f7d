//! Collection sources.
//!
//! Two origins feed the ingestion pipeline:
//! - **manual** - hand-authored `collection_<key>.json` files
//! - **remote** - snapshots of streaming-service playlists written by sync
//!
//! Both are normalized into [`RawCollection`](crate::ingest::raw::RawCollection).

pub mod manual;
pub mod remote;
pub mod snapshot;

pub use manual::{ManualDocument, ManualEntry, ManualIndex, collection_key};
pub use snapshot::{SnapshotStore, snapshot_file_name};
