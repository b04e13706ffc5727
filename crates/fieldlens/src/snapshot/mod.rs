//! Columnar snapshots of coerced tables.

mod codec;
mod store;

pub use codec::{decode, encode};
pub use store::{
    LoadOrigin, LoadedTable, SnapshotLoader, read_snapshot, snapshot_path, write_snapshot,
};
