//! # GearBase Store
//!
//! Flat-file JSON collection store for GearBase.
//!
//! Every named collection is backed by one `<collection>.json` file holding
//! an insertion-ordered array of schemaless records. Reads are served from
//! an in-process cache owned by the store instance; every write replaces
//! the whole backing file with the new sequence.
//!
//! ## Design Principles
//!
//! - One addressable file per collection, whole-file replacement on write
//! - Records are open JSON objects; the store only understands `id`,
//!   `created_at`, and `updated_at`
//! - Each collection has a dedicated mutex held across the full
//!   read-modify-write, so same-collection mutations cannot lose updates
//! - The data directory is held under an exclusive advisory lock for the
//!   store's lifetime
//!
//! ## Example
//!
//! ```rust,ignore
//! use gearbase_store::{CollectionStore, Record};
//!
//! let store = CollectionStore::open(Path::new("data"))?;
//! let mut rec = Record::new();
//! rec.set("asset_id", "CAM001");
//! let saved = store.insert("assets", rec)?;
//! assert!(saved.get("created_at").is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dir;
mod error;
mod record;
mod store;

pub use dir::DataDir;
pub use error::{StoreError, StoreResult};
pub use record::{now_stamp, Record};
pub use store::CollectionStore;
