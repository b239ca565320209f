//! Collection statistics module.

pub mod log;

pub use log::{
    create_shared_log, create_shared_log_with_persistence, CollectionLog, CollectionStats,
    SharedCollectionLog,
};
