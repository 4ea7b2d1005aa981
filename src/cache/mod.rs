//! Persistent cache of compiled models
//!
//! Provides content-addressed storage keyed by model fingerprints.
//! Entries are never edited in place: a forced recompile replaces the
//! whole file.
//!
//! # Lookup Outcomes
//!
//! | Outcome | Action | Logged |
//! |---------|--------|--------|
//! | Found | return cached artifact | debug |
//! | NotFound | compile and store | debug |
//! | Corrupt | compile and store | warn |

pub mod entry;
pub mod lock;
pub mod store;
pub mod template;

pub use entry::{EntryHeader, Lookup};
pub use store::{
    default_cache_dir, format_bytes, format_duration, BuildRequest, CacheStore, Cached, EntryInfo,
};
pub use template::{NamingTemplate, DEFAULT_TEMPLATE};
