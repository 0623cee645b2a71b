//! Finding new books by paging through a subject listing.
//!
//! Works already in the catalog are left alone; only new keys are inserted.

mod stream;

pub use self::stream::{DiscoverEvent, DiscoverOptions, SkipReason, discover};
