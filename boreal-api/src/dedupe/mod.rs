//! Contact deduplication: identity normalization, duplicate grouping and
//! survivor merges.

pub mod finder;
pub mod merge;
pub mod normalize;

pub use finder::DuplicateFinder;
pub use merge::{MergeCommand, MergeError, MergeExecutor, MergeOutcome};
pub use normalize::{canonical_phone, IdentityNormalizer};
