//! Stored catalog records.

/// A record with its own identity and a write counter.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Revision of the persisted record.
    ///
    /// Stores start new records at 1 and bump the revision on every write.
    fn version(&self) -> u64;
}
