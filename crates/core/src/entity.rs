//! Entity trait: records with a stable identity (products, lots, movements).

/// A persisted record addressed by a typed identifier.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Human-readable entity kind, used in "not found" errors.
    fn kind() -> &'static str;
}
