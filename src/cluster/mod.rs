//! The cluster engine shared by every update: a union-find forest over fragments and the pass
//! that gives each cluster a canonical id.

/// Thread safe unions for the `parallel` feature.
#[cfg(feature = "parallel")]
pub mod concurrent;
/// Canonical cluster ids and weight moments.
pub mod labeling;
/// Weighted union-find with path compression.
pub mod union_find;

#[cfg(feature = "parallel")]
pub use concurrent::ConcurrentUnionFind;
pub use labeling::ClusterMoments;
pub use union_find::{Fragment, UnionFind};

/// Check integrity of a struct.
pub trait Verify {
    /// Check integrity.
    fn verify(&self) -> bool;
}
