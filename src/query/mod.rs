//! Query cache layer: declarative reads and writes against the backend.
//!
//! Inspired by TanStack Query. Reads are represented by `Query<T>` handles
//! bound to a shared `QueryCache`; each cached result is keyed by
//! (operation, serialized parameters) and carries invalidation tags.
//! Writes are `Mutation<T>` values that, on success, mark every entry
//! providing one of their tags stale, which forces the next poll of any
//! bound view to refetch.

mod cache;
mod key;
mod mutation;
mod query;

pub use cache::{QueryCache, QuerySnapshot, QueryStatus, Tag};
pub use key::CacheKey;
pub use mutation::{Mutation, MutationState};
pub use query::Query;
