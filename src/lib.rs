//! containment-map: in-memory indexes over keys ordered by a caller-supplied
//! containment relation. Values stored against coarse keys answer queries
//! made with more specific keys; the narrowest covering key wins.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: resolve "which stored key is the most specific one covering this
//!   query" quickly, and keep memoized answers correct while literals change.
//! - Layers:
//!   - ContainmentSet<T, R, S>: a set with containment-aware membership,
//!     cascading removal, root detection and live filtered views.
//!   - LiteralStore<K, V, S>: literal key -> value storage addressed by
//!     generational `Capsule` handles.
//!   - ContainmentHashMap<K, V, R, S>: the resolution contract over a
//!     literal store, answered by scanning every literal.
//!   - CachedContainmentMap<K, V, R, P, S>: the same contract with a
//!     bounded cache of query key -> maximal capsule set. `P` chooses how a
//!     miss is computed (`Rescan` or `Upward`).
//!
//! Constraints
//! - The relation is reflexive and transitive, not necessarily
//!   antisymmetric. Mutual-containment peers are equally specific; peers
//!   with different values make a query `Ambiguous`.
//! - Single-threaded: the cached map resolves through `&self` with a
//!   `RefCell` inside, so it is `!Sync`.
//! - The cache is bounded (CLOCK eviction) and never changes an answer;
//!   eviction is observable only as a miss.
//!
//! Cache soundness
//! - Cache entries hold capsules, not values. A value update is seen by
//!   every entry naming that capsule; a removal makes the capsule stale and
//!   every entry naming it a miss.
//! - Inserting a literal `n` drops exactly the entries whose maximal set
//!   could change: `q -> M` with `contains(n, q)` and no `m` in `M` strictly
//!   more specific than `n`.
//!
//! Reentrancy policy
//! - The relation is user code running while map state is borrowed. Every
//!   public map operation enters a debug-only guard; a relation that calls
//!   back into the same map panics in debug builds. Release builds carry no
//!   guard state.
//!
//! Notes and non-goals
//! - No persistence, no multi-key transactions, no thread-safe variant.
//! - Relation contract violations are documented, not detected.
//! - `LiteralStore` and `QueryCache` are public only because custom miss
//!   strategies see them; most callers never touch them.

mod bounds;
mod cached_map;
mod cached_map_proptest;
mod config;
mod error;
pub mod literal_store;
mod map;
pub mod query_cache;
mod reentrancy;
mod relation;
mod resolution;
mod set;
mod upward;

// Public surface
pub use bounds::Bounds;
pub use cached_map::{CacheStats, CachedContainmentMap};
pub use config::{CacheConfig, DEFAULT_CACHE_CAPACITY};
pub use error::{AmbiguousInsert, ContainmentError};
pub use literal_store::Capsule;
pub use map::{ContainmentHashMap, ContainmentMap};
pub use relation::{upward_fn, ContainmentRelation, FnUpward, PathPrefix, UpwardRelation};
pub use resolution::Resolution;
pub use set::{ContainmentSet, RootView, View};
pub use upward::{MissStrategy, Rescan, Search, Upward};
