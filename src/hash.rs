//! Hash map used for sparse band storage.
//!
//! The hasher is picked at compile time. `std-hash` wins whenever it is
//! enabled, then `rustc-hash`, then `ahash`; with none of them the standard
//! library map is used.

#[cfg(all(feature = "rustc-hash", not(feature = "std-hash")))]
pub type FastMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(all(
    feature = "ahash",
    not(feature = "rustc-hash"),
    not(feature = "std-hash")
))]
pub type FastMap<K, V> = ahash::AHashMap<K, V>;

#[cfg(any(
    feature = "std-hash",
    all(not(feature = "rustc-hash"), not(feature = "ahash"))
))]
pub type FastMap<K, V> = std::collections::HashMap<K, V>;
