//! Cache module - Modular caching system using Moka.
//!
//! - `CacheRegistry` - Central registry holding all named caches
//! - `TypedCache` - Typed wrapper with TTL and optional LRU eviction
//!
//! ## Usage
//!
//! ```ignore
//! let groups: TypedCache<String, Arc<GroupMetadata>> =
//!     registry.get_or_create("group_metadata", CacheConfig::group_metadata());
//!
//! groups.insert(chat_id.clone(), metadata);
//! let hit = groups.get(&chat_id);
//! ```

mod config;
mod registry;
mod typed;

pub use config::CacheConfig;
pub use registry::CacheRegistry;
pub use typed::TypedCache;
