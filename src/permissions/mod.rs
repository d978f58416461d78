//! Permission system for checking user roles in groups.
//!
//! ## Features
//!
//! - Cached group metadata lookups (one fetch serves every role check)
//! - Admin and bot-admin detection tolerant of device-suffixed addresses
//! - Owner detection
//!
//! ## Usage
//!
//! ```rust,ignore
//! let perms = Permissions::new(transport.clone(), &cache, &config);
//!
//! if perms.is_admin(&event.chat_id, &event.sender_id).await? {
//!     // ...
//! }
//!
//! // After promote/demote
//! perms.invalidate(&event.chat_id);
//! ```

mod checker;

pub use checker::Permissions;
