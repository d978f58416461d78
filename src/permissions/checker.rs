//! Permission checker with caching.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::config::Config;
use crate::transport::{GroupMetadata, Transport, normalize_jid};

/// Permission checker backed by a group metadata cache.
///
/// The bot owner (configured number or linked id) and the bot account
/// itself count as owners. Ownership does not imply group admin.
#[derive(Clone)]
pub struct Permissions {
    transport: Arc<dyn Transport>,
    groups: TypedCache<String, Arc<GroupMetadata>>,
    /// Normalized owner addresses.
    owners: Vec<String>,
}

impl Permissions {
    pub fn new(transport: Arc<dyn Transport>, cache_registry: &CacheRegistry, config: &Config) -> Self {
        let groups = cache_registry.get_or_create("group_metadata", CacheConfig::group_metadata());

        let mut owners = vec![normalize_jid(&format!("{}@s.whatsapp.net", config.owner_number))];
        owners.extend(config.owner_lid.as_deref().map(normalize_jid));

        Self {
            transport,
            groups,
            owners,
        }
    }

    /// Group metadata, served from cache when fresh.
    pub async fn group_metadata(&self, group_id: &str) -> anyhow::Result<Arc<GroupMetadata>> {
        let key = group_id.to_string();

        if let Some(cached) = self.groups.get(&key) {
            debug!("Group metadata cache hit for {}", group_id);
            return Ok(cached);
        }

        debug!("Group metadata cache miss for {}", group_id);
        let metadata = Arc::new(self.transport.group_metadata(group_id).await?);
        self.groups.insert(key, metadata.clone());

        Ok(metadata)
    }

    /// Check if a user is an admin (or super admin) of a group.
    pub async fn is_admin(&self, group_id: &str, user_id: &str) -> anyhow::Result<bool> {
        let metadata = self.group_metadata(group_id).await?;
        Ok(metadata.participant(user_id).is_some_and(|p| p.is_admin()))
    }

    /// Check if the bot holds admin role, under either of its identities.
    pub async fn bot_is_admin(&self, group_id: &str) -> anyhow::Result<bool> {
        let metadata = self.group_metadata(group_id).await?;
        let identity = self.transport.identity();

        Ok(metadata
            .participants
            .iter()
            .any(|p| p.is_admin() && identity.matches(&p.id)))
    }

    /// Check if a sender is the bot owner or the bot account itself.
    pub fn is_owner(&self, sender_id: &str) -> bool {
        let sender = normalize_jid(sender_id);
        self.owners.contains(&sender) || self.transport.identity().matches(&sender)
    }

    /// Invalidate cached metadata for a group.
    ///
    /// Call this after any membership change so role checks see it.
    pub fn invalidate(&self, group_id: &str) {
        self.groups.invalidate(&group_id.to_string());
        debug!("Invalidated group metadata cache for {}", group_id);
    }
}
