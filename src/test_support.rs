//! Fakes for the collaborators, shared by unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::bot::AppState;
use crate::config::{AntiBan, Config, HistoryRetention, StorageBackend, parse_url};
use crate::database::{HistoryEntry, MemoryStore, Role, Store};
use crate::message::{InboundEvent, MediaRef, MessageKey, WebMessage};
use crate::plugins::PluginContext;
use crate::services::{EditedImage, Services, TikTokVideo, Track};
use crate::transport::{
    BotIdentity, GroupMetadata, GroupParticipant, MembershipAction, Outbound, Presence, Transport,
    TransportError,
};
use crate::utils::{Classified, RetryPolicy, parse_command};

pub fn test_config() -> Config {
    Config {
        bot_name: "Alicia BOT".to_string(),
        owner_name: "Owner".to_string(),
        owner_number: "62811".to_string(),
        owner_lid: Some("555@lid".to_string()),
        footer: "© NextA Project 2025".to_string(),
        locale: "id".to_string(),
        api_base_url: parse_url("http://127.0.0.1:9").unwrap(),
        upload_url: parse_url("http://127.0.0.1:9").unwrap(),
        bridge_url: parse_url("http://127.0.0.1:9").unwrap(),
        bridge_token: None,
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        storage: StorageBackend::Memory,
        auto_read: true,
        auto_upload_images: true,
        anti_ban: AntiBan::disabled(),
        plugin_dir: "plugins".into(),
        history: HistoryRetention::default(),
        plugin_retry: RetryPolicy::new(3, Duration::ZERO),
        api_retry: RetryPolicy::new(3, Duration::ZERO),
    }
}

static MESSAGE_IDS: AtomicU64 = AtomicU64::new(1);

fn next_id() -> String {
    format!("MSG{}", MESSAGE_IDS.fetch_add(1, Ordering::Relaxed))
}

/// A private text message from `sender`.
pub fn private_message(sender: &str, text: &str) -> WebMessage {
    serde_json::from_value(json!({
        "key": { "remoteJid": sender, "fromMe": false, "id": next_id() },
        "pushName": "Tester",
        "message": { "conversation": text }
    }))
    .unwrap()
}

/// A group text message from `sender`.
pub fn group_message(group: &str, sender: &str, text: &str) -> WebMessage {
    serde_json::from_value(json!({
        "key": { "remoteJid": group, "fromMe": false, "id": next_id(), "participant": sender },
        "pushName": "Tester",
        "message": { "conversation": text }
    }))
    .unwrap()
}

/// Turn a text message into an image message captioned with its text.
pub fn with_image(mut msg: WebMessage) -> WebMessage {
    let caption = msg
        .message
        .as_ref()
        .and_then(|m| m.conversation.clone())
        .unwrap_or_default();
    msg.message = Some(
        serde_json::from_value(json!({
            "imageMessage": { "caption": caption, "mimetype": "image/jpeg", "mediaKey": "k" }
        }))
        .unwrap(),
    );
    msg
}

pub fn group_with_admins(group: &str, admins: &[&str], members: &[&str]) -> GroupMetadata {
    let participants = admins
        .iter()
        .map(|id| GroupParticipant {
            id: id.to_string(),
            admin: Some("admin".to_string()),
        })
        .chain(members.iter().map(|id| GroupParticipant {
            id: id.to_string(),
            admin: None,
        }))
        .collect();

    GroupMetadata {
        id: group.to_string(),
        subject: "Test Group".to_string(),
        participants,
    }
}

/// Transport that records everything sent and serves canned group metadata.
///
/// The bot is `62800@s.whatsapp.net` with linked id `777@lid`.
pub struct RecordingTransport {
    identity: BotIdentity,
    sent: Mutex<Vec<(String, Outbound)>>,
    groups: Mutex<HashMap<String, GroupMetadata>>,
    fetches: AtomicUsize,
    membership: Mutex<Vec<(String, Vec<String>, MembershipAction)>>,
    read: AtomicUsize,
    presences: Mutex<Vec<Presence>>,
    fail_downloads: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            identity: BotIdentity {
                id: "62800@s.whatsapp.net".to_string(),
                lid: Some("777@lid".to_string()),
            },
            sent: Mutex::default(),
            groups: Mutex::default(),
            fetches: AtomicUsize::new(0),
            membership: Mutex::default(),
            read: AtomicUsize::new(0),
            presences: Mutex::default(),
            fail_downloads: AtomicBool::new(false),
        }
    }

    pub fn set_group(&self, metadata: GroupMetadata) {
        self.groups.lock().insert(metadata.id.clone(), metadata);
    }

    pub fn metadata_fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(String, Outbound)> {
        self.sent.lock().clone()
    }

    /// Bodies of sent text messages, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|(_, m)| m.as_text().map(str::to_string))
            .collect()
    }

    /// Emojis of sent reactions, in order.
    pub fn reactions(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|(_, m)| match m {
                Outbound::React { emoji, .. } => Some(emoji.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn membership_changes(&self) -> Vec<(String, Vec<String>, MembershipAction)> {
        self.membership.lock().clone()
    }

    pub fn read_count(&self) -> usize {
        self.read.load(Ordering::SeqCst)
    }

    pub fn presences(&self) -> Vec<Presence> {
        self.presences.lock().clone()
    }

    pub fn fail_downloads(&self) {
        self.fail_downloads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    async fn send(
        &self,
        chat_id: &str,
        message: Outbound,
        _quoted: Option<&MessageKey>,
    ) -> Result<(), TransportError> {
        self.sent.lock().push((chat_id.to_string(), message));
        Ok(())
    }

    async fn read_messages(&self, keys: &[MessageKey]) -> Result<(), TransportError> {
        self.read.fetch_add(keys.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn presence_update(&self, _chat_id: &str, presence: Presence) -> Result<(), TransportError> {
        self.presences.lock().push(presence);
        Ok(())
    }

    async fn group_metadata(&self, group_id: &str) -> Result<GroupMetadata, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.groups
            .lock()
            .get(group_id)
            .cloned()
            .ok_or_else(|| TransportError::Rejected {
                status: 404,
                body: format!("unknown group {}", group_id),
            })
    }

    async fn group_participants_update(
        &self,
        group_id: &str,
        participants: &[String],
        action: MembershipAction,
    ) -> Result<(), TransportError> {
        self.membership
            .lock()
            .push((group_id.to_string(), participants.to_vec(), action));
        Ok(())
    }

    async fn download_media(&self, _media: &MediaRef) -> Result<Vec<u8>, TransportError> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected {
                status: 410,
                body: "media expired".to_string(),
            });
        }
        Ok(b"image-bytes".to_vec())
    }
}

/// Scriptable `Services`. Every call is recorded as `name:arg`.
#[derive(Default)]
pub struct FakeServices {
    calls: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    chat_reply: Mutex<Option<String>>,
    chat_fails: AtomicBool,
    image: Mutex<Option<String>>,
    vision: Mutex<Option<String>>,
    track: Mutex<Option<Track>>,
    tiktok: Mutex<Option<TikTokVideo>>,
}

impl FakeServices {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }

    pub fn chat_attempts(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn set_chat(&self, reply: &str) {
        *self.chat_reply.lock() = Some(reply.to_string());
    }

    pub fn fail_chat(&self) {
        self.chat_fails.store(true, Ordering::SeqCst);
    }

    pub fn set_image(&self, url: &str) {
        *self.image.lock() = Some(url.to_string());
    }

    pub fn fail_image(&self) {
        *self.image.lock() = None;
    }

    pub fn set_vision(&self, answer: Option<&str>) {
        *self.vision.lock() = answer.map(str::to_string);
    }

    pub fn set_track(&self, track: Option<Track>) {
        *self.track.lock() = track;
    }

    pub fn set_tiktok(&self, video: Option<TikTokVideo>) {
        *self.tiktok.lock() = video;
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Services for FakeServices {
    async fn chat(&self, prompt: &str) -> anyhow::Result<String> {
        self.record("chat".to_string());
        self.prompts.lock().push(prompt.to_string());
        if self.chat_fails.load(Ordering::SeqCst) {
            anyhow::bail!("API Error (HTTP 502)");
        }
        Ok(self
            .chat_reply
            .lock()
            .clone()
            .unwrap_or_else(|| "<message>ok</message>".to_string()))
    }

    async fn generate_image(&self, prompt: &str) -> anyhow::Result<String> {
        self.record(format!("generate_image:{}", prompt));
        self.image
            .lock()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("image generation signal [false] received"))
    }

    async fn analyze_image(&self, image_url: &str, question: &str) -> anyhow::Result<Option<String>> {
        self.record(format!("analyze_image:{}:{}", image_url, question));
        Ok(self.vision.lock().clone())
    }

    async fn search_music(&self, query: &str) -> anyhow::Result<Option<Track>> {
        self.record(format!("search_music:{}", query));
        Ok(self.track.lock().clone())
    }

    async fn download_tiktok(&self, url: &str) -> anyhow::Result<Option<TikTokVideo>> {
        self.record(format!("download_tiktok:{}", url));
        Ok(self.tiktok.lock().clone())
    }

    async fn edit_image(&self, image_url: &str, prompt: &str) -> anyhow::Result<EditedImage> {
        self.record(format!("edit_image:{}:{}", image_url, prompt));
        Ok(EditedImage {
            output: "https://img.example/edited.png".to_string(),
            source: None,
        })
    }

    async fn upload_media(&self, _bytes: Vec<u8>, filename: &str) -> anyhow::Result<String> {
        self.record(format!("upload_media:{}", filename));
        Ok("https://files.example/uploads/1.jpg".to_string())
    }
}

/// Fully wired `AppState` over the fakes and a temporary plugin directory.
/// `MemoryStore` whose history appends fail for one role.
pub struct FlakyStore {
    inner: MemoryStore,
    failing: Role,
}

impl FlakyStore {
    pub fn failing(role: Role) -> Self {
        Self {
            inner: MemoryStore::default(),
            failing: role,
        }
    }

    pub async fn entries(&self, chat_id: &str) -> Vec<HistoryEntry> {
        self.inner.recent_history(chat_id, usize::MAX).await.unwrap()
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn get_value(&self, key: &str) -> anyhow::Result<Option<Value>> {
        self.inner.get_value(key).await
    }

    async fn set_value(&self, key: &str, value: Value) -> anyhow::Result<()> {
        self.inner.set_value(key, value).await
    }

    async fn append_history(&self, entry: HistoryEntry) -> anyhow::Result<()> {
        if entry.role == self.failing {
            anyhow::bail!("store timeout");
        }
        self.inner.append_history(entry).await
    }

    async fn recent_history(&self, chat_id: &str, limit: usize) -> anyhow::Result<Vec<HistoryEntry>> {
        self.inner.recent_history(chat_id, limit).await
    }
}

pub struct Harness {
    pub state: AppState,
    pub transport: Arc<RecordingTransport>,
    pub services: Arc<FakeServices>,
    dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_manifests(&[])
    }

    /// Harness whose plugin directory holds the given `(path, body)` files.
    pub fn with_manifests(files: &[(&str, &str)]) -> Self {
        Self::with_config(test_config(), files)
    }

    pub fn with_config(config: Config, files: &[(&str, &str)]) -> Self {
        let store = Arc::new(MemoryStore::new(config.history));
        Self::with_store(config, store, files)
    }

    pub fn with_store(mut config: Config, store: Arc<dyn Store>, files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for (rel, body) in files {
            write_file(dir.path(), rel, body);
        }
        config.plugin_dir = dir.path().to_path_buf();

        let transport = Arc::new(RecordingTransport::new());
        let services = Arc::new(FakeServices::default());
        let state = AppState::new(config, store, transport.clone(), services.clone());
        state.plugins.load().unwrap();

        Self {
            state,
            transport,
            services,
            dir,
        }
    }

    /// Add a manifest without reloading.
    pub fn write_manifest(&self, rel: &str, body: &str) {
        write_file(self.dir.path(), rel, body);
    }

    pub fn context(&self, sender: &str, text: &str) -> PluginContext {
        self.context_for(&private_message(sender, text))
    }

    pub fn group_context(&self, group: &str, sender: &str, text: &str) -> PluginContext {
        self.context_for(&group_message(group, sender, text))
    }

    /// Context for a message whose text must parse as a command.
    pub fn context_for(&self, msg: &WebMessage) -> PluginContext {
        let event = InboundEvent::from_message(msg).unwrap();
        let command = match parse_command(&event.raw_text) {
            Classified::Command(command) => command,
            Classified::Text(text) => panic!("not a command: {:?}", text),
        };
        PluginContext::new(self.state.clone(), event, command)
    }
}

fn write_file(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, body).unwrap();
}
