//! AI Trigger Parser.
//!
//! The AI responder answers in a small tagged-text protocol:
//!
//! ```text
//! <message>Tentu!</message><image_generator>cute cat</image_generator>
//! ```
//!
//! `<message>` carries the reply; the other tags request side effects.
//! Malformed or unknown tags never fail the parse, they simply stay part of
//! the reply text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::i18n::get_text;

const DEFAULT_STICKER_PACK: &str = "NextA Bot";
const DEFAULT_STICKER_AUTHOR: &str = "Sticker";

fn tag_pattern(name: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{0}>(.*?)</{0}>", name)).expect("valid tag pattern")
}

static MESSAGE_TAG: Lazy<Regex> = Lazy::new(|| tag_pattern("message"));

/// Side-effect tags, in the order their actions run.
static ACTION_TAGS: Lazy<[(ActionTag, Regex); 4]> = Lazy::new(|| {
    ActionTag::ALL.map(|tag| (tag, tag_pattern(tag.name())))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionTag {
    ImageGenerator,
    PlayMusic,
    StickerGenerator,
    TiktokDownloader,
}

impl ActionTag {
    const ALL: [ActionTag; 4] = [
        Self::ImageGenerator,
        Self::PlayMusic,
        Self::StickerGenerator,
        Self::TiktokDownloader,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::ImageGenerator => "image_generator",
            Self::PlayMusic => "play_music",
            Self::StickerGenerator => "sticker_generator",
            Self::TiktokDownloader => "tiktok_downloader",
        }
    }

    fn action(self, content: String) -> TriggerAction {
        match self {
            Self::ImageGenerator => TriggerAction::GenerateImage { prompt: content },
            Self::PlayMusic => TriggerAction::PlayMusic { query: content },
            Self::StickerGenerator => TriggerAction::MakeSticker(StickerParams::parse(&content)),
            Self::TiktokDownloader => TriggerAction::DownloadTiktok { url: content },
        }
    }
}

/// Sticker request: `URL|Pack|Author`, every part optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickerParams {
    /// Source image; only set when the first part starts with `http`.
    pub url: Option<String>,
    pub pack: String,
    pub author: String,
}

impl StickerParams {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split('|').map(str::trim).peekable();

        let url = parts
            .next_if(|first| first.starts_with("http"))
            .map(str::to_string);

        let mut named = |default: &str| {
            parts
                .next()
                .filter(|p| !p.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let pack = named(DEFAULT_STICKER_PACK);
        let author = named(DEFAULT_STICKER_AUTHOR);

        Self { url, pack, author }
    }
}

/// One side effect requested by the AI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerAction {
    GenerateImage { prompt: String },
    PlayMusic { query: String },
    MakeSticker(StickerParams),
    DownloadTiktok { url: String },
}

/// Reply text plus the actions to run after it, in execution order.
/// At most one action of each kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiTriggerResult {
    pub reply_text: String,
    pub actions: Vec<TriggerAction>,
}

/// Parse one AI response. Placeholder replies are taken from `locale`.
pub fn parse_triggers(response: &str, locale: &str) -> AiTriggerResult {
    let tags = &*ACTION_TAGS;

    let mut reply_text = match MESSAGE_TAG.captures(response) {
        Some(caps) => caps[1].trim().to_string(),
        None if !tags.iter().any(|(_, re)| re.is_match(response)) => response.to_string(),
        None => tags
            .iter()
            .fold(response.to_string(), |rest, (_, re)| re.replace(&rest, "").into_owned())
            .trim()
            .to_string(),
    };

    let actions: Vec<TriggerAction> = tags
        .iter()
        .filter_map(|(tag, re)| {
            let content = re.captures(response)?[1].trim().to_string();
            (!content.is_empty()).then(|| tag.action(content))
        })
        .collect();

    if reply_text.trim().is_empty() {
        let key = if actions.is_empty() { "ai.not_understood" } else { "ai.processing" };
        reply_text = get_text(locale, key);
    }

    AiTriggerResult { reply_text, actions }
}
