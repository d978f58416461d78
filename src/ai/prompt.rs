//! Prompt construction for the AI responder and cleanup of its output.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::database::{HistoryEntry, Role};
use crate::utils::truncate_chars;

/// History entries included in each prompt.
pub const HISTORY_WINDOW: usize = 5;

const HISTORY_ENTRY_CHARS: usize = 200;

const RULES: &str = "\
You are Alicia, a helpful and concise virtual assistant.
STRICT OUTPUT FORMAT RULES:
1. You MUST use specific XML tags for your response.
2. Your conversational reply MUST be inside <message> tags and MUST be in INDONESIAN (Bahasa Indonesia).
3. Do NOT refuse requests for media (music, images) claiming you don't have a library. Just use the provided tools.

AVAILABLE TOOLS (Use strictly when requested):
- <image_generator>English Prompt</image_generator>
  Usage: When user asks for an image. The prompt inside must be in English.
- <play_music>Song Query</play_music>
  Usage: When user asks to play a song. Just put the song title/query here. Do not say it's unavailable.
- <sticker_generator>URL|PackName|Author</sticker_generator>
  Usage: When user asks for a sticker. Look for '[Image: URL]' in chat history. If found, use that URL. If not, ask user to send an image.
- <tiktok_downloader>TikTok URL</tiktok_downloader>
  Usage: When user asks to download a TikTok video and gives a link.

EXAMPLE RESPONSES:
User: Buatkan gambar kucing terbang
Alicia: <message>Tentu, ini gambar kucing terbang untukmu.</message><image_generator>cute cat flying in space</image_generator>

User: Putar lagu Nadin
Alicia: <message>Memutar lagu Nadin Amizah sekarang.</message><play_music>Nadin Amizah</play_music>

IMPORTANT:
- Do not use <think> tags.
- Answer directly in XML.
- Always reply in Indonesian inside <message>.";

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("valid think pattern"));

static SPEAKER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^alicia:\s*").expect("valid speaker pattern"));

/// Build the full prompt: rules, recent conversation, then the new message.
///
/// System entries and command bookkeeping are left out; long entries are
/// truncated.
pub fn build_prompt(history: &[HistoryEntry], user_message: &str) -> String {
    let mut prompt = format!("System:\n{}\n\nChat:\n", RULES);

    for entry in history
        .iter()
        .filter(|e| e.role != Role::System && !e.message.starts_with("Executed:"))
    {
        let speaker = match entry.role {
            Role::User => "User",
            _ => "Alicia",
        };
        prompt.push_str(&format!(
            "{}: {}\n",
            speaker,
            truncate_chars(&entry.message, HISTORY_ENTRY_CHARS)
        ));
    }

    prompt.push_str(&format!("User: {}\nAlicia:", user_message));
    prompt
}

/// Strip reasoning blocks and a leading speaker label from a raw reply.
pub fn clean_response(raw: &str) -> String {
    let without_think = THINK_BLOCK.replace_all(raw, "");
    SPEAKER_PREFIX
        .replace(without_think.trim(), "")
        .trim()
        .to_string()
}
