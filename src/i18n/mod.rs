//! Internationalization (i18n) module.
//!
//! User-visible strings are embedded JSON (`id.json`, `en.json`) keyed by
//! dot-separated paths such as `"ai.processing"`.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;

/// Translation store: LangCode -> nested key tree.
static TRANSLATIONS: OnceLock<HashMap<&'static str, Value>> = OnceLock::new();

/// Used when a key is missing in the requested language.
const FALLBACK_LANG: &str = "id";

fn translations() -> &'static HashMap<&'static str, Value> {
    TRANSLATIONS.get_or_init(|| {
        let mut map = HashMap::new();

        for (lang, raw) in [("id", include_str!("id.json")), ("en", include_str!("en.json"))] {
            match serde_json::from_str(raw) {
                Ok(value) => {
                    map.insert(lang, value);
                }
                Err(e) => tracing::error!("Invalid {} translations: {}", lang, e),
            }
        }

        map
    })
}

/// Load translations eagerly so a malformed file is reported at startup.
pub fn init() {
    let languages = translations().len();
    tracing::debug!("Loaded translations for {} languages", languages);
}

/// Get text for a key in a specific language.
///
/// Falls back to the default language, then to the key itself.
pub fn get_text(lang: &str, key: &str) -> String {
    let store = translations();

    [lang, FALLBACK_LANG]
        .iter()
        .filter_map(|l| store.get(l))
        .find_map(|tree| resolve_key(tree, key))
        .unwrap_or_else(|| key.to_string())
}

/// `get_text` with `{name}` placeholders substituted.
pub fn format_text(lang: &str, key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(get_text(lang, key), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

fn resolve_key(val: &Value, key: &str) -> Option<String> {
    key.split('.')
        .try_fold(val, |current, part| current.get(part))?
        .as_str()
        .map(str::to_string)
}
