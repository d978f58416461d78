//! Plugin manifest files.
//!
//! A plugin on disk is a TOML file binding command names to a built-in
//! handler:
//!
//! ```toml
//! handler = "ping"
//! commands = ["ping", "p"]   # or a single string
//! tag = "main"
//! help = "Check bot status"
//! ```
//!
//! Everything but `handler` falls back to the handler's defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use super::{Plugin, catalog};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid manifest {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{path}: unknown handler '{handler}'")]
    UnknownHandler { path: PathBuf, handler: String },

    #[error("{path}: no command names")]
    NoCommands { path: PathBuf },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommandNames {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginManifest {
    handler: String,
    commands: Option<CommandNames>,
    tag: Option<String>,
    help: Option<String>,
}

/// A loaded plugin: its command aliases and the handler they resolve to.
pub struct PluginDescriptor {
    /// Lowercased, non-empty, without duplicates.
    pub commands: Vec<String>,
    pub tag: String,
    pub help: String,
    pub handler: Arc<dyn Plugin>,
    /// Manifest the descriptor was loaded from.
    pub source: PathBuf,
}

impl PluginDescriptor {
    /// Primary command name, shown in menus.
    pub fn primary(&self) -> &str {
        self.commands.first().map(String::as_str).unwrap_or_default()
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("commands", &self.commands)
            .field("tag", &self.tag)
            .field("handler", &self.handler.name())
            .field("source", &self.source)
            .finish()
    }
}

/// Lowercase, trim, drop empties and duplicates, keep order.
fn normalize_commands(names: CommandNames) -> Vec<String> {
    let names = match names {
        CommandNames::One(name) => vec![name],
        CommandNames::Many(names) => names,
    };

    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Parse a manifest's text into a descriptor.
pub fn parse_manifest(path: &Path, raw: &str) -> Result<PluginDescriptor, ManifestError> {
    let manifest: PluginManifest = toml::from_str(raw).map_err(|source| ManifestError::Toml {
        path: path.to_path_buf(),
        source,
    })?;

    let handler = catalog::builtin(&manifest.handler).ok_or_else(|| ManifestError::UnknownHandler {
        path: path.to_path_buf(),
        handler: manifest.handler.clone(),
    })?;

    let commands = match manifest.commands {
        Some(names) => normalize_commands(names),
        None => handler.commands().iter().map(|c| c.to_string()).collect(),
    };
    if commands.is_empty() {
        return Err(ManifestError::NoCommands {
            path: path.to_path_buf(),
        });
    }

    Ok(PluginDescriptor {
        commands,
        tag: manifest.tag.unwrap_or_else(|| handler.tag().to_string()),
        help: manifest.help.unwrap_or_else(|| handler.help().to_string()),
        handler,
        source: path.to_path_buf(),
    })
}

/// Read and parse one manifest file.
pub fn load_manifest(path: &Path) -> Result<PluginDescriptor, ManifestError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(path, &raw)
}
