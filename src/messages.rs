//! Commit message bank.
//!
//! The bank file holds a list of names and a list of message templates.
//! Each template's `{name}` placeholder is filled once, at load time.

use std::path::Path;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;

/// Placeholder substituted with a random name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Template used when the bank cannot be loaded. Left unsubstituted.
pub const FALLBACK_MESSAGE: &str = "Update {name}";

/// On-disk shape of the bank, in JSON or TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct BankFile {
    pub names: Vec<String>,
    pub messages: Vec<String>,
}

/// The messages historical commits are drawn from. Never empty.
#[derive(Debug, Clone)]
pub struct MessageBank {
    messages: Vec<String>,
}

impl MessageBank {
    /// Load the bank at `path`, falling back to [`FALLBACK_MESSAGE`] on any
    /// error. The failure is logged here and nowhere else.
    pub fn load_or_default<R: Rng + ?Sized>(path: &Path, rng: &mut R) -> Self {
        match Self::load(path, rng) {
            Ok(bank) => bank,
            Err(e) => {
                tracing::error!("failed to load commit messages: {e}");
                Self::fallback()
            }
        }
    }

    /// Load and fill in the bank at `path`.
    pub fn load<R: Rng + ?Sized>(path: &Path, rng: &mut R) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

        let file: BankFile = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Self::from_file(file, rng)
    }

    /// Substitute a random name into every template.
    pub fn from_file<R: Rng + ?Sized>(file: BankFile, rng: &mut R) -> Result<Self, LoadError> {
        if file.messages.is_empty() {
            return Err(LoadError::Empty("messages"));
        }
        if file.names.is_empty() {
            return Err(LoadError::Empty("names"));
        }

        let messages = file
            .messages
            .iter()
            .map(|template| {
                let name = file.names.choose(rng).map(String::as_str).unwrap_or_default();
                template.replace(NAME_PLACEHOLDER, name)
            })
            .collect();
        Ok(Self { messages })
    }

    pub fn fallback() -> Self {
        Self {
            messages: vec![FALLBACK_MESSAGE.to_string()],
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Pick a message uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.messages
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(FALLBACK_MESSAGE)
    }
}

/// Errors loading a message bank.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON message bank")]
    Json(#[from] serde_json::Error),

    #[error("malformed TOML message bank")]
    Toml(#[from] toml::de::Error),

    #[error("message bank has no {0}")]
    Empty(&'static str),
}
