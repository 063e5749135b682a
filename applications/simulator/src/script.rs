//! Scenario scripts
//!
//! A script names the cards that exist in the scenario and lists timed
//! stimuli. Cards without a payload are blank and trigger provisioning.
//!
//! ```toml
//! until_ms = 20000
//!
//! [[folders]]
//! folder = 3
//! tracks = 8
//!
//! [cards]
//! blue = { folder = 3, mode = 2 }
//! admin = { folder = 0, mode = 255 }
//! fresh = {}
//!
//! [[event]]
//! at = 100
//! action = "present"
//! card = "blue"
//!
//! [[event]]
//! at = 2000
//! action = "tap"
//! button = "pause"
//! ```

use crate::config::FolderSpec;
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tagplay_core::tag::{TAG_COOKIE, TAG_FORMAT_VERSION, TAG_LEN};
use tagplay_core::{Button, RawSetting, Tag};

/// A parsed scenario
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Stop time; defaults to one second after the last event
    #[serde(default)]
    pub until_ms: Option<u64>,

    /// Folders added to (or overriding) the configured ones
    #[serde(default)]
    pub folders: Vec<FolderSpec>,

    #[serde(default)]
    pub cards: BTreeMap<String, CardSpec>,

    #[serde(default, rename = "event")]
    pub events: Vec<Event>,
}

/// Raw tag content of a scripted card
///
/// Folder and mode are written verbatim, so modifier (folder 0) and admin
/// (folder 0, mode 255) tags can be described too.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CardSpec {
    pub folder: Option<u8>,
    pub mode: Option<u8>,
    #[serde(default)]
    pub a: u8,
    #[serde(default)]
    pub b: u8,
}

impl CardSpec {
    /// Payload stored on the card, `None` for a blank card
    pub fn payload(&self) -> Option<[u8; TAG_LEN]> {
        if self.folder.is_none() && self.mode.is_none() {
            return None;
        }
        let tag = Tag {
            cookie: TAG_COOKIE,
            version: TAG_FORMAT_VERSION,
            setting: RawSetting::new(
                self.folder.unwrap_or(0),
                self.mode.unwrap_or(0),
                self.a,
                self.b,
            ),
        };
        Some(tag.encode())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Event {
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Short press (100 ms)
    Tap { button: Button },
    /// Press held for `ms`
    Hold { button: Button, ms: u64 },
    /// All three buttons for 200 ms
    Chord,
    /// Place a named card on the reader
    Present { card: String },
    /// End the playing track now
    Finish,
}

/// Hold time of a tap
pub const TAP_MS: u64 = 100;

/// Hold time of a chord
pub const CHORD_MS: u64 = 200;

const TAIL_MS: u64 = 1_000;

impl Script {
    /// Parse a script from TOML text
    pub fn parse(text: &str) -> Result<Self> {
        let mut script: Script = toml::from_str(text)?;
        script.events.sort_by_key(|event| event.at);
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    fn validate(&self) -> Result<()> {
        for event in &self.events {
            match &event.action {
                Action::Present { card } if !self.cards.contains_key(card) => {
                    return Err(SimError::Script(format!(
                        "event at {} ms presents unknown card '{}'",
                        event.at, card
                    )));
                }
                Action::Hold { ms: 0, .. } => {
                    return Err(SimError::Script(format!(
                        "event at {} ms holds a button for 0 ms",
                        event.at
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Time at which the scenario ends
    pub fn end_ms(&self) -> u64 {
        self.until_ms.unwrap_or_else(|| {
            let last = self
                .events
                .iter()
                .map(|event| event.at + event.action.duration_ms())
                .max()
                .unwrap_or(0);
            last + TAIL_MS
        })
    }
}

impl Action {
    /// How long the stimulus lasts
    pub fn duration_ms(&self) -> u64 {
        match self {
            Self::Tap { .. } => TAP_MS,
            Self::Hold { ms, .. } => *ms,
            Self::Chord => CHORD_MS,
            Self::Present { .. } | Self::Finish => 0,
        }
    }
}
