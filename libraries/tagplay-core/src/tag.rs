//! Tag payload codec
//!
//! Payload format (16 bytes, one reader data block):
//! - cookie: u32 BE `0x1337b347`
//! - version: u8
//! - folder: u8
//! - mode: u8
//! - param-a: u8 (track / from-track / sleep minutes)
//! - param-b: u8 (to-track)
//! - reserved: 7 bytes, zero
//!
//! Decoding never fails. A tag is "known" only when the cookie matches;
//! callers gate on `Tag::is_known` and on `Tag::content`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::traits::TagReader;
use crate::types::{CardId, FolderSetting, ModifierCard, RawSetting};

/// Magic cookie identifying a provisioned tag
pub const TAG_COOKIE: u32 = 0x1337_b347;

/// Payload format version written by this build
pub const TAG_FORMAT_VERSION: u8 = 2;

/// Encoded payload length
pub const TAG_LEN: usize = 16;

/// Reader block holding the payload (sector 1, block 0)
pub const DATA_BLOCK: u8 = 4;

/// Mode byte of the admin tag
pub const ADMIN_TAG_MODE: u8 = 255;

/// What a known tag asks the player to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TagContent {
    /// Play a folder
    Folder(FolderSetting),
    /// Toggle a behavior modifier
    Modifier(ModifierCard),
    /// Enter the admin menu, bypassing the lock gate
    AdminMenu,
    /// Cookie is valid but the payload does not map to anything playable
    Unassigned,
}

impl TagContent {
    /// Raw bytes stored for this content
    pub fn to_raw(&self) -> RawSetting {
        match self {
            Self::Folder(setting) => setting.to_raw(),
            Self::Modifier(card) => RawSetting::new(0, card.kind().code(), card.param(), 0),
            Self::AdminMenu => RawSetting::new(0, ADMIN_TAG_MODE, 0, 0),
            Self::Unassigned => RawSetting::default(),
        }
    }

    /// Interpret raw bytes
    pub fn from_raw(raw: RawSetting) -> Self {
        if raw.folder != 0 {
            return FolderSetting::from_raw(raw).map_or(Self::Unassigned, Self::Folder);
        }
        match raw.mode {
            0 | ADMIN_TAG_MODE => Self::AdminMenu,
            code => ModifierCard::from_raw(code, raw.param_a).map_or(Self::Unassigned, Self::Modifier),
        }
    }
}

/// Decoded tag payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub cookie: u32,
    pub version: u8,
    pub setting: RawSetting,
}

impl Tag {
    /// A provisioned tag carrying `content`
    pub fn new(content: &TagContent) -> Self {
        Self {
            cookie: TAG_COOKIE,
            version: TAG_FORMAT_VERSION,
            setting: content.to_raw(),
        }
    }

    /// Whether the cookie identifies a provisioned tag
    pub fn is_known(&self) -> bool {
        self.cookie == TAG_COOKIE
    }

    /// Interpret the embedded setting (meaningful only for known tags)
    pub fn content(&self) -> TagContent {
        TagContent::from_raw(self.setting)
    }

    /// Encode into the fixed 16-byte layout
    pub fn encode(&self) -> [u8; TAG_LEN] {
        let mut buf = [0u8; TAG_LEN];
        buf[0..4].copy_from_slice(&self.cookie.to_be_bytes());
        buf[4] = self.version;
        buf[5..9].copy_from_slice(&self.setting.to_bytes());
        buf
    }

    /// Decode the fixed layout; missing bytes read as zero
    pub fn decode(bytes: &[u8]) -> Self {
        let mut buf = [0u8; TAG_LEN];
        let n = bytes.len().min(TAG_LEN);
        buf[..n].copy_from_slice(&bytes[..n]);

        Self {
            cookie: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            version: buf[4],
            setting: RawSetting::from_bytes([buf[5], buf[6], buf[7], buf[8]]),
        }
    }
}

/// Authenticate and read the payload block of `card`
pub fn read_tag(reader: &mut dyn TagReader, card: &CardId) -> Result<Tag> {
    reader.authenticate(card)?;
    let block = reader.read_block(DATA_BLOCK)?;
    let tag = Tag::decode(&block);
    debug!(card = %card, known = tag.is_known(), "Read tag {:?}", tag.setting);
    Ok(tag)
}

/// Authenticate and write `tag` to the payload block of `card`
pub fn write_tag(reader: &mut dyn TagReader, card: &CardId, tag: &Tag) -> Result<()> {
    reader.authenticate(card)?;
    reader.write_block(DATA_BLOCK, &tag.encode())?;
    debug!(card = %card, "Wrote tag {:?}", tag.setting);
    Ok(())
}
