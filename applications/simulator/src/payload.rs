//! Tag payload and settings inspection

use crate::error::{Result, SimError};
use serde::Serialize;
use tagplay_core::settings;
use tagplay_core::tag::{TAG_COOKIE, TAG_FORMAT_VERSION, TAG_LEN};
use tagplay_core::{NonVolatile, RawSetting, Settings, Tag, TagContent, TagplayError};

/// Hex payload of a provisioned tag carrying `raw`
pub fn encode_tag(raw: RawSetting) -> String {
    let tag = Tag {
        cookie: TAG_COOKIE,
        version: TAG_FORMAT_VERSION,
        setting: raw,
    };
    hex::encode(tag.encode())
}

/// Human-readable view of a payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedTag {
    pub known: bool,
    pub cookie: String,
    pub version: u8,
    pub raw: RawSetting,
    /// Only set for tags carrying the cookie
    pub content: Option<TagContent>,
}

/// Decode a hex payload (whitespace and a `0x` prefix are ignored)
pub fn decode_tag(text: &str) -> Result<DecodedTag> {
    let cleaned: String = text.split_whitespace().collect();
    let cleaned = cleaned.strip_prefix("0x").unwrap_or(&cleaned);
    let bytes = hex::decode(cleaned)?;
    if bytes.len() > TAG_LEN {
        return Err(SimError::Payload(format!(
            "{} bytes, a tag holds {}",
            bytes.len(),
            TAG_LEN
        )));
    }

    let tag = Tag::decode(&bytes);
    Ok(DecodedTag {
        known: tag.is_known(),
        cookie: format!("{:#010x}", tag.cookie),
        version: tag.version,
        raw: tag.setting,
        content: tag.is_known().then(|| tag.content()),
    })
}

/// Settings as the player would load them
#[derive(Debug, Clone, Serialize)]
pub struct SettingsReport {
    pub source: String,
    pub persistable: bool,
    pub settings: Settings,
}

/// EEPROM image viewed as player storage
pub struct ImageStorage<'a>(pub &'a mut [u8]);

impl NonVolatile for ImageStorage<'_> {
    fn capacity(&self) -> usize {
        self.0.len()
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> tagplay_core::Result<()> {
        let src = self
            .0
            .get(offset..offset + buf.len())
            .ok_or_else(|| TagplayError::storage("read past end of image"))?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> tagplay_core::Result<()> {
        let dst = self
            .0
            .get_mut(offset..offset + data.len())
            .ok_or_else(|| TagplayError::storage("write past end of image"))?;
        dst.copy_from_slice(data);
        Ok(())
    }
}

/// Load settings from `image`, migrating or resetting it in place
pub fn inspect_settings(image: &mut [u8]) -> SettingsReport {
    let loaded = settings::load(&mut ImageStorage(image));
    SettingsReport {
        source: format!("{:?}", loaded.source),
        persistable: loaded.persistable(),
        settings: loaded.settings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagplay_core::{FolderSetting, ModifierCard, PlayMode};

    #[test]
    fn encode_matches_layout() {
        assert_eq!(
            encode_tag(RawSetting::new(5, 2, 0, 0)),
            concat!("1337b347", "02", "05020000", "00000000000000")
        );
    }

    #[test]
    fn decode_known_folder_tag() {
        let decoded = decode_tag("0x1337b347 02 05 02 00 00").unwrap();
        assert!(decoded.known);
        assert_eq!(decoded.cookie, "0x1337b347");
        assert_eq!(
            decoded.content,
            Some(TagContent::Folder(FolderSetting::new(5, PlayMode::TracksInFolder)))
        );
    }

    #[test]
    fn decode_modifier_tag() {
        let decoded = decode_tag(&encode_tag(RawSetting::new(0, 1, 15, 0))).unwrap();
        assert_eq!(
            decoded.content,
            Some(TagContent::Modifier(ModifierCard::SleepTimer { minutes: 15 }))
        );
    }

    #[test]
    fn foreign_tag_has_no_content() {
        let decoded = decode_tag("deadbeef").unwrap();
        assert!(!decoded.known);
        assert_eq!(decoded.content, None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(decode_tag("zz"), Err(SimError::Hex(_))));
        assert!(matches!(
            decode_tag(&"00".repeat(17)),
            Err(SimError::Payload(_))
        ));
    }

    #[test]
    fn blank_image_gets_factory_defaults() {
        let mut image = vec![0xff; 256];
        let report = inspect_settings(&mut image);
        assert_eq!(report.source, "FactoryDefaults");
        assert!(report.persistable);
        assert_eq!(report.settings, Settings::default());
    }

    #[test]
    fn tiny_image_is_volatile() {
        let mut image = vec![0xff; 16];
        let report = inspect_settings(&mut image);
        assert!(!report.persistable);
    }
}
