//! Property tests for the tag payload codec

use proptest::prelude::*;
use tagplay_core::tag::{TAG_COOKIE, TAG_FORMAT_VERSION};
use tagplay_core::{FolderSetting, ModifierCard, PlayMode, Tag, TagContent, TrackRange};

// ===== Helpers =====

fn arbitrary_range() -> impl Strategy<Value = TrackRange> {
    (1u8..=255, 0u8..=255).prop_filter_map("valid range", |(from, extra)| {
        TrackRange::new(from, from.saturating_add(extra))
    })
}

fn arbitrary_mode() -> impl Strategy<Value = PlayMode> {
    prop_oneof![
        Just(PlayMode::RandomTrackInFolder),
        Just(PlayMode::TracksInFolder),
        Just(PlayMode::RandomsInFolder),
        (1u8..=255).prop_map(|track| PlayMode::TrackInFolder { track }),
        Just(PlayMode::AudioBook),
        arbitrary_range().prop_map(PlayMode::FromToRandomTrack),
        arbitrary_range().prop_map(PlayMode::FromToAllTracks),
        arbitrary_range().prop_map(PlayMode::FromToRandomTracks),
    ]
}

fn arbitrary_folder_setting() -> impl Strategy<Value = FolderSetting> {
    (1u8..=99, arbitrary_mode()).prop_map(|(folder, mode)| FolderSetting::new(folder, mode))
}

// ===== Property Tests =====

proptest! {
    /// Property: folder, mode and both parameter bytes survive encode/decode
    #[test]
    fn folder_setting_round_trip(setting in arbitrary_folder_setting()) {
        let bytes = Tag::new(&TagContent::Folder(setting)).encode();
        let tag = Tag::decode(&bytes);

        prop_assert!(tag.is_known());
        prop_assert_eq!(tag.version, TAG_FORMAT_VERSION);
        prop_assert_eq!(tag.setting, setting.to_raw());
        prop_assert_eq!(tag.content(), TagContent::Folder(setting));
    }

    /// Property: reserved bytes are always zero
    #[test]
    fn reserved_bytes_are_zero(setting in arbitrary_folder_setting()) {
        let bytes = Tag::new(&TagContent::Folder(setting)).encode();
        prop_assert!(bytes[9..].iter().all(|b| *b == 0));
    }

    /// Property: decode never panics and only a matching cookie is known
    #[test]
    fn decode_accepts_any_bytes(bytes in prop::collection::vec(any::<u8>(), 0..32)) {
        let tag = Tag::decode(&bytes);
        let cookie_matches = bytes.len() >= 4
            && u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) == TAG_COOKIE;
        prop_assert_eq!(tag.is_known(), cookie_matches);
    }

    /// Property: sleep timer minutes survive the round trip
    #[test]
    fn sleep_timer_round_trip(minutes in any::<u8>()) {
        let content = TagContent::Modifier(ModifierCard::SleepTimer { minutes });
        let tag = Tag::decode(&Tag::new(&content).encode());
        prop_assert_eq!(tag.content(), content);
    }
}

#[test]
fn every_modifier_round_trips() {
    let cards = [
        ModifierCard::SleepTimer { minutes: 5 },
        ModifierCard::FreezeDance,
        ModifierCard::Locked,
        ModifierCard::ToddlerMode,
        ModifierCard::KindergartenMode,
        ModifierCard::RepeatSingle,
        ModifierCard::Feedback,
    ];
    for card in cards {
        let content = TagContent::Modifier(card);
        let tag = Tag::decode(&Tag::new(&content).encode());
        assert_eq!(tag.setting.folder, 0);
        assert_eq!(tag.content(), content);
    }
}

#[test]
fn admin_tag_round_trips() {
    let tag = Tag::decode(&Tag::new(&TagContent::AdminMenu).encode());
    assert_eq!(tag.content(), TagContent::AdminMenu);
}
