//! Announcement index table
//!
//! Prompts, confirmations and numbers are pre-recorded audio files. The
//! player only knows their indices, injected through this table so a
//! different sound pack can renumber them.
//!
//! Menu prompts follow the "prompt + offset" convention: the prompt itself
//! is played at `index`, and option `n` of that menu at `index + n`.
//! Plain numbers (folders, tracks, volumes) are announced at their own
//! value.

use serde::{Deserialize, Serialize};

/// Announcement and advert indices used by the control logic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Announcements {
    /// "Oh, a new tag"
    pub new_tag: u16,
    pub ok: u16,
    pub failed: u16,
    /// "Place a tag on the reader"
    pub place_tag: u16,
    pub aborted: u16,

    pub folder_prompt: u16,
    pub mode_menu: u16,
    pub single_track_prompt: u16,
    pub from_track_prompt: u16,
    pub to_track_prompt: u16,

    pub admin_menu: u16,
    pub eq_menu: u16,
    pub max_volume_prompt: u16,
    pub min_volume_prompt: u16,
    pub initial_volume_prompt: u16,
    pub invert_menu: u16,
    pub batch_intro: u16,
    pub shortcut_menu: u16,
    pub timer_menu: u16,
    pub modifier_menu: u16,
    pub lock_menu: u16,
    pub enter_sequence: u16,
    pub calc_intro: u16,
    pub calc_plus: u16,
    pub calc_minus: u16,
    pub reset_done: u16,

    // adverts
    pub modifier_on: u16,
    pub modifier_off: u16,
    pub freeze_intro: u16,
    pub freeze_stop: u16,
}

impl Default for Announcements {
    fn default() -> Self {
        Self {
            new_tag: 300,
            ok: 400,
            failed: 401,
            place_tag: 800,
            aborted: 802,

            folder_prompt: 301,
            mode_menu: 310,
            single_track_prompt: 320,
            from_track_prompt: 321,
            to_track_prompt: 322,

            admin_menu: 900,
            eq_menu: 920,
            max_volume_prompt: 930,
            min_volume_prompt: 931,
            initial_volume_prompt: 932,
            invert_menu: 933,
            batch_intro: 936,
            shortcut_menu: 940,
            timer_menu: 960,
            modifier_menu: 970,
            lock_menu: 980,
            enter_sequence: 991,
            calc_intro: 992,
            calc_plus: 993,
            calc_minus: 994,
            reset_done: 999,

            modifier_on: 260,
            modifier_off: 261,
            freeze_intro: 300,
            freeze_stop: 301,
        }
    }
}
