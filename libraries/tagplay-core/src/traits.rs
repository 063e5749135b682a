//! Peripheral traits for Tagplay
//!
//! The control logic never talks to hardware directly. Each collaborator
//! (audio module, tag reader, persistent storage, buttons, clock, power)
//! is reached through one of these traits so the same logic runs on the
//! device, in the simulator and in tests.

use crate::error::Result;
use crate::types::{AudioEvent, Button, CardId};

/// Serial-attached audio playback module
///
/// Tracks are addressed as `(folder, track)`. Announcements come from a
/// dedicated announcement folder and replace whatever is playing; adverts
/// interrupt the current track and resume it afterwards.
pub trait AudioModule {
    /// Start playing `track` of `folder`
    fn play_folder_track(&mut self, folder: u8, track: u8);

    /// Play an announcement (menu prompt, number, confirmation)
    fn play_announcement(&mut self, index: u16);

    /// Play an advert over the current track
    fn play_advert(&mut self, index: u16);

    fn pause(&mut self);

    fn resume(&mut self);

    fn set_volume(&mut self, volume: u8);

    /// Select equalizer preset (0-based)
    fn set_eq(&mut self, eq: u8);

    /// Number of tracks stored in `folder`
    fn folder_track_count(&mut self, folder: u8) -> u16;

    /// Whether a track or announcement is currently playing
    fn is_busy(&mut self) -> bool;

    /// Drain one pending notification from the module
    ///
    /// Must be called regularly, including from blocking menu waits, so
    /// that track-finished notifications are never lost.
    fn poll_event(&mut self) -> Option<AudioEvent>;
}

/// RFID/NFC transceiver
pub trait TagReader {
    /// Return the serial of a newly presented card, if any
    fn poll_card(&mut self) -> Option<CardId>;

    /// Run the per-card authentication handshake
    ///
    /// # Errors
    /// Returns `TagplayError::Authentication` if the card rejects the key
    fn authenticate(&mut self, card: &CardId) -> Result<()>;

    /// Read one 16-byte data block
    fn read_block(&mut self, addr: u8) -> Result<[u8; 16]>;

    /// Write one 16-byte data block
    fn write_block(&mut self, addr: u8, data: &[u8; 16]) -> Result<()>;

    /// Release the card and stop the crypto session
    fn halt(&mut self) {}
}

/// Byte-addressed persistent storage (EEPROM-like)
pub trait NonVolatile {
    /// Total number of addressable bytes
    fn capacity(&self) -> usize;

    /// Fill `buf` starting at `offset`
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `offset`
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()>;
}

/// Debounced button peripheral, sampled once per tick
pub trait ButtonPanel {
    /// Sample all buttons
    fn read(&mut self, now_ms: u64);

    /// Whether the button is currently held down
    fn is_down(&self, button: Button) -> bool;

    /// Whether the button went up during the last sample
    fn was_released(&self, button: Button) -> bool;

    /// Whether the button has been held for at least `ms`
    fn held_for(&self, button: Button, ms: u64) -> bool;
}

/// Monotonic millisecond clock with a cooperative sleep
pub trait Clock {
    fn now_ms(&self) -> u64;

    /// Yield for `ms` milliseconds
    fn sleep_ms(&mut self, ms: u64);
}

/// Power switch used once the standby deadline passes
pub trait PowerControl {
    fn power_down(&mut self);
}
