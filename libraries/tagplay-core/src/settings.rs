//! Device settings store
//!
//! Settings live in persistent storage at a fixed offset, guarded by the
//! same magic cookie as tags plus a record version. Loading never fails:
//! a missing or foreign record is replaced by factory defaults, an older
//! version is migrated in place, and storage too small for the record
//! yields defaults that stay in memory only.
//!
//! Record layout (little-endian, 36 bytes):
//! ```text
//! cookie:u32 version:u8 max:u8 min:u8 initial:u8 eq:u8 locked:u8
//! standby_minutes:u32 invert:u8 shortcuts:4x[folder mode a b]
//! admin_lock:u8 lock_sequence:4xu8
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TagplayError};
use crate::tag::TAG_COOKIE;
use crate::traits::NonVolatile;
use crate::types::{FolderSetting, RawSetting};

/// Storage offset of the settings record
pub const SETTINGS_OFFSET: usize = 100;

/// Current record version
pub const SETTINGS_VERSION: u8 = 2;

/// Encoded record length
pub const SETTINGS_LEN: usize = 36;

/// Hard ceiling for any configured volume
pub const VOLUME_CEILING: u8 = 30;

/// Number of shortcut slots
pub const SHORTCUT_SLOTS: usize = 4;

/// One symbol of the admin lock sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockSymbol {
    Pause = 1,
    Up = 2,
    Down = 3,
}

impl LockSymbol {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Pause),
            2 => Some(Self::Up),
            3 => Some(Self::Down),
            _ => None,
        }
    }
}

/// Sequence written by factory reset and by the version-1 migration
pub const DEFAULT_LOCK_SEQUENCE: [LockSymbol; 4] = [LockSymbol::Pause; 4];

/// Access gate in front of the admin menu
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminLock {
    /// Always allowed
    #[default]
    None,
    /// Only the admin tag opens the menu
    Card,
    /// A 4-symbol button sequence must be entered
    Sequence,
    /// A small arithmetic challenge must be solved
    Calc,
}

impl AdminLock {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Card => 1,
            Self::Sequence => 2,
            Self::Calc => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Card),
            2 => Some(Self::Sequence),
            3 => Some(Self::Calc),
            _ => None,
        }
    }
}

/// Persisted device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub version: u8,
    pub max_volume: u8,
    pub min_volume: u8,
    pub initial_volume: u8,
    /// Equalizer preset, 1-based
    pub eq: u8,
    pub locked: bool,
    /// Standby delay in minutes, 0 disables standby
    pub standby_minutes: u32,
    pub invert_volume_buttons: bool,
    pub shortcuts: [Option<FolderSetting>; SHORTCUT_SLOTS],
    pub admin_lock: AdminLock,
    pub lock_sequence: [LockSymbol; 4],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            max_volume: 25,
            min_volume: 5,
            initial_volume: 15,
            eq: 1,
            locked: false,
            standby_minutes: 0,
            invert_volume_buttons: true,
            shortcuts: [None; SHORTCUT_SLOTS],
            admin_lock: AdminLock::None,
            lock_sequence: DEFAULT_LOCK_SEQUENCE,
        }
    }
}

/// Where the in-memory settings came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    /// Current-version record read as-is
    Stored,
    /// Older record upgraded and written back
    Migrated { from: u8 },
    /// Missing/foreign record replaced by defaults and written back
    FactoryDefaults,
    /// Storage cannot hold the record; defaults are kept in memory only
    VolatileDefaults,
}

/// Result of `load`
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub source: SettingsSource,
}

impl LoadedSettings {
    /// Whether later saves can reach persistent storage
    pub fn persistable(&self) -> bool {
        self.source != SettingsSource::VolatileDefaults
    }
}

impl Settings {
    /// Encode into the fixed record layout
    pub fn encode(&self) -> [u8; SETTINGS_LEN] {
        let mut buf = [0u8; SETTINGS_LEN];
        buf[0..4].copy_from_slice(&TAG_COOKIE.to_le_bytes());
        buf[4] = self.version;
        buf[5] = self.max_volume;
        buf[6] = self.min_volume;
        buf[7] = self.initial_volume;
        buf[8] = self.eq;
        buf[9] = u8::from(self.locked);
        buf[10..14].copy_from_slice(&self.standby_minutes.to_le_bytes());
        buf[14] = u8::from(self.invert_volume_buttons);
        for (slot, shortcut) in self.shortcuts.iter().enumerate() {
            let raw = shortcut.map(|s| s.to_raw()).unwrap_or_default();
            let at = 15 + slot * 4;
            buf[at..at + 4].copy_from_slice(&raw.to_bytes());
        }
        buf[31] = self.admin_lock.code();
        for (i, symbol) in self.lock_sequence.iter().enumerate() {
            buf[32 + i] = *symbol as u8;
        }
        buf
    }

    /// Decode a record
    ///
    /// Returns `Ok(None)` when the cookie does not match and
    /// `UnsupportedVersion` for versions newer than this build. Version-1
    /// records are migrated; their lock fields are ignored.
    pub fn decode(buf: &[u8; SETTINGS_LEN]) -> Result<Option<Self>> {
        let cookie = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if cookie != TAG_COOKIE {
            return Ok(None);
        }

        let version = buf[4];
        if version == 0 || version > SETTINGS_VERSION {
            return Err(TagplayError::UnsupportedVersion(version));
        }

        let mut shortcuts = [None; SHORTCUT_SLOTS];
        for (slot, shortcut) in shortcuts.iter_mut().enumerate() {
            let at = 15 + slot * 4;
            let raw = RawSetting::from_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
            *shortcut = FolderSetting::from_raw(raw);
        }

        let mut settings = Self {
            version,
            max_volume: buf[5],
            min_volume: buf[6],
            initial_volume: buf[7],
            eq: buf[8],
            locked: buf[9] != 0,
            standby_minutes: u32::from_le_bytes([buf[10], buf[11], buf[12], buf[13]]),
            invert_volume_buttons: buf[14] != 0,
            shortcuts,
            admin_lock: AdminLock::from_code(buf[31]).unwrap_or_default(),
            lock_sequence: DEFAULT_LOCK_SEQUENCE,
        };

        if version >= 2 {
            for (i, symbol) in settings.lock_sequence.iter_mut().enumerate() {
                *symbol = LockSymbol::from_byte(buf[32 + i]).unwrap_or(LockSymbol::Pause);
            }
        }

        settings.migrate();
        settings.sanitize();
        Ok(Some(settings))
    }

    /// Upgrade an older record to the current version
    ///
    /// Returns the version the record had before migration.
    pub fn migrate(&mut self) -> u8 {
        let from = self.version;
        if from == 1 {
            self.admin_lock = AdminLock::None;
            self.lock_sequence = DEFAULT_LOCK_SEQUENCE;
            self.version = 2;
        }
        from
    }

    /// Force volume bounds into a usable shape
    pub fn sanitize(&mut self) {
        self.max_volume = self.max_volume.clamp(2, VOLUME_CEILING);
        self.min_volume = self.min_volume.clamp(1, self.max_volume - 1);
        self.initial_volume = self
            .initial_volume
            .clamp(self.min_volume, self.max_volume);
        self.eq = self.eq.clamp(1, 6);
    }

    /// Replace every field by its factory default
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Load settings, applying factory reset or migration as needed
///
/// Storage failures are logged and answered with volatile defaults; this
/// function never fails.
pub fn load(storage: &mut dyn NonVolatile) -> LoadedSettings {
    let required = SETTINGS_OFFSET + SETTINGS_LEN;
    if storage.capacity() < required {
        warn!(
            required,
            available = storage.capacity(),
            "Storage too small for settings, using in-memory defaults"
        );
        return LoadedSettings {
            settings: Settings::default(),
            source: SettingsSource::VolatileDefaults,
        };
    }

    let mut buf = [0u8; SETTINGS_LEN];
    if let Err(e) = storage.read(SETTINGS_OFFSET, &mut buf) {
        warn!("Failed to read settings: {}", e);
        return LoadedSettings {
            settings: Settings::default(),
            source: SettingsSource::VolatileDefaults,
        };
    }

    let version = buf[4];
    let decoded = match Settings::decode(&buf) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("Discarding settings record: {}", e);
            None
        }
    };

    let (settings, source) = match decoded {
        Some(settings) if version < SETTINGS_VERSION => {
            info!(from = version, to = SETTINGS_VERSION, "Migrated settings");
            (settings, SettingsSource::Migrated { from: version })
        }
        Some(settings) => (settings, SettingsSource::Stored),
        None => {
            info!("No valid settings found, restoring factory defaults");
            (Settings::default(), SettingsSource::FactoryDefaults)
        }
    };

    if source != SettingsSource::Stored {
        if let Err(e) = save(storage, &settings) {
            warn!("Failed to write settings: {}", e);
        }
    }

    LoadedSettings { settings, source }
}

/// Persist settings
pub fn save(storage: &mut dyn NonVolatile, settings: &Settings) -> Result<()> {
    let required = SETTINGS_OFFSET + SETTINGS_LEN;
    if storage.capacity() < required {
        return Err(TagplayError::StorageTooSmall {
            required,
            available: storage.capacity(),
        });
    }
    storage.write(SETTINGS_OFFSET, &settings.encode())
}
