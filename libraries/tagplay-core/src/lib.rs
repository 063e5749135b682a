//! Tagplay Core
//!
//! Platform-agnostic data model, wire formats and peripheral traits for a
//! tag-activated audio player: a card placed on the reader selects a
//! folder of tracks and a play mode, buttons drive playback and an admin
//! menu, and persistent storage keeps settings and audiobook progress.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `FolderSetting`, `PlayMode`, `ModifierCard`
//! - **Tag Codec**: the 16-byte tag payload (`Tag`, `TagContent`)
//! - **Stores**: `settings` and `progress` over `NonVolatile` storage
//! - **Peripheral Traits**: `AudioModule`, `TagReader`, `NonVolatile`,
//!   `ButtonPanel`, `Clock`, `PowerControl`
//! - **Error Handling**: unified `TagplayError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tagplay_core::{FolderSetting, PlayMode, Tag, TagContent};
//!
//! let content = TagContent::Folder(FolderSetting::new(5, PlayMode::TracksInFolder));
//! let bytes = Tag::new(&content).encode();
//!
//! let tag = Tag::decode(&bytes);
//! assert!(tag.is_known());
//! assert_eq!(tag.content(), content);
//! ```

#![forbid(unsafe_code)]

pub mod announcements;
pub mod error;
pub mod progress;
pub mod settings;
pub mod tag;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use announcements::Announcements;
pub use error::{ErrorClass, Result, TagplayError};
pub use settings::{AdminLock, LoadedSettings, LockSymbol, Settings, SettingsSource};
pub use tag::{Tag, TagContent};
pub use traits::{AudioModule, ButtonPanel, Clock, NonVolatile, PowerControl, TagReader};
pub use types::{
    AudioEvent, Button, CardId, FolderSetting, ModifierCard, ModifierKind, PlayMode, RawSetting,
    TrackRange,
};
