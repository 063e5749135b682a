//! Tagplay Playback
//!
//! Track selection for the tag-activated player. Given a `FolderSetting`
//! the engine decides which track plays first, what happens when a track
//! finishes and what "previous" means, per play mode.
//!
//! This crate provides:
//! - `PlaybackEngine`: select / advance / skip / rewind per play mode
//! - `ShuffleQueue`: Fisher-Yates permutation with wrap-around
//! - `StandbyTimer`: power-down deadline
//! - `Volume`: level bounded by the configured window
//!
//! Peripherals are borrowed per call through `EngineIo`, so the engine holds
//! no references and can be stored by value in the controller.
//!
//! # Example
//!
//! ```rust
//! use tagplay_playback::ShuffleQueue;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let mut queue = ShuffleQueue::build(1, 5, &mut rng);
//! assert!(queue.is_permutation_of(1, 5));
//!
//! // wraps around without reshuffling
//! let first = queue.current();
//! for _ in 0..5 {
//!     queue.advance();
//! }
//! assert_eq!(queue.current(), first);
//! ```

#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod shuffle;
pub mod standby;
pub mod volume;

pub use engine::{EngineIo, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use shuffle::ShuffleQueue;
pub use standby::StandbyTimer;
pub use volume::Volume;
