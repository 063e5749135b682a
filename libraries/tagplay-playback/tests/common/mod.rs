//! Mock peripherals for engine tests

#![allow(dead_code)]

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tagplay_core::{AudioEvent, AudioModule, NonVolatile, Result, TagplayError};
use tagplay_playback::EngineIo;

/// Audio module that records every track it is asked to play
#[derive(Default)]
pub struct FakeAudio {
    pub track_counts: HashMap<u8, u16>,
    pub played: Vec<(u8, u8)>,
    pub busy: bool,
}

impl FakeAudio {
    pub fn with_folder(folder: u8, tracks: u16) -> Self {
        let mut audio = Self::default();
        audio.track_counts.insert(folder, tracks);
        audio
    }

    pub fn last_played(&self) -> Option<(u8, u8)> {
        self.played.last().copied()
    }
}

impl AudioModule for FakeAudio {
    fn play_folder_track(&mut self, folder: u8, track: u8) {
        self.played.push((folder, track));
        self.busy = true;
    }

    fn play_announcement(&mut self, _index: u16) {
        self.busy = false;
    }

    fn play_advert(&mut self, _index: u16) {}

    fn pause(&mut self) {
        self.busy = false;
    }

    fn resume(&mut self) {
        self.busy = true;
    }

    fn set_volume(&mut self, _volume: u8) {}

    fn set_eq(&mut self, _eq: u8) {}

    fn folder_track_count(&mut self, folder: u8) -> u16 {
        self.track_counts.get(&folder).copied().unwrap_or(0)
    }

    fn is_busy(&mut self) -> bool {
        self.busy
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        None
    }
}

/// Byte-addressed storage in memory
pub struct MemoryStorage {
    pub cells: Vec<u8>,
    pub fail: bool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            cells: vec![0; 1024],
            fail: false,
        }
    }
}

impl NonVolatile for MemoryStorage {
    fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<()> {
        if self.fail {
            return Err(TagplayError::storage("unplugged"));
        }
        buf.copy_from_slice(&self.cells[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        if self.fail {
            return Err(TagplayError::storage("unplugged"));
        }
        self.cells[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}

/// Everything an engine call borrows, owned in one place
pub struct Rig {
    pub audio: FakeAudio,
    pub storage: MemoryStorage,
    pub rng: StdRng,
    pub now_ms: u64,
}

impl Rig {
    pub fn new(folder: u8, tracks: u16) -> Self {
        Self {
            audio: FakeAudio::with_folder(folder, tracks),
            storage: MemoryStorage::default(),
            rng: StdRng::seed_from_u64(42),
            now_ms: 0,
        }
    }

    pub fn io(&mut self) -> EngineIo<'_> {
        EngineIo {
            audio: &mut self.audio,
            storage: &mut self.storage,
            rng: &mut self.rng,
            now_ms: self.now_ms,
        }
    }
}
