//! Play-mode state machine
//!
//! One `PlaybackEngine` exists per device. It owns a copy of the active
//! `FolderSetting`, so the tag buffer, shortcut slot or queued selection it
//! came from may be overwritten at any time.

use rand::rngs::StdRng;
use rand::Rng;
use tagplay_core::{progress, AudioModule, FolderSetting, NonVolatile, PlayMode};
use tracing::{debug, info, warn};

use crate::error::{PlaybackError, Result};
use crate::shuffle::ShuffleQueue;
use crate::standby::StandbyTimer;

/// Peripherals and time borrowed for the duration of one engine call
pub struct EngineIo<'a> {
    pub audio: &'a mut dyn AudioModule,
    pub storage: &'a mut dyn NonVolatile,
    pub rng: &'a mut StdRng,
    pub now_ms: u64,
}

/// Track selection state for the active folder
#[derive(Debug, Clone, Default)]
pub struct PlaybackEngine {
    selection: Option<FolderSetting>,
    /// A card was read and is being played (not provisioned)
    known: bool,
    current_track: u8,
    first_track: u8,
    last_track: u8,
    queue: ShuffleQueue,
    last_finished: Option<u16>,
    standby: StandbyTimer,
    standby_minutes: u32,
}

impl PlaybackEngine {
    pub fn new(standby_minutes: u32) -> Self {
        Self {
            standby_minutes,
            ..Self::default()
        }
    }

    // ===== Accessors =====

    /// The active folder setting
    pub fn selection(&self) -> Option<FolderSetting> {
        self.selection
    }

    pub fn current_track(&self) -> u8 {
        self.current_track
    }

    /// Inclusive track bounds of the active selection
    pub fn bounds(&self) -> (u8, u8) {
        (self.first_track, self.last_track)
    }

    pub fn queue(&self) -> &ShuffleQueue {
        &self.queue
    }

    pub fn is_known(&self) -> bool {
        self.known
    }

    /// Mark the session as provisioning; track-finished notifications are
    /// ignored until the next selection
    pub fn mark_unknown(&mut self) {
        self.known = false;
    }

    /// Track number as announced to the listener
    ///
    /// Ordered and shuffled range modes count from the start of the range.
    pub fn announced_position(&self) -> u8 {
        match self.selection.map(|s| s.mode) {
            Some(PlayMode::FromToAllTracks(range) | PlayMode::FromToRandomTracks(range)) => {
                self.current_track.saturating_sub(range.first() - 1)
            }
            _ => self.current_track,
        }
    }

    // ===== Standby =====

    pub fn set_standby_minutes(&mut self, minutes: u32) {
        self.standby_minutes = minutes;
    }

    pub fn arm_standby(&mut self, now_ms: u64) {
        self.standby.arm(now_ms, self.standby_minutes);
    }

    pub fn disarm_standby(&mut self) {
        self.standby.disarm();
    }

    pub fn standby_due(&self, now_ms: u64) -> bool {
        self.standby.is_due(now_ms)
    }

    pub fn standby(&self) -> &StandbyTimer {
        &self.standby
    }

    // ===== Selection =====

    /// Start playing `setting` according to its mode
    ///
    /// A setting that cannot be played leaves the engine untouched.
    pub fn select_folder(&mut self, setting: FolderSetting, io: &mut EngineIo<'_>) -> Result<()> {
        let folder = setting.folder;
        let count = io.audio.folder_track_count(folder).min(u16::from(u8::MAX)) as u8;
        if count == 0 {
            warn!(folder, "Folder has no tracks");
            return Err(PlaybackError::EmptyFolder(folder));
        }

        let (first, last) = match setting.mode.range() {
            Some(range) => {
                let last = range.last().min(count);
                if range.first() > last {
                    return Err(PlaybackError::InvalidQueue(format!(
                        "range {}..={} outside folder {} ({} tracks)",
                        range.first(),
                        range.last(),
                        folder,
                        count
                    )));
                }
                (range.first(), last)
            }
            None => (1, count),
        };

        self.standby.disarm();
        self.known = true;
        self.first_track = first;
        self.last_track = last;
        self.last_finished = None;
        self.queue = ShuffleQueue::default();

        self.current_track = match setting.mode {
            PlayMode::RandomTrackInFolder | PlayMode::FromToRandomTrack(_) => {
                io.rng.gen_range(first..=last)
            }
            PlayMode::TracksInFolder | PlayMode::FromToAllTracks(_) => first,
            PlayMode::RandomsInFolder | PlayMode::FromToRandomTracks(_) => {
                self.queue = ShuffleQueue::build(first, last, &mut *io.rng);
                debug!(order = ?self.queue.order(), "Shuffled queue");
                self.queue.current().unwrap_or(first)
            }
            PlayMode::TrackInFolder { track } => track,
            PlayMode::AudioBook => match progress::last_track(io.storage, folder) {
                Ok(track) if (1..=count).contains(&track) => track,
                Ok(_) => 1,
                Err(e) => {
                    warn!(folder, "Failed to read progress: {}", e);
                    1
                }
            },
        };

        self.selection = Some(setting);
        info!(
            folder,
            mode = setting.mode.code(),
            first,
            last,
            track = self.current_track,
            "Folder selected"
        );
        self.play_current(io);
        Ok(())
    }

    /// Replace the shuffle queue with a fixed order
    ///
    /// The order must be a permutation of the current bounds. The cursor
    /// moves to its first entry; nothing is played.
    pub fn replace_queue(&mut self, order: Vec<u8>) -> Result<()> {
        let setting = self.selection.ok_or(PlaybackError::NoSelection)?;
        if !setting.mode.uses_queue() {
            return Err(PlaybackError::InvalidQueue(format!(
                "mode {} does not use a queue",
                setting.mode.code()
            )));
        }
        self.queue = ShuffleQueue::from_order(order, self.first_track, self.last_track)?;
        self.current_track = self.queue.current().unwrap_or(self.first_track);
        Ok(())
    }

    // ===== Transport =====

    /// Whether `finished` repeats the last track-finished notification
    pub fn is_duplicate(&self, finished: u16) -> bool {
        self.last_finished == Some(finished)
    }

    /// Whether a notification for `folder` belongs to an earlier selection
    pub fn is_stale(&self, folder: u8) -> bool {
        self.selection.is_some_and(|setting| setting.folder != folder)
    }

    /// Handle a track-finished notification
    ///
    /// Repeated notifications for the same track and notifications during
    /// provisioning are ignored.
    pub fn advance(&mut self, finished: u16, io: &mut EngineIo<'_>) -> Result<()> {
        if self.is_duplicate(finished) {
            debug!(finished, "Duplicate track-finished notification");
            return Ok(());
        }
        self.last_finished = Some(finished);

        if !self.known {
            debug!(finished, "Track finished while provisioning");
            return Ok(());
        }
        self.step_forward(io)
    }

    /// Next track on request, bypassing the duplicate guard
    pub fn skip_forward(&mut self, io: &mut EngineIo<'_>) -> Result<()> {
        if !self.known {
            return Ok(());
        }
        self.step_forward(io)
    }

    /// Previous track
    pub fn rewind(&mut self, io: &mut EngineIo<'_>) -> Result<()> {
        let setting = self.selection.ok_or(PlaybackError::NoSelection)?;
        if !self.known {
            return Ok(());
        }

        match setting.mode {
            // not rewindable: restart the same track
            PlayMode::RandomTrackInFolder
            | PlayMode::FromToRandomTrack(_)
            | PlayMode::TrackInFolder { .. } => {}
            PlayMode::TracksInFolder | PlayMode::FromToAllTracks(_) => {
                if self.current_track > self.first_track {
                    self.current_track -= 1;
                }
            }
            PlayMode::RandomsInFolder | PlayMode::FromToRandomTracks(_) => {
                self.current_track = self.queue.retreat().unwrap_or(self.current_track);
            }
            PlayMode::AudioBook => {
                if self.current_track > 1 {
                    self.current_track -= 1;
                }
                self.remember_progress(setting.folder, self.current_track, io);
            }
        }

        debug!(track = self.current_track, "Rewind");
        self.play_current(io);
        Ok(())
    }

    /// Play the current track again from the start
    pub fn replay_current(&mut self, io: &mut EngineIo<'_>) -> Result<()> {
        if self.selection.is_none() {
            return Err(PlaybackError::NoSelection);
        }
        self.last_finished = None;
        self.play_current(io);
        Ok(())
    }

    fn step_forward(&mut self, io: &mut EngineIo<'_>) -> Result<()> {
        let setting = self.selection.ok_or(PlaybackError::NoSelection)?;

        match setting.mode {
            PlayMode::RandomTrackInFolder
            | PlayMode::FromToRandomTrack(_)
            | PlayMode::TrackInFolder { .. } => {
                debug!("Single track finished");
                self.arm_standby(io.now_ms);
            }
            PlayMode::TracksInFolder | PlayMode::FromToAllTracks(_) => {
                if self.current_track < self.last_track {
                    self.current_track += 1;
                    self.play_current(io);
                } else {
                    debug!("End of folder");
                    self.arm_standby(io.now_ms);
                }
            }
            // a one-track queue would wrap onto the number the duplicate
            // guard just recorded, so it ends like a single track
            PlayMode::RandomsInFolder | PlayMode::FromToRandomTracks(_)
                if self.queue.len() <= 1 =>
            {
                debug!("One-track queue finished");
                self.arm_standby(io.now_ms);
            }
            PlayMode::RandomsInFolder | PlayMode::FromToRandomTracks(_) => {
                self.current_track = self.queue.advance().unwrap_or(self.current_track);
                self.play_current(io);
            }
            PlayMode::AudioBook => {
                if self.current_track < self.last_track {
                    self.current_track += 1;
                    self.remember_progress(setting.folder, self.current_track, io);
                    self.play_current(io);
                } else {
                    debug!("Audiobook finished, progress reset");
                    self.remember_progress(setting.folder, 1, io);
                    self.arm_standby(io.now_ms);
                }
            }
        }
        Ok(())
    }

    fn play_current(&mut self, io: &mut EngineIo<'_>) {
        let Some(setting) = self.selection else {
            return;
        };
        self.standby.disarm();
        debug!(folder = setting.folder, track = self.current_track, "Play");
        io.audio.play_folder_track(setting.folder, self.current_track);
    }

    fn remember_progress(&self, folder: u8, track: u8, io: &mut EngineIo<'_>) {
        if let Err(e) = progress::remember(io.storage, folder, track) {
            warn!(folder, track, "Failed to store progress: {}", e);
        }
    }
}
