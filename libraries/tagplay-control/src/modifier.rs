//! Behavior modifiers
//!
//! At most one modifier is active. It sees every input event before the
//! default handling and can absorb it (`Handling::Handled`) or let it
//! through (`Handling::Unhandled`), optionally after a side effect.
//! Timed modifiers end themselves by returning `Transition::RevertToNone`
//! from `on_tick`; the controller then resets the slot.

use rand::rngs::StdRng;
use rand::Rng;
use tagplay_core::{
    Announcements, AudioModule, FolderSetting, ModifierCard, ModifierKind, NonVolatile,
};
use tagplay_playback::{EngineIo, PlaybackEngine};
use tracing::{debug, info};

use crate::error::Result;

const MS_PER_MINUTE: u64 = 60_000;

/// Freeze-dance stop interval bounds
const FREEZE_MIN_MS: u64 = 5_000;
const FREEZE_MAX_MS: u64 = 30_000;

/// Whether a hook consumed the event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    Handled,
    Unhandled,
}

impl Handling {
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

/// What the owner should do with the modifier after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Continue,
    RevertToNone,
}

/// Everything a hook may touch
pub struct ModifierCx<'a> {
    pub engine: &'a mut PlaybackEngine,
    pub audio: &'a mut dyn AudioModule,
    pub storage: &'a mut dyn NonVolatile,
    pub rng: &'a mut StdRng,
    pub announcements: &'a Announcements,
    pub now_ms: u64,
}

impl ModifierCx<'_> {
    /// Borrow the engine together with the peripherals it needs
    pub fn split(&mut self) -> (&mut PlaybackEngine, EngineIo<'_>) {
        (
            &mut *self.engine,
            EngineIo {
                audio: &mut *self.audio,
                storage: &mut *self.storage,
                rng: &mut *self.rng,
                now_ms: self.now_ms,
            },
        )
    }
}

/// The active behavior override and its private state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Modifier {
    #[default]
    None,
    SleepTimer {
        deadline: u64,
    },
    FreezeDance {
        next_stop: u64,
    },
    Locked,
    Toddler,
    Kindergarten {
        queued: Option<FolderSetting>,
    },
    RepeatSingle,
    Feedback,
}

fn next_freeze(cx: &mut ModifierCx<'_>) -> u64 {
    cx.now_ms + cx.rng.gen_range(FREEZE_MIN_MS..=FREEZE_MAX_MS)
}

impl Modifier {
    /// Build the modifier a tag asks for
    pub fn activate(card: ModifierCard, cx: &mut ModifierCx<'_>) -> Self {
        let modifier = match card {
            ModifierCard::SleepTimer { minutes } => Self::SleepTimer {
                deadline: cx.now_ms + u64::from(minutes) * MS_PER_MINUTE,
            },
            ModifierCard::FreezeDance => {
                if cx.audio.is_busy() {
                    cx.audio.play_advert(cx.announcements.freeze_intro);
                }
                Self::FreezeDance {
                    next_stop: next_freeze(cx),
                }
            }
            ModifierCard::Locked => Self::Locked,
            ModifierCard::ToddlerMode => Self::Toddler,
            ModifierCard::KindergartenMode => Self::Kindergarten { queued: None },
            ModifierCard::RepeatSingle => Self::RepeatSingle,
            ModifierCard::Feedback => Self::Feedback,
        };
        info!(?modifier, "Modifier activated");
        modifier
    }

    /// Identity used for toggling
    pub fn kind(&self) -> Option<ModifierKind> {
        match self {
            Self::None => None,
            Self::SleepTimer { .. } => Some(ModifierKind::SleepTimer),
            Self::FreezeDance { .. } => Some(ModifierKind::FreezeDance),
            Self::Locked => Some(ModifierKind::Locked),
            Self::Toddler => Some(ModifierKind::ToddlerMode),
            Self::Kindergarten { .. } => Some(ModifierKind::KindergartenMode),
            Self::RepeatSingle => Some(ModifierKind::RepeatSingle),
            Self::Feedback => Some(ModifierKind::Feedback),
        }
    }

    pub fn is_active(&self) -> bool {
        *self != Self::None
    }

    /// Called once per control-loop tick
    pub fn on_tick(&mut self, cx: &mut ModifierCx<'_>) -> Transition {
        match self {
            Self::SleepTimer { deadline } if cx.now_ms >= *deadline => {
                info!("Sleep timer expired");
                cx.audio.pause();
                cx.engine.arm_standby(cx.now_ms);
                Transition::RevertToNone
            }
            Self::FreezeDance { next_stop } if cx.now_ms >= *next_stop => {
                if cx.audio.is_busy() {
                    debug!("Freeze!");
                    cx.audio.play_advert(cx.announcements.freeze_stop);
                }
                *next_stop = next_freeze(cx);
                Transition::Continue
            }
            _ => Transition::Continue,
        }
    }

    /// Pause button (tap or long press)
    pub fn on_pause(&mut self, _cx: &mut ModifierCx<'_>) -> Handling {
        self.blocks_transport()
    }

    /// A track finished (`finished` is set) or the next button asked to
    /// move on (`finished` is `None`)
    pub fn on_advance_request(
        &mut self,
        finished: Option<u16>,
        cx: &mut ModifierCx<'_>,
    ) -> Result<Handling> {
        match self {
            Self::Kindergarten { queued } => {
                let Some(setting) = queued.take() else {
                    return Ok(Handling::Unhandled);
                };
                info!(folder = setting.folder, "Playing queued tag");
                let (engine, mut io) = cx.split();
                if let Err(e) = engine.select_folder(setting, &mut io) {
                    // the finished track was the last thing playing
                    engine.arm_standby(io.now_ms);
                    return Err(e.into());
                }
                Ok(Handling::Handled)
            }
            Self::RepeatSingle => {
                if finished.is_none() && cx.audio.is_busy() {
                    return Ok(Handling::Handled);
                }
                debug!("Repeating track");
                let (engine, mut io) = cx.split();
                engine.replay_current(&mut io)?;
                Ok(Handling::Handled)
            }
            _ => Ok(Handling::Unhandled),
        }
    }

    pub fn on_next_button(&mut self, _cx: &mut ModifierCx<'_>) -> Handling {
        self.blocks_track_change()
    }

    pub fn on_previous_button(&mut self, _cx: &mut ModifierCx<'_>) -> Handling {
        self.blocks_track_change()
    }

    /// Volume up; `target` is the level the step would reach
    pub fn on_volume_up(&mut self, target: Option<u8>, cx: &mut ModifierCx<'_>) -> Handling {
        self.on_volume(target, cx)
    }

    /// Volume down; `target` is the level the step would reach
    pub fn on_volume_down(&mut self, target: Option<u8>, cx: &mut ModifierCx<'_>) -> Handling {
        self.on_volume(target, cx)
    }

    /// A folder tag was read
    pub fn on_tag_read(&mut self, setting: FolderSetting, cx: &mut ModifierCx<'_>) -> Handling {
        match self {
            Self::Locked => Handling::Handled,
            Self::Kindergarten { queued } if cx.audio.is_busy() => {
                info!(folder = setting.folder, "Tag queued until the track ends");
                *queued = Some(setting);
                Handling::Handled
            }
            _ => Handling::Unhandled,
        }
    }

    fn on_volume(&mut self, target: Option<u8>, cx: &mut ModifierCx<'_>) -> Handling {
        match self {
            Self::Feedback => {
                if let Some(level) = target {
                    cx.audio.play_advert(u16::from(level));
                }
                Handling::Unhandled
            }
            _ => self.blocks_transport(),
        }
    }

    fn blocks_transport(&self) -> Handling {
        match self {
            Self::Locked | Self::Toddler => Handling::Handled,
            _ => Handling::Unhandled,
        }
    }

    fn blocks_track_change(&self) -> Handling {
        match self {
            Self::Locked | Self::Toddler | Self::Kindergarten { .. } => Handling::Handled,
            _ => Handling::Unhandled,
        }
    }
}
