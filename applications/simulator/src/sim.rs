//! Simulated peripherals and the scenario runner
//!
//! Every peripheral shares one `World` behind `Rc<RefCell<_>>`. Time is
//! virtual: it advances when the runner steps the loop or when the
//! controller sleeps inside a blocking wait, and scripted stimuli are
//! applied as soon as their time has come. Folder tracks end on their own
//! after `track_ms`; announcements and adverts take no time.

use crate::config::SimConfig;
use crate::error::Result;
use crate::script::{Action, Script, CHORD_MS, TAP_MS};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use tagplay_control::{Controller, Devices, TickOutcome};
use tagplay_core::tag::TAG_LEN;
use tagplay_core::{
    AudioEvent, AudioModule, Button, ButtonPanel, CardId, Clock, NonVolatile, PowerControl,
    Tag, TagReader, TagplayError,
};
use tracing::{debug, info, warn};

/// Audio command as received by the simulated module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AudioCommand {
    Track { folder: u8, track: u8 },
    Announcement { index: u16 },
    Advert { index: u16 },
    Pause,
    Resume,
    Volume { level: u8 },
    Eq { index: u8 },
}

impl fmt::Display for AudioCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track { folder, track } => write!(f, "play {:02}/{:03}", folder, track),
            Self::Announcement { index } => write!(f, "announce {}", index),
            Self::Advert { index } => write!(f, "advert {}", index),
            Self::Pause => write!(f, "pause"),
            Self::Resume => write!(f, "resume"),
            Self::Volume { level } => write!(f, "volume {}", level),
            Self::Eq { index } => write!(f, "eq {}", index),
        }
    }
}

/// Timestamped audio command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub at_ms: u64,
    #[serde(flatten)]
    pub command: AudioCommand,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub ended_at_ms: u64,
    pub powered_down: bool,
    pub log: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stimulus {
    Press(Button),
    Release(Button),
    Present(CardId),
    Finish,
}

fn slot(button: Button) -> usize {
    match button {
        Button::Pause => 0,
        Button::Up => 1,
        Button::Down => 2,
    }
}

#[derive(Default)]
struct AudioState {
    track_counts: HashMap<u8, u16>,
    track_ms: u64,
    current: Option<(u8, u8)>,
    playing: bool,
    ends_at: u64,
    remaining_ms: u64,
    events: VecDeque<AudioEvent>,
}

#[derive(Default)]
struct World {
    now: u64,
    pending: Vec<(u64, Stimulus)>,
    log: Vec<LogEntry>,
    audio: AudioState,

    down: [bool; 3],
    since: [u64; 3],
    prev: [bool; 3],
    released: [bool; 3],

    on_reader: VecDeque<CardId>,
    tags: HashMap<CardId, [u8; TAG_LEN]>,
    selected: Option<CardId>,

    eeprom: Vec<u8>,
    powered_down: bool,
}

impl World {
    fn advance(&mut self, ms: u64) {
        self.now += ms;
        let now = self.now;
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.pending = later;
        for (_, stimulus) in due {
            self.apply(stimulus);
        }
        self.finish_elapsed();
    }

    fn apply(&mut self, stimulus: Stimulus) {
        debug!(at = self.now, ?stimulus, "Stimulus");
        match stimulus {
            Stimulus::Press(button) => {
                self.down[slot(button)] = true;
                self.since[slot(button)] = self.now;
            }
            Stimulus::Release(button) => self.down[slot(button)] = false,
            Stimulus::Present(card) => self.on_reader.push_back(card),
            Stimulus::Finish => {
                if self.audio.playing {
                    self.audio.ends_at = self.now;
                }
            }
        }
    }

    fn finish_elapsed(&mut self) {
        let audio = &mut self.audio;
        if audio.playing && self.now >= audio.ends_at {
            audio.playing = false;
            audio.remaining_ms = 0;
            if let Some((folder, track)) = audio.current {
                audio.events.push_back(AudioEvent::TrackFinished {
                    folder,
                    track: u16::from(track),
                });
            }
        }
    }

    fn record(&mut self, command: AudioCommand) {
        self.log.push(LogEntry {
            at_ms: self.now,
            command,
        });
    }
}

type Shared = Rc<RefCell<World>>;

struct SimAudio(Shared);

impl AudioModule for SimAudio {
    fn play_folder_track(&mut self, folder: u8, track: u8) {
        let mut w = self.0.borrow_mut();
        w.record(AudioCommand::Track { folder, track });
        let count = w.audio.track_counts.get(&folder).copied().unwrap_or(0);
        if track == 0 || u16::from(track) > count {
            warn!(folder, track, count, "Track not on the card");
        }
        let now = w.now;
        let audio = &mut w.audio;
        audio.current = Some((folder, track));
        audio.playing = true;
        audio.ends_at = now + audio.track_ms;
    }

    fn play_announcement(&mut self, index: u16) {
        let mut w = self.0.borrow_mut();
        w.record(AudioCommand::Announcement { index });
        let audio = &mut w.audio;
        audio.playing = false;
        audio.current = None;
        audio.remaining_ms = 0;
    }

    fn play_advert(&mut self, index: u16) {
        self.0.borrow_mut().record(AudioCommand::Advert { index });
    }

    fn pause(&mut self) {
        let mut w = self.0.borrow_mut();
        w.record(AudioCommand::Pause);
        let now = w.now;
        let audio = &mut w.audio;
        if audio.playing {
            audio.playing = false;
            audio.remaining_ms = audio.ends_at.saturating_sub(now);
        }
    }

    fn resume(&mut self) {
        let mut w = self.0.borrow_mut();
        w.record(AudioCommand::Resume);
        let now = w.now;
        let audio = &mut w.audio;
        if audio.current.is_some() && !audio.playing && audio.remaining_ms > 0 {
            audio.playing = true;
            audio.ends_at = now + audio.remaining_ms;
        }
    }

    fn set_volume(&mut self, level: u8) {
        self.0.borrow_mut().record(AudioCommand::Volume { level });
    }

    fn set_eq(&mut self, index: u8) {
        self.0.borrow_mut().record(AudioCommand::Eq { index });
    }

    fn folder_track_count(&mut self, folder: u8) -> u16 {
        self.0
            .borrow()
            .audio
            .track_counts
            .get(&folder)
            .copied()
            .unwrap_or(0)
    }

    fn is_busy(&mut self) -> bool {
        self.0.borrow().audio.playing
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        self.0.borrow_mut().audio.events.pop_front()
    }
}

struct SimReader(Shared);

impl TagReader for SimReader {
    fn poll_card(&mut self) -> Option<CardId> {
        self.0.borrow_mut().on_reader.pop_front()
    }

    fn authenticate(&mut self, card: &CardId) -> tagplay_core::Result<()> {
        self.0.borrow_mut().selected = Some(card.clone());
        Ok(())
    }

    fn read_block(&mut self, _addr: u8) -> tagplay_core::Result<[u8; 16]> {
        let w = self.0.borrow();
        let card = w.selected.as_ref().ok_or(TagplayError::Authentication)?;
        Ok(w.tags.get(card).copied().unwrap_or([0; TAG_LEN]))
    }

    fn write_block(&mut self, _addr: u8, data: &[u8; 16]) -> tagplay_core::Result<()> {
        let mut w = self.0.borrow_mut();
        let card = w.selected.clone().ok_or(TagplayError::Authentication)?;
        w.tags.insert(card, *data);
        Ok(())
    }

    fn halt(&mut self) {
        self.0.borrow_mut().selected = None;
    }
}

struct SimEeprom(Shared);

impl NonVolatile for SimEeprom {
    fn capacity(&self) -> usize {
        self.0.borrow().eeprom.len()
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> tagplay_core::Result<()> {
        let w = self.0.borrow();
        let src = w
            .eeprom
            .get(offset..offset + buf.len())
            .ok_or_else(|| TagplayError::storage(format!("read past end at {}", offset)))?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> tagplay_core::Result<()> {
        let mut w = self.0.borrow_mut();
        let dst = w
            .eeprom
            .get_mut(offset..offset + data.len())
            .ok_or_else(|| TagplayError::storage(format!("write past end at {}", offset)))?;
        dst.copy_from_slice(data);
        Ok(())
    }
}

struct SimButtons(Shared);

impl ButtonPanel for SimButtons {
    fn read(&mut self, _now_ms: u64) {
        let mut w = self.0.borrow_mut();
        for i in 0..3 {
            w.released[i] = w.prev[i] && !w.down[i];
        }
        w.prev = w.down;
    }

    fn is_down(&self, button: Button) -> bool {
        self.0.borrow().down[slot(button)]
    }

    fn was_released(&self, button: Button) -> bool {
        self.0.borrow().released[slot(button)]
    }

    fn held_for(&self, button: Button, ms: u64) -> bool {
        let w = self.0.borrow();
        w.down[slot(button)] && w.now.saturating_sub(w.since[slot(button)]) >= ms
    }
}

struct SimClock(Shared);

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.0.borrow().now
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.0.borrow_mut().advance(ms);
    }
}

struct SimPower(Shared);

impl PowerControl for SimPower {
    fn power_down(&mut self) {
        info!("Device switched off");
        self.0.borrow_mut().powered_down = true;
    }
}

/// A scenario bound to a booted controller
pub struct Simulation {
    world: Shared,
    controller: Controller,
    cards: BTreeMap<String, CardId>,
    step_ms: u64,
}

impl Simulation {
    /// Build the world from `config` and `script` and boot the player
    ///
    /// `eeprom` is the persistent storage image; stimuli scheduled at 0 ms
    /// (such as buttons held at power-on) are applied before boot.
    pub fn new(config: &SimConfig, script: &Script, eeprom: Vec<u8>) -> Result<Self> {
        config.validate()?;

        let mut world = World {
            eeprom,
            ..World::default()
        };
        world.audio.track_ms = config.track_ms;
        for spec in config.folders.iter().chain(&script.folders) {
            world.audio.track_counts.insert(spec.folder, spec.tracks);
        }

        let mut cards = BTreeMap::new();
        for (index, (name, spec)) in script.cards.iter().enumerate() {
            let serial = (index as u32).to_be_bytes();
            let card = CardId(vec![0x7a, serial[1], serial[2], serial[3]]);
            if let Some(payload) = spec.payload() {
                world.tags.insert(card.clone(), payload);
            }
            cards.insert(name.clone(), card);
        }

        for event in &script.events {
            let at = event.at;
            match &event.action {
                Action::Tap { button } => {
                    world.pending.push((at, Stimulus::Press(*button)));
                    world.pending.push((at + TAP_MS, Stimulus::Release(*button)));
                }
                Action::Hold { button, ms } => {
                    world.pending.push((at, Stimulus::Press(*button)));
                    world.pending.push((at + ms, Stimulus::Release(*button)));
                }
                Action::Chord => {
                    for button in Button::ALL {
                        world.pending.push((at, Stimulus::Press(button)));
                        world.pending.push((at + CHORD_MS, Stimulus::Release(button)));
                    }
                }
                Action::Present { card } => {
                    if let Some(id) = cards.get(card) {
                        world.pending.push((at, Stimulus::Present(id.clone())));
                    }
                }
                Action::Finish => world.pending.push((at, Stimulus::Finish)),
            }
        }
        world.advance(0);

        let world = Rc::new(RefCell::new(world));
        let devices = Devices {
            audio: Box::new(SimAudio(world.clone())),
            reader: Box::new(SimReader(world.clone())),
            storage: Box::new(SimEeprom(world.clone())),
            buttons: Box::new(SimButtons(world.clone())),
            clock: Box::new(SimClock(world.clone())),
            power: Box::new(SimPower(world.clone())),
        };

        let seed = config.seed.unwrap_or_else(rand::random);
        info!(seed, "Booting simulated player");
        let controller = Controller::boot(
            devices,
            config.control.clone(),
            config.announcements.clone(),
            seed,
        );

        Ok(Self {
            world,
            controller,
            cards,
            step_ms: config.control.poll_interval_ms,
        })
    }

    /// Step the control loop until `until_ms` or power-down
    pub fn run_until(&mut self, until_ms: u64) -> Report {
        while self.now_ms() < until_ms {
            self.world.borrow_mut().advance(self.step_ms);
            if self.controller.tick() == TickOutcome::PoweredDown {
                break;
            }
        }
        let w = self.world.borrow();
        Report {
            ended_at_ms: w.now,
            powered_down: w.powered_down,
            log: w.log.clone(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.world.borrow().now
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Current persistent storage image
    pub fn eeprom(&self) -> Vec<u8> {
        self.world.borrow().eeprom.clone()
    }

    /// Tag currently stored on a named card (`None` while blank)
    pub fn tag_of(&self, name: &str) -> Option<Tag> {
        let card = self.cards.get(name)?;
        self.world
            .borrow()
            .tags
            .get(card)
            .map(|bytes| Tag::decode(bytes))
    }
}
