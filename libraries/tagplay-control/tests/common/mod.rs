//! Simulated peripherals shared by the controller tests
//!
//! All mocks share one `World` behind `Rc<RefCell<_>>`. Time only moves
//! when the controller sleeps (blocking waits) or when a test runs the
//! loop; scripted actions fire once their time has come.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tagplay_control::{ControlConfig, Controller, Devices, TickOutcome};
use tagplay_core::{
    settings, Announcements, AudioEvent, AudioModule, Button, ButtonPanel, CardId, Clock,
    NonVolatile, PowerControl, Result, Settings, Tag, TagContent, TagReader, TagplayError,
};

pub const SEED: u64 = 7;
pub const TICK_MS: u64 = 10;

/// Audio command as seen by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd {
    Track(u8, u8),
    Announcement(u16),
    Advert(u16),
    Pause,
    Resume,
    Volume(u8),
    Eq(u8),
}

/// Scripted stimulus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Press(Button),
    Release(Button),
    Present(CardId),
    FinishTrack,
}

fn slot(button: Button) -> usize {
    match button {
        Button::Pause => 0,
        Button::Up => 1,
        Button::Down => 2,
    }
}

#[derive(Default)]
pub struct World {
    pub now: u64,
    pub script: Vec<(u64, Action)>,

    pub log: Vec<Cmd>,
    pub busy: bool,
    pub current: Option<(u8, u8)>,
    pub track_counts: HashMap<u8, u16>,
    pub events: VecDeque<AudioEvent>,

    pub down: [bool; 3],
    pub since: [u64; 3],
    pub prev: [bool; 3],
    pub released: [bool; 3],

    pub pending_cards: VecDeque<CardId>,
    pub tags: HashMap<Vec<u8>, [u8; 16]>,
    pub selected_card: Option<CardId>,
    pub fail_writes: bool,

    pub eeprom: Vec<u8>,
    pub powered_down: bool,
}

impl World {
    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
        let now = self.now;
        let (due, later): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.script).into_iter().partition(|(at, _)| *at <= now);
        self.script = later;
        for (_, action) in due {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Press(button) => {
                self.down[slot(button)] = true;
                self.since[slot(button)] = self.now;
            }
            Action::Release(button) => self.down[slot(button)] = false,
            Action::Present(card) => self.pending_cards.push_back(card),
            Action::FinishTrack => {
                if let (true, Some((folder, track))) = (self.busy, self.current) {
                    self.busy = false;
                    self.events.push_back(AudioEvent::TrackFinished {
                        folder,
                        track: u16::from(track),
                    });
                }
            }
        }
    }
}

type Shared = Rc<RefCell<World>>;

struct MockAudio(Shared);

impl AudioModule for MockAudio {
    fn play_folder_track(&mut self, folder: u8, track: u8) {
        let mut w = self.0.borrow_mut();
        w.log.push(Cmd::Track(folder, track));
        w.busy = true;
        w.current = Some((folder, track));
    }

    fn play_announcement(&mut self, index: u16) {
        let mut w = self.0.borrow_mut();
        w.log.push(Cmd::Announcement(index));
        w.busy = false;
        w.current = None;
    }

    fn play_advert(&mut self, index: u16) {
        self.0.borrow_mut().log.push(Cmd::Advert(index));
    }

    fn pause(&mut self) {
        let mut w = self.0.borrow_mut();
        w.log.push(Cmd::Pause);
        w.busy = false;
    }

    fn resume(&mut self) {
        let mut w = self.0.borrow_mut();
        w.log.push(Cmd::Resume);
        w.busy = w.current.is_some();
    }

    fn set_volume(&mut self, volume: u8) {
        self.0.borrow_mut().log.push(Cmd::Volume(volume));
    }

    fn set_eq(&mut self, eq: u8) {
        self.0.borrow_mut().log.push(Cmd::Eq(eq));
    }

    fn folder_track_count(&mut self, folder: u8) -> u16 {
        self.0.borrow().track_counts.get(&folder).copied().unwrap_or(0)
    }

    fn is_busy(&mut self) -> bool {
        self.0.borrow().busy
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        self.0.borrow_mut().events.pop_front()
    }
}

struct MockReader(Shared);

impl TagReader for MockReader {
    fn poll_card(&mut self) -> Option<CardId> {
        self.0.borrow_mut().pending_cards.pop_front()
    }

    fn authenticate(&mut self, card: &CardId) -> Result<()> {
        self.0.borrow_mut().selected_card = Some(card.clone());
        Ok(())
    }

    fn read_block(&mut self, _addr: u8) -> Result<[u8; 16]> {
        let w = self.0.borrow();
        let card = w.selected_card.as_ref().ok_or(TagplayError::Authentication)?;
        Ok(w.tags.get(&card.0).copied().unwrap_or([0; 16]))
    }

    fn write_block(&mut self, _addr: u8, data: &[u8; 16]) -> Result<()> {
        let mut w = self.0.borrow_mut();
        if w.fail_writes {
            return Err(TagplayError::reader("write failed"));
        }
        let card = w.selected_card.clone().ok_or(TagplayError::Authentication)?;
        w.tags.insert(card.0, *data);
        Ok(())
    }
}

struct MockStorage(Shared);

impl NonVolatile for MockStorage {
    fn capacity(&self) -> usize {
        self.0.borrow().eeprom.len()
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<()> {
        let w = self.0.borrow();
        let src = w
            .eeprom
            .get(offset..offset + buf.len())
            .ok_or_else(|| TagplayError::storage("out of range"))?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let mut w = self.0.borrow_mut();
        let dst = w
            .eeprom
            .get_mut(offset..offset + data.len())
            .ok_or_else(|| TagplayError::storage("out of range"))?;
        dst.copy_from_slice(data);
        Ok(())
    }
}

struct MockButtons(Shared);

impl ButtonPanel for MockButtons {
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
        w.down[slot(button)] && w.now - w.since[slot(button)] >= ms
    }
}

struct MockClock(Shared);

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.0.borrow().now
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.0.borrow_mut().advance(ms);
    }
}

struct MockPower(Shared);

impl PowerControl for MockPower {
    fn power_down(&mut self) {
        self.0.borrow_mut().powered_down = true;
    }
}

/// Test bench around a shared world
pub struct Bench {
    pub world: Shared,
}

impl Bench {
    /// Blank EEPROM and one folder per `(folder, tracks)` pair
    pub fn new(folders: &[(u8, u16)]) -> Self {
        let world = World {
            eeprom: vec![0xff; 1024],
            track_counts: folders.iter().copied().collect(),
            ..World::default()
        };
        Self {
            world: Rc::new(RefCell::new(world)),
        }
    }

    pub fn devices(&self) -> Devices {
        Devices {
            audio: Box::new(MockAudio(self.world.clone())),
            reader: Box::new(MockReader(self.world.clone())),
            storage: Box::new(MockStorage(self.world.clone())),
            buttons: Box::new(MockButtons(self.world.clone())),
            clock: Box::new(MockClock(self.world.clone())),
            power: Box::new(MockPower(self.world.clone())),
        }
    }

    /// Config with a short wait bound so stuck flows fail fast
    pub fn config() -> ControlConfig {
        ControlConfig {
            max_wait_ms: Some(30_000),
            ..ControlConfig::default()
        }
    }

    pub fn boot(&self) -> Controller {
        Controller::boot(self.devices(), Self::config(), Announcements::default(), SEED)
    }

    /// Store `settings` in the EEPROM before boot
    pub fn store_settings(&self, settings: &Settings) {
        let mut storage = MockStorage(self.world.clone());
        settings::save(&mut storage, settings).unwrap();
    }

    pub fn stored_settings(&self) -> Settings {
        let mut storage = MockStorage(self.world.clone());
        settings::load(&mut storage).settings
    }

    /// A provisioned card carrying `content`
    pub fn card(&self, serial: u8, content: TagContent) -> CardId {
        let card = CardId(vec![0xc0, serial]);
        self.world
            .borrow_mut()
            .tags
            .insert(card.0.clone(), Tag::new(&content).encode());
        card
    }

    /// A card that was never provisioned
    pub fn blank_card(&self, serial: u8) -> CardId {
        CardId(vec![0xb0, serial])
    }

    pub fn tag_on(&self, card: &CardId) -> Option<Tag> {
        self.world.borrow().tags.get(&card.0).map(|bytes| Tag::decode(bytes))
    }

    pub fn now(&self) -> u64 {
        self.world.borrow().now
    }

    pub fn at(&self, at: u64, action: Action) {
        self.world.borrow_mut().script.push((at, action));
    }

    /// Short press starting at `at`; returns the time it ends
    pub fn tap(&self, button: Button, at: u64) -> u64 {
        self.at(at, Action::Press(button));
        self.at(at + 100, Action::Release(button));
        at + 200
    }

    /// `count` taps in a row; returns the time they end
    pub fn taps(&self, button: Button, count: usize, mut at: u64) -> u64 {
        for _ in 0..count {
            at = self.tap(button, at);
        }
        at
    }

    /// Press held for `hold_ms`; returns the time it ends
    pub fn hold(&self, button: Button, at: u64, hold_ms: u64) -> u64 {
        self.at(at, Action::Press(button));
        self.at(at + hold_ms, Action::Release(button));
        at + hold_ms + 100
    }

    /// All three buttons at once
    pub fn chord(&self, at: u64) -> u64 {
        for button in Button::ALL {
            self.at(at, Action::Press(button));
            self.at(at + 200, Action::Release(button));
        }
        at + 300
    }

    pub fn present(&self, card: &CardId, at: u64) {
        self.at(at, Action::Present(card.clone()));
    }

    /// Run the loop until `until_ms` (or power-down)
    pub fn run(&self, controller: &mut Controller, until_ms: u64) -> TickOutcome {
        while self.now() < until_ms {
            self.world.borrow_mut().advance(TICK_MS);
            if controller.tick() == TickOutcome::PoweredDown {
                return TickOutcome::PoweredDown;
            }
        }
        TickOutcome::Running
    }

    /// Let the playing track end now
    pub fn finish_track(&self) {
        let now = self.now();
        self.at(now, Action::FinishTrack);
    }

    /// Queue a track-finished notification as if the module sent it again
    pub fn repeat_notification(&self, folder: u8, track: u16) {
        self.world
            .borrow_mut()
            .events
            .push_back(AudioEvent::TrackFinished { folder, track });
    }

    pub fn log(&self) -> Vec<Cmd> {
        self.world.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.world.borrow_mut().log.clear();
    }

    pub fn last(&self) -> Option<Cmd> {
        self.world.borrow().log.last().copied()
    }
}
