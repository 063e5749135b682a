//! Main control loop
//!
//! `Controller` owns every peripheral, the settings, the playback engine
//! and the active modifier. The host calls `tick` in a loop; each tick
//! samples the peripherals once and runs at most one long operation
//! (provisioning, admin menu) to completion before returning.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tagplay_core::{
    progress, settings, tag, Announcements, AudioEvent, AudioModule, Button, ButtonPanel,
    CardId, Clock, ErrorClass, FolderSetting, ModifierCard, NonVolatile, PowerControl, Settings,
    TagContent, TagReader,
};
use tagplay_playback::{EngineIo, PlaybackEngine, PlaybackError, Volume};
use tracing::{debug, info, warn};

use crate::buttons::{ButtonDispatcher, ButtonEvent};
use crate::config::ControlConfig;
use crate::error::{ControlError, Result};
use crate::modifier::{Handling, Modifier, ModifierCx, Transition};

/// Peripherals driven by the controller
pub struct Devices {
    pub audio: Box<dyn AudioModule>,
    pub reader: Box<dyn TagReader>,
    pub storage: Box<dyn NonVolatile>,
    pub buttons: Box<dyn ButtonPanel>,
    pub clock: Box<dyn Clock>,
    pub power: Box<dyn PowerControl>,
}

/// Result of one control-loop tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// Standby deadline passed and the device was switched off
    PoweredDown,
}

/// How the admin menu was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminEntry {
    /// Button chord; the lock gate applies
    Buttons,
    /// Admin tag; the lock gate is skipped
    Card,
}

/// Volume direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Up,
    Down,
}

/// The player
pub struct Controller {
    pub(crate) devices: Devices,
    pub(crate) settings: Settings,
    pub(crate) persistable: bool,
    pub(crate) engine: PlaybackEngine,
    pub(crate) modifier: Modifier,
    pub(crate) volume: Volume,
    pub(crate) dispatcher: ButtonDispatcher,
    pub(crate) announcements: Announcements,
    pub(crate) config: ControlConfig,
    pub(crate) rng: StdRng,
}

impl Controller {
    /// Bring the player up
    ///
    /// Loads (or resets/migrates) the settings, honors the three-button
    /// factory reset, applies volume and EQ and plays the welcome shortcut.
    /// `seed` seeds the random source once.
    pub fn boot(
        mut devices: Devices,
        config: ControlConfig,
        announcements: Announcements,
        seed: u64,
    ) -> Self {
        let loaded = settings::load(devices.storage.as_mut());
        let persistable = loaded.persistable();
        let mut settings = loaded.settings;
        info!(source = ?loaded.source, "Settings loaded");

        let now_ms = devices.clock.now_ms();
        devices.buttons.read(now_ms);
        let mut dispatcher = ButtonDispatcher::new(config.long_press_ms, config.repeat_interval_ms);

        if Button::ALL.iter().all(|b| devices.buttons.is_down(*b)) {
            info!("All buttons held at boot, restoring factory settings");
            settings.reset();
            if persistable {
                if let Err(e) = settings::save(devices.storage.as_mut(), &settings) {
                    warn!("Failed to write settings: {}", e);
                }
            }
            if let Err(e) = progress::clear(devices.storage.as_mut()) {
                warn!("Failed to clear progress: {}", e);
            }
            dispatcher.suppress_until_released();
        }

        let volume = Volume::new(
            settings.initial_volume,
            settings.min_volume,
            settings.max_volume,
        );
        devices.audio.set_volume(volume.level());
        devices.audio.set_eq(settings.eq.saturating_sub(1));

        let mut engine = PlaybackEngine::new(settings.standby_minutes);
        engine.arm_standby(now_ms);

        let mut controller = Self {
            devices,
            settings,
            persistable,
            engine,
            modifier: Modifier::None,
            volume,
            dispatcher,
            announcements,
            config,
            rng: StdRng::seed_from_u64(seed),
        };

        if let Err(e) = controller.play_shortcut(3) {
            controller.report("welcome shortcut", &e);
        }
        controller
    }

    // ===== Accessors =====

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn modifier(&self) -> &Modifier {
        &self.modifier
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// Fix the shuffle order of the active selection
    pub fn replace_queue(&mut self, order: Vec<u8>) -> Result<()> {
        self.engine.replace_queue(order)?;
        Ok(())
    }

    // ===== Control loop =====

    /// Run one iteration of the control loop
    pub fn tick(&mut self) -> TickOutcome {
        let now_ms = self.devices.clock.now_ms();

        if self.with_modifier(|m, cx| m.on_tick(cx)) == Transition::RevertToNone {
            debug!("Modifier ended itself");
            self.modifier = Modifier::None;
        }

        if self.engine.standby_due(now_ms) {
            info!("Standby deadline reached, powering down");
            self.devices.power.power_down();
            return TickOutcome::PoweredDown;
        }

        self.drain_audio_events(true);

        self.devices.buttons.read(now_ms);
        for event in self.dispatcher.poll(self.devices.buttons.as_ref(), now_ms) {
            if let Err(e) = self.handle_button(event) {
                self.report("button", &e);
            }
        }

        if let Some(card) = self.devices.reader.poll_card() {
            if let Err(e) = self.handle_card(&card) {
                self.report("tag", &e);
            }
            self.devices.reader.halt();
        }

        TickOutcome::Running
    }

    /// Forward pending audio-module notifications
    ///
    /// Blocking flows pass `hooks = false` so that modifiers cannot start
    /// playback in the middle of a menu.
    pub(crate) fn drain_audio_events(&mut self, hooks: bool) {
        while let Some(event) = self.devices.audio.poll_event() {
            match event {
                AudioEvent::TrackFinished { folder, track } => {
                    if self.engine.is_stale(folder) {
                        debug!(folder, track, "Track finished for an earlier selection");
                        continue;
                    }
                    if let Err(e) = self.on_track_finished(track, hooks) {
                        self.report("track finished", &e);
                    }
                }
            }
        }
    }

    fn on_track_finished(&mut self, track: u16, hooks: bool) -> Result<()> {
        if self.engine.is_duplicate(track) {
            debug!(track, "Duplicate track-finished notification");
            return Ok(());
        }
        debug!(track, "Track finished");
        if hooks
            && self
                .with_modifier(|m, cx| m.on_advance_request(Some(track), cx))?
                .is_handled()
        {
            return Ok(());
        }
        self.with_engine(|engine, io| engine.advance(track, io))?;
        Ok(())
    }

    // ===== Buttons =====

    fn handle_button(&mut self, event: ButtonEvent) -> Result<()> {
        debug!(?event, "Button");
        let invert = self.settings.invert_volume_buttons;
        match event {
            ButtonEvent::Chord => self.enter_admin_from_buttons(),
            ButtonEvent::Tap(Button::Pause) => {
                self.toggle_pause();
                Ok(())
            }
            ButtonEvent::LongPress(Button::Pause) => self.pause_long_press(),
            ButtonEvent::Tap(Button::Up) => {
                if invert {
                    self.change_volume(Step::Up);
                    Ok(())
                } else {
                    self.next()
                }
            }
            ButtonEvent::Tap(Button::Down) => {
                if invert {
                    self.change_volume(Step::Down);
                    Ok(())
                } else {
                    self.previous()
                }
            }
            ButtonEvent::LongPress(button @ (Button::Up | Button::Down)) => {
                if !self.devices.audio.is_busy() {
                    let slot = if button == Button::Up { 1 } else { 2 };
                    return self.play_shortcut(slot);
                }
                self.long_action(button, invert)
            }
            ButtonEvent::Repeat(button @ (Button::Up | Button::Down)) => {
                // only volume repeats
                if !invert && self.devices.audio.is_busy() {
                    self.long_action(button, invert)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn long_action(&mut self, button: Button, invert: bool) -> Result<()> {
        match (button, invert) {
            (Button::Up, false) => self.change_volume(Step::Up),
            (Button::Down, false) => self.change_volume(Step::Down),
            (Button::Up, true) => return self.next(),
            (Button::Down, true) => return self.previous(),
            (Button::Pause, _) => {}
        }
        Ok(())
    }

    fn toggle_pause(&mut self) {
        if self.with_modifier(|m, cx| m.on_pause(cx)).is_handled() {
            return;
        }
        let now_ms = self.devices.clock.now_ms();
        if self.devices.audio.is_busy() {
            info!("Pause");
            self.devices.audio.pause();
            self.engine.arm_standby(now_ms);
        } else if self.engine.is_known() {
            info!("Resume");
            self.devices.audio.resume();
            self.engine.disarm_standby();
        }
    }

    fn pause_long_press(&mut self) -> Result<()> {
        if self.with_modifier(|m, cx| m.on_pause(cx)).is_handled() {
            return Ok(());
        }
        if self.devices.audio.is_busy() {
            let position = self.engine.announced_position();
            debug!(position, "Announcing track number");
            self.devices.audio.play_advert(u16::from(position));
            Ok(())
        } else {
            self.play_shortcut(0)
        }
    }

    fn next(&mut self) -> Result<()> {
        if self.with_modifier(|m, cx| m.on_next_button(cx)).is_handled() {
            return Ok(());
        }
        if self
            .with_modifier(|m, cx| m.on_advance_request(None, cx))?
            .is_handled()
        {
            return Ok(());
        }
        self.with_engine(|engine, io| engine.skip_forward(io))?;
        Ok(())
    }

    fn previous(&mut self) -> Result<()> {
        if self.with_modifier(|m, cx| m.on_previous_button(cx)).is_handled() {
            return Ok(());
        }
        match self.with_engine(|engine, io| engine.rewind(io)) {
            Err(PlaybackError::NoSelection) => Ok(()),
            other => other.map_err(Into::into),
        }
    }

    fn change_volume(&mut self, step: Step) {
        let target = match step {
            Step::Up => self.volume.peek_up(),
            Step::Down => self.volume.peek_down(),
        };
        let handling = self.with_modifier(|m, cx| match step {
            Step::Up => m.on_volume_up(target, cx),
            Step::Down => m.on_volume_down(target, cx),
        });
        if handling.is_handled() {
            return;
        }
        let changed = match step {
            Step::Up => self.volume.increase(),
            Step::Down => self.volume.decrease(),
        };
        if let Some(level) = changed {
            debug!(level, "Volume");
            self.devices.audio.set_volume(level);
        }
    }

    /// Play shortcut `slot` (0-based) if it is set
    fn play_shortcut(&mut self, slot: usize) -> Result<()> {
        let Some(setting) = self.settings.shortcuts.get(slot).copied().flatten() else {
            debug!(slot, "Shortcut not set");
            return Ok(());
        };
        info!(slot = slot + 1, folder = setting.folder, "Playing shortcut");
        self.select(setting)
    }

    fn enter_admin_from_buttons(&mut self) -> Result<()> {
        self.devices.audio.pause();
        self.wait_for_release()?;
        self.run_admin_menu(AdminEntry::Buttons)
    }

    // ===== Tags =====

    fn handle_card(&mut self, card: &CardId) -> Result<()> {
        let tag = tag::read_tag(self.devices.reader.as_mut(), card)?;

        if !tag.is_known() {
            info!(card = %card, "Unknown tag, starting provisioning");
            self.engine.disarm_standby();
            self.engine.mark_unknown();
            let result = self.provision_new_tag(card);

            let now_ms = self.now_ms();
            self.engine.arm_standby(now_ms);
            return result;
        }

        match tag.content() {
            TagContent::Modifier(modifier) => {
                self.toggle_modifier(modifier);
                Ok(())
            }
            TagContent::AdminMenu => self.run_admin_menu(AdminEntry::Card),
            TagContent::Folder(setting) => {
                if self
                    .with_modifier(|m, cx| m.on_tag_read(setting, cx))
                    .is_handled()
                {
                    return Ok(());
                }
                self.select(setting)
            }
            TagContent::Unassigned => {
                warn!(card = %card, setting = ?tag.setting, "Tag carries no playable setting");
                Ok(())
            }
        }
    }

    /// Same kind toggles off, another kind replaces
    fn toggle_modifier(&mut self, card: ModifierCard) {
        if self.modifier.kind() == Some(card.kind()) {
            info!(kind = ?card.kind(), "Modifier removed");
            self.modifier = Modifier::None;
            self.devices.audio.play_advert(self.announcements.modifier_off);
            return;
        }
        self.devices.audio.play_advert(self.announcements.modifier_on);
        self.modifier = self.with_modifier(|_, cx| Modifier::activate(card, cx));
    }

    pub(crate) fn select(&mut self, setting: FolderSetting) -> Result<()> {
        if let Err(e) = self.with_engine(|engine, io| engine.select_folder(setting, io)) {
            // the failure announcement replaces whatever was playing
            let now_ms = self.now_ms();
            self.engine.arm_standby(now_ms);
            return Err(e.into());
        }
        Ok(())
    }

    // ===== Helpers =====

    pub(crate) fn now_ms(&self) -> u64 {
        self.devices.clock.now_ms()
    }

    /// Run `f` with the engine and the peripherals it borrows
    pub(crate) fn with_engine<R>(
        &mut self,
        f: impl FnOnce(&mut PlaybackEngine, &mut EngineIo<'_>) -> R,
    ) -> R {
        let now_ms = self.devices.clock.now_ms();
        let mut io = EngineIo {
            audio: self.devices.audio.as_mut(),
            storage: self.devices.storage.as_mut(),
            rng: &mut self.rng,
            now_ms,
        };
        f(&mut self.engine, &mut io)
    }

    /// Run `f` with the active modifier and its hook context
    fn with_modifier<R>(&mut self, f: impl FnOnce(&mut Modifier, &mut ModifierCx<'_>) -> R) -> R {
        let now_ms = self.devices.clock.now_ms();
        let mut cx = ModifierCx {
            engine: &mut self.engine,
            audio: self.devices.audio.as_mut(),
            storage: self.devices.storage.as_mut(),
            rng: &mut self.rng,
            announcements: &self.announcements,
            now_ms,
        };
        f(&mut self.modifier, &mut cx)
    }

    /// Log an error and tell the operator
    pub(crate) fn report(&mut self, context: &str, err: &ControlError) {
        match err.class() {
            ErrorClass::UserAbort => {
                info!(context, "Aborted: {}", err);
                self.devices.audio.play_announcement(self.announcements.aborted);
            }
            ErrorClass::PeripheralFailure | ErrorClass::InvalidChoice => {
                warn!(context, "{}", err);
                self.devices.audio.play_announcement(self.announcements.failed);
            }
            ErrorClass::ProtocolMismatch => warn!(context, "{}", err),
        }
    }
}
