//! Blocking waits
//!
//! Menus and provisioning block the control loop until the operator acts.
//! Each wait is a cooperative polling loop: sleep one poll interval on the
//! injected clock, drain audio notifications, sample the buttons and check
//! the configured upper bound. Running out of time is reported as
//! `TagplayError::Timeout`, which callers treat like an abort.

use tagplay_core::settings::LockSymbol;
use tagplay_core::{Button, CardId, TagplayError};
use tracing::debug;

use crate::buttons::ButtonEvent;
use crate::controller::Controller;
use crate::error::Result;
use crate::menu::{Choice, ChoiceStep, Preview, Prompt};

/// Number of symbols in an admin lock sequence
pub const SEQUENCE_LEN: usize = 4;

impl Controller {
    /// One polling step; returns the gestures recognized during it
    pub(crate) fn pump(&mut self) -> Vec<ButtonEvent> {
        self.devices.clock.sleep_ms(self.config.poll_interval_ms);
        self.drain_audio_events(false);
        let now_ms = self.now_ms();
        self.devices.buttons.read(now_ms);
        self.dispatcher.poll(self.devices.buttons.as_ref(), now_ms)
    }

    fn check_deadline(&self, since_ms: u64, what: &'static str) -> Result<()> {
        if let Some(max) = self.config.max_wait_ms {
            if self.now_ms().saturating_sub(since_ms) >= max {
                debug!(what, max, "Wait timed out");
                return Err(TagplayError::Timeout(what).into());
            }
        }
        Ok(())
    }

    /// Block until the audio module stops playing
    pub(crate) fn wait_until_idle(&mut self) -> Result<()> {
        let start = self.now_ms();
        while self.devices.audio.is_busy() {
            self.pump();
            self.check_deadline(start, "audio idle")?;
        }
        Ok(())
    }

    /// Block until no button is held
    pub(crate) fn wait_for_release(&mut self) -> Result<()> {
        let start = self.now_ms();
        while Button::ALL.iter().any(|b| self.devices.buttons.is_down(*b)) {
            self.pump();
            self.check_deadline(start, "button release")?;
        }
        Ok(())
    }

    /// Block until a card is presented; a long Pause press aborts
    pub(crate) fn wait_for_card(&mut self) -> Result<CardId> {
        let start = self.now_ms();
        loop {
            if self
                .pump()
                .contains(&ButtonEvent::LongPress(Button::Pause))
            {
                return Err(TagplayError::UserAbort.into());
            }
            if let Some(card) = self.devices.reader.poll_card() {
                debug!(card = %card, "Card presented");
                return Ok(card);
            }
            self.check_deadline(start, "tag")?;
        }
    }

    /// Run a bounded choice until it is confirmed or aborted
    ///
    /// The time bound restarts with every gesture that changes the
    /// highlight.
    pub(crate) fn choose(&mut self, prompt: &Prompt) -> Result<Choice> {
        if let Some(intro) = prompt.intro {
            self.devices.audio.play_announcement(intro);
        }
        let mut choice = prompt.choice();
        let mut since = self.now_ms();
        let mut preview: Option<(u64, u8)> = None;

        loop {
            for event in self.pump() {
                match choice.apply(event) {
                    ChoiceStep::Idle => {}
                    ChoiceStep::Highlighted(value) => {
                        self.devices
                            .audio
                            .play_announcement(prompt.announcement(value));
                        since = self.now_ms();
                        preview = (prompt.preview != Preview::None)
                            .then_some((since + self.config.announcement_gap_ms, value));
                    }
                    ChoiceStep::Confirmed(value) => {
                        debug!(value, "Choice confirmed");
                        return Ok(Choice {
                            value,
                            aborted: false,
                        });
                    }
                    ChoiceStep::Aborted(value) => {
                        debug!(value, "Choice aborted");
                        return Ok(Choice {
                            value,
                            aborted: true,
                        });
                    }
                }
            }

            if let Some((due, value)) = preview {
                if self.now_ms() >= due {
                    preview = None;
                    match prompt.preview {
                        Preview::FolderStart => self.devices.audio.play_folder_track(value, 1),
                        Preview::TrackOf(folder) => {
                            self.devices.audio.play_folder_track(folder, value);
                        }
                        Preview::None => {}
                    }
                }
            }

            self.check_deadline(since, "choice")?;
        }
    }

    /// Collect a lock sequence of Pause/Up/Down taps
    pub(crate) fn ask_sequence(&mut self) -> Result<[LockSymbol; SEQUENCE_LEN]> {
        self.devices
            .audio
            .play_announcement(self.announcements.enter_sequence);
        let mut symbols = Vec::with_capacity(SEQUENCE_LEN);
        let mut since = self.now_ms();

        while symbols.len() < SEQUENCE_LEN {
            for event in self.pump() {
                let symbol = match event {
                    ButtonEvent::Tap(Button::Pause) => LockSymbol::Pause,
                    ButtonEvent::Tap(Button::Up) => LockSymbol::Up,
                    ButtonEvent::Tap(Button::Down) => LockSymbol::Down,
                    ButtonEvent::LongPress(Button::Pause) => {
                        return Err(TagplayError::UserAbort.into())
                    }
                    _ => continue,
                };
                symbols.push(symbol);
                since = self.now_ms();
                if symbols.len() == SEQUENCE_LEN {
                    break;
                }
            }
            self.check_deadline(since, "lock sequence")?;
        }

        let mut sequence = [LockSymbol::Pause; SEQUENCE_LEN];
        sequence.copy_from_slice(&symbols);
        Ok(sequence)
    }
}
