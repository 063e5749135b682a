//! Admin menu and tag provisioning
//!
//! Options (announced at `admin_menu + n`):
//!  1 reset tag, 2 max volume, 3 min volume, 4 initial volume, 5 EQ,
//!  6 modifier tag, 7 shortcut, 8 standby timer, 9 batch provisioning,
//! 10 invert volume buttons, 11 factory reset, 12 admin lock.
//!
//! A pass works on a copy of the settings; only a completed pass is
//! applied and persisted.

use tagplay_core::settings::{self, VOLUME_CEILING};
use tagplay_core::tag::{self, Tag};
use tagplay_core::types::{ADMIN_MODE_CODE, MAX_FOLDER, TIMER_CHOICES_MINUTES};
use tagplay_core::{
    AdminLock, CardId, FolderSetting, ModifierCard, ModifierKind, PlayMode, Settings, TagContent,
    TagplayError,
};
use tracing::{debug, info, warn};

use crate::controller::{AdminEntry, Controller};
use crate::error::Result;
use crate::menu::{CalcChallenge, CalcOp, Preview, Prompt, CALC_ANSWER_CEILING};

const ADMIN_OPTIONS: u8 = 12;

impl Controller {
    /// Run one pass of the admin menu
    ///
    /// Entry through the buttons goes through the configured lock gate;
    /// entry through the admin tag skips it.
    pub fn run_admin_menu(&mut self, entry: AdminEntry) -> Result<()> {
        info!(?entry, "Entering admin menu");
        self.devices.audio.pause();
        self.engine.disarm_standby();
        self.engine.mark_unknown();

        let result = self.admin_pass(entry);

        let now_ms = self.now_ms();
        self.engine.arm_standby(now_ms);
        result
    }

    fn admin_pass(&mut self, entry: AdminEntry) -> Result<()> {
        if entry == AdminEntry::Buttons {
            self.check_admin_lock()?;
        }

        let option = self
            .choose(&Prompt::menu(self.announcements.admin_menu, ADMIN_OPTIONS))?
            .required()?;
        debug!(option, "Admin option");

        let mut updated = self.settings.clone();
        match option {
            1 => {
                self.devices
                    .audio
                    .play_announcement(self.announcements.place_tag);
                let card = self.wait_for_card()?;
                self.provision_tag(&card)?;
            }
            2 => {
                let prompt = Prompt::numbers(
                    self.announcements.max_volume_prompt,
                    updated.min_volume + 1,
                    VOLUME_CEILING,
                )
                .with_default(updated.max_volume);
                updated.max_volume = self.choose(&prompt)?.required()?;
            }
            3 => {
                let prompt = Prompt::numbers(
                    self.announcements.min_volume_prompt,
                    1,
                    updated.max_volume - 1,
                )
                .with_default(updated.min_volume);
                updated.min_volume = self.choose(&prompt)?.required()?;
            }
            4 => {
                let prompt = Prompt::numbers(
                    self.announcements.initial_volume_prompt,
                    updated.min_volume,
                    updated.max_volume,
                )
                .with_default(updated.initial_volume);
                updated.initial_volume = self.choose(&prompt)?.required()?;
            }
            5 => {
                let eq = self
                    .choose(&Prompt::menu(self.announcements.eq_menu, 6))?
                    .required()?;
                self.devices.audio.set_eq(eq - 1);
                updated.eq = eq;
            }
            6 => self.create_modifier_tag()?,
            7 => {
                let slot = self
                    .choose(&Prompt::menu(self.announcements.shortcut_menu, 4))?
                    .required()?;
                match self.setup_folder()? {
                    TagContent::Folder(setting) => {
                        updated.shortcuts[usize::from(slot - 1)] = Some(setting);
                    }
                    _ => {
                        return Err(TagplayError::invalid_choice("shortcut needs a folder").into())
                    }
                }
            }
            8 => {
                let choice = self
                    .choose(&Prompt::menu(self.announcements.timer_menu, 5))?
                    .required()?;
                updated.standby_minutes = TIMER_CHOICES_MINUTES
                    .get(usize::from(choice - 1))
                    .map_or(0, |minutes| u32::from(*minutes));
            }
            9 => self.batch_provision()?,
            10 => {
                let choice = self
                    .choose(&Prompt::menu(self.announcements.invert_menu, 2))?
                    .required()?;
                updated.invert_volume_buttons = choice == 2;
            }
            11 => {
                info!("Factory reset from admin menu");
                updated.reset();
                self.devices
                    .audio
                    .play_announcement(self.announcements.reset_done);
            }
            12 => {
                let choice = self
                    .choose(&Prompt::menu(self.announcements.lock_menu, 4))?
                    .required()?;
                updated.admin_lock = match choice {
                    1 => AdminLock::None,
                    2 => AdminLock::Card,
                    3 => {
                        updated.lock_sequence = self.ask_sequence()?;
                        AdminLock::Sequence
                    }
                    _ => AdminLock::Calc,
                };
            }
            _ => return Err(TagplayError::invalid_choice(format!("admin option {}", option)).into()),
        }

        self.apply_settings(updated);
        Ok(())
    }

    /// Gate in front of the button-entered admin menu
    fn check_admin_lock(&mut self) -> Result<()> {
        match self.settings.admin_lock {
            AdminLock::None => Ok(()),
            AdminLock::Card => {
                Err(TagplayError::invalid_choice("admin menu requires the admin tag").into())
            }
            AdminLock::Sequence => {
                let entered = self.ask_sequence()?;
                if entered == self.settings.lock_sequence {
                    Ok(())
                } else {
                    Err(TagplayError::invalid_choice("wrong lock sequence").into())
                }
            }
            AdminLock::Calc => {
                let challenge = CalcChallenge::generate(&mut self.rng);
                debug!(?challenge, "Calc lock");
                let operator = match challenge.op {
                    CalcOp::Add => self.announcements.calc_plus,
                    CalcOp::Sub => self.announcements.calc_minus,
                };
                for index in [
                    self.announcements.calc_intro,
                    u16::from(challenge.a),
                    operator,
                    u16::from(challenge.b),
                ] {
                    self.devices.audio.play_announcement(index);
                    self.wait_until_idle()?;
                }

                let prompt =
                    Prompt::numbers(self.announcements.calc_intro, 1, CALC_ANSWER_CEILING)
                        .without_intro();
                let answer = self.choose(&prompt)?.required()?;
                if answer == challenge.answer() {
                    Ok(())
                } else {
                    Err(TagplayError::invalid_choice("wrong calc answer").into())
                }
            }
        }
    }

    /// Adopt settings from a completed admin pass
    fn apply_settings(&mut self, mut updated: Settings) {
        updated.sanitize();
        self.volume
            .set_bounds(updated.min_volume, updated.max_volume);
        self.devices.audio.set_volume(self.volume.level());
        self.devices.audio.set_eq(updated.eq - 1);
        self.engine.set_standby_minutes(updated.standby_minutes);
        self.settings = updated;

        if !self.persistable {
            debug!("Settings kept in memory only");
            return;
        }
        match settings::save(self.devices.storage.as_mut(), &self.settings) {
            Ok(()) => info!("Settings saved"),
            Err(e) => warn!("Failed to write settings: {}", e),
        }
    }

    // ===== Provisioning =====

    /// Announce a blank tag, then provision it
    pub(crate) fn provision_new_tag(&mut self, card: &CardId) -> Result<()> {
        self.devices.audio.play_announcement(self.announcements.new_tag);
        self.wait_until_idle()?;
        self.provision_tag(card)
    }

    /// Configure a fresh tag and write it
    pub(crate) fn provision_tag(&mut self, card: &CardId) -> Result<()> {
        self.devices.audio.pause();
        let content = self.setup_folder()?;
        self.devices.audio.pause();
        self.wait_until_idle()?;
        self.write_content(card, content)
    }

    /// Ask for a folder, a mode and the mode's parameters
    pub(crate) fn setup_folder(&mut self) -> Result<TagContent> {
        let folder = self
            .choose(
                &Prompt::numbers(self.announcements.folder_prompt, 1, MAX_FOLDER)
                    .with_preview(Preview::FolderStart),
            )?
            .required()?;

        let mode = self
            .choose(&Prompt::menu(self.announcements.mode_menu, 9))?
            .required()?;
        if mode == ADMIN_MODE_CODE {
            return Ok(TagContent::AdminMenu);
        }

        let tracks = self.track_count(folder);
        let (param_a, param_b) = match mode {
            4 => {
                let prompt = Prompt::numbers(self.announcements.single_track_prompt, 1, tracks)
                    .with_preview(Preview::TrackOf(folder));
                (self.choose(&prompt)?.required()?, 0)
            }
            7..=9 => self.choose_range(folder, tracks)?,
            _ => (0, 0),
        };

        let mode = PlayMode::from_raw(mode, param_a, param_b).ok_or_else(|| {
            TagplayError::invalid_choice(format!("mode {} with {}/{}", mode, param_a, param_b))
        })?;
        Ok(TagContent::Folder(FolderSetting::new(folder, mode)))
    }

    /// Ask for `from`, then for `to` with `from` as the new floor
    fn choose_range(&mut self, folder: u8, tracks: u8) -> Result<(u8, u8)> {
        let from = self
            .choose(
                &Prompt::numbers(self.announcements.from_track_prompt, 1, tracks)
                    .with_preview(Preview::TrackOf(folder)),
            )?
            .required()?;
        let to = self
            .choose(
                &Prompt::numbers(self.announcements.to_track_prompt, from, tracks)
                    .with_default(from)
                    .with_preview(Preview::TrackOf(folder)),
            )?
            .required()?;
        Ok((from, to))
    }

    fn create_modifier_tag(&mut self) -> Result<()> {
        let code = self
            .choose(&Prompt::menu(
                self.announcements.modifier_menu,
                ModifierKind::ALL.len() as u8,
            ))?
            .required()?;

        let card = if ModifierKind::from_code(code) == Some(ModifierKind::SleepTimer) {
            let choice = self
                .choose(&Prompt::menu(
                    self.announcements.timer_menu,
                    TIMER_CHOICES_MINUTES.len() as u8,
                ))?
                .required()?;
            let minutes = TIMER_CHOICES_MINUTES
                .get(usize::from(choice - 1))
                .copied()
                .unwrap_or(TIMER_CHOICES_MINUTES[0]);
            ModifierCard::SleepTimer { minutes }
        } else {
            ModifierCard::from_raw(code, 0)
                .ok_or_else(|| TagplayError::invalid_choice(format!("modifier {}", code)))?
        };

        self.devices
            .audio
            .play_announcement(self.announcements.place_tag);
        let target = self.wait_for_card()?;
        self.write_content(&target, TagContent::Modifier(card))
    }

    /// Write one single-track tag per track of a folder range
    fn batch_provision(&mut self) -> Result<()> {
        self.devices
            .audio
            .play_announcement(self.announcements.batch_intro);
        self.wait_until_idle()?;

        let folder = self
            .choose(
                &Prompt::numbers(self.announcements.folder_prompt, 1, MAX_FOLDER)
                    .with_preview(Preview::FolderStart),
            )?
            .required()?;
        let tracks = self.track_count(folder);
        let (from, to) = self.choose_range(folder, tracks)?;
        info!(folder, from, to, "Batch provisioning");

        for track in from..=to {
            self.devices.audio.pause();
            self.devices.audio.play_announcement(u16::from(track));
            let card = self.wait_for_card()?;
            let setting = FolderSetting::new(folder, PlayMode::TrackInFolder { track });
            self.write_content(&card, TagContent::Folder(setting))?;
        }
        Ok(())
    }

    fn write_content(&mut self, card: &CardId, content: TagContent) -> Result<()> {
        tag::write_tag(self.devices.reader.as_mut(), card, &Tag::new(&content))?;
        info!(card = %card, ?content, "Tag written");
        self.devices.audio.play_announcement(self.announcements.ok);
        Ok(())
    }

    /// Tracks in `folder`, at least 1 so a choice can be offered
    fn track_count(&mut self, folder: u8) -> u8 {
        self.devices
            .audio
            .folder_track_count(folder)
            .clamp(1, u16::from(u8::MAX)) as u8
    }
}
