//! Admin menu, lock gates and tag provisioning

mod common;

use common::{Bench, Cmd, SEED};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tagplay_control::{CalcChallenge, CalcOp, TickOutcome};
use tagplay_core::{
    AdminLock, Button, FolderSetting, LockSymbol, ModifierCard, PlayMode, Settings, TagContent,
};

/// Highlight `value` with Up taps and confirm; returns the end time
fn pick(bench: &Bench, value: usize, at: u64) -> u64 {
    let t = bench.taps(Button::Up, value, at);
    bench.tap(Button::Pause, t)
}

fn with_lock(lock: AdminLock) -> Settings {
    let mut settings = Settings::default();
    settings.admin_lock = lock;
    settings
}

fn position(log: &[Cmd], cmd: Cmd) -> Option<usize> {
    log.iter().position(|c| *c == cmd)
}

#[test]
fn unknown_tag_is_provisioned() {
    let bench = Bench::new(&[(3, 8)]);
    let blank = bench.blank_card(9);
    let mut controller = bench.boot();

    bench.present(&blank, 100);
    let t = pick(&bench, 3, 300);
    let t = pick(&bench, 2, t);
    bench.run(&mut controller, t + 500);

    let tag = bench.tag_on(&blank).unwrap();
    assert!(tag.is_known());
    assert_eq!(
        tag.content(),
        TagContent::Folder(FolderSetting::new(3, PlayMode::TracksInFolder))
    );
    let log = bench.log();
    assert!(position(&log, Cmd::Announcement(300)) < position(&log, Cmd::Announcement(301)));
    assert_eq!(log.iter().filter(|c| **c == Cmd::Announcement(400)).count(), 1);
    assert!(!controller.engine().is_known());
}

#[test]
fn provisioning_asks_for_range_bounds() {
    let bench = Bench::new(&[(3, 8)]);
    let blank = bench.blank_card(9);
    let mut controller = bench.boot();

    bench.present(&blank, 100);
    let t = pick(&bench, 3, 300);
    // mode 8: ordered range
    let t = pick(&bench, 8, t);
    let t = pick(&bench, 2, t);
    // the second bound starts at the first
    let t = pick(&bench, 4, t);
    bench.run(&mut controller, t + 500);

    let content = bench.tag_on(&blank).unwrap().content();
    let TagContent::Folder(setting) = content else {
        panic!("expected a folder tag, got {:?}", content);
    };
    let range = setting.mode.range().unwrap();
    assert_eq!((range.first(), range.last()), (2, 5));
}

#[test]
fn aborted_provisioning_leaves_tag_blank() {
    let bench = Bench::new(&[(3, 8)]);
    let blank = bench.blank_card(9);
    let mut controller = bench.boot();

    bench.present(&blank, 100);
    let t = bench.hold(Button::Pause, 300, 1_200);
    bench.run(&mut controller, t);

    assert!(bench.tag_on(&blank).is_none());
    assert_eq!(bench.last(), Some(Cmd::Announcement(802)));
}

#[test]
fn blank_tag_replaces_playing_track_and_rearms_standby() {
    let bench = Bench::new(&[(3, 8), (5, 10)]);
    let mut settings = Settings::default();
    settings.standby_minutes = 5;
    bench.store_settings(&settings);
    let album = bench.card(
        1,
        TagContent::Folder(FolderSetting::new(5, PlayMode::TracksInFolder)),
    );
    let blank = bench.blank_card(9);
    let mut controller = bench.boot();

    bench.present(&album, 100);
    bench.run(&mut controller, 200);
    assert!(bench.world.borrow().busy);

    bench.present(&blank, 300);
    let t = bench.hold(Button::Pause, 500, 1_200);
    bench.run(&mut controller, t);

    assert_eq!(bench.last(), Some(Cmd::Announcement(802)));
    assert!(!bench.world.borrow().busy);
    assert!(controller.engine().standby().is_armed());
    assert_eq!(
        bench.run(&mut controller, 20 * 60_000),
        TickOutcome::PoweredDown
    );
}

#[test]
fn failed_write_is_reported() {
    let bench = Bench::new(&[(3, 8)]);
    let blank = bench.blank_card(9);
    bench.world.borrow_mut().fail_writes = true;
    let mut controller = bench.boot();

    bench.present(&blank, 100);
    let t = pick(&bench, 1, 300);
    let t = pick(&bench, 2, t);
    bench.run(&mut controller, t + 500);

    assert!(bench.tag_on(&blank).is_none());
    assert_eq!(bench.last(), Some(Cmd::Announcement(401)));
}

#[test]
fn admin_tag_skips_lock_and_saves_invert_choice() {
    let bench = Bench::new(&[]);
    bench.store_settings(&with_lock(AdminLock::Card));
    let admin = bench.card(1, TagContent::AdminMenu);
    let mut controller = bench.boot();

    bench.present(&admin, 100);
    let t = pick(&bench, 10, 300);
    let t = pick(&bench, 1, t);
    bench.run(&mut controller, t + 500);

    assert!(bench.log().contains(&Cmd::Announcement(910)));
    assert!(!controller.settings().invert_volume_buttons);
    let stored = bench.stored_settings();
    assert!(!stored.invert_volume_buttons);
    assert_eq!(stored.admin_lock, AdminLock::Card);
}

#[test]
fn chord_opens_menu_and_sets_initial_volume() {
    let bench = Bench::new(&[]);
    let mut controller = bench.boot();

    let t = bench.chord(100);
    let t = pick(&bench, 4, t + 100);
    let t = pick(&bench, 3, t);
    bench.run(&mut controller, t + 500);

    assert_eq!(controller.settings().initial_volume, 7);
    assert_eq!(bench.stored_settings().initial_volume, 7);
}

#[test]
fn card_lock_rejects_chord() {
    let bench = Bench::new(&[]);
    bench.store_settings(&with_lock(AdminLock::Card));
    let mut controller = bench.boot();

    let t = bench.chord(100);
    bench.run(&mut controller, t + 500);

    let log = bench.log();
    assert!(log.contains(&Cmd::Announcement(401)));
    assert!(!log.contains(&Cmd::Announcement(900)));
}

fn sequence_lock() -> Settings {
    let mut settings = with_lock(AdminLock::Sequence);
    settings.lock_sequence = [
        LockSymbol::Up,
        LockSymbol::Down,
        LockSymbol::Pause,
        LockSymbol::Up,
    ];
    settings
}

#[test]
fn sequence_lock_opens_on_match_and_abort_keeps_settings() {
    let bench = Bench::new(&[]);
    let settings = sequence_lock();
    bench.store_settings(&settings);
    let mut controller = bench.boot();

    let t = bench.chord(100);
    let t = bench.tap(Button::Up, t + 100);
    let t = bench.tap(Button::Down, t);
    let t = bench.tap(Button::Pause, t);
    let t = bench.tap(Button::Up, t);
    let t = bench.hold(Button::Pause, t + 100, 1_200);
    bench.run(&mut controller, t + 500);

    let log = bench.log();
    assert!(position(&log, Cmd::Announcement(991)) < position(&log, Cmd::Announcement(900)));
    assert_eq!(bench.last(), Some(Cmd::Announcement(802)));
    assert_eq!(*controller.settings(), settings);
    assert_eq!(bench.stored_settings(), settings);
}

#[test]
fn wrong_sequence_is_rejected() {
    let bench = Bench::new(&[]);
    bench.store_settings(&sequence_lock());
    let mut controller = bench.boot();

    let t = bench.chord(100);
    let t = bench.taps(Button::Up, 4, t + 100);
    bench.run(&mut controller, t + 500);

    let log = bench.log();
    assert!(!log.contains(&Cmd::Announcement(900)));
    assert_eq!(bench.last(), Some(Cmd::Announcement(401)));
}

#[test]
fn calc_lock_accepts_correct_answer() {
    let bench = Bench::new(&[]);
    bench.store_settings(&with_lock(AdminLock::Calc));
    let challenge = CalcChallenge::generate(&mut StdRng::seed_from_u64(SEED));
    let mut controller = bench.boot();

    let t = bench.chord(100);
    let t = pick(&bench, usize::from(challenge.answer()), t + 100);
    let t = bench.hold(Button::Pause, t + 100, 1_200);
    bench.run(&mut controller, t + 500);

    let log = bench.log();
    let intro = position(&log, Cmd::Announcement(992)).unwrap();
    let operator = match challenge.op {
        CalcOp::Add => 993,
        CalcOp::Sub => 994,
    };
    assert_eq!(
        &log[intro + 1..intro + 4],
        &[
            Cmd::Announcement(u16::from(challenge.a)),
            Cmd::Announcement(operator),
            Cmd::Announcement(u16::from(challenge.b)),
        ]
    );
    assert!(log.contains(&Cmd::Announcement(900)));
    assert_eq!(bench.last(), Some(Cmd::Announcement(802)));
}

#[test]
fn calc_lock_rejects_wrong_answer() {
    let bench = Bench::new(&[]);
    bench.store_settings(&with_lock(AdminLock::Calc));
    let challenge = CalcChallenge::generate(&mut StdRng::seed_from_u64(SEED));
    let mut controller = bench.boot();

    let answer = usize::from(challenge.answer());
    let wrong = if answer > 1 { answer - 1 } else { answer + 1 };
    let t = bench.chord(100);
    let t = pick(&bench, wrong, t + 100);
    bench.run(&mut controller, t + 500);

    assert!(!bench.log().contains(&Cmd::Announcement(900)));
    assert_eq!(bench.last(), Some(Cmd::Announcement(401)));
}

#[test]
fn modifier_tag_is_written() {
    let bench = Bench::new(&[]);
    let admin = bench.card(1, TagContent::AdminMenu);
    let blank = bench.blank_card(2);
    let mut controller = bench.boot();

    bench.present(&admin, 100);
    let t = pick(&bench, 6, 300);
    let t = pick(&bench, 3, t);
    bench.present(&blank, t + 200);
    bench.run(&mut controller, t + 500);

    assert_eq!(
        bench.tag_on(&blank).unwrap().content(),
        TagContent::Modifier(ModifierCard::Locked)
    );
    assert!(bench.log().contains(&Cmd::Announcement(800)));
}

#[test]
fn batch_provisioning_writes_one_tag_per_track() {
    let bench = Bench::new(&[(3, 8)]);
    let admin = bench.card(1, TagContent::AdminMenu);
    let first = bench.blank_card(2);
    let second = bench.blank_card(3);
    let mut controller = bench.boot();

    bench.present(&admin, 100);
    let t = pick(&bench, 9, 300);
    let t = pick(&bench, 3, t);
    let t = pick(&bench, 2, t);
    let t = pick(&bench, 2, t);
    bench.present(&first, t + 200);
    bench.present(&second, t + 400);
    bench.run(&mut controller, t + 800);

    let track_of = |card| match bench.tag_on(card).unwrap().content() {
        TagContent::Folder(FolderSetting {
            folder: 3,
            mode: PlayMode::TrackInFolder { track },
        }) => track,
        other => panic!("unexpected content {:?}", other),
    };
    assert_eq!(track_of(&first), 2);
    assert_eq!(track_of(&second), 3);
}

#[test]
fn factory_reset_option_restores_defaults() {
    let bench = Bench::new(&[]);
    let mut settings = with_lock(AdminLock::Card);
    settings.max_volume = 20;
    bench.store_settings(&settings);
    let admin = bench.card(1, TagContent::AdminMenu);
    let mut controller = bench.boot();

    bench.present(&admin, 100);
    let t = pick(&bench, 11, 300);
    bench.run(&mut controller, t + 500);

    assert!(bench.log().contains(&Cmd::Announcement(999)));
    assert_eq!(*controller.settings(), Settings::default());
    assert_eq!(bench.stored_settings(), Settings::default());
}

#[test]
fn waiting_for_a_tag_times_out() {
    let bench = Bench::new(&[]);
    let admin = bench.card(1, TagContent::AdminMenu);
    let mut controller = bench.boot();

    bench.present(&admin, 100);
    let t = pick(&bench, 1, 300);
    bench.run(&mut controller, t + 31_000);

    let log = bench.log();
    assert!(log.contains(&Cmd::Announcement(800)));
    assert_eq!(bench.last(), Some(Cmd::Announcement(802)));
}
