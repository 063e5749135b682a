//! Button gesture recognition
//!
//! Turns the sampled state of the three buttons into discrete gestures:
//! - `Tap`: released before the long-press threshold
//! - `LongPress`: threshold reached (fires once per press)
//! - `Repeat`: still held, once every repeat interval after `LongPress`
//! - `LongRelease`: released after a long press (never also a `Tap`)
//! - `Chord`: all three buttons held; every other gesture is suppressed
//!   until all buttons are up again

use serde::{Deserialize, Serialize};
use tagplay_core::{Button, ButtonPanel};

/// A recognized button gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonEvent {
    Tap(Button),
    LongPress(Button),
    Repeat(Button),
    LongRelease(Button),
    Chord,
}

#[derive(Debug, Clone, Copy, Default)]
struct Hold {
    long_fired: bool,
    next_repeat: u64,
}

/// Per-button gesture state
#[derive(Debug, Clone)]
pub struct ButtonDispatcher {
    long_press_ms: u64,
    repeat_interval_ms: u64,
    holds: [Hold; 3],
    suppressed: bool,
}

fn slot(button: Button) -> usize {
    match button {
        Button::Pause => 0,
        Button::Up => 1,
        Button::Down => 2,
    }
}

impl ButtonDispatcher {
    pub fn new(long_press_ms: u64, repeat_interval_ms: u64) -> Self {
        Self {
            long_press_ms,
            repeat_interval_ms: repeat_interval_ms.max(1),
            holds: [Hold::default(); 3],
            suppressed: false,
        }
    }

    /// Ignore everything until all buttons have been released
    pub fn suppress_until_released(&mut self) {
        self.suppressed = true;
    }

    /// Turn the latest sample of `panel` into gestures
    pub fn poll(&mut self, panel: &dyn ButtonPanel, now_ms: u64) -> Vec<ButtonEvent> {
        let mut events = Vec::new();

        if Button::ALL.iter().all(|b| panel.is_down(*b)) {
            if !self.suppressed {
                self.suppressed = true;
                events.push(ButtonEvent::Chord);
            }
            return events;
        }

        if self.suppressed {
            if Button::ALL.iter().all(|b| !panel.is_down(*b)) {
                self.suppressed = false;
                self.holds = [Hold::default(); 3];
            }
            return events;
        }

        for button in Button::ALL {
            let hold = &mut self.holds[slot(button)];
            if panel.was_released(button) {
                events.push(if hold.long_fired {
                    ButtonEvent::LongRelease(button)
                } else {
                    ButtonEvent::Tap(button)
                });
                *hold = Hold::default();
            } else if panel.is_down(button) && panel.held_for(button, self.long_press_ms) {
                if !hold.long_fired {
                    hold.long_fired = true;
                    hold.next_repeat = now_ms + self.repeat_interval_ms;
                    events.push(ButtonEvent::LongPress(button));
                } else if now_ms >= hold.next_repeat {
                    hold.next_repeat += self.repeat_interval_ms;
                    events.push(ButtonEvent::Repeat(button));
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Panel {
        down: [bool; 3],
        released: [bool; 3],
        since: [u64; 3],
        now: u64,
    }

    impl Panel {
        fn press(&mut self, button: Button, at: u64) {
            self.down[slot(button)] = true;
            self.since[slot(button)] = at;
        }

        fn release(&mut self, button: Button) {
            self.down[slot(button)] = false;
            self.released[slot(button)] = true;
        }

        fn sample(&mut self, dispatcher: &mut ButtonDispatcher, now: u64) -> Vec<ButtonEvent> {
            self.now = now;
            let events = dispatcher.poll(&*self, now);
            self.released = [false; 3];
            events
        }
    }

    impl ButtonPanel for Panel {
        fn read(&mut self, now_ms: u64) {
            self.now = now_ms;
        }

        fn is_down(&self, button: Button) -> bool {
            self.down[slot(button)]
        }

        fn was_released(&self, button: Button) -> bool {
            self.released[slot(button)]
        }

        fn held_for(&self, button: Button, ms: u64) -> bool {
            self.down[slot(button)] && self.now - self.since[slot(button)] >= ms
        }
    }

    #[test]
    fn short_press_is_a_tap() {
        let mut dispatcher = ButtonDispatcher::new(1000, 300);
        let mut panel = Panel::default();
        panel.press(Button::Up, 0);
        assert!(panel.sample(&mut dispatcher, 100).is_empty());
        panel.release(Button::Up);
        assert_eq!(
            panel.sample(&mut dispatcher, 200),
            vec![ButtonEvent::Tap(Button::Up)]
        );
    }

    #[test]
    fn long_press_fires_once_then_repeats() {
        let mut dispatcher = ButtonDispatcher::new(1000, 300);
        let mut panel = Panel::default();
        panel.press(Button::Down, 0);

        assert_eq!(
            panel.sample(&mut dispatcher, 1000),
            vec![ButtonEvent::LongPress(Button::Down)]
        );
        assert!(panel.sample(&mut dispatcher, 1200).is_empty());
        assert_eq!(
            panel.sample(&mut dispatcher, 1300),
            vec![ButtonEvent::Repeat(Button::Down)]
        );
        panel.release(Button::Down);
        assert_eq!(
            panel.sample(&mut dispatcher, 1350),
            vec![ButtonEvent::LongRelease(Button::Down)]
        );
    }

    #[test]
    fn chord_suppresses_until_all_released() {
        let mut dispatcher = ButtonDispatcher::new(1000, 300);
        let mut panel = Panel::default();
        for button in Button::ALL {
            panel.press(button, 0);
        }
        assert_eq!(panel.sample(&mut dispatcher, 50), vec![ButtonEvent::Chord]);
        assert!(panel.sample(&mut dispatcher, 2000).is_empty());

        panel.release(Button::Pause);
        assert!(panel.sample(&mut dispatcher, 2100).is_empty());
        panel.release(Button::Up);
        panel.release(Button::Down);
        assert!(panel.sample(&mut dispatcher, 2200).is_empty());

        panel.press(Button::Pause, 3000);
        panel.release(Button::Pause);
        assert_eq!(
            panel.sample(&mut dispatcher, 3100),
            vec![ButtonEvent::Tap(Button::Pause)]
        );
    }
}
