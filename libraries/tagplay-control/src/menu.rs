//! Numbered-choice navigation
//!
//! Every admin prompt is a bounded numeric choice driven by button
//! gestures: Up/Down taps step by one, long presses (and their repeats)
//! jump by ten, a Pause tap confirms and a long Pause press aborts with
//! the caller's default. Nothing is highlighted until the first step, and
//! an empty highlight cannot be confirmed.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tagplay_core::{Button, TagplayError};

use crate::buttons::ButtonEvent;

const JUMP: u8 = 10;

/// Outcome of feeding one gesture into a choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceStep {
    /// Gesture had no effect
    Idle,
    /// A new value is highlighted and should be announced
    Highlighted(u8),
    Confirmed(u8),
    /// Aborted; carries the caller's default
    Aborted(u8),
}

/// Bounded numeric choice state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedChoice {
    floor: u8,
    ceiling: u8,
    value: Option<u8>,
    default: u8,
}

impl BoundedChoice {
    /// Choice over `floor..=ceiling`; `floor` is raised to 1 and `ceiling`
    /// to `floor`
    pub fn new(floor: u8, ceiling: u8, default: u8) -> Self {
        let floor = floor.max(1);
        Self {
            floor,
            ceiling: ceiling.max(floor),
            value: None,
            default,
        }
    }

    pub fn value(&self) -> Option<u8> {
        self.value
    }

    pub fn bounds(&self) -> (u8, u8) {
        (self.floor, self.ceiling)
    }

    /// Apply one gesture
    pub fn apply(&mut self, event: ButtonEvent) -> ChoiceStep {
        match event {
            ButtonEvent::Tap(Button::Up) => self.step_up(1),
            ButtonEvent::Tap(Button::Down) => self.step_down(1),
            ButtonEvent::LongPress(Button::Up) | ButtonEvent::Repeat(Button::Up) => {
                self.step_up(JUMP)
            }
            ButtonEvent::LongPress(Button::Down) | ButtonEvent::Repeat(Button::Down) => {
                self.step_down(JUMP)
            }
            ButtonEvent::Tap(Button::Pause) => match self.value {
                Some(value) => ChoiceStep::Confirmed(value),
                None => ChoiceStep::Idle,
            },
            ButtonEvent::LongPress(Button::Pause) => ChoiceStep::Aborted(self.default),
            _ => ChoiceStep::Idle,
        }
    }

    fn step_up(&mut self, by: u8) -> ChoiceStep {
        let next = match self.value {
            None => self.floor,
            Some(value) => value.saturating_add(by).min(self.ceiling),
        };
        self.highlight(next)
    }

    fn step_down(&mut self, by: u8) -> ChoiceStep {
        let next = match self.value {
            None => self.floor,
            Some(value) => value.saturating_sub(by).max(self.floor),
        };
        self.highlight(next)
    }

    fn highlight(&mut self, next: u8) -> ChoiceStep {
        if self.value == Some(next) {
            return ChoiceStep::Idle;
        }
        self.value = Some(next);
        ChoiceStep::Highlighted(next)
    }
}

/// Final answer of a blocking choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub value: u8,
    pub aborted: bool,
}

impl Choice {
    /// The confirmed value, or `UserAbort`
    pub fn required(self) -> Result<u8, TagplayError> {
        if self.aborted {
            Err(TagplayError::UserAbort)
        } else {
            Ok(self.value)
        }
    }
}

/// How a highlighted value is spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speak {
    /// Announcement `base + value`
    Offset(u16),
    /// Announcement `value`
    Number,
}

/// What to play a moment after announcing a highlighted value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preview {
    None,
    /// First track of the highlighted folder
    FolderStart,
    /// Highlighted track of the given folder
    TrackOf(u8),
}

/// A bounded choice together with its announcements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    /// Played once before the first gesture
    pub intro: Option<u16>,
    pub floor: u8,
    pub ceiling: u8,
    pub default: u8,
    pub speak: Speak,
    pub preview: Preview,
}

impl Prompt {
    /// Menu of `options` entries announced at `intro + n`
    pub fn menu(intro: u16, options: u8) -> Self {
        Self {
            intro: Some(intro),
            floor: 1,
            ceiling: options,
            default: 0,
            speak: Speak::Offset(intro),
            preview: Preview::None,
        }
    }

    /// Plain numbers in `floor..=ceiling`
    pub fn numbers(intro: u16, floor: u8, ceiling: u8) -> Self {
        Self {
            intro: Some(intro),
            floor,
            ceiling,
            default: 0,
            speak: Speak::Number,
            preview: Preview::None,
        }
    }

    pub fn with_preview(mut self, preview: Preview) -> Self {
        self.preview = preview;
        self
    }

    /// Skip the intro (it was already played)
    pub fn without_intro(mut self) -> Self {
        self.intro = None;
        self
    }

    pub fn with_default(mut self, default: u8) -> Self {
        self.default = default;
        self
    }

    /// Announcement index for a highlighted value
    pub fn announcement(&self, value: u8) -> u16 {
        match self.speak {
            Speak::Offset(base) => base + u16::from(value),
            Speak::Number => u16::from(value),
        }
    }

    pub fn choice(&self) -> BoundedChoice {
        BoundedChoice::new(self.floor, self.ceiling, self.default)
    }
}

/// Arithmetic operator of a calc-lock challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalcOp {
    Add,
    Sub,
}

/// Calc-lock challenge: `a + b` or `a - b` with `b < a`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcChallenge {
    pub a: u8,
    pub b: u8,
    pub op: CalcOp,
}

impl CalcChallenge {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let a = rng.gen_range(10..20);
        let b = rng.gen_range(1..10);
        let op = if rng.gen_bool(0.5) {
            CalcOp::Add
        } else {
            CalcOp::Sub
        };
        Self { a, b, op }
    }

    pub fn answer(&self) -> u8 {
        match self.op {
            CalcOp::Add => self.a + self.b,
            CalcOp::Sub => self.a - self.b,
        }
    }
}

/// Highest answer a generated challenge can have
pub const CALC_ANSWER_CEILING: u8 = 28;
