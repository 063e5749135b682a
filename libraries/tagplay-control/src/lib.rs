//! Tagplay Control
//!
//! The control loop of the tag-activated player: button gestures, tag
//! reads, behavior modifiers and the admin menu, wired to the playback
//! engine and to the peripherals through `tagplay-core`'s traits.
//!
//! # Architecture
//!
//! - `Controller`: owns the peripherals (`Devices`), settings, engine and
//!   the active `Modifier`; `tick` runs one loop iteration
//! - `Modifier`: at most one behavior override, stored by value
//! - `ButtonDispatcher`: taps, long presses, repeats and the chord
//! - `BoundedChoice` / `Prompt`: the numbered-choice primitive behind every
//!   admin prompt
//!
//! Everything runs on one thread. Blocking flows (menus, provisioning)
//! poll the peripherals cooperatively and keep draining audio-module
//! notifications while they wait.

#![forbid(unsafe_code)]

mod admin;
pub mod buttons;
pub mod config;
pub mod controller;
pub mod error;
pub mod menu;
pub mod modifier;
mod waits;

pub use buttons::{ButtonDispatcher, ButtonEvent};
pub use config::ControlConfig;
pub use controller::{AdminEntry, Controller, Devices, TickOutcome};
pub use error::{ControlError, Result};
pub use menu::{BoundedChoice, CalcChallenge, CalcOp, Choice, ChoiceStep, Prompt};
pub use modifier::{Handling, Modifier, ModifierCx, Transition};
pub use waits::SEQUENCE_LEN;
