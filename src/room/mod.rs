//! Room lifecycle engine
//!
//! This module contains the state machine that governs room creation,
//! bounded-capacity joining, ownership transfer, and disbandment.

pub mod engine;

pub use engine::{RoomEngine, RoomEngineStats};
