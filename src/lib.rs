//! WarrenT: Sequentially Gated Startup Course Engine
//!
//! Turns a startup idea into a fixed-length, stage-gated course. Each stage's
//! learning material is generated on demand, submissions are graded by a
//! model, and completing every stage unlocks a synthesized business plan.

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod progression;
pub mod provider;
pub mod services;
pub mod session;
pub mod stage;
pub mod types;
