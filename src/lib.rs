//! Orator: timed public-speaking practice sessions
//!
//! Drives speaking games through `Setup -> Playing -> Processing -> Results`,
//! capturing one recording per step and delegating scoring to an external
//! analysis service.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod game;
pub mod timer;

pub use error::{OratorError, Result};
