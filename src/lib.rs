//! Faction Journal - minor faction influence tracking from game journals.

pub mod config;
pub mod display;
pub mod journal;
