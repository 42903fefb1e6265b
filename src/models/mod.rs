//! Core data models for metagame analytics.

mod alias;
mod matchup;
mod period;
mod record;
mod sample;
mod tier;

pub use alias::*;
pub use matchup::*;
pub use period::*;
pub use record::*;
pub use sample::*;
pub use tier::*;
