//! Pure game rules shared by every variant.
//!
//! - [`difficulty`] - Tiers, variants and the profile resolver
//! - [`item`] - The items a round is made of
//! - [`answer`] - Answer payloads, verdicts and the per-variant validator
//! - [`scoring`] - Point awards
//!
//! Nothing in this module holds round state; see [`crate::engine`] for that.

pub use self::{answer::*, difficulty::*, item::*, scoring::*};

pub mod answer;
pub mod difficulty;
pub mod item;
pub mod scoring;
