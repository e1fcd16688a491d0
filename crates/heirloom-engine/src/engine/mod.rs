//! Round state and the machinery that drives it.
//!
//! - [`RoundClock`] - Cooperative per-item (or per-round) countdown
//! - [`ItemDeck`] - Seeded dealing of round items and matching cards
//! - [`RoundSeed`] - Seed for deterministic dealing
//! - [`MatchingBoard`] - Card layout and flip rules of a matching round
//! - [`RoundSession`] - The `Intro -> Playing -> Results` state machine
//! - [`RoundState`] - Data of one round, readable at any time
//! - [`RoundResult`] and [`Achievement`] - What a finished round reports
//! - [`GameHost`] - Entry point an application drives rounds through
//!
//! # Round Flow
//!
//! 1. Resolve a [`DifficultyProfile`](crate::DifficultyProfile) and create a [`RoundSession`]
//! 2. [`RoundSession::start`] deals items from an [`ItemSource`](crate::source::ItemSource)
//! 3. The host calls [`RoundSession::tick`] once per second and forwards answers and hints
//! 4. Once every item is judged (or the matching clock runs out) the session enters
//!    results and emits [`RoundEvent::Completed`] exactly once
//!
//! [`GameHost`] wraps these steps and reports each completed round, with the
//! achievements it earned, to a callback.

pub use self::{clock::*, deck::*, host::*, matching::*, result::*, session::*, state::*};

mod clock;
mod deck;
mod host;
mod matching;
mod result;
mod session;
mod state;
