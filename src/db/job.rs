//! Job loading and state updates
//!
//! Rows are loaded into a [`load::JobRow`]. Every state change goes through [`state::JobState`]
//! transitions, checked inside the `UPDATE` statement itself.

pub mod load;
pub mod update;
pub mod state;
