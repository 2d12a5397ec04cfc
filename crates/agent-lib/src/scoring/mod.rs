//! Score computation for container load ranking
//!
//! Reduces each container's sample series for one polling cycle to a
//! single scalar load factor, using weighted metric dimensions and
//! cross-cycle counter deltas.

mod counters;
mod engine;
mod weights;

pub use counters::{CounterMemory, CounterSet};
pub use engine::ScoreEngine;
pub use weights::WeightConfig;
