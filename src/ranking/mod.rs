//! Ranking pipeline - from violation vectors to winning candidates.
//!
//! - Harmony: weighted sum of violations, negated
//! - Candidate ranking: top-n extraction with a fixed tie-break order

mod harmony;
mod ranker;

pub use harmony::harmony;
pub(crate) use harmony::at_least;
pub use ranker::{CandidateRanker, DEFAULT_TIE_EPSILON};
