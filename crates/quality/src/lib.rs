pub mod detectors;
pub mod review;

pub use detectors::{apply_diversity_cap, is_comparison, is_listicle, is_paywalled, score_item, ScoreBreakdown};
pub use review::review;
