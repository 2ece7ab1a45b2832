pub mod engine;
pub mod normalize;
pub mod outcome;
pub mod overlay;
pub mod quality;
pub mod sites;
pub mod statistics;
pub mod suitability;
pub mod viability;

pub use engine::WsiEngine;
pub use outcome::{CriterionSummary, WsiOutcome};
pub use quality::QualityWarning;
pub use sites::{CandidateSite, SiteExtraction};
pub use statistics::{LayerStats, WsiStatistics};
pub use suitability::{ClassShare, SuitabilityLevel};
pub use viability::ViabilityResult;
