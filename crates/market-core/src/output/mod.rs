//! Output Generation
//!
//! Network annotation and end-of-run diagnostics.

pub mod annotate;
pub mod metrics;

pub use annotate::annotate;
pub use metrics::{
    bot_followers, human_feed_quality, infiltration_estimate, low_quality_fraction,
    low_quality_gini, quality_by_degree, DegreeQuality, Infiltration,
};
