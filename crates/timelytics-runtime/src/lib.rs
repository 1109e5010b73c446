//! # Timelytics Runtime
//!
//! Serving-side pieces shared by Timelytics binaries.
//!
//! # Features
//! - [ModelCache], a process-wide single-flight cache of the deserialized ensemble.
//! - [PredictionService], turning a [timelytics_core::FeatureVector] into whole days.
//! - [cli::ModelArgs], the artifact configuration flags, and [telemetry::install].

pub mod cache;
pub mod cli;
pub mod predict;
pub mod telemetry;

#[doc(inline)]
pub use cache::{LoadError, ModelCache};
#[doc(inline)]
pub use predict::{PredictError, PredictionService, round_days};
