//! # Timelytics Core
//!
//! Shared building blocks for Order-to-Delivery (OTD) prediction.
//!
//! # Features
//! - [FeatureVector], the named eight-field model input with a versioned ordering contract.
//! - [EnsembleModel], the JSON artifact format for the voting ensemble and its evaluation.
//! - [ArtifactDecode], the trait the registry uses to turn a local artifact into a value.

pub mod artifact;
pub mod features;
pub mod model;

#[doc(inline)]
pub use artifact::ArtifactDecode;
#[doc(inline)]
pub use features::{FEATURE_COUNT, FEATURE_ORDER, FEATURE_ORDER_VERSION, FeatureVector};
#[doc(inline)]
pub use model::{EnsembleModel, ModelError};
