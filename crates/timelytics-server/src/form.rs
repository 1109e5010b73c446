//! Input boundary of the web form and the JSON API.
//!
//! The prediction service trusts whatever it is given, so the range constraints of the input
//! widgets are enforced here.

use serde::{Deserialize, Serialize};
use timelytics_core::FeatureVector;

/// A field that failed validation, with the label shown next to its input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{label}: {message}")]
pub struct FormError {
    pub label: &'static str,
    pub message: String,
}

impl FormError {
    fn new(label: &'static str, message: impl Into<String>) -> Self {
        Self {
            label,
            message: message.into(),
        }
    }
}

pub const DOW_LABEL: &str = "Purchased Day of the Week";
pub const MONTH_LABEL: &str = "Purchased Month";
pub const YEAR_LABEL: &str = "Purchased Year";
pub const SIZE_LABEL: &str = "Product Size in cm^3";
pub const WEIGHT_LABEL: &str = "Product Weight in grams";
pub const CUSTOMER_STATE_LABEL: &str = "Geolocation State of the Customer";
pub const SELLER_STATE_LABEL: &str = "Geolocation State of the Seller";
pub const DISTANCE_LABEL: &str = "Distance";

/// Raw values as submitted by the browser.
///
/// Kept as strings so that a rejected submission can be rendered back exactly as typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormInput {
    pub purchase_day_of_week: String,
    pub purchase_month: String,
    pub purchase_year: String,
    pub product_size_cm3: String,
    pub product_weight_g: String,
    pub customer_geolocation_state: String,
    pub seller_geolocation_state: String,
    pub distance: String,
}

impl From<&FeatureVector> for FormInput {
    fn from(features: &FeatureVector) -> Self {
        Self {
            purchase_day_of_week: features.purchase_day_of_week.to_string(),
            purchase_month: features.purchase_month.to_string(),
            purchase_year: features.purchase_year.to_string(),
            product_size_cm3: features.product_size_cm3.to_string(),
            product_weight_g: features.product_weight_g.to_string(),
            customer_geolocation_state: features.customer_geolocation_state.to_string(),
            seller_geolocation_state: features.seller_geolocation_state.to_string(),
            distance: features.distance.to_string(),
        }
    }
}

impl Default for FormInput {
    fn default() -> Self {
        Self::from(&FeatureVector::default())
    }
}

impl FormInput {
    /// Parse every field and apply the widget constraints.
    pub fn validate(&self) -> Result<FeatureVector, FormError> {
        let features = FeatureVector {
            purchase_day_of_week: parse_integer(DOW_LABEL, &self.purchase_day_of_week)?,
            purchase_month: parse_integer(MONTH_LABEL, &self.purchase_month)?,
            purchase_year: parse_integer(YEAR_LABEL, &self.purchase_year)?,
            product_size_cm3: parse_real(SIZE_LABEL, &self.product_size_cm3)?,
            product_weight_g: parse_real(WEIGHT_LABEL, &self.product_weight_g)?,
            customer_geolocation_state: parse_integer(
                CUSTOMER_STATE_LABEL,
                &self.customer_geolocation_state,
            )?,
            seller_geolocation_state: parse_integer(
                SELLER_STATE_LABEL,
                &self.seller_geolocation_state,
            )?,
            distance: parse_real(DISTANCE_LABEL, &self.distance)?,
        };
        check_ranges(&features)?;
        Ok(features)
    }
}

/// Range constraints shared by the form and the JSON API.
pub fn check_ranges(features: &FeatureVector) -> Result<(), FormError> {
    if !(0..=6).contains(&features.purchase_day_of_week) {
        return Err(FormError::new(DOW_LABEL, "must be between 0 and 6"));
    }
    if !(1..=12).contains(&features.purchase_month) {
        return Err(FormError::new(MONTH_LABEL, "must be between 1 and 12"));
    }
    for (label, value) in [
        (SIZE_LABEL, features.product_size_cm3),
        (WEIGHT_LABEL, features.product_weight_g),
        (DISTANCE_LABEL, features.distance),
    ] {
        if !value.is_finite() {
            return Err(FormError::new(label, "must be a finite number"));
        }
        if value < 0.0 {
            return Err(FormError::new(label, "must not be negative"));
        }
    }
    Ok(())
}

fn parse_integer(label: &'static str, raw: &str) -> Result<i64, FormError> {
    raw.trim()
        .parse()
        .map_err(|_| FormError::new(label, format!("expected a whole number, got {raw:?}")))
}

fn parse_real(label: &'static str, raw: &str) -> Result<f64, FormError> {
    raw.trim()
        .parse()
        .map_err(|_| FormError::new(label, format!("expected a number, got {raw:?}")))
}
