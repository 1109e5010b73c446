use serde::{Deserialize, Serialize};

/// Number of features the ensemble is trained on.
pub const FEATURE_COUNT: usize = 8;

/// Version of [FEATURE_ORDER]. Bump it whenever the order changes so that artifacts trained on a
/// different layout are rejected at load time instead of silently mispredicting.
pub const FEATURE_ORDER_VERSION: u32 = 1;

/// Column order of the training matrix. Artifacts carry the same list and the model loader
/// refuses any artifact whose list differs.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "purchase_day_of_week",
    "purchase_month",
    "purchase_year",
    "product_size_cm3",
    "product_weight_g",
    "customer_geolocation_state",
    "seller_geolocation_state",
    "distance",
];

/// Shipment attributes fed to the model.
///
/// No range validation happens here: the model is trusted with whatever it is given. Range
/// constraints (day of week in `0..=6`, month in `1..=12`, non-negative sizes) belong to the
/// input boundary that builds this struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Day of the week the order was placed, `0` is Monday.
    pub purchase_day_of_week: i64,
    pub purchase_month: i64,
    pub purchase_year: i64,
    pub product_size_cm3: f64,
    pub product_weight_g: f64,
    /// Encoded customer state, opaque to this crate.
    pub customer_geolocation_state: i64,
    /// Encoded seller state, opaque to this crate.
    pub seller_geolocation_state: i64,
    pub distance: f64,
}

impl FeatureVector {
    /// Lay the fields out as a single model row following [FEATURE_ORDER].
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.purchase_day_of_week as f64,
            self.purchase_month as f64,
            self.purchase_year as f64,
            self.product_size_cm3,
            self.product_weight_g,
            self.customer_geolocation_state as f64,
            self.seller_geolocation_state as f64,
            self.distance,
        ]
    }
}

impl Default for FeatureVector {
    /// The values the input form starts with.
    fn default() -> Self {
        Self {
            purchase_day_of_week: 3,
            purchase_month: 1,
            purchase_year: 2018,
            product_size_cm3: 9328.0,
            product_weight_g: 1800.0,
            customer_geolocation_state: 10,
            seller_geolocation_state: 20,
            distance: 475.35,
        }
    }
}
