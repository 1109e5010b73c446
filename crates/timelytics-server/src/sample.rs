use serde::Serialize;
use timelytics_core::FeatureVector;

/// Column headers of the sample table, in feature order.
pub const SAMPLE_COLUMNS: [&str; 8] = [
    "Purchased Day of the Week",
    "Purchased Month",
    "Purchased Year",
    "Product Size in cm^3",
    "Product Weight in grams",
    "Geolocation State Customer",
    "Geolocation State Seller",
    "Distance",
];

pub const SAMPLE_ROWS: [FeatureVector; 3] = [
    FeatureVector {
        purchase_day_of_week: 0,
        purchase_month: 6,
        purchase_year: 2018,
        product_size_cm3: 37206.0,
        product_weight_g: 16250.0,
        customer_geolocation_state: 25,
        seller_geolocation_state: 20,
        distance: 247.94,
    },
    FeatureVector {
        purchase_day_of_week: 3,
        purchase_month: 3,
        purchase_year: 2017,
        product_size_cm3: 63714.0,
        product_weight_g: 7249.0,
        customer_geolocation_state: 25,
        seller_geolocation_state: 7,
        distance: 250.35,
    },
    FeatureVector {
        purchase_day_of_week: 1,
        purchase_month: 1,
        purchase_year: 2018,
        product_size_cm3: 54816.0,
        product_weight_g: 9600.0,
        customer_geolocation_state: 25,
        seller_geolocation_state: 20,
        distance: 4.915,
    },
];

/// Body of `GET /api/sample`.
#[derive(Debug, Serialize)]
pub struct SampleTable {
    pub columns: [&'static str; 8],
    pub rows: [FeatureVector; 3],
}

impl SampleTable {
    pub fn new() -> Self {
        Self {
            columns: SAMPLE_COLUMNS,
            rows: SAMPLE_ROWS,
        }
    }
}

impl Default for SampleTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Table cells for one row, reals always shown with a fractional part.
pub fn row_cells(row: &FeatureVector) -> [String; 8] {
    [
        row.purchase_day_of_week.to_string(),
        row.purchase_month.to_string(),
        row.purchase_year.to_string(),
        real_cell(row.product_size_cm3),
        real_cell(row.product_weight_g),
        row.customer_geolocation_state.to_string(),
        row.seller_geolocation_state.to_string(),
        real_cell(row.distance),
    ]
}

fn real_cell(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_match_the_published_table() {
        assert_eq!(
            row_cells(&SAMPLE_ROWS[0]),
            ["0", "6", "2018", "37206.0", "16250.0", "25", "20", "247.94"]
        );
        assert_eq!(row_cells(&SAMPLE_ROWS[2])[7], "4.915");
    }
}
