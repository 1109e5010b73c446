use std::fmt::Write;

use crate::form::{
    CUSTOMER_STATE_LABEL, DISTANCE_LABEL, DOW_LABEL, FormInput, MONTH_LABEL, SELLER_STATE_LABEL,
    SIZE_LABEL, WEIGHT_LABEL, YEAR_LABEL,
};
use crate::sample::{SAMPLE_COLUMNS, SAMPLE_ROWS, row_cells};

pub const TITLE: &str =
    "Timelytics: Optimize your supply chain with advanced forecasting techniques.";

const CAPTIONS: [&str; 2] = [
    "Timelytics is an ensemble model that utilizes three powerful machine learning algorithms - \
     XGBoost, Random Forests, and Support Vector Machines (SVM) - to accurately forecast Order \
     to Delivery (OTD) times.",
    "With Timelytics, businesses can identify potential bottlenecks and delays in their supply \
     chain and take proactive measures to address them.",
];

/// What the output section shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Idle,
    Prediction(i64),
    Error(String),
}

struct Field<'a> {
    name: &'static str,
    label: &'static str,
    value: &'a str,
    bounds: Option<(i64, i64)>,
    step: &'static str,
}

/// Render the whole page.
pub fn render(input: &FormInput, outcome: &Outcome) -> String {
    let fields = [
        Field {
            name: "purchase_day_of_week",
            label: DOW_LABEL,
            value: &input.purchase_day_of_week,
            bounds: Some((0, 6)),
            step: "1",
        },
        Field {
            name: "purchase_month",
            label: MONTH_LABEL,
            value: &input.purchase_month,
            bounds: Some((1, 12)),
            step: "1",
        },
        Field {
            name: "purchase_year",
            label: YEAR_LABEL,
            value: &input.purchase_year,
            bounds: None,
            step: "1",
        },
        Field {
            name: "product_size_cm3",
            label: SIZE_LABEL,
            value: &input.product_size_cm3,
            bounds: None,
            step: "any",
        },
        Field {
            name: "product_weight_g",
            label: WEIGHT_LABEL,
            value: &input.product_weight_g,
            bounds: None,
            step: "any",
        },
        Field {
            name: "customer_geolocation_state",
            label: CUSTOMER_STATE_LABEL,
            value: &input.customer_geolocation_state,
            bounds: None,
            step: "1",
        },
        Field {
            name: "seller_geolocation_state",
            label: SELLER_STATE_LABEL,
            value: &input.seller_geolocation_state,
            bounds: None,
            step: "1",
        },
        Field {
            name: "distance",
            label: DISTANCE_LABEL,
            value: &input.distance,
            bounds: None,
            step: "any",
        },
    ];

    let mut html = String::with_capacity(4096);
    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Timelytics</title>\n<style>\n\
         body{font-family:sans-serif;margin:0;display:flex}\n\
         aside{width:18rem;padding:1rem;background:#f0f2f6}\n\
         main{flex:1;padding:1rem 2rem}\n\
         label{display:block;margin-top:.6rem}\n\
         .caption{color:#6b6b6b;font-size:.9rem}\n\
         .error{color:#b00020}\n\
         table{border-collapse:collapse}\n\
         td,th{border:1px solid #ddd;padding:.3rem .6rem;text-align:right}\n\
         </style>\n</head>\n<body>\n",
    );

    html.push_str("<aside>\n<h2>Input Parameters</h2>\n<form method=\"post\" action=\"/\">\n");
    for field in &fields {
        let _ = write!(
            html,
            "<label for=\"{name}\">{label}</label>\n\
             <input type=\"number\" id=\"{name}\" name=\"{name}\" value=\"{value}\" step=\"{step}\"",
            name = field.name,
            label = escape(field.label),
            value = escape(field.value),
            step = field.step,
        );
        if let Some((min, max)) = field.bounds {
            let _ = write!(html, " min=\"{min}\" max=\"{max}\"");
        }
        html.push_str(" required>\n");
    }
    html.push_str("<p><button type=\"submit\">Predict Wait Time!</button></p>\n</form>\n</aside>\n");

    let _ = writeln!(html, "<main>\n<h1>{}</h1>", escape(TITLE));
    for caption in CAPTIONS {
        let _ = writeln!(html, "<p class=\"caption\">{}</p>", escape(caption));
    }

    html.push_str("<section>\n<h2>Output: Wait Time in Days</h2>\n");
    match outcome {
        Outcome::Idle => {}
        Outcome::Prediction(days) => {
            let _ = writeln!(
                html,
                "<p id=\"prediction\">Predicted Wait Time: <strong>{days} days</strong></p>"
            );
        }
        Outcome::Error(message) => {
            let _ = writeln!(
                html,
                "<p id=\"error\" class=\"error\">{}</p>",
                escape(message)
            );
        }
    }
    html.push_str("</section>\n");

    html.push_str("<section>\n<h2>Sample Dataset</h2>\n<table>\n<tr><th></th>");
    for column in SAMPLE_COLUMNS {
        let _ = write!(html, "<th>{}</th>", escape(column));
    }
    html.push_str("</tr>\n");
    for (index, row) in SAMPLE_ROWS.iter().enumerate() {
        let _ = write!(html, "<tr><th>{index}</th>");
        for cell in row_cells(row) {
            let _ = write!(html, "<td>{cell}</td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n</section>\n</main>\n</body>\n</html>\n");
    html
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_page_has_form_and_sample_table() {
        let html = render(&FormInput::default(), &Outcome::Idle);

        assert!(html.contains(TITLE));
        assert!(html.contains("Input Parameters"));
        assert!(html.contains("Predict Wait Time!"));
        assert!(html.contains("Output: Wait Time in Days"));
        assert!(html.contains("Sample Dataset"));
        assert!(html.contains("name=\"purchase_day_of_week\" value=\"3\" step=\"1\" min=\"0\" max=\"6\""));
        assert!(html.contains("name=\"distance\" value=\"475.35\""));
        assert!(html.contains("<td>37206.0</td>"));
        assert!(!html.contains("Predicted Wait Time"));
    }

    #[test]
    fn prediction_is_shown_in_days() {
        let html = render(&FormInput::default(), &Outcome::Prediction(14));
        assert!(html.contains("Predicted Wait Time: <strong>14 days</strong>"));
    }

    #[test]
    fn submitted_values_and_errors_are_escaped() {
        let input = FormInput {
            distance: "\"><script>".to_string(),
            ..FormInput::default()
        };
        let html = render(&input, &Outcome::Error("<b>bad</b>".to_string()));

        assert!(!html.contains("<script>"));
        assert!(html.contains("value=\"&quot;&gt;&lt;script&gt;\""));
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
    }
}
