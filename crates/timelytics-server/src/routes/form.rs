//! The HTML page.

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;

use crate::form::FormInput;
use crate::page::{Outcome, render};
use crate::state::SharedState;

/// GET / - Empty form with default values
pub async fn index() -> Html<String> {
    Html(render(&FormInput::default(), &Outcome::Idle))
}

/// POST / - Predict from the submitted form and render the page again
pub async fn submit(
    State(state): State<SharedState>,
    Form(input): Form<FormInput>,
) -> (StatusCode, Html<String>) {
    let result = match input.validate() {
        Ok(features) => state.predict(features).await,
        Err(err) => Err(err.into()),
    };

    match result {
        Ok(days) => {
            tracing::info!(days, "prediction served");
            (StatusCode::OK, Html(render(&input, &Outcome::Prediction(days))))
        }
        Err(err) => {
            tracing::warn!("prediction refused: {err}");
            let outcome = Outcome::Error(err.user_message());
            (err.status(), Html(render(&input, &outcome)))
        }
    }
}
