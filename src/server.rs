//! HTTP form surface for the predictor.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use log::{info, warn};

use crate::encoder;
use crate::error::Result;
use crate::predictor::{Prediction, PredictionContext, RiskLabel};
use crate::records::{RawFeatureRecord, NUMERIC_INPUTS};

pub type AppState = Arc<PredictionContext>;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(form_handler))
        .route("/predict", post(predict_form_handler))
        .route("/api/predict", post(predict_json_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn serve(state: AppState, listen_addr: &str) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("predictor listening on http://{}", listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn form_handler() -> Html<String> {
    Html(render_page(&RawFeatureRecord::default(), None))
}

async fn predict_form_handler(
    State(state): State<AppState>,
    form: std::result::Result<Form<RawFeatureRecord>, FormRejection>,
) -> (StatusCode, Html<String>) {
    let record = match form {
        Ok(Form(record)) => record,
        Err(rejection) => {
            warn!("form submission rejected: {}", rejection);
            let message = rejection.body_text();
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_page(&RawFeatureRecord::default(), Some(Err(message.as_str())))),
            );
        }
    };
    match state.predict(&record) {
        Ok(prediction) => {
            info!("form prediction risk={} p={:.2}", prediction.risk, prediction.probability);
            (StatusCode::OK, Html(render_page(&record, Some(Ok(&prediction)))))
        }
        Err(e) => {
            warn!("form prediction rejected: {}", e);
            let message = e.to_string();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_page(&record, Some(Err(message.as_str())))),
            )
        }
    }
}

async fn predict_json_handler(
    State(state): State<AppState>,
    Json(record): Json<RawFeatureRecord>,
) -> std::result::Result<Json<Prediction>, (StatusCode, Json<serde_json::Value>)> {
    state.predict(&record).map(Json).map_err(|e| {
        warn!("api prediction rejected: {}", e);
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
    })
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "trees": state.classifier().n_trees(),
        "features": state.scaler().feature_names,
    }))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn numeric_value(record: &RawFeatureRecord, name: &str) -> String {
    match name {
        "age" => record.age.to_string(),
        "trestbps" => record.trestbps.to_string(),
        "chol" => record.chol.to_string(),
        "thalch" => record.thalch.to_string(),
        "oldpeak" => format!("{:.1}", record.oldpeak),
        "ca" => record.ca.to_string(),
        _ => String::new(),
    }
}

fn select(out: &mut String, name: &str, label: &str, options: &[(&str, &str)], current: &str) {
    let _ = writeln!(out, "<label for=\"{name}\">{label}</label>");
    let _ = writeln!(out, "<select id=\"{name}\" name=\"{name}\">");
    for (value, text) in options {
        let selected = if *value == current { " selected" } else { "" };
        let _ = writeln!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            escape(value),
            selected,
            escape(text)
        );
    }
    out.push_str("</select>\n");
}

fn category_select(out: &mut String, name: &str, label: &str, current: &str) {
    let choices = encoder::choices(name);
    let options: Vec<(&str, &str)> = choices.iter().map(|c| (*c, *c)).collect();
    select(out, name, label, &options, current);
}

fn bool_select(out: &mut String, name: &str, label: &str, current: bool) {
    let current = if current { "true" } else { "false" };
    select(out, name, label, &[("true", "True"), ("false", "False")], current);
}

/// Renders the form, prefilled with `record`, plus an optional result card.
pub fn render_page(record: &RawFeatureRecord, outcome: Option<std::result::Result<&Prediction, &str>>) -> String {
    let mut out = String::new();
    out.push_str(concat!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n",
        "<title>Heart Disease Predictor</title>\n</head>\n<body>\n",
        "<h1>Heart Disease Prediction</h1>\n",
        "<h3>Enter patient details below to assess heart disease risk</h3>\n",
        "<form method=\"post\" action=\"/predict\">\n",
    ));

    for input in NUMERIC_INPUTS.iter() {
        let _ = writeln!(out, "<label for=\"{}\">{}</label>", input.name, input.label);
        let _ = writeln!(
            out,
            "<input type=\"number\" id=\"{}\" name=\"{}\" min=\"{}\" max=\"{}\" step=\"{}\" value=\"{}\">",
            input.name,
            input.name,
            input.min,
            input.max,
            input.step,
            numeric_value(record, input.name)
        );
    }
    category_select(&mut out, "sex", "Sex", &record.sex);
    category_select(&mut out, "cp", "Chest Pain Type", &record.cp);
    bool_select(&mut out, "fbs", "Fasting Blood Sugar &gt; 120 mg/dl", record.fbs);
    category_select(&mut out, "restecg", "Resting ECG Result", &record.restecg);
    bool_select(&mut out, "exang", "Exercise Induced Angina", record.exang);
    category_select(&mut out, "slope", "Slope of Peak Exercise ST Segment", &record.slope);
    category_select(&mut out, "thal", "Thalassemia", &record.thal);
    out.push_str("<button type=\"submit\">Predict Now</button>\n</form>\n");

    match outcome {
        Some(Ok(prediction)) => {
            let (class, title) = match prediction.risk {
                RiskLabel::High => ("high-risk", "High Risk of Heart Disease"),
                RiskLabel::Low => ("low-risk", "Low Risk of Heart Disease"),
            };
            let _ = writeln!(
                out,
                "<div class=\"result-card {}\">{}<br><br>Probability: {:.2}</div>",
                class, title, prediction.probability
            );
        }
        Some(Err(message)) => {
            let _ = writeln!(out, "<div class=\"result-card error\">{}</div>", escape(message));
        }
        None => {}
    }

    out.push_str(concat!(
        "<p class=\"footer\">This is a demonstration ML model, not for medical diagnosis.</p>\n",
        "</body>\n</html>\n",
    ));
    out
}
