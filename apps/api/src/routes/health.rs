use axum::Json;
use serde_json::{json, Map, Value};

use crate::analysis::language::Language;
use crate::analysis::style::TemplateStyle;

const SERVICE_NAME: &str = "cvlens";

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": SERVICE_NAME
    }))
}

/// GET /
/// Static service metadata: supported languages, styles and endpoints.
pub async fn service_info() -> Json<Value> {
    let languages: Map<String, Value> = Language::ALL
        .iter()
        .map(|lang| (lang.code().to_string(), json!(lang.display_name())))
        .collect();
    let styles: Vec<&str> = TemplateStyle::ALL.iter().map(|s| s.as_str()).collect();

    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "supported_languages": languages,
        "template_styles": styles,
        "endpoints": {
            "analyze_and_rewrite": "POST /analyze-and-rewrite",
            "recommend_careers": "POST /recommend-careers",
            "health": "GET /health"
        }
    }))
}
