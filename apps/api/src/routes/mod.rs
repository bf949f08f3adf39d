pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/", get(health::service_info))
        .route("/health", get(health::health_handler))
        .route("/analyze-and-rewrite", post(handlers::handle_analyze))
        .route("/analyze-and-rewrite/", post(handlers::handle_analyze))
        .route("/recommend-careers", post(handlers::handle_recommend))
        .route("/recommend-careers/", post(handlers::handle_recommend))
        .layer(body_limit)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::fixtures::analysis_json;
    use crate::analysis::pipeline::Pipeline;
    use crate::config::Config;
    use crate::extraction::docx::tests::build_docx;
    use crate::llm_client::testing::ScriptedModel;

    const BOUNDARY: &str = "cvlens-test-boundary";

    fn app(model: Arc<ScriptedModel>) -> Router {
        let config = Config {
            openai_api_key: "sk-test".to_string(),
            openai_base_url: "http://localhost".to_string(),
            openai_model: "test-model".to_string(),
            llm_temperature: 0.3,
            llm_timeout_secs: 5,
            llm_max_retries: 0,
            llm_retry_backoff_ms: 0,
            max_upload_bytes: 1024 * 1024,
            port: 0,
            rust_log: "info".to_string(),
        };
        let pipeline = Pipeline::new(model, config.retry_policy());
        build_router(AppState {
            pipeline: Arc::new(pipeline),
            config,
        })
    }

    /// (name, filename, content type, body)
    type Part<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a [u8]);

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, content_type, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match filename {
                Some(f) => format!("form-data; name=\"{name}\"; filename=\"{f}\""),
                None => format!("form-data; name=\"{name}\""),
            };
            body.extend_from_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
            if let Some(ct) = content_type {
                body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        Request::post(uri)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_service_info() {
        let response = app(Arc::new(ScriptedModel::new(vec![])))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["service"], "cvlens");
        assert_eq!(body["supported_languages"]["de"], "German (Deutsch)");
        assert_eq!(body["template_styles"][0], "professional-blue");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(ScriptedModel::new(vec![])))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_text_upload_analyzed() {
        let model = Arc::new(ScriptedModel::replying(analysis_json(
            "en",
            "professional-blue",
            false,
        )));
        let request = post(
            "/analyze-and-rewrite",
            &[
                (
                    "cv_file",
                    Some("cv.txt"),
                    Some("text/plain"),
                    b"John Doe, Software Engineer, 5 years Python",
                ),
                ("output_language", None, None, b"en"),
                ("template_style", None, None, b"professional-blue"),
                ("target_job_description", None, None, b""),
            ],
        );
        let response = app(model.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["metadata"]["output_language"], "en");
        assert_eq!(body["improvements_summary"]["target_ats_score"], 90);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_docx_upload_analyzed() {
        let model = Arc::new(ScriptedModel::replying(analysis_json("de", "classic", false)));
        let docx = build_docx(
            r#"<w:p><w:r><w:t>John Doe</w:t></w:r></w:p><w:p><w:r><w:t>Software Engineer, 5 years Python</w:t></w:r></w:p>"#,
        );
        let request = post(
            "/analyze-and-rewrite",
            &[
                (
                    "cv_file",
                    Some("cv.docx"),
                    Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
                    &docx,
                ),
                ("output_language", None, None, b"de"),
                ("template_style", None, None, b"classic"),
            ],
        );
        let response = app(model.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["metadata"]["output_language"], "de");
        assert_eq!(body["improvements_summary"]["output_language"], "de");
        assert!(model
            .last_prompt()
            .unwrap()
            .user
            .contains("John Doe\nSoftware Engineer, 5 years Python"));
    }

    #[tokio::test]
    async fn test_png_upload_rejected() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let request = post(
            "/analyze-and-rewrite",
            &[(
                "cv_file",
                Some("photo.png"),
                Some("image/png"),
                b"\x89PNG\r\n\x1a\n",
            )],
        );
        let response = app(model.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["kind"], "UnsupportedFormat");
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_file_and_text_together_rejected() {
        let request = post(
            "/recommend-careers/",
            &[
                ("cv_file", Some("cv.txt"), Some("text/plain"), b"John Doe"),
                ("cv_text", None, None, b"John Doe"),
            ],
        );
        let response = app(Arc::new(ScriptedModel::new(vec![])))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["kind"], "ValidationError");
    }

    #[tokio::test]
    async fn test_missing_document_rejected() {
        let request = post("/recommend-careers", &[("output_language", None, None, b"en")]);
        let response = app(Arc::new(ScriptedModel::new(vec![])))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_schema_mismatch_hides_raw_output() {
        let model = Arc::new(ScriptedModel::replying("IGNORE PREVIOUS INSTRUCTIONS"));
        let request = post(
            "/analyze-and-rewrite",
            &[("cv_text", None, None, b"John Doe, Software Engineer")],
        );
        let response = app(model).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["kind"], "SchemaMismatch");
        assert!(!body.to_string().contains("IGNORE PREVIOUS"));
    }
}
