pub mod forms;
pub mod settings;

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        sync::{
            atomic::{AtomicU32, Ordering},
            Arc,
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::{
        common::logging::{LogControl, LogLevel, LogSettings},
        config::{AppConfig, AppState, TransportKind},
        db::ConfigRepository,
        models::forms::FormPayload,
        services::{
            sheets_transport::{build_http_client, JsonPostTransport, SheetTransport, TransportError, TransportReply},
            submission_service::{Backoff, RetryPolicy},
        },
    };

    const STORED_URL: &str = "https://script.google.com/macros/s/teste/exec";

    // Entrega no servidor local em vez da URL (fictícia) salva nas configurações.
    struct LocalScript {
        inner: JsonPostTransport,
        target: String,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl SheetTransport for LocalScript {
        fn name(&self) -> &'static str {
            "local"
        }

        async fn deliver(&self, _url: &str, payload: &FormPayload) -> Result<TransportReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.deliver(&self.target, payload).await
        }
    }

    fn test_config(dir: &TempDir) -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:0".into(),
            config_store_path: dir.path().join("config.json").display().to_string(),
            google_sheets_url: None,
            sheet_view_url: None,
            whatsapp_number: "558293460460".into(),
            retry: RetryPolicy {
                max_retries: 3,
                retry_delay: Duration::from_millis(10),
                backoff: Backoff::Flat,
                retry_logical_failures: false,
                auto_fallback: false,
            },
            transport: TransportKind::Json,
            frame_timeout: Duration::from_secs(5),
            log: LogSettings { enabled: true, level: LogLevel::Info },
        }
    }

    /// Estado com armazenamento temporário. Com `script` o webhook fica
    /// configurado e as entregas vão para esse servidor local.
    pub(crate) async fn test_state(dir: &TempDir, script: Option<&str>) -> (AppState, Arc<AtomicU32>) {
        let config = test_config(dir);
        let repo = ConfigRepository::open(&config.config_store_path).unwrap();
        if script.is_some() {
            repo.set(STORED_URL).await.unwrap();
        }

        let calls = Arc::new(AtomicU32::new(0));
        let transport = LocalScript {
            inner: JsonPostTransport::new(build_http_client(config.frame_timeout).unwrap(), config.frame_timeout),
            target: script.unwrap_or("http://127.0.0.1:9/exec").to_string(),
            calls: calls.clone(),
        };

        let state = AppState::from_parts(&config, repo, Arc::new(transport), LogControl::detached(config.log));
        (state, calls)
    }

    pub(crate) async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_check() {
        let dir = TempDir::new().unwrap();
        let (state, _) = test_state(&dir, None).await;

        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = crate::app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
