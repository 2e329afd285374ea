// src/services/transport_monitor.rs

use async_trait::async_trait;
use serde_json::json;

use crate::{
    common::logging::{log, LogLevel},
    models::forms::FormPayload,
    services::sheets_transport::{SheetTransport, TransportError, TransportReply},
};

/// Decorador aplicado onde o transporte é montado: registra o início de cada
/// chamada, status não-2xx e, em destaque, bloqueios de origem cruzada.
pub struct MonitoredTransport<T> {
    inner: T,
}

impl<T: SheetTransport> MonitoredTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: SheetTransport> SheetTransport for MonitoredTransport<T> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn deliver(&self, url: &str, payload: &FormPayload) -> Result<TransportReply, TransportError> {
        let context = json!({ "transport": self.inner.name(), "formType": payload.form_type() });
        log(LogLevel::Debug, &format!("🌐 Envio iniciado: {url}"), Some(&context));

        let outcome = self.inner.deliver(url, payload).await;

        match &outcome {
            Ok(reply) => {
                log(LogLevel::Debug, &format!("✅ Envio bem-sucedido: {url}"), Some(&json!({ "status": reply.status })));
            }
            Err(TransportError::Http(status)) => {
                log(LogLevel::Warn, &format!("⚠️ Envio retornou status: {status} para {url}"), Some(&context));
            }
            Err(err @ TransportError::CrossOrigin(_)) => {
                log(LogLevel::Error, &format!("🚫 Erro de CORS detectado: {url}"), Some(&json!({ "erro": err.to_string() })));
                log(LogLevel::Info, "Tente usar um dos métodos alternativos de envio de dados.", None);
            }
            Err(err) => {
                log(LogLevel::Error, &format!("❌ Envio falhou para: {url}"), Some(&json!({ "erro": err.to_string() })));
            }
        }

        outcome
    }
}
