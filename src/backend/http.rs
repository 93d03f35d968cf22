// src/backend/http.rs

use super::{Backend, RequestFailed};
use crate::models::{ComparisonRequest, ComparisonResult, HistoryEntry};
use anyhow::{anyhow, Result};
use reqwest::{header, Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Обёртка успешного ответа POST /handle_comparison
#[derive(Deserialize)]
struct ComparisonEnvelope {
    results: ComparisonResult,
}

/// Обёртка успешного ответа GET /get_user_history
#[derive(Deserialize)]
struct HistoryEnvelope {
    history: Vec<HistoryEntry>,
}

/// Тело ответа об ошибке: `{"message": "..."}`
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP-клиент бэкенда сравнения
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    session_cookie: String,
}

impl HttpBackend {
    /// `base_url` — адрес бэкенда, например `http://127.0.0.1:5000/`.
    /// `session_cookie` уходит заголовком Cookie в каждом запросе
    /// (бэкенд авторизует по сессии).
    pub fn new(base_url: &str, session_cookie: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow!("Invalid backend URL `{}`: {}", base_url, e))?;
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| anyhow!("HTTP client build error: {}", e))?;

        Ok(Self {
            client,
            base_url,
            session_cookie: session_cookie.to_string(),
        })
    }

    /// Сообщение для не-2xx ответа: `message` из тела, если бэкенд его дал,
    /// иначе запасной текст со статусом. Сетевой и прикладной отказ дальше
    /// неразличимы — оба несут одно сообщение.
    fn error_message(status: StatusCode, body: &[u8]) -> String {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(err) => err.message,
            Err(_) => format!("Request failed with status {}.", status.as_u16()),
        }
    }

    async fn call_api<T: for<'de> Deserialize<'de>>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let mut req = self
            .client
            .request(method, self.base_url.join(endpoint)?)
            .header(header::COOKIE, &self.session_cookie);
        if let Some(ref b) = body {
            req = req.json(b);
        }

        // Ответа нет вообще (обрыв, таймаут)
        let resp = req.send().await.map_err(|e| {
            tracing::error!("No response from backend `{}`: {}", endpoint, e);
            RequestFailed { message: "No response from the server.".to_string() }
        })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| {
            tracing::error!("Failed to read backend response body `{}`: {}", endpoint, e);
            RequestFailed { message: "No response from the server.".to_string() }
        })?;

        if !status.is_success() {
            let message = Self::error_message(status, &bytes);
            tracing::error!("Backend error {} from `{}`: {}", status.as_u16(), endpoint, message);
            return Err(RequestFailed { message }.into());
        }

        // Строгий разбор успешного ответа; в диагностику попадает путь до поля
        let mut de = serde_json::Deserializer::from_slice(&bytes);
        let parsed = serde_path_to_error::deserialize(&mut de)
            .map_err(|e| anyhow!("Unexpected response from `{}`: {}", endpoint, e))?;
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    /// GET / — домашняя страница бэкенда, достаточно любого 2xx
    async fn check_connection(&self) -> Result<()> {
        let resp = self
            .client
            .get(self.base_url.join("/")?)
            .header(header::COOKIE, &self.session_cookie)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("No response from backend: {}", e);
                RequestFailed { message: "No response from the server.".to_string() }
            })?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RequestFailed {
                message: format!("Request failed with status {}.", status.as_u16()),
            }
            .into())
        }
    }

    /// POST /handle_comparison
    async fn submit_comparison(&self, request: &ComparisonRequest) -> Result<ComparisonResult> {
        let envelope: ComparisonEnvelope = self
            .call_api(
                Method::POST,
                "handle_comparison",
                Some(serde_json::to_value(request)?),
            )
            .await?;
        Ok(envelope.results)
    }

    /// GET /get_user_history
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
        let envelope: HistoryEnvelope = self
            .call_api(Method::GET, "get_user_history", None)
            .await?;
        Ok(envelope.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_server_message() {
        let body = br#"{"message": "Ticker not found"}"#;
        let msg = HttpBackend::error_message(StatusCode::BAD_REQUEST, body);
        assert_eq!(msg, "Ticker not found");
    }

    #[test]
    fn test_error_message_fallback_without_structured_body() {
        let msg = HttpBackend::error_message(StatusCode::INTERNAL_SERVER_ERROR, b"<html>boom</html>");
        assert_eq!(msg, "Request failed with status 500.");
    }

    #[test]
    fn test_envelopes_decode() {
        let comparison: ComparisonEnvelope =
            serde_json::from_str(r#"{"results": {"multiple": 1.5, "percentage_change": 50}}"#).unwrap();
        assert_eq!(comparison.results.multiple, 1.5);
        assert_eq!(comparison.results.percentage_change, 50.0);

        // Лишние поля бэкенда (рыночные капитализации) игнорируются
        let history: HistoryEnvelope = serde_json::from_str(
            r#"{"history": [{
                "comparison_timestamp": "Wed, 27 Aug 2025 12:00:00 GMT",
                "name_1": "Apple Inc.",
                "asset_1_market_cap_at_comparison": 3.0e12,
                "name_2": "Microsoft Corp.",
                "asset_2_market_cap_at_comparison": 3.1e12,
                "percent_difference": 3.3
            }]}"#,
        )
        .unwrap();
        assert_eq!(history.history.len(), 1);
        assert_eq!(history.history[0].name_1, "Apple Inc.");
    }
}
