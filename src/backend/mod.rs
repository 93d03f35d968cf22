// src/backend/mod.rs
pub mod http;

pub use http::HttpBackend;

use crate::models::{ComparisonRequest, ComparisonResult, HistoryEntry};
use async_trait::async_trait;
use std::fmt;

/// Единственный вид ошибки запроса: человекочитаемое сообщение сервера,
/// либо запасной текст, если структурного сообщения нет. Не повторяем
/// запрос и не восстанавливаемся — сообщение показывается пользователю
/// и пишется в лог.
#[derive(Debug, Clone)]
pub struct RequestFailed {
    pub message: String,
}

impl fmt::Display for RequestFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RequestFailed {}

#[async_trait]
pub trait Backend {
    async fn check_connection(&self) -> anyhow::Result<()>;
    async fn submit_comparison(&self, request: &ComparisonRequest) -> anyhow::Result<ComparisonResult>;
    async fn fetch_history(&self) -> anyhow::Result<Vec<HistoryEntry>>;
}
