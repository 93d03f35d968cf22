// src/comparison.rs

use crate::backend::Backend;
use crate::models::{ComparisonResult, FormState, HistoryEntry};
use anyhow::Result;
use chrono::DateTime;
use tracing::info;

/// Итог успешной отправки: одна строка результата и итог обновления истории.
/// Ошибка обновления истории не откатывает результат и сброс формы.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub result_line: String,
    pub history: Result<Vec<String>>,
}

/// Оркестратор одного цикла запрос/ответ поверх [`Backend`].
/// Собственного состояния между вызовами не держит.
#[derive(Debug, Clone)]
pub struct ComparisonClient<B> {
    backend: B,
    csrf_token: String,
    display_limit: usize,
}

impl<B: Backend> ComparisonClient<B> {
    pub fn new(backend: B, csrf_token: String, display_limit: usize) -> Self {
        Self { backend, csrf_token, display_limit }
    }

    /// Полный цикл отправки: валидация формы → POST → строка результата →
    /// сброс формы → ровно одно обновление истории (дожидаемся его).
    /// При ошибке отправки форма остаётся нетронутой.
    pub async fn submit_and_refresh(&self, form: &mut FormState) -> Result<SubmitOutcome> {
        let request = form.to_request(&self.csrf_token).map_err(anyhow::Error::msg)?;
        info!(
            "Submitting comparison: {} {} vs {} {}",
            request.asset_type_1, request.ticker_1, request.asset_type_2, request.ticker_2
        );

        let result = self.backend.submit_comparison(&request).await?;
        let result_line = result_message(&request.ticker_1, &request.ticker_2, &result);
        form.clear();

        let history = self.fetch_history().await;
        Ok(SubmitOutcome { result_line, history })
    }

    /// Первые K строк истории (K = display_limit), в порядке ответа бэкенда
    /// (новые первыми). Повторный вызов с теми же данными даёт те же строки.
    pub async fn fetch_history(&self) -> Result<Vec<String>> {
        let entries = self.backend.fetch_history().await?;
        Ok(entries.iter().take(self.display_limit).map(history_line).collect())
    }
}

/// Текст результата; формулировка зависит от знака percentage_change,
/// ноль попадает в ветку "greater than".
pub fn result_message(ticker_1: &str, ticker_2: &str, result: &ComparisonResult) -> String {
    let ComparisonResult { multiple, percentage_change } = *result;
    if percentage_change < 0.0 {
        format!(
            "{t2}'s Market Cap is {pc}% of {t1}'s. {t2} would have to perform a {m}x to reach {t1}'s current valuation.",
            t1 = ticker_1,
            t2 = ticker_2,
            pc = percentage_change,
            m = multiple,
        )
    } else {
        format!(
            "{t2}'s Market Cap is {pc}% greater than {t1}'s. {t1} would have to perform a {m}x to reach {t2}'s current valuation.",
            t1 = ticker_1,
            t2 = ticker_2,
            pc = percentage_change,
            m = multiple,
        )
    }
}

/// Строка истории. Метка времени приводится к короткому виду, если бэкенд
/// отдал её в RFC 2822, иначе показывается как есть.
pub fn history_line(entry: &HistoryEntry) -> String {
    let ts = DateTime::parse_from_rfc2822(&entry.comparison_timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| entry.comparison_timestamp.clone());
    format!(
        "Date: {} | {} compared to {} | Percent Change: {} to {} is {}%",
        ts, entry.name_1, entry.name_2, entry.name_1, entry.name_2, entry.percent_difference,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, RequestFailed};
    use crate::models::{AssetType, ComparisonRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Бэкенд-заглушка: фиксированный ответ плюс счётчики вызовов
    #[derive(Debug, Clone)]
    struct StubBackend {
        result: Option<ComparisonResult>, // None => RequestFailed с error_message
        error_message: String,
        history: Vec<HistoryEntry>,
        history_calls: Arc<AtomicUsize>,
        last_request: Arc<Mutex<Option<ComparisonRequest>>>,
    }

    impl StubBackend {
        fn ok(result: ComparisonResult, history: Vec<HistoryEntry>) -> Self {
            Self {
                result: Some(result),
                error_message: String::new(),
                history,
                history_calls: Arc::new(AtomicUsize::new(0)),
                last_request: Arc::new(Mutex::new(None)),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                result: None,
                error_message: message.to_string(),
                history: Vec::new(),
                history_calls: Arc::new(AtomicUsize::new(0)),
                last_request: Arc::new(Mutex::new(None)),
            }
        }
    }

    #[async_trait]
    impl Backend for StubBackend {
        async fn check_connection(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn submit_comparison(
            &self,
            request: &ComparisonRequest,
        ) -> anyhow::Result<ComparisonResult> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            match self.result {
                Some(r) => Ok(r),
                None => Err(RequestFailed { message: self.error_message.clone() }.into()),
            }
        }

        async fn fetch_history(&self) -> anyhow::Result<Vec<HistoryEntry>> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.history.clone())
        }
    }

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            comparison_timestamp: format!("ts-{}", n),
            name_1: format!("A{}", n),
            name_2: format!("B{}", n),
            percent_difference: n as f64,
        }
    }

    fn filled_form() -> FormState {
        FormState {
            asset_type_1: Some(AssetType::Stock),
            ticker_1: "aapl".to_string(),
            asset_type_2: Some(AssetType::Stock),
            ticker_2: "msft".to_string(),
        }
    }

    #[test]
    fn test_result_message_positive_branch_exact() {
        // Пример из ТЗ: aapl/msft, multiple 1.5, percentage_change 50
        let msg = result_message(
            "AAPL",
            "MSFT",
            &ComparisonResult { multiple: 1.5, percentage_change: 50.0 },
        );
        assert_eq!(
            msg,
            "MSFT's Market Cap is 50% greater than AAPL's. AAPL would have to perform a 1.5x to reach MSFT's current valuation."
        );
    }

    #[test]
    fn test_result_message_zero_takes_greater_branch() {
        let msg = result_message(
            "AAPL",
            "MSFT",
            &ComparisonResult { multiple: 1.0, percentage_change: 0.0 },
        );
        assert!(msg.contains("greater than"));
    }

    #[test]
    fn test_result_message_negative_branch() {
        let msg = result_message(
            "AAPL",
            "MSFT",
            &ComparisonResult { multiple: 2.0, percentage_change: -50.0 },
        );
        assert_eq!(
            msg,
            "MSFT's Market Cap is -50% of AAPL's. MSFT would have to perform a 2x to reach AAPL's current valuation."
        );
    }

    #[test]
    fn test_history_line_formats_rfc2822_timestamp() {
        let line = history_line(&HistoryEntry {
            comparison_timestamp: "Wed, 27 Aug 2025 12:00:00 GMT".to_string(),
            name_1: "Apple Inc.".to_string(),
            name_2: "Microsoft Corp.".to_string(),
            percent_difference: 3.3,
        });
        assert_eq!(
            line,
            "Date: 2025-08-27 12:00 | Apple Inc. compared to Microsoft Corp. | Percent Change: Apple Inc. to Microsoft Corp. is 3.3%"
        );
    }

    #[test]
    fn test_history_line_keeps_unknown_timestamp_as_is() {
        let line = history_line(&entry(1));
        assert!(line.starts_with("Date: ts-1 | "));
    }

    #[tokio::test]
    async fn test_history_caps_at_display_limit_and_keeps_order() {
        let history: Vec<_> = (0..7).map(entry).collect();
        let backend = StubBackend::ok(
            ComparisonResult { multiple: 1.0, percentage_change: 0.0 },
            history,
        );
        let client = ComparisonClient::new(backend, "tok".to_string(), 5);

        let lines = client.fetch_history().await.unwrap();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("A0"));
        assert!(lines[4].contains("A4"));
    }

    #[tokio::test]
    async fn test_history_shorter_than_limit_shows_everything() {
        let backend = StubBackend::ok(
            ComparisonResult { multiple: 1.0, percentage_change: 0.0 },
            vec![entry(0), entry(1)],
        );
        let client = ComparisonClient::new(backend, "tok".to_string(), 5);

        let lines = client.fetch_history().await.unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn test_submit_success_clears_form_and_refreshes_history_once() {
        let backend = StubBackend::ok(
            ComparisonResult { multiple: 1.5, percentage_change: 50.0 },
            vec![entry(0)],
        );
        let history_calls = backend.history_calls.clone();
        let last_request = backend.last_request.clone();
        let client = ComparisonClient::new(backend, "tok".to_string(), 5);

        let mut form = filled_form();
        let outcome = client.submit_and_refresh(&mut form).await.unwrap();

        // Тикеры ушли на провод в верхнем регистре
        let sent = last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.ticker_1, "AAPL");
        assert_eq!(sent.ticker_2, "MSFT");

        // Форма сброшена, история запрошена ровно один раз
        assert_eq!(form, FormState::default());
        assert_eq!(history_calls.load(Ordering::SeqCst), 1);
        assert!(outcome.result_line.contains("greater than"));
        assert_eq!(outcome.history.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_form_and_skips_history() {
        let backend = StubBackend::failing("Ticker not found");
        let history_calls = backend.history_calls.clone();
        let client = ComparisonClient::new(backend, "tok".to_string(), 5);

        let mut form = filled_form();
        let err = client.submit_and_refresh(&mut form).await.unwrap_err();

        let failed = err.downcast_ref::<RequestFailed>().expect("RequestFailed expected");
        assert_eq!(failed.message, "Ticker not found");
        assert_eq!(form, filled_form());
        assert_eq!(history_calls.load(Ordering::SeqCst), 0);
    }
}
