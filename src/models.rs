// src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Тип актива. На проводе — строчный тег ("stock" / "crypto");
/// бэкенд не различает категории глубже этого тега.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Crypto,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetType::Stock => write!(f, "stock"),
            AssetType::Crypto => write!(f, "crypto"),
        }
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Ok(AssetType::Stock),
            "crypto" => Ok(AssetType::Crypto),
            other => Err(format!("Неизвестный тип актива: `{}`. Ожидается stock или crypto.", other)),
        }
    }
}

/// Состояние формы сравнения: две пары (тип актива, тикер).
/// `None` в типе — аналог "ни одна радиокнопка не выбрана".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub asset_type_1: Option<AssetType>,
    pub ticker_1: String,
    pub asset_type_2: Option<AssetType>,
    pub ticker_2: String,
}

impl FormState {
    /// Нормализация тикера перед отправкой: trim + верхний регистр (идемпотентна).
    pub fn normalize_ticker(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    /// Собирает тело запроса к бэкенду. Отправка блокируется, пока не выбраны
    /// оба типа актива и не заполнены оба тикера — запрос с неопределённым
    /// типом никогда не уходит.
    pub fn to_request(&self, csrf_token: &str) -> Result<ComparisonRequest, String> {
        let asset_type_1 = self
            .asset_type_1
            .ok_or_else(|| "Не выбран тип первого актива.".to_string())?;
        let asset_type_2 = self
            .asset_type_2
            .ok_or_else(|| "Не выбран тип второго актива.".to_string())?;

        let ticker_1 = Self::normalize_ticker(&self.ticker_1);
        let ticker_2 = Self::normalize_ticker(&self.ticker_2);
        if ticker_1.is_empty() {
            return Err("Не указан тикер первого актива.".to_string());
        }
        if ticker_2.is_empty() {
            return Err("Не указан тикер второго актива.".to_string());
        }

        Ok(ComparisonRequest {
            asset_type_1,
            ticker_1,
            asset_type_2,
            ticker_2,
            csrf_token: csrf_token.to_string(),
        })
    }

    /// Сбрасывает все четыре контрола (как reset формы после успешной отправки).
    pub fn clear(&mut self) {
        *self = FormState::default();
    }
}

/// Тело POST /handle_comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRequest {
    pub asset_type_1: AssetType,
    pub ticker_1: String,
    pub asset_type_2: AssetType,
    pub ticker_2: String,
    pub csrf_token: String,
}

/// Результат сравнения из ответа бэкенда; используется ровно один раз
/// для построения строки результата.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ComparisonResult {
    pub multiple: f64,
    pub percentage_change: f64,
}

/// Одна запись истории сравнений (бэкенд отдаёт новые первыми)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryEntry {
    pub comparison_timestamp: String,
    pub name_1: String,
    pub name_2: String,
    pub percent_difference: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ticker_uppercases_and_is_idempotent() {
        let once = FormState::normalize_ticker(" aapl ");
        assert_eq!(once, "AAPL");
        assert_eq!(FormState::normalize_ticker(&once), once);
    }

    #[test]
    fn test_asset_type_parse() {
        assert_eq!("stock".parse::<AssetType>().unwrap(), AssetType::Stock);
        assert_eq!("CRYPTO".parse::<AssetType>().unwrap(), AssetType::Crypto);
        assert!("bond".parse::<AssetType>().is_err());
    }

    #[test]
    fn test_to_request_blocks_unchecked_asset_type() {
        let form = FormState {
            asset_type_1: None,
            ticker_1: "aapl".to_string(),
            asset_type_2: Some(AssetType::Stock),
            ticker_2: "msft".to_string(),
        };
        assert!(form.to_request("token").is_err());
    }

    #[test]
    fn test_to_request_blocks_empty_ticker() {
        let form = FormState {
            asset_type_1: Some(AssetType::Stock),
            ticker_1: "   ".to_string(),
            asset_type_2: Some(AssetType::Crypto),
            ticker_2: "btc".to_string(),
        };
        assert!(form.to_request("token").is_err());
    }

    #[test]
    fn test_to_request_uppercases_tickers() {
        let form = FormState {
            asset_type_1: Some(AssetType::Stock),
            ticker_1: "aapl".to_string(),
            asset_type_2: Some(AssetType::Stock),
            ticker_2: "msft".to_string(),
        };
        let req = form.to_request("token").unwrap();
        assert_eq!(req.ticker_1, "AAPL");
        assert_eq!(req.ticker_2, "MSFT");
        assert_eq!(req.csrf_token, "token");
    }

    #[test]
    fn test_clear_resets_all_controls() {
        let mut form = FormState {
            asset_type_1: Some(AssetType::Stock),
            ticker_1: "AAPL".to_string(),
            asset_type_2: Some(AssetType::Crypto),
            ticker_2: "BTC".to_string(),
        };
        form.clear();
        assert_eq!(form, FormState::default());
    }

    #[test]
    fn test_request_wire_format() {
        let req = ComparisonRequest {
            asset_type_1: AssetType::Stock,
            ticker_1: "AAPL".to_string(),
            asset_type_2: AssetType::Crypto,
            ticker_2: "BTC".to_string(),
            csrf_token: "tok".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["asset_type_1"], "stock");
        assert_eq!(json["asset_type_2"], "crypto");
        assert_eq!(json["ticker_1"], "AAPL");
        assert_eq!(json["csrf_token"], "tok");
    }
}
