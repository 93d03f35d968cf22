// src/config.rs
use serde::Deserialize;
use std::env;
use anyhow::Result;
use config::{Config as Loader, Environment, File};

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_token: String,

    // Бэкенд сравнения
    pub backend_base_url: String,
    pub csrf_token: String,
    pub session_cookie: String,

    // Отображение
    #[serde(default = "default_history_display_limit")]
    pub history_display_limit: usize, // Сколько последних сравнений показывать

    #[serde(default = "default_show_history")]
    pub show_history: bool, // Есть ли область истории на дашборде

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// --- Функции для значений по умолчанию ---
fn default_history_display_limit() -> usize { 5 }
fn default_show_history() -> bool { true }
fn default_request_timeout_secs() -> u64 { 10 }

impl Config {
    pub fn load() -> Result<Self> {
        let file = env::var("CAPCMP_CONFIG").unwrap_or_else(|_| "Config.toml".into());
        let loader = Loader::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::with_prefix("CAPCMP").separator("__"))
            .build()?;
        Ok(loader.try_deserialize()?)
    }
}
