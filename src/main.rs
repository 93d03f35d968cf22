mod backend;
mod comparison;
mod config;
mod logger;
mod models;
mod notifier;
mod telegram;
mod view;

use anyhow::Result;
use teloxide::Bot;

use crate::backend::{Backend, HttpBackend};
use crate::comparison::ComparisonClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // 1) конфиг и логгер
    let cfg = config::Config::load()?;
    logger::init(&cfg);

    // 2) Telegram-бот
    let bot = Bot::new(&cfg.telegram_token);

    // 3) клиент бэкенда + ping
    let backend = HttpBackend::new(
        &cfg.backend_base_url,
        &cfg.session_cookie,
        cfg.request_timeout_secs,
    )?;
    backend.check_connection().await?;

    let client = ComparisonClient::new(backend, cfg.csrf_token.clone(), cfg.history_display_limit);

    // 4) запускаем диспетчер
    telegram::run(bot, client, cfg).await;
    Ok(())
}
