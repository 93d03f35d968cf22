// src/notifier/commands.rs

use crate::backend::Backend;
use crate::comparison::ComparisonClient;
use crate::config::Config;
use crate::models::{AssetType, FormState};
use super::{
    asset_type_keyboard, callback_data, Command, Dashboard, DashboardStorage, StateStorage,
    UserState,
};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

const COMPARE_USAGE: &str =
    "Использование: /compare <stock|crypto> <TICKER1> <stock|crypto> <TICKER2>\nНапример: /compare stock AAPL crypto BTC\nИли /compare без аргументов для пошагового диалога.";

// Вспомогательная функция для "чистки" чата
async fn cleanup_chat(bot: &Bot, chat_id: ChatId, user_msg_id: MessageId, bot_msg_id: Option<i32>) {
    if let Some(id_int) = bot_msg_id {
        if let Err(e) = bot.delete_message(chat_id, MessageId(id_int)).await {
            warn!("Failed to delete previous bot message {}: {}", id_int, e);
        }
    }
    if let Err(e) = bot.delete_message(chat_id, user_msg_id).await {
        warn!("Failed to delete user command message {}: {}", user_msg_id, e);
    }
}

// Основной обработчик команд
pub async fn handle_command<B>(
    bot: Bot,
    msg: Message,
    cmd: Command,
    client: Arc<ComparisonClient<B>>,
    state_storage: StateStorage,
    dashboards: DashboardStorage,
    cfg: Config,
) -> anyhow::Result<()>
where
    B: Backend + Send + Sync + 'static,
{
    let chat_id = msg.chat.id;
    let message_id = msg.id;

    // Сброс незавершённого диалога и чистка чата при получении новой команды
    let mut previous_bot_message_id: Option<i32> = None;
    {
        let mut state_guard = state_storage
            .write()
            .expect("Failed to acquire write lock on state storage");
        if let Some(old_state) = state_guard.get(&chat_id) {
            previous_bot_message_id = match old_state {
                UserState::AwaitingAssetType1 { last_bot_message_id } => *last_bot_message_id,
                UserState::AwaitingTicker1 { last_bot_message_id, .. } => *last_bot_message_id,
                UserState::AwaitingAssetType2 { last_bot_message_id, .. } => *last_bot_message_id,
                UserState::AwaitingTicker2 { last_bot_message_id, .. } => *last_bot_message_id,
                UserState::None => None,
            };
        }
        if !matches!(state_guard.get(&chat_id), Some(UserState::None) | None) {
            info!("Resetting user state for {} due to new command: {:?}", chat_id, cmd);
            state_guard.insert(chat_id, UserState::None);
        }
    }
    cleanup_chat(&bot, chat_id, message_id, previous_bot_message_id).await;

    match cmd {
        Command::Help => {
            let kb = InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback("📊 Сравнить", callback_data::COMPARE),
                InlineKeyboardButton::callback("🕓 История", callback_data::HISTORY_REFRESH),
            ]]);
            bot.send_message(chat_id, Command::descriptions().to_string())
                .reply_markup(kb)
                .await?;
        }

        Command::Start => {
            // Открываем дашборд чата
            {
                let mut dashboards_guard = dashboards
                    .write()
                    .expect("Failed to acquire write lock on dashboards");
                dashboards_guard
                    .entry(chat_id)
                    .or_insert_with(|| Dashboard::new(cfg.show_history));
            }
            bot.send_message(
                chat_id,
                "📊 Сравнение рыночных капитализаций.\n/compare — новое сравнение, /history — последние сравнения.",
            )
            .await?;

            // Автозагрузка истории при открытии — только если область истории есть
            let has_history_region = {
                let dashboards_guard = dashboards
                    .read()
                    .expect("Failed to acquire read lock on dashboards");
                dashboards_guard
                    .get(&chat_id)
                    .map(|d| d.history.is_some())
                    .unwrap_or(false)
            };
            if has_history_region {
                refresh_history(&bot, chat_id, client.as_ref(), &dashboards, cfg.show_history).await?;
            } else {
                info!("History region disabled, skipping initial load for chat_id: {}", chat_id);
            }
        }

        Command::Compare(arg) => {
            let arg = arg.trim().to_string();
            if arg.is_empty() {
                // Пошаговый диалог: начинаем с типа первого актива
                info!("Starting compare dialog for chat_id: {}", chat_id);
                let bot_msg = bot
                    .send_message(chat_id, "Выберите тип первого актива:")
                    .reply_markup(asset_type_keyboard(1))
                    .await?;
                let mut state_guard = state_storage.write().expect("Lock failed");
                state_guard.insert(
                    chat_id,
                    UserState::AwaitingAssetType1 { last_bot_message_id: Some(bot_msg.id.0) },
                );
            } else {
                // Однострочный вариант: /compare stock AAPL crypto BTC
                let parts: Vec<&str> = arg.split_whitespace().collect();
                if parts.len() != 4 {
                    bot.send_message(chat_id, COMPARE_USAGE).await?;
                    return Ok(());
                }
                let asset_type_1: AssetType = match parts[0].parse() {
                    Ok(t) => t,
                    Err(e) => {
                        bot.send_message(chat_id, format!("⚠️ {}", e)).await?;
                        return Ok(());
                    }
                };
                let asset_type_2: AssetType = match parts[2].parse() {
                    Ok(t) => t,
                    Err(e) => {
                        bot.send_message(chat_id, format!("⚠️ {}", e)).await?;
                        return Ok(());
                    }
                };
                let form = FormState {
                    asset_type_1: Some(asset_type_1),
                    ticker_1: parts[1].to_string(),
                    asset_type_2: Some(asset_type_2),
                    ticker_2: parts[3].to_string(),
                };
                run_submit_flow(&bot, chat_id, client.as_ref(), &dashboards, cfg.show_history, form)
                    .await?;
            }
        }

        Command::History => {
            refresh_history(&bot, chat_id, client.as_ref(), &dashboards, cfg.show_history).await?;
        }
    }
    Ok(())
}

/// Один цикл отправки: индикатор → запрос → область результата →
/// отображение итога обновления истории. При ошибке область результата
/// не меняется, показывается только сообщение ошибки (аналог alert).
pub(super) async fn run_submit_flow<B>(
    bot: &Bot,
    chat_id: ChatId,
    client: &ComparisonClient<B>,
    dashboards: &DashboardStorage,
    show_history: bool,
    mut form: FormState,
) -> anyhow::Result<()>
where
    B: Backend + Send + Sync + 'static,
{
    let indicator = bot.send_message(chat_id, "⏳ Выполняю сравнение...").await?;

    match client.submit_and_refresh(&mut form).await {
        Ok(outcome) => {
            // Область результата: очистить и добавить единственную строку
            let (results_text, existing_results_id) = {
                let mut guard = dashboards
                    .write()
                    .expect("Failed to acquire write lock on dashboards");
                let dashboard = guard
                    .entry(chat_id)
                    .or_insert_with(|| Dashboard::new(show_history));
                dashboard.results.replace(vec![outcome.result_line.clone()]);
                (
                    format!("📊 Результат:\n{}", dashboard.results.render()),
                    dashboard.results_message_id,
                )
            };

            let results_id = match existing_results_id {
                Some(id) => {
                    // Область уже есть в чате — редактируем её, индикатор убираем
                    if let Err(e) = bot.edit_message_text(chat_id, MessageId(id), results_text).await {
                        warn!("Failed to edit results message {}: {}", id, e);
                    }
                    if let Err(e) = bot.delete_message(chat_id, indicator.id).await {
                        warn!("Failed to delete indicator message: {}", e);
                    }
                    id
                }
                None => {
                    bot.edit_message_text(chat_id, indicator.id, results_text).await?;
                    indicator.id.0
                }
            };
            {
                let mut guard = dashboards
                    .write()
                    .expect("Failed to acquire write lock on dashboards");
                if let Some(dashboard) = guard.get_mut(&chat_id) {
                    dashboard.results_message_id = Some(results_id);
                }
            }

            // Обновление истории клиент уже выполнил; рисуем его итог
            match outcome.history {
                Ok(lines) => render_history(bot, chat_id, dashboards, lines).await?,
                Err(e) => {
                    error!("History refresh after submission failed for chat_id {}: {}", chat_id, e);
                    bot.send_message(chat_id, format!("❌ Не удалось обновить историю: {}", e))
                        .await?;
                }
            }
        }
        Err(e) => {
            error!("Comparison submission failed for chat_id {}: {}", chat_id, e);
            bot.edit_message_text(chat_id, indicator.id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

/// Запрашивает историю и перерисовывает её область.
pub(super) async fn refresh_history<B>(
    bot: &Bot,
    chat_id: ChatId,
    client: &ComparisonClient<B>,
    dashboards: &DashboardStorage,
    show_history: bool,
) -> anyhow::Result<()>
where
    B: Backend + Send + Sync + 'static,
{
    let region_exists = {
        let mut guard = dashboards
            .write()
            .expect("Failed to acquire write lock on dashboards");
        let dashboard = guard
            .entry(chat_id)
            .or_insert_with(|| Dashboard::new(show_history));
        dashboard.history.is_some()
    };
    if !region_exists {
        bot.send_message(chat_id, "ℹ️ Отображение истории отключено.").await?;
        return Ok(());
    }

    match client.fetch_history().await {
        Ok(lines) => render_history(bot, chat_id, dashboards, lines).await?,
        Err(e) => {
            // Область остаётся в прежнем состоянии
            error!("History fetch failed for chat_id {}: {}", chat_id, e);
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
    }
    Ok(())
}

/// Полная замена области истории и её сообщения в чате.
async fn render_history(
    bot: &Bot,
    chat_id: ChatId,
    dashboards: &DashboardStorage,
    lines: Vec<String>,
) -> anyhow::Result<()> {
    let (text, existing_id) = {
        let mut guard = dashboards
            .write()
            .expect("Failed to acquire write lock on dashboards");
        let Some(dashboard) = guard.get_mut(&chat_id) else {
            return Ok(());
        };
        let Some(history) = dashboard.history.as_mut() else {
            // Области истории нет — ничего не рисуем
            return Ok(());
        };
        history.replace(lines);
        let text = if history.is_empty() {
            "🕓 История сравнений пуста.".to_string()
        } else {
            format!("🕓 Последние сравнения:\n{}", history.render())
        };
        (text, dashboard.history_message_id)
    };

    let message_id = match existing_id {
        Some(id) => {
            // Повторная отрисовка тех же данных даёт тот же текст — ошибку
            // "not modified" просто игнорируем
            if let Err(e) = bot.edit_message_text(chat_id, MessageId(id), text).await {
                warn!("Failed to edit history message {}: {}", id, e);
            }
            id
        }
        None => {
            let m = bot.send_message(chat_id, text).await?;
            m.id.0
        }
    };
    {
        let mut guard = dashboards
            .write()
            .expect("Failed to acquire write lock on dashboards");
        if let Some(dashboard) = guard.get_mut(&chat_id) {
            dashboard.history_message_id = Some(message_id);
        }
    }
    Ok(())
}
