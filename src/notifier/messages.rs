// src/notifier/messages.rs

use crate::backend::Backend;
use crate::comparison::ComparisonClient;
use crate::config::Config;
use crate::models::FormState;
use super::{asset_type_keyboard, cancel_keyboard, commands, DashboardStorage, StateStorage, UserState};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{info, warn};

/// Текстовый ввод: шаги диалога, где ожидается тикер.
pub async fn handle_message<B>(
    bot: Bot,
    msg: Message,
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
    let ticker = FormState::normalize_ticker(msg.text().unwrap_or(""));

    let state = {
        let state_guard = state_storage.read().expect("Lock failed");
        state_guard.get(&chat_id).cloned()
    };

    match state {
        Some(UserState::AwaitingTicker1 { asset_type_1, last_bot_message_id }) => {
            // Убираем сообщение пользователя из чата
            if let Err(e) = bot.delete_message(chat_id, message_id).await {
                warn!("Failed to delete user ticker message: {}", e);
            }

            if ticker.is_empty() {
                if let Some(id) = last_bot_message_id {
                    let _ = bot
                        .edit_message_text(
                            chat_id,
                            MessageId(id),
                            "⚠️ Введите непустой тикер первого актива (например, AAPL):",
                        )
                        .reply_markup(cancel_keyboard())
                        .await;
                }
                return Ok(());
            }

            info!("Chat {} entered ticker 1: {}", chat_id, ticker);
            if let Some(id) = last_bot_message_id {
                let _ = bot
                    .edit_message_text(
                        chat_id,
                        MessageId(id),
                        format!("{} {}.\nВыберите тип второго актива:", asset_type_1, ticker),
                    )
                    .reply_markup(asset_type_keyboard(2))
                    .await;
            }
            let mut state_guard = state_storage.write().expect("Lock failed");
            state_guard.insert(
                chat_id,
                UserState::AwaitingAssetType2 {
                    asset_type_1,
                    ticker_1: ticker,
                    last_bot_message_id,
                },
            );
        }

        Some(UserState::AwaitingTicker2 { asset_type_1, ticker_1, asset_type_2, last_bot_message_id }) => {
            if let Err(e) = bot.delete_message(chat_id, message_id).await {
                warn!("Failed to delete user ticker message: {}", e);
            }

            if ticker.is_empty() {
                if let Some(id) = last_bot_message_id {
                    let _ = bot
                        .edit_message_text(
                            chat_id,
                            MessageId(id),
                            "⚠️ Введите непустой тикер второго актива (например, MSFT):",
                        )
                        .reply_markup(cancel_keyboard())
                        .await;
                }
                return Ok(());
            }

            info!("Chat {} entered ticker 2: {}, submitting", chat_id, ticker);

            // Диалог окончен: сбрасываем состояние и убираем подсказку
            {
                let mut state_guard = state_storage.write().expect("Lock failed");
                state_guard.insert(chat_id, UserState::None);
            }
            if let Some(id) = last_bot_message_id {
                if let Err(e) = bot.delete_message(chat_id, MessageId(id)).await {
                    warn!("Failed to delete dialog prompt message: {}", e);
                }
            }

            let form = FormState {
                asset_type_1: Some(asset_type_1),
                ticker_1,
                asset_type_2: Some(asset_type_2),
                ticker_2: ticker,
            };
            commands::run_submit_flow(
                &bot,
                chat_id,
                client.as_ref(),
                &dashboards,
                cfg.show_history,
                form,
            )
            .await?;
        }

        Some(UserState::AwaitingAssetType1 { .. }) | Some(UserState::AwaitingAssetType2 { .. }) => {
            bot.send_message(chat_id, "Выберите тип актива кнопкой выше.").await?;
        }

        _ => {
            bot.send_message(chat_id, "Сейчас нет активного диалога. Используйте /compare или /help.")
                .await?;
        }
    }

    Ok(())
}
