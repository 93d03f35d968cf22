// src/notifier/callbacks.rs

use crate::backend::Backend;
use crate::comparison::ComparisonClient;
use crate::config::Config;
use crate::models::AssetType;
use super::{
    asset_type_keyboard, callback_data, cancel_keyboard, commands, DashboardStorage, StateStorage,
    UserState,
};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{info, warn};

pub async fn handle_callback<B>(
    bot: Bot,
    q: CallbackQuery,
    client: Arc<ComparisonClient<B>>,
    state_storage: StateStorage,
    dashboards: DashboardStorage,
    cfg: Config,
) -> anyhow::Result<()>
where
    B: Backend + Send + Sync + 'static,
{
    if let Some(data) = q.data {
        let message = q.message.as_ref().expect("Callback query without message");
        let chat_id = message.chat().id;
        let message_id = message.id();

        // Отвечаем сразу, чтобы убрать "часики" на кнопке
        let _ = bot.answer_callback_query(q.id.clone()).await;

        match data.as_str() {
            // --- Начало диалога сравнения ---
            callback_data::COMPARE => {
                info!("Starting compare dialog via callback for chat_id: {}", chat_id);
                let _ = bot
                    .edit_message_text(chat_id, message_id, "Выберите тип первого актива:")
                    .reply_markup(asset_type_keyboard(1))
                    .await;
                let mut state_guard = state_storage.write().expect("Lock failed");
                state_guard.insert(
                    chat_id,
                    UserState::AwaitingAssetType1 { last_bot_message_id: Some(message_id.0) },
                );
            }

            // --- Тип первого актива (пара взаимоисключающих кнопок) ---
            callback_data::ASSET1_STOCK | callback_data::ASSET1_CRYPTO => {
                let expected = {
                    let state_guard = state_storage.read().expect("Lock failed");
                    matches!(state_guard.get(&chat_id), Some(UserState::AwaitingAssetType1 { .. }))
                };
                if !expected {
                    warn!("Unexpected asset type 1 callback for chat_id: {}", chat_id);
                    return Ok(());
                }

                let asset_type_1 = if data == callback_data::ASSET1_STOCK {
                    AssetType::Stock
                } else {
                    AssetType::Crypto
                };
                let _ = bot
                    .edit_message_text(
                        chat_id,
                        message_id,
                        format!("Тип 1: {}.\nВведите тикер первого актива (например, AAPL):", asset_type_1),
                    )
                    .reply_markup(cancel_keyboard())
                    .await;
                let mut state_guard = state_storage.write().expect("Lock failed");
                state_guard.insert(
                    chat_id,
                    UserState::AwaitingTicker1 {
                        asset_type_1,
                        last_bot_message_id: Some(message_id.0),
                    },
                );
            }

            // --- Тип второго актива ---
            callback_data::ASSET2_STOCK | callback_data::ASSET2_CRYPTO => {
                let partial = {
                    let state_guard = state_storage.read().expect("Lock failed");
                    match state_guard.get(&chat_id) {
                        Some(UserState::AwaitingAssetType2 { asset_type_1, ticker_1, .. }) => {
                            Some((*asset_type_1, ticker_1.clone()))
                        }
                        _ => None,
                    }
                };
                let Some((asset_type_1, ticker_1)) = partial else {
                    warn!("Unexpected asset type 2 callback for chat_id: {}", chat_id);
                    return Ok(());
                };

                let asset_type_2 = if data == callback_data::ASSET2_STOCK {
                    AssetType::Stock
                } else {
                    AssetType::Crypto
                };
                let _ = bot
                    .edit_message_text(
                        chat_id,
                        message_id,
                        format!(
                            "{} {} против типа {}.\nВведите тикер второго актива (например, MSFT):",
                            asset_type_1, ticker_1, asset_type_2
                        ),
                    )
                    .reply_markup(cancel_keyboard())
                    .await;
                let mut state_guard = state_storage.write().expect("Lock failed");
                state_guard.insert(
                    chat_id,
                    UserState::AwaitingTicker2 {
                        asset_type_1,
                        ticker_1,
                        asset_type_2,
                        last_bot_message_id: Some(message_id.0),
                    },
                );
            }

            // --- Обновление истории ---
            callback_data::HISTORY_REFRESH => {
                commands::refresh_history(&bot, chat_id, client.as_ref(), &dashboards, cfg.show_history)
                    .await?;
            }

            // --- Отмена диалога ---
            callback_data::CANCEL_DIALOG => {
                {
                    let mut state_guard = state_storage.write().expect("Lock failed");
                    state_guard.insert(chat_id, UserState::None);
                }
                let _ = bot
                    .edit_message_text(chat_id, message_id, "❌ Диалог отменён.")
                    .await;
            }

            other => {
                warn!("Unknown callback data `{}` from chat_id: {}", other, chat_id);
            }
        }
    }
    Ok(())
}
