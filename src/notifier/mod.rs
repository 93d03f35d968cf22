// src/notifier/mod.rs
pub mod commands;
pub mod callbacks;
pub mod messages;

// Экспорт всех необходимых типов и функций
pub use self::commands::handle_command;
pub use self::callbacks::handle_callback;
pub use self::messages::handle_message;

use crate::models::AssetType;
use crate::view::RegionView;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::command::BotCommands;

/// Состояния пошагового диалога сравнения. Частично заполненная форма
/// переносится из состояния в состояние.
#[derive(Debug, Clone)]
pub enum UserState {
    AwaitingAssetType1 {
        last_bot_message_id: Option<i32>,
    },
    AwaitingTicker1 {
        asset_type_1: AssetType,
        last_bot_message_id: Option<i32>,
    },
    AwaitingAssetType2 {
        asset_type_1: AssetType,
        ticker_1: String,
        last_bot_message_id: Option<i32>,
    },
    AwaitingTicker2 {
        asset_type_1: AssetType,
        ticker_1: String,
        asset_type_2: AssetType,
        last_bot_message_id: Option<i32>,
    },
    None,
}

/// Тип для хранения состояний пользователей
pub type StateStorage = Arc<RwLock<HashMap<ChatId, UserState>>>;

/// Дашборд чата: две независимые области вывода и ID их сообщений.
/// Область истории существует только при show_history = true; её отсутствие
/// не ошибка — автозагрузка истории просто пропускается.
#[derive(Debug, Default)]
pub struct Dashboard {
    pub results: RegionView,
    pub results_message_id: Option<i32>,
    pub history: Option<RegionView>,
    pub history_message_id: Option<i32>,
}

impl Dashboard {
    pub fn new(show_history: bool) -> Self {
        Self {
            results: RegionView::default(),
            results_message_id: None,
            history: if show_history { Some(RegionView::default()) } else { None },
            history_message_id: None,
        }
    }
}

pub type DashboardStorage = Arc<RwLock<HashMap<ChatId, Dashboard>>>;

/// Данные callback-кнопок
pub mod callback_data {
    pub const COMPARE: &str = "compare";
    pub const HISTORY_REFRESH: &str = "history_refresh";
    pub const ASSET1_STOCK: &str = "asset1_stock";
    pub const ASSET1_CRYPTO: &str = "asset1_crypto";
    pub const ASSET2_STOCK: &str = "asset2_stock";
    pub const ASSET2_CRYPTO: &str = "asset2_crypto";
    pub const CANCEL_DIALOG: &str = "cancel_dialog";
}

/// Клавиатура выбора типа актива — ровно два взаимоисключающих варианта
/// (аналог пары радиокнопок формы).
pub fn asset_type_keyboard(side: u8) -> InlineKeyboardMarkup {
    let (stock, crypto) = if side == 1 {
        (callback_data::ASSET1_STOCK, callback_data::ASSET1_CRYPTO)
    } else {
        (callback_data::ASSET2_STOCK, callback_data::ASSET2_CRYPTO)
    };
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("📈 Акция", stock),
            InlineKeyboardButton::callback("🪙 Крипта", crypto),
        ],
        vec![InlineKeyboardButton::callback("❌ Отмена", callback_data::CANCEL_DIALOG)],
    ])
}

pub fn cancel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "❌ Отмена",
        callback_data::CANCEL_DIALOG,
    )]])
}

/// Все доступные команды бота
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "открыть дашборд и загрузить историю")]
    Start,
    #[command(description = "показать это сообщение")]
    Help,
    #[command(description = "сравнить: /compare <stock|crypto> <TICKER1> <stock|crypto> <TICKER2>, без аргументов — пошаговый диалог")]
    Compare(String),
    #[command(description = "последние сравнения: /history")]
    History,
}
