// src/telegram.rs

use crate::backend::Backend;
use crate::comparison::ComparisonClient;
use crate::config::Config;
use crate::notifier::{
    handle_callback, handle_command, handle_message, Command, DashboardStorage, StateStorage,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use teloxide::{
    dptree,
    prelude::*,
    types::{CallbackQuery, Message},
};

pub async fn run<B>(bot: Bot, client: ComparisonClient<B>, cfg: Config)
where
    B: Backend + Send + Sync + 'static,
{
    let client = Arc::new(client);
    let state_storage: StateStorage = Arc::new(RwLock::new(HashMap::new()));
    let dashboards: DashboardStorage = Arc::new(RwLock::new(HashMap::new()));

    // 1) Текстовые команды
    let commands_branch = Update::filter_message()
        .filter_command::<Command>()
        .endpoint({
            let client = client.clone();
            let state_storage = state_storage.clone();
            let dashboards = dashboards.clone();
            let cfg = cfg.clone();
            move |bot: Bot, msg: Message, cmd: Command| {
                let client = client.clone();
                let state_storage = state_storage.clone();
                let dashboards = dashboards.clone();
                let cfg = cfg.clone();
                async move {
                    if let Err(err) =
                        handle_command(bot, msg, cmd, client, state_storage, dashboards, cfg).await
                    {
                        tracing::error!("command handler error: {:?}", err);
                    }
                    respond(())
                }
            }
        });

    // 2) Inline-callbacks
    let callback_branch = Update::filter_callback_query().endpoint({
        let client = client.clone();
        let state_storage = state_storage.clone();
        let dashboards = dashboards.clone();
        let cfg = cfg.clone();
        move |bot: Bot, q: CallbackQuery| {
            let client = client.clone();
            let state_storage = state_storage.clone();
            let dashboards = dashboards.clone();
            let cfg = cfg.clone();
            async move {
                if let Err(err) =
                    handle_callback(bot, q, client, state_storage, dashboards, cfg).await
                {
                    tracing::error!("callback handler error: {:?}", err);
                }
                respond(())
            }
        }
    });

    // 3) Текстовые сообщения (шаги диалога)
    let message_branch = Update::filter_message().endpoint({
        let client = client.clone();
        let state_storage = state_storage.clone();
        let dashboards = dashboards.clone();
        let cfg = cfg.clone();
        move |bot: Bot, msg: Message| {
            let client = client.clone();
            let state_storage = state_storage.clone();
            let dashboards = dashboards.clone();
            let cfg = cfg.clone();
            async move {
                if let Err(err) =
                    handle_message(bot, msg, client, state_storage, dashboards, cfg).await
                {
                    tracing::error!("message handler error: {:?}", err);
                }
                respond(())
            }
        }
    });

    // Собираем все ветки в Dispatcher
    Dispatcher::builder(
        bot,
        dptree::entry()
            .branch(commands_branch)
            .branch(callback_branch)
            .branch(message_branch),
    )
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}
