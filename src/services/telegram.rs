use log::{debug, error, info};
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, ParseMode};
use tokio::sync::{mpsc, oneshot};

use crate::commands::telegram::{handle_command, parse_command, TelegramCommand};
use crate::core::event_system::EventSystem;
use crate::escape_markdown;

pub type CommandRequest = (TelegramCommand, oneshot::Sender<String>);

pub struct TelegramBot {
    bot: Bot,
    command_sender: mpsc::Sender<CommandRequest>,
}

impl TelegramBot {
    pub fn new(bot: Bot, command_sender: mpsc::Sender<CommandRequest>) -> Self {
        Self { bot, command_sender }
    }

    pub async fn run(self) {
        info!("Telegram bot listening for commands");
        let command_sender = self.command_sender;
        teloxide::repl(self.bot, move |bot: Bot, msg: Message| {
            let command_sender = command_sender.clone();
            async move {
                let Some(text) = msg.text() else {
                    return Ok(());
                };
                let Some(command) = parse_command(text) else {
                    bot.send_message(msg.chat.id, "Unknown command. Type /help for available commands.").await?;
                    return Ok(());
                };

                let markdown = command.uses_markdown();
                let reply = match request(&command_sender, command).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        bot.send_message(msg.chat.id, e).await?;
                        return Ok(());
                    }
                };

                let mut message = bot.send_message(msg.chat.id, reply);
                if markdown {
                    message = message.parse_mode(ParseMode::MarkdownV2);
                }
                message.link_preview_options(LinkPreviewOptions {
                    is_disabled: true,
                    url: None,
                    prefer_small_media: false,
                    prefer_large_media: false,
                    show_above_text: false,
                }).await?;
                Ok(())
            }
        }).await;
    }
}

/// Hands a command to the executor and waits for its reply.
pub async fn request(sender: &mpsc::Sender<CommandRequest>, command: TelegramCommand) -> Result<String, String> {
    let (response_sender, response_receiver) = oneshot::channel();
    sender.send((command, response_sender)).await
        .map_err(|e| format!("Error sending command: {}", e))?;
    response_receiver.await
        .map_err(|e| format!("Error processing command: {}", e))
}

/// Error text sent in the same parse mode as the command's normal reply.
fn error_reply(message: &str, markdown: bool) -> String {
    let reply = format!("Error: {}", message);
    if markdown {
        escape_markdown(&reply)
    } else {
        reply
    }
}

/// Runs commands against the event on its own thread. Errors come back as
/// the reply text.
pub fn spawn_command_executor(
    mut event_system: EventSystem,
    mut command_receiver: mpsc::Receiver<CommandRequest>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while let Some((telegram_command, response_sender)) = command_receiver.blocking_recv() {
            debug!("Executing {:?}", telegram_command);
            let markdown = telegram_command.uses_markdown();
            let response = match handle_command(telegram_command, &mut event_system) {
                Ok(output) if output.trim().is_empty() => "Done.".to_string(),
                Ok(output) => output,
                Err(e) => error_reply(&e.to_string(), markdown),
            };

            if response_sender.send(response).is_err() {
                error!("Telegram handler dropped before the reply was ready");
            }
        }
        info!("Command channel closed; executor stopped");
    })
}
