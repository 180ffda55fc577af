// src/bin/hackhub_bot.rs

use hackhub::{initialize_environment, run_telegram_bot};
use log::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    initialize_environment();

    if let Err(e) = run_telegram_bot().await {
        error!("Bot stopped: {}", e);
        return Err(e);
    }
    Ok(())
}
