use async_stream::stream;
use async_trait::async_trait;
use futures::future::join_all;
use futures::{pin_mut, Stream, StreamExt};
use log::{debug, info, warn};
use reqwest::{Client, Url};
use serde_json::{json, Value};
use std::error::Error;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::task::JoinHandle;

use crate::app_config::TelegramConfig;
use crate::core::changes::{ChangeEvent, Notification};
use crate::core::models::IntegrationType;

pub type NotifyResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Somewhere notifications get delivered to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> String;
    async fn notify(&self, notification: &Notification) -> NotifyResult;
}

pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    /// `None` when the bot token or chat id is missing.
    pub fn from_config(config: &TelegramConfig) -> Option<Self> {
        if config.token.trim().is_empty() {
            return None;
        }
        match config.chat_id.trim().parse::<i64>() {
            Ok(id) => Some(Self::new(Bot::new(&config.token), ChatId(id))),
            Err(_) => {
                warn!("Telegram chat_id {:?} is not a number; chat notifications disabled", config.chat_id);
                None
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> String {
        format!("telegram:{}", self.chat_id.0)
    }

    async fn notify(&self, notification: &Notification) -> NotifyResult {
        self.bot.send_message(self.chat_id, notification.message.clone()).await?;
        Ok(())
    }
}

pub struct WebhookNotifier {
    client: Client,
    integration_type: IntegrationType,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(client: Client, integration_type: IntegrationType, url: &str) -> Result<Self, String> {
        let url = Url::parse(url).map_err(|e| format!("invalid webhook URL {}: {}", url, e))?;
        Ok(Self { client, integration_type, url })
    }

    pub fn payload(integration_type: IntegrationType, text: &str) -> Value {
        match integration_type {
            IntegrationType::Slack => json!({ "text": text }),
            IntegrationType::Discord => json!({ "content": text }),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> String {
        format!("{} webhook", self.integration_type)
    }

    async fn notify(&self, notification: &Notification) -> NotifyResult {
        let body = Self::payload(self.integration_type, &notification.message);
        self.client.post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Builds one notifier per enabled webhook. Bad URLs are skipped.
pub fn webhook_notifiers(webhooks: &[(IntegrationType, String)]) -> Vec<Arc<dyn Notifier>> {
    let client = Client::new();
    webhooks.iter()
        .filter_map(|(integration_type, url)| match WebhookNotifier::new(client.clone(), *integration_type, url) {
            Ok(notifier) => Some(Arc::new(notifier) as Arc<dyn Notifier>),
            Err(e) => {
                warn!("Skipping {} webhook: {}", integration_type, e);
                None
            }
        })
        .collect()
}

/// Changes that produce a notification, in feed order.
pub fn notification_stream<S>(changes: S) -> impl Stream<Item = Notification> + Send
where
    S: Stream<Item = ChangeEvent> + Send + 'static,
{
    stream! {
        for await change in changes {
            if let Some(notification) = Notification::from_change(&change) {
                yield notification;
            }
        }
    }
}

/// Sends to every notifier at once and returns how many succeeded.
pub async fn dispatch(notifiers: &[Arc<dyn Notifier>], notification: &Notification) -> usize {
    let results = join_all(notifiers.iter().map(|n| n.notify(notification))).await;

    let mut delivered = 0;
    for (notifier, result) in notifiers.iter().zip(results) {
        match result {
            Ok(()) => delivered += 1,
            Err(e) => warn!("{} failed to deliver '{}': {}", notifier.name(), notification.title, e),
        }
    }
    delivered
}

pub fn spawn_notification_dispatcher<S>(changes: S, notifiers: Vec<Arc<dyn Notifier>>) -> JoinHandle<()>
where
    S: Stream<Item = ChangeEvent> + Send + 'static,
{
    info!("Dispatching notifications to {} notifier(s)", notifiers.len());
    tokio::spawn(async move {
        let notifications = notification_stream(changes);
        pin_mut!(notifications);
        while let Some(notification) = notifications.next().await {
            let delivered = dispatch(&notifiers, &notification).await;
            debug!("'{}' delivered to {}/{}", notification.title, delivered, notifiers.len());
        }
        info!("Change feed closed; notification dispatcher stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::changes::{ChangeFeed, ChangeTable};
    use crate::core::models::ChangeKind;
    use uuid::Uuid;

    fn registration_change(name: &str) -> ChangeEvent {
        ChangeEvent::new(ChangeTable::Registrations, ChangeKind::Insert, Some(Uuid::new_v4()), name)
    }

    fn notification(name: &str) -> Notification {
        Notification::from_change(&registration_change(name)).unwrap()
    }

    #[test]
    fn test_webhook_payloads() {
        assert_eq!(WebhookNotifier::payload(IntegrationType::Slack, "hi"), json!({ "text": "hi" }));
        assert_eq!(WebhookNotifier::payload(IntegrationType::Discord, "hi"), json!({ "content": "hi" }));
    }

    #[test]
    fn test_webhook_notifiers_skip_bad_urls() {
        let notifiers = webhook_notifiers(&[
            (IntegrationType::Slack, "https://hooks.slack.com/services/T000".to_string()),
            (IntegrationType::Discord, "not a url".to_string()),
        ]);
        assert_eq!(notifiers.len(), 1);
        assert_eq!(notifiers[0].name(), "slack webhook");
    }

    #[test]
    fn test_telegram_notifier_needs_token_and_chat() {
        let missing_token = TelegramConfig { token: String::new(), chat_id: "42".to_string() };
        assert!(TelegramNotifier::from_config(&missing_token).is_none());

        let bad_chat = TelegramConfig { token: "123:abc".to_string(), chat_id: "general".to_string() };
        assert!(TelegramNotifier::from_config(&bad_chat).is_none());

        let ok = TelegramConfig { token: "123:abc".to_string(), chat_id: "-100200".to_string() };
        assert_eq!(TelegramNotifier::from_config(&ok).unwrap().name(), "telegram:-100200");
    }

    #[tokio::test]
    async fn test_dispatch_tolerates_failures() {
        let mut working = MockNotifier::new();
        working.expect_notify().times(1).returning(|_| Ok(()));
        working.expect_name().return_const("working".to_string());

        let mut broken = MockNotifier::new();
        broken.expect_notify().times(1).returning(|_| Err("connection refused".into()));
        broken.expect_name().return_const("broken".to_string());

        let notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(working), Arc::new(broken)];
        assert_eq!(dispatch(&notifiers, &notification("Ada")).await, 1);
    }

    #[tokio::test]
    async fn test_notification_stream_skips_non_inserts() {
        let changes = tokio_stream::iter(vec![
            ChangeEvent::new(ChangeTable::Registrations, ChangeKind::Update, None, "Ada"),
            ChangeEvent::new(ChangeTable::Scores, ChangeKind::Insert, None, ""),
            registration_change("Grace"),
        ]);
        let collected: Vec<Notification> = notification_stream(changes).collect().await;
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].message, "New registration: Grace");
    }

    #[tokio::test]
    async fn test_dispatcher_forwards_feed() {
        let feed = ChangeFeed::new(16);
        let mut notifier = MockNotifier::new();
        notifier.expect_notify()
            .withf(|n| n.title == "New registration")
            .times(2)
            .returning(|_| Ok(()));
        notifier.expect_name().return_const("mock".to_string());

        let handle = spawn_notification_dispatcher(feed.stream(), vec![Arc::new(notifier)]);
        feed.publish(registration_change("Ada"));
        feed.publish(ChangeEvent::new(ChangeTable::Teams, ChangeKind::Delete, None, "Old"));
        feed.publish(registration_change("Grace"));
        drop(feed);

        handle.await.unwrap();
    }
}
