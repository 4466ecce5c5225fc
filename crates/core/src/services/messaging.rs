//! Direct messages between members.
//!
//! Sending costs points for everyone except admins; the debit happens
//! before the insert and is refunded if the insert fails.

use std::collections::HashMap;

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{
    entities::{announcement, message, notification::NotificationKind, profile},
    repositories::{MessageRepository, ProfileRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use validator::Validate;

use crate::services::{
    announcement::AnnouncementService,
    notification::{NewNotification, NotificationService},
    points::PointsService,
    profile::ProfileSummary,
};

/// Messages returned per listing.
const LIST_LIMIT: u64 = 100;

/// Input for sending a direct message.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageInput {
    #[validate(length(min = 1, max = 30))]
    pub recipient_username: String,

    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// A message with the profile on the other side.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: message::Model,
    /// Sender for inbox listings, recipient for sent listings.
    pub partner: Option<ProfileSummary>,
}

/// Inbox page data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub messages: Vec<MessageView>,
    pub announcements: Vec<announcement::Model>,
    pub unread_count: u64,
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    profile_repo: ProfileRepository,
    points: PointsService,
    announcements: AnnouncementService,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(
        message_repo: MessageRepository,
        profile_repo: ProfileRepository,
        points: PointsService,
        announcements: AnnouncementService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            message_repo,
            profile_repo,
            points,
            announcements,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a message.
    pub async fn send(
        &self,
        sender: &profile::Model,
        input: SendMessageInput,
    ) -> AppResult<message::Model> {
        input.validate()?;

        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::BadRequest(
                "a mensagem não pode ficar vazia".to_string(),
            ));
        }

        let recipient = self
            .profile_repo
            .get_by_username(input.recipient_username.trim())
            .await?;
        if recipient.id == sender.id {
            return Err(AppError::BadRequest(
                "você não pode enviar mensagem para si mesmo".to_string(),
            ));
        }

        let cost = if sender.is_admin {
            0
        } else {
            self.points.economy().message_cost
        };
        self.points.spend(&sender.id, cost).await?;

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            sender_id: Set(sender.id.clone()),
            recipient_id: Set(recipient.id.clone()),
            content: Set(content.to_string()),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let message = match self.message_repo.create(model).await {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, sender_id = %sender.id, "Message insert failed, refunding");
                self.points.refund(&sender.id, cost).await;
                return Err(e);
            }
        };
        info!(message_id = %message.id, sender_id = %sender.id, recipient_id = %recipient.id, cost, "Message sent");

        self.notifications
            .notify(
                NewNotification::new(&recipient.id, NotificationKind::Message)
                    .actor(&sender.id)
                    .message(format!("Nova mensagem de {}", sender.username)),
            )
            .await;

        Ok(message)
    }

    /// Received messages, active announcements and the unread count.
    pub async fn inbox(&self, user_id: &str) -> AppResult<Inbox> {
        let messages = self.message_repo.find_inbox(user_id, LIST_LIMIT).await?;
        let messages = self
            .with_partners(messages, |m| m.sender_id.clone())
            .await?;
        let announcements = self.announcements.active().await?;
        let unread_count = self.message_repo.count_unread(user_id).await?;

        Ok(Inbox {
            messages,
            announcements,
            unread_count,
        })
    }

    /// Messages the user sent.
    pub async fn sent(&self, user_id: &str) -> AppResult<Vec<MessageView>> {
        let messages = self.message_repo.find_sent(user_id, LIST_LIMIT).await?;
        self.with_partners(messages, |m| m.recipient_id.clone())
            .await
    }

    /// Mark a received message as read.
    pub async fn mark_read(&self, user_id: &str, id: &str) -> AppResult<()> {
        if self.message_repo.mark_as_read(id, user_id).await? == 0 {
            return Err(AppError::NotFound(format!("mensagem {id}")));
        }
        Ok(())
    }

    async fn with_partners(
        &self,
        messages: Vec<message::Model>,
        partner_id: impl Fn(&message::Model) -> String,
    ) -> AppResult<Vec<MessageView>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<String> = messages.iter().map(&partner_id).collect();
        ids.sort();
        ids.dedup();

        let partners: HashMap<String, ProfileSummary> = self
            .profile_repo
            .find_by_ids(&ids)
            .await?
            .iter()
            .map(|p| (p.id.clone(), ProfileSummary::from(p)))
            .collect();

        Ok(messages
            .into_iter()
            .map(|message| {
                let partner = partners.get(&partner_id(&message)).cloned();
                MessageView { message, partner }
            })
            .collect())
    }
}
