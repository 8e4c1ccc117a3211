//! Notification outbox: services enqueue events after a successful write and a
//! separate worker hands them to the delivery collaborator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::counseling::SessionId;
use super::domain::{RegistrationId, Role, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RegistrationCreated,
    StatusChanged,
    OfficiantAssigned,
    OfficiantChanged,
    VisitConfirmed,
    SessionCreated,
    SessionUpdated,
    SessionCancelled,
    ReminderDue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Recipient {
    User(UserId),
    Role(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Subject {
    Registration(RegistrationId),
    Session(SessionId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub recipient: Recipient,
    pub title: String,
    pub message: String,
    pub tone: Tone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<UserId>,
}

impl NotificationEvent {
    pub fn new(
        kind: NotificationKind,
        recipient: Recipient,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            recipient,
            title: title.into(),
            message: message.into(),
            tone: Tone::Info,
            link: None,
            subject: None,
            actor: None,
        }
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn about(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn by(mut self, actor: &UserId) -> Self {
        self.actor = Some(actor.clone());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification outbox is closed")]
    Closed,
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Where services drop events. Must not block.
pub trait NotificationSink: Send + Sync {
    fn enqueue(&self, event: NotificationEvent) -> Result<(), NotificationError>;
}

/// Delivery collaborator (in-app inbox, e-mail, push).
pub trait NotificationPublisher: Send + Sync {
    fn deliver(&self, event: &NotificationEvent) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone)]
pub struct NotificationOutbox {
    sender: mpsc::UnboundedSender<NotificationEvent>,
}

impl NotificationOutbox {
    /// Outbox plus the worker half that drains it.
    pub fn channel<P>(publisher: Arc<P>) -> (Self, NotificationWorker<P>)
    where
        P: NotificationPublisher + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self { sender },
            NotificationWorker {
                receiver,
                publisher,
            },
        )
    }
}

impl NotificationSink for NotificationOutbox {
    fn enqueue(&self, event: NotificationEvent) -> Result<(), NotificationError> {
        self.sender
            .send(event)
            .map_err(|_| NotificationError::Closed)
    }
}

pub struct NotificationWorker<P> {
    receiver: mpsc::UnboundedReceiver<NotificationEvent>,
    publisher: Arc<P>,
}

impl<P> NotificationWorker<P>
where
    P: NotificationPublisher + 'static,
{
    /// Delivers until every outbox handle is dropped; returns the number delivered.
    pub async fn run(mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.receiver.recv().await {
            match self.publisher.deliver(&event) {
                Ok(()) => {
                    delivered += 1;
                    debug!(kind = ?event.kind, title = %event.title, "notification delivered");
                }
                Err(error) => {
                    warn!(kind = ?event.kind, recipient = ?event.recipient, %error, "notification delivery failed");
                }
            }
        }
        delivered
    }
}
