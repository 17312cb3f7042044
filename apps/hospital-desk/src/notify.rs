//! Notificações para o usuário (equivalente aos "toasts" da interface)

use std::fmt;

use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            description,
        }
    }

    pub fn error(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            description,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.level {
            NotificationLevel::Success => "✔",
            NotificationLevel::Error => "✖",
        };
        write!(f, "{} {}", mark, self.title)?;
        if let Some(description) = &self.description {
            write!(f, " - {}", description)?;
        }
        Ok(())
    }
}

/// Destino das notificações; nunca bloqueia quem notifica
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Envia as notificações para um canal consumido pela interface
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            warn!("Notificação descartada: receptor encerrado");
        }
    }
}

/// Apenas registra em log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!("{}", notification),
            NotificationLevel::Error => warn!("{}", notification),
        }
    }
}

/// Guarda as notificações recebidas, para inspeção em testes
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: std::sync::Mutex<Vec<Notification>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(Notification::is_error)
            .collect()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut guard) = self.received.lock() {
            guard.push(notification);
        }
    }
}
