use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub text: String,
    pub posted_at: DateTime<Local>,
}

type Slot = Arc<RwLock<Option<Notice>>>;

/// One error and one success message per view, each expiring on its own timer.
#[derive(Clone)]
pub struct NoticeBoard {
    error: Slot,
    success: Slot,
    error_ttl: Duration,
    success_ttl: Duration,
}

impl NoticeBoard {
    pub fn new(success_ttl: Duration, error_ttl: Duration) -> Self {
        Self {
            error: Arc::new(RwLock::new(None)),
            success: Arc::new(RwLock::new(None)),
            error_ttl,
            success_ttl,
        }
    }

    /// Replaces the current error message.
    pub async fn post_error(&self, text: impl Into<String>) -> Uuid {
        NoticeBoard::post(&self.error, NoticeKind::Error, text.into(), self.error_ttl).await
    }

    pub async fn post_success(&self, text: impl Into<String>) -> Uuid {
        NoticeBoard::post(&self.success, NoticeKind::Success, text.into(), self.success_ttl).await
    }

    pub async fn error(&self) -> Option<Notice> {
        self.error.read().await.clone()
    }

    pub async fn success(&self) -> Option<Notice> {
        self.success.read().await.clone()
    }

    pub async fn dismiss_error(&self) {
        *self.error.write().await = None;
    }

    pub async fn dismiss_success(&self) {
        *self.success.write().await = None;
    }

    async fn post(slot: &Slot, kind: NoticeKind, text: String, ttl: Duration) -> Uuid {
        let notice = Notice {
            id: Uuid::new_v4(),
            kind,
            text,
            posted_at: Local::now(),
        };
        let id = notice.id;
        logger!(DEBUG, "[NOTICE] {:?}: {}", kind, &notice.text);
        *slot.write().await = Some(notice);

        let slot = Arc::clone(slot);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut guard = slot.write().await;
            // A newer notice owns its own timer.
            if guard.as_ref().map(|n| n.id) == Some(id) {
                *guard = None;
            }
        });
        id
    }
}
