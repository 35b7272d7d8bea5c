use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

const FLASH_KEY: &str = "flash";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

/// One-shot messages kept in the session until the next rendered page takes them.
#[derive(Debug, Clone)]
pub struct Flash {
    session: Session,
}

impl Flash {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub async fn success(&self, text: impl Into<String>) {
        self.push(Level::Success, text.into()).await
    }

    pub async fn error(&self, text: impl Into<String>) {
        self.push(Level::Error, text.into()).await
    }

    async fn push(&self, level: Level, text: String) {
        let mut messages = self.peek().await;
        messages.push(FlashMessage { level, text });

        if let Err(err) = self.session.insert(FLASH_KEY, messages).await {
            tracing::warn!("failed to store flash message: {err:?}");
        }
    }

    async fn peek(&self) -> Vec<FlashMessage> {
        match self.session.get::<Vec<FlashMessage>>(FLASH_KEY).await {
            Ok(messages) => messages.unwrap_or_default(),
            Err(err) => {
                tracing::warn!("failed to read flash messages: {err:?}");
                vec![]
            }
        }
    }

    pub async fn take(&self) -> Vec<FlashMessage> {
        match self.session.remove::<Vec<FlashMessage>>(FLASH_KEY).await {
            Ok(messages) => messages.unwrap_or_default(),
            Err(err) => {
                tracing::warn!("failed to take flash messages: {err:?}");
                vec![]
            }
        }
    }
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self { session })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn flash() -> Flash {
        let store = Arc::new(MemoryStore::default());
        Flash::new(Session::new(None, store, None))
    }

    #[tokio::test]
    async fn messages_are_taken_once() {
        let flash = flash();

        flash.success("Note Added Successfully").await;
        flash.error("Not Authorized").await;

        let messages = flash.take().await;
        assert_eq!(
            messages,
            vec![
                FlashMessage {
                    level: Level::Success,
                    text: "Note Added Successfully".into()
                },
                FlashMessage {
                    level: Level::Error,
                    text: "Not Authorized".into()
                },
            ]
        );

        assert!(flash.take().await.is_empty());
    }

    #[tokio::test]
    async fn empty_session_has_no_messages() {
        assert!(flash().take().await.is_empty());
    }
}
