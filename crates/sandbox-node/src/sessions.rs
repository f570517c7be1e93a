use std::collections::HashMap;

use sandbox_core::{ChainConfig, Session};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{ApiError, ApiResult};

/// Independent sessions keyed by an opaque id. Chains are never shared.
pub struct SessionRegistry {
    config: ChainConfig,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new(config: ChainConfig, max_sessions: usize) -> Self {
        Self {
            config,
            max_sessions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self) -> ApiResult<(String, Session)> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            return Err(ApiError::TooManySessions(self.max_sessions));
        }
        let id = loop {
            let candidate = format!("{:016x}", rand::random::<u64>());
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let session = Session::new(self.config.clone());
        sessions.insert(id.clone(), session.clone());
        info!(session = %id, open = sessions.len(), "session created");
        Ok((id, session))
    }

    pub async fn get(&self, id: &str) -> ApiResult<Session> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
    }

    /// Drops the session, abandoning any mining it had in flight.
    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        let session = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))?;
        session.cancel_mining();
        info!(session = %id, "session closed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_core::Difficulty;

    #[tokio::test]
    async fn sessions_do_not_share_chains() {
        let registry = SessionRegistry::new(ChainConfig::default(), 4);
        let (a_id, a) = registry.create().await.unwrap();
        let (b_id, _) = registry.create().await.unwrap();
        assert_ne!(a_id, b_id);

        a.append("only a", Difficulty::MIN);
        assert_eq!(registry.get(&a_id).await.unwrap().len(), 2);
        assert_eq!(registry.get(&b_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn session_limit_is_enforced() {
        let registry = SessionRegistry::new(ChainConfig::default(), 1);
        registry.create().await.unwrap();
        assert!(matches!(
            registry.create().await,
            Err(ApiError::TooManySessions(1))
        ));
    }

    #[tokio::test]
    async fn remove_unknown_session() {
        let registry = SessionRegistry::new(ChainConfig::default(), 1);
        let (id, _) = registry.create().await.unwrap();
        registry.remove(&id).await.unwrap();
        assert_eq!(registry.len().await, 0);
        assert!(matches!(
            registry.remove(&id).await,
            Err(ApiError::SessionNotFound(_))
        ));
    }
}
