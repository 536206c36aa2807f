//! Token store - removes destination tokens reported invalid by the provider

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use contracts::{ContractError, InvalidTokenHandler};
use tracing::{debug, info, instrument};

/// Persistent store of device tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store name (used for logging)
    fn name(&self) -> &str;

    /// Delete `token` registered for `app`
    ///
    /// Returns the number of removed rows; deleting an absent token returns 0.
    async fn delete_token(&self, app: &str, token: &str) -> Result<u64, ContractError>;
}

/// 内存 token 存储（按应用分组）
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    name: String,
    tokens: Mutex<HashMap<String, HashSet<String>>>,
}

impl InMemoryTokenStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// 预置 token
    pub fn with_tokens<I, T>(self, app: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if let Ok(mut map) = self.tokens.lock() {
            map.entry(app.to_string())
                .or_default()
                .extend(tokens.into_iter().map(Into::into));
        }
        self
    }

    pub fn contains(&self, app: &str, token: &str) -> bool {
        self.tokens
            .lock()
            .map(|map| map.get(app).is_some_and(|set| set.contains(token)))
            .unwrap_or(false)
    }

    /// 所有应用的 token 总数
    pub fn len(&self) -> usize {
        self.tokens
            .lock()
            .map(|map| map.values().map(HashSet::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn delete_token(&self, app: &str, token: &str) -> Result<u64, ContractError> {
        let mut map = self
            .tokens
            .lock()
            .map_err(|_| ContractError::token_store(&self.name, "store lock poisoned"))?;
        let removed = map.get_mut(app).is_some_and(|set| set.remove(token));
        Ok(u64::from(removed))
    }
}

/// Invalid-token handler that deletes the token from a `TokenStore`
pub struct TokenStoreHandler<S> {
    name: String,
    store: Arc<S>,
}

impl<S: TokenStore> TokenStoreHandler<S> {
    pub fn new(name: impl Into<String>, store: Arc<S>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[async_trait]
impl<S: TokenStore + 'static> InvalidTokenHandler for TokenStoreHandler<S> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "token_store_delete",
        skip(self, token),
        fields(sink = %self.name, store = %self.store.name())
    )]
    async fn handle_invalid_token(&self, app: &str, token: &str) -> Result<(), ContractError> {
        let rows = self.store.delete_token(app, token).await?;
        if rows == 0 {
            debug!(app = %app, "Token already absent");
        } else {
            info!(app = %app, rows, "Invalid token deleted");
        }
        Ok(())
    }
}
