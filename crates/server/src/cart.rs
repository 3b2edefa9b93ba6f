use std::collections::HashMap;

use async_trait::async_trait;
use storefront_core::ids::ItemId;
use tokio::sync::RwLock;
use tracing::info;

/// Per-session shopping cart. Items keep insertion order and never repeat.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn items(&self, session_id: &str) -> Vec<ItemId>;
    /// Returns `false` when the item was already in the cart.
    async fn add(&self, session_id: &str, item: ItemId) -> bool;
    async fn clear(&self, session_id: &str);
}

/// In-process carts, bounded to `max_sessions`. Adding to a new session when full
/// evicts the session that was updated least recently.
#[derive(Debug)]
pub struct InMemoryCartStore {
    carts: RwLock<Carts>,
    max_sessions: usize,
}

#[derive(Debug, Default)]
struct Carts {
    sessions: HashMap<String, SessionCart>,
    clock: u64,
}

#[derive(Debug)]
struct SessionCart {
    items: Vec<ItemId>,
    updated: u64,
}

impl InMemoryCartStore {
    pub fn new(max_sessions: usize) -> Self {
        Self { carts: RwLock::new(Carts::default()), max_sessions: max_sessions.max(1) }
    }
}

impl Carts {
    fn evict_stalest(&mut self) {
        let stalest = self
            .sessions
            .iter()
            .min_by_key(|(_, cart)| cart.updated)
            .map(|(session_id, _)| session_id.clone());
        if let Some(session_id) = stalest {
            self.sessions.remove(&session_id);
            info!(
                event_name = "cart.session.evicted",
                session_id = %session_id,
                "cart session evicted to stay within capacity"
            );
        }
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn items(&self, session_id: &str) -> Vec<ItemId> {
        self.carts
            .read()
            .await
            .sessions
            .get(session_id)
            .map(|cart| cart.items.clone())
            .unwrap_or_default()
    }

    async fn add(&self, session_id: &str, item: ItemId) -> bool {
        let mut carts = self.carts.write().await;
        carts.clock += 1;
        let now = carts.clock;

        if !carts.sessions.contains_key(session_id) && carts.sessions.len() >= self.max_sessions {
            carts.evict_stalest();
        }

        let cart = carts
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionCart { items: Vec::new(), updated: now });
        cart.updated = now;
        if cart.items.contains(&item) {
            return false;
        }
        cart.items.push(item);
        true
    }

    async fn clear(&self, session_id: &str) {
        self.carts.write().await.sessions.remove(session_id);
    }
}
