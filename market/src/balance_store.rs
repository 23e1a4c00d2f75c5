use std::collections::HashMap;
use std::sync::Arc;

use corelib::Balance;
use tokio::sync::RwLock;

/// In-memory store of the latest per-asset balance snapshot. Written by
/// the periodic ticker refresh and by the execution orchestrator's
/// post-cycle refresh; read by the dispatcher's minimum USD-equivalent
/// gate and by the orchestrator before sizing a leg.
#[derive(Clone, Default)]
pub struct BalanceStore {
    inner: Arc<RwLock<HashMap<String, Balance>>>,
}

impl BalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins; balances are advisory until the orchestrator
    /// re-checks them at commit time.
    pub async fn set(&self, asset: &str, balance: Balance) {
        let mut g = self.inner.write().await;
        g.insert(asset.to_string(), balance);
    }

    pub async fn get(&self, asset: &str) -> Option<Balance> {
        let g = self.inner.read().await;
        g.get(asset).copied()
    }

    /// Replaces the whole snapshot atomically, used by `update_balance`
    /// to apply a full refresh in one step rather than one `set` per
    /// asset (which would let readers observe a partially-updated map).
    pub async fn replace_all(&self, snapshot: HashMap<String, Balance>) {
        let mut g = self.inner.write().await;
        *g = snapshot;
    }

    /// A full copy of the current snapshot. Used at startup to resolve
    /// "all assets with balance" when no explicit starting-asset set is
    /// configured.
    pub async fn all(&self) -> HashMap<String, Balance> {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = BalanceStore::new();
        store
            .set(
                "USDT",
                Balance {
                    free: 100.0,
                    locked: 0.0,
                    last_updated: 1,
                },
            )
            .await;

        let b = store.get("USDT").await.unwrap();
        assert_eq!(b.free, 100.0);
        assert!(store.get("BTC").await.is_none());
    }

    #[tokio::test]
    async fn replace_all_drops_stale_assets() {
        let store = BalanceStore::new();
        store
            .set(
                "USDT",
                Balance {
                    free: 1.0,
                    locked: 0.0,
                    last_updated: 1,
                },
            )
            .await;

        let mut snapshot = HashMap::new();
        snapshot.insert(
            "BTC".to_string(),
            Balance {
                free: 2.0,
                locked: 0.0,
                last_updated: 2,
            },
        );
        store.replace_all(snapshot).await;

        assert!(store.get("USDT").await.is_none());
        assert_eq!(store.get("BTC").await.unwrap().free, 2.0);
    }
}
