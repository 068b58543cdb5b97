//! Open page contexts and whether the interception layer controls them.

use std::collections::HashMap;
use tokio::sync::RwLock;

/// Tracks open pages.
///
/// A page that opened while no generation was active is uncontrolled: its
/// subresource requests go straight to the network until a claim.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, bool>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly opened page.
    pub async fn register(&self, client_id: &str, controlled: bool) {
        self.clients.write().await.insert(client_id.to_string(), controlled);
        tracing::debug!(client_id, controlled, "client registered");
    }

    /// Forget a closed page.
    pub async fn unregister(&self, client_id: &str) -> bool {
        self.clients.write().await.remove(client_id).is_some()
    }

    /// Whether requests from `client_id` should be intercepted.
    ///
    /// Unknown clients count as controlled.
    pub async fn is_controlled(&self, client_id: &str) -> bool {
        self.clients.read().await.get(client_id).copied().unwrap_or(true)
    }

    /// Take control of every open page. Returns how many changed hands.
    pub async fn claim(&self) -> usize {
        let mut clients = self.clients.write().await;
        let mut claimed = 0;
        for controlled in clients.values_mut().filter(|c| !**c) {
            *controlled = true;
            claimed += 1;
        }
        claimed
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_client_is_controlled() {
        let registry = ClientRegistry::new();
        assert!(registry.is_controlled("tab-9").await);
    }

    #[tokio::test]
    async fn test_claim_takes_uncontrolled_clients() {
        let registry = ClientRegistry::new();
        registry.register("tab-1", false).await;
        registry.register("tab-2", false).await;
        registry.register("tab-3", true).await;

        assert!(!registry.is_controlled("tab-1").await);
        assert_eq!(registry.claim().await, 2);
        assert!(registry.is_controlled("tab-1").await);
        assert!(registry.is_controlled("tab-2").await);
        assert_eq!(registry.claim().await, 0);
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = ClientRegistry::new();
        registry.register("tab-1", false).await;
        assert!(registry.unregister("tab-1").await);
        assert!(!registry.unregister("tab-1").await);
        assert_eq!(registry.len().await, 0);
        assert!(registry.is_empty().await);
    }
}
