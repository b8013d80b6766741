//! Training client registry.
//!
//! Clients are keyed by url; ids come from a monotonic counter so an id is
//! never reused even after unregistration. Re-registering a known url keeps
//! its id and resets its per-round status.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::variant::ModelParams;

/// Per-round status of one training client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Idle,
    Requested,
    Finished,
    RequestError,
}

#[derive(Debug, Clone)]
pub struct TrainingClient {
    pub url: String,
    pub id: u64,
    pub status: ClientStatus,
    /// Last parameter set this client reported, overwritten on each report.
    pub model_params: Option<ModelParams>,
}

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, TrainingClient>,
    next_id: u64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client url, returning its id. Always succeeds: a known
    /// url keeps its id and only has its status reset to idle.
    pub fn register(&mut self, url: &str) -> u64 {
        if let Some(client) = self.clients.get_mut(url) {
            info!(url, id = client.id, "client already registered, resetting status");
            client.status = ClientStatus::Idle;
            return client.id;
        }
        self.next_id += 1;
        let id = self.next_id;
        info!(url, id, "registering new training client");
        self.clients.insert(
            url.to_string(),
            TrainingClient { url: url.to_string(), id, status: ClientStatus::Idle, model_params: None },
        );
        id
    }

    /// Removes a client, discarding its last reported parameters. Returns
    /// whether the url was known; an unknown url is reported, not fatal.
    pub fn remove(&mut self, url: &str) -> bool {
        if self.clients.remove(url).is_some() {
            info!(url, "client unregistered");
            true
        } else {
            warn!(url, "client is not registered yet");
            false
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.clients.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&TrainingClient> {
        self.clients.get(url)
    }

    pub fn get_mut(&mut self, url: &str) -> Option<&mut TrainingClient> {
        self.clients.get_mut(url)
    }

    pub fn clients(&self) -> impl Iterator<Item = &TrainingClient> {
        self.clients.values()
    }

    pub fn clients_mut(&mut self) -> impl Iterator<Item = &mut TrainingClient> {
        self.clients.values_mut()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Quorum predicate: no client is still mid-flight. Clients that joined
    /// after dispatch sit at idle and are not part of the round; vacuously
    /// true on an empty registry.
    pub fn quorum_reached(&self) -> bool {
        self.clients.values().all(|c| c.status != ClientStatus::Requested)
    }

    pub fn reset_all_idle(&mut self) {
        for client in self.clients.values_mut() {
            client.status = ClientStatus::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_stable() {
        let mut reg = ClientRegistry::new();
        assert_eq!(reg.register("http://127.0.0.1:5001"), 1);
        assert_eq!(reg.register("http://127.0.0.1:5002"), 2);
        // idempotent re-registration keeps the id, no duplicate record
        assert_eq!(reg.register("http://127.0.0.1:5001"), 1);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn re_registration_resets_status_only() {
        let mut reg = ClientRegistry::new();
        reg.register("http://a");
        reg.get_mut("http://a").unwrap().status = ClientStatus::Finished;
        reg.register("http://a");
        assert_eq!(reg.get("http://a").unwrap().status, ClientStatus::Idle);
    }

    #[test]
    fn ids_are_never_reused_after_removal() {
        let mut reg = ClientRegistry::new();
        reg.register("http://a");
        reg.register("http://b");
        assert!(reg.remove("http://a"));
        assert_eq!(reg.register("http://c"), 3);
    }

    #[test]
    fn removing_unknown_url_is_a_noop() {
        let mut reg = ClientRegistry::new();
        assert!(!reg.remove("http://nobody"));
        assert!(reg.is_empty());
    }

    #[test]
    fn quorum_ignores_idle_joiners() {
        let mut reg = ClientRegistry::new();
        reg.register("http://a");
        reg.register("http://b");
        reg.get_mut("http://a").unwrap().status = ClientStatus::Finished;
        reg.get_mut("http://b").unwrap().status = ClientStatus::Requested;
        assert!(!reg.quorum_reached());
        reg.get_mut("http://b").unwrap().status = ClientStatus::RequestError;
        assert!(reg.quorum_reached());
        // a client joining mid-round is idle and does not block quorum
        reg.register("http://late");
        assert!(reg.quorum_reached());
    }
}
