mod runs;
mod sessions;
mod store;

#[cfg(test)]
mod store_test;

use crate::api::{ApiClient, ApiError};
use egui_inbox::UiInbox;
use std::cell::RefCell;
use std::collections::HashSet;
use std::future::Future;
use store::{LiveQueryStore, StoreMessage};

#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Ready(T),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Sessions,
    Session(String),
    Messages(String),
    Runs,
    RunTrace(String),
    Agent(String),
}

/// Cached, deduplicated reads against the agent server.
///
/// Accessors kick off a fetch the first time a key is read and return the
/// current `Loadable` every frame after that. Nothing is re-fetched until the
/// key is invalidated; the last ready value stays visible meanwhile.
pub struct LiveQueryClient {
    client: ApiClient,
    store: RefCell<LiveQueryStore>,
    updates: UiInbox<StoreMessage>,
    in_flight: RefCell<HashSet<QueryKey>>,
}

impl LiveQueryClient {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            store: RefCell::new(LiveQueryStore::default()),
            updates: UiInbox::new(),
            in_flight: RefCell::new(HashSet::new()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.client
    }

    pub fn poll(&self, ctx: &egui::Context) {
        let messages: Vec<StoreMessage> = self.updates.read(ctx).collect();
        if messages.is_empty() {
            return;
        }

        let mut store = self.store.borrow_mut();
        for message in messages {
            let completed = store.apply(message);
            for key in completed {
                self.complete_query(&key);
            }
        }
    }

    pub fn invalidate(&self, key: QueryKey) {
        self.complete_query(&key);
        self.store.borrow_mut().invalidate(key);
    }

    /// Bumped every time `key` finishes loading successfully.
    pub fn revision(&self, key: &QueryKey) -> u64 {
        self.store.borrow().revision(key)
    }

    /// True while a re-fetch of ready data is pending.
    pub fn is_refreshing(&self, key: &QueryKey) -> bool {
        self.store.borrow().is_stale(key)
    }

    /// Drops every cached value, used on login, logout and 401. Results of
    /// fetches still running are discarded when they arrive.
    pub fn clear(&self) {
        self.in_flight.borrow_mut().clear();
        self.store.borrow_mut().reset();
    }

    fn complete_query(&self, key: &QueryKey) {
        self.in_flight.borrow_mut().remove(key);
    }

    fn is_in_flight(&self, key: &QueryKey) -> bool {
        self.in_flight.borrow().contains(key)
    }

    fn load_if_needed<T, Fut, Fetch, OkMap>(&self, key: QueryKey, fetch: Fetch, ok_map: OkMap)
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        Fetch: FnOnce(ApiClient) -> Fut + Send + 'static,
        OkMap: FnOnce(u64, T) -> StoreMessage + Send + 'static,
    {
        if self.is_in_flight(&key) || !self.store.borrow().needs_load(&key) {
            return;
        }
        self.start_query(key, fetch, ok_map);
    }

    fn start_query<T, Fut, Fetch, OkMap>(&self, key: QueryKey, fetch: Fetch, ok_map: OkMap)
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        Fetch: FnOnce(ApiClient) -> Fut + Send + 'static,
        OkMap: FnOnce(u64, T) -> StoreMessage + Send + 'static,
    {
        {
            let mut in_flight = self.in_flight.borrow_mut();
            if in_flight.contains(&key) {
                return;
            }
            in_flight.insert(key.clone());
        }

        let generation = {
            let mut store = self.store.borrow_mut();
            store.mark_loading(&key);
            store.generation(&key)
        };

        log::debug!("fetching {key:?}");
        let client = self.client.clone();
        let sender = self.updates.sender();
        tokio::spawn(async move {
            match fetch(client).await {
                Ok(payload) => {
                    sender.send(ok_map(generation, payload)).ok();
                }
                Err(err) => {
                    sender
                        .send(StoreMessage::QueryFailed {
                            key,
                            generation,
                            message: err.to_string(),
                        })
                        .ok();
                }
            }
        });
    }
}
