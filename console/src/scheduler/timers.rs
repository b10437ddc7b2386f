//! In-memory table of pending maintenance timers.
//!
//! Each registration spawns a delayed task that sleeps until its fire time,
//! then dequeues its own entry and runs the callback. The map is the single
//! point of shared mutable state between control calls (register/cancel) and
//! firing tasks; every mutation goes through one lock. The lock is only held
//! to move entries in and out of the map, never across the callback itself.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use super::JobKey;

struct TimerEntry {
    fire_at: DateTime<Utc>,
    // Registration token. A firing task may only dequeue the entry that
    // still carries its own token; a replaced registration fails the check.
    token: Uuid,
    handle: JoinHandle<()>,
}

pub struct JobTimerTable {
    entries: Arc<Mutex<HashMap<JobKey, TimerEntry>>>,
}

impl JobTimerTable {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Install a timer for `key`, replacing any live registration for the
    /// same key. The callback runs once at `fire_at` unless the entry is
    /// cancelled or replaced first. A fire time in the past fires
    /// immediately.
    pub fn register<F>(&self, key: JobKey, fire_at: DateTime<Utc>, callback: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut entries = self.entries.lock().unwrap();

        if let Some(previous) = entries.remove(&key) {
            previous.handle.abort();
            debug!(
                "Replaced existing {} timer for maintenance {}",
                key.1.as_str(),
                key.0
            );
        }

        let token = Uuid::new_v4();
        let table = self.entries.clone();
        let handle = tokio::spawn(async move {
            let delay = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(delay).await;

            let claimed = {
                let mut entries = table.lock().unwrap();
                match entries.get(&key) {
                    Some(entry) if entry.token == token => {
                        entries.remove(&key);
                        true
                    }
                    _ => false,
                }
            };

            if claimed {
                callback.await;
            }
        });

        // The task cannot claim until this guard drops, so the entry is
        // always in place before its timer can fire.
        entries.insert(
            key,
            TimerEntry {
                fire_at,
                token,
                handle,
            },
        );
    }

    /// Cancel the timer for `key`. Returns false (and does nothing) when no
    /// timer is registered for the key.
    pub fn cancel(&self, key: &JobKey) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.remove(key) {
            Some(entry) => {
                entry.handle.abort();
                debug!(
                    "Cancelled {} timer for maintenance {}",
                    key.1.as_str(),
                    key.0
                );
                true
            }
            None => false,
        }
    }

    /// Snapshot of pending registrations, soonest first.
    pub fn pending(&self) -> Vec<(JobKey, DateTime<Utc>)> {
        let entries = self.entries.lock().unwrap();
        let mut pending: Vec<_> = entries
            .iter()
            .map(|(key, entry)| (*key, entry.fire_at))
            .collect();
        pending.sort_by_key(|(_, fire_at)| *fire_at);
        pending
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for JobTimerTable {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl Default for JobTimerTable {
    fn default() -> Self {
        Self::new()
    }
}
