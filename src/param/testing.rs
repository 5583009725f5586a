//! Test doubles shared by the parameter cache unit and property tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{RemoteError, StoreError};
use crate::param::persistent::{MemoryStore, PersistentStore};
use crate::param::remote::RemoteParamSource;

/// Remote source answering from a map, counting every call.
#[derive(Default)]
pub struct FakeRemote {
    values: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(pairs: &[(&str, &str)]) -> Self {
        let remote = Self::new();
        for (code, value) in pairs {
            remote.set(code, value);
        }
        remote
    }

    pub fn set(&self, code: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(code.to_string(), value.to_string());
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteParamSource for FakeRemote {
    async fn get_param_by_code(&self, code: &str) -> Result<String, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                code: code.to_string(),
                status: 503,
            });
        }

        self.values
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| RemoteError::Missing(code.to_string()))
    }
}

/// Memory store that counts reads.
#[derive(Default)]
pub struct SpyStore {
    inner: MemoryStore,
    reads: AtomicUsize,
}

impl SpyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl PersistentStore for SpyStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys()
    }
}
