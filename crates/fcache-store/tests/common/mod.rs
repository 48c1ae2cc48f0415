//! Shared test backend: an in-memory operator that records every call and
//! can be told to fail selected keys.

#![allow(dead_code)]

use bytes::Bytes;
use fcache_storage::{memory_operator, BackendError, CacheBackend};
use opendal::Operator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type KeyPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

pub struct RecordingBackend {
    inner: Operator,
    sets: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    gets: AtomicUsize,
    fail_set: Mutex<Option<KeyPredicate>>,
    fail_get: Mutex<Option<KeyPredicate>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            inner: memory_operator().expect("memory operator"),
            sets: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            gets: AtomicUsize::new(0),
            fail_set: Mutex::new(None),
            fail_get: Mutex::new(None),
        }
    }

    /// Operator holding the stored data, for inspecting or tampering with it.
    pub fn inner(&self) -> &Operator {
        &self.inner
    }

    /// Keys passed to `set`, including failed attempts, in call order.
    pub fn sets(&self) -> Vec<String> {
        self.sets.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn fail_sets_where(&self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) {
        *self.fail_set.lock().unwrap() = Some(Box::new(predicate));
    }

    pub fn fail_gets_where(&self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) {
        *self.fail_get.lock().unwrap() = Some(Box::new(predicate));
    }

    /// Whether the backend currently holds `key`.
    pub async fn contains(&self, key: &str) -> bool {
        CacheBackend::get(&self.inner, key)
            .await
            .expect("memory get")
            .is_some()
    }

    fn should_fail(slot: &Mutex<Option<KeyPredicate>>, key: &str) -> bool {
        slot.lock().unwrap().as_ref().is_some_and(|p| p(key))
    }
}

impl CacheBackend for RecordingBackend {
    async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
        self.sets.lock().unwrap().push(key.to_string());
        if Self::should_fail(&self.fail_set, key) {
            return Err(BackendError::Unavailable(format!("injected set failure for {key}")));
        }
        CacheBackend::set(&self.inner, key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if Self::should_fail(&self.fail_get, key) {
            return Err(BackendError::Unavailable(format!("injected get failure for {key}")));
        }
        CacheBackend::get(&self.inner, key).await
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.deletes.lock().unwrap().push(key.to_string());
        CacheBackend::delete(&self.inner, key).await
    }
}

/// Deterministic, non-repeating test content.
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len as u64)
        .map(|i| (i.wrapping_mul(31) ^ (i >> 7)) as u8)
        .collect()
}
