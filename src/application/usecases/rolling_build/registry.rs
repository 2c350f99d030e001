//! PR 키별 진행 중 작업 레지스트리.
//!
//! 키마다 취소되지 않은 작업은 최대 하나다. 새 작업을 등록하면 같은 키의
//! 기존 작업은 같은 잠금 구간 안에서 취소되고 교체된다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::target::PullRequestKey;

struct RegisteredOperation {
    id: u64,
    token: CancellationToken,
}

#[derive(Default)]
pub struct OperationRegistry {
    next_id: AtomicU64,
    entries: Mutex<HashMap<PullRequestKey, RegisteredOperation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PullRequestKey, RegisteredOperation>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 새 작업을 등록하고, 같은 키로 진행 중이던 작업을 취소한다.
    /// 반환된 토큰은 `parent`가 취소되어도 함께 취소된다.
    pub fn register(&self, key: &PullRequestKey, parent: &CancellationToken) -> OperationGuard<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = parent.child_token();

        let mut entries = self.entries();
        if let Some(previous) = entries.insert(
            key.clone(),
            RegisteredOperation {
                id,
                token: token.clone(),
            },
        ) {
            previous.token.cancel();
            info!(%key, superseded = previous.id, "cancelled in-flight build");
        }
        drop(entries);

        OperationGuard {
            registry: self,
            key: key.clone(),
            id,
            token,
        }
    }

    pub fn is_registered(&self, key: &PullRequestKey) -> bool {
        self.entries().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 현재 등록된 항목이 이 작업일 때만 제거한다.
    fn remove_if_current(&self, key: &PullRequestKey, id: u64) {
        let mut entries = self.entries();
        if entries.get(key).is_some_and(|entry| entry.id == id) {
            entries.remove(key);
        }
    }
}

/// 등록된 작업 하나. drop 시 자기 자신의 항목만 정리한다.
pub struct OperationGuard<'a> {
    registry: &'a OperationRegistry,
    key: PullRequestKey,
    id: u64,
    token: CancellationToken,
}

impl OperationGuard<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.registry.remove_if_current(&self.key, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(number: u64) -> PullRequestKey {
        PullRequestKey::new("space", "station", number)
    }

    #[test]
    fn newer_registration_cancels_older() {
        let registry = OperationRegistry::new();
        let root = CancellationToken::new();

        let first = registry.register(&key(1), &root);
        let second = registry.register(&key(1), &root);

        assert!(first.token().is_cancelled());
        assert!(!second.token().is_cancelled());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn stale_cleanup_keeps_newer_entry() {
        let registry = OperationRegistry::new();
        let root = CancellationToken::new();

        let first = registry.register(&key(1), &root);
        let second = registry.register(&key(1), &root);
        drop(first);

        assert!(registry.is_registered(&key(1)));
        drop(second);
        assert!(registry.is_empty());
    }

    #[test]
    fn different_keys_do_not_interfere() {
        let registry = OperationRegistry::new();
        let root = CancellationToken::new();

        let a = registry.register(&key(1), &root);
        let b = registry.register(&key(2), &root);

        assert!(!a.token().is_cancelled());
        assert!(!b.token().is_cancelled());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn parent_cancellation_propagates() {
        let registry = OperationRegistry::new();
        let root = CancellationToken::new();
        let op = registry.register(&key(1), &root);

        root.cancel();
        assert!(op.token().is_cancelled());
    }

    #[test]
    fn rerun_after_completion_gets_fresh_entry() {
        let registry = OperationRegistry::new();
        let root = CancellationToken::new();

        let first = registry.register(&key(1), &root);
        let first_token = first.token().clone();
        drop(first);
        assert!(registry.is_empty());

        let second = registry.register(&key(1), &root);
        assert!(!first_token.is_cancelled());
        assert!(!second.token().is_cancelled());
        assert_eq!(registry.len(), 1);
    }
}
