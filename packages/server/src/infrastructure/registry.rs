//! Connection registry: the single source of truth for who is online.
//!
//! ## 責務
//!
//! - 認証済みコネクションと Identity・送信チャンネルの対応を保持
//! - register / unregister / snapshot を単一のクリティカルセクションで実行
//!
//! ロックは内部に閉じており、呼び出し側に公開しない。ロック保持中に
//! I/O を行わないこと（snapshot を取ってから解放し、その後に送信する）。

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, DisplayName, Identity, PusherChannel, RegistryError};

/// Whether two live connections may share a display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePolicy {
    /// `register` rejects a name that is already registered.
    Unique,
    /// Any number of connections may use the same name.
    AllowDuplicates,
}

/// One live registry entry, as returned by [`ConnectionRegistry::snapshot`].
#[derive(Debug, Clone)]
pub struct RegistryMember {
    pub id: ConnectionId,
    pub identity: Identity,
    pub sender: PusherChannel,
}

struct Entry {
    identity: Identity,
    sender: PusherChannel,
}

/// Concurrent map from connection handle to identity.
pub struct ConnectionRegistry {
    policy: NamePolicy,
    /// Key: connection handle
    entries: Mutex<HashMap<ConnectionId, Entry>>,
}

impl ConnectionRegistry {
    pub fn new(policy: NamePolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> NamePolicy {
        self.policy
    }

    /// Insert a connection.
    ///
    /// Under [`NamePolicy::Unique`] the name check and the insert happen in
    /// the same critical section.
    pub async fn register(
        &self,
        id: ConnectionId,
        identity: Identity,
        sender: PusherChannel,
    ) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock().await;

        if self.policy == NamePolicy::Unique
            && entries.values().any(|entry| entry.identity.name == identity.name)
        {
            return Err(RegistryError::NameTaken(identity.name.into_string()));
        }

        tracing::debug!(connection = %id, name = %identity.name, "registered connection");
        entries.insert(id, Entry { identity, sender });
        Ok(())
    }

    /// Remove a connection. Removing an absent handle is a no-op.
    ///
    /// Returns the identity that was bound to the handle, if it was present.
    pub async fn unregister(&self, id: &ConnectionId) -> Option<Identity> {
        let mut entries = self.entries.lock().await;
        let removed = entries.remove(id).map(|entry| entry.identity);
        if let Some(identity) = &removed {
            tracing::debug!(connection = %id, name = %identity.name, "unregistered connection");
        }
        removed
    }

    /// Copy of every live entry, taken under the lock.
    pub async fn snapshot(&self) -> Vec<RegistryMember> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .map(|(id, entry)| RegistryMember {
                id: *id,
                identity: entry.identity.clone(),
                sender: entry.sender.clone(),
            })
            .collect()
    }

    pub async fn is_name_taken(&self, name: &DisplayName) -> bool {
        let entries = self.entries.lock().await;
        entries.values().any(|entry| &entry.identity.name == name)
    }

    /// Display names of every live connection, sorted.
    pub async fn display_names(&self) -> Vec<DisplayName> {
        let mut names: Vec<DisplayName> = {
            let entries = self.entries.lock().await;
            entries.values().map(|entry| entry.identity.name.clone()).collect()
        };
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use tokio::sync::mpsc;

    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - register / unregister / snapshot の整合性（並行アクセス下を含む）
    // - Unique ポリシーでの名前重複拒否（test-and-set）
    // - unregister の冪等性
    // ========================================

    fn identity(name: &str) -> Identity {
        Identity::claimed(DisplayName::new(name.to_string()).unwrap())
    }

    fn sender() -> PusherChannel {
        let (tx, _rx) = mpsc::channel(64);
        tx
    }

    #[tokio::test]
    async fn test_register_and_snapshot() {
        // テスト項目: 登録したコネクションが snapshot に含まれる
        // given (前提条件):
        let registry = ConnectionRegistry::new(NamePolicy::Unique);
        let alice = ConnectionId::generate();

        // when (操作):
        registry
            .register(alice, identity("alice"), sender())
            .await
            .unwrap();

        // then (期待する結果):
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, alice);
        assert_eq!(snapshot[0].identity.name.as_str(), "alice");
    }

    #[tokio::test]
    async fn test_unique_policy_rejects_duplicate_name() {
        // テスト項目: Unique ポリシーでは同名の登録が拒否される
        // given (前提条件):
        let registry = ConnectionRegistry::new(NamePolicy::Unique);
        registry
            .register(ConnectionId::generate(), identity("alice"), sender())
            .await
            .unwrap();

        // when (操作):
        let result = registry
            .register(ConnectionId::generate(), identity("alice"), sender())
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RegistryError::NameTaken("alice".to_string())));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_allow_duplicates_policy_accepts_same_name() {
        // テスト項目: AllowDuplicates ポリシーでは同名でも登録できる
        // given (前提条件):
        let registry = ConnectionRegistry::new(NamePolicy::AllowDuplicates);

        // when (操作):
        let first = registry
            .register(ConnectionId::generate(), identity("alice"), sender())
            .await;
        let second = registry
            .register(ConnectionId::generate(), identity("alice"), sender())
            .await;

        // then (期待する結果):
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_name_is_free_again_after_unregister() {
        // テスト項目: 切断後は同じ名前で再登録できる
        // given (前提条件):
        let registry = ConnectionRegistry::new(NamePolicy::Unique);
        let first = ConnectionId::generate();
        registry
            .register(first, identity("alice"), sender())
            .await
            .unwrap();

        // when (操作):
        registry.unregister(&first).await;
        let result = registry
            .register(ConnectionId::generate(), identity("alice"), sender())
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(registry.is_name_taken(&identity("alice").name).await);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        // テスト項目: 同じハンドルを 2 回 unregister しても 1 回と同じ結果になる
        // given (前提条件):
        let registry = ConnectionRegistry::new(NamePolicy::Unique);
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();
        registry
            .register(alice, identity("alice"), sender())
            .await
            .unwrap();
        registry
            .register(bob, identity("bob"), sender())
            .await
            .unwrap();

        // when (操作):
        let first = registry.unregister(&alice).await;
        let second = registry.unregister(&alice).await;

        // then (期待する結果):
        assert_eq!(first, Some(identity("alice")));
        assert_eq!(second, None);
        let ids: Vec<ConnectionId> = registry.snapshot().await.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![bob]);
    }

    #[tokio::test]
    async fn test_display_names_are_sorted() {
        // テスト項目: 表示名リストはソートされて返される
        // given (前提条件):
        let registry = ConnectionRegistry::new(NamePolicy::Unique);
        for name in ["charlie", "alice", "bob"] {
            registry
                .register(ConnectionId::generate(), identity(name), sender())
                .await
                .unwrap();
        }

        // when (操作):
        let names: Vec<String> = registry
            .display_names()
            .await
            .into_iter()
            .map(DisplayName::into_string)
            .collect();

        // then (期待する結果):
        assert_eq!(names, vec!["alice", "bob", "charlie"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_unregister_keeps_snapshot_consistent() {
        // テスト項目: 並行 register/unregister 後の snapshot に欠落・幽霊エントリがない
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new(NamePolicy::Unique));
        let ids: Vec<ConnectionId> = (0..64).map(|_| ConnectionId::generate()).collect();

        // when (操作): 全員を並行に登録し、偶数番目だけ並行に削除する
        let mut handles = Vec::new();
        for (i, id) in ids.iter().copied().enumerate() {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .register(id, identity(&format!("user{i}")), sender())
                    .await
                    .unwrap();
                if i % 2 == 0 {
                    registry.unregister(&id).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // then (期待する結果):
        let expected: HashSet<ConnectionId> = ids
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 1)
            .map(|(_, id)| *id)
            .collect();
        let actual: HashSet<ConnectionId> =
            registry.snapshot().await.into_iter().map(|m| m.id).collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_name_registration_admits_exactly_one() {
        // テスト項目: 同名の並行登録は必ず 1 件だけ成功する
        for _ in 0..20 {
            // given (前提条件):
            let registry = Arc::new(ConnectionRegistry::new(NamePolicy::Unique));

            // when (操作):
            let attempts: Vec<_> = (0..2)
                .map(|_| {
                    let registry = registry.clone();
                    tokio::spawn(async move {
                        registry
                            .register(ConnectionId::generate(), identity("alice"), sender())
                            .await
                    })
                })
                .collect();
            let mut successes = 0;
            for attempt in attempts {
                if attempt.await.unwrap().is_ok() {
                    successes += 1;
                }
            }

            // then (期待する結果):
            assert_eq!(successes, 1);
            assert_eq!(registry.len().await, 1);
        }
    }
}
