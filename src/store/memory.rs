use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{HealthCheck, NoteStore, StoreError, StoreResult, UserStore};
use crate::model::{ListParams, Note, SortDirection, User};

#[derive(Default)]
struct MemoryState {
    next_user_id: i64,
    next_note_id: i64,
    users: HashMap<String, User>,
    notes: BTreeMap<i64, Note>,
}

/// 内存存储，开发与测试用
/// In-process store used for development and tests
///
/// 每个修改操作都在同一把写锁内完成校验与修改
/// Every mutation checks and mutates under a single write lock
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> StoreResult<i64> {
        let mut state = self.state.write();
        if state.users.contains_key(username) {
            return Err(StoreError::UsernameTaken);
        }
        state.next_user_id += 1;
        let id = state.next_user_id;
        state.users.insert(
            username.to_string(),
            User {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<User> {
        self.state
            .read()
            .users
            .get(username)
            .cloned()
            .ok_or(StoreError::UserNotFound)
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn create(&self, owner_id: i64, title: &str, content: &str) -> StoreResult<Note> {
        let mut state = self.state.write();
        if !state.users.values().any(|u| u.id == owner_id) {
            return Err(StoreError::UnknownOwner);
        }
        state.next_note_id += 1;
        let now = Utc::now();
        let note = Note {
            id: state.next_note_id,
            owner_id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn get(&self, owner_id: i64, note_id: i64) -> StoreResult<Note> {
        let state = self.state.read();
        let note = state.notes.get(&note_id).ok_or(StoreError::NoteNotFound)?;
        if note.owner_id != owner_id {
            return Err(StoreError::Forbidden);
        }
        Ok(note.clone())
    }

    async fn list(&self, owner_id: i64, params: ListParams) -> StoreResult<Vec<Note>> {
        let state = self.state.read();
        let mut notes: Vec<&Note> = state
            .notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .collect();
        notes.sort_by_key(|n| (n.created_at, n.id));
        if params.sort == SortDirection::Desc {
            notes.reverse();
        }
        Ok(notes
            .into_iter()
            .skip(params.offset.max(0) as usize)
            .take(params.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        note_id: i64,
        acting_user_id: i64,
        title: &str,
        content: &str,
    ) -> StoreResult<()> {
        let mut state = self.state.write();
        let note = state
            .notes
            .get_mut(&note_id)
            .ok_or(StoreError::NoteNotFound)?;
        if note.owner_id != acting_user_id {
            return Err(StoreError::Forbidden);
        }
        note.title = title.to_string();
        note.content = content.to_string();
        note.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, note_id: i64, acting_user_id: i64) -> StoreResult<()> {
        let mut state = self.state.write();
        match state.notes.get(&note_id) {
            None => Err(StoreError::NoteNotFound),
            Some(note) if note.owner_id != acting_user_id => Err(StoreError::Forbidden),
            Some(_) => {
                state.notes.remove(&note_id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn check_health(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 预先注册 id 为 1..=n 的用户 / Store with users 1..=n registered
    async fn store_with_users(n: i64) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 1..=n {
            store.insert_user(&format!("user{}", i), "hash").await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        let id = store.insert_user("alice", "hash").await.unwrap();
        assert_eq!(id, 1);
        assert!(matches!(
            store.insert_user("alice", "other").await,
            Err(StoreError::UsernameTaken)
        ));
        let user = store.find_user_by_username("alice").await.unwrap();
        assert_eq!(user.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_find_unknown_user() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.find_user_by_username("ghost").await,
            Err(StoreError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let store = store_with_users(1).await;
        let created = store.create(1, "t1", "c1").await.unwrap();
        let fetched = store.get(1, created.id).await.unwrap();
        assert_eq!(fetched.title, "t1");
        assert_eq!(fetched.content, "c1");
        assert_eq!(fetched.owner_id, 1);
    }

    #[tokio::test]
    async fn test_create_for_unknown_owner() {
        let store = store_with_users(1).await;
        assert!(matches!(
            store.create(99, "orphan", "").await,
            Err(StoreError::UnknownOwner)
        ));
        let notes = store.list(99, ListParams::default()).await.unwrap();
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden_and_data_untouched() {
        let store = store_with_users(2).await;
        let note = store.create(1, "mine", "secret").await.unwrap();

        assert!(matches!(store.get(2, note.id).await, Err(StoreError::Forbidden)));
        assert!(matches!(
            store.update(note.id, 2, "hacked", "").await,
            Err(StoreError::Forbidden)
        ));
        assert!(matches!(store.delete(note.id, 2).await, Err(StoreError::Forbidden)));

        let still = store.get(1, note.id).await.unwrap();
        assert_eq!(still.title, "mine");
        assert_eq!(still.content, "secret");
    }

    #[tokio::test]
    async fn test_update_refreshes_timestamp() {
        let store = store_with_users(1).await;
        let note = store.create(1, "a", "b").await.unwrap();
        store.update(note.id, 1, "c", "d").await.unwrap();
        let updated = store.get(1, note.id).await.unwrap();
        assert_eq!(updated.title, "c");
        assert_eq!(updated.content, "d");
        assert!(updated.updated_at >= note.updated_at);
        assert_eq!(updated.created_at, note.created_at);
    }

    #[tokio::test]
    async fn test_delete_missing_is_always_not_found() {
        let store = store_with_users(1).await;
        for _ in 0..3 {
            assert!(matches!(store.delete(42, 1).await, Err(StoreError::NoteNotFound)));
        }
        let note = store.create(1, "x", "").await.unwrap();
        store.delete(note.id, 1).await.unwrap();
        assert!(matches!(
            store.delete(note.id, 1).await,
            Err(StoreError::NoteNotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_pagination_and_order() {
        let store = store_with_users(2).await;
        for i in 0..5 {
            store.create(1, &format!("n{}", i), "").await.unwrap();
        }
        store.create(2, "foreign", "").await.unwrap();

        let asc = store
            .list(1, ListParams::new(2, 1, SortDirection::Asc))
            .await
            .unwrap();
        let titles: Vec<_> = asc.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["n1", "n2"]);

        let desc = store
            .list(1, ListParams::new(10, 0, SortDirection::Desc))
            .await
            .unwrap();
        assert_eq!(desc.len(), 5);
        assert_eq!(desc[0].title, "n4");
        assert!(desc.iter().all(|n| n.owner_id == 1));
        assert!(desc
            .windows(2)
            .all(|w| (w[0].created_at, w[0].id) >= (w[1].created_at, w[1].id)));
    }

    #[tokio::test]
    async fn test_list_empty_is_ok() {
        let store = MemoryStore::new();
        let notes = store.list(7, ListParams::default()).await.unwrap();
        assert!(notes.is_empty());
    }
}
