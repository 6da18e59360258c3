//! In-memory user store.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::store::{UpdateKey, UserStore};
use crate::user::{User, identity};

/// Process-lifetime store of users.
///
/// A single mutex guards the map; each user's lists are only appended to
/// while it is held, and snapshots are cloned under it too.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    /// Create an empty [`MemoryUserStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: User) -> Result<bool> {
        let mut users = self.users.lock().await;

        match users.entry(user.identity()) {
            Entry::Occupied(_) => {
                tracing::debug!(email = user.email(), "user already exists");
                Ok(false)
            },
            Entry::Vacant(entry) => {
                tracing::debug!(email = user.email(), "user created");
                entry.insert(user);
                Ok(true)
            },
        }
    }

    async fn read(&self) -> Result<Vec<User>> {
        Ok(self.users.lock().await.values().cloned().collect())
    }

    async fn update(&self, email: &str, key: &str, value: &str) -> Result<bool> {
        // an unknown key on an unknown user is still "not found".
        let key = key.parse::<UpdateKey>();

        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(&identity(email)) else {
            return Ok(false);
        };

        let key = key?;
        user.append(key, value.to_owned());
        tracing::debug!(email = user.email(), %key, "user updated");

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::Error;
    use crate::store::{UPDATE_KEY_ABILITY, UPDATE_KEY_EXPERIENCE};

    fn user(email: &str) -> User {
        User::builder()
            .email(email)
            .name("Ana")
            .address("R1")
            .formation("CS")
            .build()
            .unwrap()
    }

    async fn find(store: &MemoryUserStore, email: &str) -> User {
        store
            .read()
            .await
            .unwrap()
            .into_iter()
            .find(|u| u.is(email))
            .unwrap()
    }

    #[tokio::test]
    async fn test_scenario() {
        let store = MemoryUserStore::new();

        assert!(store.create(user("a@x.com")).await.unwrap());
        assert!(!store.create(user("a@x.com")).await.unwrap());
        assert_eq!(store.read().await.unwrap().len(), 1);

        assert!(
            store
                .update("A@X.COM", UPDATE_KEY_ABILITY, "IoT")
                .await
                .unwrap()
        );
        let users = store.read().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].abilities(), ["IoT"]);
        assert_eq!(users[0].email(), "a@x.com");
    }

    #[tokio::test]
    async fn test_create_is_insert_if_absent() {
        let store = MemoryUserStore::new();
        assert!(store.create(user("a@x.com")).await.unwrap());

        let other = User::builder()
            .email("A@x.COM")
            .name("Bob")
            .address("R2")
            .formation("Law")
            .build()
            .unwrap();
        assert!(!store.create(other).await.unwrap());

        let stored = find(&store, "a@x.com").await;
        assert_eq!(stored.name(), "Ana");
        assert_eq!(stored.email(), "a@x.com");
    }

    #[tokio::test]
    async fn test_read_returns_every_user() {
        let store = MemoryUserStore::new();
        let emails: Vec<String> = (0..10).map(|i| format!("user{i}@x.com")).collect();
        for email in &emails {
            assert!(store.create(user(email)).await.unwrap());
        }

        let users = store.read().await.unwrap();
        assert_eq!(users.len(), emails.len());
        for email in &emails {
            assert!(users.iter().any(|u| u.email() == email));
        }
    }

    #[tokio::test]
    async fn test_update_unknown_email() {
        let store = MemoryUserStore::new();
        store.create(user("a@x.com")).await.unwrap();

        assert!(
            !store
                .update("b@x.com", UPDATE_KEY_ABILITY, "IoT")
                .await
                .unwrap()
        );
        assert!(!store.update("b@x.com", "bogus", "IoT").await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sequential_updates_keep_order() {
        let store = MemoryUserStore::new();
        store.create(user("a@x.com")).await.unwrap();

        store.update("a@x.com", UPDATE_KEY_ABILITY, "v1").await.unwrap();
        store.update("a@x.com", UPDATE_KEY_ABILITY, "v2").await.unwrap();

        assert_eq!(find(&store, "a@x.com").await.abilities(), ["v1", "v2"]);
    }

    #[tokio::test]
    async fn test_invalid_key_leaves_state_unchanged() {
        let store = MemoryUserStore::new();
        store.create(user("a@x.com")).await.unwrap();

        let err = store.update("a@x.com", "bogus", "v").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(ref key) if key == "bogus"));

        let stored = find(&store, "a@x.com").await;
        assert!(stored.abilities().is_empty());
        assert!(stored.experience().is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let store = MemoryUserStore::new();
        store.create(user("a@x.com")).await.unwrap();

        let before = store.read().await.unwrap();
        store
            .update("a@x.com", UPDATE_KEY_EXPERIENCE, "Intern")
            .await
            .unwrap();

        assert!(before[0].experience().is_empty());
        assert_eq!(find(&store, "a@x.com").await.experience(), ["Intern"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_creates() {
        let store = Arc::new(MemoryUserStore::new());

        let (a, b) = tokio::join!(
            tokio::spawn({
                let store = Arc::clone(&store);
                async move { store.create(user("e1@x.com")).await }
            }),
            tokio::spawn({
                let store = Arc::clone(&store);
                async move { store.create(user("e2@x.com")).await }
            }),
        );

        assert!(a.unwrap().unwrap());
        assert!(b.unwrap().unwrap());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_creates() {
        for _ in 0..50 {
            let store = Arc::new(MemoryUserStore::new());

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = Arc::clone(&store);
                    tokio::spawn(async move { store.create(user("same@x.com")).await })
                })
                .collect();

            let mut created = 0;
            for handle in handles {
                if handle.await.unwrap().unwrap() {
                    created += 1;
                }
            }

            assert_eq!(created, 1);
            assert_eq!(store.len().await, 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(MemoryUserStore::new());
        store.create(user("a@x.com")).await.unwrap();

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .update("a@x.com", UPDATE_KEY_EXPERIENCE, &format!("job {i}"))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        let experience = find(&store, "a@x.com").await.experience().to_vec();
        assert_eq!(experience.len(), 100);
        for i in 0..100 {
            assert!(experience.contains(&format!("job {i}")));
        }
    }
}
