use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Identity handed over by the authentication provider after sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub token_identifier: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub token_identifier: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "user", rename_all = "lowercase")]
pub enum SyncOutcome {
    Created(UserRecord),
    Updated(UserRecord),
    Unchanged(UserRecord),
}

impl SyncOutcome {
    pub fn user(&self) -> &UserRecord {
        match self {
            SyncOutcome::Created(u) | SyncOutcome::Updated(u) | SyncOutcome::Unchanged(u) => u,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("User record {0} does not exist")]
    MissingRecord(u64),
    #[error("User store unavailable: {0}")]
    Unavailable(String),
}

/// Backing store for user profiles, keyed by the identity token.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_token(&self, token_identifier: &str)
    -> Result<Option<UserRecord>, StoreError>;

    async fn insert(&self, identity: &UserIdentity) -> Result<UserRecord, StoreError>;

    async fn patch(
        &self,
        id: u64,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<UserRecord, StoreError>;
}

/// Creates the user on first sight, and afterwards updates name and email
/// only when they changed.
pub async fn sync_user<S: UserStore + ?Sized>(
    store: &S,
    identity: &UserIdentity,
) -> Result<SyncOutcome, StoreError> {
    match store.find_by_token(&identity.token_identifier).await? {
        Some(existing) if existing.name == identity.name && existing.email == identity.email => {
            tracing::debug!("User {} unchanged", existing.id);
            Ok(SyncOutcome::Unchanged(existing))
        }
        Some(existing) => {
            let updated = store
                .patch(existing.id, identity.name.clone(), identity.email.clone())
                .await?;
            tracing::info!("Updated profile for user {}", updated.id);
            Ok(SyncOutcome::Updated(updated))
        }
        None => {
            let created = store.insert(identity).await?;
            tracing::info!("Created user {}", created.id);
            Ok(SyncOutcome::Created(created))
        }
    }
}

#[derive(Default)]
struct UserTable {
    next_id: u64,
    by_id: HashMap<u64, UserRecord>,
    by_token: HashMap<String, u64>,
}

/// Process-local `UserStore`.
#[derive(Default)]
pub struct InMemoryUserStore {
    table: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_token(
        &self,
        token_identifier: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .by_token
            .get(token_identifier)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn insert(&self, identity: &UserIdentity) -> Result<UserRecord, StoreError> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let record = UserRecord {
            id: table.next_id,
            token_identifier: identity.token_identifier.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
        };
        table
            .by_token
            .insert(record.token_identifier.clone(), record.id);
        table.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    async fn patch(
        &self,
        id: u64,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<UserRecord, StoreError> {
        let mut table = self.table.write().await;
        let record = table
            .by_id
            .get_mut(&id)
            .ok_or(StoreError::MissingRecord(id))?;
        record.name = name;
        record.email = email;
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str, email: Option<&str>) -> UserIdentity {
        UserIdentity {
            token_identifier: "user_2abc".to_string(),
            name: Some(name.to_string()),
            email: email.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn first_sync_creates_the_user() {
        let store = InMemoryUserStore::new();

        let outcome = sync_user(&store, &identity("Asha", Some("asha@example.com")))
            .await
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::Created(_)));
        assert_eq!(outcome.user().name.as_deref(), Some("Asha"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn repeated_sync_is_a_no_op() {
        let store = InMemoryUserStore::new();
        let who = identity("Asha", None);
        sync_user(&store, &who).await.unwrap();

        let outcome = sync_user(&store, &who).await.unwrap();

        assert!(matches!(outcome, SyncOutcome::Unchanged(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn changed_fields_are_patched_in_place() {
        let store = InMemoryUserStore::new();
        let created = sync_user(&store, &identity("Asha", None)).await.unwrap();

        let outcome = sync_user(&store, &identity("Asha K", Some("asha@example.com")))
            .await
            .unwrap();

        match outcome {
            SyncOutcome::Updated(user) => {
                assert_eq!(user.id, created.user().id);
                assert_eq!(user.name.as_deref(), Some("Asha K"));
                assert_eq!(user.email.as_deref(), Some("asha@example.com"));
            }
            other => panic!("expected an update, got {:?}", other),
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn patching_unknown_record_fails() {
        let store = InMemoryUserStore::new();
        assert_eq!(
            store.patch(42, None, None).await,
            Err(StoreError::MissingRecord(42))
        );
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = SyncOutcome::Unchanged(UserRecord {
            id: 1,
            token_identifier: "t".into(),
            name: None,
            email: None,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "unchanged");
        assert_eq!(json["user"]["id"], 1);
    }
}
