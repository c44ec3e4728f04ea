//! Identifier resolution against the in-memory store.

use std::sync::Arc;
use strata_auth::models::{account_table, identifier_table};
use strata_auth::{Account, Identifier, IdentifierIndex, IdentifierRecord};
use strata_commons::{AccountId, IdType};
use strata_store::test_utils::RecordingStore;
use strata_store::{DocumentStore, EntityStore, EntityTable, InMemoryStore, StorageError};

struct Fixture {
    store: Arc<RecordingStore>,
    accounts: Arc<EntityTable<Account>>,
    identifiers: Arc<EntityTable<IdentifierRecord>>,
    index: IdentifierIndex,
}

async fn fixture() -> Fixture {
    let store = Arc::new(RecordingStore::new(Arc::new(InMemoryStore::new())));
    let backend: Arc<dyn DocumentStore> = store.clone();

    let accounts = Arc::new(
        EntityTable::<Account>::create(backend.clone(), account_table("accounts"))
            .await
            .unwrap(),
    );
    let identifiers = Arc::new(
        EntityTable::<IdentifierRecord>::create(backend, identifier_table("identifiers"))
            .await
            .unwrap(),
    );
    let index = IdentifierIndex::new(identifiers.clone(), accounts.clone());

    Fixture {
        store,
        accounts,
        identifiers,
        index,
    }
}

impl Fixture {
    async fn account(&self, id: &str, email: &str) -> Account {
        let mut account = Account::new(id, email);
        self.accounts.save(&mut account).await.unwrap();
        account
    }

    async fn link(&self, identifier: &str, id_type: IdType, account: &str) {
        let mut record = IdentifierRecord::new(identifier, id_type, AccountId::new(account));
        self.identifiers.save(&mut record).await.unwrap();
    }
}

#[tokio::test]
async fn test_get_user_returns_first_resolving_candidate() {
    let f = fixture().await;
    f.account("acc-b", "b@example.com").await;
    f.account("acc-c", "c@example.com").await;
    f.link("b@example.com", IdType::Email, "acc-b").await;
    f.link("c@example.com", IdType::Email, "acc-c").await;

    let gets_before = f.store.get_count();
    let account = f
        .index
        .get_user(&["a@example.com", "b@example.com", "c@example.com"])
        .await
        .unwrap();

    assert_eq!(account.meta.id, "acc-b");
    // a (miss), b, then b's account; c is never looked up
    assert_eq!(f.store.get_count() - gets_before, 3);
}

#[tokio::test]
async fn test_get_user_not_found_on_last_candidate() {
    let f = fixture().await;

    let err = f.index.get_user(&["a", "b"]).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("id=\"b\""));
}

#[tokio::test]
async fn test_get_user_with_no_candidates_is_not_found() {
    let f = fixture().await;
    let none: [&str; 0] = [];
    assert!(f.index.get_user(&none).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_identifier_pointing_at_missing_account_falls_through() {
    let f = fixture().await;
    f.account("acc-2", "two@example.com").await;
    f.link("orphan", IdType::GoogleId, "acc-gone").await;
    f.link("two@example.com", IdType::Email, "acc-2").await;

    let account = f
        .index
        .get_user(&["orphan", "two@example.com"])
        .await
        .unwrap();
    assert_eq!(account.meta.id, "acc-2");
}

#[tokio::test]
async fn test_upsert_keeps_first_owner_and_refreshes_last_used() {
    let f = fixture().await;

    let first = f
        .index
        .upsert(&AccountId::new("acc-1"), IdType::FacebookId, 424242u64)
        .await
        .unwrap();
    assert_eq!(first.meta.id, "424242");
    assert_eq!(first.user_id.as_str(), "acc-1");

    let second = f
        .index
        .upsert(&AccountId::new("acc-2"), IdType::Email, "424242")
        .await
        .unwrap();
    assert_eq!(second.user_id.as_str(), "acc-1");
    assert_eq!(second.id_type, IdType::FacebookId);
    assert!(second.last_used_at > first.last_used_at);
    assert_eq!(second.meta.created_at, first.meta.created_at);
}

#[tokio::test]
async fn test_upsert_at_max_last_used_saturates() {
    let f = fixture().await;
    let mut record =
        IdentifierRecord::new("ada@example.com", IdType::Email, AccountId::new("acc-1"));
    record.last_used_at = i64::MAX;
    f.identifiers.save(&mut record).await.unwrap();

    let refreshed = f
        .index
        .upsert(&AccountId::new("acc-1"), IdType::Email, "ada@example.com")
        .await
        .unwrap();
    assert_eq!(refreshed.last_used_at, i64::MAX);
}

#[tokio::test]
async fn test_get_user_leaves_last_used_untouched() {
    let f = fixture().await;
    f.account("acc-1", "ada@example.com").await;
    let linked = f
        .index
        .upsert(&AccountId::new("acc-1"), IdType::Email, "ada@example.com")
        .await
        .unwrap();

    f.index.get_user(&["ada@example.com"]).await.unwrap();

    let after = f.identifiers.get_by_id("ada@example.com").await.unwrap();
    assert_eq!(after.last_used_at, linked.last_used_at);
    assert_eq!(after.meta.updated_at, linked.meta.updated_at);
}

#[tokio::test]
async fn test_get_user_and_push_identifiers_links_all() {
    let f = fixture().await;
    f.account("acc-1", "ada@example.com").await;
    f.link("ada@example.com", IdType::Email, "acc-1").await;

    let presented = vec![
        Identifier::new(IdType::GoogleId, "g-123"),
        Identifier::new(IdType::Email, "ada@example.com"),
        Identifier::new(IdType::AppleId, "apple-9"),
    ];
    let account = f
        .index
        .get_user_and_push_identifiers(&presented)
        .await
        .unwrap();
    assert_eq!(account.meta.id, "acc-1");

    let mut linked: Vec<String> = f
        .index
        .identifiers_for(&AccountId::new("acc-1"))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.meta.id)
        .collect();
    linked.sort();
    assert_eq!(linked, vec!["ada@example.com", "apple-9", "g-123"]);

    // The new identifiers now resolve on their own
    let via_google = f.index.get_user(&["g-123"]).await.unwrap();
    assert_eq!(via_google.meta.id, "acc-1");
}

#[tokio::test]
async fn test_get_user_and_push_identifiers_unauthorized() {
    let f = fixture().await;
    let presented = vec![
        Identifier::new(IdType::Email, "nobody@example.com"),
        Identifier::new(IdType::GoogleId, "g-0"),
    ];

    let err = f
        .index
        .get_user_and_push_identifiers(&presented)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(f
        .index
        .identifiers_for(&AccountId::new("nobody"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_store_failures_are_not_swallowed() {
    let f = fixture().await;
    f.account("acc-1", "ada@example.com").await;

    // Identifier points at a table that was never declared
    let broken_accounts = Arc::new(EntityTable::<Account>::new(
        f.store.clone(),
        account_table("missing-accounts"),
    ));
    f.link("ada@example.com", IdType::Email, "acc-1").await;
    let index = IdentifierIndex::new(f.identifiers.clone(), broken_accounts);

    let err = index
        .get_user(&["ada@example.com", "other"])
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert!(matches!(
        err,
        strata_auth::IdentityError::Entity(strata_store::EntityError::Store(
            StorageError::TableNotFound(_)
        ))
    ));
}
