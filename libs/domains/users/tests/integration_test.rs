//! Integration tests for Users domain
//!
//! These tests use real PostgreSQL (and Redis) via testcontainers to ensure:
//! - Queries and id assignment work against the migrated schema
//! - The unique email index surfaces as a conflict
//! - Listing streams rows in id order
//! - The Redis cache serves and evicts entries for the service

use domain_users::*;
use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Duration;
use test_utils::{TestDataBuilder, TestDatabase, TestRedis, assertions::*};

// ============================================================================
// Repository Tests
// ============================================================================

#[tokio::test]
#[ignore = "requires docker"]
async fn test_save_and_find_user() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("save_and_find");

    let created = repo
        .save(User::new(builder.name("user", "main"), builder.email("ada")))
        .await
        .unwrap();
    let id = assert_some(created.id, "store should assign an id");

    let by_id = repo.find_by_id(id).await.unwrap();
    assert_eq!(by_id.as_ref(), Some(&created));

    let by_email = repo.find_by_email(&created.email).await.unwrap();
    assert_eq!(by_email, Some(created));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_duplicate_email_constraint() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("duplicate_email");
    let email = builder.email("ada");

    repo.save(User::new("Ada", email.clone())).await.unwrap();
    let err = repo.save(User::new("Other", email.clone())).await.unwrap_err();

    assert!(matches!(err, UserError::EmailUniqueness(e) if e == email));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_update_existing_user() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());

    let created = repo.save(User::new("Ada", "ada@x.io")).await.unwrap();
    let updated = repo
        .save(User {
            name: "Ada Lovelace".to_string(),
            ..created.clone()
        })
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Ada Lovelace");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_find_all_streams_in_id_order() {
    let db = TestDatabase::new().await;
    db.truncate("users").await;
    let repo = PgUserRepository::new(db.connection());

    for (name, email) in [("Ada", "ada@x.io"), ("Alan", "alan@x.io"), ("Grace", "grace@x.io")] {
        repo.save(User::new(name, email)).await.unwrap();
    }

    let users: Vec<User> = repo.find_all().try_collect().await.unwrap();
    let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Ada", "Alan", "Grace"]);
    assert_eq!(users[0].id, Some(1));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_delete_missing_user_is_noop() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());

    repo.delete_by_id(12345).await.unwrap();
    assert_none(repo.find_by_id(12345).await.unwrap(), "nothing to delete");
}

// ============================================================================
// Service Tests
// ============================================================================

#[tokio::test]
#[ignore = "requires docker"]
async fn test_service_create_conflict_persists_nothing() {
    let db = TestDatabase::new().await;
    db.truncate("users").await;
    let service = UserService::new(PgUserRepository::new(db.connection()));

    let first = service.create(User::new("Ada", "ada@x.io")).await;
    assert!(matches!(first, CreateUserOutcome::Created(_)));

    let second = service.create(User::new("Other", "ada@x.io")).await;
    assert_eq!(second, CreateUserOutcome::Conflict);

    let users: Vec<User> = service.list().try_collect().await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_service_with_redis_cache() {
    let db = TestDatabase::new().await;
    db.truncate("users").await;
    let redis = TestRedis::new().await;
    let cache = Arc::new(RedisUserCache::new(redis.connection(), Duration::from_secs(60)));
    let service = UserService::with_cache(PgUserRepository::new(db.connection()), cache.clone());

    let CreateUserOutcome::Created(ada) = service.create(User::new("Ada", "ada@x.io")).await else {
        panic!("expected user to be created");
    };
    let id = assert_some(ada.id, "created user has an id");

    assert_eq!(service.get_by_id(id).await.unwrap(), Some(ada.clone()));
    assert_eq!(
        cache.get(CacheKey::UserById(id)).await.unwrap(),
        Some(CachedValue::User(ada.clone()))
    );

    let users: Vec<User> = service.stream_users().try_collect().await.unwrap();
    assert_eq!(users, vec![ada]);

    service.delete(id).await.unwrap();
    assert!(cache.get(CacheKey::UserById(id)).await.unwrap().is_none());
    assert!(cache.get(CacheKey::AllUsers).await.unwrap().is_none());
    assert!(service.get_by_id(id).await.unwrap().is_none());
}
