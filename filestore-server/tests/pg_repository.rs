//! PgFileRepository against a real PostgreSQL instance.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p filestore-server -- --ignored

use filestore_server::db::migrate::{apply_sql, FILES_SCHEMA};
use filestore_server::db::pool::create_pool_with_options;
use filestore_server::db::{FileRepository, PgFileRepository};
use filestore_server::models::{File, FileName};

async fn repository() -> PgFileRepository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = create_pool_with_options(&url, 4)
        .await
        .expect("pool creation failed");
    apply_sql(&pool, FILES_SCHEMA).await.expect("schema failed");
    PgFileRepository::new(pool)
}

/// Name unique to this test run so parallel tests don't see each other's rows.
fn unique(name: &str) -> String {
    format!("{}-{}", uuid::Uuid::new_v4(), name)
}

async fn insert(repo: &PgFileRepository, name: &str, data: &[u8]) -> File {
    let mut file = File::new(FileName::new(name).unwrap(), data.to_vec());
    repo.create(&mut file).await.expect("create failed");
    file
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_assigns_id_and_equal_timestamps() {
    let repo = repository().await;
    let file = insert(&repo, &unique("test.jpg"), b"test data").await;

    assert!(file.is_persisted());
    assert_eq!(file.created_at, file.updated_at);

    let found = repo.find_one(&file.id).await.unwrap().expect("row missing");
    assert_eq!(found.name, file.name);
    assert_eq!(found.data, b"test data".to_vec());
    assert_eq!(found.created_at, file.created_at);
}

#[tokio::test]
#[ignore = "requires database"]
async fn find_one_unknown_id_is_none() {
    let repo = repository().await;
    assert!(repo.find_one("does-not-exist").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires database"]
async fn find_all_includes_inserted_rows_in_order() {
    let repo = repository().await;
    let first = insert(&repo, &unique("test1.jpg"), b"one").await;
    let second = insert(&repo, &unique("test2.jpg"), b"two").await;

    let all = repo.find_all().await.unwrap();
    let first_pos = all.iter().position(|f| f.id == first.id).expect("first missing");
    let second_pos = all.iter().position(|f| f.id == second.id).expect("second missing");
    assert!(first_pos < second_pos);
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_replaces_content_and_keeps_creation_time() {
    let repo = repository().await;
    let mut file = insert(&repo, &unique("before.jpg"), b"old").await;

    file.name = unique("after.jpg");
    file.data = b"new".to_vec();
    let stamps = repo.update(&file).await.unwrap().expect("row missing");

    assert_eq!(stamps.created_at, file.created_at);
    assert!(stamps.updated_at >= stamps.created_at);

    let found = repo.find_one(&file.id).await.unwrap().unwrap();
    assert_eq!(found.name, file.name);
    assert_eq!(found.data, b"new".to_vec());
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_unknown_id_is_none() {
    let repo = repository().await;
    let mut ghost = File::new(FileName::new("ghost.jpg").unwrap(), Vec::new());
    ghost.id = "does-not-exist".into();

    assert!(repo.update(&ghost).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires database"]
async fn delete_removes_row() {
    let repo = repository().await;
    let file = insert(&repo, &unique("doomed.jpg"), b"bye").await;

    assert_eq!(repo.delete(&file.id).await.unwrap(), vec![file.id.clone()]);
    assert!(repo.find_one(&file.id).await.unwrap().is_none());
    assert!(repo.delete(&file.id).await.unwrap().is_empty());
}
