use canteen_engine::{
    db_types::ScopeKey,
    helpers::{date_key, OperatingTimeZone},
    SqliteDatabase,
};
use log::*;
use tempfile::TempDir;

/// A fresh, migrated database in its own temporary directory. The directory is removed when this is dropped.
pub struct TestEnv {
    pub db: SqliteDatabase,
    _dir: TempDir,
}

pub async fn prepare_test_env() -> TestEnv {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().expect("Error creating temporary directory");
    let url = format!("sqlite://{}", dir.path().join("canteen_test.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating test database");
    info!("🚀️ Test database ready at {url}");
    TestEnv { db, _dir: dir }
}

/// Today's scope for a canteen, as the commit API computes it.
pub fn today(canteen_id: &str) -> ScopeKey {
    ScopeKey::new(canteen_id, date_key(OperatingTimeZone::default()))
}
