//! 데이터베이스 마이그레이션.

use anyhow::{Context, Result};
use freelance_core::{DatabaseConfig, PgStore};

/// 연결 후 `migrations/` 디렉토리의 마이그레이션을 적용합니다.
pub async fn run(database: &DatabaseConfig) -> Result<()> {
    let store = PgStore::connect(database)
        .await
        .context("failed to connect to PostgreSQL")?;
    store.migrate().await.context("migration failed")?;
    Ok(())
}
