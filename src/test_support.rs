//! 测试辅助：内存 SQLite + 迁移

use crate::entities::shop_owner_entity as owners;
use crate::models::TenantContext;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

pub async fn setup_db() -> DatabaseConnection {
    // 内存库每个连接各自独立，只保留一个连接
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn seed_owner(db: &DatabaseConnection, username: &str) -> TenantContext {
    owners::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        shop_name: Set(format!("{username} 美甲")),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
    TenantContext::new(username, format!("{username} 美甲"))
}
