pub mod models;
pub use models::*;

use crate::error::{FolderSyncError, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteQueryResult;
pub use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// 同步文件夹配置的存储接口
#[async_trait]
pub trait SyncedFolderStore: Send + Sync {
    /// 读取所有账户的全部配置
    async fn get_all(&self) -> Result<Vec<SyncedFolder>>;

    /// 插入新配置，返回分配的 id
    async fn insert(&self, folder: &SyncedFolder) -> Result<i64>;

    /// 按 id 更新整条配置
    async fn update(&self, folder: &SyncedFolder) -> Result<()>;

    /// 只更新 enabled 标志
    /// 只更新 enabled 标志及其时间戳
    async fn update_enabled(&self, id: i64, enabled: bool, enabled_timestamp_ms: i64) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// 基于 SQLite 的配置存储
#[derive(Debug, Clone)]
pub struct SqliteSyncedFolderStore {
    db: Arc<SqlitePool>,
}

impl SqliteSyncedFolderStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// 按 id 修改的语句必须命中一行，否则记录已被删除
    fn expect_row(result: SqliteQueryResult, id: i64) -> Result<()> {
        if result.rows_affected() == 0 {
            return Err(FolderSyncError::Persistence(format!("同步配置不存在: id={}", id)));
        }
        Ok(())
    }

    /// 运行数据库迁移
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&*self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl SyncedFolderStore for SqliteSyncedFolderStore {
    async fn get_all(&self) -> Result<Vec<SyncedFolder>> {
        let rows = sqlx::query_as::<_, SyncedFolderRow>("SELECT * FROM synced_folders ORDER BY id")
            .fetch_all(&*self.db)
            .await?;

        let mut folders = Vec::with_capacity(rows.len());
        for row in rows {
            folders.push(row.try_into()?);
        }
        Ok(folders)
    }

    async fn insert(&self, folder: &SyncedFolder) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO synced_folders (local_path, remote_path, account, folder_type, wifi_only, charging_only, existing,
                subfolder_by_date, upload_action, name_collision_policy, enabled, enabled_timestamp_ms, hidden,
                subfolder_rule, exclude_hidden, last_scan_timestamp_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&folder.local_path)
        .bind(&folder.remote_path)
        .bind(&folder.account)
        .bind(folder.folder_type.as_i64())
        .bind(folder.wifi_only)
        .bind(folder.charging_only)
        .bind(folder.existing)
        .bind(folder.subfolder_by_date)
        .bind(folder.upload_action.as_i64())
        .bind(folder.name_collision_policy.as_i64())
        .bind(folder.enabled)
        .bind(folder.enabled_timestamp_ms)
        .bind(folder.hidden)
        .bind(folder.subfolder_rule.as_i64())
        .bind(folder.exclude_hidden)
        .bind(folder.last_scan_timestamp_ms)
        .execute(&*self.db)
        .await?;

        let id = result.last_insert_rowid();
        debug!("已保存同步文件夹: {} (id={})", folder.local_path, id);
        Ok(id)
    }

    async fn update(&self, folder: &SyncedFolder) -> Result<()> {
        let id = folder.id.persisted().ok_or_else(|| {
            FolderSyncError::Persistence(format!("未持久化的文件夹无法更新: {}", folder.local_path))
        })?;

        let result = sqlx::query(
            r#"
            UPDATE synced_folders SET
                local_path = ?, remote_path = ?, account = ?, folder_type = ?, wifi_only = ?, charging_only = ?,
                existing = ?, subfolder_by_date = ?, upload_action = ?, name_collision_policy = ?, enabled = ?,
                enabled_timestamp_ms = ?, hidden = ?, subfolder_rule = ?, exclude_hidden = ?, last_scan_timestamp_ms = ?
            WHERE id = ?
            "#,
        )
        .bind(&folder.local_path)
        .bind(&folder.remote_path)
        .bind(&folder.account)
        .bind(folder.folder_type.as_i64())
        .bind(folder.wifi_only)
        .bind(folder.charging_only)
        .bind(folder.existing)
        .bind(folder.subfolder_by_date)
        .bind(folder.upload_action.as_i64())
        .bind(folder.name_collision_policy.as_i64())
        .bind(folder.enabled)
        .bind(folder.enabled_timestamp_ms)
        .bind(folder.hidden)
        .bind(folder.subfolder_rule.as_i64())
        .bind(folder.exclude_hidden)
        .bind(folder.last_scan_timestamp_ms)
        .bind(id)
        .execute(&*self.db)
        .await?;

        Self::expect_row(result, id)
    }

    async fn update_enabled(&self, id: i64, enabled: bool, enabled_timestamp_ms: i64) -> Result<()> {
        let result =
            sqlx::query("UPDATE synced_folders SET enabled = ?, enabled_timestamp_ms = ? WHERE id = ?")
                .bind(enabled)
                .bind(enabled_timestamp_ms)
                .bind(id)
                .execute(&*self.db)
                .await?;
        Self::expect_row(result, id)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM synced_folders WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        Self::expect_row(result, id)
    }
}
