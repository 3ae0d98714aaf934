use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod logging;
pub mod media;

pub use config::FolderSyncConfig;
pub use core::{
    BackgroundSyncTrigger, DisplayOrdering, EmptyState, FolderMergeEngine, FolderSyncService,
    LoggingSyncTrigger, SyncedFolderItemStore,
};
pub use db::models::{
    FolderId, FolderSettings, MediaFolder, MediaFolderType, SyncedFolder, SyncedFolderDisplayItem,
};
pub use db::{SqliteSyncedFolderStore, SyncedFolderStore};
pub use error::{FolderSyncError, Result};
pub use media::{LocalMediaScanner, MediaFolderScanner};

const DB_FILE_NAME: &str = "foldersync.db";

/// 进程内共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub config_dir: PathBuf,
}

impl AppState {
    /// 打开数据目录并初始化数据库
    ///
    /// 未指定 `data_dir` 时使用默认配置目录，若其中的 config.json 指定了
    /// 有效的 `data_path` 则改用该目录。
    pub async fn new(data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_dir = match data_dir {
            Some(dir) => dir,
            None => Self::resolve_config_dir()?,
        };

        std::fs::create_dir_all(&config_dir)?;

        let db_path = config_dir.join(DB_FILE_NAME);
        // Windows 路径需要转换反斜杠为正斜杠
        let db_path_str = db_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid database path"))?
            .replace('\\', "/");

        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(&format!("sqlite:{}?mode=rwc", db_path_str))
            .await?;

        let db = Arc::new(db);
        SqliteSyncedFolderStore::new(db.clone()).migrate().await?;

        Ok(Self { db, config_dir })
    }

    fn resolve_config_dir() -> anyhow::Result<PathBuf> {
        let default_config_dir = dirs::config_dir()
            .map(|p| p.join("foldersync"))
            .unwrap_or_else(|| PathBuf::from(".foldersync"));

        std::fs::create_dir_all(&default_config_dir)?;

        Ok(config::read_section::<String>(&default_config_dir, "data_path")
            .map(PathBuf::from)
            .filter(|p| p.is_dir())
            .inspect(|p| tracing::debug!("使用自定义数据路径: {:?}", p))
            .unwrap_or(default_config_dir))
    }

    pub fn folder_sync_config(&self) -> FolderSyncConfig {
        FolderSyncConfig::load(&self.config_dir)
    }

    pub fn store(&self) -> Arc<dyn SyncedFolderStore> {
        Arc::new(SqliteSyncedFolderStore::new(self.db.clone()))
    }

    /// 按当前配置构造同步文件夹服务
    pub fn folder_sync_service(&self) -> FolderSyncService {
        let config = self.folder_sync_config();
        let scanner = LocalMediaScanner::with_excludes(
            config.scan_roots.clone(),
            config.exclude_patterns.clone(),
        );
        FolderSyncService::new(Arc::new(scanner), self.store(), config)
    }

    /// 关闭数据库连接池
    pub async fn cleanup(&self) {
        tracing::debug!("关闭数据库连接池...");
        self.db.close().await;
    }
}

pub mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".config"))
                })
        }
    }
}
