//! 错误类型

use thiserror::Error;

/// 文件夹同步核心的错误
#[derive(Debug, Error)]
pub enum FolderSyncError {
    /// 列表索引越界
    #[error("索引越界: {index} (共 {len} 项)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库迁移失败: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// 列表中已存在相同 (路径, 类型) 的文件夹
    #[error("文件夹已存在: {0}")]
    DuplicateFolder(String),

    /// 存储实现返回的其他持久化失败
    #[error("持久化失败: {0}")]
    Persistence(String),

    /// 数据库中的记录无法解析
    #[error("无效的记录: {0}")]
    InvalidRecord(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("后台任务失败: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, FolderSyncError>;
