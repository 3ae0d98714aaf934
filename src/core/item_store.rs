//! 当前展示列表及其修改
//!
//! 所有修改先作用在副本上并写入存储，写入成功后才替换列表中的条目，
//! 因此持久化失败时列表保持不变。

use crate::db::models::{
    folder_name_of, FolderId, FolderSettings, MediaFolderType, SyncedFolderDisplayItem,
};
use crate::db::SyncedFolderStore;
use crate::error::{FolderSyncError, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// 后台上传任务的触发接口（只发信号，不关心结果）
pub trait BackgroundSyncTrigger: Send + Sync {
    fn start_immediate(&self, skip_if_running: bool, force_overwrite: bool);
}

/// 只记录日志的触发器
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSyncTrigger;

impl BackgroundSyncTrigger for LoggingSyncTrigger {
    fn start_immediate(&self, skip_if_running: bool, force_overwrite: bool) {
        info!(
            "请求立即同步 (skip_if_running={}, force_overwrite={})",
            skip_if_running, force_overwrite
        );
    }
}

/// 列表为空时的展示状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// 有可见条目
    NotEmpty,
    /// 所有条目都被隐藏
    AllHidden,
    /// 没有任何文件夹
    NoFolders,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 同步文件夹列表
pub struct SyncedFolderItemStore {
    items: Vec<SyncedFolderDisplayItem>,
    store: Arc<dyn SyncedFolderStore>,
    trigger: Arc<dyn BackgroundSyncTrigger>,
    /// 是否隐藏 hidden 条目
    hide_items: bool,
}

impl std::fmt::Debug for SyncedFolderItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncedFolderItemStore")
            .field("items", &self.items.len())
            .field("hide_items", &self.hide_items)
            .finish()
    }
}

impl SyncedFolderItemStore {
    pub fn new(
        items: Vec<SyncedFolderDisplayItem>,
        store: Arc<dyn SyncedFolderStore>,
        trigger: Arc<dyn BackgroundSyncTrigger>,
    ) -> Self {
        Self {
            items,
            store,
            trigger,
            hide_items: true,
        }
    }

    pub fn items(&self) -> &[SyncedFolderDisplayItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<SyncedFolderDisplayItem> {
        self.items
    }

    pub fn get(&self, index: usize) -> Option<&SyncedFolderDisplayItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn hidden_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_hidden()).count()
    }

    pub fn shows_hidden(&self) -> bool {
        !self.hide_items
    }

    pub fn set_show_hidden(&mut self, show: bool) {
        self.hide_items = !show;
    }

    pub fn toggle_hidden_items_visibility(&mut self) {
        self.hide_items = !self.hide_items;
    }

    /// 当前应展示的条目（附带在完整列表中的索引）
    pub fn visible_items(&self) -> Vec<(usize, &SyncedFolderDisplayItem)> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| !self.hide_items || !item.is_hidden())
            .collect()
    }

    pub fn empty_state(&self) -> EmptyState {
        if self.items.is_empty() {
            EmptyState::NoFolders
        } else if self.visible_items().is_empty() {
            EmptyState::AllHidden
        } else {
            EmptyState::NotEmpty
        }
    }

    /// 按 (本地路径, 类型) 查找条目
    pub fn index_of(&self, local_path: &str, folder_type: MediaFolderType) -> Option<usize> {
        self.items
            .iter()
            .position(|i| i.key() == (local_path, folder_type))
    }

    fn item_at(&self, index: usize) -> Result<&SyncedFolderDisplayItem> {
        self.items.get(index).ok_or(FolderSyncError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// 未持久化则插入并采用新 id，否则整条更新
    async fn save_or_update(&self, item: &mut SyncedFolderDisplayItem) -> Result<()> {
        match item.folder.id {
            FolderId::Persisted(_) => self.store.update(&item.folder).await,
            FolderId::Unpersisted => {
                let id = self.store.insert(&item.folder).await?;
                item.folder.id = Self::adopt_id(id)?;
                debug!("新同步文件夹已保存: {} (id={})", item.folder.local_path, id);
                Ok(())
            }
        }
    }

    fn adopt_id(id: i64) -> Result<FolderId> {
        match FolderId::from(id) {
            FolderId::Unpersisted => Err(FolderSyncError::Persistence(format!(
                "存储返回了无效的 id: {}",
                id
            ))),
            persisted => Ok(persisted),
        }
    }

    fn commit(&mut self, index: usize, item: SyncedFolderDisplayItem) -> &SyncedFolderDisplayItem {
        if item.is_enabled() {
            self.trigger.start_immediate(false, false);
        }
        self.items[index] = item;
        &self.items[index]
    }

    /// 切换同步开关
    pub async fn toggle_enabled(&mut self, index: usize) -> Result<&SyncedFolderDisplayItem> {
        let mut item = self.item_at(index)?.clone();
        let enabled = !item.is_enabled();
        item.folder.set_enabled(enabled, now_ms());

        match item.folder.id {
            FolderId::Persisted(id) => {
                self.store
                    .update_enabled(id, enabled, item.folder.enabled_timestamp_ms)
                    .await?
            }
            FolderId::Unpersisted => {
                let id = self.store.insert(&item.folder).await?;
                item.folder.id = Self::adopt_id(id)?;
            }
        }

        info!(
            "同步文件夹 {} 已{}",
            item.folder.local_path,
            if enabled { "启用" } else { "停用" }
        );
        Ok(self.commit(index, item))
    }

    /// 切换隐藏状态
    pub async fn toggle_hidden(&mut self, index: usize) -> Result<&SyncedFolderDisplayItem> {
        let mut item = self.item_at(index)?.clone();
        item.folder.hidden = !item.folder.hidden;
        self.save_or_update(&mut item).await?;
        Ok(self.commit(index, item))
    }

    /// 应用设置对话框的结果
    pub async fn apply_settings(
        &mut self,
        index: usize,
        settings: FolderSettings,
    ) -> Result<&SyncedFolderDisplayItem> {
        let mut item = self.item_at(index)?.clone();
        settings.apply_to(&mut item.folder, now_ms());
        let (local_path, folder_type) = item.key();
        if self
            .items
            .iter()
            .enumerate()
            .any(|(i, other)| i != index && other.key() == (local_path, folder_type))
        {
            return Err(FolderSyncError::DuplicateFolder(item.folder.local_path));
        }
        if item.folder.folder_type == MediaFolderType::Custom {
            item.folder_name = folder_name_of(&item.folder.local_path);
        }
        self.save_or_update(&mut item).await?;
        Ok(self.commit(index, item))
    }

    /// 删除配置并移出列表
    pub async fn remove(&mut self, index: usize) -> Result<SyncedFolderDisplayItem> {
        let id = self.item_at(index)?.id();
        if let FolderId::Persisted(id) = id {
            self.store.delete(id).await?;
        }
        let removed = self.items.remove(index);
        info!("已删除同步文件夹: {}", removed.folder.local_path);
        Ok(removed)
    }

    /// 新建的自定义文件夹直接追加到列表，不等下一次合并
    pub async fn add_custom_folder(&mut self, mut item: SyncedFolderDisplayItem) -> Result<usize> {
        if self.index_of(&item.folder.local_path, item.folder.folder_type).is_some() {
            return Err(FolderSyncError::DuplicateFolder(item.folder.local_path));
        }
        if item.folder_name.is_none() {
            item.folder_name = folder_name_of(&item.folder.local_path);
        }

        self.save_or_update(&mut item).await?;
        if item.is_enabled() {
            self.trigger.start_immediate(false, false);
        }
        self.items.push(item);
        Ok(self.items.len() - 1)
    }
}
