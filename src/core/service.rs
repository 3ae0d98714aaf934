use crate::config::FolderSyncConfig;
use crate::core::item_store::{BackgroundSyncTrigger, SyncedFolderItemStore};
use crate::core::merger::{FolderMergeEngine, MergeSummary};
use crate::core::ordering::DisplayOrdering;
use crate::db::models::{FolderId, SyncedFolder, SyncedFolderDisplayItem};
use crate::db::SyncedFolderStore;
use crate::error::Result;
use crate::media::MediaFolderScanner;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 一次完整加载的结果
#[derive(Debug, Clone)]
pub struct LoadResult {
    pub items: Vec<SyncedFolderDisplayItem>,
    pub summary: MergeSummary,
    /// 因本地目录不存在且未启用而删除的配置数
    pub pruned: usize,
}

/// 同步文件夹列表的入口：读取配置、扫描设备、合并并排序
pub struct FolderSyncService {
    scanner: Arc<dyn MediaFolderScanner>,
    store: Arc<dyn SyncedFolderStore>,
    config: FolderSyncConfig,
    engine: FolderMergeEngine,
    ordering: DisplayOrdering,
    /// 串行化合并，避免重叠的加载交错删除配置
    merge_lock: Mutex<()>,
}

impl FolderSyncService {
    pub fn new(
        scanner: Arc<dyn MediaFolderScanner>,
        store: Arc<dyn SyncedFolderStore>,
        config: FolderSyncConfig,
    ) -> Self {
        let engine = FolderMergeEngine::with_config(config.merge_config());
        let ordering = DisplayOrdering::new(config.prioritized_folders.clone());
        Self {
            scanner,
            store,
            config,
            engine,
            ordering,
            merge_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &FolderSyncConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn SyncedFolderStore> {
        self.store.clone()
    }

    /// 当前账户合并并排序后的条目
    pub async fn merged_sorted_items(&self, account: &str) -> Result<Vec<SyncedFolderDisplayItem>> {
        Ok(self.load(account).await?.items)
    }

    /// 加载列表并交给新的 [`SyncedFolderItemStore`]
    pub async fn open_item_store(
        &self,
        account: &str,
        trigger: Arc<dyn BackgroundSyncTrigger>,
    ) -> Result<SyncedFolderItemStore> {
        let items = self.merged_sorted_items(account).await?;
        Ok(SyncedFolderItemStore::new(items, self.store.clone(), trigger))
    }

    /// 完整加载一次
    pub async fn load(&self, account: &str) -> Result<LoadResult> {
        let _guard = self.merge_lock.lock().await;
        let started = Instant::now();
        info!("开始加载同步文件夹: account={}", account);

        let (synced, media) = tokio::try_join!(
            self.store.get_all(),
            self.scanner.scan(
                self.config.per_folder_item_limit,
                self.config.include_images,
                self.config.include_videos,
            )
        )?;
        debug!("读取到 {} 条配置, {} 个媒体文件夹", synced.len(), media.len());

        let (synced, pruned) = self.prune_stale(account, synced).await;

        let engine = self.engine.clone();
        let ordering = self.ordering.clone();
        let account_owned = account.to_string();

        // 合并过程会直接读取本地目录，放到阻塞线程上
        let (items, summary) = tokio::task::spawn_blocking(move || {
            let (items, summary) = engine.merge_with_summary(&account_owned, synced, media);
            (ordering.sort(items), summary)
        })
        .await?;

        info!(
            "同步文件夹加载完成: {} 项, 耗时 {:?}",
            items.len(),
            started.elapsed()
        );

        Ok(LoadResult {
            items,
            summary,
            pruned,
        })
    }

    /// 删除当前账户下本地目录已不存在且未启用的配置
    ///
    /// 删除失败只记录日志，记录仍参与合并。
    async fn prune_stale(&self, account: &str, synced: Vec<SyncedFolder>) -> (Vec<SyncedFolder>, usize) {
        if !self.config.prune_missing_disabled {
            return (synced, 0);
        }

        let mut kept = Vec::with_capacity(synced.len());
        let mut pruned = 0;

        for folder in synced {
            let stale = folder.account == account
                && !folder.enabled
                && !tokio::fs::try_exists(&folder.local_path).await.unwrap_or(false);

            match (stale, folder.id) {
                (true, FolderId::Persisted(id)) => match self.store.delete(id).await {
                    Ok(()) => {
                        debug!("删除失效的同步配置: {}", folder.local_path);
                        pruned += 1;
                    }
                    Err(e) => {
                        warn!("删除失效配置失败 {}: {}", folder.local_path, e);
                        kept.push(folder);
                    }
                },
                _ => kept.push(folder),
            }
        }

        if pruned > 0 {
            info!("已清理 {} 个失效的同步配置", pruned);
        }
        (kept, pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{MediaFolder, MediaFolderType};
    use crate::error::FolderSyncError;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// 固定返回结果的扫描器
    struct FixedScanner(Vec<MediaFolder>);

    #[async_trait]
    impl MediaFolderScanner for FixedScanner {
        async fn scan(&self, _limit: usize, _images: bool, _videos: bool) -> Result<Vec<MediaFolder>> {
            Ok(self.0.clone())
        }
    }

    /// 内存中的配置存储
    #[derive(Default)]
    struct MemoryStore {
        folders: StdMutex<Vec<SyncedFolder>>,
    }

    #[async_trait]
    impl SyncedFolderStore for MemoryStore {
        async fn get_all(&self) -> Result<Vec<SyncedFolder>> {
            Ok(self.folders.lock().unwrap().clone())
        }

        async fn insert(&self, folder: &SyncedFolder) -> Result<i64> {
            let mut folders = self.folders.lock().unwrap();
            let id = folders.len() as i64 + 100;
            let mut stored = folder.clone();
            stored.id = FolderId::Persisted(id);
            folders.push(stored);
            Ok(id)
        }

        async fn update(&self, folder: &SyncedFolder) -> Result<()> {
            let mut folders = self.folders.lock().unwrap();
            let slot = folders
                .iter_mut()
                .find(|f| f.id == folder.id)
                .ok_or_else(|| FolderSyncError::Persistence("not found".to_string()))?;
            *slot = folder.clone();
            Ok(())
        }

        async fn update_enabled(&self, id: i64, enabled: bool, enabled_timestamp_ms: i64) -> Result<()> {
            let mut folders = self.folders.lock().unwrap();
            let slot = folders
                .iter_mut()
                .find(|f| f.id == FolderId::Persisted(id))
                .ok_or_else(|| FolderSyncError::Persistence("not found".to_string()))?;
            slot.set_enabled(enabled, enabled_timestamp_ms);
            Ok(())
        }

        async fn delete(&self, id: i64) -> Result<()> {
            self.folders
                .lock()
                .unwrap()
                .retain(|f| f.id != FolderId::Persisted(id));
            Ok(())
        }
    }

    fn media(path: &str, name: &str, count: u64) -> MediaFolder {
        MediaFolder {
            absolute_path: path.to_string(),
            folder_name: name.to_string(),
            folder_type: MediaFolderType::Image,
            file_paths: vec![],
            number_of_files: count,
        }
    }

    fn stored(id: i64, path: &str, enabled: bool) -> SyncedFolder {
        let mut folder = SyncedFolder::new(path, "/remote", "alice", MediaFolderType::Image);
        folder.id = FolderId::Persisted(id);
        folder.enabled = enabled;
        folder
    }

    #[tokio::test]
    async fn test_merged_sorted_items() {
        let store = Arc::new(MemoryStore::default());
        store.folders.lock().unwrap().push(stored(5, "/dcim/Camera", true));
        let scanner = Arc::new(FixedScanner(vec![
            media("/dcim/Screenshots", "Screenshots", 3),
            media("/dcim/Camera", "Camera", 42),
        ]));

        let service = FolderSyncService::new(scanner, store, FolderSyncConfig::default());
        let items = service.merged_sorted_items("alice").await.unwrap();

        let names: Vec<_> = items.iter().map(|i| i.folder_name.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["Camera", "Screenshots"]);
        assert_eq!(items[0].id(), FolderId::Persisted(5));
        assert_eq!(items[0].number_of_files, 42);
        assert_eq!(items[1].id(), FolderId::Unpersisted);
    }

    #[tokio::test]
    async fn test_prunes_missing_disabled_folders() {
        let store = Arc::new(MemoryStore::default());
        {
            let mut folders = store.folders.lock().unwrap();
            folders.push(stored(1, "/definitely/gone/Old", false));
            folders.push(stored(2, "/definitely/gone/Kept", true));
        }
        let service = FolderSyncService::new(
            Arc::new(FixedScanner(vec![])),
            store.clone(),
            FolderSyncConfig::default(),
        );

        let result = service.load("alice").await.unwrap();

        assert_eq!(result.pruned, 1);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].id(), FolderId::Persisted(2));
        assert_eq!(store.folders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_then_reload_keeps_state() {
        let store = Arc::new(MemoryStore::default());
        let scanner = Arc::new(FixedScanner(vec![media("/dcim/Camera", "Camera", 4)]));
        let service = FolderSyncService::new(scanner, store, FolderSyncConfig::default());

        let mut items = service
            .open_item_store("alice", Arc::new(crate::core::item_store::LoggingSyncTrigger))
            .await
            .unwrap();
        items.toggle_enabled(0).await.unwrap();
        let id = items.items()[0].id();

        let reloaded = service.merged_sorted_items("alice").await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].id(), id);
        assert!(reloaded[0].is_enabled());
    }

    #[tokio::test]
    async fn test_reload_is_idempotent() {
        let store = Arc::new(MemoryStore::default());
        store.folders.lock().unwrap().push(stored(9, "/dcim/Camera", true));
        let scanner = Arc::new(FixedScanner(vec![
            media("/dcim/Camera", "Camera", 4),
            media("/pics/b", "b", 1),
            media("/pics/A", "A", 1),
        ]));
        let service = FolderSyncService::new(scanner, store, FolderSyncConfig::default());

        let first = service.merged_sorted_items("alice").await.unwrap();
        let second = service.merged_sorted_items("alice").await.unwrap();
        assert_eq!(first, second);
    }
}
