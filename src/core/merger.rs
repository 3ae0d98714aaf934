use crate::core::qualify::{
    is_qualifying_media_folder, is_qualifying_synced_folder, list_folder_files,
};
use crate::db::models::{
    folder_name_of, MediaFolder, MediaFolderType, SyncedFolder, SyncedFolderDisplayItem,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// 合并配置
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// 新发现文件夹的远端根目录
    pub instant_upload_path: String,
    /// 直接列目录时保留的示例文件数
    pub items_per_folder: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            instant_upload_path: "/InstantUpload".to_string(),
            items_per_folder: 8,
        }
    }
}

/// 单次合并的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// 配置与扫描结果都存在
    pub merged: usize,
    /// 只在扫描中出现
    pub detected_only: usize,
    /// 只在配置中出现
    pub configured_only: usize,
    /// 匹配成功但未通过筛选
    pub dropped_matches: usize,
    /// 未通过筛选的新文件夹
    pub dropped_media: usize,
    /// 配置中重复的 (路径, 类型)
    pub duplicate_keys: usize,
}

impl MergeSummary {
    pub fn total_items(&self) -> usize {
        self.merged + self.detected_only + self.configured_only
    }
}

type FolderKey = (String, MediaFolderType);

/// 合并扫描结果与同步配置
#[derive(Debug, Clone, Default)]
pub struct FolderMergeEngine {
    config: MergeConfig,
}

impl FolderMergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// 合并两个来源，返回未排序的展示条目
    pub fn merge(
        &self,
        account: &str,
        synced_folders: Vec<SyncedFolder>,
        media_folders: Vec<MediaFolder>,
    ) -> Vec<SyncedFolderDisplayItem> {
        self.merge_with_summary(account, synced_folders, media_folders)
            .0
    }

    /// 合并并返回统计
    pub fn merge_with_summary(
        &self,
        account: &str,
        synced_folders: Vec<SyncedFolder>,
        media_folders: Vec<MediaFolder>,
    ) -> (Vec<SyncedFolderDisplayItem>, MergeSummary) {
        let mut summary = MergeSummary::default();
        let mut lookup = Self::build_lookup(account, synced_folders, &mut summary);
        let mut result = Vec::with_capacity(media_folders.len() + lookup.len());

        for media in media_folders {
            let key = (media.absolute_path.clone(), media.folder_type);

            match lookup.remove(&key) {
                Some(synced) => {
                    if !is_qualifying_synced_folder(&synced, &media) {
                        debug!("已配置的文件夹未通过筛选: {}", synced.local_path);
                        summary.dropped_matches += 1;
                        continue;
                    }
                    summary.merged += 1;
                    if synced.folder_type == MediaFolderType::Custom {
                        // 自定义文件夹以配置为准，不使用扫描结果
                        result.push(self.item_without_media_folder(synced));
                    } else {
                        result.push(Self::item_with_media_folder(synced, media));
                    }
                }
                None => {
                    if is_qualifying_media_folder(&media) {
                        summary.detected_only += 1;
                        result.push(self.item_from_media_folder(account, media));
                    } else {
                        debug!("忽略不合格的媒体文件夹: {}", media.absolute_path);
                        summary.dropped_media += 1;
                    }
                }
            }
        }

        // 剩余的配置在设备上没有被检测到
        let mut remaining: Vec<SyncedFolder> = lookup.into_values().collect();
        remaining.sort_by(|a, b| {
            a.local_path
                .cmp(&b.local_path)
                .then_with(|| a.folder_type.cmp(&b.folder_type))
        });
        summary.configured_only = remaining.len();
        result.extend(
            remaining
                .into_iter()
                .map(|synced| self.item_without_media_folder(synced)),
        );

        info!(
            "合并完成: {} 个已配置, {} 个新发现, {} 个仅配置, {} 个被过滤",
            summary.merged,
            summary.detected_only,
            summary.configured_only,
            summary.dropped_matches + summary.dropped_media
        );

        (result, summary)
    }

    /// 以 (本地路径, 类型) 为键建立当前账户配置的查找表
    fn build_lookup(
        account: &str,
        synced_folders: Vec<SyncedFolder>,
        summary: &mut MergeSummary,
    ) -> HashMap<FolderKey, SyncedFolder> {
        let mut lookup = HashMap::new();

        for synced in synced_folders.into_iter().filter(|f| f.account == account) {
            let key = (synced.local_path.clone(), synced.folder_type);
            let winner_id = synced.id.as_raw();
            if let Some(previous) = lookup.insert(key, synced) {
                // 持久化层本不应出现重复键，保留后出现的记录
                warn!(
                    "同步配置重复: {} ({:?})，id {} 被 id {} 覆盖",
                    previous.local_path,
                    previous.folder_type,
                    previous.id.as_raw(),
                    winner_id
                );
                summary.duplicate_keys += 1;
            }
        }

        lookup
    }

    /// 配置 + 扫描结果
    fn item_with_media_folder(synced: SyncedFolder, media: MediaFolder) -> SyncedFolderDisplayItem {
        SyncedFolderDisplayItem::new(
            synced,
            media.file_paths,
            Some(media.folder_name),
            media.number_of_files,
        )
    }

    /// 只有配置：直接列出本地目录
    fn item_without_media_folder(&self, synced: SyncedFolder) -> SyncedFolderDisplayItem {
        let listing = list_folder_files(&synced.local_path, self.config.items_per_folder);
        let folder_name = folder_name_of(&synced.local_path);
        SyncedFolderDisplayItem::new(synced, listing.file_paths, folder_name, listing.number_of_files)
    }

    /// 只有扫描结果：生成默认配置
    fn item_from_media_folder(&self, account: &str, media: MediaFolder) -> SyncedFolderDisplayItem {
        let remote_path = format!(
            "{}/{}",
            self.config.instant_upload_path.trim_end_matches('/'),
            media.folder_name
        );
        let folder = SyncedFolder::new(
            media.absolute_path,
            remote_path,
            account,
            media.folder_type,
        );

        SyncedFolderDisplayItem::new(
            folder,
            media.file_paths,
            Some(media.folder_name),
            media.number_of_files,
        )
    }
}
