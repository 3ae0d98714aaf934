use crate::error::FolderSyncError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 未持久化记录在存储边界上使用的原始 id
pub const UNPERSISTED_ID: i64 = -1;

/// 尚未扫描过的时间戳
pub const NOT_SCANNED_YET: i64 = -1;

/// 媒体文件夹类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFolderType {
    /// 用户自定义文件夹，没有媒体分类
    Custom,
    Image,
    Video,
}

impl MediaFolderType {
    pub fn as_i64(self) -> i64 {
        match self {
            MediaFolderType::Custom => 0,
            MediaFolderType::Image => 1,
            MediaFolderType::Video => 2,
        }
    }
}

impl TryFrom<i64> for MediaFolderType {
    type Error = FolderSyncError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MediaFolderType::Custom),
            1 => Ok(MediaFolderType::Image),
            2 => Ok(MediaFolderType::Video),
            _ => Err(FolderSyncError::InvalidRecord(format!(
                "无效的文件夹类型: {}",
                value
            ))),
        }
    }
}

/// 上传完成后对本地文件的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadAction {
    #[default]
    Forget,
    Move,
    Delete,
}

impl UploadAction {
    pub fn as_i64(self) -> i64 {
        match self {
            UploadAction::Forget => 0,
            UploadAction::Move => 1,
            UploadAction::Delete => 2,
        }
    }
}

impl TryFrom<i64> for UploadAction {
    type Error = FolderSyncError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UploadAction::Forget),
            1 => Ok(UploadAction::Move),
            2 => Ok(UploadAction::Delete),
            _ => Err(FolderSyncError::InvalidRecord(format!(
                "无效的上传动作: {}",
                value
            ))),
        }
    }
}

/// 远端同名文件的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCollisionPolicy {
    #[default]
    AskUser,
    Overwrite,
    Rename,
    Cancel,
}

impl NameCollisionPolicy {
    pub fn as_i64(self) -> i64 {
        match self {
            NameCollisionPolicy::AskUser => 0,
            NameCollisionPolicy::Overwrite => 1,
            NameCollisionPolicy::Rename => 2,
            NameCollisionPolicy::Cancel => 3,
        }
    }
}

impl From<i64> for NameCollisionPolicy {
    fn from(value: i64) -> Self {
        // 未知值按默认策略处理，兼容旧数据
        match value {
            1 => NameCollisionPolicy::Overwrite,
            2 => NameCollisionPolicy::Rename,
            3 => NameCollisionPolicy::Cancel,
            _ => NameCollisionPolicy::AskUser,
        }
    }
}

/// 按日期创建子目录的粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubFolderRule {
    #[default]
    YearMonth,
    YearMonthDay,
    Year,
}

impl SubFolderRule {
    pub fn as_i64(self) -> i64 {
        match self {
            SubFolderRule::YearMonth => 0,
            SubFolderRule::YearMonthDay => 1,
            SubFolderRule::Year => 2,
        }
    }
}

impl From<i64> for SubFolderRule {
    fn from(value: i64) -> Self {
        match value {
            1 => SubFolderRule::YearMonthDay,
            2 => SubFolderRule::Year,
            _ => SubFolderRule::YearMonth,
        }
    }
}

/// 同步文件夹记录的 id
///
/// 新发现的文件夹在第一次保存之前没有 id；一旦写入存储就一直保持 `Persisted`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FolderId {
    #[default]
    Unpersisted,
    Persisted(i64),
}

impl FolderId {
    pub fn is_persisted(self) -> bool {
        matches!(self, FolderId::Persisted(_))
    }

    /// 已持久化时返回存储分配的 id
    pub fn persisted(self) -> Option<i64> {
        match self {
            FolderId::Persisted(id) => Some(id),
            FolderId::Unpersisted => None,
        }
    }

    /// 转换为存储边界上的原始值
    pub fn as_raw(self) -> i64 {
        self.persisted().unwrap_or(UNPERSISTED_ID)
    }
}

impl From<i64> for FolderId {
    fn from(raw: i64) -> Self {
        if raw > UNPERSISTED_ID {
            FolderId::Persisted(raw)
        } else {
            FolderId::Unpersisted
        }
    }
}

impl Serialize for FolderId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for FolderId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(FolderId::from)
    }
}

/// 扫描设备存储得到的媒体文件夹
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFolder {
    pub absolute_path: String,
    pub folder_name: String,
    #[serde(rename = "type")]
    pub folder_type: MediaFolderType,
    /// 示例文件路径（最新的在前，数量受扫描上限约束）
    pub file_paths: Vec<String>,
    pub number_of_files: u64,
}

/// 同步文件夹配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedFolder {
    pub id: FolderId,
    pub local_path: String,
    pub remote_path: String,
    pub account: String,
    #[serde(rename = "type")]
    pub folder_type: MediaFolderType,
    pub wifi_only: bool,
    pub charging_only: bool,
    /// 是否同时上传已存在的文件
    pub existing: bool,
    pub subfolder_by_date: bool,
    pub upload_action: UploadAction,
    pub name_collision_policy: NameCollisionPolicy,
    pub enabled: bool,
    /// enabled 最近一次变化的时间（毫秒）
    pub enabled_timestamp_ms: i64,
    pub hidden: bool,
    pub subfolder_rule: SubFolderRule,
    pub exclude_hidden: bool,
    pub last_scan_timestamp_ms: i64,
}

impl SyncedFolder {
    /// 以默认上传策略创建一条新配置
    pub fn new(
        local_path: impl Into<String>,
        remote_path: impl Into<String>,
        account: impl Into<String>,
        folder_type: MediaFolderType,
    ) -> Self {
        Self {
            id: FolderId::Unpersisted,
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            account: account.into(),
            folder_type,
            wifi_only: true,
            charging_only: false,
            existing: true,
            subfolder_by_date: false,
            upload_action: UploadAction::Forget,
            name_collision_policy: NameCollisionPolicy::AskUser,
            enabled: false,
            enabled_timestamp_ms: 0,
            hidden: false,
            subfolder_rule: SubFolderRule::YearMonth,
            exclude_hidden: false,
            last_scan_timestamp_ms: NOT_SCANNED_YET,
        }
    }

    /// 修改 enabled 并记录时间
    pub fn set_enabled(&mut self, enabled: bool, now_ms: i64) {
        self.enabled = enabled;
        self.enabled_timestamp_ms = now_ms;
    }

    /// 匹配用的自然键
    pub fn key(&self) -> (&str, MediaFolderType) {
        (self.local_path.as_str(), self.folder_type)
    }
}

/// 合并后供展示的条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedFolderDisplayItem {
    #[serde(flatten)]
    pub folder: SyncedFolder,
    pub file_paths: Vec<String>,
    pub folder_name: Option<String>,
    pub number_of_files: u64,
}

impl SyncedFolderDisplayItem {
    pub fn new(
        folder: SyncedFolder,
        file_paths: Vec<String>,
        folder_name: Option<String>,
        number_of_files: u64,
    ) -> Self {
        Self {
            folder,
            file_paths,
            folder_name,
            number_of_files,
        }
    }

    pub fn id(&self) -> FolderId {
        self.folder.id
    }

    pub fn is_enabled(&self) -> bool {
        self.folder.enabled
    }

    pub fn is_hidden(&self) -> bool {
        self.folder.hidden
    }

    pub fn key(&self) -> (&str, MediaFolderType) {
        self.folder.key()
    }
}

/// 设置对话框可修改的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSettings {
    pub local_path: String,
    pub remote_path: String,
    pub wifi_only: bool,
    pub charging_only: bool,
    pub existing: bool,
    pub subfolder_by_date: bool,
    pub upload_action: UploadAction,
    pub name_collision_policy: NameCollisionPolicy,
    pub enabled: bool,
    pub hidden: bool,
    pub subfolder_rule: SubFolderRule,
    pub exclude_hidden: bool,
}

impl FolderSettings {
    /// 从现有配置取出可编辑字段
    pub fn from_folder(folder: &SyncedFolder) -> Self {
        Self {
            local_path: folder.local_path.clone(),
            remote_path: folder.remote_path.clone(),
            wifi_only: folder.wifi_only,
            charging_only: folder.charging_only,
            existing: folder.existing,
            subfolder_by_date: folder.subfolder_by_date,
            upload_action: folder.upload_action,
            name_collision_policy: folder.name_collision_policy,
            enabled: folder.enabled,
            hidden: folder.hidden,
            subfolder_rule: folder.subfolder_rule,
            exclude_hidden: folder.exclude_hidden,
        }
    }

    /// 覆盖到配置上；enabled 变化时刷新时间戳
    pub fn apply_to(self, folder: &mut SyncedFolder, now_ms: i64) {
        if folder.enabled != self.enabled {
            folder.set_enabled(self.enabled, now_ms);
        }
        folder.local_path = self.local_path;
        folder.remote_path = self.remote_path;
        folder.wifi_only = self.wifi_only;
        folder.charging_only = self.charging_only;
        folder.existing = self.existing;
        folder.subfolder_by_date = self.subfolder_by_date;
        folder.upload_action = self.upload_action;
        folder.name_collision_policy = self.name_collision_policy;
        folder.hidden = self.hidden;
        folder.subfolder_rule = self.subfolder_rule;
        folder.exclude_hidden = self.exclude_hidden;
    }
}

/// 路径最后一段作为展示名
pub fn folder_name_of(path: &str) -> Option<String> {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}

// 数据库表模型
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncedFolderRow {
    pub id: i64,
    pub local_path: String,
    pub remote_path: String,
    pub account: String,
    pub folder_type: i64,
    pub wifi_only: bool,
    pub charging_only: bool,
    pub existing: bool,
    pub subfolder_by_date: bool,
    pub upload_action: i64,
    pub name_collision_policy: i64,
    pub enabled: bool,
    pub enabled_timestamp_ms: i64,
    pub hidden: bool,
    pub subfolder_rule: i64,
    pub exclude_hidden: bool,
    pub last_scan_timestamp_ms: i64,
}

impl TryFrom<SyncedFolderRow> for SyncedFolder {
    type Error = FolderSyncError;

    fn try_from(row: SyncedFolderRow) -> Result<Self, Self::Error> {
        Ok(SyncedFolder {
            id: FolderId::from(row.id),
            local_path: row.local_path,
            remote_path: row.remote_path,
            account: row.account,
            folder_type: MediaFolderType::try_from(row.folder_type)?,
            wifi_only: row.wifi_only,
            charging_only: row.charging_only,
            existing: row.existing,
            subfolder_by_date: row.subfolder_by_date,
            upload_action: UploadAction::try_from(row.upload_action)?,
            name_collision_policy: NameCollisionPolicy::from(row.name_collision_policy),
            enabled: row.enabled,
            enabled_timestamp_ms: row.enabled_timestamp_ms,
            hidden: row.hidden,
            subfolder_rule: SubFolderRule::from(row.subfolder_rule),
            exclude_hidden: row.exclude_hidden,
            last_scan_timestamp_ms: row.last_scan_timestamp_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_id_sentinel() {
        assert_eq!(FolderId::from(UNPERSISTED_ID), FolderId::Unpersisted);
        assert_eq!(FolderId::from(0), FolderId::Persisted(0));
        assert_eq!(FolderId::Unpersisted.as_raw(), UNPERSISTED_ID);
        assert_eq!(FolderId::Persisted(12).persisted(), Some(12));
    }

    #[test]
    fn test_display_item_serializes_flat() {
        let folder = SyncedFolder::new("/dcim/Camera", "/InstantUpload/Camera", "alice", MediaFolderType::Image);
        let item = SyncedFolderDisplayItem::new(folder, vec![], Some("Camera".to_string()), 3);

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["id"], -1);
        assert_eq!(value["localPath"], "/dcim/Camera");
        assert_eq!(value["type"], "image");
        assert_eq!(value["numberOfFiles"], 3);
    }

    #[test]
    fn test_settings_apply_stamps_enabled_change() {
        let mut folder = SyncedFolder::new("/a", "/r/a", "alice", MediaFolderType::Custom);
        let mut settings = FolderSettings::from_folder(&folder);
        settings.enabled = true;
        settings.remote_path = "/r/b".to_string();

        settings.apply_to(&mut folder, 1_000);
        assert!(folder.enabled);
        assert_eq!(folder.enabled_timestamp_ms, 1_000);
        assert_eq!(folder.remote_path, "/r/b");

        // enabled 未变化时不刷新时间戳
        FolderSettings::from_folder(&folder).apply_to(&mut folder, 2_000);
        assert_eq!(folder.enabled_timestamp_ms, 1_000);
    }
}
