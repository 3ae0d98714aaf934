//! 应用配置模块
//!
//! 所有配置保存在数据目录下的 `config.json`，每个模块占用其中一个键。

use crate::core::merger::MergeConfig;
use crate::core::ordering::DEFAULT_PRIORITIZED_FOLDERS;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// 读取 config.json 中的某个键，缺失或损坏时返回 None
pub fn read_section<T: DeserializeOwned>(config_dir: &Path, key: &str) -> Option<T> {
    let content = fs::read_to_string(config_dir.join(CONFIG_FILE_NAME)).ok()?;
    let config = serde_json::from_str::<serde_json::Value>(&content).ok()?;
    serde_json::from_value(config.get(key)?.clone()).ok()
}

/// 写入 config.json 中的某个键，保留其他键
pub fn write_section<T: Serialize>(config_dir: &Path, key: &str, value: &T) -> io::Result<()> {
    let config_file = config_dir.join(CONFIG_FILE_NAME);

    // 读取现有配置
    let mut config: serde_json::Value = if config_file.exists() {
        let content = fs::read_to_string(&config_file)?;
        serde_json::from_str(&content).unwrap_or_else(|_| serde_json::json!({}))
    } else {
        serde_json::json!({})
    };
    if !config.is_object() {
        config = serde_json::json!({});
    }

    config[key] = serde_json::to_value(value).map_err(io::Error::other)?;

    let content = serde_json::to_string_pretty(&config).map_err(io::Error::other)?;
    fs::write(&config_file, content)
}

/// 同步文件夹配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSyncConfig {
    /// 扫描时每个文件夹保留的示例文件数
    #[serde(default = "default_items_per_folder")]
    pub per_folder_item_limit: usize,
    /// 直接列目录时保留的示例文件数
    #[serde(default = "default_items_per_folder")]
    pub items_per_folder: usize,
    #[serde(default = "default_true")]
    pub include_images: bool,
    #[serde(default = "default_true")]
    pub include_videos: bool,
    /// 新发现文件夹的远端根目录
    #[serde(default = "default_instant_upload_path")]
    pub instant_upload_path: String,
    #[serde(default = "default_prioritized_folders")]
    pub prioritized_folders: Vec<String>,
    /// 媒体扫描的根目录
    #[serde(default)]
    pub scan_roots: Vec<PathBuf>,
    /// 加载时删除本地已不存在且未启用的配置
    #[serde(default = "default_true")]
    pub prune_missing_disabled: bool,
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

fn default_items_per_folder() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_instant_upload_path() -> String {
    "/InstantUpload".to_string()
}

fn default_prioritized_folders() -> Vec<String> {
    DEFAULT_PRIORITIZED_FOLDERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_exclude_patterns() -> Vec<String> {
    vec![".thumbnails/**".to_string(), ".trash*".to_string()]
}

impl Default for FolderSyncConfig {
    fn default() -> Self {
        Self {
            per_folder_item_limit: default_items_per_folder(),
            items_per_folder: default_items_per_folder(),
            include_images: true,
            include_videos: true,
            instant_upload_path: default_instant_upload_path(),
            prioritized_folders: default_prioritized_folders(),
            scan_roots: Vec::new(),
            prune_missing_disabled: true,
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

impl FolderSyncConfig {
    const KEY: &'static str = "folderSync";

    /// 从配置文件加载
    pub fn load(config_dir: &Path) -> Self {
        read_section(config_dir, Self::KEY).unwrap_or_default()
    }

    pub fn save(&self, config_dir: &Path) -> io::Result<()> {
        write_section(config_dir, Self::KEY, self)
    }

    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            instant_upload_path: self.instant_upload_path.clone(),
            items_per_folder: self.items_per_folder,
        }
    }
}
