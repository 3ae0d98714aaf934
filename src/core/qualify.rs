//! 文件夹筛选规则
//!
//! 决定一个媒体文件夹（或与之匹配的同步配置）是否值得展示给用户：
//! 缩略图缓存目录、只有封面图的目录、空目录都会被过滤掉。

use crate::db::models::{MediaFolder, MediaFolderType, SyncedFolder};
use std::path::Path;

/// 缩略图缓存目录前缀
const THUMBNAIL_FOLDER_PREFIX: &str = ".thumbnail";
/// 缩略图数据文件前缀
const THUMBNAIL_DATA_FILE_PREFIX: &str = ".thumbdata";
/// 不参与媒体检测的文件名（小写）
const DISQUALIFIED_FILE_NAMES: &[&str] = &["cover.jpg", "cover.jpeg", "folder.jpg", "folder.jpeg"];

/// 直接列出的文件夹内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    /// 前 N 个文件路径（最新的在前）
    pub file_paths: Vec<String>,
    /// 文件总数
    pub number_of_files: u64,
}

/// 路径是否有效：非空且不位于缩略图目录中
pub fn is_qualified_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    !Path::new(path).components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| s.starts_with(THUMBNAIL_FOLDER_PREFIX))
            .unwrap_or(false)
    })
}

/// 文件名是否可以作为媒体内容的证据
pub fn is_qualified_file_name(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    !DISQUALIFIED_FILE_NAMES.contains(&lower.as_str())
        && !lower.starts_with(THUMBNAIL_DATA_FILE_PREFIX)
}

/// 示例文件中至少有一个合格文件；没有示例时只看数量
fn has_qualified_samples(number_of_files: u64, file_paths: &[String]) -> bool {
    if number_of_files < 1 {
        return false;
    }
    if file_paths.is_empty() {
        return true;
    }
    file_paths.iter().any(|p| {
        Path::new(p)
            .file_name()
            .and_then(|n| n.to_str())
            .map(is_qualified_file_name)
            .unwrap_or(false)
    })
}

/// 扫描得到的媒体文件夹是否应该展示
pub fn is_qualifying_media_folder(folder: &MediaFolder) -> bool {
    if folder.folder_type == MediaFolderType::Custom {
        return true;
    }
    is_qualified_path(&folder.absolute_path)
        && has_qualified_samples(folder.number_of_files, &folder.file_paths)
}

/// 已匹配到媒体文件夹的同步配置是否应该展示
///
/// 自定义文件夹总是合格；其他类型使用配置的本地路径和匹配到的扫描结果判断。
pub fn is_qualifying_synced_folder(synced: &SyncedFolder, matched: &MediaFolder) -> bool {
    if synced.folder_type == MediaFolderType::Custom {
        return true;
    }
    is_qualified_path(&synced.local_path)
        && has_qualified_samples(matched.number_of_files, &matched.file_paths)
}

/// 直接列出目录中的文件（不递归，最新的在前）
///
/// 目录不存在或无法读取时返回空结果。
pub fn list_folder_files(local_path: &str, limit: usize) -> FolderListing {
    let entries = match std::fs::read_dir(local_path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("无法读取目录 {}: {}", local_path, e);
            return FolderListing::default();
        }
    };

    let mut files: Vec<(i64, String)> = entries
        .flatten()
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let modified = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0);
            Some((modified, entry.path().to_string_lossy().replace('\\', "/")))
        })
        .collect();

    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    FolderListing {
        number_of_files: files.len() as u64,
        file_paths: files.into_iter().take(limit).map(|(_, p)| p).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(path: &str, count: u64, samples: &[&str]) -> MediaFolder {
        MediaFolder {
            absolute_path: path.to_string(),
            folder_name: folder_name(path),
            folder_type: MediaFolderType::Image,
            file_paths: samples.iter().map(|s| s.to_string()).collect(),
            number_of_files: count,
        }
    }

    fn folder_name(path: &str) -> String {
        path.rsplit('/').next().unwrap_or_default().to_string()
    }

    #[test]
    fn test_thumbnail_paths_are_rejected() {
        assert!(is_qualified_path("/sdcard/DCIM/Camera"));
        assert!(!is_qualified_path("/sdcard/DCIM/.thumbnails"));
        assert!(!is_qualified_path("/sdcard/DCIM/.thumbnails/sub"));
        assert!(!is_qualified_path(""));
    }

    #[test]
    fn test_media_folder_needs_files() {
        assert!(is_qualifying_media_folder(&media("/dcim/Camera", 42, &[])));
        assert!(!is_qualifying_media_folder(&media("/dcim/Empty", 0, &[])));
    }

    #[test]
    fn test_cover_only_folder_is_rejected() {
        let covers = media("/music/Album", 1, &["/music/Album/cover.jpg"]);
        assert!(!is_qualifying_media_folder(&covers));

        let mixed = media("/music/Album", 2, &["/music/Album/Folder.JPG", "/music/Album/photo.jpg"]);
        assert!(is_qualifying_media_folder(&mixed));

        let thumbdata = media("/dcim/x", 1, &["/dcim/x/.thumbdata3"]);
        assert!(!is_qualifying_media_folder(&thumbdata));
    }

    #[test]
    fn test_custom_synced_folder_always_qualifies() {
        let synced = SyncedFolder::new("/.thumbnails", "/r", "alice", MediaFolderType::Custom);
        assert!(is_qualifying_synced_folder(&synced, &media("/.thumbnails", 0, &[])));

        let image = SyncedFolder::new("/.thumbnails", "/r", "alice", MediaFolderType::Image);
        assert!(!is_qualifying_synced_folder(&image, &media("/.thumbnails", 5, &[])));
    }

    #[test]
    fn test_list_folder_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("c.txt"), b"c").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let listing = list_folder_files(dir.path().to_str().unwrap(), 2);
        assert_eq!(listing.number_of_files, 3);
        assert_eq!(listing.file_paths.len(), 2);
    }

    #[test]
    fn test_list_missing_folder_is_empty() {
        let listing = list_folder_files("/definitely/not/here", 8);
        assert_eq!(listing, FolderListing::default());
    }
}
