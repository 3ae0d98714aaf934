use super::{classify_extension, MediaFolder, MediaFolderScanner, MediaFolderType};
use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// 基于本地文件系统的媒体文件夹扫描器
#[derive(Debug, Clone)]
pub struct LocalMediaScanner {
    roots: Vec<PathBuf>,
    /// 排除规则（相对于扫描根目录的 glob，预先编译）
    exclude_rules: Vec<Regex>,
}

/// 扫描过程中收集的单个目录
#[derive(Default)]
struct FolderAccumulator {
    files: Vec<(i64, String)>,
}

impl LocalMediaScanner {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            exclude_rules: Vec::new(),
        }
    }

    pub fn with_excludes(roots: Vec<PathBuf>, exclude_patterns: Vec<String>) -> Self {
        let exclude_rules = exclude_patterns
            .iter()
            .filter_map(|pattern| match Self::compile_pattern(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("无效的排除规则 {}: {}", pattern, e);
                    None
                }
            })
            .collect();

        Self {
            roots,
            exclude_rules,
        }
    }

    /// 规范化路径分隔符（统一使用 /）
    fn normalize_path(path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }

    fn should_exclude(rules: &[Regex], relative_path: &str) -> bool {
        rules.iter().any(|re| re.is_match(relative_path))
    }

    /// 把 glob 编译为按整段匹配的正则
    ///
    /// `*` 匹配段内任意字符，`**` 匹配任意层目录；规则可以从路径的任意一段开始匹配。
    fn compile_pattern(pattern: &str) -> std::result::Result<Regex, regex::Error> {
        let segments: Vec<&str> = pattern.trim_matches('/').split('/').collect();
        let mut re = String::from("(?i)(?:^|/)");
        let mut after_globstar = false;

        for (i, segment) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            if i > 0 && !after_globstar {
                re.push('/');
            }
            after_globstar = false;

            if *segment == "**" {
                if last {
                    re.push_str(".*");
                    return Regex::new(&re);
                }
                re.push_str("(?:[^/]*/)*");
                after_globstar = true;
            } else {
                re.push_str(&regex::escape(segment).replace("\\*", "[^/]*"));
            }
        }

        re.push_str("(?:/|$)");
        Regex::new(&re)
    }

    /// 同步扫描（在阻塞线程上运行）
    fn scan_blocking(
        roots: &[PathBuf],
        exclude_rules: &[Regex],
        per_folder_item_limit: usize,
        include_images: bool,
        include_videos: bool,
    ) -> Vec<MediaFolder> {
        let mut folders: HashMap<(PathBuf, MediaFolderType), FolderAccumulator> = HashMap::new();
        let mut excluded_count = 0usize;

        for root in roots {
            if !root.is_dir() {
                warn!("扫描根目录不存在: {:?}", root);
                continue;
            }

            for entry in WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();

                let Some(folder_type) = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(classify_extension)
                else {
                    continue;
                };

                let wanted = match folder_type {
                    MediaFolderType::Image => include_images,
                    MediaFolderType::Video => include_videos,
                    MediaFolderType::Custom => false,
                };
                if !wanted {
                    continue;
                }

                let relative = path
                    .strip_prefix(root)
                    .map(Self::normalize_path)
                    .unwrap_or_default();
                if Self::should_exclude(exclude_rules, &relative) {
                    debug!("排除文件: {}", relative);
                    excluded_count += 1;
                    continue;
                }

                let Some(parent) = path.parent() else {
                    continue;
                };
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| d.as_millis() as i64)
                    .unwrap_or(0);

                folders
                    .entry((parent.to_path_buf(), folder_type))
                    .or_default()
                    .files
                    .push((modified, Self::normalize_path(path)));
            }
        }

        let mut result: Vec<MediaFolder> = folders
            .into_iter()
            .map(|((dir, folder_type), mut acc)| {
                // 最新的文件在前
                acc.files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
                let number_of_files = acc.files.len() as u64;
                let file_paths = acc
                    .files
                    .into_iter()
                    .take(per_folder_item_limit)
                    .map(|(_, p)| p)
                    .collect();

                MediaFolder {
                    absolute_path: Self::normalize_path(&dir),
                    folder_name: dir
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    folder_type,
                    file_paths,
                    number_of_files,
                }
            })
            .collect();

        result.sort_by(|a, b| {
            a.absolute_path
                .cmp(&b.absolute_path)
                .then_with(|| a.folder_type.cmp(&b.folder_type))
        });

        info!(
            "媒体扫描完成: {} 个文件夹, {} 个文件被排除",
            result.len(),
            excluded_count
        );
        result
    }
}

#[async_trait]
impl MediaFolderScanner for LocalMediaScanner {
    async fn scan(
        &self,
        per_folder_item_limit: usize,
        include_images: bool,
        include_videos: bool,
    ) -> Result<Vec<MediaFolder>> {
        let roots = self.roots.clone();
        let excludes = self.exclude_rules.clone();

        // 使用 spawn_blocking 避免阻塞 async runtime
        let folders = tokio::task::spawn_blocking(move || {
            Self::scan_blocking(
                &roots,
                &excludes,
                per_folder_item_limit,
                include_images,
                include_videos,
            )
        })
        .await?;

        Ok(folders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn excluded(path: &str, pattern: &str) -> bool {
        let rule = LocalMediaScanner::compile_pattern(pattern).unwrap();
        LocalMediaScanner::should_exclude(&[rule], path)
    }

    #[test]
    fn test_exclude_patterns() {
        assert!(excluded("a/.thumbnails/x.jpg", ".thumbnails/**"));
        assert!(excluded(".thumbnails/x.jpg", ".thumbnails/**"));
        assert!(excluded("A/.Thumbnails/x.jpg", ".thumbnails/**"));
        assert!(excluded("a/.trash-1/x.jpg", ".trash*"));
        assert!(excluded("x/Cache/y/z.jpg", "**/cache/**"));
        assert!(excluded("DCIM/Camera/x.jpg", "dcim/camera/x.jpg"));
        assert!(!excluded("DCIM/Camera/x.jpg", ".thumbnails/**"));
        assert!(!excluded("DCIM/Camera/x.jpg", ".trash*"));
    }

    #[test]
    fn test_exclude_matches_whole_segments() {
        assert!(!excluded("a/.thumbnailsX/x.jpg", ".thumbnails/**"));
        assert!(!excluded("a/my.trash/x.jpg", ".trash*"));
        assert!(!excluded("DCIM/Camera2/x.jpg", "camera"));
        assert!(excluded("DCIM/Camera/x.jpg", "camera"));
    }

    #[tokio::test]
    async fn test_scan_groups_by_folder_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("DCIM/Camera/a.jpg"));
        touch(&root.join("DCIM/Camera/b.JPG"));
        touch(&root.join("DCIM/Camera/c.mp4"));
        touch(&root.join("Pictures/Screenshots/s.png"));
        touch(&root.join("Documents/readme.txt"));
        touch(&root.join("DCIM/.thumbnails/t.jpg"));

        let scanner = LocalMediaScanner::with_excludes(
            vec![root.to_path_buf()],
            vec![".thumbnails/**".to_string()],
        );
        let folders = scanner.scan(1, true, true).await.unwrap();

        assert_eq!(folders.len(), 3);
        let camera_images = folders
            .iter()
            .find(|f| f.folder_name == "Camera" && f.folder_type == MediaFolderType::Image)
            .unwrap();
        assert_eq!(camera_images.number_of_files, 2);
        assert_eq!(camera_images.file_paths.len(), 1);
        assert!(folders
            .iter()
            .any(|f| f.folder_name == "Camera" && f.folder_type == MediaFolderType::Video));
        assert!(folders.iter().any(|f| f.folder_name == "Screenshots"));
    }

    #[tokio::test]
    async fn test_scan_respects_type_flags() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Movies/clip.mov"));
        touch(&dir.path().join("Pictures/p.jpg"));

        let scanner = LocalMediaScanner::new(vec![dir.path().to_path_buf()]);
        let folders = scanner.scan(8, false, true).await.unwrap();

        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].folder_type, MediaFolderType::Video);
    }

    #[tokio::test]
    async fn test_missing_root_is_skipped() {
        let scanner = LocalMediaScanner::new(vec![PathBuf::from("/definitely/not/here")]);
        assert!(scanner.scan(8, true, true).await.unwrap().is_empty());
    }
}
