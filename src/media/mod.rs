pub mod local;

use crate::error::Result;
use async_trait::async_trait;

pub use crate::db::models::{MediaFolder, MediaFolderType};
pub use local::LocalMediaScanner;

/// 媒体文件夹扫描接口
#[async_trait]
pub trait MediaFolderScanner: Send + Sync {
    /// 扫描设备存储，每个包含图片或视频的目录返回一项
    ///
    /// 同一目录同时包含图片和视频时分别返回 `Image` 和 `Video` 两项。
    /// 返回顺序不做保证。
    async fn scan(
        &self,
        per_folder_item_limit: usize,
        include_images: bool,
        include_videos: bool,
    ) -> Result<Vec<MediaFolder>>;
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "bmp", "tif", "tiff", "dng",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "3gp", "mkv", "webm", "avi"];

/// 按扩展名判断媒体类型
pub fn classify_extension(ext: &str) -> Option<MediaFolderType> {
    let ext = ext.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaFolderType::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaFolderType::Video)
    } else {
        None
    }
}
