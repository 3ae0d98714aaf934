pub mod item_store;
pub mod merger;
pub mod ordering;
pub mod qualify;
pub mod service;

pub use item_store::{BackgroundSyncTrigger, EmptyState, LoggingSyncTrigger, SyncedFolderItemStore};
pub use merger::{FolderMergeEngine, MergeConfig, MergeSummary};
pub use ordering::{DisplayOrdering, DEFAULT_PRIORITIZED_FOLDERS};
pub use qualify::{is_qualifying_media_folder, is_qualifying_synced_folder, list_folder_files, FolderListing};
pub use service::{FolderSyncService, LoadResult};
