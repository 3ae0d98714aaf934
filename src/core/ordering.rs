use crate::db::models::SyncedFolderDisplayItem;
use std::cmp::Ordering;

/// 默认优先显示的文件夹名
pub const DEFAULT_PRIORITIZED_FOLDERS: &[&str] = &["Camera", "Screenshots"];

/// 展示顺序
///
/// 规则依次为：已启用在前；优先名单中的名字在前（按名单顺序）；
/// 没有名字的在前；最后按名字不区分大小写升序。排序是稳定的。
#[derive(Debug, Clone)]
pub struct DisplayOrdering {
    prioritized: Vec<String>,
}

impl Default for DisplayOrdering {
    fn default() -> Self {
        Self::new(DEFAULT_PRIORITIZED_FOLDERS.iter().map(|s| s.to_string()).collect())
    }
}

impl DisplayOrdering {
    pub fn new(prioritized: Vec<String>) -> Self {
        Self { prioritized }
    }

    pub fn prioritized(&self) -> &[String] {
        &self.prioritized
    }

    fn priority_rank(&self, name: Option<&str>) -> Option<usize> {
        let name = name?;
        self.prioritized.iter().position(|p| p == name)
    }

    pub fn compare(&self, a: &SyncedFolderDisplayItem, b: &SyncedFolderDisplayItem) -> Ordering {
        // 已启用在前
        b.is_enabled()
            .cmp(&a.is_enabled())
            .then_with(|| {
                match (
                    self.priority_rank(a.folder_name.as_deref()),
                    self.priority_rank(b.folder_name.as_deref()),
                ) {
                    (Some(ra), Some(rb)) => ra.cmp(&rb),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            })
            .then_with(|| match (&a.folder_name, &b.folder_name) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(na), Some(nb)) => na.to_lowercase().cmp(&nb.to_lowercase()),
            })
    }

    /// 稳定排序
    pub fn sort(&self, mut items: Vec<SyncedFolderDisplayItem>) -> Vec<SyncedFolderDisplayItem> {
        items.sort_by(|a, b| self.compare(a, b));
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{MediaFolderType, SyncedFolder};

    fn item(name: Option<&str>, enabled: bool) -> SyncedFolderDisplayItem {
        let path = format!("/sdcard/{}", name.unwrap_or("unnamed"));
        let mut folder = SyncedFolder::new(path, "/r", "alice", MediaFolderType::Image);
        folder.enabled = enabled;
        SyncedFolderDisplayItem::new(folder, vec![], name.map(|n| n.to_string()), 1)
    }

    fn names(items: &[SyncedFolderDisplayItem]) -> Vec<&str> {
        items
            .iter()
            .map(|i| i.folder_name.as_deref().unwrap_or("<none>"))
            .collect()
    }

    #[test]
    fn test_enabled_then_priority_then_alpha() {
        let ordering = DisplayOrdering::default();
        let sorted = ordering.sort(vec![
            item(Some("zebra"), true),
            item(Some("Camera"), true),
            item(Some("apple"), false),
        ]);
        assert_eq!(names(&sorted), vec!["Camera", "zebra", "apple"]);
    }

    #[test]
    fn test_priority_list_order_among_disabled() {
        let ordering = DisplayOrdering::default();
        let sorted = ordering.sort(vec![
            item(Some("Alpha"), false),
            item(Some("Screenshots"), false),
            item(Some("Camera"), false),
        ]);
        assert_eq!(names(&sorted), vec!["Camera", "Screenshots", "Alpha"]);
    }

    #[test]
    fn test_case_insensitive_and_missing_names() {
        let ordering = DisplayOrdering::default();
        let sorted = ordering.sort(vec![
            item(Some("beta"), false),
            item(Some("Alpha"), false),
            item(None, false),
        ]);
        assert_eq!(names(&sorted), vec!["<none>", "Alpha", "beta"]);
    }

    #[test]
    fn test_injected_priorities() {
        let ordering = DisplayOrdering::new(vec!["WhatsApp Images".to_string()]);
        let sorted = ordering.sort(vec![
            item(Some("Camera"), true),
            item(Some("WhatsApp Images"), true),
        ]);
        assert_eq!(names(&sorted), vec!["WhatsApp Images", "Camera"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_names() {
        let ordering = DisplayOrdering::default();
        let mut first = item(Some("Docs"), false);
        first.folder.local_path = "/one/Docs".to_string();
        let mut second = item(Some("docs"), false);
        second.folder.local_path = "/two/docs".to_string();

        let sorted = ordering.sort(vec![first, second]);
        assert_eq!(sorted[0].folder.local_path, "/one/Docs");
        assert_eq!(sorted[1].folder.local_path, "/two/docs");
    }
}
