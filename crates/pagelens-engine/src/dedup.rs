//! Position+content deduplication of visible items.

use std::collections::HashSet;

use crate::item::ContentItem;

/// Collapse visible duplicates: same kind, same primary text, and
/// positions matching once rounded to the nearest `grid` pixels. First
/// occurrence wins. Hidden items always pass through; they are kept as
/// reconciliation candidates for later visibility flips.
pub(crate) fn dedup_visible(items: Vec<ContentItem>, grid: i32) -> Vec<ContentItem> {
    let mut seen: HashSet<(&'static str, String, i32, i32)> = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            if item.rect.hidden {
                return true;
            }
            seen.insert((
                item.kind.type_name(),
                item.kind.primary_text().to_string(),
                snap(item.rect.left, grid),
                snap(item.rect.top, grid),
            ))
        })
        .collect()
}

fn snap(value: i32, grid: i32) -> i32 {
    if grid <= 1 {
        return value;
    }
    ((value as f64 / grid as f64).round() as i32) * grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemKind, ItemRect};

    fn text_item(id: u32, text: &str, left: i32, top: i32, hidden: bool) -> ContentItem {
        ContentItem {
            id,
            owner: id,
            parent: None,
            tag: "div".to_string(),
            role: "block".to_string(),
            rect: ItemRect {
                top,
                left,
                width: 100,
                height: 20,
                hidden,
            },
            kind: ItemKind::Text {
                text: text.to_string(),
            },
            is_clickable: false,
            is_inputtable: false,
            is_disabled: false,
            is_checked: None,
            is_focused: false,
        }
    }

    #[test]
    fn test_identical_visible_items_collapse() {
        let items = vec![
            text_item(1, "Buy", 100, 50, false),
            text_item(2, "Buy", 102, 48, false), // sub-grid jitter
        ];
        let out = dedup_visible(items, 10);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 1, "first occurrence wins");
    }

    #[test]
    fn test_distant_duplicates_are_kept() {
        let items = vec![
            text_item(1, "Buy", 100, 50, false),
            text_item(2, "Buy", 160, 50, false),
        ];
        assert_eq!(dedup_visible(items, 10).len(), 2);
    }

    #[test]
    fn test_hidden_items_bypass_dedup() {
        let items = vec![
            text_item(1, "Ghost", 100, 50, true),
            text_item(2, "Ghost", 100, 50, true),
        ];
        assert_eq!(dedup_visible(items, 10).len(), 2);
    }

    #[test]
    fn test_different_kinds_never_collide() {
        let mut link = text_item(2, "Buy", 100, 50, false);
        link.kind = ItemKind::Link {
            href: None,
            text: "Buy".to_string(),
        };
        let items = vec![text_item(1, "Buy", 100, 50, false), link];
        assert_eq!(dedup_visible(items, 10).len(), 2);
    }
}
