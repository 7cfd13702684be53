//! Content items: the semantic records extracted from elements.

use serde::{Deserialize, Serialize};

use pagelens_dom::BoundingBox;

/// Stable per-element identifier, issued once per analysis session.
pub type ElementId = u32;

/// Session-unique item identifier.
pub type ItemId = u32;

/// Rounded-integer rectangle in main-document coordinate space. `hidden`
/// marks content that is present in the tree but not currently rendered
/// visibly (zero box, `visibility:hidden`, zero opacity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ItemRect {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
    pub hidden: bool,
}

impl ItemRect {
    pub(crate) fn from_box(bounds: BoundingBox, hidden: bool) -> Self {
        Self {
            top: bounds.y.round() as i32,
            left: bounds.x.round() as i32,
            width: bounds.width.round() as i32,
            height: bounds.height.round() as i32,
            hidden,
        }
    }
}

/// Type-specific payload of a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Text {
        text: String,
    },
    Image {
        alt: Option<String>,
        title: Option<String>,
        src: Option<String>,
    },
    Link {
        href: Option<String>,
        text: String,
    },
    Button {
        label: String,
    },
    Input {
        input_type: String,
        label: String,
        placeholder: Option<String>,
    },
    Textarea {
        label: String,
        placeholder: Option<String>,
    },
    Select {
        label: String,
    },
    Container,
    Iframe {
        src: Option<String>,
    },
}

impl ItemKind {
    /// Stable discriminant name, used in dedup keys and outlines.
    pub fn type_name(&self) -> &'static str {
        match self {
            ItemKind::Text { .. } => "text",
            ItemKind::Image { .. } => "image",
            ItemKind::Link { .. } => "link",
            ItemKind::Button { .. } => "button",
            ItemKind::Input { .. } => "input",
            ItemKind::Textarea { .. } => "textarea",
            ItemKind::Select { .. } => "select",
            ItemKind::Container => "container",
            ItemKind::Iframe { .. } => "iframe",
        }
    }

    /// Primary text identity: the payload field that distinguishes two
    /// items of the same kind for dedup purposes.
    pub fn primary_text(&self) -> &str {
        match self {
            ItemKind::Text { text } => text,
            ItemKind::Image { alt, src, .. } => {
                alt.as_deref().or(src.as_deref()).unwrap_or_default()
            }
            ItemKind::Link { href, text } => href.as_deref().unwrap_or(text),
            ItemKind::Button { label } => label,
            ItemKind::Input { label, .. } => label,
            ItemKind::Textarea { label, .. } => label,
            ItemKind::Select { label } => label,
            ItemKind::Container => "",
            ItemKind::Iframe { src } => src.as_deref().unwrap_or_default(),
        }
    }
}

/// A semantic record extracted from one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,
    /// Owner element id; one per live element per session.
    pub owner: ElementId,
    pub parent: Option<ElementId>,
    pub tag: String,
    pub role: String,
    pub rect: ItemRect,
    #[serde(flatten)]
    pub kind: ItemKind,
    pub is_clickable: bool,
    pub is_inputtable: bool,
    pub is_disabled: bool,
    pub is_checked: Option<bool>,
    pub is_focused: bool,
}

/// Structural context for an identified element, reconstructable without
/// re-querying the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMeta {
    pub tag: String,
    pub role: String,
    pub rect: ItemRect,
    pub parent: Option<ElementId>,
}

/// Item counts of one analysis pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    pub total: usize,
    pub visible: usize,
    pub hidden: usize,
}

impl PageStats {
    pub fn tally(items: &[ContentItem]) -> Self {
        let hidden = items.iter().filter(|item| item.rect.hidden).count();
        Self {
            total: items.len(),
            visible: items.len() - hidden,
            hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_serializes_tagged() {
        let item = ContentItem {
            id: 1,
            owner: 2,
            parent: None,
            tag: "a".to_string(),
            role: "block".to_string(),
            rect: ItemRect::default(),
            kind: ItemKind::Link {
                href: Some("/x".to_string()),
                text: "Go".to_string(),
            },
            is_clickable: true,
            is_inputtable: false,
            is_disabled: false,
            is_checked: None,
            is_focused: false,
        };
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["type"], "link");
        assert_eq!(json["href"], "/x");
        assert_eq!(json["owner"], 2);

        let back: ContentItem = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, item);
    }

    #[test]
    fn test_primary_text_prefers_href_for_links() {
        let kind = ItemKind::Link {
            href: Some("/a".to_string()),
            text: "label".to_string(),
        };
        assert_eq!(kind.primary_text(), "/a");

        let kind = ItemKind::Link {
            href: None,
            text: "label".to_string(),
        };
        assert_eq!(kind.primary_text(), "label");
    }

    #[test]
    fn test_stats_tally() {
        let mut rect = ItemRect::default();
        let visible = ContentItem {
            id: 1,
            owner: 1,
            parent: None,
            tag: "div".to_string(),
            role: "block".to_string(),
            rect,
            kind: ItemKind::Container,
            is_clickable: false,
            is_inputtable: false,
            is_disabled: false,
            is_checked: None,
            is_focused: false,
        };
        rect.hidden = true;
        let hidden = ContentItem {
            id: 2,
            rect,
            ..visible.clone()
        };
        let stats = PageStats::tally(&[visible, hidden]);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.visible, 1);
        assert_eq!(stats.hidden, 1);
    }
}
