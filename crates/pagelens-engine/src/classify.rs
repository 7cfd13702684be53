//! Element classification: visibility, structural role, actionability.

use pagelens_dom::Element;

/// Structural ancestor tags, in fixed priority order.
const STRUCTURAL_ROLES: [&str; 7] = [
    "header", "footer", "nav", "aside", "main", "article", "section",
];

/// Snapshot of one element's current state, as the walker consumes it.
#[derive(Debug, Clone)]
pub struct Classification {
    pub visible: bool,
    pub role: String,
    pub is_disabled: bool,
    pub is_clickable: bool,
    pub is_inputtable: bool,
    pub is_checked: Option<bool>,
    pub is_focused: bool,
}

/// Pure function of the element's current state. `display:none` is not
/// handled here; the walker excludes those subtrees outright.
pub fn classify(element: &Element) -> Classification {
    let style = element.style();
    let bounds = element.bounds();
    let visible = !bounds.is_empty() && style.visibility != "hidden" && style.opacity > 0.0;

    let tag = element.tag();
    let is_disabled = element.is_disabled();
    let has_button_role = element.attribute("role").as_deref() == Some("button");
    let is_clickable = !is_disabled
        && (tag == "button" || has_button_role || (tag == "a" && element.has_attribute("href")));
    let is_inputtable = !is_disabled && (tag == "input" || tag == "textarea");

    let is_checked = match (tag, element.attribute("type").as_deref()) {
        ("input", Some("checkbox") | Some("radio")) => Some(element.checked().unwrap_or(false)),
        _ => None,
    };

    Classification {
        visible,
        role: structural_role(element),
        is_disabled,
        is_clickable,
        is_inputtable,
        is_checked,
        is_focused: element.is_focused(),
    }
}

/// Nearest matching structural ancestor in fixed priority order; elements
/// outside any structural landmark get the default "block".
pub fn structural_role(element: &Element) -> String {
    for role in STRUCTURAL_ROLES {
        let mut current = Some(element.clone());
        while let Some(el) = current {
            if el.tag() == role {
                return role.to_string();
            }
            current = el.parent();
        }
    }
    "block".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelens_dom::{BoundingBox, Document};

    fn sized(doc: &Document, tag: &str) -> Element {
        let el = doc.create_element(tag);
        el.set_bounds(BoundingBox::new(0.0, 0.0, 100.0, 20.0));
        el
    }

    #[test]
    fn test_zero_box_is_not_visible() {
        let doc = Document::new();
        let div = doc.create_element("div");
        assert!(!classify(&div).visible);

        div.set_bounds(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert!(classify(&div).visible);
    }

    #[test]
    fn test_visibility_and_opacity_hide() {
        let doc = Document::new();
        let div = sized(&doc, "div");
        div.set_visibility("hidden");
        assert!(!classify(&div).visible);

        let div = sized(&doc, "div");
        div.set_opacity(0.0);
        assert!(!classify(&div).visible);
    }

    #[test]
    fn test_role_uses_priority_over_proximity() {
        let doc = Document::new();
        let header = doc.create_element("header");
        let section = doc.create_element("section");
        let span = doc.create_element("span");
        doc.body().append_child(&header.clone().into());
        header.append_child(&section.clone().into());
        section.append_child(&span.clone().into());

        // section is the nearer ancestor, but header outranks it
        assert_eq!(structural_role(&span), "header");
    }

    #[test]
    fn test_role_defaults_to_block() {
        let doc = Document::new();
        let div = doc.create_element("div");
        doc.body().append_child(&div.clone().into());
        assert_eq!(structural_role(&div), "block");
    }

    #[test]
    fn test_clickable_requires_enabled_and_href_for_anchors() {
        let doc = Document::new();
        let anchor = sized(&doc, "a");
        assert!(!classify(&anchor).is_clickable, "anchor without href");

        anchor.set_attribute("href", "/x");
        assert!(classify(&anchor).is_clickable);

        let button = sized(&doc, "button");
        assert!(classify(&button).is_clickable);
        button.set_disabled(true);
        assert!(!classify(&button).is_clickable);

        let fake = sized(&doc, "div");
        fake.set_attribute("role", "button");
        assert!(classify(&fake).is_clickable);
    }

    #[test]
    fn test_inputtable_and_checked() {
        let doc = Document::new();
        let input = sized(&doc, "input");
        input.set_attribute("type", "checkbox");
        input.set_checked(true);
        let cls = classify(&input);
        assert!(cls.is_inputtable);
        assert_eq!(cls.is_checked, Some(true));

        let text = sized(&doc, "input");
        assert_eq!(classify(&text).is_checked, None, "text inputs have no checked state");

        let select = sized(&doc, "select");
        let cls = classify(&select);
        assert!(!cls.is_inputtable);
        assert!(!cls.is_clickable);
    }
}
