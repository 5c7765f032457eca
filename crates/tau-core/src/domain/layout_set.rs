//! Layout pages and the layout set sent in a `resetLayout` packet.
//!
//! A [`LayoutSet`] is an ordered list of [`LayoutPage`]s plus the page the
//! renderer shows first.  It is built fresh whenever the server wants to
//! replace the remote UI, serialized once, and dropped.
//!
//! Wire document:
//!
//! ```text
//! {"layoutId":"...","startPage":"P1","pages":[{"id":"P1","root":{...}}, ...]}
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::ids::{LayoutId, LayoutPageId};
use crate::domain::layout::{LayoutElement, LayoutError};

/// One page: an id and a single root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPage {
    pub id: LayoutPageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<LayoutElement>,
}

impl LayoutPage {
    /// Creates a page with the given root element.
    pub fn new(id: impl Into<LayoutPageId>, root: impl Into<LayoutElement>) -> Self {
        Self {
            id: id.into(),
            root: Some(root.into()),
        }
    }

    /// Creates a page without a root.  It must get one via
    /// [`LayoutPage::with_root`] before it can be serialized.
    pub fn empty(id: impl Into<LayoutPageId>) -> Self {
        Self {
            id: id.into(),
            root: None,
        }
    }

    /// Replaces the root element.
    pub fn with_root(mut self, root: impl Into<LayoutElement>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Validates the page and returns its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::MissingRoot`] for a page without a root, or any
    /// element-level error found in the tree.
    pub fn to_wire(&self) -> Result<serde_json::Value, LayoutError> {
        self.validate()?;
        serde_json::to_value(self).map_err(|e| LayoutError::Malformed(e.to_string()))
    }

    fn validate(&self) -> Result<&LayoutElement, LayoutError> {
        if self.id.is_empty() {
            return Err(LayoutError::EmptyPageId);
        }
        let root = self.root.as_ref().ok_or_else(|| LayoutError::MissingRoot {
            page: self.id.clone(),
        })?;
        root.validate(&self.id)?;
        Ok(root)
    }
}

/// Serialized form of a [`LayoutSet`], as carried by `resetLayout`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    pub layout_id: LayoutId,
    pub start_page: LayoutPageId,
    pub pages: Vec<LayoutPage>,
}

/// Ordered collection of pages plus the designated start page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSet {
    layout_id: LayoutId,
    pages: Vec<LayoutPage>,
    start_page: Option<LayoutPageId>,
}

impl Default for LayoutSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutSet {
    /// Creates an empty set with a freshly generated layout id.
    pub fn new() -> Self {
        Self::with_id(LayoutId::generate())
    }

    /// Creates an empty set with a caller-chosen layout id.
    pub fn with_id(layout_id: impl Into<LayoutId>) -> Self {
        Self {
            layout_id: layout_id.into(),
            pages: Vec::new(),
            start_page: None,
        }
    }

    /// Appends a page.  Page order is preserved on the wire.
    pub fn push_page(mut self, page: LayoutPage) -> Self {
        self.pages.push(page);
        self
    }

    /// Chooses the page the renderer shows first.
    ///
    /// When never called, the first pushed page is the start page.
    pub fn with_start_page(mut self, page: impl Into<LayoutPageId>) -> Self {
        self.start_page = Some(page.into());
        self
    }

    pub fn layout_id(&self) -> &LayoutId {
        &self.layout_id
    }

    pub fn pages(&self) -> &[LayoutPage] {
        &self.pages
    }

    /// Looks up a page by id.
    pub fn page(&self, id: &LayoutPageId) -> Option<&LayoutPage> {
        self.pages.iter().find(|p| &p.id == id)
    }

    /// The effective start page: the explicit one, or else the first page.
    pub fn start_page(&self) -> Option<&LayoutPageId> {
        self.start_page
            .as_ref()
            .or_else(|| self.pages.first().map(|p| &p.id))
    }

    /// Checks every set-level and page-level invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`LayoutError`] encountered: empty set, duplicate or
    /// empty page ids, missing roots, element id problems, an unknown start
    /// page, or a button switching to a page outside the set.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.pages.is_empty() {
            return Err(LayoutError::EmptyLayoutSet);
        }

        let mut page_ids = HashSet::new();
        let mut roots = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            roots.push(page.validate()?);
            if !page_ids.insert(&page.id) {
                return Err(LayoutError::DuplicatePageId(page.id.clone()));
            }
        }

        if let Some(start) = &self.start_page {
            if !page_ids.contains(start) {
                return Err(LayoutError::UnknownStartPage(start.clone()));
            }
        }

        for root in roots {
            for (element, target) in root.switch_targets() {
                if !page_ids.contains(&target) {
                    return Err(LayoutError::UnknownSwitchTarget { element, target });
                }
            }
        }
        Ok(())
    }

    /// Validates the set and converts it into its wire document.
    ///
    /// # Errors
    ///
    /// See [`LayoutSet::validate`].
    pub fn to_document(&self) -> Result<LayoutDocument, LayoutError> {
        self.validate()?;
        let start_page = self.start_page().cloned().ok_or(LayoutError::EmptyLayoutSet)?;
        Ok(LayoutDocument {
            layout_id: self.layout_id.clone(),
            start_page,
            pages: self.pages.clone(),
        })
    }

    /// Validates the set and renders the wire document as a JSON string.
    ///
    /// # Errors
    ///
    /// See [`LayoutSet::validate`].
    pub fn to_json(&self) -> Result<String, LayoutError> {
        let document = self.to_document()?;
        serde_json::to_string(&document).map_err(|e| LayoutError::Malformed(e.to_string()))
    }

    /// Rebuilds a set from a received document, applying the same validation
    /// as on the sending side.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if the document violates any invariant.
    pub fn from_document(document: LayoutDocument) -> Result<Self, LayoutError> {
        let set = Self {
            layout_id: document.layout_id,
            pages: document.pages,
            start_page: Some(document.start_page),
        };
        set.validate()?;
        Ok(set)
    }

    /// Parses a JSON wire document.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Malformed`] for JSON that does not match the
    /// document shape, and other variants for invariant violations.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let document: LayoutDocument =
            serde_json::from_str(json).map_err(|e| LayoutError::Malformed(e.to_string()))?;
        Self::from_document(document)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::ElementId;
    use crate::domain::layout::{ButtonElement, ContainerElement, EmptySpace, LabelElement};
    use serde_json::json;

    fn two_page_set() -> LayoutSet {
        LayoutSet::with_id("SAMPLE_LAYOUT_ID")
            .push_page(LayoutPage::new(
                "P1",
                ContainerElement::vertical()
                    .push(ButtonElement::new().note("next").id("TO_P2").switch_to_page_on_click("P2")),
            ))
            .push_page(LayoutPage::new(
                "P2",
                ContainerElement::vertical()
                    .push(LabelElement::new("").id("LABEL"))
                    .push(ButtonElement::new().note("back").id("TO_P1")),
            ))
    }

    #[test]
    fn test_start_page_defaults_to_first_page() {
        let set = two_page_set();
        assert_eq!(set.start_page(), Some(&LayoutPageId::new("P1")));
    }

    #[test]
    fn test_explicit_start_page_wins() {
        let set = two_page_set().with_start_page("P2");
        assert_eq!(set.start_page(), Some(&LayoutPageId::new("P2")));
        assert_eq!(set.to_document().unwrap().start_page, "P2");
    }

    #[test]
    fn test_document_preserves_page_order() {
        let doc = two_page_set().to_document().unwrap();
        let ids: Vec<_> = doc.pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["P1", "P2"]);
        assert_eq!(doc.layout_id, "SAMPLE_LAYOUT_ID");
    }

    #[test]
    fn test_document_json_shape() {
        let set = LayoutSet::with_id("L")
            .push_page(LayoutPage::new("P1", ButtonElement::new().id("B1")));
        let value: serde_json::Value = serde_json::from_str(&set.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "layoutId": "L",
                "startPage": "P1",
                "pages": [{"id": "P1", "root": {"type": "button", "id": "B1", "note": ""}}]
            })
        );
    }

    #[test]
    fn test_empty_set_is_rejected() {
        assert_eq!(LayoutSet::new().validate(), Err(LayoutError::EmptyLayoutSet));
    }

    #[test]
    fn test_unknown_start_page_is_rejected() {
        let set = two_page_set().with_start_page("NOPE");
        assert_eq!(
            set.to_document(),
            Err(LayoutError::UnknownStartPage(LayoutPageId::new("NOPE")))
        );
    }

    #[test]
    fn test_page_without_root_is_rejected() {
        let set = LayoutSet::new().push_page(LayoutPage::empty("P1"));
        assert_eq!(
            set.validate(),
            Err(LayoutError::MissingRoot {
                page: LayoutPageId::new("P1")
            })
        );
        assert!(LayoutPage::empty("P1").to_wire().is_err());
    }

    #[test]
    fn test_page_with_root_added_later_serializes() {
        let page = LayoutPage::empty("P1").with_root(EmptySpace);
        assert_eq!(
            page.to_wire().unwrap(),
            json!({"id": "P1", "root": {"type": "empty"}})
        );
    }

    #[test]
    fn test_duplicate_page_ids_are_rejected() {
        let set = LayoutSet::new()
            .push_page(LayoutPage::new("P1", EmptySpace))
            .push_page(LayoutPage::new("P1", EmptySpace));
        assert_eq!(
            set.validate(),
            Err(LayoutError::DuplicatePageId(LayoutPageId::new("P1")))
        );
    }

    #[test]
    fn test_same_element_id_on_different_pages_is_allowed() {
        let set = LayoutSet::new()
            .push_page(LayoutPage::new("P1", ButtonElement::new().id("B")))
            .push_page(LayoutPage::new("P2", ButtonElement::new().id("B")));
        assert_eq!(set.validate(), Ok(()));
    }

    #[test]
    fn test_switch_to_unknown_page_is_rejected() {
        let set = LayoutSet::new().push_page(LayoutPage::new(
            "P1",
            ButtonElement::new().id("B").switch_to_page_on_click("P9"),
        ));
        assert_eq!(
            set.validate(),
            Err(LayoutError::UnknownSwitchTarget {
                element: ElementId::new("B"),
                target: LayoutPageId::new("P9"),
            })
        );
    }

    #[test]
    fn test_json_round_trip_reconstructs_equivalent_set() {
        let original = two_page_set().with_start_page("P2");
        let restored = LayoutSet::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            LayoutSet::from_json("{\"pages\": 3}"),
            Err(LayoutError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_document_applies_validation() {
        let doc = LayoutDocument {
            layout_id: LayoutId::new("L"),
            start_page: LayoutPageId::new("MISSING"),
            pages: vec![LayoutPage::new("P1", EmptySpace)],
        };
        assert_eq!(
            LayoutSet::from_document(doc),
            Err(LayoutError::UnknownStartPage(LayoutPageId::new("MISSING")))
        );
    }
}
