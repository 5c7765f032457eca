//! Layout element tree: the declarative description of one UI page.
//!
//! A page is a tree: [`ContainerElement`]s split their area evenly between
//! their children, and leaves are buttons, inputs, labels or empty space.
//! Trees are built bottom-up with by-value builders and then handed to a
//! [`crate::LayoutPage`]:
//!
//! ```rust
//! use tau_core::domain::layout::{ButtonElement, ContainerElement, EmptySpace, LayoutElement};
//!
//! let root: LayoutElement = ContainerElement::vertical()
//!     .push(ButtonElement::new().note("copy").id("COPY"))
//!     .push(EmptySpace)
//!     .into();
//! assert_eq!(root.child_count(), 2);
//! ```
//!
//! The wire form is a nested JSON object, one object per element, tagged by
//! `"type"`:
//!
//! ```text
//! {"type":"container","direction":"vertical","splitEvenly":true,"children":[...]}
//! {"type":"button","id":"B1","note":"go","switchToPage":"P2"}
//! {"type":"textInput","id":"T","initialValue":"x"}
//! {"type":"boolInput","id":"C","initialValue":true,"note":"n"}
//! {"type":"label","id":"L","text":""}
//! {"type":"empty"}
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ids::{ElementId, LayoutPageId};

/// Errors raised while building or validating a layout.
///
/// These are caller errors: a layout that fails validation is never put on
/// the wire.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LayoutError {
    /// The page has no root element.
    #[error("layout page '{page}' has no root element")]
    MissingRoot { page: LayoutPageId },

    /// A layout page was given an empty id.
    #[error("layout page id must not be empty")]
    EmptyPageId,

    /// An interactive element was never given an id.
    #[error("{kind} element on page '{page}' has no id")]
    MissingElementId { page: LayoutPageId, kind: &'static str },

    /// An element was given the empty string as its id.
    #[error("{kind} element on page '{page}' has an empty id")]
    EmptyElementId { page: LayoutPageId, kind: &'static str },

    /// Two elements on the same page share an id.
    #[error("element id '{id}' is used more than once on page '{page}'")]
    DuplicateElementId { page: LayoutPageId, id: ElementId },

    /// Two pages in the same set share an id.
    #[error("layout page id '{0}' is used more than once")]
    DuplicatePageId(LayoutPageId),

    /// The layout set contains no pages.
    #[error("layout set contains no pages")]
    EmptyLayoutSet,

    /// The start page is not one of the pages in the set.
    #[error("start page '{0}' is not part of the layout set")]
    UnknownStartPage(LayoutPageId),

    /// A button switches to a page that is not part of the set.
    #[error("button '{element}' switches to unknown page '{target}'")]
    UnknownSwitchTarget {
        element: ElementId,
        target: LayoutPageId,
    },

    /// A layout document could not be parsed.
    #[error("malformed layout document: {0}")]
    Malformed(String),
}

/// Direction in which a container splits its area between children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    /// Children are stacked top to bottom.
    #[default]
    Vertical,
    /// Children are placed left to right.
    Horizontal,
}

/// One node of a layout tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LayoutElement {
    Container(ContainerElement),
    Button(ButtonElement),
    TextInput(TextInputElement),
    #[serde(rename = "boolInput")]
    BooleanInput(BooleanInputElement),
    Label(LabelElement),
    #[serde(rename = "empty")]
    EmptySpace,
}

impl LayoutElement {
    /// Short name of the element kind, as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            LayoutElement::Container(_) => "container",
            LayoutElement::Button(_) => "button",
            LayoutElement::TextInput(_) => "textInput",
            LayoutElement::BooleanInput(_) => "boolInput",
            LayoutElement::Label(_) => "label",
            LayoutElement::EmptySpace => "empty",
        }
    }

    /// The element id, if this element carries one.
    pub fn id(&self) -> Option<&ElementId> {
        match self {
            LayoutElement::Button(e) => e.id.as_ref(),
            LayoutElement::TextInput(e) => e.id.as_ref(),
            LayoutElement::BooleanInput(e) => e.id.as_ref(),
            LayoutElement::Label(e) => e.id.as_ref(),
            LayoutElement::Container(_) | LayoutElement::EmptySpace => None,
        }
    }

    /// Returns `true` for elements the remote user can interact with.
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            LayoutElement::Button(_) | LayoutElement::TextInput(_) | LayoutElement::BooleanInput(_)
        )
    }

    /// Number of direct children (zero for leaves).
    pub fn child_count(&self) -> usize {
        match self {
            LayoutElement::Container(c) => c.children.len(),
            _ => 0,
        }
    }

    /// Depth-first, pre-order walk over this element and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a LayoutElement)) {
        visit(self);
        if let LayoutElement::Container(c) = self {
            for child in &c.children {
                child.walk(visit);
            }
        }
    }

    /// Serializes the element tree into its wire form after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if an interactive element lacks an id or an id
    /// is duplicated.
    pub fn to_wire(&self, page: &LayoutPageId) -> Result<serde_json::Value, LayoutError> {
        self.validate(page)?;
        serde_json::to_value(self).map_err(|e| LayoutError::Malformed(e.to_string()))
    }

    /// Checks the per-page invariants: every interactive element has a
    /// non-empty id, a label id (when present) is non-empty, and no id is
    /// used twice.
    ///
    /// # Errors
    ///
    /// Returns the first [`LayoutError`] found in depth-first order.
    pub fn validate(&self, page: &LayoutPageId) -> Result<(), LayoutError> {
        let mut seen = HashSet::new();
        let mut result = Ok(());
        self.walk(&mut |element| {
            if result.is_err() {
                return;
            }
            result = check_element(element, page, &mut seen);
        });
        result
    }

    /// Collects `(button id, target page)` for every page-switching button.
    pub(crate) fn switch_targets(&self) -> Vec<(ElementId, LayoutPageId)> {
        let mut targets = Vec::new();
        self.walk(&mut |element| {
            if let LayoutElement::Button(b) = element {
                if let (Some(id), Some(target)) = (&b.id, &b.switch_to_page) {
                    targets.push((id.clone(), target.clone()));
                }
            }
        });
        targets
    }
}

fn check_element(
    element: &LayoutElement,
    page: &LayoutPageId,
    seen: &mut HashSet<ElementId>,
) -> Result<(), LayoutError> {
    match element.id() {
        None if element.is_interactive() => Err(LayoutError::MissingElementId {
            page: page.clone(),
            kind: element.kind(),
        }),
        None => Ok(()),
        Some(id) if id.is_empty() => Err(LayoutError::EmptyElementId {
            page: page.clone(),
            kind: element.kind(),
        }),
        Some(id) => {
            if seen.insert(id.clone()) {
                Ok(())
            } else {
                Err(LayoutError::DuplicateElementId {
                    page: page.clone(),
                    id: id.clone(),
                })
            }
        }
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Container that splits its area evenly between its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerElement {
    pub direction: SplitDirection,
    pub split_evenly: bool,
    pub children: Vec<LayoutElement>,
}

impl Default for ContainerElement {
    fn default() -> Self {
        Self {
            direction: SplitDirection::Vertical,
            split_evenly: true,
            children: Vec::new(),
        }
    }
}

impl ContainerElement {
    /// Evenly split container; `vertical` selects the split direction.
    pub fn evenly_split(vertical: bool) -> Self {
        Self {
            direction: if vertical {
                SplitDirection::Vertical
            } else {
                SplitDirection::Horizontal
            },
            ..Self::default()
        }
    }

    /// Evenly split container stacking children top to bottom.
    pub fn vertical() -> Self {
        Self::evenly_split(true)
    }

    /// Evenly split container placing children left to right.
    pub fn horizontal() -> Self {
        Self::evenly_split(false)
    }

    /// Appends a child and returns the container for chaining.
    pub fn push(mut self, child: impl Into<LayoutElement>) -> Self {
        self.children.push(child.into());
        self
    }
}

/// A push button with a caption ("note").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonElement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    pub note: String,
    /// Page the renderer switches to locally when the button is clicked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_to_page: Option<LayoutPageId>,
}

impl ButtonElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn switch_to_page_on_click(mut self, page: impl Into<LayoutPageId>) -> Self {
        self.switch_to_page = Some(page.into());
        self
    }
}

/// Single-line text input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextInputElement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    pub initial_value: String,
}

impl TextInputElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = value.into();
        self
    }
}

/// Checkbox-style boolean input with a caption.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BooleanInputElement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    pub initial_value: bool,
    pub note: String,
}

impl BooleanInputElement {
    pub fn new(initial_value: bool) -> Self {
        Self {
            initial_value,
            ..Self::default()
        }
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn initial_value(mut self, value: bool) -> Self {
        self.initial_value = value;
        self
    }
}

/// Static text.  Give it an id to be able to change the text later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelElement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    pub text: String,
}

impl LabelElement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    pub fn id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Placeholder occupying one slot of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptySpace;

impl From<ContainerElement> for LayoutElement {
    fn from(e: ContainerElement) -> Self {
        LayoutElement::Container(e)
    }
}

impl From<ButtonElement> for LayoutElement {
    fn from(e: ButtonElement) -> Self {
        LayoutElement::Button(e)
    }
}

impl From<TextInputElement> for LayoutElement {
    fn from(e: TextInputElement) -> Self {
        LayoutElement::TextInput(e)
    }
}

impl From<BooleanInputElement> for LayoutElement {
    fn from(e: BooleanInputElement) -> Self {
        LayoutElement::BooleanInput(e)
    }
}

impl From<LabelElement> for LayoutElement {
    fn from(e: LabelElement) -> Self {
        LayoutElement::Label(e)
    }
}

impl From<EmptySpace> for LayoutElement {
    fn from(_: EmptySpace) -> Self {
        LayoutElement::EmptySpace
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
