//! Headless widget tree for attribute editors.
//!
//! A host UI toolkit renders these however it likes. The model only tracks
//! what an editor needs to round-trip a value: which control is used and its
//! current text, check state, or selection.

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

/// Fixed row height of an attribute editor, in pixels.
pub const ATTR_HEIGHT: u32 = 19;
/// Fixed width of the attribute name label, in pixels.
pub const ATTR_NAME_WIDTH: u32 = 320;
/// Placeholder shown by a drop-down list with no selection.
pub const STRUCK_OUT: &str = "——";

/// Describes one attribute to build an editor for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    pub kind: ValueKind,
    /// Choice labels for an enumerated integer. Ignored for other kinds.
    pub enum_names: Option<Vec<String>>,
}

impl AttributeInfo {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enum_names: None,
        }
    }

    /// An integer attribute edited by picking one of `names`.
    pub fn enumerated<S: Into<String>>(name: impl Into<String>, names: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            kind: ValueKind::Int,
            enum_names: Some(names.into_iter().map(Into::into).collect()),
        }
    }
}

/// A single-line text field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineEdit {
    pub name: String,
    pub text: String,
    /// Which coordinate of a numeric value this field edits.
    pub coordinate: Option<usize>,
}

impl LineEdit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            coordinate: None,
        }
    }
}

/// The control inside an editor row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorWidget {
    CheckBox {
        name: String,
        checked: bool,
    },
    LineEdit(LineEdit),
    DropDown {
        name: String,
        items: Vec<String>,
        selection: Option<usize>,
        placeholder: String,
    },
    /// One [`LineEdit`] per coordinate, named `"{name}_{i}"`.
    Fields {
        name: String,
        fields: Vec<LineEdit>,
    },
}

impl EditorWidget {
    pub fn name(&self) -> &str {
        match self {
            EditorWidget::CheckBox { name, .. }
            | EditorWidget::DropDown { name, .. }
            | EditorWidget::Fields { name, .. } => name,
            EditorWidget::LineEdit(edit) => &edit.name,
        }
    }

    /// Short control type name, for logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            EditorWidget::CheckBox { .. } => "CheckBox",
            EditorWidget::LineEdit(_) => "LineEdit",
            EditorWidget::DropDown { .. } => "DropDownList",
            EditorWidget::Fields { .. } => "Fields",
        }
    }
}

/// A labelled editor row: name label on the left, control on the right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorRow {
    /// `"Edit{index}_{sub_index}"`.
    pub name: String,
    pub label: String,
    pub index: u32,
    pub sub_index: u32,
    pub height: u32,
    pub label_width: u32,
    pub widget: EditorWidget,
}
