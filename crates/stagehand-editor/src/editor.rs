//! Building editors and moving values in and out of them.
//!
//! None of these functions fail loudly. An unsupported kind or a widget that
//! does not fit the value logs a warning and leaves everything untouched;
//! [`get_value`] then hands back the caller's default.

use crate::value::{EditorValue, ValueKind};
use crate::widget::{
    AttributeInfo, EditorRow, EditorWidget, LineEdit, ATTR_HEIGHT, ATTR_NAME_WIDTH, STRUCK_OUT,
};

/// Build an editor row for `info`.
///
/// Returns `None` (with a warning) for kinds that have no editor.
pub fn create_editor(info: &AttributeInfo, index: u32, sub_index: u32) -> Option<EditorRow> {
    let widget = match info.kind {
        ValueKind::Bool => EditorWidget::CheckBox {
            name: info.name.clone(),
            checked: false,
        },
        ValueKind::Text => EditorWidget::LineEdit(LineEdit::new(&info.name)),
        ValueKind::Int if info.enum_names.is_some() => EditorWidget::DropDown {
            name: info.name.clone(),
            items: info.enum_names.clone().unwrap_or_default(),
            selection: None,
            placeholder: STRUCK_OUT.to_owned(),
        },
        kind => match kind.coordinate_count() {
            Some(count) => EditorWidget::Fields {
                name: info.name.clone(),
                fields: (0..count)
                    .map(|i| LineEdit {
                        coordinate: Some(i),
                        ..LineEdit::new(format!("{}_{i}", info.name))
                    })
                    .collect(),
            },
            None => {
                tracing::warn!(attribute = %info.name, ?kind, "failed creating an attribute editor");
                return None;
            }
        },
    };

    Some(EditorRow {
        name: format!("Edit{index}_{sub_index}"),
        label: info.name.clone(),
        index,
        sub_index,
        height: ATTR_HEIGHT,
        label_width: ATTR_NAME_WIDTH,
        widget,
    })
}

/// Show `value` in `widget`.
///
/// The widget is left unchanged if it cannot display a value of this kind.
pub fn set_value(widget: &mut EditorWidget, value: &EditorValue) {
    match (value, widget) {
        (EditorValue::Bool(v), EditorWidget::CheckBox { checked, .. }) => *checked = *v,
        (EditorValue::Text(v), EditorWidget::LineEdit(edit)) => edit.text = v.clone(),
        (EditorValue::Int(v), EditorWidget::DropDown { name, items, selection, .. }) => {
            match usize::try_from(*v).ok().filter(|i| *i < items.len()) {
                Some(i) => *selection = Some(i),
                None => tracing::warn!(
                    widget = %name,
                    value = v,
                    choices = items.len(),
                    "selection out of range"
                ),
            }
        }
        (value, EditorWidget::Fields { name, fields }) if value.kind().is_numeric() => {
            let Some(texts) = value.coordinates() else {
                return;
            };
            if texts.len() != fields.len() {
                tracing::warn!(
                    widget = %name,
                    kind = ?value.kind(),
                    expected = texts.len(),
                    found = fields.len(),
                    "failed filling in number value: coordinate count mismatch"
                );
                return;
            }
            for (field, text) in fields.iter_mut().zip(texts) {
                field.text = text;
            }
        }
        (value, widget) => tracing::warn!(
            widget = widget.name(),
            widget_type = widget.type_name(),
            kind = ?value.kind(),
            "failed filling in value"
        ),
    }
}

/// Read a value of `default`'s kind back out of `widget`.
///
/// Returns a clone of `default` if the widget does not hold that kind or its
/// text does not parse.
pub fn get_value(default: &EditorValue, widget: &EditorWidget) -> EditorValue {
    match (default, widget) {
        (EditorValue::Bool(_), EditorWidget::CheckBox { checked, .. }) => EditorValue::Bool(*checked),
        (EditorValue::Text(_), EditorWidget::LineEdit(edit)) => EditorValue::Text(edit.text.clone()),
        (EditorValue::Int(_), EditorWidget::DropDown { name, selection, .. }) => {
            match selection.and_then(|i| i32::try_from(i).ok()) {
                Some(i) => EditorValue::Int(i),
                None => {
                    tracing::warn!(widget = %name, "no selection to read");
                    default.clone()
                }
            }
        }
        (default, EditorWidget::Fields { name, fields }) if default.kind().is_numeric() => {
            let texts: Vec<&str> = fields.iter().map(|f| f.text.as_str()).collect();
            match EditorValue::from_coordinates(default.kind(), &texts) {
                Some(value) => value,
                None => {
                    tracing::warn!(
                        widget = %name,
                        kind = ?default.kind(),
                        text = %texts.join(" "),
                        "failed acquiring number value"
                    );
                    default.clone()
                }
            }
        }
        (default, widget) => {
            tracing::warn!(
                widget = widget.name(),
                widget_type = widget.type_name(),
                kind = ?default.kind(),
                "unsupported value kind for widget"
            );
            default.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
