//! Stagehand Editor -- headless attribute editors for inspector panels.
//!
//! Each attribute of an object gets one [`EditorRow`](widget::EditorRow): a
//! fixed-size label plus a control picked from the attribute's
//! [`ValueKind`](value::ValueKind). Booleans use a check box, text a line
//! edit, enumerated integers a drop-down list, and every other numeric kind
//! one line edit per coordinate.
//!
//! Values move in with [`set_value`](editor::set_value) and out with
//! [`get_value`](editor::get_value). Mismatches are logged and ignored.
//!
//! # Example
//!
//! ```
//! use stagehand_editor::prelude::*;
//!
//! let mut row = create_editor(&AttributeInfo::new("Position", ValueKind::Vector2), 0, 0)
//!     .expect("vectors are editable");
//! set_value(&mut row.widget, &EditorValue::Vector2([3.0, 4.0]));
//!
//! let read = get_value(&EditorValue::Vector2([0.0, 0.0]), &row.widget);
//! assert_eq!(read, EditorValue::Vector2([3.0, 4.0]));
//! ```

#![deny(unsafe_code)]

pub mod editor;
pub mod value;
pub mod widget;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::editor::{create_editor, get_value, set_value};
    pub use crate::value::{EditorValue, ValueKind};
    pub use crate::widget::{
        AttributeInfo, EditorRow, EditorWidget, LineEdit, ATTR_HEIGHT, ATTR_NAME_WIDTH, STRUCK_OUT,
    };
}
