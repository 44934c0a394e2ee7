//! Editable values and their kinds.
//!
//! Numeric kinds are edited one coordinate per text field. A quaternion is
//! the exception: it is shown as three Euler angles in degrees and converted
//! back on read.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ValueKind
// ---------------------------------------------------------------------------

/// The kind of an [`EditorValue`], used to pick an editor widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    Vector2,
    Vector3,
    Vector4,
    Quaternion,
    Color,
    IntVector2,
    IntRect,
    /// Raw bytes. No editor exists for this kind.
    Buffer,
}

impl ValueKind {
    /// Number of text fields used to edit a numeric kind, `None` otherwise.
    pub fn coordinate_count(self) -> Option<usize> {
        match self {
            ValueKind::Int | ValueKind::Float => Some(1),
            ValueKind::Vector2 | ValueKind::IntVector2 => Some(2),
            ValueKind::Vector3 | ValueKind::Quaternion => Some(3),
            ValueKind::Vector4 | ValueKind::Color | ValueKind::IntRect => Some(4),
            ValueKind::Bool | ValueKind::Text | ValueKind::Buffer => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.coordinate_count().is_some()
    }
}

// ---------------------------------------------------------------------------
// EditorValue
// ---------------------------------------------------------------------------

/// A value that can be shown in and read back from an editor widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Text(String),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    Vector4([f32; 4]),
    /// Rotation as `[w, x, y, z]`.
    Quaternion([f32; 4]),
    /// `[r, g, b, a]`.
    Color([f32; 4]),
    IntVector2([i32; 2]),
    /// `[left, top, right, bottom]`.
    IntRect([i32; 4]),
    Buffer(Vec<u8>),
}

impl EditorValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            EditorValue::Bool(_) => ValueKind::Bool,
            EditorValue::Int(_) => ValueKind::Int,
            EditorValue::Float(_) => ValueKind::Float,
            EditorValue::Text(_) => ValueKind::Text,
            EditorValue::Vector2(_) => ValueKind::Vector2,
            EditorValue::Vector3(_) => ValueKind::Vector3,
            EditorValue::Vector4(_) => ValueKind::Vector4,
            EditorValue::Quaternion(_) => ValueKind::Quaternion,
            EditorValue::Color(_) => ValueKind::Color,
            EditorValue::IntVector2(_) => ValueKind::IntVector2,
            EditorValue::IntRect(_) => ValueKind::IntRect,
            EditorValue::Buffer(_) => ValueKind::Buffer,
        }
    }

    /// Text for each coordinate field, or `None` for non-numeric values.
    pub fn coordinates(&self) -> Option<Vec<String>> {
        fn texts<T: ToString>(values: &[T]) -> Vec<String> {
            values.iter().map(ToString::to_string).collect()
        }
        let out = match self {
            EditorValue::Int(v) => vec![v.to_string()],
            EditorValue::Float(v) => vec![v.to_string()],
            EditorValue::Vector2(v) => texts(v),
            EditorValue::Vector3(v) => texts(v),
            EditorValue::Vector4(v) | EditorValue::Color(v) => texts(v),
            EditorValue::Quaternion(q) => texts(&quaternion_to_euler(*q)),
            EditorValue::IntVector2(v) => texts(v),
            EditorValue::IntRect(v) => texts(v),
            EditorValue::Bool(_) | EditorValue::Text(_) | EditorValue::Buffer(_) => return None,
        };
        Some(out)
    }

    /// Parse coordinate field texts into a value of `kind`.
    ///
    /// Returns `None` if `kind` is not numeric, the field count is wrong, or
    /// any field fails to parse.
    pub fn from_coordinates(kind: ValueKind, fields: &[&str]) -> Option<Self> {
        if kind.coordinate_count()? != fields.len() {
            return None;
        }
        let value = match kind {
            ValueKind::Int => EditorValue::Int(parse_all::<i32, 1>(fields)?[0]),
            ValueKind::Float => EditorValue::Float(parse_all::<f32, 1>(fields)?[0]),
            ValueKind::Vector2 => EditorValue::Vector2(parse_all(fields)?),
            ValueKind::Vector3 => EditorValue::Vector3(parse_all(fields)?),
            ValueKind::Vector4 => EditorValue::Vector4(parse_all(fields)?),
            ValueKind::Quaternion => EditorValue::Quaternion(euler_to_quaternion(parse_all(fields)?)),
            ValueKind::Color => EditorValue::Color(parse_all(fields)?),
            ValueKind::IntVector2 => EditorValue::IntVector2(parse_all(fields)?),
            ValueKind::IntRect => EditorValue::IntRect(parse_all(fields)?),
            ValueKind::Bool | ValueKind::Text | ValueKind::Buffer => return None,
        };
        Some(value)
    }
}

fn parse_all<T: std::str::FromStr + Copy + Default, const N: usize>(fields: &[&str]) -> Option<[T; N]> {
    if fields.len() != N {
        return None;
    }
    let mut out = [T::default(); N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = field.trim().parse().ok()?;
    }
    Some(out)
}

// ---------------------------------------------------------------------------
// Euler conversion
// ---------------------------------------------------------------------------

/// `[w, x, y, z]` from Euler angles in degrees, applied in Y-X-Z order.
pub fn euler_to_quaternion([x, y, z]: [f32; 3]) -> [f32; 4] {
    let half = std::f32::consts::PI / 360.0;
    let (sx, cx) = (x * half).sin_cos();
    let (sy, cy) = (y * half).sin_cos();
    let (sz, cz) = (z * half).sin_cos();
    [
        cy * cx * cz + sy * sx * sz,
        cy * sx * cz + sy * cx * sz,
        sy * cx * cz - cy * sx * sz,
        cy * cx * sz - sy * sx * cz,
    ]
}

/// Euler angles in degrees from `[w, x, y, z]`. Inverse of
/// [`euler_to_quaternion`] away from the +/-90 degree pitch singularity.
pub fn quaternion_to_euler([w, x, y, z]: [f32; 4]) -> [f32; 3] {
    let deg = 180.0 / std::f32::consts::PI;
    let check = 2.0 * (-y * z + w * x);
    if check < -0.995 {
        [-90.0, 0.0, -(2.0 * (x * z - w * y)).atan2(1.0 - 2.0 * (y * y + z * z)) * deg]
    } else if check > 0.995 {
        [90.0, 0.0, (2.0 * (x * z - w * y)).atan2(1.0 - 2.0 * (y * y + z * z)) * deg]
    } else {
        [
            check.asin() * deg,
            (2.0 * (x * z + w * y)).atan2(1.0 - 2.0 * (x * x + y * y)) * deg,
            (2.0 * (x * y + w * z)).atan2(1.0 - 2.0 * (x * x + z * z)) * deg,
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
