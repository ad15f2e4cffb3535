//! Text access to a node's integer property.
//!
//! Values are rendered as `"<decimal>\n"` and parsed with the same rules the
//! kernel's `kstrtoint(buf, 10, ..)` applies: an optional sign, digits only,
//! at most one trailing newline, and the result must fit in an `i32`.
//!
//! The property is an `AtomicI32` accessed with relaxed ordering. Readers
//! and writers are not otherwise serialized; a read racing a write sees
//! either the old or the new value, never a torn one.

use crate::domain::model::AccessClass;
use crate::utils::error::{NetnsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::sync::atomic::{AtomicI32, Ordering};

/// Unix-style permission bits for one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMode(pub u16);

impl AttributeMode {
    /// rw-rw-r--
    pub const DEFAULT: AttributeMode = AttributeMode(0o664);

    fn bits_for(self, class: AccessClass) -> u16 {
        match class {
            AccessClass::Owner => (self.0 >> 6) & 0o7,
            AccessClass::Group => (self.0 >> 3) & 0o7,
            AccessClass::Other => self.0 & 0o7,
        }
    }

    pub fn readable_by(self, class: AccessClass) -> bool {
        self.bits_for(class) & 0o4 != 0
    }

    pub fn writable_by(self, class: AccessClass) -> bool {
        self.bits_for(class) & 0o2 != 0
    }
}

impl Default for AttributeMode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for AttributeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    pub mode: AttributeMode,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>, mode: AttributeMode) -> Self {
        Self {
            name: name.into(),
            mode,
        }
    }
}

/// Parses a base-10 signed integer the way `kstrtoint` does.
pub fn parse_decimal(text: &str) -> std::result::Result<i32, ParseIntError> {
    let digits = text.strip_suffix('\n').unwrap_or(text);
    digits.parse::<i32>()
}

#[derive(Debug, Default)]
pub struct IntProperty {
    value: AtomicI32,
}

impl IntProperty {
    pub fn new(value: i32) -> Self {
        Self {
            value: AtomicI32::new(value),
        }
    }

    pub fn get(&self) -> i32 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn show(&self) -> String {
        format!("{}\n", self.get())
    }

    /// Replaces the value and reports the number of bytes consumed, which is
    /// always the whole input. On a parse error the value is left alone.
    pub fn store(&self, attribute: &str, text: &str) -> Result<usize> {
        let value = parse_decimal(text).map_err(|source| NetnsError::ParseError {
            attribute: attribute.to_string(),
            input: text.to_string(),
            source,
        })?;
        self.value.store(value, Ordering::Relaxed);
        Ok(text.len())
    }
}
