//! Diagnostic codes: a category letter plus a three-digit number.
//!
//! Each category owns one hundred block, so the number alone identifies the
//! family of a code:
//!
//! | Block | Category | Emitted by |
//! |---|---|---|
//! | `E1xx` | [`Category::Structure`] | graph validation |
//! | `W2xx` | [`Category::Cleanup`] | the cleanup driver |
//! | `O3xx` | [`Category::Summary`] | the end-of-run report |

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the toolchain a code belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// The input graph is malformed.
    Structure,
    /// The cleanup loop or its configuration needs attention.
    Cleanup,
    /// What an optimize run did.
    Summary,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Structure => 'E',
            Category::Cleanup => 'W',
            Category::Summary => 'O',
        }
    }

    /// Severity of every diagnostic in this category.
    pub fn severity(self) -> Severity {
        match self {
            Category::Structure => Severity::Error,
            Category::Cleanup => Severity::Warning,
            Category::Summary => Severity::Note,
        }
    }

    const fn block(self) -> u16 {
        match self {
            Category::Structure => 1,
            Category::Cleanup => 2,
            Category::Summary => 3,
        }
    }
}

/// A structured diagnostic code, displayed as e.g. `E101` or `W202`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The number, inside the category's hundred block.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a diagnostic code.
    ///
    /// # Panics
    ///
    /// If `number` is outside the category's block. For codes declared as
    /// `const` this is a compile-time error.
    pub const fn new(category: Category, number: u16) -> Self {
        assert!(
            number / 100 == category.block(),
            "diagnostic number outside its category's block"
        );
        Self { category, number }
    }

    /// Severity of diagnostics carrying this code.
    pub fn severity(self) -> Severity {
        self.category.severity()
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
