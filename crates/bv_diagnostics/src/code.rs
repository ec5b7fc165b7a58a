//! Diagnostic codes with a category prefix for structured error identification.

use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
///
/// This elaborator only ever raises errors, with no warning-level
/// diagnostic: the category exists to keep the code format extensible, but
/// `Error` is the only variant in use — there is no `Warning`/`Convention`/
/// `Timing`/`Vendor` category to classify, since this domain emits none of
/// those.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g., `E101`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefix() {
        assert_eq!(Category::Error.prefix(), 'E');
    }

    #[test]
    fn display_format() {
        let code = DiagnosticCode::new(Category::Error, 101);
        assert_eq!(format!("{code}"), "E101");

        let code = DiagnosticCode::new(Category::Error, 3);
        assert_eq!(format!("{code}"), "E003");
    }
}
