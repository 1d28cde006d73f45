//! Text field sanitization for the semicolon-separated tables

use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

/// Cleans a text field and wraps it in quotes
///
/// Non-printable characters are removed along with newlines, tabs, carriage
/// returns and non-breaking spaces. Embedded quotes are doubled. Returns
/// `None` when nothing is left, so callers emit a null marker instead of
/// an empty quoted string.
pub fn sanitize_text(text: &str) -> Option<String> {
    let cleaned: String = text.chars().filter(|&c| is_printable(c)).collect();
    if cleaned.is_empty() {
        return None;
    }
    Some(format!("\"{}\"", cleaned.replace('"', "\"\"")))
}

/// Everything outside the Other and Separator groups, plus the plain space
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(
        c.general_category_group(),
        GeneralCategoryGroup::Other | GeneralCategoryGroup::Separator
    )
}
