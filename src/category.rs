//! Category label normalization for display grouping.

use unicode_segmentation::UnicodeSegmentation;

/// Normalize a free-form category label for grouping.
///
/// The label is trimmed, its first character is upper-cased and the rest is
/// lower-cased, so "GROCERIES", "groceries" and " Groceries " all become
/// "Groceries". Multi-word labels are not title-cased: "Eating Out" becomes
/// "Eating out". An empty label stays empty.
pub fn normalize_category(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut graphemes = trimmed.graphemes(true);

    let Some(first) = graphemes.next() else {
        return String::new();
    };

    let mut normalized = first.to_uppercase();
    normalized.push_str(&graphemes.as_str().to_lowercase());
    normalized
}

#[cfg(test)]
mod tests {
    use super::normalize_category;

    #[test]
    fn capitalizes_first_letter_and_lowers_the_rest() {
        assert_eq!(normalize_category("GROCERIES"), "Groceries");
        assert_eq!(normalize_category("groceries"), "Groceries");
        assert_eq!(normalize_category("gRoCeRiEs"), "Groceries");
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(normalize_category("  rent \t"), "Rent");
    }

    #[test]
    fn multi_word_labels_are_not_title_cased() {
        assert_eq!(normalize_category("Eating Out"), "Eating out");
    }

    #[test]
    fn empty_and_blank_labels_become_empty() {
        assert_eq!(normalize_category(""), "");
        assert_eq!(normalize_category("   "), "");
    }

    #[test]
    fn handles_non_ascii_first_character() {
        assert_eq!(normalize_category("élECTRICITY"), "Électricity");
    }
}
