//! Text helpers shared by extractors

use scraper::ElementRef;

/// Collapses every run of whitespace into a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the element's text with whitespace collapsed
pub fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Joins the element's non-empty text nodes with a separator
///
/// `<td>460 <br/> 230</td>` joined with `", "` gives `"460, 230"`.
pub fn joined_text(element: &ElementRef, separator: &str) -> String {
    element
        .text()
        .map(collapse_whitespace)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Normalizes a displayed price into a plain decimal string
///
/// Thousands separators and whitespace are dropped and the first number is
/// kept: `"$1,234.50 USD"` becomes `"1234.50"` and a range such as
/// `"$100 - $200"` yields its lower bound `"100"`. Returns `None` when the text
/// holds no digit.
pub fn normalize_price(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let start = compact.find(|c: char| c.is_ascii_digit())?;
    let number: String = compact[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let number = number.trim_end_matches('.');
    if number.is_empty() {
        None
    } else {
        Some(number.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  AC \n  Motors\t"), "AC Motors");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_joined_text() {
        let html = Html::parse_fragment("<span class=\"value\">460 <br/> 230 <b> 115 </b></span>");
        let selector = Selector::parse("span.value").unwrap();
        let element = html.select(&selector).next().unwrap();

        assert_eq!(joined_text(&element, ", "), "460, 230, 115");
        assert_eq!(element_text(&element), "460 230 115");
    }

    #[test]
    fn test_normalize_price() {
        assert_eq!(normalize_price("$1,234.50 USD"), Some("1234.50".to_string()));
        assert_eq!(normalize_price("  $87 "), Some("87".to_string()));
        assert_eq!(normalize_price("$ 87.50"), Some("87.50".to_string()));
        assert_eq!(normalize_price("$100 - $200"), Some("100".to_string()));
        assert_eq!(normalize_price("From $1,500. Call us"), Some("1500".to_string()));
        assert_eq!(normalize_price("Call for price"), None);
        assert_eq!(normalize_price(""), None);
    }
}
