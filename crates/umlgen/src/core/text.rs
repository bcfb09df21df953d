//! Shared text utilities for diagram processing
//!
//! Identifier case conversion and type-token normalisation used by the
//! parsers, the model builder and every code emitter.

/// Split an identifier or phrase into words.
///
/// Breaks on any non-alphanumeric character and on lower-to-upper case
/// boundaries, keeping acronyms together.
///
/// # Example
/// ```
/// use umlgen::core::split_words;
///
/// assert_eq!(split_words("LINE-ITEM"), vec!["LINE", "ITEM"]);
/// assert_eq!(split_words("orderLineHTTPStatus"), vec!["order", "Line", "HTTP", "Status"]);
/// ```
pub fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    for (idx, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let next_is_lower = chars.get(idx + 1).is_some_and(|n| n.is_lowercase());
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_uppercase() && c.is_uppercase() && next_is_lower)
                || (prev.is_ascii_digit() && c.is_alphabetic() && c.is_uppercase());
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `line-item` -> `LineItem`
pub fn pascal_case(text: &str) -> String {
    split_words(text).iter().map(|w| capitalize(w)).collect()
}

/// `Submit Order` -> `submitOrder`
pub fn camel_case(text: &str) -> String {
    let mut out = String::new();
    for (idx, word) in split_words(text).iter().enumerate() {
        if idx == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// `OrderLine` -> `order_line`
pub fn snake_case(text: &str) -> String {
    split_words(text)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// `inReview` -> `IN_REVIEW`
pub fn screaming_snake_case(text: &str) -> String {
    split_words(text)
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// `OrderLine` -> `order-line`
pub fn kebab_case(text: &str) -> String {
    split_words(text)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Naive English plural of the last word
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with('y')
        && !matches!(
            lower.chars().rev().nth(1),
            Some('a' | 'e' | 'i' | 'o' | 'u')
        )
    {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

/// Rewrite Mermaid `~` generics to angle brackets: `List~Order~` -> `List<Order>`.
///
/// A tilde between two identifier characters opens a generic, any other
/// tilde closes one.
pub fn normalize_generics(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (idx, &c) in chars.iter().enumerate() {
        if c != '~' {
            out.push(c);
            continue;
        }
        let after_ident = idx > 0 && is_ident_char(chars[idx - 1]);
        let before_ident = chars.get(idx + 1).is_some_and(|n| is_ident_char(*n));
        out.push(if after_ident && before_ident { '<' } else { '>' });
    }
    out
}

/// Whether a character may appear in an identifier
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("CUSTOMER"), "Customer");
        assert_eq!(pascal_case("LINE-ITEM"), "LineItem");
        assert_eq!(pascal_case("order_line"), "OrderLine");
        assert_eq!(pascal_case("OrderLine"), "OrderLine");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("submit order"), "submitOrder");
        assert_eq!(camel_case("Publish"), "publish");
        assert_eq!(camel_case("first_name"), "firstName");
        assert_eq!(camel_case("approve()"), "approve");
    }

    #[test]
    fn test_snake_and_screaming() {
        assert_eq!(snake_case("OrderLine"), "order_line");
        assert_eq!(snake_case("createdAt"), "created_at");
        assert_eq!(screaming_snake_case("InReview"), "IN_REVIEW");
        assert_eq!(screaming_snake_case("DRAFT"), "DRAFT");
        assert_eq!(kebab_case("OrderLine"), "order-line");
    }

    #[test]
    fn test_acronyms_stay_together() {
        assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(snake_case("userID"), "user_id");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("order"), "orders");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("box"), "boxes");
    }

    #[test]
    fn test_normalize_generics() {
        assert_eq!(normalize_generics("List~Order~"), "List<Order>");
        assert_eq!(normalize_generics("List~List~int~~"), "List<List<int>>");
        assert_eq!(normalize_generics("Map~String, Integer~ totals"), "Map<String, Integer> totals");
        assert_eq!(normalize_generics("String"), "String");
    }
}
