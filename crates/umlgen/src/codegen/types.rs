//! Classification of diagram type tokens
//!
//! Diagrams use loose, language-neutral type names (`String`, `int`,
//! `decimal`, `List~Order~`). Each emitter maps the classified token to its
//! own type names.

use crate::core::collection_element;

/// A diagram type token, classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeToken<'a> {
    Text,
    Integer,
    Long,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Uuid,
    Void,
    /// A collection of the inner token
    Collection(&'a str),
    /// A class, enum or unknown type name, passed through
    Named(&'a str),
}

impl<'a> TypeToken<'a> {
    /// Classify a type token; a trailing `?` is ignored
    ///
    /// # Example
    /// ```
    /// use umlgen::codegen::TypeToken;
    ///
    /// assert_eq!(TypeToken::classify("varchar"), TypeToken::Text);
    /// assert_eq!(TypeToken::classify("List<Order>"), TypeToken::Collection("Order"));
    /// assert_eq!(TypeToken::classify("Money"), TypeToken::Named("Money"));
    /// ```
    pub fn classify(token: &'a str) -> Self {
        let token = token.trim().trim_end_matches('?');
        if let Some(inner) = collection_element(token) {
            return TypeToken::Collection(inner);
        }
        match token.to_ascii_lowercase().as_str() {
            "string" | "str" | "text" | "varchar" | "char" | "character" | "email" => {
                TypeToken::Text
            }
            "int" | "integer" | "short" | "int32" | "smallint" => TypeToken::Integer,
            "long" | "bigint" | "int64" => TypeToken::Long,
            "float" | "double" | "real" | "number" => TypeToken::Float,
            "decimal" | "bigdecimal" | "money" | "numeric" | "currency" => TypeToken::Decimal,
            "bool" | "boolean" => TypeToken::Boolean,
            "date" | "localdate" => TypeToken::Date,
            "datetime" | "timestamp" | "localdatetime" | "instant" | "time" => {
                TypeToken::DateTime
            }
            "uuid" | "guid" => TypeToken::Uuid,
            "void" | "none" | "" => TypeToken::Void,
            _ => TypeToken::Named(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_primitives() {
        assert_eq!(TypeToken::classify("String"), TypeToken::Text);
        assert_eq!(TypeToken::classify("int"), TypeToken::Integer);
        assert_eq!(TypeToken::classify("Float"), TypeToken::Float);
        assert_eq!(TypeToken::classify("BigDecimal"), TypeToken::Decimal);
        assert_eq!(TypeToken::classify("timestamp"), TypeToken::DateTime);
        assert_eq!(TypeToken::classify("String?"), TypeToken::Text);
        assert_eq!(TypeToken::classify("void"), TypeToken::Void);
    }

    #[test]
    fn test_classify_collections_and_names() {
        assert_eq!(TypeToken::classify("Order[]"), TypeToken::Collection("Order"));
        assert_eq!(TypeToken::classify("Set<Tag>"), TypeToken::Collection("Tag"));
        assert_eq!(TypeToken::classify("OrderStatus"), TypeToken::Named("OrderStatus"));
    }
}
