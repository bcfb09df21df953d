//! Multiplicity labels and relationship cardinality

use serde::Serialize;

/// One end of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    One,
    Many,
}

impl Multiplicity {
    /// Read a multiplicity label.
    ///
    /// Missing labels, `1`, `0..1` and `1..1` are one; `*`, `n`, `many`,
    /// any `..*` range or an upper bound above one is many.
    ///
    /// # Example
    /// ```
    /// use umlgen::model::Multiplicity;
    ///
    /// assert_eq!(Multiplicity::parse(Some("1..*")), Multiplicity::Many);
    /// assert_eq!(Multiplicity::parse(Some("0..1")), Multiplicity::One);
    /// assert_eq!(Multiplicity::parse(None), Multiplicity::One);
    /// ```
    pub fn parse(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return Multiplicity::One;
        };
        let lower = label.trim().trim_matches('"').trim().to_lowercase();
        let upper = match lower.rsplit_once("..") {
            Some((_, upper)) => upper.trim(),
            None => lower.as_str(),
        };
        match upper {
            "" | "1" | "0" | "one" => Multiplicity::One,
            "*" | "n" | "m" | "many" => Multiplicity::Many,
            _ if upper.ends_with('*') => Multiplicity::Many,
            _ => match upper.parse::<u32>() {
                Ok(bound) if bound > 1 => Multiplicity::Many,
                _ => Multiplicity::One,
            },
        }
    }
}

/// Relationship cardinality seen from one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// Cardinality from the source side, given the multiplicity written at
    /// each end (`source "1" -- "*" target` is one-to-many)
    pub fn from_ends(source: Multiplicity, target: Multiplicity) -> Self {
        match (source, target) {
            (Multiplicity::One, Multiplicity::One) => Cardinality::OneToOne,
            (Multiplicity::One, Multiplicity::Many) => Cardinality::OneToMany,
            (Multiplicity::Many, Multiplicity::One) => Cardinality::ManyToOne,
            (Multiplicity::Many, Multiplicity::Many) => Cardinality::ManyToMany,
        }
    }

    /// The same relationship seen from the other side
    pub fn inverse(self) -> Self {
        match self {
            Cardinality::OneToMany => Cardinality::ManyToOne,
            Cardinality::ManyToOne => Cardinality::OneToMany,
            other => other,
        }
    }

    /// Whether this side holds a collection of the other
    pub fn is_collection(self) -> bool {
        matches!(self, Cardinality::OneToMany | Cardinality::ManyToMany)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToOne => "many-to-one",
            Cardinality::ManyToMany => "many-to-many",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
