//! Dialect-agnostic node and edge types produced by the diagram parsers

use serde::Serialize;

use super::text::{camel_case, is_ident_char, normalize_generics};

/// Member visibility marker (`+`, `-`, `#`, `~`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
    Package,
}

impl Visibility {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Visibility::Public),
            '-' => Some(Visibility::Private),
            '#' => Some(Visibility::Protected),
            '~' => Some(Visibility::Package),
            _ => None,
        }
    }
}

/// A declared attribute of a class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeNode {
    pub name: String,
    /// Unresolved type token, e.g. `String`, `List<Order>`, `decimal`
    pub type_name: String,
    pub visibility: Visibility,
    pub nullable: bool,
    pub unique: bool,
    pub identifier: bool,
    pub is_relationship: bool,
    /// Target class when `is_relationship` is set
    pub target: Option<String>,
    /// Relationship role name (the attribute name) when `is_relationship` is set
    pub role: Option<String>,
    pub line: usize,
}

impl AttributeNode {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            visibility: Visibility::Public,
            nullable: false,
            unique: false,
            identifier: false,
            is_relationship: false,
            target: None,
            role: None,
            line: 0,
        }
    }

    /// Whether the declared type holds many values (`List<T>`, `Set<T>`, `T[]`, ...)
    pub fn is_collection(&self) -> bool {
        collection_element(&self.type_name).is_some()
    }

    /// Element type for collections, the type itself otherwise
    pub fn element_type(&self) -> &str {
        collection_element(&self.type_name).unwrap_or(self.type_name.as_str())
    }
}

/// Element type of a collection type token, if the token is one
pub fn collection_element(type_name: &str) -> Option<&str> {
    let trimmed = type_name.trim();
    if let Some(inner) = trimmed.strip_suffix("[]") {
        return Some(inner.trim());
    }
    let open = trimmed.find('<')?;
    let outer = trimmed[..open].trim();
    let is_collection = matches!(
        outer.to_ascii_lowercase().as_str(),
        "list" | "set" | "collection" | "iterable" | "array" | "vec" | "ilist" | "icollection"
            | "ienumerable" | "hashset"
    );
    if !is_collection {
        return None;
    }
    trimmed[open + 1..].strip_suffix('>').map(str::trim)
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// Parse a comma-separated parameter list.
    ///
    /// Accepts `Type name`, `name: Type` and bare `name` (typed `Object`).
    pub fn parse_list(text: &str) -> Vec<Parameter> {
        let normalized = normalize_generics(text);
        split_top_level(&normalized, ',')
            .into_iter()
            .filter_map(|raw| Self::parse_one(raw.trim()))
            .collect()
    }

    fn parse_one(raw: &str) -> Option<Parameter> {
        if raw.is_empty() {
            return None;
        }
        if let Some((name, ty)) = raw.split_once(':') {
            let name = name.trim();
            let ty = ty.trim();
            if !name.is_empty() && !ty.is_empty() {
                return Some(Parameter::new(name, ty));
            }
        }
        match raw.rfind(char::is_whitespace) {
            Some(pos) => {
                let ty = raw[..pos].trim();
                let name = raw[pos..].trim();
                Some(Parameter::new(name, ty))
            }
            None => Some(Parameter::new(raw, "Object")),
        }
    }
}

/// Split on `separator` ignoring separators nested in `<>`, `()` or `[]`
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth -= 1,
            c if c == separator && depth <= 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// A declared or derived method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodNode {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub visibility: Visibility,
    pub is_abstract: bool,
    pub is_static: bool,
    /// Free-text business logic hints, never executed
    pub logic: Vec<String>,
    pub line: usize,
}

impl MethodNode {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            parameters: Vec::new(),
            visibility: Visibility::Public,
            is_abstract: false,
            is_static: false,
            logic: Vec::new(),
            line: 0,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Build the method named by a message or step text invoked on `owner`.
    ///
    /// `reserve(items)` keeps its name and arguments; free prose such as
    /// `check stock` is camel-cased into `checkStock`.
    pub fn from_invocation(text: &str, owner: &str) -> Option<MethodNode> {
        let text = text.trim();
        let (name, parameters) = match (text.find('('), text.rfind(')')) {
            (Some(open), Some(close)) if close > open => {
                let head = text[..open].trim();
                let name = if head.chars().all(is_ident_char) {
                    head.to_string()
                } else {
                    camel_case(head)
                };
                (name, Parameter::parse_list(&text[open + 1..close]))
            }
            _ if text.chars().all(is_ident_char) => (text.to_string(), Vec::new()),
            _ => (camel_case(text), Vec::new()),
        };
        if name.is_empty() {
            return None;
        }
        let return_type = infer_return_type(&name, owner);
        Some(MethodNode::new(name, return_type).with_parameters(parameters))
    }
}

/// Return type implied by a method name.
///
/// `create*`/`save*`/`update*` return the owner, `find*`/`get*` return the
/// owner or a list of it when the name mentions `all`, anything else `void`.
pub fn infer_return_type(method: &str, owner: &str) -> String {
    let lower = method.to_lowercase();
    if ["create", "save", "update"].iter().any(|p| lower.starts_with(p)) {
        owner.to_string()
    } else if lower.starts_with("find") || lower.starts_with("get") {
        if lower.contains("all") {
            format!("List<{}>", owner)
        } else {
            owner.to_string()
        }
    } else {
        "void".to_string()
    }
}

/// A class (or interface, or enumeration) declared in a diagram
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClassNode {
    pub name: String,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub is_enumeration: bool,
    pub attributes: Vec<AttributeNode>,
    pub methods: Vec<MethodNode>,
    /// Literal names for enumerations
    pub literals: Vec<String>,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub line: usize,
}

impl ClassNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeNode> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Apply a `<<stereotype>>` marker, returning false for unknown ones
    pub fn apply_stereotype(&mut self, stereotype: &str) -> bool {
        match stereotype.trim().to_ascii_lowercase().as_str() {
            "abstract" => self.is_abstract = true,
            "interface" => self.is_interface = true,
            "enumeration" | "enum" => self.is_enumeration = true,
            _ => return false,
        }
        true
    }

    /// Fold a later declaration of the same class into this one
    pub fn absorb(&mut self, other: ClassNode) {
        self.is_abstract |= other.is_abstract;
        self.is_interface |= other.is_interface;
        self.is_enumeration |= other.is_enumeration;
        for attribute in other.attributes {
            if self.attribute(&attribute.name).is_none() {
                self.attributes.push(attribute);
            }
        }
        for method in other.methods {
            if !self.methods.iter().any(|m| m.name == method.name) {
                self.methods.push(method);
            }
        }
        for literal in other.literals {
            if !self.literals.contains(&literal) {
                self.literals.push(literal);
            }
        }
        if self.superclass.is_none() {
            self.superclass = other.superclass;
        }
        for interface in other.interfaces {
            if !self.interfaces.contains(&interface) {
                self.interfaces.push(interface);
            }
        }
    }
}

/// Structural kind of an association between two classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Association,
    Aggregation,
    Composition,
}

/// A relationship line between two classes.
///
/// `source` is the arrow tail (or the whole, for aggregation and composition).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipEdge {
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
    pub source_multiplicity: Option<String>,
    pub target_multiplicity: Option<String>,
    pub cascade_delete: bool,
    pub label: Option<String>,
    pub line: usize,
}

impl RelationshipEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            source_multiplicity: None,
            target_multiplicity: None,
            cascade_delete: kind == RelationshipKind::Composition,
            label: None,
            line: 0,
        }
    }

    pub fn with_multiplicities(mut self, source: Option<String>, target: Option<String>) -> Self {
        self.source_multiplicity = source;
        self.target_multiplicity = target;
        self
    }
}

/// Inheritance (`<|--`) or realization (`<|..`) between two classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generalization {
    pub child: String,
    pub parent: String,
    pub realization: bool,
    pub line: usize,
}

/// One `from --> to : event` transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub from: String,
    pub event: String,
    pub to: String,
}

/// The states and transitions of one state-diagram scope
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StateBlock {
    /// Composite state or `title` name identifying the owning class
    pub name: Option<String>,
    pub initial: Option<String>,
    pub states: Vec<String>,
    pub finals: Vec<String>,
    pub transitions: Vec<StateTransition>,
    pub line: usize,
}

impl StateBlock {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.transitions.is_empty()
    }

    pub fn add_state(&mut self, state: &str) {
        if !self.states.iter().any(|s| s == state) {
            self.states.push(state.to_string());
        }
    }

    /// Move the initial state to the front of the state list
    pub fn finish(&mut self) {
        if let Some(initial) = &self.initial {
            if let Some(pos) = self.states.iter().position(|s| s == initial) {
                let state = self.states.remove(pos);
                self.states.insert(0, state);
            }
        }
    }
}

/// Where a behavioral method candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorSource {
    Sequence,
    Activity,
}

/// A method to attach to `target` derived from a sequence or activity diagram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehaviorCandidate {
    pub target: String,
    pub method: MethodNode,
    pub source: BehaviorSource,
    pub line: usize,
}

/// A non-fatal condition found while parsing or building
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub line: Option<usize>,
    pub message: String,
}

impl Warning {
    pub fn new(line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_type_inference() {
        assert_eq!(infer_return_type("findAllActive", "User"), "List<User>");
        assert_eq!(infer_return_type("getById", "User"), "User");
        assert_eq!(infer_return_type("saveDraft", "User"), "User");
        assert_eq!(infer_return_type("deleteUser", "User"), "void");
        assert_eq!(infer_return_type("notify", "User"), "void");
    }

    #[test]
    fn test_method_from_invocation() {
        let method = MethodNode::from_invocation("createOrder(String customerId, items)", "Order").unwrap();
        assert_eq!(method.name, "createOrder");
        assert_eq!(method.return_type, "Order");
        assert_eq!(method.parameters.len(), 2);
        assert_eq!(method.parameters[1].type_name, "Object");

        let prose = MethodNode::from_invocation("check stock levels", "Inventory").unwrap();
        assert_eq!(prose.name, "checkStockLevels");
        assert!(prose.parameters.is_empty());

        assert!(MethodNode::from_invocation("  ", "Inventory").is_none());
    }

    #[test]
    fn test_visibility_from_char() {
        assert_eq!(Visibility::from_char('+'), Some(Visibility::Public));
        assert_eq!(Visibility::from_char('-'), Some(Visibility::Private));
        assert_eq!(Visibility::from_char('#'), Some(Visibility::Protected));
        assert_eq!(Visibility::from_char('~'), Some(Visibility::Package));
        assert_eq!(Visibility::from_char('x'), None);
    }

    #[test]
    fn test_collection_detection() {
        assert!(AttributeNode::new("orders", "List<Order>").is_collection());
        assert!(AttributeNode::new("tags", "String[]").is_collection());
        assert!(!AttributeNode::new("owner", "User").is_collection());
        assert!(!AttributeNode::new("lookup", "Map<String, Order>").is_collection());
        assert_eq!(AttributeNode::new("orders", "Set<Order>").element_type(), "Order");
        assert_eq!(AttributeNode::new("owner", "User").element_type(), "User");
    }

    #[test]
    fn test_parameter_forms() {
        let params = Parameter::parse_list("String name, age: int, items");
        assert_eq!(params.len(), 3);
        assert_eq!(params[0], Parameter::new("name", "String"));
        assert_eq!(params[1], Parameter::new("age", "int"));
        assert_eq!(params[2], Parameter::new("items", "Object"));
    }

    #[test]
    fn test_parameter_generics_keep_commas() {
        let params = Parameter::parse_list("Map~String,Integer~ totals, int count");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].type_name, "Map<String,Integer>");
        assert_eq!(params[1].name, "count");
        assert!(Parameter::parse_list("  ").is_empty());
    }

    #[test]
    fn test_absorb_merges_members() {
        let mut first = ClassNode::new("User");
        first.attributes.push(AttributeNode::new("name", "String"));
        let mut second = ClassNode::new("User");
        second.is_abstract = true;
        second.attributes.push(AttributeNode::new("name", "String"));
        second.attributes.push(AttributeNode::new("email", "String"));

        first.absorb(second);
        assert!(first.is_abstract);
        assert_eq!(first.attributes.len(), 2);
    }

    #[test]
    fn test_state_block_finish_orders_initial_first() {
        let mut block = StateBlock::default();
        block.add_state("Published");
        block.add_state("Draft");
        block.add_state("Draft");
        block.initial = Some("Draft".to_string());
        block.finish();
        assert_eq!(block.states, vec!["Draft", "Published"]);
    }
}
