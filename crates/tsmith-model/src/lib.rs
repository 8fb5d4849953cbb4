//! Core data model for the tsmith scaffolding toolchain.

pub mod config;
pub mod parse;

pub use config::{AuthScheme, ClientConfig, Endpoint, RetryPolicy, Webhook, WebhookConfig};

/// The closed set of property type tags a code emitter can match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Number,
    Boolean,
    /// An array type; the element type lives in `ParsedProperty::element_type`.
    Array,
    /// A union of named types; members live in `ParsedProperty::union_types`.
    Union,
    /// A union of string literals; values live in `ParsedProperty::enum_values`.
    Enum,
    /// A reference to another named interface.
    Reference(String),
}

impl PropertyKind {
    /// Returns the JSON Schema `type` keyword for this kind, where one exists.
    ///
    /// References, unions and enums have no single scalar type and return `None`.
    pub fn json_schema_type(&self) -> Option<&'static str> {
        match self {
            PropertyKind::String => Some("string"),
            PropertyKind::Number => Some("number"),
            PropertyKind::Boolean => Some("boolean"),
            PropertyKind::Array => Some("array"),
            PropertyKind::Union | PropertyKind::Enum | PropertyKind::Reference(_) => None,
        }
    }
}

/// A single property of a parsed TypeScript interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProperty {
    /// The property name as written in the source.
    pub name: String,
    /// The type tag for this property.
    pub kind: PropertyKind,
    /// Whether the property was declared with a `?` marker.
    pub optional: bool,
    /// The JSDoc line immediately preceding the property, if any.
    pub js_doc: Option<String>,
    /// Members of a union type (empty unless `kind` is `Union`).
    pub union_types: Vec<String>,
    /// Element type of an array (set only when `kind` is `Array`).
    pub element_type: Option<String>,
    /// Literal values of a string-literal union (empty unless `kind` is `Enum`).
    pub enum_values: Vec<String>,
}

impl ParsedProperty {
    /// Creates a property with the given name and kind and no extras.
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            js_doc: None,
            union_types: vec![],
            element_type: None,
            enum_values: vec![],
        }
    }

    /// Returns true if this property references another interface by name.
    pub fn is_reference(&self) -> bool {
        matches!(self.kind, PropertyKind::Reference(_))
    }
}

/// A TypeScript interface recovered by static analysis of existing source.
///
/// Produced by [`parse::parse_interfaces`], not by the inference engine; the
/// two share the same property shape so downstream emitters can consume either.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedInterface {
    /// The interface name (e.g. `UserResponse`).
    pub name: String,
    /// The properties in declaration order.
    pub properties: Vec<ParsedProperty>,
    /// Generic type parameters, if any (e.g. `["T"]` for `ApiResponse<T>`).
    pub type_parameters: Vec<String>,
}

impl ParsedInterface {
    /// Looks up a property by name.
    pub fn get_property(&self, name: &str) -> Option<&ParsedProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns the names of all required (non-optional) properties.
    pub fn required_properties(&self) -> impl Iterator<Item = &ParsedProperty> {
        self.properties.iter().filter(|p| !p.optional)
    }
}

/// Transient description of one generated client function, used to build a
/// companion helper module (retry or error handling) for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointMeta {
    /// The generated client function name (e.g. `getUser`).
    pub function_name: String,
    /// The TypeScript response type name (e.g. `GetUserResponse`).
    pub response_type: String,
    /// The module (without extension) the response type is imported from.
    pub response_module: String,
    /// The endpoint path, when the helper needs it for messages.
    pub endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_kind_schema_type() {
        assert_eq!(PropertyKind::String.json_schema_type(), Some("string"));
        assert_eq!(PropertyKind::Array.json_schema_type(), Some("array"));
        assert_eq!(
            PropertyKind::Reference("User".to_string()).json_schema_type(),
            None
        );
    }

    #[test]
    fn test_interface_lookup() {
        let iface = ParsedInterface {
            name: "User".to_string(),
            properties: vec![
                ParsedProperty::new("id", PropertyKind::String),
                ParsedProperty {
                    optional: true,
                    ..ParsedProperty::new("nickname", PropertyKind::String)
                },
            ],
            type_parameters: vec![],
        };

        assert!(iface.get_property("id").is_some());
        assert!(iface.get_property("missing").is_none());
        assert_eq!(iface.required_properties().count(), 1);
    }

    #[test]
    fn test_property_reference() {
        let prop = ParsedProperty::new("profile", PropertyKind::Reference("Profile".to_string()));
        assert!(prop.is_reference());
        assert!(!ParsedProperty::new("id", PropertyKind::String).is_reference());
    }
}
