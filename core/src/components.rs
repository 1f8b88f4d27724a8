#![deny(missing_docs)]

//! # Schema Components
//!
//! Reusable objects (`components/*`) declared by units and actions.
//!
//! ## Inline hoisting
//!
//! An inline object carrying the [`COMPONENT_MARKER`] key is hoisted: it moves into
//! `components/schemas/<name>` and its occurrence is replaced by a `$ref`. Unmarked
//! inline objects stay inline. After one pass no marker is left, so a second pass is a
//! no-op and re-hoisting a name overwrites it with the same definition.

use crate::merge::deep_merge_maps;
use derive_more::Display;
use serde_json::{json, Map, Value};

/// Marker key naming the component an inline object is hoisted to.
pub const COMPONENT_MARKER: &str = "x-zro-component";

/// The sections of an OpenAPI `components` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ComponentKind {
    /// `components/schemas`
    #[display("schemas")]
    Schemas,
    /// `components/responses`
    #[display("responses")]
    Responses,
    /// `components/parameters`
    #[display("parameters")]
    Parameters,
    /// `components/examples`
    #[display("examples")]
    Examples,
    /// `components/requestBodies`
    #[display("requestBodies")]
    RequestBodies,
    /// `components/headers`
    #[display("headers")]
    Headers,
    /// `components/securitySchemes`
    #[display("securitySchemes")]
    SecuritySchemes,
    /// `components/links`
    #[display("links")]
    Links,
    /// `components/callbacks`
    #[display("callbacks")]
    Callbacks,
}

impl ComponentKind {
    /// JSON pointer to a named component of this kind.
    pub fn pointer(&self, name: &str) -> String {
        format!("#/components/{}/{}", self, name)
    }

    /// A `{"$ref": ...}` object targeting a named component of this kind.
    pub fn reference(&self, name: &str) -> Value {
        json!({ "$ref": self.pointer(name) })
    }
}

/// Where a parameter lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ParamLocation {
    /// `?name=value`
    #[display("query")]
    Query,
    /// `/items/{name}`
    #[display("path")]
    Path,
    /// Request header.
    #[display("header")]
    Header,
    /// Cookie.
    #[display("cookie")]
    Cookie,
}

/// Builds an OpenAPI Parameter Object. Path parameters are always required.
pub fn parameter_object(
    location: ParamLocation,
    name: &str,
    schema: SchemaObj,
    required: bool,
    description: &str,
) -> Value {
    let mut param = Map::new();
    param.insert("name".into(), json!(name));
    param.insert("in".into(), json!(location.to_string()));
    param.insert(
        "required".into(),
        json!(required || location == ParamLocation::Path),
    );
    if !description.is_empty() {
        param.insert("description".into(), json!(description));
    }
    param.insert("schema".into(), schema.into_value());
    Value::Object(param)
}

/// Builds a `{ "<media>": { "schema": ... } }` content map.
pub fn content_object(media_type: &str, schema: SchemaObj) -> Value {
    json!({ media_type: { "schema": schema.into_value() } })
}

/// A schema argument: a reference, an inline object, or an inline object to hoist.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaObj {
    /// `#/components/schemas/<name>`
    Ref(String),
    /// Left inline as written.
    Inline(Value),
    /// Inline here, hoisted to `components/schemas/<name>` when resolved.
    Named {
        /// Component name.
        name: String,
        /// Schema definition.
        definition: Value,
    },
}

impl SchemaObj {
    /// Reference to a named schema component.
    pub fn reference(name: impl Into<String>) -> Self {
        SchemaObj::Ref(name.into())
    }

    /// Inline definition hoisted under `name`.
    pub fn named(name: impl Into<String>, definition: Value) -> Self {
        SchemaObj::Named {
            name: name.into(),
            definition,
        }
    }

    /// `{"type": "string"}`
    pub fn string() -> Self {
        SchemaObj::Inline(json!({ "type": "string" }))
    }

    /// `{"type": "integer"}`
    pub fn integer() -> Self {
        SchemaObj::Inline(json!({ "type": "integer" }))
    }

    /// `{"type": "number"}`
    pub fn number() -> Self {
        SchemaObj::Inline(json!({ "type": "number" }))
    }

    /// `{"type": "boolean"}`
    pub fn boolean() -> Self {
        SchemaObj::Inline(json!({ "type": "boolean" }))
    }

    /// `{"type": "array", "items": ...}`
    pub fn array_of(items: SchemaObj) -> Self {
        SchemaObj::Inline(json!({ "type": "array", "items": items.into_value() }))
    }

    /// `{"type": "object", "properties": {...}}`
    pub fn object<K: Into<String>>(properties: impl IntoIterator<Item = (K, SchemaObj)>) -> Self {
        let props: Map<String, Value> = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into_value()))
            .collect();
        SchemaObj::Inline(json!({ "type": "object", "properties": props }))
    }

    /// Renders the JSON form; `Named` keeps its definition inline with the marker set.
    pub fn into_value(self) -> Value {
        match self {
            SchemaObj::Ref(name) => ComponentKind::Schemas.reference(&name),
            SchemaObj::Inline(value) => value,
            SchemaObj::Named {
                name,
                mut definition,
            } => {
                if let Some(map) = definition.as_object_mut() {
                    map.insert(COMPONENT_MARKER.into(), Value::String(name));
                }
                definition
            }
        }
    }
}

impl From<Value> for SchemaObj {
    fn from(value: Value) -> Self {
        SchemaObj::Inline(value)
    }
}

/// Components grouped by kind, then by name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentsBag {
    sections: Map<String, Value>,
}

impl ComponentsBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a raw `components` object (`{kind: {name: definition}}`).
    pub fn from_map(sections: Map<String, Value>) -> Self {
        Self { sections }
    }

    /// Defines (or replaces) one component.
    pub fn define(&mut self, kind: ComponentKind, name: impl Into<String>, definition: Value) {
        let section = self
            .sections
            .entry(kind.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !section.is_object() {
            *section = Value::Object(Map::new());
        }
        if let Some(defs) = section.as_object_mut() {
            defs.insert(name.into(), definition);
        }
    }

    /// Looks up one component.
    pub fn get(&self, kind: ComponentKind, name: &str) -> Option<&Value> {
        self.sections.get(&kind.to_string())?.get(name)
    }

    /// Deep-merges another bag over this one.
    pub fn merge(&mut self, other: ComponentsBag) {
        deep_merge_maps(&mut self.sections, other.sections);
    }

    /// Number of defined components across every kind.
    pub fn len(&self) -> usize {
        self.sections
            .values()
            .filter_map(Value::as_object)
            .map(Map::len)
            .sum()
    }

    /// True when no component is defined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw `components` object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.sections
    }

    /// Consumes the bag into its raw `components` object.
    pub fn into_map(self) -> Map<String, Value> {
        self.sections
    }

    /// Hoists every marked object inside `value` into this bag, replacing it with a `$ref`.
    ///
    /// Nested marked objects are hoisted before their parent.
    pub fn hoist_inline(&mut self, value: &mut Value) {
        let hoist_as = match value {
            Value::Object(map) => {
                for child in map.values_mut() {
                    self.hoist_inline(child);
                }
                match map.remove(COMPONENT_MARKER) {
                    Some(Value::String(name)) => Some(name),
                    Some(other) => {
                        tracing::warn!(
                            marker = COMPONENT_MARKER,
                            "ignoring non-string component name {}",
                            other
                        );
                        None
                    }
                    None => None,
                }
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.hoist_inline(item);
                }
                None
            }
            _ => None,
        };

        if let Some(name) = hoist_as {
            let reference = ComponentKind::Schemas.reference(&name);
            let definition = std::mem::replace(value, reference);
            self.define(ComponentKind::Schemas, name, definition);
        }
    }

    /// Hoists marked objects nested inside the bag's own definitions.
    ///
    /// A definition's own top-level marker is dropped: it already lives in the bag.
    pub fn resolve_inline(&mut self) {
        let mut hoisted = ComponentsBag::new();
        for section in self.sections.values_mut() {
            let Some(defs) = section.as_object_mut() else {
                continue;
            };
            for definition in defs.values_mut() {
                if let Some(map) = definition.as_object_mut() {
                    map.remove(COMPONENT_MARKER);
                }
                hoisted.hoist_inline(definition);
            }
        }
        if !hoisted.is_empty() {
            self.merge(hoisted);
        }
    }
}

/// Block context for declaring unit-level components.
#[derive(Debug, Default)]
pub struct ComponentsBuilder {
    bag: ComponentsBag,
}

impl ComponentsBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// `components/schemas/<name>`
    pub fn schema(&mut self, name: &str, schema: impl Into<SchemaObj>) -> &mut Self {
        let definition = match schema.into() {
            // A named schema declared here is the component itself.
            SchemaObj::Named { definition, .. } => definition,
            other => other.into_value(),
        };
        self.bag.define(ComponentKind::Schemas, name, definition);
        self
    }

    /// `components/parameters/<name>`
    pub fn parameter(
        &mut self,
        name: &str,
        location: ParamLocation,
        param_name: &str,
        schema: impl Into<SchemaObj>,
        required: bool,
    ) -> &mut Self {
        let param = parameter_object(location, param_name, schema.into(), required, "");
        self.bag.define(ComponentKind::Parameters, name, param);
        self
    }

    /// Optional query parameter component.
    pub fn query(&mut self, name: &str, param_name: &str, schema: impl Into<SchemaObj>) -> &mut Self {
        self.parameter(name, ParamLocation::Query, param_name, schema, false)
    }

    /// Path parameter component.
    pub fn path_param(
        &mut self,
        name: &str,
        param_name: &str,
        schema: impl Into<SchemaObj>,
    ) -> &mut Self {
        self.parameter(name, ParamLocation::Path, param_name, schema, true)
    }

    /// Header parameter component.
    pub fn header(
        &mut self,
        name: &str,
        param_name: &str,
        schema: impl Into<SchemaObj>,
        required: bool,
    ) -> &mut Self {
        self.parameter(name, ParamLocation::Header, param_name, schema, required)
    }

    /// `components/requestBodies/<name>`
    pub fn request_body(
        &mut self,
        name: &str,
        required: bool,
        media_type: &str,
        schema: impl Into<SchemaObj>,
        description: &str,
    ) -> &mut Self {
        let mut body = Map::new();
        if !description.is_empty() {
            body.insert("description".into(), json!(description));
        }
        body.insert("required".into(), json!(required));
        body.insert("content".into(), content_object(media_type, schema.into()));
        self.bag
            .define(ComponentKind::RequestBodies, name, Value::Object(body));
        self
    }

    /// `components/responses/<name>`
    pub fn response(
        &mut self,
        name: &str,
        description: &str,
        media_type: &str,
        schema: impl Into<SchemaObj>,
    ) -> &mut Self {
        let response = json!({
            "description": description,
            "content": content_object(media_type, schema.into()),
        });
        self.bag.define(ComponentKind::Responses, name, response);
        self
    }

    /// `components/securitySchemes/<name>`
    pub fn security_scheme(&mut self, name: &str, definition: Value) -> &mut Self {
        self.bag
            .define(ComponentKind::SecuritySchemes, name, definition);
        self
    }

    /// HTTP bearer security scheme, optionally naming the token format.
    pub fn bearer_auth(&mut self, name: &str, bearer_format: Option<&str>) -> &mut Self {
        let mut scheme = json!({ "type": "http", "scheme": "bearer" });
        if let (Some(format), Some(map)) = (bearer_format, scheme.as_object_mut()) {
            map.insert("bearerFormat".into(), json!(format));
        }
        self.security_scheme(name, scheme)
    }

    /// API key security scheme.
    pub fn api_key(&mut self, name: &str, location: ParamLocation, field: &str) -> &mut Self {
        self.security_scheme(
            name,
            json!({ "type": "apiKey", "name": field, "in": location.to_string() }),
        )
    }

    /// Any other component, verbatim.
    pub fn raw(&mut self, kind: ComponentKind, name: &str, definition: Value) -> &mut Self {
        self.bag.define(kind, name, definition);
        self
    }

    /// Deep-merges a whole `components`-shaped object.
    pub fn merge_raw(&mut self, components: Map<String, Value>) -> &mut Self {
        self.bag.merge(ComponentsBag::from_map(components));
        self
    }

    /// Resolves inline objects and returns the declared components.
    pub fn finish(mut self) -> ComponentsBag {
        self.bag.resolve_inline();
        self.bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reference_pointer() {
        assert_eq!(
            ComponentKind::RequestBodies.reference("NewPet"),
            json!({"$ref": "#/components/requestBodies/NewPet"})
        );
        assert_eq!(ComponentKind::SecuritySchemes.to_string(), "securitySchemes");
    }

    #[test]
    fn test_path_parameter_is_required() {
        let p = parameter_object(ParamLocation::Path, "id", SchemaObj::integer(), false, "");
        assert_eq!(
            p,
            json!({"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}})
        );
    }

    #[test]
    fn test_hoist_inline_replaces_with_ref() {
        let mut bag = ComponentsBag::new();
        let mut op = json!({
            "responses": {"200": {"content": {"application/json": {
                "schema": SchemaObj::named("Pet", json!({"type": "object"})).into_value()
            }}}}
        });
        bag.hoist_inline(&mut op);
        assert_eq!(
            op["responses"]["200"]["content"]["application/json"]["schema"],
            json!({"$ref": "#/components/schemas/Pet"})
        );
        assert_eq!(
            bag.get(ComponentKind::Schemas, "Pet"),
            Some(&json!({"type": "object"}))
        );
    }

    #[test]
    fn test_hoist_nested_before_parent() {
        let mut bag = ComponentsBag::new();
        let tag = SchemaObj::named("Tag", json!({"type": "string"}));
        let mut value = SchemaObj::named(
            "Pet",
            json!({"type": "object", "properties": {"tag": tag.into_value()}}),
        )
        .into_value();
        bag.hoist_inline(&mut value);
        assert_eq!(value, json!({"$ref": "#/components/schemas/Pet"}));
        assert_eq!(
            bag.get(ComponentKind::Schemas, "Pet").unwrap()["properties"]["tag"],
            json!({"$ref": "#/components/schemas/Tag"})
        );
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_hoist_is_idempotent() {
        let mut bag = ComponentsBag::new();
        let mut op = json!({"items": [SchemaObj::named("Row", json!({"type": "object"})).into_value()]});
        bag.hoist_inline(&mut op);
        let (op_once, bag_once) = (op.clone(), bag.clone());
        bag.hoist_inline(&mut op);
        assert_eq!(op, op_once);
        assert_eq!(bag, bag_once);
    }

    #[test]
    fn test_non_string_marker_is_dropped() {
        let mut bag = ComponentsBag::new();
        let mut value = json!({"x": {COMPONENT_MARKER: 5, "type": "object"}});
        bag.hoist_inline(&mut value);
        assert_eq!(value, json!({"x": {"type": "object"}}));
        assert!(bag.is_empty());
    }

    #[test]
    fn test_unmarked_inline_stays() {
        let mut bag = ComponentsBag::new();
        let mut op = json!({"schema": {"type": "object", "properties": {"a": {"type": "string"}}}});
        let before = op.clone();
        bag.hoist_inline(&mut op);
        assert_eq!(op, before);
        assert!(bag.is_empty());
    }

    #[test]
    fn test_builder_resolves_nested_markers() {
        let mut builder = ComponentsBuilder::new();
        builder
            .schema(
                "Order",
                SchemaObj::object([(
                    "buyer",
                    SchemaObj::named("Buyer", json!({"type": "object"})),
                )]),
            )
            .query("Page", "page", SchemaObj::integer())
            .bearer_auth("Token", Some("JWT"));
        let mut bag = builder.finish();
        assert_eq!(
            bag.get(ComponentKind::Schemas, "Order").unwrap()["properties"]["buyer"],
            json!({"$ref": "#/components/schemas/Buyer"})
        );
        assert!(bag.get(ComponentKind::Schemas, "Buyer").is_some());
        assert_eq!(
            bag.get(ComponentKind::SecuritySchemes, "Token").unwrap()["bearerFormat"],
            json!("JWT")
        );

        let once = bag.clone();
        bag.resolve_inline();
        assert_eq!(bag, once);
    }

    #[test]
    fn test_bag_merge_is_deep() {
        let mut first = ComponentsBag::new();
        first.define(
            ComponentKind::Schemas,
            "Error",
            json!({"type": "object", "properties": {"code": {"type": "integer"}}}),
        );
        let mut second = ComponentsBag::new();
        second.define(
            ComponentKind::Schemas,
            "Error",
            json!({"properties": {"msg": {"type": "string"}}}),
        );
        first.merge(second);
        assert_eq!(
            first.get(ComponentKind::Schemas, "Error"),
            Some(&json!({"type": "object", "properties": {
                "code": {"type": "integer"},
                "msg": {"type": "string"}
            }}))
        );
    }
}
