#![deny(missing_docs)]

//! # Action Spec
//!
//! One documented action: an OpenAPI Operation Object under construction.
//!
//! An `ActionSpec` moves through a one-way lifecycle:
//!
//! ```text
//! Created -> FragmentsApplied -> UserBlockApplied -> Finalized
//! ```
//!
//! Fragments run first so the action's own block can override shared defaults.
//! `finalize` hoists marked inline schemas into the action's own components and
//! prunes blank top-level fields. Once bound to routes the action is shared behind an
//! `Arc` and can no longer be mutated; setters on a finalized spec are ignored.

use crate::components::{
    content_object, parameter_object, ComponentKind, ComponentsBag, ParamLocation, SchemaObj,
};
use crate::error::{AppError, AppResult};
use crate::fragments::Fragment;
use crate::merge::{deep_merge_maps, prune_blank};
use serde_json::{json, Map, Value};

/// Lifecycle state of an [`ActionSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionState {
    /// Summary, tags and operation id are set.
    Created,
    /// Matching fragments ran.
    FragmentsApplied,
    /// The action's own declaration block ran.
    UserBlockApplied,
    /// Inline objects resolved, blank fields pruned. Immutable from here on.
    Finalized,
}

/// A documented action and its operation fields.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    action_path: String,
    state: ActionState,
    operation: Map<String, Value>,
    fragments: Vec<Fragment>,
    components: ComponentsBag,
    builder: Option<String>,
}

impl ActionSpec {
    /// Creates a spec in the `Created` state.
    pub fn new(
        action_path: impl Into<String>,
        summary: &str,
        tags: Vec<String>,
        operation_id: &str,
    ) -> Self {
        let mut operation = Map::new();
        operation.insert("summary".into(), json!(summary));
        operation.insert("tags".into(), json!(tags));
        operation.insert("operationId".into(), json!(operation_id));
        Self {
            action_path: action_path.into(),
            state: ActionState::Created,
            operation,
            fragments: Vec::new(),
            components: ComponentsBag::new(),
            builder: None,
        }
    }

    /// `unit#action` identifier.
    pub fn action_path(&self) -> &str {
        &self.action_path
    }

    /// The action name after `#`.
    pub fn action_name(&self) -> &str {
        self.action_path
            .split_once('#')
            .map_or("", |(_, action)| action)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// The Operation Object fields.
    pub fn operation(&self) -> &Map<String, Value> {
        &self.operation
    }

    /// One operation field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.operation.get(key)
    }

    /// A string operation field, or `""`.
    pub fn get_str(&self, key: &str) -> &str {
        self.operation
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Components hoisted from this action's inline objects.
    pub fn components(&self) -> &ComponentsBag {
        &self.components
    }

    /// Template name for the companion response stub, if declared.
    pub fn builder_template(&self) -> Option<&str> {
        self.builder.as_deref()
    }

    /// Fragments queued for this action.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// The operation as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.operation.clone())
    }

    // --- Lifecycle ---

    /// Queues fragments to run in [`ActionSpec::apply_fragments`].
    pub fn with_fragments(mut self, fragments: Vec<Fragment>) -> Self {
        self.fragments.extend(fragments);
        self
    }

    /// Runs the queued fragments in order. `Created -> FragmentsApplied`.
    pub fn apply_fragments(&mut self) -> AppResult<()> {
        self.expect_state(ActionState::Created, "apply fragments")?;
        let fragments = self.fragments.clone();
        for fragment in &fragments {
            fragment.apply(self);
        }
        tracing::debug!(action = %self.action_path, count = fragments.len(), "fragments applied");
        self.state = ActionState::FragmentsApplied;
        Ok(())
    }

    /// Runs the action's own declaration block. `FragmentsApplied -> UserBlockApplied`.
    pub fn apply_user_block(&mut self, block: impl FnOnce(&mut ActionSpec)) -> AppResult<()> {
        self.expect_state(ActionState::FragmentsApplied, "apply the declaration block")?;
        block(self);
        self.state = ActionState::UserBlockApplied;
        Ok(())
    }

    /// Hoists marked inline objects and prunes blank fields. `UserBlockApplied -> Finalized`.
    ///
    /// Calling it again on a finalized spec does nothing.
    pub fn finalize(&mut self) -> AppResult<()> {
        if self.state == ActionState::Finalized {
            return Ok(());
        }
        self.expect_state(ActionState::UserBlockApplied, "finalize")?;

        let mut operation = Value::Object(std::mem::take(&mut self.operation));
        self.components.hoist_inline(&mut operation);
        self.components.resolve_inline();
        if let Value::Object(map) = operation {
            self.operation = map;
        }
        prune_blank(&mut self.operation);
        self.state = ActionState::Finalized;
        Ok(())
    }

    fn expect_state(&self, expected: ActionState, step: &str) -> AppResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(AppError::State(format!(
                "cannot {} for `{}` in state {:?} (expected {:?})",
                step, self.action_path, self.state, expected
            )))
        }
    }

    fn fields(&mut self) -> Option<&mut Map<String, Value>> {
        if self.state == ActionState::Finalized {
            tracing::warn!(action = %self.action_path, "ignoring change to a finalized action");
            None
        } else {
            Some(&mut self.operation)
        }
    }

    fn push_unique(&mut self, key: &str, item: Value) {
        if let Some(fields) = self.fields() {
            let list = fields.entry(key).or_insert_with(|| json!([]));
            if !list.is_array() {
                *list = json!([]);
            }
            if let Some(items) = list.as_array_mut() {
                if !items.contains(&item) {
                    items.push(item);
                }
            }
        }
    }

    // --- Operation DSL ---

    /// Overwrites one operation field.
    pub fn set(&mut self, key: &str, value: Value) -> &mut Self {
        if let Some(fields) = self.fields() {
            fields.insert(key.into(), value);
        }
        self
    }

    /// Deep-merges a JSON object into the operation. Non-objects are ignored.
    pub fn merge(&mut self, value: Value) -> &mut Self {
        if let Value::Object(source) = value {
            if let Some(fields) = self.fields() {
                deep_merge_maps(fields, source);
            }
        }
        self
    }

    /// `summary`
    pub fn summary(&mut self, text: &str) -> &mut Self {
        self.set("summary", json!(text))
    }

    /// `description`
    pub fn description(&mut self, text: &str) -> &mut Self {
        self.set("description", json!(text))
    }

    /// `operationId`
    pub fn operation_id(&mut self, id: &str) -> &mut Self {
        self.set("operationId", json!(id))
    }

    /// Replaces `tags`.
    pub fn tags<S: Into<String>>(&mut self, tags: impl IntoIterator<Item = S>) -> &mut Self {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.set("tags", json!(tags))
    }

    /// Appends one tag unless present.
    pub fn add_tag(&mut self, tag: &str) -> &mut Self {
        self.push_unique("tags", json!(tag));
        self
    }

    /// `deprecated`
    pub fn deprecated(&mut self, flag: bool) -> &mut Self {
        self.set("deprecated", json!(flag))
    }

    /// `externalDocs`
    pub fn external_docs(&mut self, url: &str, description: &str) -> &mut Self {
        let mut docs = Map::new();
        docs.insert("url".into(), json!(url));
        if !description.is_empty() {
            docs.insert("description".into(), json!(description));
        }
        self.set("externalDocs", Value::Object(docs))
    }

    /// Adds a parameter, replacing an earlier one with the same `in` and `name`.
    pub fn param(
        &mut self,
        location: ParamLocation,
        name: &str,
        schema: impl Into<SchemaObj>,
        required: bool,
        description: &str,
    ) -> &mut Self {
        let param = parameter_object(location, name, schema.into(), required, description);
        if let Some(fields) = self.fields() {
            let list = fields.entry("parameters").or_insert_with(|| json!([]));
            if !list.is_array() {
                *list = json!([]);
            }
            if let Some(params) = list.as_array_mut() {
                let same = |p: &Value| {
                    p.get("name") == param.get("name") && p.get("in") == param.get("in")
                };
                match params.iter_mut().find(|p| same(&**p)) {
                    Some(existing) => *existing = param,
                    None => params.push(param),
                }
            }
        }
        self
    }

    /// Optional query parameter.
    pub fn query(&mut self, name: &str, schema: impl Into<SchemaObj>) -> &mut Self {
        self.param(ParamLocation::Query, name, schema, false, "")
    }

    /// Required query parameter.
    pub fn query_required(&mut self, name: &str, schema: impl Into<SchemaObj>) -> &mut Self {
        self.param(ParamLocation::Query, name, schema, true, "")
    }

    /// Path parameter.
    pub fn path_param(&mut self, name: &str, schema: impl Into<SchemaObj>) -> &mut Self {
        self.param(ParamLocation::Path, name, schema, true, "")
    }

    /// Header parameter.
    pub fn header(&mut self, name: &str, schema: impl Into<SchemaObj>, required: bool) -> &mut Self {
        self.param(ParamLocation::Header, name, schema, required, "")
    }

    /// Optional cookie parameter.
    pub fn cookie(&mut self, name: &str, schema: impl Into<SchemaObj>) -> &mut Self {
        self.param(ParamLocation::Cookie, name, schema, false, "")
    }

    /// References a parameter component.
    pub fn param_ref(&mut self, component: &str) -> &mut Self {
        self.push_unique("parameters", ComponentKind::Parameters.reference(component));
        self
    }

    /// Declares (or extends, per media type) the request body.
    pub fn request_body(
        &mut self,
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

        if let Some(fields) = self.fields() {
            let target = fields
                .entry("requestBody")
                .or_insert_with(|| Value::Object(Map::new()));
            // A previous `$ref` body is replaced, not merged into.
            if target.get("$ref").is_some() || !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Some(existing) = target.as_object_mut() {
                deep_merge_maps(existing, body);
            }
        }
        self
    }

    /// References a request body component.
    pub fn body_ref(&mut self, component: &str) -> &mut Self {
        self.set(
            "requestBody",
            ComponentKind::RequestBodies.reference(component),
        )
    }

    /// Declares (or extends) the response for `code`. An empty media type means no content.
    pub fn response(
        &mut self,
        code: &str,
        description: &str,
        media_type: &str,
        schema: impl Into<SchemaObj>,
    ) -> &mut Self {
        let mut response = Map::new();
        response.insert("description".into(), json!(description));
        if !media_type.is_empty() {
            response.insert("content".into(), content_object(media_type, schema.into()));
        }
        if let Some(fields) = self.fields() {
            let responses = fields
                .entry("responses")
                .or_insert_with(|| Value::Object(Map::new()));
            if !responses.is_object() {
                *responses = Value::Object(Map::new());
            }
            if let Some(responses) = responses.as_object_mut() {
                let slot = responses
                    .entry(code)
                    .or_insert_with(|| Value::Object(Map::new()));
                if slot.get("$ref").is_some() || !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Some(existing) = slot.as_object_mut() {
                    deep_merge_maps(existing, response);
                }
            }
        }
        self
    }

    /// References a response component for `code`.
    pub fn response_ref(&mut self, code: &str, component: &str) -> &mut Self {
        let mut responses = Map::new();
        responses.insert(code.into(), ComponentKind::Responses.reference(component));
        if let Some(fields) = self.fields() {
            let target = fields
                .entry("responses")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(existing) = target.as_object_mut() {
                existing.extend(responses);
            } else {
                *target = Value::Object(responses);
            }
        }
        self
    }

    /// The `default` response.
    pub fn default_response(
        &mut self,
        description: &str,
        media_type: &str,
        schema: impl Into<SchemaObj>,
    ) -> &mut Self {
        self.response("default", description, media_type, schema)
    }

    /// Adds a security requirement. A repeated scheme replaces its scopes.
    pub fn security<S: Into<String>>(
        &mut self,
        scheme: &str,
        scopes: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        let scopes: Vec<String> = scopes.into_iter().map(Into::into).collect();
        if let Some(fields) = self.fields() {
            let list = fields.entry("security").or_insert_with(|| json!([]));
            if !list.is_array() {
                *list = json!([]);
            }
            if let Some(reqs) = list.as_array_mut() {
                match reqs.iter_mut().find(|r| r.get(scheme).is_some()) {
                    Some(existing) => *existing = json!({ scheme: scopes }),
                    None => reqs.push(json!({ scheme: scopes })),
                }
            }
        }
        self
    }

    /// Adds an operation-level server.
    pub fn server(&mut self, url: &str, description: &str) -> &mut Self {
        let mut server = Map::new();
        server.insert("url".into(), json!(url));
        if !description.is_empty() {
            server.insert("description".into(), json!(description));
        }
        self.push_unique("servers", Value::Object(server));
        self
    }

    /// Names the template of the companion response stub for this action.
    pub fn builder(&mut self, template: &str) -> &mut Self {
        if self.state != ActionState::Finalized {
            self.builder = Some(template.to_string());
        }
        self
    }
}
