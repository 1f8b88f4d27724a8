#![deny(missing_docs)]

//! # Unit Accumulator
//!
//! A unit is one documented group of actions (a controller in most frameworks).
//! Its declarations accumulate into a [`UnitDoc`]: the tag, shared components,
//! dry fragments and the path/verb table of finalized [`ActionSpec`]s.
//!
//! Declarations go through a [`UnitScope`], obtained from
//! [`crate::Registry::unit`].

use crate::action::ActionSpec;
use crate::components::{ComponentsBag, ComponentsBuilder};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::AppResult;
use crate::fragments::{Fragment, FragmentStore, Selector};
use crate::naming::{default_operation_id, route_base_for, tag_name_for};
use crate::routes::{Route, RouteIndex};
use crate::stubs::StubHook;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Path -> verb -> bound action.
pub type PathTable = IndexMap<String, IndexMap<String, Arc<ActionSpec>>>;

/// Explicit tag declaration. Missing `name` falls back to the unit's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagDef {
    /// Tag name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Remaining Tag Object fields (`description`, `externalDocs`, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TagDef {
    /// Tag with an explicit name.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            fields: Map::new(),
        }
    }

    /// Adds the tag description.
    pub fn description(mut self, text: &str) -> Self {
        self.fields.insert("description".into(), json!(text));
        self
    }
}

/// Per-action overrides of the unit defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiOptions {
    /// Operation id instead of `<Tag>_<Action>`.
    pub id: Option<String>,
    /// Tag instead of the unit tag.
    pub tag: Option<String>,
    /// Verbs (`get|post`) instead of each route's own.
    pub http: Option<String>,
}

impl ApiOptions {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the operation id.
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Overrides the tag.
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    /// Overrides the HTTP verbs.
    pub fn http(mut self, verbs: &str) -> Self {
        self.http = Some(verbs.to_string());
        self
    }
}

/// Everything one unit declared.
#[derive(Debug, Clone)]
pub struct UnitDoc {
    unit_path: String,
    route_base: String,
    default_tag: String,
    tag: Option<Map<String, Value>>,
    lineage: Vec<String>,
    components: ComponentsBag,
    fragments: FragmentStore,
    paths: PathTable,
}

impl UnitDoc {
    /// Empty document of the unit `unit_path`.
    ///
    /// The route base defaults to the identifier in path form
    /// (`Api::V1::PetsController` -> `api/v1/pets`), the tag to its last segment.
    pub fn new(unit_path: &str) -> Self {
        let route_base = route_base_for(unit_path);
        Self {
            unit_path: unit_path.to_string(),
            default_tag: tag_name_for(&route_base),
            route_base,
            tag: None,
            lineage: Vec::new(),
            components: ComponentsBag::new(),
            fragments: FragmentStore::new(),
            paths: PathTable::new(),
        }
    }

    /// Unit identifier.
    pub fn unit_path(&self) -> &str {
        &self.unit_path
    }

    /// Grouping key matched against route identifiers.
    pub fn route_base(&self) -> &str {
        &self.route_base
    }

    /// The Tag Object, once set.
    pub fn tag(&self) -> Option<&Map<String, Value>> {
        self.tag.as_ref()
    }

    /// Effective tag name.
    pub fn tag_name(&self) -> &str {
        self.tag
            .as_ref()
            .and_then(|tag| tag.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(self.default_tag.as_str())
    }

    /// Declared ancestors, nearest first.
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// True when `root` is among the declared ancestors.
    pub fn descends_from(&self, root: &str) -> bool {
        self.lineage.iter().any(|ancestor| ancestor == root)
    }

    /// Shared components.
    pub fn components(&self) -> &ComponentsBag {
        &self.components
    }

    /// Registered dry fragments.
    pub fn fragments(&self) -> &FragmentStore {
        &self.fragments
    }

    /// Bound actions.
    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    /// The action bound to `path` and `verb`.
    pub fn operation(&self, path: &str, verb: &str) -> Option<&Arc<ActionSpec>> {
        self.paths.get(path).and_then(|verbs| verbs.get(verb))
    }

    /// True when the unit has a tag or any bound path.
    pub fn has_data(&self) -> bool {
        self.tag.is_some() || !self.paths.is_empty()
    }
}

/// Declaration context of one unit within a run.
pub struct UnitScope<'a> {
    unit: &'a mut UnitDoc,
    routes: &'a RouteIndex,
    hook: &'a dyn StubHook,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> UnitScope<'a> {
    /// Opens a scope over `unit`.
    pub fn new(
        unit: &'a mut UnitDoc,
        routes: &'a RouteIndex,
        hook: &'a dyn StubHook,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            unit,
            routes,
            hook,
            diagnostics,
        }
    }

    /// The accumulated document.
    pub fn doc(&self) -> &UnitDoc {
        self.unit
    }

    /// Sets the grouping key and derives the default tag name from its last segment.
    pub fn route_base(&mut self, base: &str) -> &mut Self {
        let base = base.trim_matches('/');
        self.unit.route_base = base.to_string();
        self.unit.default_tag = tag_name_for(base);
        self
    }

    /// Declares ancestors used to decide document membership.
    pub fn inherits<S: Into<String>>(&mut self, ancestors: impl IntoIterator<Item = S>) -> &mut Self {
        for ancestor in ancestors {
            let ancestor = ancestor.into();
            if !self.unit.lineage.contains(&ancestor) {
                self.unit.lineage.push(ancestor);
            }
        }
        self
    }

    /// Replaces the unit tag.
    pub fn doc_tag(&mut self, tag: TagDef) -> &mut Self {
        let mut object = Map::new();
        let name = tag.name.unwrap_or_else(|| self.unit.default_tag.clone());
        object.insert("name".into(), json!(name));
        for (key, value) in tag.fields {
            if key != "name" {
                object.insert(key, value);
            }
        }
        self.unit.tag = Some(object);
        self
    }

    /// Sets the default tag unless one exists.
    pub fn ensure_tag(&mut self) -> &mut Self {
        if self.unit.tag.is_none() {
            self.doc_tag(TagDef::default());
        }
        self
    }

    /// Declares shared components; later keys win over earlier ones.
    pub fn components(&mut self, block: impl FnOnce(&mut ComponentsBuilder)) -> &mut Self {
        self.ensure_tag();
        let mut builder = ComponentsBuilder::new();
        block(&mut builder);
        self.unit.components.merge(builder.finish());
        self
    }

    /// Registers a dry fragment under each selector; no selector means every action.
    pub fn api_dry(
        &mut self,
        selectors: Vec<Selector>,
        block: impl Fn(&mut ActionSpec) + Send + Sync + 'static,
    ) -> &mut Self {
        let fragment = Fragment::new(block);
        if selectors.is_empty() {
            self.unit.fragments.register(Selector::All, fragment);
        } else {
            for selector in selectors {
                self.unit.fragments.register(selector, fragment.clone());
            }
        }
        self
    }

    /// Declares an action and binds it to every matching route.
    ///
    /// Returns `Ok(None)` when no route matches; a `NoMatchingRoute` diagnostic
    /// is recorded and nothing is bound.
    pub fn api(
        &mut self,
        action: &str,
        summary: &str,
        options: ApiOptions,
        block: impl FnOnce(&mut ActionSpec),
    ) -> AppResult<Option<Arc<ActionSpec>>> {
        self.ensure_tag();
        let action_path = format!("{}#{}", self.unit.route_base, action);

        let routes: Vec<Route> = self
            .routes
            .find_for_action(&self.unit.route_base, action)
            .into_iter()
            .cloned()
            .collect();
        if routes.is_empty() {
            self.diagnostics
                .push(Diagnostic::NoMatchingRoute { action_path });
            return Ok(None);
        }

        let tag = options
            .tag
            .clone()
            .unwrap_or_else(|| self.unit.tag_name().to_string());
        let operation_id = options
            .id
            .clone()
            .unwrap_or_else(|| default_operation_id(&tag, action));

        let mut spec = ActionSpec::new(&action_path, summary, vec![tag.clone()], &operation_id)
            .with_fragments(self.unit.fragments.resolve(action, &tag));
        spec.apply_fragments()?;
        spec.apply_user_block(block)?;
        spec.finalize()?;

        self.unit.components.merge(spec.components().clone());
        let spec = Arc::new(spec);

        for route in &routes {
            let verbs: Vec<String> = match &options.http {
                Some(http) => http
                    .split('|')
                    .filter(|v| !v.is_empty())
                    .map(str::to_lowercase)
                    .collect(),
                None => route.verbs().map(str::to_string).collect(),
            };
            let slot = self.unit.paths.entry(route.path.clone()).or_default();
            for verb in verbs {
                slot.insert(verb, Arc::clone(&spec));
            }
        }
        tracing::debug!(action = %action_path, routes = routes.len(), "action bound");

        if let Some(template) = spec.builder_template() {
            self.hook.generate(&action_path, template)?;
        }
        Ok(Some(spec))
    }
}
