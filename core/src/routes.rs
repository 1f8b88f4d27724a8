#![deny(missing_docs)]

//! # Route Index
//!
//! Read-only lookup over the host framework's route table, grouped by unit path
//! (the part of `unit#action` before the `#`).
//!
//! The core never inspects a framework itself. Hosts hand routes over through the
//! [`RouteSource`] trait, either as typed [`Route`]s or as raw lines in the common
//! console route-table shape, which [`parse_route_line`] understands. Entries that do
//! not parse are skipped and reported as [`Diagnostic::MalformedRouteLine`].

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::AppResult;
use crate::naming::to_openapi_path;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A concrete route discovered from the host framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Lowercase HTTP verb; may hold several verbs separated by `|`.
    pub http_verb: String,
    /// OpenAPI path template, e.g. `/api/v1/examples/{id}`.
    pub path: String,
    /// `unit_path#action_name`.
    pub action_path: String,
}

impl Route {
    /// Creates a route, normalizing the verb to lowercase.
    pub fn new(
        http_verb: impl Into<String>,
        path: impl Into<String>,
        action_path: impl Into<String>,
    ) -> Self {
        Self {
            http_verb: http_verb.into().to_lowercase(),
            path: path.into(),
            action_path: action_path.into(),
        }
    }

    /// The grouping key before `#`.
    pub fn unit_path(&self) -> &str {
        self.action_path
            .split_once('#')
            .map_or(self.action_path.as_str(), |(unit, _)| unit)
    }

    /// The action name after `#`.
    pub fn action(&self) -> &str {
        self.action_path
            .split_once('#')
            .map_or("", |(_, action)| action)
    }

    /// Individual verbs of a `get|post` style verb list.
    pub fn verbs(&self) -> impl Iterator<Item = &str> {
        self.http_verb.split('|').filter(|v| !v.is_empty())
    }

    fn check(&self) -> Result<(), String> {
        if self.http_verb.trim().is_empty() {
            return Err("missing http verb".into());
        }
        if !self.path.starts_with('/') {
            return Err(format!("path `{}` is not absolute", self.path));
        }
        if self.path.contains(['(', ')']) {
            return Err(format!(
                "path `{}` has an optional segment, which has no OpenAPI form",
                self.path
            ));
        }
        match self.action_path.split_once('#') {
            Some((unit, action)) if !unit.is_empty() && !action.is_empty() => Ok(()),
            _ => Err(format!(
                "action `{}` is not of the form unit#action",
                self.action_path
            )),
        }
    }
}

/// One entry handed over by a [`RouteSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteLine {
    /// An already typed route.
    Parsed(Route),
    /// A console-table line still to be parsed with [`parse_route_line`].
    Raw(String),
    /// An entry the source already knows to be unusable.
    Invalid {
        /// Raw text of the entry.
        line: String,
        /// Why it is unusable.
        reason: String,
    },
}

/// Adapter the host integration implements against its own routing layer.
pub trait RouteSource {
    /// Lists every route entry in route-table order.
    fn list(&self) -> AppResult<Vec<RouteLine>>;
}

/// In-memory route list.
#[derive(Debug, Clone, Default)]
pub struct StaticRoutes(pub Vec<Route>);

impl RouteSource for StaticRoutes {
    fn list(&self) -> AppResult<Vec<RouteLine>> {
        Ok(self.0.iter().cloned().map(RouteLine::Parsed).collect())
    }
}

/// A JSON array of `{http_verb, path, action_path}` records.
#[derive(Debug, Clone)]
pub struct JsonRoutes {
    records: Vec<serde_json::Value>,
}

impl JsonRoutes {
    /// Parses the array; a document that is not an array is an error.
    pub fn parse(json: &str) -> AppResult<Self> {
        let records: Vec<serde_json::Value> = serde_json::from_str(json)?;
        Ok(Self { records })
    }
}

impl RouteSource for JsonRoutes {
    fn list(&self) -> AppResult<Vec<RouteLine>> {
        Ok(self
            .records
            .iter()
            .map(|record| match serde_json::from_value::<Route>(record.clone()) {
                Ok(route) => RouteLine::Parsed(Route::new(
                    route.http_verb,
                    route.path,
                    route.action_path,
                )),
                Err(e) => RouteLine::Invalid {
                    line: record.to_string(),
                    reason: e.to_string(),
                },
            })
            .collect())
    }
}

/// Console route table text, one route per line:
/// `[name] VERB /path(.:format) unit#action`.
#[derive(Debug, Clone)]
pub struct RouteTableText {
    text: String,
}

impl RouteTableText {
    /// Wraps the raw table text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl RouteSource for RouteTableText {
    fn list(&self) -> AppResult<Vec<RouteLine>> {
        Ok(self
            .text
            .lines()
            .filter(|line| !line.trim().is_empty() && !is_header_line(line))
            .map(|line| RouteLine::Raw(line.to_string()))
            .collect())
    }
}

fn is_header_line(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    words.first() == Some(&"Prefix") && words.get(1) == Some(&"Verb")
}

fn route_line_regex() -> &'static Regex {
    static ROUTE_RE: OnceLock<Regex> = OnceLock::new();
    // Optional lowercase route name, then VERB[|VERB] /path unit#action
    ROUTE_RE.get_or_init(|| {
        Regex::new(r"^\s*(?:[a-z0-9_]+\s+)?([A-Z]+(?:\|[A-Z]+)*)\s+(/\S*)\s+(\S+#\S+)")
            .expect("Invalid regex")
    })
}

/// Parses one console route-table line into a [`Route`].
///
/// e.g. `api_v1_examples GET /api/v1/examples/:id(.:format) api/v1/examples#show`
/// becomes `get /api/v1/examples/{id} api/v1/examples#show`.
pub fn parse_route_line(line: &str) -> Result<Route, String> {
    let caps = route_line_regex()
        .captures(line)
        .ok_or_else(|| "expected `VERB /path unit#action`".to_string())?;
    let route = Route::new(&caps[1], to_openapi_path(&caps[2]), &caps[3]);
    route.check()?;
    Ok(route)
}

/// Routes grouped by unit path, in route-table order.
#[derive(Debug, Clone, Default)]
pub struct RouteIndex {
    by_unit: IndexMap<String, Vec<Route>>,
    diagnostics: Diagnostics,
}

impl RouteIndex {
    /// Builds the index from a route source, skipping malformed entries.
    pub fn build(source: &dyn RouteSource) -> AppResult<Self> {
        let mut index = Self::default();
        for entry in source.list()? {
            let parsed = match entry {
                RouteLine::Parsed(route) => match route.check() {
                    Ok(()) => Ok(route),
                    Err(reason) => Err((
                        format!("{} {} {}", route.http_verb, route.path, route.action_path),
                        reason,
                    )),
                },
                RouteLine::Raw(line) => parse_route_line(&line).map_err(|reason| (line, reason)),
                RouteLine::Invalid { line, reason } => Err((line, reason)),
            };
            match parsed {
                Ok(route) => index.insert(route),
                Err((line, reason)) => index
                    .diagnostics
                    .push(Diagnostic::MalformedRouteLine { line, reason }),
            }
        }
        tracing::debug!(
            units = index.by_unit.len(),
            skipped = index.diagnostics.len(),
            "route index built"
        );
        Ok(index)
    }

    /// Builds the index from already typed routes.
    pub fn from_routes(routes: impl IntoIterator<Item = Route>) -> Self {
        let mut index = Self::default();
        for route in routes {
            index.insert(route);
        }
        index
    }

    fn insert(&mut self, route: Route) {
        self.by_unit
            .entry(route.unit_path().to_string())
            .or_default()
            .push(route);
    }

    /// All routes of a unit.
    pub fn lookup(&self, unit_path: &str) -> &[Route] {
        self.by_unit.get(unit_path).map_or(&[], Vec::as_slice)
    }

    /// Routes whose identifier is exactly `unit_path#action`.
    pub fn find_for_action(&self, unit_path: &str, action: &str) -> Vec<&Route> {
        let action_path = format!("{}#{}", unit_path, action);
        self.lookup(unit_path)
            .iter()
            .filter(|route| route.action_path == action_path)
            .collect()
    }

    /// Distinct action names routed to a unit, in table order.
    pub fn actions_for(&self, unit_path: &str) -> Vec<&str> {
        let mut actions: Vec<&str> = Vec::new();
        for route in self.lookup(unit_path) {
            if !actions.contains(&route.action()) {
                actions.push(route.action());
            }
        }
        actions
    }

    /// Unit paths in first-seen order.
    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.by_unit.keys().map(String::as_str)
    }

    /// Total number of indexed routes.
    pub fn len(&self) -> usize {
        self.by_unit.values().map(Vec::len).sum()
    }

    /// True when no route was indexed.
    pub fn is_empty(&self) -> bool {
        self.by_unit.is_empty()
    }

    /// Entries skipped while building.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
                  Prefix Verb   URI Pattern                      Controller#Action
        api_v1_examples GET    /api/v1/examples(.:format)        api/v1/examples#index
                        POST   /api/v1/examples(.:format)        api/v1/examples#create
         api_v1_example GET    /api/v1/examples/:id(.:format)    api/v1/examples#show
                        PATCH  /api/v1/examples/:id(.:format)    api/v1/examples#update
                        PUT    /api/v1/examples/:id(.:format)    api/v1/examples#update
                 mounted        /sidekiq                          Sidekiq::Web
             api_v1_pets GET    /api/v1/pets(.:format)            api/v1/pets#index
    "#;

    #[test]
    fn test_parse_route_line() {
        let route =
            parse_route_line("api_v1_example GET /api/v1/examples/:id(.:format) api/v1/examples#show")
                .unwrap();
        assert_eq!(route.http_verb, "get");
        assert_eq!(route.path, "/api/v1/examples/{id}");
        assert_eq!(route.unit_path(), "api/v1/examples");
        assert_eq!(route.action(), "show");
    }

    #[test]
    fn test_parse_route_line_without_name_and_multi_verb() {
        let route = parse_route_line("  GET|POST /search search#run").unwrap();
        assert_eq!(route.http_verb, "get|post");
        assert_eq!(route.verbs().collect::<Vec<_>>(), vec!["get", "post"]);
    }

    #[test]
    fn test_parse_route_line_rejects_garbage() {
        assert!(parse_route_line("mounted /sidekiq Sidekiq::Web").is_err());
        assert!(parse_route_line("").is_err());
    }

    #[test]
    fn test_optional_segment_is_malformed() {
        assert!(parse_route_line("posts GET /posts(/:page)(.:format) posts#index").is_err());

        let text = "posts GET /posts(/:page)(.:format) posts#index\n      GET /posts/:id(.:format) posts#show\n";
        let index = RouteIndex::build(&RouteTableText::new(text)).unwrap();
        assert_eq!(index.len(), 1);
        assert!(matches!(
            index.diagnostics().iter().next(),
            Some(Diagnostic::MalformedRouteLine { .. })
        ));
    }

    #[test]
    fn test_build_from_text_skips_malformed() {
        let index = RouteIndex::build(&RouteTableText::new(TABLE)).unwrap();
        assert_eq!(index.len(), 6);
        assert_eq!(index.lookup("api/v1/examples").len(), 5);
        assert_eq!(index.diagnostics().len(), 1);
        assert_eq!(
            index.units().collect::<Vec<_>>(),
            vec!["api/v1/examples", "api/v1/pets"]
        );
    }

    #[test]
    fn test_find_for_action_is_anchored() {
        let index = RouteIndex::from_routes(vec![
            Route::new("get", "/widgets", "widgets#index"),
            Route::new("get", "/widgets/all", "widgets#index_all"),
        ]);
        let found = index.find_for_action("widgets", "index");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "/widgets");
        assert!(index.find_for_action("widgets", "ind").is_empty());
    }

    #[test]
    fn test_actions_for_unit() {
        let index = RouteIndex::build(&RouteTableText::new(TABLE)).unwrap();
        assert_eq!(
            index.actions_for("api/v1/examples"),
            vec!["index", "create", "show", "update"]
        );
        assert!(index.actions_for("unknown").is_empty());
    }

    #[test]
    fn test_json_routes_skip_incomplete_records() {
        let json = r#"[
            {"http_verb": "GET", "path": "/widgets", "action_path": "widgets#index"},
            {"http_verb": "post", "path": "/widgets"},
            {"http_verb": "get", "path": "widgets", "action_path": "widgets#show"}
        ]"#;
        let index = RouteIndex::build(&JsonRoutes::parse(json).unwrap()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("widgets")[0].http_verb, "get");
        assert_eq!(index.diagnostics().len(), 2);
    }

    #[test]
    fn test_static_routes() {
        let source = StaticRoutes(vec![Route::new("DELETE", "/w/{id}", "w#destroy")]);
        let index = RouteIndex::build(&source).unwrap();
        assert_eq!(index.lookup("w")[0].http_verb, "delete");
        assert!(index.diagnostics().is_empty());
    }
}
