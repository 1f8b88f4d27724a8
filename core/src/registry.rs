#![deny(missing_docs)]

//! # Registry
//!
//! Holds every unit declared during one generation run together with the route
//! index they bind against. A fresh registry per run replaces any process-wide
//! state, so two runs never share declarations.

use crate::diagnostics::Diagnostics;
use crate::routes::RouteIndex;
use crate::stubs::{NoStubs, StubHook};
use crate::unit::{UnitDoc, UnitScope};
use indexmap::IndexMap;

/// Units of one run, in registration order.
pub struct Registry {
    routes: RouteIndex,
    units: IndexMap<String, UnitDoc>,
    stubs: Box<dyn StubHook>,
    diagnostics: Diagnostics,
}

impl Registry {
    /// Creates an empty registry over `routes`, inheriting its diagnostics.
    pub fn new(routes: RouteIndex) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.extend(routes.diagnostics());
        Self {
            routes,
            units: IndexMap::new(),
            stubs: Box::new(NoStubs),
            diagnostics,
        }
    }

    /// Replaces the response stub hook.
    pub fn with_stub_hook(mut self, hook: impl StubHook + 'static) -> Self {
        self.stubs = Box::new(hook);
        self
    }

    /// Declaration scope of `unit_path`, creating its document on first use.
    pub fn unit(&mut self, unit_path: &str) -> UnitScope<'_> {
        let unit = self
            .units
            .entry(unit_path.to_string())
            .or_insert_with(|| UnitDoc::new(unit_path));
        UnitScope::new(
            unit,
            &self.routes,
            self.stubs.as_ref(),
            &mut self.diagnostics,
        )
    }

    /// Every unit document, in registration order.
    pub fn units(&self) -> impl Iterator<Item = &UnitDoc> {
        self.units.values()
    }

    /// One unit document.
    pub fn get(&self, unit_path: &str) -> Option<&UnitDoc> {
        self.units.get(unit_path)
    }

    /// Units whose lineage contains `root`.
    pub fn descendants_of<'a>(&'a self, root: &'a str) -> impl Iterator<Item = &'a UnitDoc> + 'a {
        self.units.values().filter(move |unit| unit.descends_from(root))
    }

    /// The route index.
    pub fn routes(&self) -> &RouteIndex {
        &self.routes
    }

    /// Diagnostics recorded so far, route parsing included.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("routes", &self.routes.len())
            .field("units", &self.units.keys().collect::<Vec<_>>())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{Route, RouteTableText};
    use crate::unit::ApiOptions;

    #[test]
    fn test_units_created_lazily_in_order() {
        let mut registry = Registry::new(RouteIndex::default());
        registry.unit("B").inherits(["Root"]);
        registry.unit("A").inherits(["Root"]);
        registry.unit("B").inherits(["Other"]);

        let names: Vec<&str> = registry.units().map(UnitDoc::unit_path).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(registry.get("B").unwrap().lineage().len(), 2);
        assert_eq!(registry.descendants_of("Other").count(), 1);
    }

    #[test]
    fn test_route_diagnostics_are_inherited() {
        let text = "GET /pets pets#index\nnot a route\n";
        let index = RouteIndex::build(&RouteTableText::new(text)).unwrap();
        let registry = Registry::new(index);
        assert_eq!(registry.diagnostics().len(), 1);
        assert_eq!(registry.routes().len(), 1);
    }

    #[test]
    fn test_unrouted_action_recorded() {
        let index = RouteIndex::from_routes(vec![Route::new("get", "/pets", "pets#index")]);
        let mut registry = Registry::new(index);
        registry
            .unit("PetsController")
            .route_base("pets")
            .api("create", "Create", ApiOptions::new(), |_| {})
            .unwrap();
        assert_eq!(registry.diagnostics().unrouted_actions(), vec!["pets#create"]);
    }
}
