#![deny(missing_docs)]

//! # Diagnostics
//!
//! Recoverable conditions met while building the route index, binding actions and
//! assembling documents. None of these abort generation; each one is logged through
//! `tracing` when recorded and kept so callers can inspect or report them afterwards.

use derive_more::Display;

/// A non-fatal generation warning.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Diagnostic {
    /// An `api` declaration whose action identifier matched no discovered route.
    #[display("no route matches `{action_path}`; its documentation is skipped")]
    NoMatchingRoute {
        /// The `unit#action` identifier that was looked up.
        action_path: String,
    },

    /// A route table entry that could not be parsed and was skipped.
    #[display("skipping malformed route line {line:?}: {reason}")]
    MalformedRouteLine {
        /// The raw entry as supplied by the route source.
        line: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two units bound the same path and verb; the later one won.
    #[display("`{verb} {path}` from `{previous}` is overwritten by `{current}`")]
    ConflictingBinding {
        /// Concrete route path.
        path: String,
        /// HTTP verb (lowercase).
        verb: String,
        /// Unit whose operation was replaced.
        previous: String,
        /// Unit whose operation was kept.
        current: String,
    },
}

impl Diagnostic {
    /// Stable machine-readable code for filtering.
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::NoMatchingRoute { .. } => "warn.no_matching_route",
            Diagnostic::MalformedRouteLine { .. } => "warn.malformed_route_line",
            Diagnostic::ConflictingBinding { .. } => "warn.conflicting_binding",
        }
    }
}

/// Ordered collection of diagnostics recorded during one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs the diagnostic at `warn` level and records it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(code = diagnostic.code(), "{}", diagnostic);
        self.items.push(diagnostic);
    }

    /// Records already-logged diagnostics from another collection.
    pub fn extend(&mut self, other: &Diagnostics) {
        self.items.extend(other.items.iter().cloned());
    }

    /// Iterates in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Action identifiers that were declared without a matching route.
    pub fn unrouted_actions(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|d| match d {
                Diagnostic::NoMatchingRoute { action_path } => Some(action_path.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_code() {
        let d = Diagnostic::NoMatchingRoute {
            action_path: "widgets#archive".into(),
        };
        assert_eq!(d.code(), "warn.no_matching_route");
        assert_eq!(
            d.to_string(),
            "no route matches `widgets#archive`; its documentation is skipped"
        );
    }

    #[test]
    fn test_conflict_message_names_both_units() {
        let d = Diagnostic::ConflictingBinding {
            path: "/widgets".into(),
            verb: "get".into(),
            previous: "widgets".into(),
            current: "admin/widgets".into(),
        };
        let msg = d.to_string();
        assert!(msg.contains("get /widgets"));
        assert!(msg.contains("`widgets`"));
        assert!(msg.contains("`admin/widgets`"));
    }

    #[test]
    fn test_collection_keeps_order() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::MalformedRouteLine {
            line: "???".into(),
            reason: "no action".into(),
        });
        diags.push(Diagnostic::NoMatchingRoute {
            action_path: "a#b".into(),
        });
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.unrouted_actions(), vec!["a#b"]);
        assert_eq!(
            diags.iter().next().map(Diagnostic::code),
            Some("warn.malformed_route_line")
        );
    }
}
