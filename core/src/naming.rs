#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Helpers for deriving tag names and operation ids from unit paths and action names,
//! and for rewriting framework path syntax into OpenAPI path templates.

use heck::{ToSnakeCase, ToUpperCamelCase};

/// Converts a snake_case or path segment into a capitalized identifier.
///
/// e.g. `user_profiles` -> `UserProfiles`
pub fn camelize(s: &str) -> String {
    s.to_upper_camel_case()
}

/// Derives the default tag name of a unit from the last segment of its route base.
///
/// e.g. `api/v1/user_profiles` -> `UserProfiles`
pub fn tag_name_for(route_base: &str) -> String {
    let last = route_base
        .rsplit('/')
        .find(|seg| !seg.is_empty())
        .unwrap_or(route_base);
    camelize(last)
}

/// Derives the default route base of a unit from its identifier.
///
/// Namespaces become path segments, each segment is snake_cased and a trailing
/// `Controller` is dropped: `Api::V1::UserProfilesController` -> `api/v1/user_profiles`.
pub fn route_base_for(unit_path: &str) -> String {
    let segments: Vec<&str> = unit_path
        .split("::")
        .flat_map(|part| part.split('/'))
        .filter(|seg| !seg.is_empty())
        .collect();
    let last = segments.len().saturating_sub(1);
    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            let seg = match seg.strip_suffix("Controller") {
                Some(stem) if i == last && !stem.is_empty() => stem,
                _ => seg,
            };
            seg.to_snake_case()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Derives the default operation id: `<Tag>_<CamelizedAction>`.
pub fn default_operation_id(tag: &str, action: &str) -> String {
    format!("{}_{}", tag, camelize(action))
}

/// Rewrites framework path syntax into an OpenAPI path template.
///
/// - strips a trailing `(.:format)` optional segment
/// - `:id` -> `{id}`
/// - `*glob` -> `{glob}`
pub fn to_openapi_path(path: &str) -> String {
    let trimmed = path.strip_suffix("(.:format)").unwrap_or(path);
    trimmed
        .split('/')
        .map(|seg| {
            if let Some(name) = seg.strip_prefix(':').or_else(|| seg.strip_prefix('*')) {
                format!("{{{}}}", name)
            } else {
                seg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
