// 🔁 Routines - Remembered expense descriptions
//
// A routine is a description the user has asked us to remember. Routines
// compare case-insensitively, feed the description auto-suggest, and
// suppress the "save as routine?" prompt for descriptions already known.

/// Case-insensitive equality used for routine set semantics
pub fn same_routine(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Check if `description` is already a remembered routine
pub fn is_routine(routines: &[String], description: &str) -> bool {
    routines.iter().any(|r| same_routine(r, description))
}

/// Routines containing `query` (case-insensitive), in stored order.
///
/// An empty query suggests nothing.
pub fn suggest<'a>(routines: &'a [String], query: &str) -> Vec<&'a str> {
    if query.is_empty() {
        return Vec::new();
    }

    let needle = query.to_lowercase();
    routines
        .iter()
        .filter(|r| r.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect()
}
