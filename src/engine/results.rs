// SPDX-License-Identifier: PMPL-1.0-or-later

//! Completed strings, kept in discovery order.

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    ordered: Vec<String>,
    members: HashSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a completed string. Returns `false` if it was already present.
    pub fn insert(&mut self, value: String) -> bool {
        if !self.members.insert(value.clone()) {
            return false;
        }
        self.ordered.push(value);
        true
    }

    /// Is `fragment` a substring of any completed string?
    pub fn covers(&self, fragment: &str) -> bool {
        self.ordered.iter().any(|result| result.contains(fragment))
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}
