//! User story linkage
//!
//! A test outcome can be traced back to the user story implemented by its
//! owning test class.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::inflect::humanize;

/// User story derived from a test class identity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStory {
    /// Fully qualified identity of the owning test class
    pub id: String,

    /// Human-readable story name
    pub name: String,
}

impl UserStory {
    /// Derive a story from a test class identity such as
    /// `reports::WhenTotalsAreAggregated`.
    pub fn from_test_class(class: impl Into<String>) -> Self {
        let id = class.into();
        let simple_name = id.rsplit("::").next().unwrap_or(&id).to_string();
        Self {
            name: humanize(&simple_name),
            id,
        }
    }
}

impl fmt::Display for UserStory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_from_plain_class_name() {
        let story = UserStory::from_test_class("SearchingByKeyword");
        assert_eq!(story.id, "SearchingByKeyword");
        assert_eq!(story.name, "Searching by keyword");
    }

    #[test]
    fn test_story_from_qualified_class_name() {
        let story = UserStory::from_test_class("features::search::SearchingByKeyword");
        assert_eq!(story.id, "features::search::SearchingByKeyword");
        assert_eq!(story.name, "Searching by keyword");
    }
}
