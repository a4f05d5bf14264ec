use serde::{Deserialize, Serialize};

use crate::model::{generate_stable_key, ContentId};

/// A content item as seen by the relationship reconciler.
///
/// `stable_key` is assigned once at creation and never changes; it is how
/// "the same" item is found in another environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub stable_key: String,
    pub title: String,
    /// Content kind, e.g. `post` or `page`
    pub kind: String,
}

/// Content item input for creation (without local id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContentItem {
    #[serde(default)]
    pub stable_key: Option<String>,
    pub title: String,
    pub kind: String,
}

impl NewContentItem {
    pub fn new(kind: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            stable_key: None,
            title: title.into(),
            kind: kind.into(),
        }
    }

    pub fn with_stable_key(mut self, stable_key: impl Into<String>) -> Self {
        self.stable_key = Some(stable_key.into());
        self
    }

    pub fn into_item(self, id: ContentId) -> ContentItem {
        ContentItem {
            id,
            stable_key: self.stable_key.unwrap_or_else(generate_stable_key),
            title: self.title,
            kind: self.kind,
        }
    }
}
