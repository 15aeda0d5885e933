use serde::{Deserialize, Serialize};

/// What the shield should block. Opaque to the engine apart from its summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSelection {
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
}

impl BlockSelection {
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty() && self.categories.is_empty() && self.domains.is_empty()
    }

    /// Human description such as "2 apps, 1 category".
    pub fn summary(&self) -> String {
        let parts: Vec<String> = [
            (self.apps.len(), "app", "apps"),
            (self.categories.len(), "category", "categories"),
            (self.domains.len(), "website", "websites"),
        ]
        .into_iter()
        .filter(|(count, _, _)| *count > 0)
        .map(|(count, one, many)| {
            format!("{} {}", count, if count == 1 { one } else { many })
        })
        .collect();

        if parts.is_empty() {
            "Nothing selected".to_string()
        } else {
            parts.join(", ")
        }
    }
}
