use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One entry of `GET /models`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModelInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
}

impl ModelInfo {
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Response of `GET /models`: model entries keyed by id, plus the default id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModelCatalog {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(flatten)]
    pub models: BTreeMap<String, ModelInfo>,
}

impl ModelCatalog {
    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.models.get(id)
    }
}

/// Response of `GET /image-styles`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ImageStyles {
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub default_style: Option<String>,
    #[serde(default)]
    pub default_size: Option<String>,
    /// Display labels keyed by style value
    #[serde(default)]
    pub style_names: HashMap<String, String>,
    #[serde(default)]
    pub size_names: HashMap<String, String>,
    /// Set when the server fell back to a minimal list
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_splits_default_from_entries() {
        let catalog: ModelCatalog = serde_json::from_value(json!({
            "qwen_normal": {"name": "Qwen", "description": "fast", "features": ["chat", "stream"]},
            "qwen_thinking": {"name": "Qwen thinking", "description": "deep", "features": ["chat", "deep_thinking"]},
            "default": "qwen_normal"
        }))
        .unwrap();

        assert_eq!(catalog.default.as_deref(), Some("qwen_normal"));
        assert_eq!(catalog.models.len(), 2);
        assert!(catalog.get("qwen_thinking").unwrap().has_feature("deep_thinking"));
        assert!(catalog.get("default").is_none());
    }

    #[test]
    fn test_image_styles_fallback_shape() {
        let styles: ImageStyles = serde_json::from_value(json!({
            "error": "lookup failed",
            "styles": ["<auto>"],
            "sizes": ["1024*1024"],
            "default_style": "<auto>",
            "default_size": "1024*1024"
        }))
        .unwrap();
        assert_eq!(styles.styles, vec!["<auto>"]);
        assert!(styles.style_names.is_empty());
        assert!(styles.error.is_some());
    }
}
