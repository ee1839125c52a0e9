//=========================================================================
// Asset Manifest
//=========================================================================
//
// Static mapping from category name to the ordered asset descriptors the
// engine's content loader consumes. Shipped as JSON next to the content
// files and parsed once at startup.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

//=== Descriptors =========================================================

/// Asset kinds the engine loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Json,
    Image,
    Audio,
    Spritesheet,
}

/// Frame slicing for spritesheet assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub frame_width: u32,
    pub frame_height: u32,
}

/// One loadable content file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub asset_type: AssetType,
    pub key: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_config: Option<FrameConfig>,
}

//=== AssetManifest =======================================================

/// Category → descriptor list mapping consumed by the asset loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    categories: BTreeMap<String, Vec<AssetDescriptor>>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a manifest from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Adds (or replaces) one category.
    pub fn insert(&mut self, category: impl Into<String>, assets: Vec<AssetDescriptor>) {
        self.categories.insert(category.into(), assets);
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// The ordered descriptors of one category, if it exists.
    pub fn category(&self, category: &str) -> Option<&[AssetDescriptor]> {
        self.categories.get(category).map(|assets| assets.as_slice())
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(|name| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manifest_json() {
        let manifest = AssetManifest::from_json(
            r#"{
                "categories": {
                    "alphabet": [
                        { "asset_type": "json", "key": "letters", "path": "data/letters.json" },
                        {
                            "asset_type": "spritesheet",
                            "key": "glyphs",
                            "path": "img/glyphs.png",
                            "frame_config": { "frame_width": 64, "frame_height": 64 }
                        }
                    ]
                }
            }"#,
        )
        .unwrap();

        let assets = manifest.category("alphabet").unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].asset_type, AssetType::Json);
        assert_eq!(assets[1].frame_config, Some(FrameConfig { frame_width: 64, frame_height: 64 }));
    }

    #[test]
    fn missing_category_is_none() {
        let manifest = AssetManifest::new();
        assert!(manifest.category("vocabulary").is_none());
        assert!(!manifest.contains("vocabulary"));
    }

    #[test]
    fn descriptor_order_is_preserved() {
        let mut manifest = AssetManifest::new();
        manifest.insert(
            "vocabulary",
            vec![
                AssetDescriptor {
                    asset_type: AssetType::Json,
                    key: "words".to_string(),
                    path: "data/words.json".to_string(),
                    frame_config: None,
                },
                AssetDescriptor {
                    asset_type: AssetType::Audio,
                    key: "pronunciation".to_string(),
                    path: "audio/words.ogg".to_string(),
                    frame_config: None,
                },
            ],
        );

        let keys: Vec<_> = manifest
            .category("vocabulary")
            .unwrap()
            .iter()
            .map(|a| a.key.as_str())
            .collect();
        assert_eq!(keys, vec!["words", "pronunciation"]);
    }
}
