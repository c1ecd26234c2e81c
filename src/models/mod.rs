/// 模型目录 (Model Catalog)
///
/// 列出可供检测引擎加载的模型:
/// - 内置默认模型 (引擎自带, 无文件)
/// - 随包附带的自定义检测模型 `models/object_labeler.tflite`
/// - 模型目录中其它所有 `*.tflite` 文件 (按名称排序)
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_MODEL_NAME: &str = "Default Model";
pub const CUSTOM_MODEL_NAME: &str = "Custom Object Detector";
pub const CUSTOM_MODEL_FILE: &str = "object_labeler.tflite";
const MODEL_EXTENSION: &str = "tflite";

/// 模型描述 (序列化给展示层)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub description: String,
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl ModelInfo {
    pub fn default_model() -> Self {
        Self {
            name: DEFAULT_MODEL_NAME.to_string(),
            description: "Built-in object detection model".to_string(),
            is_custom: false,
            file_path: None,
        }
    }

    pub fn bundled_custom() -> Self {
        Self {
            name: CUSTOM_MODEL_NAME.to_string(),
            description: "Custom TensorFlow Lite model for object detection".to_string(),
            is_custom: true,
            file_path: Some(format!("models/{CUSTOM_MODEL_FILE}")),
        }
    }

    fn from_file(path: &Path) -> Option<Self> {
        if path.extension()?.to_str()? != MODEL_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        Some(Self {
            name: stem.to_string(),
            description: "Custom TensorFlow Lite model".to_string(),
            is_custom: true,
            file_path: Some(path.display().to_string()),
        })
    }
}

/// 可用模型列表
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
}

impl ModelCatalog {
    /// 仅包含内置模型
    pub fn builtin() -> Self {
        Self {
            models: vec![ModelInfo::default_model(), ModelInfo::bundled_custom()],
        }
    }

    /// 内置模型 + 扫描目录; 目录不可读时只记录警告
    pub fn discover(dir: Option<&Path>) -> Self {
        let mut catalog = Self::builtin();
        let Some(dir) = dir else {
            return catalog;
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("⚠️ 无法读取模型目录 {}: {}", dir.display(), e);
                return catalog;
            }
        };

        let mut found: Vec<ModelInfo> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.file_name().and_then(|n| n.to_str()) != Some(CUSTOM_MODEL_FILE))
            .filter_map(|path| ModelInfo::from_file(&path))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(dir = %dir.display(), count = found.len(), "models discovered");
        catalog.models.extend(found);
        catalog
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn find(&self, name: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.name == name)
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_models() {
        let catalog = ModelCatalog::builtin();
        let names: Vec<&str> = catalog.models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec![DEFAULT_MODEL_NAME, CUSTOM_MODEL_NAME]);
        assert!(!catalog.find(DEFAULT_MODEL_NAME).unwrap().is_custom);
    }

    #[test]
    fn test_discover_tflite_files() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["zebra.tflite", "apple.tflite", CUSTOM_MODEL_FILE, "notes.txt"] {
            fs::write(dir.path().join(file), b"").unwrap();
        }

        let catalog = ModelCatalog::discover(Some(dir.path()));
        let names: Vec<&str> = catalog.models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![DEFAULT_MODEL_NAME, CUSTOM_MODEL_NAME, "apple", "zebra"]
        );
        assert!(catalog.find("apple").unwrap().file_path.is_some());
    }

    #[test]
    fn test_missing_dir_keeps_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ModelCatalog::discover(Some(&dir.path().join("nope")));
        assert_eq!(catalog, ModelCatalog::builtin());
    }

    #[test]
    fn test_model_info_json() {
        let json = serde_json::to_value(ModelInfo::default_model()).unwrap();
        assert_eq!(json["isCustom"], false);
        assert!(json.get("filePath").is_none());
    }
}
