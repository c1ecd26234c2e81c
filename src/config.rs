//! 跟踪器与会话配置 - 通过JSON文件调整参数

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::detection::MatchPolicy;

/// 默认匹配阈值 (IoU 严格大于该值才算同一目标)
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;

/// 跟踪器参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub iou_threshold: f32,  // 匹配IOU阈值
    pub policy: MatchPolicy, // 同帧重复匹配策略
    /// 本帧新建的轨迹是否保留到下一帧 (默认否: 只有匹配上的轨迹存活)
    pub keep_new_tracks: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            policy: MatchPolicy::Exclusive,
            keep_new_tracks: false,
        }
    }
}

/// 检测会话配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 启动时是否开启跟踪
    pub tracking_enabled: bool,

    pub tracker: TrackerConfig,

    /// 自定义模型目录 (扫描 *.tflite); 为空时使用用户数据目录
    pub models_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tracking_enabled: true,
            tracker: TrackerConfig::default(),
            models_dir: None,
        }
    }
}

impl SessionConfig {
    /// 从JSON文件加载配置
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("读取配置失败: {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("配置文件解析失败: {}", path.display()))?;
        info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    /// 加载配置, 文件缺失或损坏时回退到默认值
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️ {:#}, 使用默认配置", e);
                Self::default()
            }
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("保存配置失败: {}", path.display()))?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    /// 实际使用的模型目录
    pub fn resolved_models_dir(&self) -> Option<PathBuf> {
        self.models_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("camtrack").join("models")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SessionConfig::default();
        assert!(config.tracking_enabled);
        assert_eq!(config.tracker.iou_threshold, 0.5);
        assert_eq!(config.tracker.policy, MatchPolicy::Exclusive);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"tracker": {"policy": "shared"}}"#).unwrap();
        assert!(config.tracking_enabled);
        assert_eq!(config.tracker.policy, MatchPolicy::Shared);
        assert_eq!(config.tracker.iou_threshold, 0.5);
        assert!(!config.tracker.keep_new_tracks);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("camtrack.json");
        let config = SessionConfig {
            tracking_enabled: false,
            tracker: TrackerConfig {
                iou_threshold: 0.3,
                policy: MatchPolicy::Shared,
                keep_new_tracks: true,
            },
            models_dir: Some(dir.path().to_path_buf()),
        };
        config.save(&path).unwrap();
        assert_eq!(SessionConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::load_or_default(&dir.path().join("missing.json"));
        assert_eq!(config, SessionConfig::default());
    }
}
