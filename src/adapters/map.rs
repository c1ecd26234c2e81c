//! 键值表形式的检测结果
//!
//! ```json
//! { "boundingBox": { "left": 10, "top": 20, "width": 30, "height": 40 },
//!   "labels": [ { "text": "cup", "confidence": 0.8 } ] }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::detection::{LabelScore, RawDetection, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLabel {
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
}

/// 单个检测对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDetection {
    pub bounding_box: MapRect,
    #[serde(default)]
    pub labels: Vec<MapLabel>,
    /// 引擎自带的跟踪ID, 不参与跟踪
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<i64>,
}

impl From<&MapDetection> for RawDetection {
    fn from(obj: &MapDetection) -> Self {
        let b = obj.bounding_box;
        let labels: Vec<LabelScore> = obj
            .labels
            .iter()
            .map(|l| LabelScore::new(l.text.clone(), l.confidence))
            .collect();
        RawDetection::from_labels(Rect::new(b.left, b.top, b.width, b.height), &labels)
    }
}

/// 解析单个键值表
pub fn from_value(value: &Value) -> Result<RawDetection> {
    let obj = MapDetection::deserialize(value).context("无效的检测对象")?;
    Ok(RawDetection::from(&obj))
}

/// 解析一帧的检测列表, 保持原顺序
pub fn from_values(values: &[Value]) -> Result<Vec<RawDetection>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| from_value(v).with_context(|| format!("第 {i} 个检测")))
        .collect()
}
