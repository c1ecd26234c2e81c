//! 原生结构体形式的检测结果 (整数边界 left/top/right/bottom)

use serde::{Deserialize, Serialize};

use crate::detection::{LabelScore, RawDetection, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingRect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeLabel {
    pub text: String,
    pub confidence: f32,
    #[serde(default)]
    pub index: i32,
}

/// 平台原生检测对象; 平台自带的 `tracking_id` 不参与跟踪
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NativeObject {
    pub bounding_box: BoundingRect,
    #[serde(default)]
    pub labels: Vec<NativeLabel>,
    #[serde(default)]
    pub tracking_id: Option<i32>,
}

impl From<&NativeObject> for RawDetection {
    fn from(obj: &NativeObject) -> Self {
        let b = obj.bounding_box;
        let rect = Rect::new(
            b.left as f32,
            b.top as f32,
            b.width() as f32,
            b.height() as f32,
        );
        let labels: Vec<LabelScore> = obj
            .labels
            .iter()
            .map(|l| LabelScore::new(l.text.clone(), l.confidence))
            .collect();
        RawDetection::from_labels(rect, &labels)
    }
}

/// 转换一帧的原生对象列表
pub fn convert(objects: &[NativeObject]) -> Vec<RawDetection> {
    objects.iter().map(RawDetection::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{FrameTracker, IouTracker};

    #[test]
    fn test_rect_uses_right_bottom() {
        let obj = NativeObject {
            bounding_box: BoundingRect {
                left: 10,
                top: 20,
                right: 110,
                bottom: 70,
            },
            labels: vec![NativeLabel {
                text: "Food".into(),
                confidence: 0.66,
                index: 2,
            }],
            tracking_id: None,
        };
        let det = RawDetection::from(&obj);
        assert_eq!(det.rect, Rect::new(10.0, 20.0, 100.0, 50.0));
        assert_eq!(det.label(), "Food");
    }

    fn object(left: i32, text: &str) -> NativeObject {
        NativeObject {
            bounding_box: BoundingRect { left, top: 0, right: left + 100, bottom: 100 },
            labels: vec![NativeLabel { text: text.into(), confidence: 0.8, index: 0 }],
            tracking_id: Some(99),
        }
    }

    #[test]
    fn test_converted_objects_feed_tracker() {
        let mut tracker = IouTracker::new();
        let first = tracker.assign(&convert(&[object(0, "cup"), object(300, "cat")]));
        let second = tracker.assign(&convert(&[object(302, "cat"), object(4, "cup")]));

        let ids: Vec<_> = second.iter().map(|d| d.track_id).collect();
        assert_eq!(ids, vec![first[1].track_id, first[0].track_id]);
        // 平台ID被忽略
        assert!(second.iter().all(|d| d.track_id != 99));
        assert_eq!(second[0].detection.label(), "cat");
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let obj: NativeObject = serde_json::from_str(
            r#"{"bounding_box": {"left": 1, "top": 2, "right": 3, "bottom": 4}}"#,
        )
        .unwrap();
        assert!(obj.labels.is_empty());
        assert_eq!(obj.tracking_id, None);
    }

    #[test]
    fn test_convert_keeps_order() {
        let objs = vec![
            NativeObject {
                bounding_box: BoundingRect { left: 5, top: 0, right: 6, bottom: 1 },
                ..Default::default()
            },
            NativeObject::default(),
        ];
        let dets = convert(&objs);
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].rect.left, 5.0);
        assert_eq!(dets[1].label(), "Unknown");
    }
}
