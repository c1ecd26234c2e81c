/// 检测系统数据结构定义
/// Data structures for the detection + tracking pipeline
use serde::{Deserialize, Serialize};

// ========== 公共常量 ==========

/// 无标签时的显示名称
pub const UNKNOWN_LABEL: &str = "Unknown";

/// 跟踪ID (从1开始单调递增,永不复用)
pub type TrackId = u64;

// ========== 数据结构 ==========

/// 检测框 (left, top, width, height), 像素坐标
///
/// 坐标空间由检测引擎决定,跟踪器不做任何变换。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// 面积 (退化框宽或高 <= 0 时为 0)
    pub fn area(&self) -> f32 {
        if self.width <= 0.0 || self.height <= 0.0 {
            return 0.0;
        }
        self.width * self.height
    }

    /// 交集矩形; 无正面积重叠时返回 None
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let l = self.left.max(other.left);
        let t = self.top.max(other.top);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());

        if r <= l || b <= t {
            return None;
        }

        Some(Rect::new(l, t, r - l, b - t))
    }

    /// Intersection over Union, 取值 [0, 1]
    pub fn iou(&self, other: &Rect) -> f32 {
        let Some(inter) = self.intersection(other) else {
            return 0.0;
        };

        let inter_area = inter.area();
        let union = self.area() + other.area() - inter_area;
        if union <= 0.0 {
            return 0.0;
        }

        inter_area / union
    }
}

/// 单个 (标签, 置信度) 对
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub text: String,
    pub confidence: f32,
}

impl LabelScore {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// 原始检测结果 (检测引擎 → 跟踪器), 每帧新建, 无身份
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDetection {
    pub rect: Rect,
    pub label: Option<String>,
    pub confidence: Option<f32>,
}

impl RawDetection {
    pub fn new(rect: Rect, label: Option<String>, confidence: Option<f32>) -> Self {
        Self {
            rect,
            label,
            confidence,
        }
    }

    /// 从引擎给出的标签列表构造, 取置信度最高的标签 (并列取第一个)
    pub fn from_labels(rect: Rect, labels: &[LabelScore]) -> Self {
        let best = labels.iter().fold(None::<&LabelScore>, |best, l| match best {
            Some(b) if b.confidence >= l.confidence => Some(b),
            _ => Some(l),
        });

        Self {
            rect,
            label: best.map(|l| l.text.clone()),
            confidence: best.map(|l| l.confidence),
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn confidence(&self) -> f32 {
        self.confidence.unwrap_or(0.0)
    }
}

/// 已分配跟踪ID的检测结果 (跟踪器输出, 不存储)
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifiedDetection {
    pub detection: RawDetection,
    pub track_id: TrackId,
}

/// 上报给展示层的单条检测 (序列化边界)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub label: String,
    pub confidence: f64,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// 跟踪关闭时省略
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<TrackId>,
}

impl DetectionReport {
    pub fn new(detection: &RawDetection, tracking_id: Option<TrackId>) -> Self {
        Self {
            label: detection.label().to_string(),
            confidence: detection.confidence() as f64,
            left: detection.rect.left as f64,
            top: detection.rect.top as f64,
            width: detection.rect.width as f64,
            height: detection.rect.height as f64,
            tracking_id,
        }
    }
}

impl From<&RawDetection> for DetectionReport {
    fn from(detection: &RawDetection) -> Self {
        Self::new(detection, None)
    }
}

impl From<&IdentifiedDetection> for DetectionReport {
    fn from(identified: &IdentifiedDetection) -> Self {
        Self::new(&identified.detection, Some(identified.track_id))
    }
}

/// 单帧处理结果 (会话 → 展示层)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub detections: Vec<DetectionReport>,
    pub processing_time_ms: u64,
}

impl FrameReport {
    /// 忙碌时丢弃的帧: 空列表, 耗时 0
    pub fn skipped() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical_and_disjoint() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(200.0, 200.0, 50.0, 50.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_touching_edges_is_zero() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(100.0, 0.0, 100.0, 100.0);
        assert!(a.intersection(&b).is_none());
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_half_overlap() {
        // 交集 5000, 并集 10000
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(0.0, 0.0, 50.0, 100.0);
        assert_eq!(a.iou(&b), 0.5);
    }

    #[test]
    fn test_iou_degenerate_rects() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let flat = Rect::new(10.0, 10.0, 0.0, 50.0);
        let negative = Rect::new(10.0, 10.0, -20.0, 50.0);
        assert_eq!(a.iou(&flat), 0.0);
        assert_eq!(a.iou(&negative), 0.0);
        assert_eq!(flat.iou(&flat), 0.0);
    }

    #[test]
    fn test_small_shift_overlap() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(5.0, 5.0, 100.0, 100.0);
        let c = Rect::new(60.0, 60.0, 100.0, 100.0);
        assert!(a.iou(&b) > 0.5);
        assert!(a.iou(&c) < 0.5);
    }

    #[test]
    fn test_from_labels_picks_highest() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        let labels = vec![
            LabelScore::new("cup", 0.4),
            LabelScore::new("bottle", 0.9),
            LabelScore::new("vase", 0.9),
        ];
        let det = RawDetection::from_labels(rect, &labels);
        assert_eq!(det.label(), "bottle");
        assert!((det.confidence() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_missing_label_defaults() {
        let det = RawDetection::from_labels(Rect::default(), &[]);
        assert_eq!(det.label(), UNKNOWN_LABEL);
        assert_eq!(det.confidence(), 0.0);
    }

    #[test]
    fn test_report_omits_tracking_id_when_absent() {
        let det = RawDetection::new(Rect::new(1.0, 2.0, 3.0, 4.0), Some("cat".into()), Some(0.5));
        let untracked = serde_json::to_value(DetectionReport::from(&det)).unwrap();
        assert!(untracked.get("trackingId").is_none());
        assert_eq!(untracked["label"], "cat");
        assert_eq!(untracked["width"], 3.0);

        let identified = IdentifiedDetection {
            detection: det,
            track_id: 7,
        };
        let tracked = serde_json::to_value(DetectionReport::from(&identified)).unwrap();
        assert_eq!(tracked["trackingId"], 7);
    }
}
