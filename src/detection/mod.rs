/// 检测系统 (Detection System)
///
/// - Engine:   外部检测引擎接口
/// - Tracker:  跨帧目标追踪 (IoU 贪心匹配)
/// - Session:  帧处理 + 跟踪开关 + 模型切换
/// - Worker:   独立检测线程, 忙碌时丢帧
pub mod engine;
pub mod iou_tracker;
pub mod session;
pub mod tracker;
pub mod types;
pub mod worker;

pub use engine::{DetectionEngine, EngineFactory, ReplayEngine};
pub use iou_tracker::IouTracker;
pub use session::{DetectionSession, SessionStats};
pub use tracker::{FrameTracker, MatchPolicy, Track};
pub use types::{
    DetectionReport, FrameReport, IdentifiedDetection, LabelScore, RawDetection, Rect, TrackId,
    UNKNOWN_LABEL,
};
pub use worker::{FrameResult, FrameWorker};
