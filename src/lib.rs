// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod adapters; // 平台检测结果适配
pub mod channel; // 宿主命令通道
pub mod config; // 跟踪器/会话配置参数
pub mod detection; // 检测 + 跨帧跟踪
pub mod error; // 会话错误类型
pub mod input; // 相机帧输入
pub mod models; // 模型目录

pub use crate::config::{SessionConfig, TrackerConfig};
pub use crate::detection::{
    DetectionEngine, DetectionReport, DetectionSession, EngineFactory, FrameReport, FrameTracker,
    FrameWorker, IdentifiedDetection, IouTracker, MatchPolicy, RawDetection, Rect, TrackId,
};
pub use crate::error::SessionError;
pub use crate::input::{CameraFrame, Nv21Image};
pub use crate::models::{ModelCatalog, ModelInfo};
