/// 检测引擎统一接口
///
/// # 架构说明
///
/// 模型加载、推理、标签打分都由外部引擎完成, 本 crate 只定义边界:
/// ```text
/// 相机帧 → NV21 → DetectionEngine::detect → Vec<RawDetection>
///                                              ↓
///                                      IouTracker::assign
/// ```
///
/// `EngineFactory` 负责按模型描述构造引擎, 用于运行时切换模型。
use anyhow::Result;

use super::types::RawDetection;
use crate::input::Nv21Image;
use crate::models::ModelInfo;

/// 外部目标检测引擎
pub trait DetectionEngine: Send {
    /// 单帧检测
    ///
    /// # Returns
    /// 引擎原始顺序的检测结果 (顺序跨帧不保证稳定)
    fn detect(&mut self, image: &Nv21Image) -> Result<Vec<RawDetection>>;

    /// 引擎名称 (日志用)
    fn name(&self) -> &str {
        "engine"
    }
}

/// 引擎构造器
pub trait EngineFactory: Send + Sync {
    fn create(&self, model: &ModelInfo) -> Result<Box<dyn DetectionEngine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(&ModelInfo) -> Result<Box<dyn DetectionEngine>> + Send + Sync,
{
    fn create(&self, model: &ModelInfo) -> Result<Box<dyn DetectionEngine>> {
        self(model)
    }
}

/// 回放引擎: 依次返回预先录制的检测结果, 用完后返回空帧
pub struct ReplayEngine {
    frames: std::collections::VecDeque<Vec<RawDetection>>,
}

impl ReplayEngine {
    pub fn new(frames: Vec<Vec<RawDetection>>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl DetectionEngine for ReplayEngine {
    fn detect(&mut self, _image: &Nv21Image) -> Result<Vec<RawDetection>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::Rect;
    use crate::input::CameraFrame;

    #[test]
    fn test_replay_engine_drains_in_order() {
        let a = RawDetection::new(Rect::new(0.0, 0.0, 1.0, 1.0), None, None);
        let b = RawDetection::new(Rect::new(5.0, 5.0, 1.0, 1.0), None, None);
        let mut engine = ReplayEngine::new(vec![vec![a.clone()], vec![b.clone()]]);
        let frame = CameraFrame::blank(2, 2).to_nv21().unwrap();

        assert_eq!(engine.detect(&frame).unwrap(), vec![a]);
        assert_eq!(engine.detect(&frame).unwrap(), vec![b]);
        assert!(engine.detect(&frame).unwrap().is_empty());
        assert_eq!(engine.remaining(), 0);
    }

    #[test]
    fn test_closure_factory() {
        let factory = |_: &ModelInfo| -> Result<Box<dyn DetectionEngine>> {
            Ok(Box::new(ReplayEngine::new(Vec::new())))
        };
        let engine = factory.create(&ModelInfo::default_model()).unwrap();
        assert_eq!(engine.name(), "replay");
    }
}
