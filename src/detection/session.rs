//! 检测会话 (Detection Session)
//! 职责: 相机帧 → 检测引擎 → 跟踪器 → FrameReport
//!
//! 同一时刻只处理一帧: 上一帧未完成时新到的帧直接丢弃 (返回空结果, 耗时0),
//! 不排队。跟踪器与引擎各自由一把锁保护, 所有 assign/reset 串行执行。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::engine::{DetectionEngine, EngineFactory};
use super::iou_tracker::IouTracker;
use super::tracker::FrameTracker;
use super::types::{DetectionReport, FrameReport, RawDetection};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::input::CameraFrame;
use crate::models::{ModelCatalog, ModelInfo};

/// 当前使用的引擎及其模型
struct ActiveEngine {
    model: ModelInfo,
    engine: Box<dyn DetectionEngine>,
}

/// 会话统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub active_tracks: usize,
}

/// 忙碌标志守卫: 离开作用域时释放 (包括出错返回)
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct DetectionSession {
    busy: AtomicBool,
    tracking_enabled: AtomicBool,
    tracker: Mutex<IouTracker>,
    engine: Mutex<ActiveEngine>,
    factory: Box<dyn EngineFactory>,
    catalog: ModelCatalog,

    // 统计
    frames_processed: AtomicU64,
    frames_skipped: AtomicU64,
}

impl DetectionSession {
    /// 创建会话并加载默认模型
    pub fn new(config: &SessionConfig, factory: impl EngineFactory + 'static) -> Result<Self> {
        let catalog = ModelCatalog::discover(config.resolved_models_dir().as_deref());
        let model = ModelInfo::default_model();
        let engine = factory
            .create(&model)
            .map_err(|e| SessionError::ModelLoading {
                message: format!("默认模型加载失败: {}", model.name),
                source: Some(e),
            })?;

        info!(
            "🎯 跟踪器: IoU 贪心匹配 (阈值 {}, 策略 {:?}), 跟踪{}",
            config.tracker.iou_threshold,
            config.tracker.policy,
            if config.tracking_enabled { "开启" } else { "关闭" }
        );
        info!("✅ 检测引擎就绪: {} ({})", model.name, engine.name());

        Ok(Self {
            busy: AtomicBool::new(false),
            tracking_enabled: AtomicBool::new(config.tracking_enabled),
            tracker: Mutex::new(IouTracker::with_config(&config.tracker)),
            engine: Mutex::new(ActiveEngine { model, engine }),
            factory: Box::new(factory),
            catalog,
            frames_processed: AtomicU64::new(0),
            frames_skipped: AtomicU64::new(0),
        })
    }

    /// 处理单帧; 忙碌时丢弃该帧
    ///
    /// 帧无法打包为 NV21 时返回 `PROCESSING_ERROR`, 引擎失败时返回 `DETECTION_FAILED`。
    pub fn process_frame(&self, frame: &CameraFrame) -> Result<FrameReport> {
        if self.busy.swap(true, Ordering::AcqRel) {
            self.frames_skipped.fetch_add(1, Ordering::Relaxed);
            warn!("⚠️ 上一帧仍在处理, 丢弃当前帧");
            return Ok(FrameReport::skipped());
        }
        let _guard = BusyGuard(&self.busy);
        let start = Instant::now();

        let image = frame.to_nv21().map_err(|e| {
            error!("❌ 帧格式错误: {:#}", e);
            SessionError::Processing(e)
        })?;

        let detections = {
            let mut active = lock(&self.engine);
            active.engine.detect(&image).map_err(|e| {
                error!("❌ 检测失败 ({}): {:#}", active.model.name, e);
                SessionError::DetectionFailed(e)
            })?
        };

        let reports = self.report_detections(&detections);
        self.frames_processed.fetch_add(1, Ordering::Relaxed);

        Ok(FrameReport {
            detections: reports,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// 跟踪开启时分配ID, 关闭时原样透传 (无ID)
    pub fn report_detections(&self, detections: &[RawDetection]) -> Vec<DetectionReport> {
        if !self.is_tracking_enabled() {
            return detections.iter().map(DetectionReport::from).collect();
        }

        let identified = lock(&self.tracker).assign(detections);
        identified.iter().map(DetectionReport::from).collect()
    }

    /// 开关跟踪; 关闭后重新开启时清空登记表
    pub fn set_tracking_enabled(&self, enabled: bool) {
        let previous = self.tracking_enabled.swap(enabled, Ordering::AcqRel);
        if enabled && !previous {
            self.reset_tracking();
        }
        if enabled != previous {
            info!("🎯 跟踪{}", if enabled { "开启" } else { "关闭" });
        }
    }

    pub fn is_tracking_enabled(&self) -> bool {
        self.tracking_enabled.load(Ordering::Acquire)
    }

    pub fn reset_tracking(&self) {
        lock(&self.tracker).reset();
    }

    /// 强制释放忙碌标志 (停止检测)
    pub fn stop(&self) {
        self.busy.store(false, Ordering::Release);
        debug!("detection stopped");
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// 切换模型
    ///
    /// 自定义模型构造失败时回退到默认模型; 默认模型失败则返回错误。
    /// 切换成功后清空跟踪登记表。返回实际加载的模型名称。
    pub fn load_model(&self, name: &str) -> Result<String> {
        let model = self
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| SessionError::model_loading(format!("未知模型: {name}")))?;

        let (model, engine) = match self.factory.create(&model) {
            Ok(engine) => (model, engine),
            Err(e) if model.is_custom => {
                warn!("⚠️ 自定义模型 {} 加载失败: {:#}, 回退到默认模型", model.name, e);
                let fallback = ModelInfo::default_model();
                let engine =
                    self.factory
                        .create(&fallback)
                        .map_err(|e| SessionError::ModelLoading {
                            message: format!("默认模型加载失败: {}", fallback.name),
                            source: Some(e),
                        })?;
                (fallback, engine)
            }
            Err(e) => {
                return Err(SessionError::ModelLoading {
                    message: format!("模型加载失败: {}", model.name),
                    source: Some(e),
                })
            }
        };

        info!("✅ 模型已切换: {} ({})", model.name, engine.name());
        let loaded = model.name.clone();
        *lock(&self.engine) = ActiveEngine { model, engine };
        self.reset_tracking();
        Ok(loaded)
    }

    pub fn current_model(&self) -> String {
        lock(&self.engine).model.name.clone()
    }

    pub fn available_models(&self) -> &[ModelInfo] {
        self.catalog.models()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            active_tracks: lock(&self.tracker).track_count(),
        }
    }
}
