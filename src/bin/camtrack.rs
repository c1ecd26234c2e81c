/// 检测结果回放 (Detection Replay)
///
/// 读取录制好的逐帧检测结果 (JSON), 经检测线程 + IoU 跟踪器处理,
/// 每帧输出一行 FrameReport JSON。
///
/// 输入格式: 帧数组, 每帧为检测对象数组。`--format map` (默认):
/// ```json
/// [[{"boundingBox": {"left": 0, "top": 0, "width": 100, "height": 100},
///    "labels": [{"text": "cup", "confidence": 0.9}]}]]
/// ```
/// `--format native`:
/// ```json
/// [[{"bounding_box": {"left": 0, "top": 0, "right": 100, "bottom": 100},
///    "labels": [{"text": "cup", "confidence": 0.9, "index": 0}]}]]
/// ```
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use camtrack_rs::adapters::{map, native, NativeObject};
use camtrack_rs::detection::{DetectionEngine, ReplayEngine};
use camtrack_rs::{CameraFrame, DetectionSession, FrameWorker, MatchPolicy, ModelInfo, RawDetection, SessionConfig};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing::{info, warn};

/// 录制文件中检测对象的形状
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// 键值表 (boundingBox 宽高 + labels)
    Map,
    /// 原生结构体 (left/top/right/bottom 整数矩形)
    Native,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay recorded detections through the IoU tracker")]
struct Args {
    /// 录制的检测结果 (JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// 输入格式
    #[arg(long, value_enum, default_value = "map")]
    format: InputFormat,

    /// 会话配置文件 (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 匹配IOU阈值 (覆盖配置文件)
    #[arg(long)]
    iou_threshold: Option<f32>,

    /// 重复匹配策略: exclusive 或 shared
    #[arg(long)]
    policy: Option<String>,

    /// 关闭跟踪, 原样输出检测结果
    #[arg(long)]
    no_tracking: bool,

    /// 格式化输出
    #[arg(long)]
    pretty: bool,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn load_frames(path: &PathBuf, format: InputFormat) -> Result<Vec<Vec<RawDetection>>> {
    let json = fs::read_to_string(path).with_context(|| format!("读取失败: {}", path.display()))?;
    match format {
        InputFormat::Map => {
            let frames: Vec<Vec<Value>> = serde_json::from_str(&json)
                .with_context(|| format!("解析失败: {}", path.display()))?;
            frames
                .iter()
                .enumerate()
                .map(|(i, frame)| map::from_values(frame).with_context(|| format!("第 {i} 帧")))
                .collect()
        }
        InputFormat::Native => {
            let frames: Vec<Vec<NativeObject>> = serde_json::from_str(&json)
                .with_context(|| format!("解析失败: {}", path.display()))?;
            Ok(frames.iter().map(|frame| native::convert(frame)).collect())
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // ========== 配置 ==========
    let mut config = match args.config.as_deref() {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(threshold) = args.iou_threshold {
        config.tracker.iou_threshold = threshold;
    }
    if let Some(policy) = args.policy.as_deref() {
        config.tracker.policy = policy.parse::<MatchPolicy>()?;
    }
    if args.no_tracking {
        config.tracking_enabled = false;
    }

    let frames = load_frames(&args.input, args.format)?;
    let frame_count = frames.len();
    info!("🚀 回放 {} 帧 ({:?}): {}", frame_count, args.format, args.input.display());

    // ========== 检测会话 ==========
    // 录制数据只交给第一次构造的引擎, 之后切换模型得到空引擎
    let recorded = Mutex::new(Some(frames));
    let session = DetectionSession::new(
        &config,
        move |_: &ModelInfo| -> Result<Box<dyn DetectionEngine>> {
            let frames = recorded
                .lock()
                .map_err(|_| anyhow::anyhow!("录制数据锁已损坏"))?
                .take()
                .unwrap_or_default();
            Ok(Box::new(ReplayEngine::new(frames)))
        },
    )?;
    let session = Arc::new(session);

    // ========== 检测线程 ==========
    let worker = FrameWorker::spawn(Arc::clone(&session))?;
    for _ in 0..frame_count {
        worker.submit_wait(CameraFrame::blank(2, 2))?;
        match worker.results().recv().context("检测线程已退出")? {
            Ok(report) => {
                let line = if args.pretty {
                    serde_json::to_string_pretty(&report)?
                } else {
                    serde_json::to_string(&report)?
                };
                println!("{line}");
            }
            Err(e) => warn!("⚠️ 跳过失败帧 [{}]: {}", e.code(), e),
        }
    }

    let stats = session.stats();
    info!(
        "✅ 完成: 处理 {} 帧, 丢弃 {} 帧, 剩余轨迹 {}",
        stats.frames_processed, stats.frames_skipped, stats.active_tracks
    );
    Ok(())
}
