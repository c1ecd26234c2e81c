//! 检测工作线程
//! 职责: 接收相机帧 → DetectionSession::process_frame → 发送结果
//!
//! 帧通道容量为 0 (rendezvous): 只有工作线程阻塞在 `recv` 时 `submit` 才能成功,
//! 正在处理时直接丢帧, 不排队、不反压。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, error, info};

use super::session::DetectionSession;
use super::types::FrameReport;
use crate::error::SessionError;
use crate::input::CameraFrame;

pub type FrameResult = std::result::Result<FrameReport, SessionError>;

pub struct FrameWorker {
    tx: Option<Sender<CameraFrame>>,
    results: Receiver<FrameResult>,
    handle: Option<JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
}

impl FrameWorker {
    /// 启动工作线程, 线程进入接收循环后才返回
    pub fn spawn(session: Arc<DetectionSession>) -> Result<Self> {
        let (tx, rx): (Sender<CameraFrame>, Receiver<CameraFrame>) = crossbeam_channel::bounded(0);
        let (result_tx, results) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let handle = thread::Builder::new()
            .name("camtrack-detect".to_string())
            .spawn(move || {
                info!("🔍 检测线程启动");
                let _ = ready_tx.send(());
                while let Ok(frame) = rx.recv() {
                    let result = session.process_frame(&frame);
                    if let Err(e) = &result {
                        error!("❌ 帧处理失败 [{}]: {}", e.code(), e);
                    }
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
                info!("🛑 检测线程退出");
            })
            .context("检测线程创建失败")?;
        ready_rx.recv().context("检测线程启动失败")?;

        Ok(Self {
            tx: Some(tx),
            results,
            handle: Some(handle),
            dropped: Arc::new(AtomicU64::new(0)),
        })
    }

    /// 非阻塞提交; 工作线程忙碌时丢弃该帧并返回 false
    ///
    /// 线程刚发出就绪信号、尚未进入 `recv` 的瞬间也会丢帧;
    /// 第一帧不能丢时用 `submit_wait`。
    pub fn submit(&self, frame: CameraFrame) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        match tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(dropped, "worker busy, frame dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// 阻塞提交, 等待工作线程空闲 (回放用)
    pub fn submit_wait(&self, frame: CameraFrame) -> Result<()> {
        let tx = self.tx.as_ref().context("检测线程已停止")?;
        tx.send(frame).context("检测线程已退出")
    }

    pub fn results(&self) -> &Receiver<FrameResult> {
        &self.results
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for FrameWorker {
    fn drop(&mut self) {
        // 关闭通道后工作线程退出循环
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("❌ 检测线程异常退出");
            }
        }
    }
}
