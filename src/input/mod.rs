/// 视频输入系统 (Video Input System)
///
/// - CameraFrame: 相机 YUV_420 帧, 打包为 NV21
/// - Nv21Image: 引擎输入, 可解码为 RGB
pub mod frame;

pub use frame::{CameraFrame, Nv21Image, Plane};
