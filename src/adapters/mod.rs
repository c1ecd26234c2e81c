/// 平台适配层 (Platform Adapters)
///
/// 两个平台的检测结果形状不同, 统一转换为 `RawDetection` 后交给同一个跟踪器:
/// - map:    键值表形式 (boundingBox + labels 列表)
/// - native: 原生结构体形式 (整数矩形 left/top/right/bottom + 标签数组)
pub mod map;
pub mod native;

pub use map::{MapDetection, MapLabel, MapRect};
pub use native::{BoundingRect, NativeLabel, NativeObject};
