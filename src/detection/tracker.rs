//! 多目标跟踪公共组件
//! Common components for cross-frame object tracking

use serde::{Deserialize, Serialize};

use super::types::{IdentifiedDetection, RawDetection, Rect, TrackId};

// ========== 公共数据结构 ==========

/// 跟踪对象 (只属于跟踪器的登记表)
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// 唯一跟踪ID
    pub id: TrackId,

    /// 最近一次匹配到的检测 (框 + 标签 + 置信度)
    pub detection: RawDetection,
}

impl Track {
    pub fn new(id: TrackId, detection: RawDetection) -> Self {
        Self { id, detection }
    }

    pub fn rect(&self) -> &Rect {
        &self.detection.rect
    }
}

/// 同一帧内的重复匹配策略
///
/// - `Exclusive`: 轨迹被某个检测占用 (匹配或新建) 后退出候选池 (标准贪心二分匹配)
/// - `Shared`: 旧版行为, 所有轨迹 (含本帧新建) 始终留在候选池, 可被多个检测重复匹配
///
/// 两种策略的退役规则相同: 只有进入已匹配集合的轨迹存活。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    #[default]
    Exclusive,
    Shared,
}

impl std::str::FromStr for MatchPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exclusive" => Ok(MatchPolicy::Exclusive),
            "shared" | "legacy" => Ok(MatchPolicy::Shared),
            other => Err(anyhow::anyhow!("unknown match policy: {other}")),
        }
    }
}

// ========== 跟踪器统一接口 ==========

/// 跨帧跟踪器 Trait
///
/// 每帧调用一次 `assign`, 调用方负责串行化所有 `assign`/`reset` 调用。
pub trait FrameTracker {
    /// 为当前帧的检测分配跟踪ID
    ///
    /// # 返回
    /// 与输入同序的已识别检测
    fn assign(&mut self, detections: &[RawDetection]) -> Vec<IdentifiedDetection>;

    /// 清空登记表 (不重置ID计数器)
    fn reset(&mut self);

    /// 获取当前跟踪数量
    fn track_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!("exclusive".parse::<MatchPolicy>().unwrap(), MatchPolicy::Exclusive);
        assert_eq!("Legacy".parse::<MatchPolicy>().unwrap(), MatchPolicy::Shared);
        assert!("hungarian".parse::<MatchPolicy>().is_err());
    }

    #[test]
    fn test_policy_serde_lowercase() {
        let json = serde_json::to_string(&MatchPolicy::Shared).unwrap();
        assert_eq!(json, "\"shared\"");
    }
}
