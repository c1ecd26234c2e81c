//! IoU 贪心跟踪器
//! Greedy IoU tracker: frame-to-frame identity assignment
//!
//! 核心思想:
//! 1. 登记表为空 → 按输入顺序为每个检测分配新ID (冷启动)
//! 2. 逐个检测寻找 IoU 最大且严格大于阈值的轨迹
//! 3. 未匹配的检测 → 新建轨迹 (不计入本帧已匹配集合)
//! 4. 本帧未匹配的轨迹 → 立即退役 (无宽限帧); 新建轨迹默认同样退役,
//!    `keep_new_tracks` 开启时保留到下一帧
//!
//! 无运动模型, 无外观特征, 无全局最优分配。

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::tracker::{FrameTracker, MatchPolicy, Track};
use super::types::{IdentifiedDetection, RawDetection, TrackId};
use crate::config::TrackerConfig;

/// IoU 贪心追踪器
#[derive(Debug, Clone)]
pub struct IouTracker {
    /// 当前跟踪对象, 按ID升序迭代 (匹配顺序与并列裁决可复现)
    registry: BTreeMap<TrackId, Track>,

    /// 下一个分配的ID
    next_id: TrackId,

    /// 匹配 IoU 阈值 (严格大于)
    iou_threshold: f32,

    /// 重复匹配策略
    policy: MatchPolicy,

    /// 本帧新建的轨迹是否躲过本帧退役
    keep_new_tracks: bool,
}

impl IouTracker {
    pub fn new() -> Self {
        Self::with_config(&TrackerConfig::default())
    }

    pub fn with_config(config: &TrackerConfig) -> Self {
        Self {
            registry: BTreeMap::new(),
            next_id: 1,
            iou_threshold: config.iou_threshold,
            policy: config.policy,
            keep_new_tracks: config.keep_new_tracks,
        }
    }

    /// 下一个将被分配的ID
    pub fn next_id(&self) -> TrackId {
        self.next_id
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.registry.get(&id)
    }

    /// 当前所有轨迹 (ID升序)
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.registry.values()
    }

    fn allocate_id(&mut self) -> TrackId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn create_track(&mut self, detection: &RawDetection) -> TrackId {
        let id = self.allocate_id();
        self.registry.insert(id, Track::new(id, detection.clone()));
        id
    }

    /// 在候选轨迹中寻找 IoU 最大且严格超过阈值的一个; 并列时保留ID较小者
    ///
    /// `Exclusive` 跳过本帧已占用 (匹配或新建) 的轨迹, `Shared` 全部参与。
    fn best_match(&self, detection: &RawDetection, claimed: &BTreeSet<TrackId>) -> Option<TrackId> {
        let mut best_id = None;
        let mut best_iou = self.iou_threshold;

        for (&id, track) in &self.registry {
            if self.policy == MatchPolicy::Exclusive && claimed.contains(&id) {
                continue;
            }
            let iou = detection.rect.iou(track.rect());
            if iou > best_iou {
                best_iou = iou;
                best_id = Some(id);
            }
        }

        best_id
    }
}

impl FrameTracker for IouTracker {
    fn assign(&mut self, detections: &[RawDetection]) -> Vec<IdentifiedDetection> {
        // 1. 冷启动: 全部分配新ID
        if self.registry.is_empty() {
            let identified: Vec<IdentifiedDetection> = detections
                .iter()
                .map(|d| IdentifiedDetection {
                    detection: d.clone(),
                    track_id: self.create_track(d),
                })
                .collect();
            debug!(created = identified.len(), "cold start");
            return identified;
        }

        // 2. 逐个检测贪心匹配
        let mut matched: BTreeSet<TrackId> = BTreeSet::new();
        let mut created: BTreeSet<TrackId> = BTreeSet::new();
        let mut claimed: BTreeSet<TrackId> = BTreeSet::new();
        let mut identified = Vec::with_capacity(detections.len());

        for detection in detections {
            let track_id = match self.best_match(detection, &claimed) {
                Some(id) => {
                    if let Some(track) = self.registry.get_mut(&id) {
                        track.detection = detection.clone();
                    }
                    matched.insert(id);
                    id
                }
                None => {
                    let id = self.create_track(detection);
                    created.insert(id);
                    id
                }
            };
            claimed.insert(track_id);
            identified.push(IdentifiedDetection {
                detection: detection.clone(),
                track_id,
            });
        }

        // 3. 不在已匹配集合中的轨迹 → 退役
        let before = self.registry.len();
        let keep_new = self.keep_new_tracks;
        self.registry
            .retain(|id, _| matched.contains(id) || (keep_new && created.contains(id)));

        debug!(
            detections = detections.len(),
            matched = matched.len(),
            created = created.len(),
            retired = before.saturating_sub(self.registry.len()),
            "frame assigned"
        );

        identified
    }

    fn reset(&mut self) {
        debug!(dropped = self.registry.len(), next_id = self.next_id, "tracker reset");
        self.registry.clear();
    }

    fn track_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for IouTracker {
    fn default() -> Self {
        Self::new()
    }
}
