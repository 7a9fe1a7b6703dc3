//! 连通性分组：按容差匹配端点，把首尾相连的线段聚成一组。
//!
//! 端点坐标按容差量化为整数网格键，连通判断只比较整数键，不做浮点相等比较。
//! 每个坐标轴独立取整，两个相距不足一个容差、但恰好跨越取整边界的点
//! 可能落入不同的网格；反之，相距接近半个网格的点也可能被视为相连。

use std::collections::{HashMap, VecDeque};

use dxf2svg_core::geometry::Point2;
use tracing::debug;

use crate::entity::{CanonicalEntity, Group};
use crate::errors::EngineError;

/// 端点匹配容差（图纸单位）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance(f64);

impl Tolerance {
    pub const DEFAULT: f64 = 1e-4;

    pub fn new(value: f64) -> Result<Self, EngineError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(EngineError::InvalidConfiguration(format!(
                "tolerance must be a positive finite number (got {value})"
            )))
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// 单个坐标轴的量化结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKey {
    /// 网格下标。
    Cell(i64),
    /// 超出 `i64` 网格范围的坐标按位比较；此时容差已小于坐标本身的浮点精度。
    Exact(u64),
}

impl AxisKey {
    fn quantize(value: f64, step: f64) -> Self {
        let cell = (value / step).round();
        if cell >= -(i64::MAX as f64) && cell < i64::MAX as f64 {
            AxisKey::Cell(cell as i64)
        } else {
            AxisKey::Exact(value.to_bits())
        }
    }
}

pub type PointKey = (AxisKey, AxisKey);

/// 将点量化到容差网格，四舍五入到最近的网格点。
pub fn point_key(point: Point2, tolerance: Tolerance) -> PointKey {
    let step = tolerance.get();
    (
        AxisKey::quantize(point.x(), step),
        AxisKey::quantize(point.y(), step),
    )
}

/// 将实体划分为若干组，每个输入实体恰好出现在一个组中。
///
/// 折线与展开曲线各自成组，按输入顺序排在前面；随后是线段的连通分量，
/// 按各分量首个线段在输入中的位置排序，组内顺序为广度优先的访问顺序。
pub fn group_entities(entities: &[CanonicalEntity], tolerance: Tolerance) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut segments = Vec::new();
    for (index, entity) in entities.iter().enumerate() {
        match entity.endpoints() {
            Some((start, end)) => segments.push((index, [start, end])),
            None => groups.push(Group::singleton(entity.clone())),
        }
    }
    let singleton_count = groups.len();

    let mut adjacency: HashMap<PointKey, Vec<usize>> = HashMap::new();
    for (index, endpoints) in &segments {
        let start = point_key(endpoints[0], tolerance);
        let end = point_key(endpoints[1], tolerance);
        adjacency.entry(start).or_default().push(*index);
        if end != start {
            adjacency.entry(end).or_default().push(*index);
        }
    }

    let endpoint_keys: HashMap<usize, [PointKey; 2]> = segments
        .iter()
        .map(|(index, [start, end])| {
            (
                *index,
                [point_key(*start, tolerance), point_key(*end, tolerance)],
            )
        })
        .collect();

    let mut visited = vec![false; entities.len()];
    for (seed, _) in &segments {
        if visited[*seed] {
            continue;
        }
        visited[*seed] = true;
        let mut queue = VecDeque::from([*seed]);
        let mut members = Vec::new();
        while let Some(current) = queue.pop_front() {
            members.push(entities[current].clone());
            let Some(keys) = endpoint_keys.get(&current) else {
                continue;
            };
            for key in keys {
                for &neighbor in adjacency.get(key).map(Vec::as_slice).unwrap_or_default() {
                    if !visited[neighbor] {
                        visited[neighbor] = true;
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        groups.push(Group::new(members));
    }

    debug!(
        entities = entities.len(),
        singletons = singleton_count,
        chains = groups.len() - singleton_count,
        "连通性分组完成"
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(x1: f64, y1: f64, x2: f64, y2: f64) -> CanonicalEntity {
        CanonicalEntity::segment(Point2::new(x1, y1), Point2::new(x2, y2), "0", 7)
    }

    fn total_entities(groups: &[Group]) -> usize {
        groups.iter().map(Group::len).sum()
    }

    #[test]
    fn shared_endpoint_joins_segments() {
        let entities = vec![
            segment(0.0, 0.0, 1.0, 0.0),
            segment(1.0, 0.0, 1.0, 1.0),
            segment(5.0, 5.0, 6.0, 6.0),
        ];
        let groups = group_entities(&entities, Tolerance::default());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].entities(), &entities[0..2]);
        assert_eq!(groups[1].entities(), &entities[2..3]);
    }

    #[test]
    fn near_coincident_endpoints_join_within_tolerance() {
        let entities = vec![
            segment(0.0, 0.0, 1.0, 0.0),
            segment(1.000_01, 0.000_02, 2.0, 0.0),
        ];
        let groups = group_entities(&entities, Tolerance::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn crossing_segments_stay_apart() {
        let entities = vec![segment(0.0, 0.0, 2.0, 2.0), segment(0.0, 2.0, 2.0, 0.0)];
        let groups = group_entities(&entities, Tolerance::default());
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn polylines_and_curves_are_singletons_first() {
        let polyline = CanonicalEntity::polyline(
            vec![Point2::new(1.0, 0.0), Point2::new(3.0, 0.0)],
            false,
            "0",
            7,
        );
        let circle = CanonicalEntity::approximated_curve(
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
            true,
            "0",
            7,
        );
        let entities = vec![
            segment(0.0, 0.0, 1.0, 0.0),
            polyline.clone(),
            segment(1.0, 0.0, 2.0, 0.0),
            circle.clone(),
        ];
        let groups = group_entities(&entities, Tolerance::default());

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].entities(), &[polyline]);
        assert_eq!(groups[1].entities(), &[circle]);
        assert_eq!(groups[2].len(), 2);
        assert!(
            groups[2]
                .entities()
                .iter()
                .all(|entity| entity.kind().is_segment())
        );
    }

    #[test]
    fn chain_is_collected_in_traversal_order() {
        // 输入顺序打乱：0-1、2-3、1-2 连成一条链，另有一段独立的零长线段
        let entities = vec![
            segment(0.0, 0.0, 1.0, 0.0),
            segment(2.0, 0.0, 3.0, 0.0),
            segment(9.0, 9.0, 9.0, 9.0),
            segment(1.0, 0.0, 2.0, 0.0),
        ];
        let groups = group_entities(&entities, Tolerance::default());

        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[0].entities(),
            &[entities[0].clone(), entities[3].clone(), entities[1].clone()]
        );
        assert_eq!(groups[1].entities(), &[entities[2].clone()]);
    }

    #[test]
    fn grouping_is_a_partition() {
        let mut entities = Vec::new();
        for i in 0..20 {
            let x = (i % 7) as f64;
            let y = (i / 7) as f64;
            entities.push(segment(x, y, x + 1.0, y));
        }
        entities.push(CanonicalEntity::polyline(
            vec![Point2::new(0.0, 0.0), Point2::new(0.0, 4.0)],
            false,
            "0",
            7,
        ));
        let groups = group_entities(&entities, Tolerance::default());

        assert!(groups.iter().all(|group| !group.is_empty()));
        assert_eq!(total_entities(&groups), entities.len());
        for entity in &entities {
            let hits = groups
                .iter()
                .filter(|group| group.entities().contains(entity))
                .count();
            assert!(hits >= 1);
        }
    }

    #[test]
    fn tolerance_rejects_non_positive_values() {
        assert!(Tolerance::new(0.0).is_err());
        assert!(Tolerance::new(-1.0).is_err());
        assert!(Tolerance::new(f64::NAN).is_err());
        assert_eq!(Tolerance::new(0.5).map(Tolerance::get), Ok(0.5));
    }

    #[test]
    fn point_key_rounds_to_nearest_bucket() {
        let tolerance = Tolerance::default();
        assert_eq!(
            point_key(Point2::new(1.0, -1.0), tolerance),
            (AxisKey::Cell(10_000), AxisKey::Cell(-10_000))
        );
        assert_eq!(
            point_key(Point2::new(1.000_04, 0.0), tolerance),
            point_key(Point2::new(1.0, 0.0), tolerance)
        );
        assert_ne!(
            point_key(Point2::new(1.000_2, 0.0), tolerance),
            point_key(Point2::new(1.0, 0.0), tolerance)
        );
    }

    #[test]
    fn huge_coordinates_do_not_share_a_saturated_bucket() {
        let tolerance = Tolerance::default();
        let far = point_key(Point2::new(1e16, 0.0), tolerance);
        let farther = point_key(Point2::new(2e16, 0.0), tolerance);
        assert!(matches!(far.0, AxisKey::Exact(_)));
        assert_ne!(far, farther);

        let entities = vec![
            segment(1e16, 0.0, 2e16, 0.0),
            segment(3e16, 0.0, 4e16, 0.0),
            segment(2e16, 0.0, 2e16, 5.0),
        ];
        let groups = group_entities(&entities, tolerance);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].entities(), &[entities[1].clone()]);
    }
}
