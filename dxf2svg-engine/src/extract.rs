//! 从源文档提取规范化实体，圆弧与圆在此展开为折线。

use std::f64::consts::TAU;

use dxf2svg_core::document::{Arc, Circle, Document, Entity};
use dxf2svg_core::geometry::Point2;
use tracing::{debug, warn};

use crate::entity::CanonicalEntity;

/// 圆弧展开的最少分段数。
pub const ARC_MIN_SEGMENTS: usize = 8;
/// 圆弧每段的目标弧长（图纸单位）。
pub const ARC_SEGMENT_LENGTH: f64 = 10.0;
/// 整圆固定分段数。
pub const CIRCLE_SEGMENTS: usize = 32;
/// 圆弧展开的分段上限，防止超大半径耗尽内存。
pub const ARC_MAX_SEGMENTS: usize = 4096;

/// 按文档顺序提取全部可识别实体。
pub fn extract_entities(document: &Document) -> Vec<CanonicalEntity> {
    extract_filtered(document, None)
}

/// 仅提取指定图层上的实体。
pub fn extract_entities_on_layer(document: &Document, layer: &str) -> Vec<CanonicalEntity> {
    extract_filtered(document, Some(layer))
}

fn extract_filtered(document: &Document, layer: Option<&str>) -> Vec<CanonicalEntity> {
    let mut extracted = Vec::new();
    let mut skipped = 0usize;
    for (_, entity) in document.entities() {
        if layer.is_some_and(|name| entity.layer_name() != name) {
            continue;
        }
        match extract_entity(entity) {
            Some(canonical) => extracted.push(canonical),
            None => skipped += 1,
        }
    }
    debug!(
        extracted = extracted.len(),
        skipped,
        layer = layer.unwrap_or("*"),
        "实体提取完成"
    );
    extracted
}

/// 单个实体的转换；不支持的类型返回 `None`。
pub fn extract_entity(entity: &Entity) -> Option<CanonicalEntity> {
    let color = entity.color_index();
    match entity {
        Entity::Line(line) => Some(CanonicalEntity::segment(
            line.start,
            line.end,
            line.layer.clone(),
            color,
        )),
        Entity::Polyline(polyline) => Some(CanonicalEntity::polyline(
            polyline.vertices.clone(),
            polyline.is_closed,
            polyline.layer.clone(),
            color,
        )),
        Entity::Arc(arc) => Some(CanonicalEntity::approximated_curve(
            flatten_arc(arc),
            false,
            arc.layer.clone(),
            color,
        )),
        Entity::Circle(circle) => Some(CanonicalEntity::approximated_curve(
            flatten_circle(circle),
            true,
            circle.layer.clone(),
            color,
        )),
        Entity::Unsupported(_) => None,
    }
}

/// 圆弧分段数：`max(8, floor(sweep * radius / 10))`，扫掠角以弧度计，
/// 结果不超过 [`ARC_MAX_SEGMENTS`]。
pub fn arc_segment_count(sweep: f64, radius: f64) -> usize {
    let estimate = (sweep * radius / ARC_SEGMENT_LENGTH).floor();
    if estimate.is_nan() || estimate <= ARC_MIN_SEGMENTS as f64 {
        return ARC_MIN_SEGMENTS;
    }
    if estimate > ARC_MAX_SEGMENTS as f64 {
        warn!(
            sweep,
            radius,
            requested = estimate,
            capped = ARC_MAX_SEGMENTS,
            "圆弧分段数超过上限，已截断"
        );
        return ARC_MAX_SEGMENTS;
    }
    estimate as usize
}

/// 将圆弧展开为 `segments + 1` 个等角采样点，包含首尾端点。
pub fn flatten_arc(arc: &Arc) -> Vec<Point2> {
    let start = arc.start_angle.to_radians();
    let mut end = arc.end_angle.to_radians();
    if end < start {
        end += TAU;
    }
    let sweep = end - start;
    let segments = arc_segment_count(sweep, arc.radius);
    sample_circle(arc.center, arc.radius, start, sweep / segments as f64, segments)
}

/// 整圆展开为 33 个点，首尾重复于角度 0 与 2π。
pub fn flatten_circle(circle: &Circle) -> Vec<Point2> {
    sample_circle(
        circle.center,
        circle.radius,
        0.0,
        TAU / CIRCLE_SEGMENTS as f64,
        CIRCLE_SEGMENTS,
    )
}

fn sample_circle(
    center: Point2,
    radius: f64,
    start: f64,
    step: f64,
    segments: usize,
) -> Vec<Point2> {
    (0..=segments)
        .map(|i| {
            let angle = start + i as f64 * step;
            Point2::new(
                center.x() + radius * angle.cos(),
                center.y() + radius * angle.sin(),
            )
        })
        .collect()
}
