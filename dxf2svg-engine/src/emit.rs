//! 把归一化后的实体转换为绘图图元。

use dxf2svg_core::drawing::{DrawPrimitive, Stroke};
use dxf2svg_core::geometry::Point2;

use crate::classify::Classification;
use crate::entity::{CanonicalEntity, EntityKind};

/// 查表失败时使用的颜色。
pub const DEFAULT_STROKE_COLOR: &str = "#000000";
/// 占位标注的字号。
pub const LABEL_FONT_SIZE: f64 = 12.0;

/// AutoCAD 索引色 1-15。
const INDEX_COLORS: [&str; 15] = [
    "#FF0000", // 1 红
    "#FFFF00", // 2 黄
    "#00FF00", // 3 绿
    "#00FFFF", // 4 青
    "#0000FF", // 5 蓝
    "#FF00FF", // 6 洋红
    "#FFFFFF", // 7 白
    "#808080", // 8 灰
    "#C0C0C0", // 9 浅灰
    "#800000", // 10 深红
    "#808000", // 11 橄榄
    "#008000", // 12 深绿
    "#008080", // 13 深青
    "#000080", // 14 深蓝
    "#800080", // 15 紫
];

/// 颜色索引转十六进制颜色，表外索引回退到 [`DEFAULT_STROKE_COLOR`]。
pub fn color_for_index(index: i16) -> &'static str {
    usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| INDEX_COLORS.get(i))
        .copied()
        .unwrap_or(DEFAULT_STROKE_COLOR)
}

#[inline]
fn format_coord(value: f64) -> String {
    format!("{value:.2}")
}

/// `M x,y L x,y ... [Z]` 形式的路径命令串；没有点时返回 `None`。
pub fn path_data(points: &[Point2], closed: bool) -> Option<String> {
    let (first, rest) = points.split_first()?;
    let mut parts = Vec::with_capacity(points.len() + 1);
    parts.push(format!(
        "M{},{}",
        format_coord(first.x()),
        format_coord(first.y())
    ));
    for point in rest {
        parts.push(format!(
            "L{},{}",
            format_coord(point.x()),
            format_coord(point.y())
        ));
    }
    if closed {
        parts.push("Z".to_string());
    }
    Some(parts.join(" "))
}

/// 单个实体的图元；空折线返回 `None`。
pub fn emit_entity(entity: &CanonicalEntity, stroke_width: f64) -> Option<DrawPrimitive> {
    let stroke = Stroke {
        color: color_for_index(entity.color_index()).to_string(),
        width: stroke_width,
    };
    match entity.kind() {
        EntityKind::Segment => {
            let (start, end) = entity.endpoints()?;
            Some(DrawPrimitive::Line {
                x1: format_coord(start.x()),
                y1: format_coord(start.y()),
                x2: format_coord(end.x()),
                y2: format_coord(end.y()),
                stroke,
            })
        }
        EntityKind::Polyline | EntityKind::ApproximatedCurve => {
            let d = path_data(entity.points(), entity.is_closed())?;
            Some(DrawPrimitive::Path {
                d,
                stroke,
                closed: entity.is_closed(),
            })
        }
    }
}

/// 按输入顺序生成图元，不做重排。
pub fn emit_entities(entities: &[CanonicalEntity], stroke_width: f64) -> Vec<DrawPrimitive> {
    entities
        .iter()
        .filter_map(|entity| emit_entity(entity, stroke_width))
        .collect()
}

/// 模板模式的占位标注，文字即锚点名称。
pub fn emit_labels(classification: &Classification) -> Vec<DrawPrimitive> {
    classification
        .anchors
        .iter()
        .map(|anchor| DrawPrimitive::Label {
            text: anchor.name.to_string(),
            position: anchor.position,
            font_size: LABEL_FONT_SIZE,
            color: DEFAULT_STROKE_COLOR.to_string(),
        })
        .collect()
}
