//! 钢筋形状的粗分类与占位标注锚点。
//!
//! 分类只看组内图元构成，规则按顺序匹配，首个命中者生效。锚点在归一化之后
//! 计算，位于屏幕坐标系（Y 轴向下），因此“上方”对应更小的 Y 值。

use dxf2svg_core::geometry::{Bounds2D, Point2, Vector2};

use crate::entity::{CanonicalEntity, EntityKind};
use crate::normalize::bounding_box;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeCategory {
    /// 单根直筋。
    Straight,
    /// 两段直线组成的 L 形。
    LShape,
    /// 含闭合折线的箍筋。
    Stirrup,
    /// 含开放折线或圆弧的弯筋。
    Bent,
    Complex,
}

impl ShapeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeCategory::Straight => "straight",
            ShapeCategory::LShape => "l_shape",
            ShapeCategory::Stirrup => "stirrup",
            ShapeCategory::Bent => "bent",
            ShapeCategory::Complex => "complex",
        }
    }

    fn anchor_rules(self) -> &'static [AnchorRule] {
        match self {
            ShapeCategory::Straight => STRAIGHT_ANCHORS,
            ShapeCategory::LShape | ShapeCategory::Stirrup => CORNER_ANCHORS,
            ShapeCategory::Bent | ShapeCategory::Complex => GENERIC_ANCHORS,
        }
    }
}

/// 组内图元构成统计。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Composition {
    pub segments: usize,
    /// 折线与展开曲线的数量。
    pub polylines: usize,
    pub closed_polylines: usize,
}

impl Composition {
    pub fn of(entities: &[CanonicalEntity]) -> Self {
        entities
            .iter()
            .fold(Self::default(), |mut acc, entity| {
                match entity.kind() {
                    EntityKind::Segment => acc.segments += 1,
                    EntityKind::Polyline | EntityKind::ApproximatedCurve => {
                        acc.polylines += 1;
                        if entity.is_closed() {
                            acc.closed_polylines += 1;
                        }
                    }
                }
                acc
            })
    }

    /// 有序规则表。
    pub fn category(&self) -> ShapeCategory {
        match (self.segments, self.polylines, self.closed_polylines) {
            (1, 0, _) => ShapeCategory::Straight,
            (2, 0, _) => ShapeCategory::LShape,
            (_, polylines, closed) if polylines > 0 && closed > 0 => ShapeCategory::Stirrup,
            (_, polylines, _) if polylines > 0 => ShapeCategory::Bent,
            _ => ShapeCategory::Complex,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum AnchorRef {
    Center,
    /// 左边缘中点。
    Left,
    /// 上边缘中点。
    Top,
    /// 下边缘中点。
    Bottom,
}

#[derive(Debug, Clone, Copy)]
struct AnchorRule {
    name: &'static str,
    reference: AnchorRef,
    dx: f64,
    dy: f64,
}

const STRAIGHT_ANCHORS: &[AnchorRule] = &[
    AnchorRule {
        name: "A",
        reference: AnchorRef::Center,
        dx: 0.0,
        dy: -10.0,
    },
    AnchorRule {
        name: "total",
        reference: AnchorRef::Center,
        dx: 0.0,
        dy: 15.0,
    },
];

const CORNER_ANCHORS: &[AnchorRule] = &[
    AnchorRule {
        name: "A",
        reference: AnchorRef::Left,
        dx: -15.0,
        dy: 0.0,
    },
    AnchorRule {
        name: "B",
        reference: AnchorRef::Top,
        dx: 0.0,
        dy: -10.0,
    },
    AnchorRule {
        name: "total",
        reference: AnchorRef::Bottom,
        dx: 0.0,
        dy: 15.0,
    },
];

const GENERIC_ANCHORS: &[AnchorRule] = &[
    AnchorRule {
        name: "A",
        reference: AnchorRef::Top,
        dx: 0.0,
        dy: -10.0,
    },
    AnchorRule {
        name: "total",
        reference: AnchorRef::Bottom,
        dx: 0.0,
        dy: 15.0,
    },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelAnchor {
    pub name: &'static str,
    pub position: Point2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: ShapeCategory,
    pub composition: Composition,
    pub anchors: Vec<LabelAnchor>,
}

impl Classification {
    pub fn anchor(&self, name: &str) -> Option<Point2> {
        self.anchors
            .iter()
            .find(|anchor| anchor.name == name)
            .map(|anchor| anchor.position)
    }
}

/// 对一个已归一化的组进行分类并计算标注锚点。
pub fn classify(entities: &[CanonicalEntity]) -> Classification {
    let composition = Composition::of(entities);
    let category = composition.category();
    let bounds = bounding_box(entities);
    let anchors = category
        .anchor_rules()
        .iter()
        .map(|rule| LabelAnchor {
            name: rule.name,
            position: reference_point(&bounds, rule.reference)
                .translate(Vector2::new(rule.dx, rule.dy)),
        })
        .collect();
    Classification {
        category,
        composition,
        anchors,
    }
}

fn reference_point(bounds: &Bounds2D, reference: AnchorRef) -> Point2 {
    let center = bounds.center();
    match reference {
        AnchorRef::Center => center,
        AnchorRef::Left => Point2::new(bounds.min().x(), center.y()),
        AnchorRef::Top => Point2::new(center.x(), bounds.min().y()),
        AnchorRef::Bottom => Point2::new(center.x(), bounds.max().y()),
    }
}
