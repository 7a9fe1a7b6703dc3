use dxf2svg_core::geometry::Point2;

/// 规范化实体的种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Segment,
    Polyline,
    /// 圆弧或圆展开后的折线。
    ApproximatedCurve,
}

impl EntityKind {
    #[inline]
    pub fn is_segment(self) -> bool {
        matches!(self, EntityKind::Segment)
    }
}

/// 流水线内部统一的图元表示。构造后不可变，变换总是生成新值。
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEntity {
    kind: EntityKind,
    points: Vec<Point2>,
    closed: bool,
    layer: String,
    color_index: i16,
}

impl CanonicalEntity {
    pub fn segment(start: Point2, end: Point2, layer: impl Into<String>, color_index: i16) -> Self {
        Self {
            kind: EntityKind::Segment,
            points: vec![start, end],
            closed: false,
            layer: layer.into(),
            color_index,
        }
    }

    pub fn polyline(
        points: Vec<Point2>,
        closed: bool,
        layer: impl Into<String>,
        color_index: i16,
    ) -> Self {
        Self {
            kind: EntityKind::Polyline,
            points,
            closed,
            layer: layer.into(),
            color_index,
        }
    }

    pub fn approximated_curve(
        points: Vec<Point2>,
        closed: bool,
        layer: impl Into<String>,
        color_index: i16,
    ) -> Self {
        Self {
            kind: EntityKind::ApproximatedCurve,
            points,
            closed,
            layer: layer.into(),
            color_index,
        }
    }

    #[inline]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    #[inline]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn layer(&self) -> &str {
        &self.layer
    }

    #[inline]
    pub fn color_index(&self) -> i16 {
        self.color_index
    }

    /// 线段的起止点；其他种类返回 `None`。
    pub fn endpoints(&self) -> Option<(Point2, Point2)> {
        match (self.kind, self.points.as_slice()) {
            (EntityKind::Segment, [start, end]) => Some((*start, *end)),
            _ => None,
        }
    }

    /// 对每个点应用映射，返回保留其他属性的新实体。
    pub fn map_points<F>(&self, mut f: F) -> Self
    where
        F: FnMut(Point2) -> Point2,
    {
        Self {
            kind: self.kind,
            points: self.points.iter().map(|point| f(*point)).collect(),
            closed: self.closed,
            layer: self.layer.clone(),
            color_index: self.color_index,
        }
    }
}

/// 被认为构成同一物理形状的实体集合，保证非空。
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    entities: Vec<CanonicalEntity>,
}

impl Group {
    pub(crate) fn new(entities: Vec<CanonicalEntity>) -> Self {
        debug_assert!(!entities.is_empty());
        Self { entities }
    }

    pub fn singleton(entity: CanonicalEntity) -> Self {
        Self {
            entities: vec![entity],
        }
    }

    #[inline]
    pub fn entities(&self) -> &[CanonicalEntity] {
        &self.entities
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
