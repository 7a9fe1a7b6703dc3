pub mod geometry {
    //! 几何基础类型，坐标统一为双精度。

    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }
    }

    /// 相对偏移，例如标注锚点相对边界框的位移。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(dx: f64, dy: f64) -> Self {
            Self(DVec2::new(dx, dy))
        }
    }

    /// 轴对齐边界框。空集合以 `min > max` 表示，调用方决定占位值。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self::new(
                Point2(DVec2::splat(f64::INFINITY)),
                Point2(DVec2::splat(f64::NEG_INFINITY)),
            )
        }

        /// 从点序列构建范围；序列为空时返回 `empty()`。
        pub fn from_points<I>(points: I) -> Self
        where
            I: IntoIterator<Item = Point2>,
        {
            points.into_iter().fold(Self::empty(), |mut bounds, point| {
                bounds.include_point(point);
                bounds
            })
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.0.cmpgt(self.max.0).any()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        #[inline]
        pub fn include_point(&mut self, point: Point2) {
            self.min = Point2(self.min.0.min(point.0));
            self.max = Point2(self.max.0.max(point.0));
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            Point2((self.min.0 + self.max.0) * 0.5)
        }

        /// 另一范围是否落在本范围内（含容差）。
        pub fn contains_bounds(&self, other: &Bounds2D, tolerance: f64) -> bool {
            let slack = DVec2::splat(tolerance);
            other.min.0.cmpge(self.min.0 - slack).all()
                && other.max.0.cmple(self.max.0 + slack).all()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn bounds_grow_with_points() {
            let bounds = Bounds2D::from_points([
                Point2::new(3.0, -1.0),
                Point2::new(-2.0, 4.0),
                Point2::new(1.0, 1.0),
            ]);
            assert!(!bounds.is_empty());
            assert_eq!(bounds.min(), Point2::new(-2.0, -1.0));
            assert_eq!(bounds.max(), Point2::new(3.0, 4.0));
            assert!((bounds.width() - 5.0).abs() < 1e-9);
            assert!((bounds.height() - 5.0).abs() < 1e-9);
            assert_eq!(bounds.center(), Point2::new(0.5, 1.5));
        }

        #[test]
        fn empty_and_single_point_bounds() {
            assert!(Bounds2D::from_points(std::iter::empty()).is_empty());
            let single = Bounds2D::from_points([Point2::new(1.0, 1.0)]);
            assert!(!single.is_empty());
            assert_eq!(single.width(), 0.0);
            assert_eq!(single.min(), single.max());
        }

        #[test]
        fn translate_by_offset() {
            let moved = Point2::new(1.0, 2.0).translate(Vector2::new(-1.0, 0.5));
            assert_eq!(moved, Point2::new(0.0, 2.5));
        }

        #[test]
        fn containment_respects_tolerance() {
            let outer = Bounds2D::new(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0));
            let inner = Bounds2D::new(Point2::new(-1e-12, 2.0), Point2::new(10.0, 9.0));
            assert!(outer.contains_bounds(&inner, 1e-9));
            assert!(!outer.contains_bounds(&inner, 0.0));
        }
    }
}

pub mod document {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;

    /// 未指定颜色时采用的 ACI 索引（白色/前景色）。
    pub const DEFAULT_COLOR_INDEX: i16 = 7;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        /// 提供原始数值，便于日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 源文档中的图元，对应 DXF ENTITIES 段的记录。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Circle(Circle),
        Arc(Arc),
        Polyline(Polyline),
        /// 读取时保留类型名，但转换流程会直接跳过。
        Unsupported(UnsupportedEntity),
    }

    impl Entity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                Entity::Line(line) => &line.layer,
                Entity::Circle(circle) => &circle.layer,
                Entity::Arc(arc) => &arc.layer,
                Entity::Polyline(polyline) => &polyline.layer,
                Entity::Unsupported(other) => &other.layer,
            }
        }

        /// DXF 类型名，用于日志。
        pub fn kind_name(&self) -> &str {
            match self {
                Entity::Line(_) => "LINE",
                Entity::Circle(_) => "CIRCLE",
                Entity::Arc(_) => "ARC",
                Entity::Polyline(_) => "POLYLINE",
                Entity::Unsupported(other) => &other.kind,
            }
        }

        /// 颜色索引，缺省时回退到 [`DEFAULT_COLOR_INDEX`]。
        pub fn color_index(&self) -> i16 {
            let color = match self {
                Entity::Line(line) => line.color,
                Entity::Circle(circle) => circle.color,
                Entity::Arc(arc) => arc.color,
                Entity::Polyline(polyline) => polyline.color,
                Entity::Unsupported(_) => None,
            };
            color.unwrap_or(DEFAULT_COLOR_INDEX)
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
        pub layer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub color: Option<i16>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
        pub layer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub color: Option<i16>,
    }

    /// 圆弧实体，角度以度为单位（与 DXF 组码 50/51 一致），逆时针为正。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
        pub layer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub color: Option<i16>,
    }

    /// LWPOLYLINE 与二维 POLYLINE 的统一表示。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<Point2>,
        pub is_closed: bool,
        pub layer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub color: Option<i16>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UnsupportedEntity {
        pub kind: String,
        pub layer: String,
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        layers: BTreeSet<String>,
        entities: Vec<(EntityId, Entity)>,
        next_entity_id: u64,
    }

    impl Document {
        pub fn new() -> Self {
            let mut doc = Self::default();
            doc.ensure_layer("0");
            doc
        }

        pub fn ensure_layer(&mut self, name: impl AsRef<str>) {
            let key = name.as_ref();
            if !self.layers.contains(key) {
                self.layers.insert(key.to_string());
            }
        }

        pub fn add_line(
            &mut self,
            start: Point2,
            end: Point2,
            layer: impl Into<String>,
            color: Option<i16>,
        ) -> EntityId {
            self.add_entity(Entity::Line(Line {
                start,
                end,
                layer: layer.into(),
                color,
            }))
        }

        pub fn add_circle(
            &mut self,
            center: Point2,
            radius: f64,
            layer: impl Into<String>,
            color: Option<i16>,
        ) -> EntityId {
            self.add_entity(Entity::Circle(Circle {
                center,
                radius,
                layer: layer.into(),
                color,
            }))
        }

        pub fn add_arc(
            &mut self,
            center: Point2,
            radius: f64,
            start_angle: f64,
            end_angle: f64,
            layer: impl Into<String>,
            color: Option<i16>,
        ) -> EntityId {
            self.add_entity(Entity::Arc(Arc {
                center,
                radius,
                start_angle,
                end_angle,
                layer: layer.into(),
                color,
            }))
        }

        pub fn add_polyline<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
            color: Option<i16>,
        ) -> EntityId
        where
            I: IntoIterator<Item = Point2>,
        {
            self.add_entity(Entity::Polyline(Polyline {
                vertices: vertices.into_iter().collect(),
                is_closed,
                layer: layer.into(),
                color,
            }))
        }

        pub fn add_entity(&mut self, entity: Entity) -> EntityId {
            self.ensure_layer(entity.layer_name());
            let id = self.next_id();
            self.entities.push((id, entity));
            id
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &str> {
            self.layers.iter().map(String::as_str)
        }

        /// 按读入顺序遍历实体。
        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
            self.entities.iter()
        }

        #[inline]
        pub fn entity_count(&self) -> usize {
            self.entities.len()
        }

        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.entities
                .iter()
                .find_map(|(entity_id, entity)| (*entity_id == id).then_some(entity))
        }

        #[inline]
        fn next_id(&mut self) -> EntityId {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            EntityId(id)
        }
    }

}

pub mod drawing {
    //! 交给序列化器的绘图图元。坐标已完成归一化并格式化为字符串。

    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;

    /// 描边样式：颜色为解析后的十六进制字符串。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Stroke {
        pub color: String,
        pub width: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum DrawPrimitive {
        /// 直线段，端点保留两位小数。
        Line {
            x1: String,
            y1: String,
            x2: String,
            y2: String,
            stroke: Stroke,
        },
        /// `M/L/Z` 路径命令串。
        Path {
            d: String,
            stroke: Stroke,
            closed: bool,
        },
        /// 模板模式下的占位标注。
        Label {
            text: String,
            position: Point2,
            font_size: f64,
            color: String,
        },
    }

    impl DrawPrimitive {
        #[inline]
        pub fn is_label(&self) -> bool {
            matches!(self, DrawPrimitive::Label { .. })
        }
    }

    /// 完整画布：尺寸与归一化目标一致。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Drawing {
        pub width: f64,
        pub height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub background: Option<String>,
        pub primitives: Vec<DrawPrimitive>,
    }

    impl Drawing {
        pub fn new(width: f64, height: f64) -> Self {
            Self {
                width,
                height,
                background: None,
                primitives: Vec::new(),
            }
        }

        pub fn with_background(mut self, fill: Option<String>) -> Self {
            self.background = fill;
            self
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn primitives_serialize_with_kind_tag() {
            let primitive = DrawPrimitive::Path {
                d: "M0.00,0.00 L1.00,1.00".to_string(),
                stroke: Stroke {
                    color: "#FF0000".to_string(),
                    width: 1.0,
                },
                closed: false,
            };
            let value = serde_json::to_value(&primitive).expect("serialize primitive");
            assert_eq!(value["kind"], "path");
            assert_eq!(value["stroke"]["color"], "#FF0000");
            assert!(!primitive.is_label());
        }
    }
}
