//! 组合各阶段：提取 → 分组 → 归一化 → 分类 → 生成图元。
//!
//! 每次调用都是独立的同步转换，不在调用之间保留任何状态。

use dxf2svg_core::document::Document;
use dxf2svg_core::drawing::Drawing;
use tracing::{debug, info};

use crate::classify::{Classification, classify};
use crate::emit::{emit_entities, emit_labels};
use crate::entity::CanonicalEntity;
use crate::errors::EngineError;
use crate::extract::{extract_entities, extract_entities_on_layer};
use crate::group::{Tolerance, group_entities};
use crate::normalize::{Canvas, normalize};

/// 一次转换的全部参数，构造时完成校验。
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    canvas: Canvas,
    stroke_width: f64,
    tolerance: Tolerance,
    layer: Option<String>,
    background: Option<String>,
}

impl ConvertOptions {
    pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;
    pub const DEFAULT_BACKGROUND: &'static str = "#FFFFFF";

    pub fn new(
        canvas: Canvas,
        stroke_width: f64,
        tolerance: Tolerance,
    ) -> Result<Self, EngineError> {
        if !(stroke_width.is_finite() && stroke_width > 0.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "stroke width must be positive (got {stroke_width})"
            )));
        }
        Ok(Self {
            canvas,
            stroke_width,
            tolerance,
            layer: None,
            background: Some(Self::DEFAULT_BACKGROUND.to_string()),
        })
    }

    /// 只提取指定图层上的实体；空字符串视为不过滤。
    pub fn with_layer(mut self, layer: Option<String>) -> Self {
        self.layer = layer.filter(|name| !name.is_empty());
        self
    }

    /// `None` 表示不绘制背景矩形。
    pub fn with_background(mut self, fill: Option<String>) -> Self {
        self.background = fill.filter(|value| !value.trim().is_empty());
        self
    }

    #[inline]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[inline]
    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    #[inline]
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    fn blank_drawing(&self) -> Drawing {
        Drawing::new(self.canvas.width(), self.canvas.height())
            .with_background(self.background.clone())
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            stroke_width: Self::DEFAULT_STROKE_WIDTH,
            tolerance: Tolerance::default(),
            layer: None,
            background: Some(Self::DEFAULT_BACKGROUND.to_string()),
        }
    }
}

/// 模板模式下单个组的输出，`index` 从 1 开始。
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDrawing {
    pub index: usize,
    pub classification: Classification,
    pub drawing: Drawing,
}

fn extract_for(
    document: &Document,
    options: &ConvertOptions,
) -> Result<Vec<CanonicalEntity>, EngineError> {
    let entities = match options.layer() {
        Some(layer) => extract_entities_on_layer(document, layer),
        None => extract_entities(document),
    };
    if entities.is_empty() {
        return Err(EngineError::NoGeometryFound {
            layer: options.layer.clone(),
        });
    }
    debug!(
        source = document.entity_count(),
        extracted = entities.len(),
        layer = options.layer().unwrap_or("*"),
        "按转换参数提取实体"
    );
    Ok(entities)
}

/// 普通模式：整个实体集合一次归一化，输出一张图。
pub fn convert_document(
    document: &Document,
    options: &ConvertOptions,
) -> Result<Drawing, EngineError> {
    let entities = extract_for(document, options)?;
    let normalized = normalize(&entities, options.canvas());
    let mut drawing = options.blank_drawing();
    drawing.primitives = emit_entities(&normalized.entities, options.stroke_width());
    info!(
        entities = entities.len(),
        primitives = drawing.primitives.len(),
        scale = normalized.transform.scale,
        "文档转换完成"
    );
    Ok(drawing)
}

/// 模板模式：按连通性分组，每组单独归一化并附带占位标注。
pub fn convert_groups(
    document: &Document,
    options: &ConvertOptions,
) -> Result<Vec<GroupDrawing>, EngineError> {
    let entities = extract_for(document, options)?;
    let groups = group_entities(&entities, options.tolerance());

    let drawings: Vec<GroupDrawing> = groups
        .into_iter()
        .enumerate()
        .map(|(position, group)| {
            let normalized = normalize(group.entities(), options.canvas());
            let classification = classify(&normalized.entities);
            let mut drawing = options.blank_drawing();
            drawing.primitives = emit_entities(&normalized.entities, options.stroke_width());
            drawing.primitives.extend(emit_labels(&classification));
            debug!(
                group = position + 1,
                entities = group.len(),
                category = classification.category.as_str(),
                "组转换完成"
            );
            GroupDrawing {
                index: position + 1,
                classification,
                drawing,
            }
        })
        .collect();

    info!(entities = entities.len(), groups = drawings.len(), "分组转换完成");
    Ok(drawings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ShapeCategory;
    use dxf2svg_core::drawing::DrawPrimitive;
    use dxf2svg_core::geometry::Point2;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn options_reject_bad_stroke_width() {
        for width in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let result = ConvertOptions::new(Canvas::default(), width, Tolerance::default());
            assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
        }
        let options = ConvertOptions::new(Canvas::default(), 2.0, Tolerance::default())
            .expect("合法参数")
            .with_layer(Some(String::new()))
            .with_background(None);
        assert_eq!(options.layer(), None);
        assert_eq!(options.background(), None);
    }

    #[test]
    fn convert_document_draws_every_entity_in_order() {
        let mut document = Document::new();
        document.add_line(p(0.0, 0.0), p(100.0, 0.0), "0", Some(1));
        document.add_circle(p(50.0, 50.0), 10.0, "GEOM", None);
        let drawing = convert_document(&document, &ConvertOptions::default()).expect("转换成功");

        assert_eq!(drawing.width, 800.0);
        assert_eq!(drawing.height, 600.0);
        assert_eq!(drawing.background.as_deref(), Some("#FFFFFF"));
        assert_eq!(drawing.primitives.len(), 2);
        match &drawing.primitives[0] {
            DrawPrimitive::Line { stroke, .. } => assert_eq!(stroke.color, "#FF0000"),
            other => panic!("unexpected primitive: {other:?}"),
        }
        match &drawing.primitives[1] {
            DrawPrimitive::Path { d, stroke, closed } => {
                assert!(*closed);
                assert!(d.ends_with(" Z"));
                assert_eq!(stroke.color, "#FFFFFF");
            }
            other => panic!("unexpected primitive: {other:?}"),
        }
    }

    #[test]
    fn horizontal_line_uses_unit_scale_and_is_centered() {
        let mut document = Document::new();
        document.add_line(p(0.0, 0.0), p(100.0, 0.0), "0", None);
        let drawing = convert_document(&document, &ConvertOptions::default()).expect("转换成功");
        assert_eq!(
            drawing.primitives,
            vec![DrawPrimitive::Line {
                x1: "350.00".to_string(),
                y1: "300.00".to_string(),
                x2: "450.00".to_string(),
                y2: "300.00".to_string(),
                stroke: dxf2svg_core::drawing::Stroke {
                    color: "#FFFFFF".to_string(),
                    width: 1.0,
                },
            }]
        );
    }

    #[test]
    fn empty_document_reports_no_geometry() {
        let document = Document::new();
        let err = convert_document(&document, &ConvertOptions::default()).expect_err("应当失败");
        assert_eq!(err, EngineError::NoGeometryFound { layer: None });
    }

    #[test]
    fn layer_filter_without_matches_names_layer() {
        let mut document = Document::new();
        document.add_line(p(0.0, 0.0), p(1.0, 0.0), "OTHER", None);
        let options = ConvertOptions::default().with_layer(Some("1號線".to_string()));
        let err = convert_groups(&document, &options).expect_err("应当失败");
        assert_eq!(
            err,
            EngineError::NoGeometryFound {
                layer: Some("1號線".to_string())
            }
        );
    }

    #[test]
    fn convert_groups_numbers_groups_and_adds_labels() {
        let mut document = Document::new();
        document.add_line(p(0.0, 0.0), p(0.0, 200.0), "1號線", None);
        document.add_line(p(0.0, 0.0), p(300.0, 0.0), "1號線", None);
        document.add_circle(p(500.0, 500.0), 25.0, "1號線", None);
        document.add_line(p(1000.0, 0.0), p(1400.0, 0.0), "1號線", None);
        document.add_line(p(9.0, 9.0), p(10.0, 10.0), "其他", None);
        let options = ConvertOptions::default().with_layer(Some("1號線".to_string()));

        let groups = convert_groups(&document, &options).expect("转换成功");
        let summary: Vec<_> = groups
            .iter()
            .map(|group| (group.index, group.classification.category))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, ShapeCategory::Stirrup),
                (2, ShapeCategory::LShape),
                (3, ShapeCategory::Straight),
            ]
        );

        let l_shape = &groups[1].drawing;
        let lines = l_shape
            .primitives
            .iter()
            .filter(|primitive| matches!(primitive, DrawPrimitive::Line { .. }))
            .count();
        let labels = l_shape
            .primitives
            .iter()
            .filter(|primitive| primitive.is_label())
            .count();
        assert_eq!(lines, 2);
        assert_eq!(labels, 3);
        // 标注排在几何图元之后
        assert!(l_shape.primitives[..lines].iter().all(|primitive| !primitive.is_label()));
    }

    #[test]
    fn empty_polyline_is_extracted_but_not_drawn() {
        let mut document = Document::new();
        document.add_polyline(Vec::<Point2>::new(), true, "0", None);
        document.add_line(p(0.0, 0.0), p(10.0, 0.0), "0", None);
        let drawing = convert_document(&document, &ConvertOptions::default()).expect("转换成功");
        assert_eq!(drawing.primitives.len(), 1);
        assert!(matches!(drawing.primitives[0], DrawPrimitive::Line { .. }));
    }

    #[test]
    fn each_group_is_normalized_on_its_own() {
        let mut document = Document::new();
        document.add_line(p(0.0, 0.0), p(10.0, 10.0), "0", None);
        document.add_line(p(5000.0, 5000.0), p(5100.0, 5100.0), "0", None);
        let groups = convert_groups(&document, &ConvertOptions::default()).expect("转换成功");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].drawing.primitives[0], groups[1].drawing.primitives[0]);
    }
}
