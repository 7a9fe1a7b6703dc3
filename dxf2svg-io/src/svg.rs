//! SVG 序列化：把 [`Drawing`] 渲染为带缩进的 SVG 文本。

use std::fs;
use std::path::Path;

use dxf2svg_core::drawing::{DrawPrimitive, Drawing, Stroke};
use tracing::debug;

use crate::{DrawingSaver, IoError};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const INDENT: &str = "  ";

#[derive(Debug, Default, Clone, Copy)]
pub struct SvgWriter;

impl SvgWriter {
    pub fn new() -> Self {
        Self
    }
}

impl DrawingSaver for SvgWriter {
    fn save(&self, drawing: &Drawing, path: &Path) -> Result<(), IoError> {
        let content = render_svg(drawing);
        fs::write(path, content).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            path = %path.display(),
            primitives = drawing.primitives.len(),
            "SVG 写入完成"
        );
        Ok(())
    }
}

/// 渲染完整 SVG 文档，图元顺序与输入一致。
pub fn render_svg(drawing: &Drawing) -> String {
    let width = format_dimension(drawing.width);
    let height = format_dimension(drawing.height);
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<svg width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" xmlns=\"{SVG_NAMESPACE}\">\n"
    ));

    if let Some(fill) = &drawing.background {
        out.push_str(&format!(
            "{INDENT}<rect width=\"{width}\" height=\"{height}\" fill=\"{}\"/>\n",
            escape_xml(fill)
        ));
    }

    for primitive in &drawing.primitives {
        out.push_str(INDENT);
        write_primitive(&mut out, primitive);
        out.push('\n');
    }

    out.push_str("</svg>\n");
    out
}

fn write_primitive(out: &mut String, primitive: &DrawPrimitive) {
    match primitive {
        DrawPrimitive::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        } => {
            out.push_str(&format!(
                "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" {} stroke-linecap=\"round\"/>",
                stroke_attributes(stroke)
            ));
        }
        DrawPrimitive::Path { d, stroke, .. } => {
            out.push_str(&format!(
                "<path d=\"{d}\" {} stroke-linecap=\"round\" stroke-linejoin=\"round\" fill=\"none\"/>",
                stroke_attributes(stroke)
            ));
        }
        DrawPrimitive::Label {
            text,
            position,
            font_size,
            color,
        } => {
            out.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{}\" text-anchor=\"middle\" fill=\"{}\">{}</text>",
                position.x(),
                position.y(),
                format_dimension(*font_size),
                escape_xml(color),
                escape_xml(text)
            ));
        }
    }
}

fn stroke_attributes(stroke: &Stroke) -> String {
    format!(
        "stroke=\"{}\" stroke-width=\"{}\"",
        escape_xml(&stroke.color),
        format_dimension(stroke.width)
    )
}

/// 整数值不带小数部分（`800` 而非 `800.0`）。
fn format_dimension(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
