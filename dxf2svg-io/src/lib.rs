pub mod svg;

use std::fs;
use std::path::{Path, PathBuf};

use dxf2svg_core::{
    document::{Arc, Circle, Document, Entity, Line, Polyline, UnsupportedEntity},
    drawing::Drawing,
    geometry::Point2,
};
use thiserror::Error;
use tracing::{debug, warn};

pub use svg::{SvgWriter, render_svg};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, IoError>;
}

pub trait DrawingSaver {
    fn save(&self, drawing: &Drawing, path: &Path) -> Result<(), IoError>;
}

/// ASCII DXF 读取入口，只解析 ENTITIES 段中的几何图元。
#[derive(Debug, Default, Clone, Copy)]
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }

    /// 直接解析内存中的 DXF 文本。
    pub fn load_str(&self, data: &str) -> Result<Document, IoError> {
        DxfParser::new(data)
            .parse()
            .map_err(|err| IoError::InvalidDocument(err.message))
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Document, IoError> {
        let bytes = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        // 旧版 DXF 常以本地代码页保存，非 UTF-8 字节按替换字符处理。
        let data = String::from_utf8_lossy(&bytes);
        let document = self.load_str(&data)?;
        debug!(
            path = %path.display(),
            entities = document.entity_count(),
            "DXF 解析完成"
        );
        Ok(document)
    }
}

#[derive(Debug)]
struct DxfError {
    message: String,
}

impl DxfError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 所有实体共享的组码：8（图层）与 62（颜色）。
#[derive(Debug, Default)]
struct CommonFields {
    layer: Option<String>,
    color: Option<i16>,
}

impl CommonFields {
    /// 若组码属于公共字段则吸收并返回 `true`。
    fn accept(&mut self, code: i32, value: &str, entity: &str) -> Result<bool, DxfError> {
        match code {
            8 => {
                self.layer = Some(value.trim().to_string());
                Ok(true)
            }
            62 => {
                self.color = Some(parse_i16(value, &format!("{entity} 颜色（组码 62）"))?);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn layer(&mut self) -> String {
        self.layer.take().unwrap_or_else(|| "0".to_string())
    }
}

struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    fn parse(mut self) -> Result<Document, DxfError> {
        let mut document = Document::new();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code == 999 {
                continue;
            }
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.trim() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.trim() {
                        "ENTITIES" => self.parse_entities(&mut document)?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        Ok(document)
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value.trim() == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self, document: &mut Document) -> Result<(), DxfError> {
        let mut dropped = 0usize;
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }

            let kind = value.trim();
            match kind {
                "ENDSEC" => break,
                "SEQEND" | "VERTEX" => {
                    // 游离的序列记录，没有所属 POLYLINE
                    self.skip_entity_body()?;
                }
                _ => {
                    let record = self.read_record(kind)?;
                    match record.decode() {
                        Ok(entity) => {
                            document.add_entity(entity);
                        }
                        Err(err) => {
                            dropped += 1;
                            warn!(
                                entity = %record.kind,
                                error = %err.message,
                                "跳过无法解析的实体"
                            );
                        }
                    }
                }
            }
        }
        if dropped > 0 {
            debug!(dropped, "ENTITIES 段中有实体被跳过");
        }
        Ok(())
    }

    /// 读取一个实体的全部组码；旧式 POLYLINE 连同其 VERTEX 记录一起读取。
    fn read_record(&mut self, kind: &str) -> Result<EntityRecord, DxfError> {
        let pairs = self.read_body(kind)?;
        let mut record = EntityRecord {
            kind: kind.to_string(),
            pairs,
            vertices: Vec::new(),
        };
        if kind != "POLYLINE" {
            return Ok(record);
        }

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "VERTEX" => record.vertices.push(self.read_body("VERTEX")?),
                    "SEQEND" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    _ => {
                        // 部分导出器省略 SEQEND
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some(_) => {
                    return Err(DxfError::invalid(
                        "POLYLINE 遇到无效的记录，期望 VERTEX/SEQEND",
                    ));
                }
                None => {
                    return Err(DxfError::invalid(
                        "POLYLINE 缺少 SEQEND（组码 0, 值为 SEQEND）",
                    ));
                }
            }
        }
        Ok(record)
    }

    fn read_body(&mut self, entity: &str) -> Result<Vec<(i32, String)>, DxfError> {
        let mut pairs = Vec::new();
        while let Some(pair) = self.next_body_pair(entity)? {
            pairs.push(pair);
        }
        Ok(pairs)
    }

    /// 读取实体体内的下一组码；遇到下一个 0 组码时回退并返回 `None`。
    fn next_body_pair(&mut self, entity: &str) -> Result<Option<(i32, String)>, DxfError> {
        match self.reader.next_pair()? {
            Some((0, value)) => {
                self.reader.put_back((0, value));
                Ok(None)
            }
            Some(pair) => Ok(Some(pair)),
            None => Err(DxfError::invalid(format!("{entity} 未正确结束"))),
        }
    }

    fn skip_entity_body(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some(_) => continue,
                None => break,
            }
        }
        Ok(())
    }
}

/// 已从组码流中完整读出的实体记录。
///
/// 组码流本身的错误在读取阶段即中止解析；记录内容的错误只影响该实体。
#[derive(Debug)]
struct EntityRecord {
    kind: String,
    pairs: Vec<(i32, String)>,
    /// 旧式 POLYLINE 的各 VERTEX 组码。
    vertices: Vec<Vec<(i32, String)>>,
}

impl EntityRecord {
    fn decode(&self) -> Result<Entity, DxfError> {
        match self.kind.as_str() {
            "LINE" => self.decode_line(),
            "CIRCLE" => self.decode_circle(),
            "ARC" => self.decode_arc(),
            "LWPOLYLINE" => self.decode_lwpolyline(),
            "POLYLINE" => self.decode_polyline(),
            _ => self.decode_unsupported(),
        }
    }

    fn decode_line(&self) -> Result<Entity, DxfError> {
        let mut common = CommonFields::default();
        let mut start_x = None;
        let mut start_y = None;
        let mut end_x = None;
        let mut end_y = None;
        for (code, value) in &self.pairs {
            if common.accept(*code, value, "LINE")? {
                continue;
            }
            match code {
                10 => assign_coord(&mut start_x, value, "LINE 起点 X（组码 10）")?,
                20 => assign_coord(&mut start_y, value, "LINE 起点 Y（组码 20）")?,
                11 => assign_coord(&mut end_x, value, "LINE 终点 X（组码 11）")?,
                21 => assign_coord(&mut end_y, value, "LINE 终点 Y（组码 21）")?,
                _ => {} // 忽略 Z 坐标与其他属性
            }
        }

        let sx = require(start_x, "LINE 缺少起点 X（组码 10）")?;
        let sy = require(start_y, "LINE 缺少起点 Y（组码 20）")?;
        let ex = require(end_x, "LINE 缺少终点 X（组码 11）")?;
        let ey = require(end_y, "LINE 缺少终点 Y（组码 21）")?;

        Ok(Entity::Line(Line {
            start: Point2::new(sx, sy),
            end: Point2::new(ex, ey),
            layer: common.layer(),
            color: common.color,
        }))
    }

    fn decode_circle(&self) -> Result<Entity, DxfError> {
        let mut common = CommonFields::default();
        let mut center_x = None;
        let mut center_y = None;
        let mut radius = None;
        for (code, value) in &self.pairs {
            if common.accept(*code, value, "CIRCLE")? {
                continue;
            }
            match code {
                10 => assign_coord(&mut center_x, value, "CIRCLE 圆心 X（组码 10）")?,
                20 => assign_coord(&mut center_y, value, "CIRCLE 圆心 Y（组码 20）")?,
                40 => assign_coord(&mut radius, value, "CIRCLE 半径（组码 40）")?,
                _ => {}
            }
        }

        let cx = require(center_x, "CIRCLE 缺少圆心 X（组码 10）")?;
        let cy = require(center_y, "CIRCLE 缺少圆心 Y（组码 20）")?;
        let radius = require(radius, "CIRCLE 缺少半径（组码 40）")?;

        Ok(Entity::Circle(Circle {
            center: Point2::new(cx, cy),
            radius,
            layer: common.layer(),
            color: common.color,
        }))
    }

    fn decode_arc(&self) -> Result<Entity, DxfError> {
        let mut common = CommonFields::default();
        let mut center_x = None;
        let mut center_y = None;
        let mut radius = None;
        let mut start_angle = None;
        let mut end_angle = None;
        for (code, value) in &self.pairs {
            if common.accept(*code, value, "ARC")? {
                continue;
            }
            match code {
                10 => assign_coord(&mut center_x, value, "ARC 圆心 X（组码 10）")?,
                20 => assign_coord(&mut center_y, value, "ARC 圆心 Y（组码 20）")?,
                40 => assign_coord(&mut radius, value, "ARC 半径（组码 40）")?,
                50 => assign_coord(&mut start_angle, value, "ARC 起始角（组码 50）")?,
                51 => assign_coord(&mut end_angle, value, "ARC 终止角（组码 51）")?,
                _ => {}
            }
        }

        let cx = require(center_x, "ARC 缺少圆心 X（组码 10）")?;
        let cy = require(center_y, "ARC 缺少圆心 Y（组码 20）")?;
        let radius = require(radius, "ARC 缺少半径（组码 40）")?;
        let start_angle = require(start_angle, "ARC 缺少起始角（组码 50）")?;
        let end_angle = require(end_angle, "ARC 缺少终止角（组码 51）")?;

        Ok(Entity::Arc(Arc {
            center: Point2::new(cx, cy),
            radius,
            start_angle,
            end_angle,
            layer: common.layer(),
            color: common.color,
        }))
    }

    /// 顶点可以为空，空折线交由下游跳过。
    fn decode_lwpolyline(&self) -> Result<Entity, DxfError> {
        let mut common = CommonFields::default();
        let mut is_closed = false;
        let mut vertices: Vec<Point2> = Vec::new();
        let mut pending_x: Option<f64> = None;
        let mut pending_y: Option<f64> = None;
        for (code, value) in &self.pairs {
            if common.accept(*code, value, "LWPOLYLINE")? {
                continue;
            }
            match code {
                70 => {
                    let flag = parse_i32(value, "LWPOLYLINE 标志（组码 70）")?;
                    is_closed = flag & 0x01 == 0x01;
                }
                10 => {
                    let x = parse_f64(value, "LWPOLYLINE 顶点 X")?;
                    if let Some(y) = pending_y.take() {
                        vertices.push(Point2::new(x, y));
                    } else if pending_x.replace(x).is_some() {
                        return Err(DxfError::invalid("LWPOLYLINE 顶点缺少对应的 Y（组码 20）"));
                    }
                }
                20 => {
                    let y = parse_f64(value, "LWPOLYLINE 顶点 Y")?;
                    if let Some(x) = pending_x.take() {
                        vertices.push(Point2::new(x, y));
                    } else if pending_y.replace(y).is_some() {
                        return Err(DxfError::invalid("LWPOLYLINE 顶点缺少对应的 X（组码 10）"));
                    }
                }
                _ => {}
            }
        }

        if pending_x.is_some() || pending_y.is_some() {
            return Err(DxfError::invalid(
                "LWPOLYLINE 顶点坐标成对出现（组码 10/20），检测到不完整的顶点",
            ));
        }

        Ok(Entity::Polyline(Polyline {
            vertices,
            is_closed,
            layer: common.layer(),
            color: common.color,
        }))
    }

    fn decode_polyline(&self) -> Result<Entity, DxfError> {
        let mut common = CommonFields::default();
        let mut flags: i32 = 0;
        for (code, value) in &self.pairs {
            if common.accept(*code, value, "POLYLINE")? {
                continue;
            }
            if *code == 70 {
                flags = parse_i32(value, "POLYLINE 标志（组码 70）")?;
            }
        }

        let layer = common.layer();
        // 0x10 多边形网格、0x40 多面网格不属于平面折线
        if flags & (0x10 | 0x40) != 0 {
            return Ok(Entity::Unsupported(UnsupportedEntity {
                kind: "POLYLINE".to_string(),
                layer,
            }));
        }

        let mut vertices = Vec::with_capacity(self.vertices.len());
        for vertex in &self.vertices {
            if let Some(point) = decode_vertex(vertex)? {
                vertices.push(point);
            }
        }

        Ok(Entity::Polyline(Polyline {
            vertices,
            is_closed: flags & 0x01 == 0x01,
            layer,
            color: common.color,
        }))
    }

    fn decode_unsupported(&self) -> Result<Entity, DxfError> {
        let layer = self
            .pairs
            .iter()
            .find(|(code, _)| *code == 8)
            .map(|(_, value)| value.trim().to_string())
            .unwrap_or_else(|| "0".to_string());
        Ok(Entity::Unsupported(UnsupportedEntity {
            kind: self.kind.clone(),
            layer,
        }))
    }
}

fn decode_vertex(pairs: &[(i32, String)]) -> Result<Option<Point2>, DxfError> {
    let mut x = None;
    let mut y = None;
    for (code, value) in pairs {
        match code {
            10 => assign_coord(&mut x, value, "VERTEX X（组码 10）")?,
            20 => assign_coord(&mut y, value, "VERTEX Y（组码 20）")?,
            _ => {}
        }
    }
    match (x, y) {
        (Some(x), Some(y)) => Ok(Some(Point2::new(x, y))),
        (None, None) => Ok(None),
        _ => Err(DxfError::invalid("VERTEX 缺少完整的 XY 坐标")),
    }
}

fn require(value: Option<f64>, message: &str) -> Result<f64, DxfError> {
    value.ok_or_else(|| DxfError::invalid(message))
}

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        let code_line = loop {
            match self.lines.next() {
                Some(line) => {
                    self.line_number += 1;
                    // 文件末尾常带空行
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => return Ok(None),
            }
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::invalid(format!(
                    "文件在第 {} 行结束，缺少与组码对应的值行",
                    self.line_number
                )));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::invalid(format!(
                "第 {} 行的组码 \"{}\" 无法解析为整数",
                self.line_number - 1,
                code_line.trim()
            ))
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        Ok(Some((code, value)))
    }

    fn put_back(&mut self, pair: (i32, String)) {
        debug_assert!(self.buffer.is_none(), "尝试多次回退 DXF pair");
        self.buffer = Some(pair);
    }
}

fn assign_coord(slot: &mut Option<f64>, raw: &str, context: &str) -> Result<(), DxfError> {
    if slot.is_some() {
        return Err(DxfError::invalid(format!("{context} 出现重复值")));
    }
    *slot = Some(parse_f64(raw, context)?);
    Ok(())
}

fn parse_f64(raw: &str, context: &str) -> Result<f64, DxfError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn parse_i32(raw: &str, context: &str) -> Result<i32, DxfError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn parse_i16(raw: &str, context: &str) -> Result<i16, DxfError> {
    let value = parse_i32(raw, context)?;
    i16::try_from(value)
        .map_err(|_| DxfError::invalid(format!("{context} 超出 i16 范围（值：{value}）")))
}
