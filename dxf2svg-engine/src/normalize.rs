//! 坐标归一化：保持长宽比缩放到画布可用区域并居中，同时翻转 Y 轴。

use dxf2svg_core::geometry::{Bounds2D, Point2};

use crate::entity::CanonicalEntity;
use crate::errors::EngineError;

/// 实体集合为空时使用的占位范围 `(0, 0, 100, 100)`。
pub fn placeholder_bounds() -> Bounds2D {
    Bounds2D::new(Point2::new(0.0, 0.0), Point2::new(100.0, 100.0))
}

/// 目标画布尺寸与四周留白，构造时校验。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    width: f64,
    height: f64,
    margin: f64,
}

impl Canvas {
    pub const DEFAULT_WIDTH: f64 = 800.0;
    pub const DEFAULT_HEIGHT: f64 = 600.0;
    pub const DEFAULT_MARGIN: f64 = 50.0;

    pub fn new(width: f64, height: f64, margin: f64) -> Result<Self, EngineError> {
        if !(width.is_finite() && width > 0.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "canvas width must be positive (got {width})"
            )));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "canvas height must be positive (got {height})"
            )));
        }
        if !(margin.is_finite() && margin >= 0.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "canvas margin must be non-negative (got {margin})"
            )));
        }
        if margin * 2.0 >= width || margin * 2.0 >= height {
            return Err(EngineError::InvalidConfiguration(format!(
                "canvas margin {margin} leaves no drawing area in {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            margin,
        })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[inline]
    pub fn margin(&self) -> f64 {
        self.margin
    }

    #[inline]
    pub fn available_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    #[inline]
    pub fn available_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }

    /// 留白以内的可绘制区域（屏幕坐标）。
    pub fn content_area(&self) -> Bounds2D {
        Bounds2D::new(
            Point2::new(self.margin, self.margin),
            Point2::new(self.width - self.margin, self.height - self.margin),
        )
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            margin: Self::DEFAULT_MARGIN,
        }
    }
}

/// 针对整个集合只计算一次的缩放与平移。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub target_height: f64,
    origin: Point2,
}

impl Transform {
    /// 由源范围与画布推导变换；零宽或零高的轴缩放取 1。
    pub fn fit(bounds: &Bounds2D, canvas: &Canvas) -> Self {
        let orig_width = bounds.width();
        let orig_height = bounds.height();
        let avail_width = canvas.available_width();
        let avail_height = canvas.available_height();

        let scale_x = if orig_width > 0.0 {
            avail_width / orig_width
        } else {
            1.0
        };
        let scale_y = if orig_height > 0.0 {
            avail_height / orig_height
        } else {
            1.0
        };
        let scale = scale_x.min(scale_y);

        Self {
            scale,
            offset_x: canvas.margin() + (avail_width - orig_width * scale) / 2.0,
            offset_y: canvas.margin() + (avail_height - orig_height * scale) / 2.0,
            target_height: canvas.height(),
            origin: bounds.min(),
        }
    }

    /// 源范围的左下角，对应缩放原点。
    #[inline]
    pub fn origin(&self) -> Point2 {
        self.origin
    }

    #[inline]
    pub fn apply(&self, point: Point2) -> Point2 {
        let x = (point.x() - self.origin.x()) * self.scale + self.offset_x;
        let y = (point.y() - self.origin.y()) * self.scale + self.offset_y;
        Point2::new(x, self.target_height - y)
    }
}

/// 归一化结果：新实体集合以及所用的变换。
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub entities: Vec<CanonicalEntity>,
    pub transform: Transform,
}

/// 所有点的轴对齐范围，集合为空时返回 [`placeholder_bounds`]。
pub fn bounding_box(entities: &[CanonicalEntity]) -> Bounds2D {
    let bounds = Bounds2D::from_points(
        entities
            .iter()
            .flat_map(|entity| entity.points().iter().copied()),
    );
    if bounds.is_empty() {
        placeholder_bounds()
    } else {
        bounds
    }
}

/// 以整个集合的范围计算一次变换，并对每个点统一应用。
pub fn normalize(entities: &[CanonicalEntity], canvas: &Canvas) -> Normalized {
    let transform = Transform::fit(&bounding_box(entities), canvas);
    let entities = entities
        .iter()
        .map(|entity| entity.map_points(|point| transform.apply(point)))
        .collect();
    Normalized {
        entities,
        transform,
    }
}
