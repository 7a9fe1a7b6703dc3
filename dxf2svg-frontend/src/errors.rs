use std::path::PathBuf;

use dxf2svg_engine::EngineError;
use dxf2svg_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("加载 {path:?} 失败: {source}")]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error(transparent)]
    Conversion(#[from] EngineError),
    #[error("写出 SVG 失败: {source}")]
    Write {
        #[source]
        source: IoError,
    },
    #[error("未找到任何 DXF 输入文件")]
    NoInputs,
    #[error("指定了单个输出文件，但共有 {count} 个输入文件")]
    AmbiguousOutput { count: usize },
}

impl FrontendError {
    /// 几何为空属于“未生成输出”，与加载或写出失败区分开。
    pub fn is_no_geometry(&self) -> bool {
        matches!(
            self,
            FrontendError::Conversion(EngineError::NoGeometryFound { .. })
        )
    }
}
