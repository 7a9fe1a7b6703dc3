use std::path::Path;

use dxf2svg_core::document::Document;
use dxf2svg_io::{DocumentLoader, DxfFacade};
use tracing::{info, warn};

use crate::errors::FrontendError;

/// 加载单个 DXF 文件，失败时包装为 [`FrontendError::LoadFailure`]。
pub fn load_document(path: &Path) -> Result<Document, FrontendError> {
    let loader = DxfFacade::new();
    match loader.load(path) {
        Ok(document) => {
            info!(
                path = %path.display(),
                entities = document.entity_count(),
                layers = document.layers().count(),
                "从 DXF 加载文档成功"
            );
            Ok(document)
        }
        Err(source) => {
            warn!(path = %path.display(), error = %source, "加载 DXF 失败");
            Err(FrontendError::LoadFailure {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}
