//! 命令行批量转换：发现输入文件，逐个转换并汇总结果。

use std::fs;
use std::path::{Path, PathBuf};

use dxf2svg_config::AppConfig;
use dxf2svg_core::drawing::Drawing;
use dxf2svg_engine::{
    Canvas, ConvertOptions, EngineError, Tolerance, convert_document, convert_groups,
};
use dxf2svg_io::{DrawingSaver, IoError, SvgWriter};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::FrontendError;
use crate::loader::load_document;
use crate::output_locator::OutputTarget;

const DXF_EXTENSION: &str = "dxf";

/// 一次批量运行的参数。
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    pub convert: ConvertOptions,
    /// 分组模板模式。
    pub grouped: bool,
    pub output: OutputTarget,
}

impl BatchOptions {
    /// 由配置构建；画布、线宽与容差在此校验。
    pub fn from_config(config: &AppConfig, output: OutputTarget) -> Result<Self, EngineError> {
        let canvas_cfg = &config.canvas;
        let canvas = Canvas::new(canvas_cfg.width, canvas_cfg.height, canvas_cfg.margin)?;
        let tolerance = Tolerance::new(config.grouping.tolerance)?;
        let convert = ConvertOptions::new(canvas, canvas_cfg.stroke_width, tolerance)?
            .with_layer(config.grouping.layer.clone())
            .with_background(canvas_cfg.background_fill().map(str::to_string));
        Ok(Self {
            convert,
            grouped: config.grouping.enabled,
            output,
        })
    }
}

/// 单个输入文件的处理结果。
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: Result<Vec<PathBuf>, FrontendError>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn written_files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
            .flatten()
            .map(PathBuf::as_path)
    }

    /// 面向终端的逐行汇总。
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.outcomes.len() + 1);
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(outputs) => {
                    for output in outputs {
                        lines.push(format!(
                            "已转换 {} -> {}",
                            outcome.input.display(),
                            output.display()
                        ));
                    }
                }
                Err(err) if err.is_no_geometry() => {
                    lines.push(format!("{} 中未找到可绘制的几何: {err}", outcome.input.display()));
                }
                Err(err) => {
                    lines.push(format!("处理 {} 失败: {err}", outcome.input.display()));
                }
            }
        }
        lines.push(format!(
            "共 {} 个文件：成功 {}，失败 {}",
            self.outcomes.len(),
            self.succeeded(),
            self.failed()
        ));
        lines
    }
}

fn is_dxf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DXF_EXTENSION))
}

/// 展开输入：目录递归查找 `*.dxf`（不区分大小写，按路径排序），文件原样保留。
pub fn discover_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, FrontendError> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(root = %input.display(), error = %err, "遍历目录时跳过不可读的条目");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_dxf(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        found.sort();
        debug!(root = %input.display(), count = found.len(), "目录扫描完成");
        files.extend(found);
    }

    if files.is_empty() {
        return Err(FrontendError::NoInputs);
    }
    Ok(files)
}

fn save(drawing: &Drawing, path: &Path) -> Result<(), FrontendError> {
    SvgWriter::new()
        .save(drawing, path)
        .map_err(|source| FrontendError::Write { source })
}

/// 转换单个文件，返回写出的 SVG 路径。
pub fn convert_file(input: &Path, options: &BatchOptions) -> Result<Vec<PathBuf>, FrontendError> {
    let document = load_document(input)?;
    if options.grouped {
        let groups = convert_groups(&document, &options.convert)?;
        let mut written = Vec::with_capacity(groups.len());
        for group in &groups {
            let path = options.output.group_path(input, group.index);
            save(&group.drawing, &path)?;
            written.push(path);
        }
        Ok(written)
    } else {
        let drawing = convert_document(&document, &options.convert)?;
        let path = options.output.plain_path(input);
        save(&drawing, &path)?;
        Ok(vec![path])
    }
}

/// 依次处理全部输入；单个文件失败不会中断批处理。
pub fn run_batch(inputs: &[PathBuf], options: &BatchOptions) -> Result<BatchReport, FrontendError> {
    let files = discover_inputs(inputs)?;
    if matches!(options.output, OutputTarget::File(_)) && files.len() > 1 {
        return Err(FrontendError::AmbiguousOutput { count: files.len() });
    }
    if let Some(dir) = options.output.directory() {
        fs::create_dir_all(dir).map_err(|source| FrontendError::Write {
            source: IoError::WriteError {
                path: dir.to_path_buf(),
                source,
            },
        })?;
    }

    info!(
        files = files.len(),
        grouped = options.grouped,
        layer = options.convert.layer().unwrap_or("*"),
        "开始批量转换"
    );

    let mut report = BatchReport::default();
    for input in files {
        let result = convert_file(&input, options);
        match &result {
            Ok(outputs) => info!(input = %input.display(), outputs = outputs.len(), "文件转换完成"),
            Err(err) => warn!(input = %input.display(), error = %err, "文件转换失败"),
        }
        report.outcomes.push(FileOutcome { input, result });
    }

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "批量转换结束"
    );
    Ok(report)
}

/// 打印批处理汇总。
pub fn print_summary(report: &BatchReport) {
    for line in report.summary_lines() {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_ignores_case() {
        assert!(is_dxf(Path::new("a/plan.dxf")));
        assert!(is_dxf(Path::new("a/PLAN.DXF")));
        assert!(!is_dxf(Path::new("a/plan.dwg")));
        assert!(!is_dxf(Path::new("a/dxf")));
    }

    #[test]
    fn options_from_default_config() {
        let options = BatchOptions::from_config(&AppConfig::default(), OutputTarget::Beside)
            .expect("默认配置应当合法");
        assert!(!options.grouped);
        assert_eq!(options.convert, ConvertOptions::default());
    }

    #[test]
    fn invalid_config_values_are_rejected() {
        let mut config = AppConfig::default();
        config.canvas.margin = 400.0;
        assert!(BatchOptions::from_config(&config, OutputTarget::Beside).is_err());

        let mut config = AppConfig::default();
        config.grouping.tolerance = 0.0;
        assert!(BatchOptions::from_config(&config, OutputTarget::Beside).is_err());

        let mut config = AppConfig::default();
        config.canvas.stroke_width = -2.0;
        assert!(matches!(
            BatchOptions::from_config(&config, OutputTarget::Beside),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn empty_report_summary() {
        let report = BatchReport::default();
        assert!(report.is_success());
        assert_eq!(report.summary_lines(), vec!["共 0 个文件：成功 0，失败 0".to_string()]);
    }
}
