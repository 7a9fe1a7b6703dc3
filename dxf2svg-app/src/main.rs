use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use dxf2svg_config::{AppConfig, ConfigError};
use dxf2svg_frontend::{BatchOptions, OutputTarget, print_summary, run_batch};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

/// 把 DXF 图纸转换为 SVG；目录参数会递归查找其中的 `.dxf` 文件。
#[derive(Debug, Parser)]
#[command(name = "dxf2svg", version, about, long_about = None)]
struct Cli {
    /// 输入的 DXF 文件或目录
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// 配置文件路径（默认读取 DXF2SVG_CONFIG 或 ./config/default.toml）
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 输出文件，仅适用于单个输入
    #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// 输出目录
    #[arg(short = 'd', long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    width: Option<f64>,

    #[arg(long)]
    height: Option<f64>,

    #[arg(long)]
    margin: Option<f64>,

    #[arg(long)]
    stroke_width: Option<f64>,

    /// 只转换该图层上的实体
    #[arg(short, long)]
    layer: Option<String>,

    /// 按连通性分组，每组输出一张带占位标注的模板
    #[arg(short, long)]
    groups: bool,

    /// 端点匹配容差
    #[arg(long)]
    tolerance: Option<f64>,

    /// 不绘制背景矩形
    #[arg(long)]
    no_background: bool,

    /// 覆盖配置中的日志等级
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        let canvas = &mut config.canvas;
        if let Some(width) = self.width {
            canvas.width = width;
        }
        if let Some(height) = self.height {
            canvas.height = height;
        }
        if let Some(margin) = self.margin {
            canvas.margin = margin;
        }
        if let Some(stroke_width) = self.stroke_width {
            canvas.stroke_width = stroke_width;
        }
        if self.no_background {
            canvas.background.clear();
        }

        let grouping = &mut config.grouping;
        if self.groups {
            grouping.enabled = true;
        }
        if let Some(tolerance) = self.tolerance {
            grouping.tolerance = tolerance;
        }
        if let Some(layer) = &self.layer {
            grouping.layer = Some(layer.clone());
        }

        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }

    fn output_target(&self) -> OutputTarget {
        match (&self.output, &self.output_dir) {
            (Some(file), _) => OutputTarget::File(file.clone()),
            (None, Some(dir)) => OutputTarget::Directory(dir.clone()),
            (None, None) => OutputTarget::Beside,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            // 日志尚未初始化
            eprintln!("配置无效：{err}");
            return ExitCode::from(2);
        }
    };
    cli.apply_overrides(&mut config);
    init_logging(&config);
    info!("启动 dxf2svg");

    let options = match BatchOptions::from_config(&config, cli.output_target()) {
        Ok(options) => options,
        Err(err) => {
            error!(error = %err, "转换参数无效");
            eprintln!("参数无效：{err}");
            return ExitCode::from(2);
        }
    };

    match run_batch(&cli.inputs, &options) {
        Ok(report) => {
            print_summary(&report);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            error!(error = %err, "批量转换未能开始");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// 显式指定或自动发现的配置文件存在但无法读取、解析时返回错误；
/// 没有任何配置文件时使用内建默认值。
fn load_configuration(override_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::parse_from([
            "dxf2svg",
            "plan.dxf",
            "--width",
            "1024",
            "--margin",
            "10",
            "--groups",
            "--layer",
            "1號線",
            "--no-background",
            "--tolerance",
            "0.01",
        ]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.canvas.width, 1024.0);
        assert_eq!(config.canvas.height, 600.0);
        assert_eq!(config.canvas.margin, 10.0);
        assert_eq!(config.canvas.background_fill(), None);
        assert!(config.grouping.enabled);
        assert_eq!(config.grouping.layer.as_deref(), Some("1號線"));
        assert_eq!(config.grouping.tolerance, 0.01);
        assert_eq!(cli.output_target(), OutputTarget::Beside);
    }

    #[test]
    fn output_flags_select_target() {
        let cli = Cli::parse_from(["dxf2svg", "a.dxf", "-o", "out.svg"]);
        assert_eq!(cli.output_target(), OutputTarget::File(PathBuf::from("out.svg")));

        let cli = Cli::parse_from(["dxf2svg", "drawings", "-d", "svgs"]);
        assert_eq!(cli.output_target(), OutputTarget::Directory(PathBuf::from("svgs")));

        assert!(Cli::try_parse_from(["dxf2svg", "a.dxf", "-o", "x.svg", "-d", "dir"]).is_err());
        assert!(Cli::try_parse_from(["dxf2svg"]).is_err());
    }

    #[test]
    fn explicit_config_errors_are_returned() {
        let dir = tempfile::tempdir().expect("创建临时目录");
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[canvas\nwidth = ").expect("写入配置");
        assert!(matches!(
            load_configuration(Some(&broken)),
            Err(ConfigError::Parse { .. })
        ));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            load_configuration(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}
