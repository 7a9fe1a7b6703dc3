use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::trace;

const SVG_EXTENSION: &str = "svg";

/// 输出位置策略。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// 写在输入文件旁边。
    #[default]
    Beside,
    /// 显式输出文件，仅允许单个输入。
    File(PathBuf),
    /// 全部写入同一目录。
    Directory(PathBuf),
}

impl OutputTarget {
    /// 需要提前创建的目录。
    pub fn directory(&self) -> Option<&Path> {
        match self {
            OutputTarget::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    /// 普通模式的输出路径：`<stem>.svg`。
    pub fn plain_path(&self, input: &Path) -> PathBuf {
        let path = match self {
            OutputTarget::File(path) => path.clone(),
            _ => self.base_dir(input).join(format!("{}.{SVG_EXTENSION}", file_stem(input))),
        };
        trace!(input = %input.display(), output = %path.display(), "普通模式输出路径");
        path
    }

    /// 分组模式的输出路径：`<stem>_group<N>.svg`。显式文件只提供目录与主名。
    pub fn group_path(&self, input: &Path, index: usize) -> PathBuf {
        let (dir, stem) = match self {
            OutputTarget::File(path) => (
                parent_dir(path),
                file_stem(path),
            ),
            _ => (self.base_dir(input), file_stem(input)),
        };
        dir.join(format!("{stem}_group{index}.{SVG_EXTENSION}"))
    }

    fn base_dir(&self, input: &Path) -> PathBuf {
        match self {
            OutputTarget::Directory(dir) => dir.clone(),
            _ => parent_dir(input),
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(OsStr::to_str)
        .filter(|stem| !stem.is_empty())
        .unwrap_or("drawing")
        .to_string()
}
