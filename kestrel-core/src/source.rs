//! Bean 名称来源
//!
//! Bean 名称清单是纯文本文件，每行一个完整类型名，没有表头和顺序保证。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::BeanMetadata;
use crate::error::{ContainerError, ContainerResult};

/// 候选 Bean 类型名的来源
pub trait BeanNameSource: Send + Sync {
    fn bean_names(&self) -> ContainerResult<Vec<String>>;
}

/// 从文件读取 Bean 名称清单
#[derive(Debug, Clone)]
pub struct FileBeanNames {
    path: PathBuf,
}

impl FileBeanNames {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BeanNameSource for FileBeanNames {
    fn bean_names(&self) -> ContainerResult<Vec<String>> {
        let content =
            fs::read_to_string(&self.path).map_err(|source| ContainerError::BeanListUnavailable {
                path: self.path.clone(),
                source,
            })?;

        Ok(parse_bean_names(&content))
    }
}

/// 解析 Bean 名称清单：去掉首尾空白，跳过空行
pub fn parse_bean_names(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .inspect(|line| tracing::debug!("Found bean type name [{}]", line))
        .map(String::from)
        .collect()
}

/// 内存中的名称列表
#[derive(Debug, Clone, Default)]
pub struct StaticBeanNames {
    names: Vec<String>,
}

impl StaticBeanNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl BeanNameSource for StaticBeanNames {
    fn bean_names(&self) -> ContainerResult<Vec<String>> {
        Ok(self.names.clone())
    }
}

/// 使用元数据目录中的全部类型名
///
/// 适合没有单独生成名称清单的程序，例如只依赖 `#[derive(Bean)]` 自动注册的场景。
#[derive(Clone)]
pub struct CatalogBeanNames {
    metadata: Arc<dyn BeanMetadata>,
}

impl CatalogBeanNames {
    pub fn new(metadata: Arc<dyn BeanMetadata>) -> Self {
        Self { metadata }
    }
}

impl BeanNameSource for CatalogBeanNames {
    fn bean_names(&self) -> ContainerResult<Vec<String>> {
        Ok(self.metadata.names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_blank_lines() {
        let names = parse_bean_names("app::A\n\n   \n  app::B  \r\napp::C");
        assert_eq!(names, vec!["app::A", "app::B", "app::C"]);
    }

    #[test]
    fn test_file_source_reads_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "app::Repository").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "app::Service").unwrap();

        let names = FileBeanNames::new(file.path()).bean_names().unwrap();
        assert_eq!(names, vec!["app::Repository", "app::Service"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileBeanNames::new(dir.path().join("beans.txt"));

        assert!(matches!(
            source.bean_names(),
            Err(ContainerError::BeanListUnavailable { .. })
        ));
    }

    #[test]
    fn test_static_source() {
        let names = StaticBeanNames::new(["a", "b"]).bean_names().unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }
}
