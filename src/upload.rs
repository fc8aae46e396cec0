use bytes::Bytes;
use mime_guess::from_path;
use reqwest::multipart::Part;
use std::path::Path;

use crate::error::{ClientError, Result};

/// 用户选中的待上传文件
#[derive(Debug, Clone)]
pub struct LocalFile {
    name: String,
    contents: Bytes,
    mime: String,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime = from_path(&name).first_or_octet_stream().to_string();
        Self {
            name,
            contents: contents.into(),
            mime,
        }
    }

    /// 读取本地文件。整文件一次性读入，上传是单个原子请求。
    pub async fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(ClientError::NoFileSelected)?
            .to_string();

        if tokio::fs::metadata(path).await?.is_dir() {
            return Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            )));
        }

        let contents = tokio::fs::read(path).await?;
        Ok(Self::new(name, contents))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// 生成 multipart 的 `file` 字段
    pub fn to_part(&self) -> Result<Part> {
        let part = Part::stream(self.contents.clone())
            .file_name(self.name.clone())
            .mime_str(&self.mime)?;
        Ok(part)
    }
}
