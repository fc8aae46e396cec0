use futures_util::TryStreamExt;
use reqwest::Response;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;

use crate::error::Result;

// 写盘缓冲区
const CHUNK_SIZE: usize = 1024 * 1024;

/// 把响应体流式写入 `dest`，返回写入的字节数。
///
/// 中途失败时删除写了一半的文件。
pub async fn save_stream(res: Response, dest: &Path) -> Result<u64> {
    let stream = res.bytes_stream().map_err(std::io::Error::other);
    let mut reader = StreamReader::new(stream);

    let file = File::create(dest).await?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);

    let copied = match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(n) => n,
        Err(e) => {
            drop(writer);
            let _ = tokio::fs::remove_file(dest).await;
            return Err(e.into());
        }
    };
    writer.flush().await?;

    tracing::info!(dest = %dest.display(), bytes = copied, "download saved");
    Ok(copied)
}

/// 决定下载文件的本地路径。
///
/// 没有指定输出时写到当前目录；指定的是目录时放进该目录。远端文件名会先做清理，
/// 避免 `../` 之类的名字逃出目标目录。
pub fn destination(name: &str, output: Option<&Path>) -> PathBuf {
    let safe = sanitize_filename::sanitize(name);
    let safe = if safe.is_empty() {
        "download".to_string()
    } else {
        safe
    };

    match output {
        Some(path) if path.is_dir() => path.join(safe),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(safe),
    }
}
