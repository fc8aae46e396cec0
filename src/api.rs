//! 远端文件 API 的传输层
//!
//! 控制器只依赖 [`FileApi`]；[`HttpApi`] 用 reqwest 实现真实的 HTTP 调用，
//! 测试里可以换成内存实现。

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::multipart::Form;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;

use crate::download;
use crate::error::{ClientError, Operation, Result};
use crate::upload::LocalFile;

/// 与浏览器 `encodeURIComponent` 相同的保留字符集
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(input: &str) -> String {
    percent_encode(input.as_bytes(), URI_COMPONENT).to_string()
}

/// `/list` 的响应体
#[derive(Debug, Deserialize)]
pub struct ListResponse {
    pub files: Vec<String>,
}

/// 远端文件存储的契约。每个方法只发一个请求，不做重试。
pub trait FileApi {
    /// `POST /auth`，成功返回 `Ok(())`
    fn authenticate(&self, token: &str) -> impl Future<Output = Result<()>> + Send;

    /// `POST /upload`
    fn upload(&self, token: &str, file: &LocalFile) -> impl Future<Output = Result<()>> + Send;

    /// `GET /list`
    fn list(&self, token: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// `DELETE /delete/{name}`
    fn delete(&self, token: &str, name: &str) -> impl Future<Output = Result<()>> + Send;

    /// `GET /download/{name}`，写入 `dest`，返回字节数
    fn download(
        &self,
        token: &str,
        name: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// 带令牌的下载链接，不发请求
    fn download_url(&self, token: &str, name: &str) -> String;
}

/// 基于 reqwest 的实现
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    pub fn new(base: &str, timeout: Option<Duration>) -> Result<Self> {
        let base = parse_base(base)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    fn name_endpoint(&self, route: &str, name: &str, token: &str) -> String {
        format!(
            "{}?token={}",
            self.endpoint(&format!("/{}/{}", route, encode_component(name))),
            encode_component(token)
        )
    }
}

/// 解析服务器地址，只接受 http / https
pub fn parse_base(base: &str) -> Result<Url> {
    let url = Url::parse(base).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidUrl(format!(
            "{}: unsupported scheme {}",
            base, other
        ))),
    }
}

fn check(op: Operation, res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    tracing::warn!(%op, status = status.as_u16(), "request rejected");
    Err(ClientError::RequestFailed {
        op,
        status: status.as_u16(),
    })
}

impl FileApi for HttpApi {
    async fn authenticate(&self, token: &str) -> Result<()> {
        tracing::debug!(url = %self.endpoint("/auth"), "POST /auth");
        let form = Form::new().text("token", token.to_owned());
        let res = self
            .client
            .post(self.endpoint("/auth"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "auth request failed");
                ClientError::AuthRejected { status: None }
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(ClientError::AuthRejected {
                status: Some(status.as_u16()),
            });
        }
        Ok(())
    }

    async fn upload(&self, token: &str, file: &LocalFile) -> Result<()> {
        tracing::debug!(name = %file.name(), size = file.len(), "POST /upload");
        let form = Form::new()
            .text("token", token.to_owned())
            .part("file", file.to_part()?);
        let res = self
            .client
            .post(self.endpoint("/upload"))
            .multipart(form)
            .send()
            .await?;
        check(Operation::Upload, res)?;
        Ok(())
    }

    async fn list(&self, token: &str) -> Result<Vec<String>> {
        tracing::debug!("GET /list");
        let res = self
            .client
            .get(self.endpoint("/list"))
            .query(&[("token", token)])
            .send()
            .await?;
        let body: ListResponse = check(Operation::List, res)?.json().await?;
        Ok(body.files)
    }

    async fn delete(&self, token: &str, name: &str) -> Result<()> {
        tracing::debug!(%name, "DELETE /delete");
        let res = self
            .client
            .delete(self.name_endpoint("delete", name, token))
            .send()
            .await?;
        check(Operation::Delete, res)?;
        Ok(())
    }

    async fn download(&self, token: &str, name: &str, dest: &Path) -> Result<u64> {
        tracing::debug!(%name, dest = %dest.display(), "GET /download");
        let res = self
            .client
            .get(self.name_endpoint("download", name, token))
            .send()
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                name: name.to_string(),
            });
        }
        let res = check(Operation::Download, res)?;
        download::save_stream(res, dest).await
    }

    fn download_url(&self, token: &str, name: &str) -> String {
        self.name_endpoint("download", name, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_component_matches_browser() {
        assert_eq!(encode_component("a.txt"), "a.txt");
        assert_eq!(encode_component("my file.txt"), "my%20file.txt");
        assert_eq!(encode_component("a/b?c=d&e"), "a%2Fb%3Fc%3Dd%26e");
        assert_eq!(encode_component("it's (1)!~*"), "it's%20(1)!~*");
        assert_eq!(encode_component("报告.pdf"), "%E6%8A%A5%E5%91%8A.pdf");
    }

    #[test]
    fn test_download_url_embeds_name_and_token() {
        let api = HttpApi::new("http://127.0.0.1:8000", None).unwrap();
        assert_eq!(
            api.download_url("s3cret", "b.png"),
            "http://127.0.0.1:8000/download/b.png?token=s3cret"
        );
        assert_eq!(
            api.download_url("a b", "x y.txt"),
            "http://127.0.0.1:8000/download/x%20y.txt?token=a%20b"
        );
    }

    #[test]
    fn test_base_with_path_prefix() {
        let api = HttpApi::new("https://files.example.com/cloud/", None).unwrap();
        assert_eq!(
            api.download_url("t", "a.txt"),
            "https://files.example.com/cloud/download/a.txt?token=t"
        );
    }

    #[test]
    fn test_parse_base_rejects_other_schemes() {
        assert!(matches!(
            parse_base("ftp://example.com"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_base("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
