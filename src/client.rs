//! 文件管理控制器
//!
//! 持有会话、当前文件表和二维码弹窗状态。所有网络请求经由 [`FileApi`]，
//! 所有阻塞式交互经由 [`Prompter`]；每个用户操作最多发一个请求（加上随后的刷新），
//! 失败只终止当前操作，不重试。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::FileApi;
use crate::error::{ClientError, Result};
use crate::modal::{ClickTarget, QrModal};
use crate::prompt::Prompter;
use crate::session::{AuthStatus, Session};
use crate::upload::LocalFile;
use crate::view::{self, FileEntry, FileTable, View, ViewModel};

pub const MSG_LOGIN_FIRST: &str = "Please login first";
pub const MSG_SELECT_FILE: &str = "Select a file first";
pub const MSG_UPLOADED: &str = "Uploaded ✅";
pub const MSG_UPLOAD_FAILED: &str = "Upload failed ❌";
pub const MSG_DELETE_FAILED: &str = "Delete failed ❌";
pub const MSG_LIST_FAILED: &str = "Could not refresh file list ❌";

/// 列表刷新失败时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFailurePolicy {
    /// 静默放弃，保留旧表格
    #[default]
    Silent,
    /// 弹出提示并返回错误
    Notify,
}

/// `refresh_list` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// 未登录，什么也没做
    Skipped,
    /// 请求失败，表格保持原样
    Stale,
    /// 表格已替换，携带文件数
    Updated(usize),
}

/// `delete_file` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Skipped,
    Declined,
    Deleted,
}

pub struct FileManagerClient<A, P> {
    api: A,
    prompter: P,
    session: Session,
    files: Vec<FileEntry>,
    table: FileTable,
    modal: QrModal,
    list_failures: ListFailurePolicy,
}

impl<A: FileApi, P: Prompter> FileManagerClient<A, P> {
    pub fn new(api: A, prompter: P) -> Self {
        Self {
            api,
            prompter,
            session: Session::new(),
            files: Vec::new(),
            table: FileTable::default(),
            modal: QrModal::default(),
            list_failures: ListFailurePolicy::default(),
        }
    }

    pub fn with_list_failures(mut self, policy: ListFailurePolicy) -> Self {
        self.list_failures = policy;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn table(&self) -> &FileTable {
        &self.table
    }

    /// 登录：服务器接受后保存令牌并刷新列表，否则清空会话
    pub async fn authenticate(&mut self, token: &str) -> Result<()> {
        let token = token.trim();
        match self.api.authenticate(token).await {
            Ok(()) => {
                self.session.accept(token.to_string());
                self.prompter.status(self.session.status().text());
                tracing::info!("authenticated");
                // 登录本身已成功，刷新失败不影响结果
                if let Err(e) = self.refresh_list().await {
                    tracing::warn!(error = %e, "refresh after login failed");
                }
                Ok(())
            }
            Err(e) => {
                self.session.reject();
                self.prompter.status(self.session.status().text());
                tracing::warn!(error = %e, "authentication rejected");
                Err(match e {
                    ClientError::AuthRejected { .. } => e,
                    _ => ClientError::AuthRejected { status: None },
                })
            }
        }
    }

    /// 回到未登录状态，清空表格
    pub fn logout(&mut self) {
        self.session.logout();
        self.files.clear();
        self.table = FileTable::default();
        self.prompter.status(self.session.status().text());
    }

    /// 上传选中的文件；前置条件不满足时不发请求
    pub async fn upload_file(&mut self, file: Option<&LocalFile>) -> Result<()> {
        let Some(token) = self.session.token().map(str::to_owned) else {
            self.prompter.alert(MSG_LOGIN_FIRST);
            return Err(ClientError::NotAuthenticated);
        };
        let Some(file) = file else {
            self.prompter.alert(MSG_SELECT_FILE);
            return Err(ClientError::NoFileSelected);
        };

        match self.api.upload(&token, file).await {
            Ok(()) => {
                tracing::info!(name = %file.name(), size = file.len(), "uploaded");
                self.prompter.alert(MSG_UPLOADED);
                if let Err(e) = self.refresh_list().await {
                    tracing::warn!(error = %e, "refresh after upload failed");
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(name = %file.name(), error = %e, "upload failed");
                self.prompter.alert(MSG_UPLOAD_FAILED);
                Err(e)
            }
        }
    }

    /// 重新拉取列表并整体替换表格
    pub async fn refresh_list(&mut self) -> Result<Refresh> {
        let Some(token) = self.session.token().map(str::to_owned) else {
            return Ok(Refresh::Skipped);
        };

        let names = match self.api.list(&token).await {
            Ok(names) => names,
            Err(e) => {
                tracing::debug!(error = %e, "list request failed");
                return match self.list_failures {
                    ListFailurePolicy::Silent => Ok(Refresh::Stale),
                    ListFailurePolicy::Notify => {
                        self.prompter.alert(MSG_LIST_FAILED);
                        Err(ClientError::ListFailed)
                    }
                };
            }
        };

        self.files = names.into_iter().map(FileEntry::from).collect();
        let api = &self.api;
        let link = |name: &str| api.download_url(&token, name);
        let rendered = view::render(&ViewModel {
            status: self.session.status(),
            files: &self.files,
            link: &link,
        });
        self.table = rendered.table;
        tracing::debug!(count = self.files.len(), "file list refreshed");
        Ok(Refresh::Updated(self.files.len()))
    }

    /// 确认后删除；用户拒绝时不发请求
    pub async fn delete_file(&mut self, name: &str) -> Result<Deletion> {
        let Some(token) = self.session.token().map(str::to_owned) else {
            return Ok(Deletion::Skipped);
        };
        if !self.prompter.confirm(&format!("Delete {}?", name)) {
            return Ok(Deletion::Declined);
        }

        match self.api.delete(&token, name).await {
            Ok(()) => {
                tracing::info!(%name, "deleted");
                if let Err(e) = self.refresh_list().await {
                    tracing::warn!(error = %e, "refresh after delete failed");
                }
                Ok(Deletion::Deleted)
            }
            Err(e) => {
                tracing::warn!(%name, error = %e, "delete failed");
                self.prompter.alert(MSG_DELETE_FAILED);
                Err(e)
            }
        }
    }

    /// 当前会话下的下载链接
    pub fn download_link(&self, name: &str) -> Option<String> {
        self.session
            .token()
            .map(|token| self.api.download_url(token, name))
    }

    /// 把远端文件保存到本地
    pub async fn download_file(&mut self, name: &str, dest: &Path) -> Result<u64> {
        let Some(token) = self.session.token().map(str::to_owned) else {
            self.prompter.alert(MSG_LOGIN_FIRST);
            return Err(ClientError::NotAuthenticated);
        };
        self.api.download(&token, name, dest).await
    }

    pub fn show_qr_modal(&mut self) {
        self.modal.show();
    }

    pub fn hide_qr_modal(&mut self) {
        self.modal.hide();
    }

    pub fn handle_modal_click(&mut self, target: ClickTarget) {
        self.modal.handle_click(target);
    }

    pub fn is_qr_modal_visible(&self) -> bool {
        self.modal.is_visible()
    }

    /// 当前界面：状态文字加文件表
    pub fn view(&self) -> View {
        View {
            status: self.session.status().text().to_string(),
            table: self.table.clone(),
        }
    }

    pub fn status(&self) -> AuthStatus {
        self.session.status()
    }
}
