//! MyCloudX 文件管理客户端
//!
//! 登录、上传、列表、下载、删除，对接 MyCloudX 服务器的 REST 接口。

pub mod api;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod html;
pub mod modal;
pub mod prompt;
pub mod session;
pub mod upload;
pub mod view;

pub use api::{FileApi, HttpApi};
pub use client::{Deletion, FileManagerClient, ListFailurePolicy, Refresh};
pub use config::Config;
pub use error::{ClientError, ConfigError, Result};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use session::{AuthStatus, Session};
pub use upload::LocalFile;
pub use view::{FileEntry, FileTable, View};
