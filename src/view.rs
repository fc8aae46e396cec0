//! 纯渲染：由视图模型生成界面描述，不做任何 I/O

use serde::Serialize;

use crate::session::AuthStatus;

pub const EMPTY_PLACEHOLDER: &str = "No files uploaded yet";
pub const DOWNLOAD_LABEL: &str = "⬇️ Download";
pub const DELETE_LABEL: &str = "🗑️ Delete";

/// 远端存储里的一个文件名
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileEntry(String);

impl FileEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<String> for FileEntry {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// 行内操作
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RowAction {
    Download { href: String },
    Delete { name: String },
}

impl RowAction {
    pub fn label(&self) -> &'static str {
        match self {
            RowAction::Download { .. } => DOWNLOAD_LABEL,
            RowAction::Delete { .. } => DELETE_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRow {
    pub name: String,
    pub label: String,
    pub actions: Vec<RowAction>,
}

impl FileRow {
    pub fn download_href(&self) -> Option<&str> {
        self.actions.iter().find_map(|a| match a {
            RowAction::Download { href } => Some(href.as_str()),
            _ => None,
        })
    }

    pub fn has_delete(&self) -> bool {
        self.actions
            .iter()
            .any(|a| matches!(a, RowAction::Delete { name } if *name == self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    Placeholder { text: String },
    File(FileRow),
}

/// `fileRows` 表格的内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileTable {
    pub rows: Vec<Row>,
}

impl FileTable {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.rows.as_slice(), [Row::Placeholder { .. }])
    }

    pub fn file_rows(&self) -> impl Iterator<Item = &FileRow> {
        self.rows.iter().filter_map(|r| match r {
            Row::File(row) => Some(row),
            Row::Placeholder { .. } => None,
        })
    }
}

/// 渲染输入：文件列表加登录状态
pub struct ViewModel<'a> {
    pub status: AuthStatus,
    pub files: &'a [FileEntry],
    /// 根据文件名生成下载链接
    pub link: &'a dyn Fn(&str) -> String,
}

/// 渲染结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct View {
    pub status: String,
    pub table: FileTable,
}

pub fn render_table(files: &[FileEntry], link: &dyn Fn(&str) -> String) -> FileTable {
    if files.is_empty() {
        return FileTable {
            rows: vec![Row::Placeholder {
                text: EMPTY_PLACEHOLDER.to_string(),
            }],
        };
    }

    let rows = files
        .iter()
        .map(|entry| {
            let name = entry.name().to_string();
            Row::File(FileRow {
                label: format!("📄 {}", name),
                actions: vec![
                    RowAction::Download { href: link(&name) },
                    RowAction::Delete { name: name.clone() },
                ],
                name,
            })
        })
        .collect();

    FileTable { rows }
}

pub fn render(model: &ViewModel<'_>) -> View {
    View {
        status: model.status.text().to_string(),
        table: render_table(model.files, model.link),
    }
}

/// 终端里的纯文本表格
pub fn to_text(table: &FileTable) -> String {
    let mut out = String::new();
    for row in &table.rows {
        match row {
            Row::Placeholder { text } => {
                out.push_str(text);
                out.push('\n');
            }
            Row::File(file) => {
                let href = file.download_href().unwrap_or_default();
                out.push_str(&format!(
                    "{}\t{} {} | {}\n",
                    file.label, DOWNLOAD_LABEL, href, DELETE_LABEL
                ));
            }
        }
    }
    out
}
