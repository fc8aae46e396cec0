use crate::view::{FileTable, Row, RowAction, View};

/// 生成 `fileRows` 表体的内部 HTML
pub fn render_rows(table: &FileTable) -> String {
    let mut rows = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        match row {
            Row::Placeholder { text } => rows.push(format!(
                r#"<tr><td class="muted" colspan="2">{}</td></tr>"#,
                html_escape::encode_text(text)
            )),
            Row::File(file) => {
                let actions: Vec<String> = file.actions.iter().map(render_action).collect();
                rows.push(format!(
                    r#"<tr><td>{}</td><td>{}</td></tr>"#,
                    html_escape::encode_text(&file.label),
                    actions.join(" | ")
                ));
            }
        }
    }

    rows.join("")
}

fn render_action(action: &RowAction) -> String {
    match action {
        RowAction::Download { href } => format!(
            r#"<a href="{}">{}</a>"#,
            html_escape::encode_double_quoted_attribute(href),
            action.label()
        ),
        // 删除需要确认，由宿主页面根据 data-name 接管点击
        RowAction::Delete { name } => format!(
            r##"<a href="#" class="delete" data-name="{}">{}</a>"##,
            html_escape::encode_double_quoted_attribute(name),
            action.label()
        ),
    }
}

/// 完整页面：状态、文件表、二维码弹窗
pub fn render_page(view: &View, share_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <meta name="viewport" content="width=device-width, initial-scale=1.0">
            <title>MyCloudX</title>
            <style>
                {css}
            </style>
        </head>
        <body>
            <div class="container">
                <header>
                    <h1>☁️ MyCloudX</h1>
                    <span id="authStatus">{}</span>
                </header>
                <table>
                    <thead><tr><th>Name</th><th>Actions</th></tr></thead>
                    <tbody id="fileRows">{}</tbody>
                </table>
            </div>
            <div id="qrModal" class="modal" style="display:none">
                <div class="modal-content">
                    <h2>📱 Scan to Access MyCloudX</h2>
                    <p>{}</p>
                </div>
            </div>
        </body>
        </html>"#,
        html_escape::encode_text(&view.status),
        render_rows(&view.table),
        html_escape::encode_text(share_url),
        css = r#"
            * { margin: 0; padding: 0; box-sizing: border-box; }
            body {
                font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto,
                    "Helvetica Neue", Arial, sans-serif;
                line-height: 1.6;
                background: #f5f5f5;
                color: #333;
            }
            .container {
                max-width: 1000px;
                margin: 2rem auto;
                padding: 1rem;
                background: white;
                border-radius: 8px;
                box-shadow: 0 2px 8px rgba(0,0,0,0.1);
            }
            header {
                display: flex;
                justify-content: space-between;
                border-bottom: 1px solid #eee;
                padding-bottom: 1rem;
                margin-bottom: 1.5rem;
            }
            table { width: 100%; border-collapse: collapse; }
            td, th { padding: 0.6rem 1rem; text-align: left; }
            tr:hover { background: #f8f9fa; }
            a { color: #3498db; text-decoration: none; }
            .muted { color: #95a5a6; }
            .modal {
                position: fixed;
                inset: 0;
                background: rgba(0,0,0,0.5);
                justify-content: center;
                align-items: center;
            }
            .modal-content {
                background: white;
                padding: 20px;
                border-radius: 20px;
                text-align: center;
            }
            @media (max-width: 600px) {
                .container { margin: 1rem; }
            }
        "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{render_table, FileEntry};

    fn link(name: &str) -> String {
        format!("http://h/download/{}?token=t&x=1", name)
    }

    #[test]
    fn test_placeholder_markup() {
        let html = render_rows(&render_table(&[], &link));
        assert_eq!(
            html,
            r#"<tr><td class="muted" colspan="2">No files uploaded yet</td></tr>"#
        );
    }

    #[test]
    fn test_file_rows_escape_names() {
        let files = vec![FileEntry::new("<b>.txt"), FileEntry::new("a\"b.png")];
        let html = render_rows(&render_table(&files, &link));

        assert_eq!(html.matches("<tr>").count(), 2);
        assert!(html.contains("📄 &lt;b&gt;.txt"));
        assert!(html.contains(r#"data-name="a&quot;b.png""#));
        assert!(html.contains("token=t&amp;x=1"));
        assert!(html.contains("⬇️ Download</a> | <a"));
    }

    #[test]
    fn test_page_contains_dom_targets() {
        let view = View {
            status: "✅ Authenticated".to_string(),
            table: render_table(&[FileEntry::new("a.txt")], &link),
        };
        let page = render_page(&view, "http://192.168.1.5:8000/");
        assert!(page.contains(r#"<span id="authStatus">✅ Authenticated</span>"#));
        assert!(page.contains(r#"<tbody id="fileRows"><tr>"#));
        assert!(page.contains(r#"id="qrModal""#));
        assert!(page.contains("http://192.168.1.5:8000/"));
    }
}
