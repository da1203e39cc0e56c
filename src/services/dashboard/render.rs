//! 页面渲染
//!
//! 使用 rust-embed 嵌入 `templates/` 下的页面模板与静态资源，
//! 模板中的 `{{name}}` 占位符在渲染时替换为转义后的内容。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use rust_embed::Embed;
use std::path::Path;

use crate::errors::{DashboardError, Result};
use crate::models::auth::Principal;
use crate::models::students::entities::{Student, class_labels_display};
use crate::session::GateView;

#[derive(Embed)]
#[folder = "templates/"]
struct Templates;

/// 获取文件的 MIME 类型
fn get_mime_type(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    match ext {
        "html" => "text/html; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn template(name: &str) -> Result<String> {
    let file = Templates::get(name)
        .ok_or_else(|| DashboardError::file_read(format!("模板 {name} 不存在")))?;
    String::from_utf8(file.data.into_owned())
        .map_err(|e| DashboardError::file_read(format!("模板 {name} 不是 UTF-8: {e}")))
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 仪表盘所需的数据
pub struct DashboardContext<'a> {
    pub students: &'a [Student],
    /// 学生集合读取失败时的提示
    pub notice: Option<String>,
}

pub fn render_login(error: Option<&str>) -> Result<String> {
    let error = error
        .map(|msg| format!(r#"<p class="error" id="login-error">{}</p>"#, escape_html(msg)))
        .unwrap_or_default();
    Ok(template("login.html")?.replace("{{error}}", &error))
}

pub fn render_loading() -> Result<String> {
    template("loading.html")
}

pub fn render_dashboard(principal: &Principal, context: &DashboardContext<'_>) -> Result<String> {
    let rows = context
        .students
        .iter()
        .map(|s| {
            format!(
                "                    <tr><td>{}</td><td>{}</td><td>{}</td><td>{}%</td></tr>",
                escape_html(&s.id),
                escape_html(&s.name),
                escape_html(&s.class_name),
                s.completion_rate
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let notice = context
        .notice
        .as_deref()
        .map(|msg| format!(r#"<p class="error">{}</p>"#, escape_html(msg)))
        .unwrap_or_default();

    Ok(template("dashboard.html")?
        .replace("{{display_name}}", &escape_html(&principal.display_name))
        .replace("{{role}}", &principal.role.to_string())
        .replace("{{student_count}}", &context.students.len().to_string())
        .replace("{{notice}}", &notice)
        .replace("{{student_rows}}", &rows)
        .replace("{{class_labels}}", &escape_html(&class_labels_display())))
}

/// 按会话门的分支渲染页面
pub fn render_view(view: GateView<'_>, context: &DashboardContext<'_>) -> Result<String> {
    match view {
        GateView::Loading => render_loading(),
        GateView::LoginForm => render_login(None),
        GateView::Dashboard(principal) => render_dashboard(principal, context),
    }
}

/// 静态资源
pub async fn serve_static(req: HttpRequest) -> ActixResult<HttpResponse> {
    let path = req.match_info().query("file");

    // 页面模板不作为静态资源暴露
    if path.ends_with(".html") {
        return Ok(HttpResponse::NotFound().finish());
    }

    match Templates::get(path) {
        Some(file) => Ok(HttpResponse::Ok()
            .content_type(get_mime_type(path))
            .insert_header(("Cache-Control", "no-cache"))
            .body(file.data.into_owned())),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}
