// src/render.rs
//
// 课时页面与课程索引页的静态 HTML 渲染。产出只依赖相对路径，整个
// 课程目录可以原样拷贝或离线打开。

use crate::{constants::layout, models::Resource, utils};

/// 课程索引页的数据形状，由索引重建器从磁盘扫描得出。
#[derive(Debug, Clone)]
pub struct IndexModule {
    pub index: usize,
    pub title: String,
    pub dir_name: String,
    pub lessons: Vec<IndexLesson>,
}

#[derive(Debug, Clone)]
pub struct IndexLesson {
    pub index: usize,
    pub title: String,
    pub dir_name: String,
    pub has_video: bool,
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const PAGE_STYLE: &str = r#"body{max-width:860px;margin:2rem auto;padding:0 1rem;font-family:system-ui,sans-serif;line-height:1.6;color:#222}video{width:100%;border-radius:6px;background:#000}img{max-width:100%}h1{border-bottom:2px solid #eee;padding-bottom:.4rem}ul.resources li{margin:.3rem 0}a{color:#1a6dcc}nav ol{padding-left:1.4rem}nav li{margin:.25rem 0}.module{margin-top:1.4rem}.cover{max-height:280px;border-radius:8px}"#;

fn page_shell(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"zh\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        PAGE_STYLE,
        body
    )
}

/// 渲染单个课时页面。正文 HTML 已由上游本地化过，原样嵌入。
pub fn lesson_page(
    title: &str,
    has_video: bool,
    body_html: &str,
    resources: &[Resource],
) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape_html(title));

    if has_video {
        body.push_str(&format!(
            "<video controls preload=\"metadata\" src=\"{}\"></video>\n",
            layout::VIDEO_FILE
        ));
    }

    if !body_html.is_empty() {
        body.push_str("<article>\n");
        body.push_str(body_html);
        body.push_str("\n</article>\n");
    }

    if !resources.is_empty() {
        body.push_str("<h2>附件</h2>\n<ul class=\"resources\">\n");
        for resource in resources {
            let item = if resource.is_external {
                let href = resource.url.as_deref().unwrap_or("#");
                format!(
                    "<li><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a> (外部链接)</li>\n",
                    escape_html(href),
                    escape_html(&resource.title)
                )
            } else {
                let file = crate::archiver::ResourceResolver::local_file_name(resource);
                format!(
                    "<li><a href=\"{}/{}\">{}</a></li>\n",
                    layout::RESOURCES_DIR,
                    escape_html(&file),
                    escape_html(&resource.title)
                )
            };
            body.push_str(&item);
        }
        body.push_str("</ul>\n");
    }

    page_shell(title, &body)
}

/// 渲染课程索引页: 模块按序号升序，课时链接到各自目录下的页面。
pub fn course_index(
    course_name: &str,
    group_name: &str,
    cover_path: Option<&str>,
    modules: &[IndexModule],
) -> String {
    let mut body = String::new();
    if let Some(cover) = cover_path {
        body.push_str(&format!(
            "<img class=\"cover\" src=\"{}\" alt=\"封面\">\n",
            escape_html(cover)
        ));
    }
    body.push_str(&format!(
        "<h1>{}</h1>\n<p>社群: {}</p>\n<nav>\n",
        escape_html(course_name),
        escape_html(group_name)
    ));

    for module in modules {
        body.push_str(&format!(
            "<div class=\"module\"><h2>{:02}. {}</h2>\n<ol>\n",
            module.index,
            escape_html(&module.title)
        ));
        for lesson in &module.lessons {
            let href = format!(
                "{}/{}/{}",
                utils::encode_path_segment(&module.dir_name),
                utils::encode_path_segment(&lesson.dir_name),
                layout::LESSON_PAGE
            );
            let marker = if lesson.has_video { " 🎬" } else { "" };
            body.push_str(&format!(
                "<li><a href=\"{}\">{}</a>{}</li>\n",
                href,
                escape_html(&lesson.title),
                marker
            ));
        }
        body.push_str("</ol>\n</div>\n");
    }
    body.push_str("</nav>\n");

    page_shell(course_name, &body)
}
