// src/source/community.rs
//
// 基于 HTTP 的课程抓取实现: 拉取页面 HTML，提取其中内嵌的
// __NEXT_DATA__ JSON 载荷，再交给宽容解析层。它无法模拟真实的
// 播放交互，因此播放探测器使用 NullProbe。

use super::{CourseSource, NullProbe, PlaybackProbe};
use crate::{
    client::RobustClient,
    config::AppConfig,
    error::*,
    models::{CourseMeta, CourseTree, Lesson, LessonContent, Resource, page_data::PageData},
};
use async_trait::async_trait;
use log::{debug, info, warn};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use url::Url;

static NEXT_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script id="__NEXT_DATA__" type="application/json">(.*?)</script>"#).unwrap()
});
// 课时正文里的资源型链接 (href + 内联文本)
static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a[^>]+href="([^"]+)"[^>]*>([^<]*)</a>"#).unwrap());

pub struct CommunitySource {
    http_client: Arc<RobustClient>,
    config: Arc<AppConfig>,
}

impl CommunitySource {
    pub fn new(http_client: Arc<RobustClient>, config: Arc<AppConfig>) -> Self {
        Self {
            http_client,
            config,
        }
    }

    async fn fetch_page_data(&self, url: &str) -> AppResult<PageData> {
        debug!("抓取页面: {}", url);
        let html = self.http_client.get_text(url).await?;
        let captured = NEXT_DATA_RE
            .captures(&html)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| {
                AppError::Structural(format!("页面 '{}' 中未找到内嵌数据载荷", url))
            })?;
        let value: serde_json::Value =
            serde_json::from_str(captured.as_str()).map_err(|source| {
                AppError::PageDataParseFailed {
                    url: url.to_string(),
                    source,
                }
            })?;
        Ok(PageData::from_value(value))
    }

    /// 从正文 HTML 中扫描资源型链接。指向平台自有文件域名之外的
    /// 一律视为外部资源。
    fn scan_dom_resources(&self, body_html: &str) -> Vec<Resource> {
        ANCHOR_RE
            .captures_iter(body_html)
            .filter_map(|caps| {
                let href = caps.get(1)?.as_str().trim();
                let text = caps.get(2)?.as_str().trim();
                if text.is_empty() || !href.starts_with("http") {
                    return None;
                }
                let is_external = Url::parse(href)
                    .ok()
                    .and_then(|u| u.host_str().map(|h| h != self.config.file_host))
                    .unwrap_or(true);
                Some(Resource {
                    title: text.to_string(),
                    file_id: None,
                    file_name: None,
                    url: Some(href.to_string()),
                    is_external,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CourseSource for CommunitySource {
    async fn fetch_course(&self, course_url: &str) -> AppResult<(CourseMeta, CourseTree)> {
        info!("开始解析课程: {}", course_url);
        let page_data = self.fetch_page_data(course_url).await?;

        let meta = page_data
            .course_meta()
            .ok_or_else(|| AppError::Structural("页面数据中缺少课程元信息".to_string()))?;
        let tree = page_data
            .course_tree(course_url)
            .ok_or_else(|| AppError::Structural("页面数据中未找到课程树".to_string()))?;

        info!(
            "课程 '{}' 解析完成: {} 个模块, {} 个课时",
            meta.course_name,
            tree.modules.len(),
            tree.modules.iter().map(|m| m.lessons.len()).sum::<usize>()
        );
        Ok((meta, tree))
    }

    async fn fetch_lesson(&self, lesson: &Lesson) -> AppResult<LessonContent> {
        let page_data = self.fetch_page_data(&lesson.source_url).await?;
        let body_html = page_data.lesson_body_html().unwrap_or_else(|| {
            warn!("课时 '{}' 无正文内容", lesson.title);
            String::new()
        });
        let video = page_data.lesson_video();
        let meta_resources = page_data.meta_resources();
        let dom_resources = self.scan_dom_resources(&body_html);

        Ok(LessonContent {
            body_html,
            video,
            meta_resources,
            dom_resources,
            page_data,
        })
    }

    fn playback_probe(&self, _lesson: &Lesson) -> Arc<dyn PlaybackProbe> {
        // HTTP 实现没有在线页面可交互，交给状态机的重建路径处理
        Arc::new(NullProbe)
    }
}
