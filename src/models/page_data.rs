// src/models/page_data.rs
//
// 页面内嵌 JSON 载荷的宽容解析层。载荷实际上是弱类型的、充满可选字段的
// JSON，这里将其收敛为一组带有明确取值优先级的访问函数，而不是把链式
// 可选访问散落在各处。

use super::{CourseMeta, CourseTree, Lesson, Module, Resource, VideoSource};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct PageData {
    raw: Value,
}

/// 平台内部视频对象 (来自页面初始载荷)。
#[derive(Debug, Clone)]
pub struct NativeVideo {
    pub video_id: String,
    pub playback_id: Option<String>,
    pub playback_token: Option<String>,
}

/// 沿路径取字符串字段。
fn str_at<'a>(v: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut cur = v;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_str().filter(|s| !s.is_empty())
}

fn array_at<'a>(v: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    let mut cur = v;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_array()
}

impl PageData {
    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    fn page_props(&self) -> &Value {
        self.raw
            .get("props")
            .and_then(|p| p.get("pageProps"))
            .unwrap_or(&Value::Null)
    }

    /// 节点标题取值优先级: metadata.title > name > title
    fn node_title(node: &Value) -> Option<&str> {
        str_at(node, &["metadata", "title"])
            .or_else(|| str_at(node, &["name"]))
            .or_else(|| str_at(node, &["title"]))
    }

    /// 课程名取值优先级: course.metadata.title > course.name
    /// 社群名取值优先级: group.metadata.displayName > group.name
    pub fn course_meta(&self) -> Option<CourseMeta> {
        let props = self.page_props();
        let course = props.get("course")?;
        let course_name = Self::node_title(course)?.to_string();
        let group_name = str_at(props, &["group", "metadata", "displayName"])
            .or_else(|| str_at(props, &["group", "name"]))
            .unwrap_or("unknown-group")
            .to_string();
        // 封面取值优先级: metadata.coverVideoThumbnail > metadata.cover
        let cover_url = str_at(course, &["metadata", "coverVideoThumbnail"])
            .or_else(|| str_at(course, &["metadata", "cover"]))
            .map(str::to_string);
        Some(CourseMeta {
            course_name,
            group_name,
            cover_url,
        })
    }

    /// 从载荷中的课程节点构建课程树。模块序号按出现顺序编为 1..N，
    /// 保证课程内唯一且连续。子节点可能直接就是模块对象，也可能包一层
    /// `course` 字段，两种形态都接受。
    pub fn course_tree(&self, course_url: &str) -> Option<CourseTree> {
        let props = self.page_props();
        let children = array_at(props, &["course", "children"])?;

        let mut modules = Vec::new();
        for child in children {
            let node = child.get("course").unwrap_or(child);
            let Some(title) = Self::node_title(node) else {
                continue;
            };
            let lesson_nodes = node
                .get("children")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            let mut lessons = Vec::new();
            for lesson_node in &lesson_nodes {
                let leaf = lesson_node.get("course").unwrap_or(lesson_node);
                let Some(id) = str_at(leaf, &["id"]) else { continue };
                let Some(lesson_title) = Self::node_title(leaf) else {
                    continue;
                };
                lessons.push(Lesson {
                    id: id.to_string(),
                    title: lesson_title.to_string(),
                    index: lessons.len() + 1,
                    source_url: format!("{}?md={}", course_url, id),
                });
            }

            modules.push(Module {
                index: modules.len() + 1,
                title: title.to_string(),
                lessons,
            });
        }

        if modules.is_empty() {
            None
        } else {
            Some(CourseTree { modules })
        }
    }

    /// 课时正文 HTML 取值优先级: lesson.metadata.content > lesson.content
    pub fn lesson_body_html(&self) -> Option<String> {
        let props = self.page_props();
        str_at(props, &["lesson", "metadata", "content"])
            .or_else(|| str_at(props, &["lesson", "content"]))
            .map(str::to_string)
    }

    /// 视频引用取值优先级: 外链 videoLink 优先于平台内部 videoId。
    pub fn lesson_video(&self) -> VideoSource {
        let props = self.page_props();
        if let Some(link) = str_at(props, &["lesson", "metadata", "videoLink"]) {
            return VideoSource::Direct(link.to_string());
        }
        if let Some(id) = str_at(props, &["lesson", "metadata", "videoId"])
            .or_else(|| str_at(props, &["lesson", "video", "id"]))
        {
            return VideoSource::NativeId(id.to_string());
        }
        VideoSource::None
    }

    /// 结构化附件元数据。带 `link` 而无直链的条目视为外部资源。
    pub fn meta_resources(&self) -> Vec<Resource> {
        let props = self.page_props();
        let Some(items) = array_at(props, &["lesson", "attachments"])
            .or_else(|| array_at(props, &["lesson", "metadata", "attachments"]))
        else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| {
                let title = str_at(item, &["title"])
                    .or_else(|| str_at(item, &["fileName"]))?
                    .to_string();
                let link = str_at(item, &["link"]);
                Some(Resource {
                    title,
                    file_id: str_at(item, &["id"]).map(str::to_string),
                    file_name: str_at(item, &["fileName"]).map(str::to_string),
                    url: str_at(item, &["url"]).or(link).map(str::to_string),
                    is_external: link.is_some(),
                })
            })
            .collect()
    }

    /// 按平台内部视频标识查找载荷中的视频对象。
    pub fn native_video(&self, video_id: &str) -> Option<NativeVideo> {
        let props = self.page_props();
        let videos = array_at(props, &["videos"])
            .cloned()
            .or_else(|| props.get("lesson").and_then(|l| l.get("video")).map(|v| vec![v.clone()]))
            .unwrap_or_default();

        videos.iter().find_map(|v| {
            let id = str_at(v, &["id"])?;
            if id != video_id {
                return None;
            }
            Some(NativeVideo {
                video_id: id.to_string(),
                playback_id: str_at(v, &["playbackId"]).map(str::to_string),
                playback_token: str_at(v, &["signedToken"])
                    .or_else(|| str_at(v, &["playbackToken"]))
                    .map(str::to_string),
            })
        })
    }
}
