// src/models/mod.rs

pub mod page_data;

use crate::error::AppError;

/// 课程级元数据，由课程解析层一次性产出，运行期间不可变。
#[derive(Debug, Clone, Default)]
pub struct CourseMeta {
    pub course_name: String,
    pub group_name: String,
    pub cover_url: Option<String>,
}

/// 课程树: 模块 → 课时 的有序层级。
#[derive(Debug, Clone, Default)]
pub struct CourseTree {
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone)]
pub struct Module {
    /// 1 起始的展示序号，在课程内唯一且连续
    pub index: usize,
    pub title: String,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone)]
pub struct Lesson {
    /// 远端不透明标识，跨运行稳定；仅用于追溯，不作为幂等键
    pub id: String,
    pub title: String,
    /// 模块内 1 起始的序号
    pub index: usize,
    pub source_url: String,
}

/// 课时的视频引用。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VideoSource {
    #[default]
    None,
    /// 已知可直接播放的链接 (外部托管)
    Direct(String),
    /// 只知道平台内部视频标识，播放地址需要另行获取
    NativeId(String),
}

/// 单个附件资源。标题归一化后相同的两个资源视为同一个。
#[derive(Debug, Clone, Default)]
pub struct Resource {
    pub title: String,
    /// 平台自有托管文件的不透明标识
    pub file_id: Option<String>,
    pub file_name: Option<String>,
    /// 已解析好的下载地址 (外部资源则为落地页链接)
    pub url: Option<String>,
    pub is_external: bool,
}

/// 课时页面抓取结果，由外部抓取层产出。
#[derive(Debug, Clone, Default)]
pub struct LessonContent {
    pub body_html: String,
    pub video: VideoSource,
    pub meta_resources: Vec<Resource>,
    pub dom_resources: Vec<Resource>,
    pub page_data: page_data::PageData,
}

/// 调度器分派给单个工作单元的任务描述。
#[derive(Debug, Clone)]
pub struct LessonTask {
    pub module_index: usize,
    pub module_title: String,
    pub module_dir: String,
    pub lesson: Lesson,
}

/// 课时生命周期事件，经由通道投递给消费端 (CLI 或测试)。
#[derive(Debug, Clone)]
pub enum LessonEvent {
    Started { title: String },
    Completed { title: String },
    Skipped { title: String, reason: String },
    Failed { title: String, error: String },
}

/// 失败归类: 决定一次失败波及的范围。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// 子产物缺失即可，课时照常完成
    Soft,
    /// 课时标记失败，其余课时不受影响
    LessonFatal,
    /// 整个运行中止
    RunFatal,
}

/// 产物种类 → 失败范围的显式映射表。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Video,
    Image,
    Resource,
    Index,
    Cover,
    LessonDirectory,
    LessonPage,
    LessonManifest,
    CourseStructure,
}

impl ArtifactKind {
    pub fn failure_scope(self) -> FailureScope {
        match self {
            ArtifactKind::Video
            | ArtifactKind::Image
            | ArtifactKind::Resource
            | ArtifactKind::Cover
            | ArtifactKind::Index => FailureScope::Soft,
            ArtifactKind::LessonDirectory
            | ArtifactKind::LessonPage
            | ArtifactKind::LessonManifest => FailureScope::LessonFatal,
            ArtifactKind::CourseStructure => FailureScope::RunFatal,
        }
    }
}

impl AppError {
    /// 结构性错误在任何位置都是致命的。
    pub fn is_structural(&self) -> bool {
        matches!(self, AppError::Structural(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_scope_table() {
        assert_eq!(ArtifactKind::Video.failure_scope(), FailureScope::Soft);
        assert_eq!(ArtifactKind::Image.failure_scope(), FailureScope::Soft);
        assert_eq!(ArtifactKind::Resource.failure_scope(), FailureScope::Soft);
        assert_eq!(ArtifactKind::Index.failure_scope(), FailureScope::Soft);
        assert_eq!(
            ArtifactKind::LessonDirectory.failure_scope(),
            FailureScope::LessonFatal
        );
        assert_eq!(
            ArtifactKind::LessonManifest.failure_scope(),
            FailureScope::LessonFatal
        );
        assert_eq!(
            ArtifactKind::CourseStructure.failure_scope(),
            FailureScope::RunFatal
        );
    }
}
