// src/source/mod.rs

pub mod community;

pub use community::CommunitySource;

use crate::{
    error::*,
    models::{CourseMeta, CourseTree, Lesson, LessonContent},
};
use async_trait::async_trait;
use std::sync::Arc;

/// 课程抓取层的边界。浏览器驱动或纯 HTTP 的实现都要满足同一契约:
/// 一次性产出不可变的课程树，并能按课时取回页面内容。
#[async_trait]
pub trait CourseSource: Send + Sync {
    async fn fetch_course(&self, course_url: &str) -> AppResult<(CourseMeta, CourseTree)>;

    async fn fetch_lesson(&self, lesson: &Lesson) -> AppResult<LessonContent>;

    /// 返回针对某课时的播放探测器。能操纵在线页面的实现可以在这里
    /// 提供真正的"点击播放 + 轮询"能力。
    fn playback_probe(&self, lesson: &Lesson) -> Arc<dyn PlaybackProbe>;
}

/// 签名播放地址获取所依赖的页面探测能力。
#[async_trait]
pub trait PlaybackProbe: Send + Sync {
    /// 定位并触发播放控件。Ok(false) 表示页面上不存在该控件。
    async fn trigger_play(&self) -> AppResult<bool>;

    /// 检查页面当前是否已暴露带授权令牌的流媒体清单地址
    /// (资源计时记录与组件树扫描由实现方内部完成)。
    async fn probe_manifest_url(&self) -> Option<String>;
}

/// 无在线页面可操纵时的空探测器: 永远触发失败，使签名地址状态机
/// 直接走页面数据重建路径。
pub struct NullProbe;

#[async_trait]
impl PlaybackProbe for NullProbe {
    async fn trigger_play(&self) -> AppResult<bool> {
        Ok(false)
    }

    async fn probe_manifest_url(&self) -> Option<String> {
        None
    }
}
