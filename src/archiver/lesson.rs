// src/archiver/lesson.rs
//
// 单个课时的完整存档流程。工作单元自身决定每一步失败的波及范围:
// 目录/页面/清单属于课时级致命，视频/图片/附件只造成对应产物缺失。
// 课时清单必须最后写入 —— 它是"该课时已完整落盘"的见证，提前写入
// 会让中断后的续传跳过半成品。

use super::{ResourceResolver, VideoAcquirer, assets};
use crate::{
    ArchiveJobContext,
    constants::layout,
    error::*,
    manifest::{self, LessonManifest},
    models::LessonTask,
    render, utils,
};
use chrono::Utc;
use log::{debug, info};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonOutcome {
    Completed,
    Skipped(String),
}

pub struct LessonWorker {
    context: ArchiveJobContext,
}

impl LessonWorker {
    pub fn new(context: ArchiveJobContext) -> Self {
        Self { context }
    }

    fn lesson_dir(&self, task: &LessonTask) -> PathBuf {
        self.context
            .course_dir
            .join(&task.module_dir)
            .join(utils::numbered_dir_name(
                task.lesson.index,
                &task.lesson.title,
            ))
    }

    pub async fn run(&self, task: &LessonTask) -> AppResult<LessonOutcome> {
        let lesson = &task.lesson;
        let lesson_dir = self.lesson_dir(task);

        // 幂等续传: 课时清单在场即此前已完整落盘
        if !self.context.config.force_redownload && manifest::lesson_is_complete(&lesson_dir) {
            return Ok(LessonOutcome::Skipped("此前已完整存档".to_string()));
        }

        std::fs::create_dir_all(&lesson_dir)?;
        debug!("课时 '{}' 目录就绪: {:?}", lesson.title, lesson_dir);

        let content = self
            .context
            .source
            .fetch_lesson(lesson)
            .await?;

        let assets_dir = lesson_dir.join(layout::ASSETS_DIR);
        if !content.body_html.is_empty() {
            std::fs::create_dir_all(&assets_dir)?;
        }
        let body_html =
            assets::localize_images(&self.context, &content.body_html, &assets_dir).await?;

        // 视频是软失败: 解析或下载失败只让课时缺少视频
        let video_dest = lesson_dir.join(layout::VIDEO_FILE);
        let acquirer = VideoAcquirer::new(&self.context);
        let has_video = match acquirer.acquire(lesson, &content, &video_dest).await {
            Ok(v) => v,
            Err(e) => {
                log::warn!("课时 '{}' 的视频获取失败，继续存档其余内容: {}", lesson.title, e);
                false
            }
        };

        let resolver = ResourceResolver::new(&self.context);
        let resources = ResourceResolver::merge(
            content.meta_resources.clone(),
            content.dom_resources.clone(),
        );
        let resources_dir = lesson_dir.join(layout::RESOURCES_DIR);
        let downloaded = resolver.download_all(&resources, &resources_dir).await;
        if downloaded > 0 {
            debug!("课时 '{}' 共落盘 {} 个附件", lesson.title, downloaded);
        }

        let page = render::lesson_page(&lesson.title, has_video, &body_html, &resources);
        manifest::write_text_atomic(&lesson_dir.join(layout::LESSON_PAGE), &page)?;

        // 一切产物就位后才写清单
        manifest::write_lesson_manifest(
            &lesson_dir,
            &LessonManifest {
                lesson_id: lesson.id.clone(),
                title: lesson.title.clone(),
                module_index: task.module_index,
                module_title: task.module_title.clone(),
                lesson_index: lesson.index,
                relative_path: layout::LESSON_PAGE.to_string(),
                has_video,
                resources_count: resources.len(),
                updated_at: Utc::now(),
            },
        )?;
        info!("课时 '{}' 存档完成", lesson.title);

        // 课程索引的中途刷新: 有人在忙就跳过，最终还有一次兜底
        self.context
            .index_gate
            .try_pass(&self.context.course_dir)
            .await;

        Ok(LessonOutcome::Completed)
    }
}
