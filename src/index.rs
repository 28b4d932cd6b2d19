// src/index.rs
//
// 课程索引页重建。重建是纯函数式的磁盘扫描: 不访问网络，不依赖本轮
// 运行的内存状态，因此对中断后的残缺目录同样成立。同一课程目录上的
// 重建必须串行 —— 用单席位信号量做门闸，运行途中有人占席就跳过
// (反正稍后还会有人来)，运行结束的最后一次则等待席位以保证终态新鲜。

use crate::{
    constants::layout,
    error::*,
    manifest,
    render::{self, IndexLesson, IndexModule},
    utils,
};
use log::{debug, warn};
use std::path::Path;
use tokio::sync::Semaphore;

pub struct IndexGate {
    slot: Semaphore,
}

impl Default for IndexGate {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexGate {
    pub fn new() -> Self {
        Self {
            slot: Semaphore::new(1),
        }
    }

    /// 中途刷新: 席位被占即跳过，不排队。
    pub async fn try_pass(&self, course_dir: &Path) {
        match self.slot.try_acquire() {
            Ok(_permit) => {
                if let Err(e) = regenerate(course_dir) {
                    warn!("课程索引刷新失败 (不影响课时存档): {}", e);
                }
            }
            Err(_) => {
                debug!("索引重建进行中，本次刷新跳过");
            }
        }
    }

    /// 收尾刷新: 等待席位，保证运行结束时索引反映最终磁盘状态。
    pub async fn final_pass(&self, course_dir: &Path) {
        // 信号量从不关闭，acquire 只在关闭时失败
        let _permit = self.slot.acquire().await.expect("索引门闸信号量已关闭");
        if let Err(e) = regenerate(course_dir) {
            warn!("收尾索引重建失败: {}", e);
        }
    }
}

/// 扫描课程目录并重建索引页。课程清单在场时，其中的命名与排序优先于
/// 目录名推导；课时清单在场时优先于课时目录名推导。两者都宽容缺失。
pub fn regenerate(course_dir: &Path) -> AppResult<()> {
    let course_manifest = manifest::read_course_manifest(course_dir);

    let mut modules = Vec::new();
    for entry in std::fs::read_dir(course_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let dir_name = entry.file_name().to_string_lossy().into_owned();
        let Some((derived_index, derived_title)) = utils::split_numbered_dir_name(&dir_name) else {
            continue;
        };

        // 课程清单按目录名匹配，命中则以清单为准
        let (index, title) = course_manifest
            .as_ref()
            .and_then(|m| m.modules.iter().find(|e| e.dir_name == dir_name))
            .map(|e| (e.index, e.title.clone()))
            .unwrap_or_else(|| (derived_index, derived_title.to_string()));

        let lessons = scan_module_lessons(&entry.path());
        if lessons.is_empty() {
            debug!("模块目录 '{}' 下没有可索引的课时", dir_name);
        }
        modules.push(IndexModule {
            index,
            title,
            dir_name,
            lessons,
        });
    }
    modules.sort_by_key(|m| m.index);

    let (course_name, group_name, cover_path) = match &course_manifest {
        Some(m) => (
            m.course_name.clone(),
            m.group_name.clone(),
            m.cover_path.clone(),
        ),
        None => {
            // 清单缺失时退化为目录名
            let name = course_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "课程".to_string());
            (name, String::new(), None)
        }
    };

    let html = render::course_index(&course_name, &group_name, cover_path.as_deref(), &modules);
    manifest::write_text_atomic(&course_dir.join(layout::COURSE_INDEX), &html)?;
    debug!("课程索引已重建: {} 个模块", modules.len());
    Ok(())
}

fn scan_module_lessons(module_dir: &Path) -> Vec<IndexLesson> {
    let mut lessons = Vec::new();
    let entries = match std::fs::read_dir(module_dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("无法读取模块目录 {:?}: {}", module_dir, e);
            return lessons;
        }
    };

    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let dir_name = entry.file_name().to_string_lossy().into_owned();
        let lesson_dir = entry.path();

        // 页面都没有的目录不值得出现在索引里
        if !lesson_dir.join(layout::LESSON_PAGE).is_file() {
            continue;
        }

        let lesson = match manifest::read_lesson_manifest(&lesson_dir) {
            Some(m) => IndexLesson {
                index: m.lesson_index,
                title: m.title,
                dir_name,
                has_video: m.has_video,
            },
            None => {
                let Some((index, title)) = utils::split_numbered_dir_name(&dir_name) else {
                    continue;
                };
                warn!("课时目录 '{}' 缺少清单，以目录名推导", dir_name);
                IndexLesson {
                    index,
                    title: title.to_string(),
                    dir_name: dir_name.clone(),
                    has_video: utils::is_nonempty_file(&lesson_dir.join(layout::VIDEO_FILE)),
                }
            }
        };
        lessons.push(lesson);
    }
    lessons.sort_by_key(|l| l.index);
    lessons
}
