// src/manifest.rs
//
// 课程与课时清单的读写。清单是跨运行幂等续传与索引重建的唯一持久状态，
// 写入必须原子 (先写临时文件再改名)，读取必须宽容 (损坏或缺失不致命)。

use crate::{constants::layout, error::*};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{fs, path::Path};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseManifest {
    pub course_name: String,
    pub group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_path: Option<String>,
    pub modules: Vec<ModuleEntry>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEntry {
    pub index: usize,
    pub title: String,
    pub dir_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonManifest {
    pub lesson_id: String,
    pub title: String,
    pub module_index: usize,
    pub module_title: String,
    pub lesson_index: usize,
    /// 生成页面相对课时目录的路径
    pub relative_path: String,
    pub has_video: bool,
    pub resources_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// 原子写入 JSON 文档: 同目录临时文件 + persist 改名覆盖。
/// 观察者在任何时刻都只能看到旧内容或完整的新内容。
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    write_text_atomic(path, &serde_json::to_string_pretty(value)?)
}

/// 同样的原子语义，用于生成的 HTML 页面等纯文本产物。
pub fn write_text_atomic(path: &Path, content: &str) -> AppResult<()> {
    let parent = path.parent().ok_or_else(|| {
        AppError::Other(anyhow::anyhow!("写入路径 '{}' 缺少父目录", path.display()))
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    std::io::Write::write_all(&mut tmp, content.as_bytes())?;
    tmp.persist(path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };
    match serde_json::from_str(&content) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("清单文件 '{}' 无法解析，将忽略: {}", path.display(), e);
            None
        }
    }
}

pub fn write_course_manifest(course_dir: &Path, manifest: &CourseManifest) -> AppResult<()> {
    write_json_atomic(&course_dir.join(layout::COURSE_MANIFEST), manifest)
}

pub fn read_course_manifest(course_dir: &Path) -> Option<CourseManifest> {
    read_json(&course_dir.join(layout::COURSE_MANIFEST))
}

pub fn write_lesson_manifest(lesson_dir: &Path, manifest: &LessonManifest) -> AppResult<()> {
    write_json_atomic(&lesson_dir.join(layout::LESSON_MANIFEST), manifest)
}

pub fn read_lesson_manifest(lesson_dir: &Path) -> Option<LessonManifest> {
    read_json(&lesson_dir.join(layout::LESSON_MANIFEST))
}

/// 清单存在即认为该课时此前已完整落盘。
pub fn lesson_is_complete(lesson_dir: &Path) -> bool {
    lesson_dir.join(layout::LESSON_MANIFEST).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn sample_lesson_manifest() -> LessonManifest {
        LessonManifest {
            lesson_id: "abc123".into(),
            title: "第一课".into(),
            module_index: 1,
            module_title: "入门".into(),
            lesson_index: 2,
            relative_path: "index.html".into(),
            has_video: true,
            resources_count: 3,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_lesson_manifest_roundtrip_and_completion_witness() {
        let dir = tempdir().unwrap();
        assert!(!lesson_is_complete(dir.path()));

        write_lesson_manifest(dir.path(), &sample_lesson_manifest()).unwrap();
        assert!(lesson_is_complete(dir.path()));

        let loaded = read_lesson_manifest(dir.path()).unwrap();
        assert_eq!(loaded.lesson_id, "abc123");
        assert_eq!(loaded.lesson_index, 2);
        assert!(loaded.has_video);
    }

    #[test]
    fn test_corrupt_manifest_is_ignored_not_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(layout::LESSON_MANIFEST), "{ not json").unwrap();
        assert!(read_lesson_manifest(dir.path()).is_none());
    }

    #[test]
    fn test_atomic_write_replaces_existing_content() {
        let dir = tempdir().unwrap();
        let mut m = sample_lesson_manifest();
        write_lesson_manifest(dir.path(), &m).unwrap();
        m.title = "改名后".into();
        write_lesson_manifest(dir.path(), &m).unwrap();
        assert_eq!(read_lesson_manifest(dir.path()).unwrap().title, "改名后");
        // 目录里不应残留临时文件
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
