// tests/index_regen_test.rs
//
// 课程索引重建的磁盘级测试: 只依赖目录与清单，不触网。

use chrono::Utc;
use skl_dl::{
    index,
    manifest::{self, CourseManifest, LessonManifest, ModuleEntry},
};
use std::fs;
use tempfile::tempdir;

fn lesson_manifest(id: &str, title: &str, module_index: usize, lesson_index: usize) -> LessonManifest {
    LessonManifest {
        lesson_id: id.to_string(),
        title: title.to_string(),
        module_index,
        module_title: String::new(),
        lesson_index,
        relative_path: "index.html".to_string(),
        has_video: false,
        resources_count: 0,
        updated_at: Utc::now(),
    }
}

fn make_lesson_dir(course: &std::path::Path, module_dir: &str, lesson_dir: &str) -> std::path::PathBuf {
    let dir = course.join(module_dir).join(lesson_dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("index.html"), "<html></html>").unwrap();
    dir
}

#[test]
fn test_modules_sorted_ascending_regardless_of_fs_order() {
    let tmp = tempdir().unwrap();
    let course = tmp.path();

    make_lesson_dir(course, "10-最后的模块", "01-课时甲");
    make_lesson_dir(course, "02-第二模块", "01-课时乙");
    make_lesson_dir(course, "01-第一模块", "01-课时丙");

    index::regenerate(course).unwrap();
    let html = fs::read_to_string(course.join("index.html")).unwrap();

    let first = html.find("第一模块").unwrap();
    let second = html.find("第二模块").unwrap();
    let last = html.find("最后的模块").unwrap();
    assert!(first < second && second < last, "模块必须按序号升序出现");
}

#[test]
fn test_course_manifest_overrides_dir_name_derivation() {
    let tmp = tempdir().unwrap();
    let course = tmp.path();
    make_lesson_dir(course, "01-truncated ti", "01-课时");

    manifest::write_course_manifest(
        course,
        &CourseManifest {
            course_name: "完整课程名".to_string(),
            group_name: "社群".to_string(),
            cover_url: None,
            cover_path: None,
            modules: vec![ModuleEntry {
                index: 1,
                title: "truncated title: the full one".to_string(),
                dir_name: "01-truncated ti".to_string(),
            }],
            updated_at: Utc::now(),
        },
    )
    .unwrap();

    index::regenerate(course).unwrap();
    let html = fs::read_to_string(course.join("index.html")).unwrap();
    assert!(html.contains("完整课程名"));
    assert!(html.contains("truncated title: the full one"));
}

#[test]
fn test_lesson_manifest_preferred_over_dir_name() {
    let tmp = tempdir().unwrap();
    let course = tmp.path();
    let lesson_dir = make_lesson_dir(course, "01-模块", "02-目录名标题");
    manifest::write_lesson_manifest(&lesson_dir, &lesson_manifest("l1", "清单里的标题", 1, 2)).unwrap();

    index::regenerate(course).unwrap();
    let html = fs::read_to_string(course.join("index.html")).unwrap();
    assert!(html.contains("清单里的标题"));
}

#[test]
fn test_missing_lesson_manifest_falls_back_to_dir_name() {
    let tmp = tempdir().unwrap();
    let course = tmp.path();
    let lesson_dir = make_lesson_dir(course, "01-模块", "03-仅有目录名");
    // 视频文件在场时，目录名推导也要把视频标出来
    fs::write(lesson_dir.join("video.mp4"), b"fake video bytes").unwrap();

    index::regenerate(course).unwrap();
    let html = fs::read_to_string(course.join("index.html")).unwrap();
    assert!(html.contains("仅有目录名"));
    assert!(html.contains("🎬"));
}

#[test]
fn test_corrupt_course_manifest_is_not_fatal() {
    let tmp = tempdir().unwrap();
    let course = tmp.path();
    make_lesson_dir(course, "01-模块", "01-课时");
    fs::write(course.join(".course.json"), "{ 这不是 json").unwrap();

    index::regenerate(course).unwrap();
    assert!(course.join("index.html").is_file());
}

#[test]
fn test_dirs_without_lesson_page_are_excluded() {
    let tmp = tempdir().unwrap();
    let course = tmp.path();
    make_lesson_dir(course, "01-模块", "01-完整课时");
    // 半成品: 有目录但还没有页面
    fs::create_dir_all(course.join("01-模块").join("02-半成品课时")).unwrap();

    index::regenerate(course).unwrap();
    let html = fs::read_to_string(course.join("index.html")).unwrap();
    assert!(html.contains("完整课时"));
    assert!(!html.contains("半成品课时"));
}
