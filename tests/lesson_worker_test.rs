// tests/lesson_worker_test.rs
//
// 单个课时的端到端存档流程 (mockito 充当平台)。

mod common;

use mockito::Matcher;
use serde_json::json;
use skl_dl::{
    archiver::{LessonOutcome, LessonWorker},
    manifest,
    models::{Lesson, LessonTask},
};
use std::fs;
use tempfile::tempdir;

fn task_for(server_base: &str) -> LessonTask {
    LessonTask {
        module_index: 1,
        module_title: "模块".to_string(),
        module_dir: "01-模块".to_string(),
        lesson: Lesson {
            id: "l1".to_string(),
            title: "课时".to_string(),
            index: 1,
            source_url: format!("{}/g/classroom/c1?md=l1", server_base),
        },
    }
}

#[tokio::test]
async fn test_full_lesson_archive_then_idempotent_skip() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();

    let next_data = json!({
        "props": { "pageProps": { "lesson": {
            "metadata": {
                "title": "课时",
                "content": format!("<p>正文 <img src=\"{}/img/pic.png\"></p>", base)
            },
            "attachments": [
                { "id": "f1", "title": "Guide", "fileName": "guide.pdf" }
            ]
        } } }
    });
    let page_mock = server
        .mock("GET", "/g/classroom/c1")
        .match_query(Matcher::UrlEncoded("md".into(), "l1".into()))
        .with_body(common::page_html(&next_data))
        .create_async()
        .await;
    let image_mock = server
        .mock("GET", "/img/pic.png")
        .with_body(b"png-bytes")
        .create_async()
        .await;
    let exchange_mock = server
        .mock("GET", "/api/files/f1/download-url")
        .match_query(Matcher::UrlEncoded("expires_in".into(), "28800".into()))
        .with_body(json!({ "url": format!("{}/signed/f1.bin", base) }).to_string())
        .create_async()
        .await;
    let file_mock = server
        .mock("GET", "/signed/f1.bin")
        .with_body(b"pdf-bytes")
        .create_async()
        .await;

    let tmp = tempdir().unwrap();
    let (context, _rx) = common::test_context(&base, tmp.path());
    let task = task_for(&base);

    let worker = LessonWorker::new(context.clone());
    let outcome = worker.run(&task).await.unwrap();
    assert_eq!(outcome, LessonOutcome::Completed);

    page_mock.assert_async().await;
    image_mock.assert_async().await;
    exchange_mock.assert_async().await;
    file_mock.assert_async().await;

    let lesson_dir = tmp.path().join("01-模块").join("01-课时");
    let page = fs::read_to_string(lesson_dir.join("index.html")).unwrap();
    assert!(page.contains("正文"));
    // 远程图片地址必须被替换为本地相对路径
    assert!(page.contains("assets/"));
    assert!(!page.contains("/img/pic.png"));
    assert!(page.contains("resources/guide.pdf"));

    let m = manifest::read_lesson_manifest(&lesson_dir).unwrap();
    assert_eq!(m.lesson_id, "l1");
    assert!(!m.has_video);
    assert_eq!(m.resources_count, 1);

    // 第二次运行: 清单在场即整课时跳过，不再触网
    let worker = LessonWorker::new(context);
    let outcome = worker.run(&task).await.unwrap();
    assert!(matches!(outcome, LessonOutcome::Skipped(_)));
}

#[tokio::test]
async fn test_existing_video_file_completes_without_external_tool() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();

    // 页面声明了平台内部视频标识，但载荷中没有可重建的播放信息。
    // 若视频文件尚不存在，它会被当作无法解析而缺失；这里预先放好
    // 非空视频文件，模拟上一轮被中断后留下的成品。
    let next_data = json!({
        "props": { "pageProps": { "lesson": {
            "metadata": { "title": "课时", "content": "<p>带视频</p>", "videoId": "v1" }
        } } }
    });
    server
        .mock("GET", "/g/classroom/c1")
        .match_query(Matcher::UrlEncoded("md".into(), "l1".into()))
        .with_body(common::page_html(&next_data))
        .create_async()
        .await;

    let tmp = tempdir().unwrap();
    let lesson_dir = tmp.path().join("01-模块").join("01-课时");
    fs::create_dir_all(&lesson_dir).unwrap();
    fs::write(lesson_dir.join("video.mp4"), b"previous run's video").unwrap();

    let (context, _rx) = common::test_context(&base, tmp.path());
    let worker = LessonWorker::new(context);
    let outcome = worker.run(&task_for(&base)).await.unwrap();
    assert_eq!(outcome, LessonOutcome::Completed);

    let m = manifest::read_lesson_manifest(&lesson_dir).unwrap();
    assert!(m.has_video, "已存在的视频成品必须被清单承认");
    let page = fs::read_to_string(lesson_dir.join("index.html")).unwrap();
    assert!(page.contains("video.mp4"));
}

#[tokio::test]
async fn test_prefix_image_url_rewrite_does_not_corrupt_longer_url() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();

    // 短地址是长地址的严格前缀; 短的下载成功、长的失败后保留远程地址
    let next_data = json!({
        "props": { "pageProps": { "lesson": {
            "metadata": {
                "title": "课时",
                "content": format!(
                    "<p><img src=\"{base}/img/a\"><img src=\"{base}/img/a-big.png\"></p>"
                )
            }
        } } }
    });
    server
        .mock("GET", "/g/classroom/c1")
        .match_query(Matcher::UrlEncoded("md".into(), "l1".into()))
        .with_body(common::page_html(&next_data))
        .create_async()
        .await;
    server
        .mock("GET", "/img/a")
        .with_body(b"small")
        .create_async()
        .await;
    server
        .mock("GET", "/img/a-big.png")
        .with_status(404)
        .create_async()
        .await;

    let tmp = tempdir().unwrap();
    let (context, _rx) = common::test_context(&base, tmp.path());
    let worker = LessonWorker::new(context);
    worker.run(&task_for(&base)).await.unwrap();

    let lesson_dir = tmp.path().join("01-模块").join("01-课时");
    let page = fs::read_to_string(lesson_dir.join("index.html")).unwrap();
    assert!(page.contains("src=\"assets/"), "短地址必须被本地化");
    assert!(
        page.contains(&format!("src=\"{}/img/a-big.png\"", base)),
        "长地址未下载成功时必须原样保留，不得被前缀替换改烂"
    );
}

#[tokio::test]
async fn test_failed_image_keeps_remote_url_and_lesson_completes() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();

    let next_data = json!({
        "props": { "pageProps": { "lesson": {
            "metadata": {
                "title": "课时",
                "content": format!("<p><img src=\"{}/img/gone.png\"></p>", base)
            }
        } } }
    });
    server
        .mock("GET", "/g/classroom/c1")
        .match_query(Matcher::UrlEncoded("md".into(), "l1".into()))
        .with_body(common::page_html(&next_data))
        .create_async()
        .await;
    server
        .mock("GET", "/img/gone.png")
        .with_status(404)
        .create_async()
        .await;

    let tmp = tempdir().unwrap();
    let (context, _rx) = common::test_context(&base, tmp.path());
    let worker = LessonWorker::new(context);
    let outcome = worker.run(&task_for(&base)).await.unwrap();
    // 图片失败是软失败，课时照常完成，正文保留远程地址
    assert_eq!(outcome, LessonOutcome::Completed);

    let lesson_dir = tmp.path().join("01-模块").join("01-课时");
    let page = fs::read_to_string(lesson_dir.join("index.html")).unwrap();
    assert!(page.contains("/img/gone.png"));
}
