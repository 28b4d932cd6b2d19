// tests/common/mod.rs
//
// 集成测试的共享脚手架: 构造一个指向 mockito 服务器的运行环境。
#![allow(dead_code)]

use skl_dl::{
    ArchiveJobContext,
    archiver::ArchiveManager,
    client::RobustClient,
    config::AppConfig,
    index::IndexGate,
    models::LessonEvent,
    source::{CommunitySource, CourseSource},
};
use std::{collections::HashMap, path::Path, sync::Arc, sync::atomic::AtomicBool};
use tokio::sync::mpsc;

/// 构造一个所有网络端点都指向 `server_base` 的任务环境。
pub fn test_context(
    server_base: &str,
    course_dir: &Path,
) -> (
    ArchiveJobContext,
    mpsc::UnboundedReceiver<LessonEvent>,
) {
    let mut config = AppConfig::default();
    config.url_templates = HashMap::from([
        (
            "STREAM_MANIFEST".to_string(),
            format!("{}/stream/{{playback_id}}.m3u8?token={{token}}", server_base),
        ),
        (
            "FILE_DOWNLOAD_URL".to_string(),
            format!(
                "{}/api/files/{{file_id}}/download-url?expires_in={{expiry}}",
                server_base
            ),
        ),
    ]);
    config.site_base = server_base.to_string();
    let config = Arc::new(config);

    let http_client = Arc::new(RobustClient::new(config.clone(), None));
    let source: Arc<dyn CourseSource> =
        Arc::new(CommunitySource::new(http_client.clone(), config.clone()));
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let context = ArchiveJobContext {
        manager: ArchiveManager::new(),
        config,
        http_client,
        source,
        index_gate: Arc::new(IndexGate::new()),
        events: event_tx,
        cancellation_token: Arc::new(AtomicBool::new(false)),
        course_dir: course_dir.to_path_buf(),
    };
    (context, event_rx)
}

/// 包裹成平台页面的样子: 正文无关紧要，关键是内嵌的数据载荷。
pub fn page_html(next_data: &serde_json::Value) -> String {
    format!(
        r#"<!DOCTYPE html><html><body><div id="app"></div>
<script id="__NEXT_DATA__" type="application/json">{}</script>
</body></html>"#,
        next_data
    )
}
