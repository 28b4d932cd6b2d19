// src/archiver/video.rs
//
// 课时视频获取: 先解析出可播放地址 (直链或签名流媒体地址)，再调用
// 外部命令行媒体工具落盘。目标文件已存在且非空时完全跳过外部工具。

use super::signed_url::{PlaybackResolution, PollPolicy, SignedUrlResolver};
use crate::{
    ArchiveJobContext,
    error::*,
    models::{Lesson, LessonContent, VideoSource},
    utils,
};
use indicatif::HumanBytes;
use log::{debug, info, warn};
use std::path::Path;
use tokio::process::Command;

pub struct VideoAcquirer<'a> {
    context: &'a ArchiveJobContext,
}

impl<'a> VideoAcquirer<'a> {
    pub fn new(context: &'a ArchiveJobContext) -> Self {
        Self { context }
    }

    /// 返回该课时最终是否带有本地视频文件。
    pub async fn acquire(
        &self,
        lesson: &Lesson,
        content: &LessonContent,
        dest: &Path,
    ) -> AppResult<bool> {
        if content.video == VideoSource::None {
            return Ok(false);
        }

        if !self.context.config.force_redownload && utils::is_nonempty_file(dest) {
            let size = dest.metadata()?.len();
            info!(
                "课时 '{}' 的视频已存在 ({})，跳过外部工具调用",
                lesson.title,
                HumanBytes(size)
            );
            return Ok(true);
        }

        let url = match &content.video {
            VideoSource::Direct(link) => link.clone(),
            VideoSource::NativeId(video_id) => {
                let template = self
                    .context
                    .config
                    .url_template("STREAM_MANIFEST")
                    .unwrap_or("https://stream.mux.com/{playback_id}.m3u8?token={token}")
                    .to_string();
                let probe = self.context.source.playback_probe(lesson);
                let resolver =
                    SignedUrlResolver::new(probe.as_ref(), PollPolicy::default(), &template);
                match resolver.resolve_native(video_id, &content.page_data).await {
                    PlaybackResolution::Url(url) => url,
                    PlaybackResolution::Unresolved => {
                        warn!("课时 '{}' 的视频地址无法解析，跳过视频", lesson.title);
                        return Ok(false);
                    }
                }
            }
            VideoSource::None => unreachable!(),
        };

        self.invoke_tool(&url, dest).await?;

        if !utils::is_nonempty_file(dest) {
            return Err(AppError::VideoTool(format!(
                "工具正常退出但未产出文件: {}",
                dest.display()
            )));
        }
        Ok(true)
    }

    /// 调用外部媒体工具。非零退出码视为课时级可恢复失败。
    async fn invoke_tool(&self, url: &str, dest: &Path) -> AppResult<()> {
        let config = &self.context.config;
        let mut cmd = Command::new(&config.video_tool);
        cmd.arg("-N")
            .arg(config.video_fragments.to_string())
            .arg("--referer")
            .arg(&config.site_base)
            .arg("--postprocessor-args")
            // 把 moov 前置，保证下载完成即能边读边播
            .arg("ffmpeg:-movflags +faststart")
            .arg("-o")
            .arg(dest)
            .arg(url);

        if let Some(cookies) = &config.cookies_file {
            cmd.arg("--cookies").arg(cookies);
        }

        debug!("调用外部视频工具: {:?}", cmd.as_std());
        let output = cmd.output().await.map_err(|e| {
            AppError::VideoTool(format!("无法启动 '{}': {}", config.video_tool, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::VideoTool(format!(
                "'{}' 退出码 {:?}: {}",
                config.video_tool,
                output.status.code(),
                utils::truncate_text(stderr.trim(), 200)
            )));
        }
        Ok(())
    }
}
