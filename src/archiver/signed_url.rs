// src/archiver/signed_url.rs
//
// 平台原生视频的签名播放地址获取。平台只有在观察到播放意图后才会
// 签发带令牌的流媒体清单地址，因此需要先触发播放控件，再在有限次数
// 内轮询页面；轮询落空时，若页面初始载荷里已经带有播放标识和令牌，
// 可以直接按已知模板重建地址。

use crate::{
    constants,
    models::page_data::PageData,
    source::PlaybackProbe,
};
use log::{debug, info, warn};
use std::time::Duration;

/// 状态机的各个阶段，仅用于日志与测试观察。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    NativeIdOnly,
    InteractionAttempted,
    PollingForManifest,
    Resolved,
    FallbackReconstruction,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackResolution {
    /// 已获得可播放地址
    Url(String),
    /// 所有途径均失败，课时将不带视频继续
    Unresolved,
}

/// 有界轮询策略。测试中将 interval 置零即可快速驱动。
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: constants::PLAYBACK_POLL_MAX_ATTEMPTS,
            interval: Duration::from_millis(constants::PLAYBACK_POLL_INTERVAL_MS),
        }
    }
}

pub struct SignedUrlResolver<'a> {
    probe: &'a dyn PlaybackProbe,
    policy: PollPolicy,
    stream_template: &'a str,
}

impl<'a> SignedUrlResolver<'a> {
    pub fn new(probe: &'a dyn PlaybackProbe, policy: PollPolicy, stream_template: &'a str) -> Self {
        Self {
            probe,
            policy,
            stream_template,
        }
    }

    /// 针对一个只有平台内部标识的视频，走完整个获取流程。
    pub async fn resolve_native(
        &self,
        video_id: &str,
        page_data: &PageData,
    ) -> PlaybackResolution {
        let mut state = AcquisitionState::NativeIdOnly;
        debug!("视频 '{}' 进入签名地址获取: {:?}", video_id, state);

        state = AcquisitionState::InteractionAttempted;
        debug!("视频 '{}' 状态: {:?}", video_id, state);
        let triggered = match self.probe.trigger_play().await {
            Ok(true) => true,
            Ok(false) => {
                debug!("视频 '{}' 页面上未找到播放控件", video_id);
                false
            }
            Err(e) => {
                warn!("视频 '{}' 触发播放失败: {}", video_id, e);
                false
            }
        };

        if triggered {
            state = AcquisitionState::PollingForManifest;
            debug!("视频 '{}' 状态: {:?}", video_id, state);
            if let Some(url) = self.poll_for_manifest(video_id).await {
                state = AcquisitionState::Resolved;
                info!("视频 '{}' 轮询命中流媒体清单地址: {:?}", video_id, state);
                return PlaybackResolution::Url(url);
            }
        }

        state = AcquisitionState::FallbackReconstruction;
        debug!("视频 '{}' 状态: {:?}", video_id, state);
        if let Some(url) = self.reconstruct_from_page_data(video_id, page_data) {
            info!("视频 '{}' 已从页面数据重建播放地址", video_id);
            return PlaybackResolution::Url(url);
        }

        state = AcquisitionState::Unresolved;
        warn!("视频 '{}' 最终状态: {:?}，课时将不带视频继续", video_id, state);
        PlaybackResolution::Unresolved
    }

    /// 有界轮询: 至多 max_attempts 次，每次间隔固定时长。
    /// 探测本身 (资源计时记录 + 组件树广度遍历) 由探测器实现负责，
    /// 任意一路先命中即胜出。
    async fn poll_for_manifest(&self, video_id: &str) -> Option<String> {
        for attempt in 1..=self.policy.max_attempts {
            if let Some(url) = self.probe.probe_manifest_url().await {
                debug!("视频 '{}' 第 {} 次轮询命中", video_id, attempt);
                return Some(url);
            }
            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }
        debug!(
            "视频 '{}' 轮询 {} 次后仍未出现清单地址",
            video_id, self.policy.max_attempts
        );
        None
    }

    /// 页面初始载荷中若已有匹配的视频对象且同时携带播放标识与播放
    /// 令牌，则按提供方的已知模板直接合成地址。
    fn reconstruct_from_page_data(&self, video_id: &str, page_data: &PageData) -> Option<String> {
        let video = page_data.native_video(video_id)?;
        let playback_id = video.playback_id?;
        let token = video.playback_token?;
        Some(
            self.stream_template
                .replace("{playback_id}", &playback_id)
                .replace("{token}", &token),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TEMPLATE: &str = "https://stream.mux.com/{playback_id}.m3u8?token={token}";

    /// 可编程的假探测器: 前 succeed_after-1 次返回 None。
    struct FakeProbe {
        has_control: bool,
        succeed_after: u32,
        calls: AtomicU32,
    }

    impl FakeProbe {
        fn new(has_control: bool, succeed_after: u32) -> Self {
            Self {
                has_control,
                succeed_after,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PlaybackProbe for FakeProbe {
        async fn trigger_play(&self) -> AppResult<bool> {
            Ok(self.has_control)
        }

        async fn probe_manifest_url(&self) -> Option<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.succeed_after > 0 && n >= self.succeed_after {
                Some("https://stream.mux.com/live.m3u8?token=polled".to_string())
            } else {
                None
            }
        }
    }

    fn fast_policy() -> PollPolicy {
        PollPolicy {
            max_attempts: 10,
            interval: Duration::ZERO,
        }
    }

    fn page_with_video(id: &str, playback_id: Option<&str>, token: Option<&str>) -> PageData {
        let mut video = json!({ "id": id });
        if let Some(p) = playback_id {
            video["playbackId"] = json!(p);
        }
        if let Some(t) = token {
            video["signedToken"] = json!(t);
        }
        PageData::from_value(json!({
            "props": { "pageProps": { "videos": [video] } }
        }))
    }

    #[tokio::test]
    async fn test_polling_succeeds_after_m_attempts() {
        let probe = FakeProbe::new(true, 4);
        let resolver = SignedUrlResolver::new(&probe, fast_policy(), TEMPLATE);
        let result = resolver
            .resolve_native("v1", &page_with_video("v1", None, None))
            .await;
        assert_eq!(
            result,
            PlaybackResolution::Url("https://stream.mux.com/live.m3u8?token=polled".to_string())
        );
        assert_eq!(probe.calls.load(Ordering::SeqCst), 4, "命中后应立即停止轮询");
    }

    #[tokio::test]
    async fn test_polling_is_bounded_then_falls_back() {
        let probe = FakeProbe::new(true, 0);
        let resolver = SignedUrlResolver::new(&probe, fast_policy(), TEMPLATE);
        let result = resolver
            .resolve_native("v1", &page_with_video("v1", Some("pb9"), Some("tok9")))
            .await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 10, "轮询必须止于上限");
        assert_eq!(
            result,
            PlaybackResolution::Url("https://stream.mux.com/pb9.m3u8?token=tok9".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_play_control_skips_polling() {
        let probe = FakeProbe::new(false, 1);
        let resolver = SignedUrlResolver::new(&probe, fast_policy(), TEMPLATE);
        let result = resolver
            .resolve_native("v1", &page_with_video("v1", Some("pb"), Some("tok")))
            .await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0, "控件缺失时不应轮询");
        assert_eq!(
            result,
            PlaybackResolution::Url("https://stream.mux.com/pb.m3u8?token=tok".to_string())
        );
    }

    #[tokio::test]
    async fn test_unresolved_when_token_missing() {
        let probe = FakeProbe::new(false, 0);
        let resolver = SignedUrlResolver::new(&probe, fast_policy(), TEMPLATE);
        // 只有播放标识、缺少令牌，重建不可行
        let result = resolver
            .resolve_native("v1", &page_with_video("v1", Some("pb"), None))
            .await;
        assert_eq!(result, PlaybackResolution::Unresolved);
    }
}
