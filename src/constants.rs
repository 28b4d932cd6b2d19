// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const COOKIES_FILE_NAME: &str = "cookies.txt";
pub const LOG_FILE_NAME: &str = "skl-dl.log";
pub const DEFAULT_SAVE_DIR: &str = "downloads";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// 并发调度
pub const DEFAULT_WORKERS: usize = 8;
pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 16;

// 签名播放地址轮询
pub const PLAYBACK_POLL_MAX_ATTEMPTS: u32 = 10;
pub const PLAYBACK_POLL_INTERVAL_MS: u64 = 1000;

// 附件下载链接有效期 (8 小时)
pub const DOWNLOAD_URL_EXPIRY_SECS: u64 = 8 * 3600;

// 课程目录内的固定文件/目录名
pub mod layout {
    pub const COURSE_MANIFEST: &str = ".course.json";
    pub const LESSON_MANIFEST: &str = "lesson.json";
    pub const LESSON_PAGE: &str = "index.html";
    pub const COURSE_INDEX: &str = "index.html";
    pub const VIDEO_FILE: &str = "video.mp4";
    pub const ASSETS_DIR: &str = "assets";
    pub const RESOURCES_DIR: &str = "resources";
    pub const COVER_FILE: &str = "cover.jpg";
}

pub const HELP_LOGIN_GUIDE: &str = r#"
1. 登录平台: 使用 Chrome / Edge / Firefox 浏览器登录社群网站。
2. 打开开发者工具:
   - 在 Windows / Linux 上: 按 F12 或 Ctrl+Shift+I
   - 在 macOS 上: 按 Cmd+Opt+I (⌘⌥I)
3. 切换到 "应用" (Application) 标签页，展开左侧 Cookies。
4. 找到名为 auth_token 的 Cookie，复制其值。
5. 回到终端，将值粘贴到 login 命令的提示符中即可。"#;
