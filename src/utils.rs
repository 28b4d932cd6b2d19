// src/utils.rs

use crate::constants;
use md5::{Digest, Md5};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use regex::Regex;
use std::sync::LazyLock;
use std::{ffi::OsStr, path::Path};

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn sanitize_filename(name: &str) -> String {
    let original_name = name.trim();
    if original_name.is_empty() { return "unknown".to_string(); }

    let stem = Path::new(original_name)
        .file_stem()
        .unwrap_or_else(|| OsStr::new(original_name))
        .to_string_lossy()
        .to_uppercase();
    let windows_reserved = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];

    let mut name = if windows_reserved.contains(&stem.as_ref()) {
        format!("_{}", original_name)
    } else {
        original_name.to_string()
    };

    name = ILLEGAL_CHARS_RE.replace_all(&name, " ").into_owned();
    name = WHITESPACE_RE.replace_all(&name, " ").trim().to_string();
    name = name.trim_matches(|c: char| c == '.' || c.is_whitespace()).to_string();
    if name.is_empty() { return "unnamed".to_string(); }

    if name.as_bytes().len() > constants::MAX_FILENAME_BYTES {
        if let (Some(stem_part), Some(ext)) = (Path::new(&name).file_stem(), Path::new(&name).extension()) {
            let stem_part_str = stem_part.to_string_lossy();
            let ext_str = format!(".{}", ext.to_string_lossy());
            let max_stem_bytes = constants::MAX_FILENAME_BYTES.saturating_sub(ext_str.as_bytes().len());
            let truncated_stem = safe_truncate_utf8(&stem_part_str, max_stem_bytes);
            name = format!("{}{}", truncated_stem, ext_str);
        } else {
            name = safe_truncate_utf8(&name, constants::MAX_FILENAME_BYTES).to_string();
        }
    }
    name
}

fn safe_truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes { return s; }
    let mut i = max_bytes;
    while i > 0 && !s.is_char_boundary(i) { i -= 1; }
    &s[..i]
}

pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 { text.to_string() } else { format!("{}...", &text[..end_pos]) }
}

/// 生成 "NN-标题" 形式的目录名。两位零填充保证字典序 = 数字序。
pub fn numbered_dir_name(index: usize, title: &str) -> String {
    format!("{:02}-{}", index, sanitize_filename(title))
}

/// 解析 "NN-标题" 形式的目录名，返回 (序号, 标题)。
pub fn split_numbered_dir_name(name: &str) -> Option<(usize, &str)> {
    let (prefix, rest) = name.split_once('-')?;
    let index = prefix.parse::<usize>().ok()?;
    if rest.is_empty() { return None; }
    Some((index, rest))
}

/// URL 的短哈希，用于生成无冲突的本地图片文件名。
pub fn short_url_hash(url: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    format!("{:x}", digest)[..8].to_string()
}

/// 从 URL 中提取 (并解码) 最后一段路径作为文件名，失败时退化为 "file"。
pub fn url_basename(url: &str) -> String {
    let path = url::Url::parse(url)
        .ok()
        .map(|u| u.path().to_string())
        .unwrap_or_else(|| url.to_string());
    let raw = path.rsplit('/').next().unwrap_or("").trim();
    let decoded = percent_decode_str(raw).decode_utf8_lossy().into_owned();
    let name = sanitize_filename(&decoded);
    if name == "unknown" || name == "unnamed" {
        "file".to_string()
    } else {
        name
    }
}

// 路径段中需要转义的字符集 (保守起见覆盖引号和尖括号)
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'#')
    .add(b'?')
    .add(b'%');

/// 将目录名编码为可安全嵌入 href 的路径段。
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// 资源标题归一化，用于合并去重: 小写 + 压缩空白。
pub fn normalize_title(title: &str) -> String {
    WHITESPACE_RE
        .replace_all(title.trim(), " ")
        .to_lowercase()
}

/// 本地文件存在且非空，即视为此前已成功下载。
pub fn is_nonempty_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        // 测试非法字符
        assert_eq!(sanitize_filename("a\\b/c:d*e?f\"g<h>i|j"), "a b c d e f g h i j".to_string());

        // 测试首尾空格和点
        assert_eq!(sanitize_filename(" . my file. "), "my file".to_string());

        // 测试 Windows 保留字 (大小写不敏感)
        assert_eq!(sanitize_filename("CON.txt"), "_CON.txt".to_string());

        // 测试空或只有非法字符的输入
        assert_eq!(sanitize_filename(""), "unknown".to_string());
        assert_eq!(sanitize_filename("<>|"), "unnamed".to_string());
    }

    #[test]
    fn test_numbered_dir_name_roundtrip() {
        let name = numbered_dir_name(3, "Getting Started");
        assert_eq!(name, "03-Getting Started");
        assert_eq!(split_numbered_dir_name(&name), Some((3, "Getting Started")));

        // 两位零填充使字典序与数字序一致
        let mut names = vec![numbered_dir_name(10, "b"), numbered_dir_name(2, "a")];
        names.sort();
        assert_eq!(names, vec!["02-a".to_string(), "10-b".to_string()]);
    }

    #[test]
    fn test_split_numbered_dir_name_rejects_garbage() {
        assert_eq!(split_numbered_dir_name("no-prefix-here"), None);
        assert_eq!(split_numbered_dir_name("12"), None);
        assert_eq!(split_numbered_dir_name("7-"), None);
        assert_eq!(split_numbered_dir_name("04-Title"), Some((4, "Title")));
    }

    #[test]
    fn test_short_url_hash_is_stable_and_distinct() {
        let a = short_url_hash("https://example.com/a.png");
        let b = short_url_hash("https://example.com/b.png");
        assert_eq!(a.len(), 8);
        assert_eq!(a, short_url_hash("https://example.com/a.png"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_url_basename() {
        assert_eq!(url_basename("https://cdn.example.com/img/photo%20one.png?w=200"), "photo one.png");
        assert_eq!(url_basename("https://cdn.example.com/"), "file");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Guide.PDF  "), "guide.pdf");
        assert_eq!(normalize_title("A   B"), "a b");
    }
}
