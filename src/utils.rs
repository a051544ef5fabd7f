// src/utils.rs

use crate::{constants, models::DownloadType};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

const VIDEO_ID_LEN: usize = 11;

// 只匹配前缀，id 之后允许跟随其他查询参数或路径
static VIDEO_URL_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"^(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]{11})").unwrap(),
        Regex::new(r"^(?:https?://)?(?:www\.)?youtube\.com/embed/([a-zA-Z0-9_-]{11})").unwrap(),
        Regex::new(r"^(?:https?://)?(?:www\.)?youtube\.com/v/([a-zA-Z0-9_-]{11})").unwrap(),
    ]
});
static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// 本地快速检查链接形状，只用于在发起网络请求前拦截明显错误的输入。
/// 链接是否真的可用以服务端为准。
pub fn validate_url(raw: &str) -> bool {
    let url = raw.trim();
    VIDEO_URL_PATTERNS.iter().any(|re| re.is_match(url))
}

/// 从链接中提取 11 位视频 ID。
///
/// 先尝试四种标准形状；都不匹配时，再从 youtube.com / youtu.be 链接的 `v` 查询参数中读取。
pub fn extract_video_id(raw: &str) -> Option<String> {
    let url = raw.trim();
    if let Some(id) = VIDEO_URL_PATTERNS
        .iter()
        .find_map(|re| re.captures(url).and_then(|c| c.get(1)))
    {
        return Some(id.as_str().to_string());
    }

    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if !host.contains("youtube.com") && !host.contains("youtu.be") {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| id.chars().count() == VIDEO_ID_LEN)
}

/// 清理标题使其可以作为文件名：删除 `< > : " / \ | ? *`，
/// 连续空白替换为单个 `_`，最多保留 200 个字符。
pub fn sanitize_filename(title: &str) -> String {
    let name = ILLEGAL_CHARS_RE.replace_all(title, "");
    let name = WHITESPACE_RE.replace_all(&name, "_");
    name.chars().take(constants::MAX_FILENAME_CHARS).collect()
}

/// 生成最终保存的文件名 `{清理后的标题}{扩展名}`。
///
/// 多字节标题在 200 个字符内仍可能超出文件系统 255 字节的限制，
/// 这里再按字节在字符边界处截断。
pub fn download_file_name(title: &str, download_type: DownloadType) -> String {
    let extension = download_type.extension();
    let mut stem = sanitize_filename(title);
    truncate_to_bytes(&mut stem, constants::MAX_FILENAME_BYTES - extension.len());
    // 全是点的名字（如 ".."）在文件系统中有特殊含义
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        stem = constants::FALLBACK_FILE_STEM.to_string();
    }
    format!("{}{}", stem, extension)
}

fn truncate_to_bytes(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
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
