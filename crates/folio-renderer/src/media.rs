//! URL classification for video, embed and bookmark blocks.

use serde::Serialize;
use url::Url;

use crate::model::FileSource;

const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
    "www.youtu.be",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".ogg", ".mov", ".m4v"];

/// The most specific presentation available for a media URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaEmbed {
    YouTube { embed_url: String },
    Video { src: String },
    /// Generic iframe plus a link back to the original page.
    Frame { src: String, original: String },
    LinkCard { url: String, host: String },
}

pub fn classify_video(source: &FileSource) -> MediaEmbed {
    match source {
        FileSource::Hosted(url) => MediaEmbed::Video { src: url.clone() },
        FileSource::External(url) => {
            if let Some(embed_url) = youtube_embed_url(url) {
                MediaEmbed::YouTube { embed_url }
            } else if is_direct_video(url) {
                MediaEmbed::Video { src: url.clone() }
            } else {
                link_card(url)
            }
        }
    }
}

pub fn classify_embed(url: &str) -> MediaEmbed {
    MediaEmbed::Frame {
        src: youtube_embed_url(url).unwrap_or_else(|| url.to_string()),
        original: url.to_string(),
    }
}

pub fn classify_bookmark(url: &str) -> MediaEmbed {
    match youtube_embed_url(url) {
        Some(embed_url) => MediaEmbed::YouTube { embed_url },
        None => link_card(url),
    }
}

fn link_card(url: &str) -> MediaEmbed {
    MediaEmbed::LinkCard {
        url: url.to_string(),
        host: host_label(url),
    }
}

/// Canonical embed URL for a YouTube watch/share/embed/shorts/live link.
///
/// Returns `None` for other hosts, unparseable URLs, or links without a
/// video id.
pub fn youtube_embed_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    if !YOUTUBE_HOSTS.contains(&host.as_str()) {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let video_id = (if host.contains("youtu.be") {
        segments.next().map(str::to_string)
    } else if url.path() == "/watch" {
        query_param(&url, "v")
    } else {
        match segments.next() {
            Some("embed" | "shorts" | "live") => segments.next().map(str::to_string),
            _ => None,
        }
    })
    .filter(|id| !id.is_empty())?;

    let start = query_param(&url, "start")
        .and_then(|v| parse_start(&v))
        .or_else(|| query_param(&url, "t").and_then(|v| parse_start(&v)));

    let mut embed = format!("https://www.youtube.com/embed/{video_id}?");
    if let Some(start) = start {
        embed.push_str(&format!("start={start}&"));
    }
    embed.push_str("rel=0");
    Some(embed)
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Seconds from `90`, `1m30s`, `1h2m3s` style offsets. Zero is no offset.
pub fn parse_start(value: &str) -> Option<u64> {
    if value.is_empty() {
        return None;
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse().ok().filter(|n| *n > 0);
    }

    let mut total = 0u64;
    let mut digits = String::new();
    // units must appear in h, m, s order, each at most once
    let mut last_rank = 0;
    for c in value.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let (rank, scale) = match c.to_ascii_lowercase() {
            'h' => (1, 3600),
            'm' => (2, 60),
            's' => (3, 1),
            _ => return None,
        };
        if rank <= last_rank || digits.is_empty() {
            return None;
        }
        last_rank = rank;
        let part = digits.parse::<u64>().ok()?.checked_mul(scale)?;
        total = total.checked_add(part)?;
        digits.clear();
    }
    if !digits.is_empty() {
        return None;
    }
    (total > 0).then_some(total)
}

pub fn is_direct_video(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => {
            let path = url.path().to_ascii_lowercase();
            VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        }
        Err(_) => false,
    }
}

/// Hostname without a leading `www.`, or the raw string if it won't parse.
pub fn host_label(raw: &str) -> String {
    match Url::parse(raw).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => host.strip_prefix("www.").unwrap_or(&host).to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_variants() {
        let expected = Some("https://www.youtube.com/embed/abc123?rel=0".to_string());
        assert_eq!(youtube_embed_url("https://www.youtube.com/watch?v=abc123"), expected);
        assert_eq!(youtube_embed_url("https://youtu.be/abc123"), expected);
        assert_eq!(youtube_embed_url("https://m.youtube.com/shorts/abc123"), expected);
        assert_eq!(youtube_embed_url("https://youtube.com/live/abc123"), expected);
        assert_eq!(
            youtube_embed_url("https://www.youtube-nocookie.com/embed/abc123"),
            expected
        );
    }

    #[test]
    fn test_youtube_start_time() {
        assert_eq!(
            youtube_embed_url("https://youtu.be/abc?t=1m30s").as_deref(),
            Some("https://www.youtube.com/embed/abc?start=90&rel=0")
        );
        assert_eq!(
            youtube_embed_url("https://www.youtube.com/watch?v=abc&start=42&t=10").as_deref(),
            Some("https://www.youtube.com/embed/abc?start=42&rel=0")
        );
    }

    #[test]
    fn test_not_youtube() {
        assert_eq!(youtube_embed_url("https://vimeo.com/123"), None);
        assert_eq!(youtube_embed_url("https://www.youtube.com/channel/xyz"), None);
        assert_eq!(youtube_embed_url("https://www.youtube.com/watch"), None);
        assert_eq!(youtube_embed_url("not a url"), None);
    }

    #[test]
    fn test_parse_start() {
        assert_eq!(parse_start("90"), Some(90));
        assert_eq!(parse_start("1h2m3s"), Some(3723));
        assert_eq!(parse_start("2M"), Some(120));
        assert_eq!(parse_start("0"), None);
        assert_eq!(parse_start("1s2m"), None);
        assert_eq!(parse_start("abc"), None);
        assert_eq!(parse_start("12x"), None);
    }

    #[test]
    fn test_parse_start_overflow() {
        assert_eq!(parse_start("9999999999999999h"), None);
        assert_eq!(parse_start("5124095576030431h16s"), None);
        assert_eq!(parse_start("99999999999999999999"), None);
        assert_eq!(
            youtube_embed_url("https://youtu.be/abc?t=9999999999999999h").as_deref(),
            Some("https://www.youtube.com/embed/abc?rel=0")
        );
    }

    #[test]
    fn test_classify_video() {
        assert_eq!(
            classify_video(&FileSource::External("https://cdn.example.com/clip.MP4".into())),
            MediaEmbed::Video {
                src: "https://cdn.example.com/clip.MP4".into()
            }
        );
        assert_eq!(
            classify_video(&FileSource::External("https://www.example.com/page".into())),
            MediaEmbed::LinkCard {
                url: "https://www.example.com/page".into(),
                host: "example.com".into()
            }
        );
        assert!(matches!(
            classify_video(&FileSource::Hosted("https://s3.example.com/v".into())),
            MediaEmbed::Video { .. }
        ));
    }

    #[test]
    fn test_classify_embed_and_bookmark() {
        assert_eq!(
            classify_embed("https://youtu.be/abc"),
            MediaEmbed::Frame {
                src: "https://www.youtube.com/embed/abc?rel=0".into(),
                original: "https://youtu.be/abc".into()
            }
        );
        assert_eq!(
            classify_embed("https://codepen.io/x"),
            MediaEmbed::Frame {
                src: "https://codepen.io/x".into(),
                original: "https://codepen.io/x".into()
            }
        );
        assert_eq!(
            classify_bookmark("https://docs.rs/url"),
            MediaEmbed::LinkCard {
                url: "https://docs.rs/url".into(),
                host: "docs.rs".into()
            }
        );
    }

    #[test]
    fn test_host_label_unparseable() {
        assert_eq!(host_label("nope"), "nope");
    }
}
