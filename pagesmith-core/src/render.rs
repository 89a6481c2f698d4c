use html_escape::{encode_double_quoted_attribute, encode_text};
use url::Url;

use crate::scanner::{Structure, navigation};
use crate::schema::{Block, BlockKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    fn endpoint(self) -> &'static str {
        match self {
            MediaKind::Image => "/image",
            MediaKind::Video => "/video",
        }
    }
}

/// Render every block into one HTML fragment.
///
/// `structure` feeds menu blocks; pass an empty one when there is no site.
pub fn render_blocks(blocks: &[Block], structure: &Structure) -> String {
    blocks
        .iter()
        .filter_map(|block| render_block(block, structure))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_block(block: &Block, structure: &Structure) -> Option<String> {
    let html = match block.kind {
        BlockKind::Title => format!(
            r#"<h2 class="block-title">{}</h2>"#,
            encode_text(block.text())
        ),
        BlockKind::Text => format!("<p>{}</p>", encode_text(block.text()).replace('\n', "<br>")),
        BlockKind::Html => block.text().to_string(),
        BlockKind::Formatted => format!(r#"<div class="formatted">{}</div>"#, block.text()),
        BlockKind::Image => {
            let src = block.sources().into_iter().next()?;
            format!(r#"<figure class="image">{}</figure>"#, img_tag(src))
        }
        BlockKind::TwoImages | BlockKind::FourImages => {
            let slots = block.kind.image_slots().unwrap_or(1);
            let images: String = block
                .sources()
                .into_iter()
                .take(slots)
                .map(img_tag)
                .collect();
            if images.is_empty() {
                return None;
            }
            format!(r#"<div class="images images-{slots}">{images}</div>"#)
        }
        BlockKind::Video => {
            let src = block.sources().into_iter().next()?;
            format!(
                r#"<video src="{}" controls></video>"#,
                encode_double_quoted_attribute(&media_src(src, MediaKind::Video))
            )
        }
        BlockKind::Youtube => {
            let Some(id) = youtube_id(block.text()) else {
                tracing::warn!(block = %block.id, content = block.text(), "unrecognised YouTube reference");
                return None;
            };
            format!(
                r#"<div class="youtube"><iframe src="https://www.youtube-nocookie.com/embed/{id}" title="YouTube video player" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe></div>"#
            )
        }
        BlockKind::Menu => {
            let section = Some(block.text().trim()).filter(|s| !s.is_empty());
            let items: String = navigation(structure, section)
                .iter()
                .map(|item| {
                    format!(
                        r#"<li><a href="{}">{}</a></li>"#,
                        encode_double_quoted_attribute(&item.link),
                        encode_text(&item.text)
                    )
                })
                .collect();
            format!(r#"<nav class="menu"><ul>{items}</ul></nav>"#)
        }
        BlockKind::Separation => "<hr>".to_string(),
    };

    Some(html)
}

fn img_tag(src: &str) -> String {
    format!(
        r#"<img src="{}" alt="">"#,
        encode_double_quoted_attribute(&media_src(src, MediaKind::Image))
    )
}

/// Absolute URLs and rooted paths pass through; bare names point at uploads.
pub fn media_src(raw: &str, kind: MediaKind) -> String {
    let raw = raw.trim();
    if raw.starts_with('/') || Url::parse(raw).is_ok() {
        raw.to_string()
    } else {
        format!("{}?name={}", kind.endpoint(), urlencoding::encode(raw))
    }
}

/// Pull the video id out of the usual YouTube URL shapes, or accept a bare id.
pub fn youtube_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if is_video_id(raw) {
        return Some(raw.to_string());
    }

    let url = Url::parse(raw)
        .or_else(|_| Url::parse(&format!("https://{raw}")))
        .ok()?;
    let host = url.host_str()?;
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(host);

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let id = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed" | "shorts" | "live" | "v") => segments.next().map(str::to_string),
            _ => None,
        },
        _ => None,
    }?;

    is_video_id(&id).then_some(id)
}

fn is_video_id(s: &str) -> bool {
    s.len() == 11
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
