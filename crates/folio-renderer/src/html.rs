//! HTML output for render trees.

use std::fmt::Write;

use pulldown_cmark_escape::{escape_href, escape_html, escape_html_body_text};

use crate::highlight::CSS_PREFIX;
use crate::media::MediaEmbed;
use crate::node::RenderNode;
use crate::richtext::{Emphasis, InlineNode, InlineStyle};

const IFRAME_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture; web-share";

pub fn render_html(nodes: &[RenderNode]) -> String {
    let mut html = String::new();
    write_nodes(&mut html, nodes);
    html
}

pub fn write_nodes(html: &mut String, nodes: &[RenderNode]) {
    for node in nodes {
        write_node(html, node);
    }
}

pub fn write_node(html: &mut String, node: &RenderNode) {
    match node {
        RenderNode::Paragraph { content, children } => {
            html.push_str("<p>");
            write_inlines(html, content);
            html.push_str("</p>\n");
            write_children(html, children);
        }
        RenderNode::Heading {
            level,
            anchor,
            content,
        } => {
            let _ = write!(html, "<h{level} id=\"");
            let _ = escape_html(&mut *html, anchor);
            html.push_str("\">");
            write_inlines(html, content);
            let _ = write!(html, "</h{level}>\n");
        }
        RenderNode::BulletedList { items } => {
            html.push_str("<ul>\n");
            write_nodes(html, items);
            html.push_str("</ul>\n");
        }
        RenderNode::NumberedList { items } => {
            html.push_str("<ol>\n");
            write_nodes(html, items);
            html.push_str("</ol>\n");
        }
        RenderNode::ListItem {
            ordinal,
            content,
            children,
        } => {
            match ordinal {
                Some(n) => {
                    let _ = write!(html, "<li value=\"{n}\">");
                }
                None => html.push_str("<li>"),
            }
            write_inlines(html, content);
            if !children.is_empty() {
                html.push('\n');
                write_nodes(html, children);
            }
            html.push_str("</li>\n");
        }
        RenderNode::Quote { content, children } => {
            html.push_str("<blockquote>");
            write_inlines(html, content);
            if !children.is_empty() {
                html.push('\n');
                write_nodes(html, children);
            }
            html.push_str("</blockquote>\n");
        }
        RenderNode::Callout {
            icon,
            color,
            content,
            children,
        } => {
            html.push_str("<aside class=\"callout");
            if let Some(color) = color {
                html.push_str(" color-");
                let _ = escape_html(&mut *html, color);
            }
            html.push_str("\">");
            if let Some(icon) = icon {
                html.push_str("<span class=\"callout-icon\">");
                let _ = escape_html_body_text(&mut *html, icon);
                html.push_str("</span>");
            }
            html.push_str("<div class=\"callout-body\">");
            write_inlines(html, content);
            if !children.is_empty() {
                html.push('\n');
                write_nodes(html, children);
            }
            html.push_str("</div></aside>\n");
        }
        RenderNode::Code {
            language,
            source,
            highlighted,
            caption,
        } => {
            html.push_str("<figure class=\"code-block\">");
            match highlighted {
                Some(highlighted) => {
                    let _ = write!(html, "<pre class=\"{CSS_PREFIX}code\"><code class=\"language-");
                    write_language_class(html, language);
                    html.push_str("\">");
                    html.push_str(highlighted);
                }
                None => {
                    html.push_str("<pre><code class=\"language-");
                    write_language_class(html, language);
                    html.push_str("\">");
                    let _ = escape_html_body_text(&mut *html, source);
                }
            }
            html.push_str("</code></pre>");
            write_caption(html, caption);
            html.push_str("</figure>\n");
        }
        RenderNode::Image { src, alt, caption } => {
            html.push_str("<figure class=\"image\">");
            match src {
                Some(src) => {
                    html.push_str("<img src=\"");
                    let _ = escape_href(&mut *html, src);
                    html.push_str("\" alt=\"");
                    let _ = escape_html(&mut *html, alt);
                    html.push_str("\" loading=\"lazy\" />");
                }
                None => {
                    html.push_str("<div class=\"image-placeholder\" role=\"img\" aria-label=\"");
                    let _ = escape_html(&mut *html, alt);
                    html.push_str("\">Image unavailable</div>");
                }
            }
            write_caption(html, caption);
            html.push_str("</figure>\n");
        }
        RenderNode::Media { embed, caption } => {
            html.push_str("<figure class=\"media\">");
            write_media(html, embed);
            write_caption(html, caption);
            html.push_str("</figure>\n");
        }
        RenderNode::Divider => html.push_str("<hr />\n"),
        RenderNode::Table {
            has_column_header,
            has_row_header,
            rows,
        } => write_table(html, *has_column_header, *has_row_header, rows),
    }
}

fn write_children(html: &mut String, children: &[RenderNode]) {
    if children.is_empty() {
        return;
    }
    html.push_str("<div class=\"block-children\">\n");
    write_nodes(html, children);
    html.push_str("</div>\n");
}

fn write_language_class(html: &mut String, language: &str) {
    let class: String = language
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c.to_ascii_lowercase() })
        .collect();
    let _ = escape_html(&mut *html, &class);
}

fn write_caption(html: &mut String, caption: &[InlineNode]) {
    if caption.is_empty() {
        return;
    }
    html.push_str("<figcaption>");
    write_inlines(html, caption);
    html.push_str("</figcaption>");
}

fn write_iframe(html: &mut String, src: &str, title: &str) {
    html.push_str("<div class=\"media-frame\"><iframe src=\"");
    let _ = escape_href(&mut *html, src);
    html.push_str("\" title=\"");
    let _ = escape_html(&mut *html, title);
    let _ = write!(
        html,
        "\" loading=\"lazy\" allow=\"{IFRAME_ALLOW}\" referrerpolicy=\"strict-origin-when-cross-origin\" allowfullscreen></iframe></div>"
    );
}

fn write_external_link_open(html: &mut String, class: &str, href: &str) {
    let _ = write!(html, "<a class=\"{class}\" href=\"");
    let _ = escape_href(&mut *html, href);
    html.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
}

fn write_media(html: &mut String, embed: &MediaEmbed) {
    match embed {
        MediaEmbed::YouTube { embed_url } => write_iframe(html, embed_url, "YouTube video"),
        MediaEmbed::Video { src } => {
            html.push_str("<video src=\"");
            let _ = escape_href(&mut *html, src);
            html.push_str("\" controls preload=\"metadata\"></video>");
        }
        MediaEmbed::Frame { src, original } => {
            write_iframe(html, src, "Embedded content");
            write_external_link_open(html, "media-original", original);
            html.push_str("Open original</a>");
        }
        MediaEmbed::LinkCard { url, host } => {
            write_external_link_open(html, "link-card", url);
            html.push_str("<span class=\"link-card-host\">");
            let _ = escape_html_body_text(&mut *html, host);
            html.push_str("</span><span class=\"link-card-url\">");
            let _ = escape_html_body_text(&mut *html, url);
            html.push_str("</span></a>");
        }
    }
}

fn write_table(
    html: &mut String,
    has_column_header: bool,
    has_row_header: bool,
    rows: &[Vec<Vec<InlineNode>>],
) {
    html.push_str("<table>\n");
    let mut body = rows;
    if has_column_header {
        if let Some((head, rest)) = rows.split_first() {
            html.push_str("<thead><tr>");
            for cell in head {
                html.push_str("<th scope=\"col\">");
                write_inlines(html, cell);
                html.push_str("</th>");
            }
            html.push_str("</tr></thead>\n");
            body = rest;
        }
    }
    html.push_str("<tbody>\n");
    for row in body {
        html.push_str("<tr>");
        for (i, cell) in row.iter().enumerate() {
            let header = has_row_header && i == 0;
            html.push_str(if header { "<th scope=\"row\">" } else { "<td>" });
            write_inlines(html, cell);
            html.push_str(if header { "</th>" } else { "</td>" });
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody></table>\n");
}

pub fn write_inlines(html: &mut String, nodes: &[InlineNode]) {
    for node in nodes {
        write_inline(html, node);
    }
}

fn emphasis_tag(emphasis: Emphasis) -> &'static str {
    match emphasis {
        Emphasis::Bold => "strong",
        Emphasis::Italic => "em",
        Emphasis::Strikethrough => "s",
        Emphasis::Underline => "u",
    }
}

/// Link outermost, then color, then emphasis or code.
pub fn write_inline(html: &mut String, node: &InlineNode) {
    if let Some(href) = &node.href {
        write_external_link_open(html, "inline-link", href);
    }
    if let Some(color) = &node.color {
        html.push_str("<span class=\"color-");
        let _ = escape_html(&mut *html, color);
        html.push_str("\">");
    }

    match &node.style {
        InlineStyle::Code => {
            html.push_str("<code class=\"inline-code\">");
            let _ = escape_html_body_text(&mut *html, &node.text);
            html.push_str("</code>");
        }
        InlineStyle::Text { marks } => {
            for mark in marks {
                let _ = write!(html, "<{}>", emphasis_tag(*mark));
            }
            let _ = escape_html_body_text(&mut *html, &node.text);
            for mark in marks.iter().rev() {
                let _ = write!(html, "</{}>", emphasis_tag(*mark));
            }
        }
    }

    if node.color.is_some() {
        html.push_str("</span>");
    }
    if node.href.is_some() {
        html.push_str("</a>");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol_str::SmolStr;

    fn styled(text: &str, marks: Vec<Emphasis>) -> InlineNode {
        InlineNode {
            text: text.into(),
            style: InlineStyle::Text { marks },
            color: None,
            href: None,
        }
    }

    #[test]
    fn test_inline_nesting() {
        let mut html = String::new();
        write_inline(
            &mut html,
            &InlineNode {
                text: "a < b".into(),
                style: InlineStyle::Text {
                    marks: vec![Emphasis::Bold, Emphasis::Italic],
                },
                color: Some(SmolStr::new("red")),
                href: Some("https://example.com/x".into()),
            },
        );
        insta::assert_snapshot!(html, @r#"<a class="inline-link" href="https://example.com/x" target="_blank" rel="noopener noreferrer"><span class="color-red"><strong><em>a &lt; b</em></strong></span></a>"#);
    }

    #[test]
    fn test_inline_code() {
        let mut html = String::new();
        write_inline(
            &mut html,
            &InlineNode {
                text: "x & y".into(),
                style: InlineStyle::Code,
                color: None,
                href: None,
            },
        );
        assert_eq!(html, "<code class=\"inline-code\">x &amp; y</code>");
    }

    #[test]
    fn test_numbered_list_values() {
        let html = render_html(&[RenderNode::NumberedList {
            items: vec![
                RenderNode::ListItem {
                    ordinal: Some(1),
                    content: vec![InlineNode::plain("c")],
                    children: vec![],
                },
                RenderNode::ListItem {
                    ordinal: Some(2),
                    content: vec![styled("d", vec![Emphasis::Underline])],
                    children: vec![],
                },
            ],
        }]);
        insta::assert_snapshot!(html.trim_end(), @r#"
        <ol>
        <li value="1">c</li>
        <li value="2"><u>d</u></li>
        </ol>
        "#);
    }

    #[test]
    fn test_table_headers() {
        let cell = |t: &str| vec![InlineNode::plain(t)];
        let html = render_html(&[RenderNode::Table {
            has_column_header: true,
            has_row_header: true,
            rows: vec![
                vec![cell("Name"), cell("Value")],
                vec![cell("a"), vec![]],
            ],
        }]);
        insta::assert_snapshot!(html.trim_end(), @r#"
        <table>
        <thead><tr><th scope="col">Name</th><th scope="col">Value</th></tr></thead>
        <tbody>
        <tr><th scope="row">a</th><td></td></tr>
        </tbody></table>
        "#);
    }

    #[test]
    fn test_image_placeholder() {
        let html = render_html(&[RenderNode::Image {
            src: None,
            alt: "chart".into(),
            caption: vec![InlineNode::plain("chart")],
        }]);
        assert_eq!(
            html,
            "<figure class=\"image\"><div class=\"image-placeholder\" role=\"img\" aria-label=\"chart\">Image unavailable</div><figcaption>chart</figcaption></figure>\n"
        );
    }

    #[test]
    fn test_link_card() {
        let html = render_html(&[RenderNode::Media {
            embed: MediaEmbed::LinkCard {
                url: "https://docs.rs/url".into(),
                host: "docs.rs".into(),
            },
            caption: vec![],
        }]);
        assert_eq!(
            html,
            "<figure class=\"media\"><a class=\"link-card\" href=\"https://docs.rs/url\" target=\"_blank\" rel=\"noopener noreferrer\"><span class=\"link-card-host\">docs.rs</span><span class=\"link-card-url\">https://docs.rs/url</span></a></figure>\n"
        );
    }

    #[test]
    fn test_plain_code_escaped() {
        let html = render_html(&[RenderNode::Code {
            language: "plain text".into(),
            source: "if a < b {}".into(),
            highlighted: None,
            caption: vec![],
        }]);
        assert_eq!(
            html,
            "<figure class=\"code-block\"><pre><code class=\"language-plain-text\">if a &lt; b {}</code></pre></figure>\n"
        );
    }
}
