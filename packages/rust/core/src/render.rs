//! Rich text to markup.
//!
//! The pipeline only hands blocks over, in authoring order, through
//! [`RichTextRenderer`]. [`HtmlRenderer`] covers the block and span kinds the
//! blog actually uses; anything else is skipped.

use spacetraveling_shared::{RichTextBlock, Span};
use tracing::debug;
use url::Url;

/// Turns an ordered sequence of blocks into sanitized markup.
pub trait RichTextRenderer: Send + Sync {
    fn render(&self, blocks: &[RichTextBlock]) -> String;
}

/// HTML output with every piece of text escaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl RichTextRenderer for HtmlRenderer {
    fn render(&self, blocks: &[RichTextBlock]) -> String {
        let mut out = String::new();
        let mut open_list: Option<&'static str> = None;

        for block in blocks {
            let list = match block.kind.as_str() {
                "list-item" => Some("ul"),
                "o-list-item" => Some("ol"),
                _ => None,
            };
            if open_list != list {
                if let Some(tag) = open_list {
                    out.push_str(&format!("</{tag}>"));
                }
                if let Some(tag) = list {
                    out.push_str(&format!("<{tag}>"));
                }
                open_list = list;
            }

            match block.kind.as_str() {
                "paragraph" => wrap(&mut out, "p", block),
                "preformatted" => wrap(&mut out, "pre", block),
                "list-item" | "o-list-item" => wrap(&mut out, "li", block),
                "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
                    let level = &block.kind["heading".len()..];
                    wrap(&mut out, &format!("h{level}"), block);
                }
                "image" => image(&mut out, block),
                other => debug!(kind = other, "skipping unsupported block"),
            }
        }

        if let Some(tag) = open_list {
            out.push_str(&format!("</{tag}>"));
        }
        out
    }
}

fn wrap(out: &mut String, tag: &str, block: &RichTextBlock) {
    out.push_str(&format!("<{tag}>"));
    out.push_str(&inline(block.plain_text(), &block.spans));
    out.push_str(&format!("</{tag}>"));
}

fn image(out: &mut String, block: &RichTextBlock) {
    let Some(url) = block
        .extra
        .get("url")
        .and_then(|v| v.as_str())
        .and_then(|raw| safe_url(raw, IMAGE_SCHEMES))
    else {
        debug!("skipping image without a usable url");
        return;
    };
    let alt = block
        .extra
        .get("alt")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    out.push_str(&format!(
        r#"<img src="{}" alt="{}" />"#,
        escape(url.as_str()),
        escape(alt)
    ));
}

/// A span resolved to char indices of the block text.
#[derive(Clone, Copy)]
struct Placed<'a> {
    start: usize,
    end: usize,
    span: &'a Span,
}

/// Render text with its spans, reopening spans as needed to keep tags nested.
fn inline(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();

    // Span offsets are UTF-16 code units; map them onto char boundaries.
    let mut boundaries = Vec::with_capacity(chars.len() + 1);
    let mut units = 0;
    for c in &chars {
        boundaries.push(units);
        units += c.len_utf16();
    }
    boundaries.push(units);
    let char_index = |offset: usize| boundaries.partition_point(|&u| u < offset);

    let mut spans: Vec<Placed<'_>> = spans
        .iter()
        .filter(|s| s.start < s.end && s.end <= units && open_tag(s).is_some())
        .map(|span| Placed {
            start: char_index(span.start),
            end: char_index(span.end),
            span,
        })
        .filter(|p| p.start < p.end)
        .collect();
    spans.sort_by_key(|p| (p.start, std::cmp::Reverse(p.end)));

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<Placed<'_>> = Vec::new();

    for i in 0..=chars.len() {
        if stack.iter().any(|p| p.end == i) {
            let mut reopen = Vec::new();
            while let Some(top) = stack.pop() {
                out.push_str(close_tag(top.span));
                if top.end != i {
                    reopen.push(top);
                }
                if !stack.iter().any(|p| p.end == i) {
                    break;
                }
            }
            for placed in reopen.into_iter().rev() {
                out.push_str(&open_tag(placed.span).unwrap_or_default());
                stack.push(placed);
            }
        }

        for placed in spans.iter().copied().filter(|p| p.start == i) {
            out.push_str(&open_tag(placed.span).unwrap_or_default());
            stack.push(placed);
        }

        if let Some(c) = chars.get(i) {
            push_escaped(&mut out, *c);
        }
    }
    out
}

fn open_tag(span: &Span) -> Option<String> {
    match span.kind.as_str() {
        "strong" => Some("<strong>".into()),
        "em" => Some("<em>".into()),
        "hyperlink" => span
            .data
            .as_ref()
            .and_then(|d| d.get("url"))
            .and_then(|u| u.as_str())
            .and_then(|raw| safe_url(raw, LINK_SCHEMES))
            .map(|url| format!(r#"<a href="{}">"#, escape(url.as_str()))),
        _ => None,
    }
}

const LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];
const IMAGE_SCHEMES: &[&str] = &["http", "https"];

/// Absolute URL with one of `schemes`, in normalized form; anything else is dropped.
fn safe_url(raw: &str, schemes: &[&str]) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| schemes.contains(&url.scheme()))
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        _ => "</a>",
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c);
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        '\n' => out.push_str("<br />"),
        _ => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize, kind: &str) -> Span {
        Span {
            start,
            end,
            kind: kind.into(),
            data: None,
        }
    }

    #[test]
    fn renders_blocks_in_order() {
        let blocks = vec![
            RichTextBlock::text("heading2", "Intro"),
            RichTextBlock::paragraph("First"),
            RichTextBlock::paragraph("Second"),
        ];
        assert_eq!(
            HtmlRenderer.render(&blocks),
            "<h2>Intro</h2><p>First</p><p>Second</p>"
        );
    }

    #[test]
    fn escapes_text() {
        let blocks = vec![RichTextBlock::paragraph("<script>alert('x')</script> & co")];
        assert_eq!(
            HtmlRenderer.render(&blocks),
            "<p>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; co</p>"
        );
    }

    #[test]
    fn groups_list_items() {
        let blocks = vec![
            RichTextBlock::text("list-item", "a"),
            RichTextBlock::text("list-item", "b"),
            RichTextBlock::text("o-list-item", "one"),
            RichTextBlock::paragraph("after"),
        ];
        assert_eq!(
            HtmlRenderer.render(&blocks),
            "<ul><li>a</li><li>b</li></ul><ol><li>one</li></ol><p>after</p>"
        );
    }

    #[test]
    fn renders_nested_spans() {
        let mut block = RichTextBlock::paragraph("bold and italic");
        block.spans = vec![span(0, 15, "strong"), span(9, 15, "em")];
        assert_eq!(
            HtmlRenderer.render(&[block]),
            "<p><strong>bold and <em>italic</em></strong></p>"
        );
    }

    #[test]
    fn reopens_overlapping_spans() {
        let mut block = RichTextBlock::paragraph("abcd");
        block.spans = vec![span(0, 3, "strong"), span(1, 4, "em")];
        assert_eq!(
            HtmlRenderer.render(&[block]),
            "<p><strong>a<em>bc</em></strong><em>d</em></p>"
        );
    }

    #[test]
    fn renders_links_and_ignores_unknown_spans() {
        let mut block = RichTextBlock::paragraph("see docs");
        block.spans = vec![
            Span {
                start: 4,
                end: 8,
                kind: "hyperlink".into(),
                data: Some(serde_json::json!({ "url": "https://example.com/?a=1&b=2" })),
            },
            span(0, 3, "label"),
        ];
        assert_eq!(
            HtmlRenderer.render(&[block]),
            r#"<p>see <a href="https://example.com/?a=1&amp;b=2">docs</a></p>"#
        );
    }

    fn link(start: usize, end: usize, url: &str) -> Span {
        Span {
            start,
            end,
            kind: "hyperlink".into(),
            data: Some(serde_json::json!({ "url": url })),
        }
    }

    #[test]
    fn script_links_render_as_plain_text() {
        for url in [
            "javascript:alert(document.cookie)",
            " JavaScript:alert(1)",
            "java\tscript:alert(1)",
            "data:text/html,<script>alert(1)</script>",
            "/relative/path",
        ] {
            let mut block = RichTextBlock::paragraph("click");
            block.spans = vec![link(0, 5, url)];
            let html = HtmlRenderer.render(&[block]);
            assert_eq!(html, "<p>click</p>", "{url}");
        }
    }

    #[test]
    fn span_offsets_count_utf16_units() {
        // The rocket takes two UTF-16 units, so "go" starts at unit 3.
        let mut block = RichTextBlock::paragraph("\u{1F680} go far");
        block.spans = vec![span(3, 5, "strong")];
        assert_eq!(
            HtmlRenderer.render(&[block]),
            "<p>\u{1F680} <strong>go</strong> far</p>"
        );
    }

    #[test]
    fn mailto_links_are_kept() {
        let mut block = RichTextBlock::paragraph("write me");
        block.spans = vec![link(0, 8, "mailto:editor@example.com")];
        assert_eq!(
            HtmlRenderer.render(&[block]),
            r#"<p><a href="mailto:editor@example.com">write me</a></p>"#
        );
    }

    #[test]
    fn images_with_script_sources_are_skipped() {
        let block: RichTextBlock = serde_json::from_value(serde_json::json!({
            "type": "image",
            "url": "javascript:alert(1)",
            "alt": "x",
        }))
        .unwrap();
        assert_eq!(HtmlRenderer.render(&[block]), "");
    }

    #[test]
    fn renders_images_from_extra_fields() {
        let block: RichTextBlock = serde_json::from_value(serde_json::json!({
            "type": "image",
            "url": "https://images.example.com/a.png",
            "alt": "A \"rocket\"",
        }))
        .unwrap();
        assert_eq!(
            HtmlRenderer.render(&[block]),
            r#"<img src="https://images.example.com/a.png" alt="A &quot;rocket&quot;" />"#
        );
    }
}
