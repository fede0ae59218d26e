//! Sanitized rich text for generated material.
//!
//! The backend returns material as an HTML fragment. [`RichText::sanitize`] is the
//! only way to build a [`RichText`], so anything that reaches the renderer has
//! already been reduced to the small set of blocks and inline styles below.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Plain,
    Label,
    Heading,
    Strong,
    Emphasis,
    Code,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichSpan {
    pub text: String,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RichBlock {
    Heading { level: u8, spans: Vec<RichSpan> },
    Paragraph { spans: Vec<RichSpan> },
    ListItem { spans: Vec<RichSpan> },
    Preformatted { text: String },
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichText {
    blocks: Vec<RichBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Paragraph,
    Heading(u8),
    ListItem,
}

struct Sanitizer {
    blocks: Vec<RichBlock>,
    kind: BlockKind,
    spans: Vec<RichSpan>,
    strong: usize,
    emphasis: usize,
    code: usize,
    skip: Option<String>,
    pre: Option<String>,
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9]*)[^>]*>").expect("valid tag pattern")
    })
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

impl Sanitizer {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            kind: BlockKind::Paragraph,
            spans: Vec::new(),
            strong: 0,
            emphasis: 0,
            code: 0,
            skip: None,
            pre: None,
        }
    }

    fn current_style(&self) -> TextStyle {
        if self.code > 0 {
            TextStyle::Code
        } else if self.strong > 0 {
            TextStyle::Strong
        } else if self.emphasis > 0 {
            TextStyle::Emphasis
        } else {
            TextStyle::Plain
        }
    }

    fn flush(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        let kind = std::mem::replace(&mut self.kind, BlockKind::Paragraph);
        if spans.iter().all(|span| span.text.trim().is_empty()) {
            return;
        }
        self.blocks.push(match kind {
            BlockKind::Paragraph => RichBlock::Paragraph { spans },
            BlockKind::Heading(level) => RichBlock::Heading { level, spans },
            BlockKind::ListItem => RichBlock::ListItem { spans },
        });
    }

    fn line_break(&mut self) {
        if self.spans.iter().any(|span| !span.text.trim().is_empty()) {
            self.flush();
        } else if matches!(self.blocks.last(), Some(block) if *block != RichBlock::Blank) {
            self.blocks.push(RichBlock::Blank);
        }
    }

    fn text(&mut self, raw: &str) {
        if self.skip.is_some() || raw.is_empty() {
            return;
        }
        let decoded = decode_entities(raw);
        if let Some(pre) = self.pre.as_mut() {
            pre.push_str(&decoded);
            return;
        }
        let mut text = decoded.replace(['\r', '\n'], " ");
        if self.spans.is_empty() {
            text = text.trim_start().to_string();
            if text.is_empty() {
                return;
            }
        }
        let style = self.current_style();
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => self.spans.push(RichSpan { text, style }),
        }
    }

    fn tag(&mut self, closing: bool, name: &str) {
        let name = name.to_ascii_lowercase();

        if let Some(skipped) = &self.skip {
            if closing && *skipped == name {
                self.skip = None;
            }
            return;
        }

        if let Some(pre) = self.pre.as_mut() {
            match (closing, name.as_str()) {
                (true, "pre") => {
                    let text = std::mem::take(pre);
                    self.pre = None;
                    let text = text.trim_matches('\n').to_string();
                    if !text.is_empty() {
                        self.blocks.push(RichBlock::Preformatted { text });
                    }
                }
                (false, "br") => pre.push('\n'),
                _ => {}
            }
            return;
        }

        match (closing, name.as_str()) {
            (false, "script" | "style") => self.skip = Some(name.clone()),
            (false, "pre") => {
                self.flush();
                self.pre = Some(String::new());
            }
            (false, "h1" | "h2" | "h3") => {
                self.flush();
                self.kind = BlockKind::Heading(name.as_bytes()[1] - b'0');
            }
            (false, "li") => {
                self.flush();
                self.kind = BlockKind::ListItem;
            }
            (_, "h1" | "h2" | "h3" | "li" | "ul" | "ol" | "p") => self.flush(),
            (false, "br") => self.line_break(),
            (false, "strong" | "b") => self.strong += 1,
            (true, "strong" | "b") => self.strong = self.strong.saturating_sub(1),
            (false, "em" | "i") => self.emphasis += 1,
            (true, "em" | "i") => self.emphasis = self.emphasis.saturating_sub(1),
            (false, "code") => self.code += 1,
            (true, "code") => self.code = self.code.saturating_sub(1),
            _ => {}
        }
    }

    fn finish(mut self) -> RichText {
        if let Some(pre) = self.pre.take() {
            let text = pre.trim_matches('\n').to_string();
            if !text.is_empty() {
                self.blocks.push(RichBlock::Preformatted { text });
            }
        }
        self.flush();
        while self.blocks.last() == Some(&RichBlock::Blank) {
            self.blocks.pop();
        }
        RichText {
            blocks: self.blocks,
        }
    }
}

impl RichText {
    /// Reduces an untrusted HTML fragment to headings, paragraphs, list items and
    /// preformatted blocks. Attributes are discarded, unknown tags are dropped
    /// (their text kept), and `script`/`style` elements are removed with their contents.
    pub fn sanitize(html: &str) -> Self {
        let mut sanitizer = Sanitizer::new();
        let mut cursor = 0;
        for captures in tag_pattern().captures_iter(html) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            sanitizer.text(&html[cursor..whole.start()]);
            cursor = whole.end();
            if let Some(name) = captures.get(2) {
                let closing = captures.get(1).is_some_and(|slash| !slash.as_str().is_empty());
                sanitizer.tag(closing, name.as_str());
            }
        }
        sanitizer.text(&html[cursor..]);
        sanitizer.finish()
    }

    pub fn blocks(&self) -> &[RichBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> RichSpan {
        RichSpan {
            text: text.to_string(),
            style: TextStyle::Plain,
        }
    }

    #[test]
    fn keeps_headings_and_list_items() {
        let rich = RichText::sanitize("<h1>Graphs</h1><ul><li>Nodes</li><li>Edges</li></ul>");
        assert_eq!(
            rich.blocks(),
            &[
                RichBlock::Heading {
                    level: 1,
                    spans: vec![plain("Graphs")]
                },
                RichBlock::ListItem {
                    spans: vec![plain("Nodes")]
                },
                RichBlock::ListItem {
                    spans: vec![plain("Edges")]
                },
            ]
        );
    }

    #[test]
    fn strips_scripts_and_attributes() {
        let rich = RichText::sanitize(
            r#"<p onclick="steal()">Safe <a href="javascript:x">link</a></p><script>alert("x")</script>"#,
        );
        assert_eq!(
            rich.blocks(),
            &[RichBlock::Paragraph {
                spans: vec![plain("Safe link")]
            }]
        );
    }

    #[test]
    fn inline_styles_become_spans() {
        let rich = RichText::sanitize("Use <strong>BFS</strong> with <code>VecDeque</code>");
        let RichBlock::Paragraph { spans } = &rich.blocks()[0] else {
            panic!("expected paragraph, got {:?}", rich.blocks());
        };
        let styles: Vec<TextStyle> = spans.iter().map(|span| span.style).collect();
        assert_eq!(
            styles,
            vec![TextStyle::Plain, TextStyle::Strong, TextStyle::Plain, TextStyle::Code]
        );
        assert_eq!(spans[1].text, "BFS");
    }

    #[test]
    fn line_breaks_split_paragraphs_and_collapse_blank_runs() {
        let rich = RichText::sanitize("first<br>second<br><br><br>third<br>");
        assert_eq!(
            rich.blocks(),
            &[
                RichBlock::Paragraph {
                    spans: vec![plain("first")]
                },
                RichBlock::Paragraph {
                    spans: vec![plain("second")]
                },
                RichBlock::Blank,
                RichBlock::Paragraph {
                    spans: vec![plain("third")]
                },
            ]
        );
    }

    #[test]
    fn preformatted_text_is_kept_verbatim() {
        let rich = RichText::sanitize("<pre><code>fn main() {<br>    go();\n}</code></pre>");
        assert_eq!(
            rich.blocks(),
            &[RichBlock::Preformatted {
                text: "fn main() {\n    go();\n}".to_string()
            }]
        );
    }

    #[test]
    fn decodes_entities_once() {
        let rich = RichText::sanitize("a &lt;b&gt; &amp;lt; c");
        assert_eq!(
            rich.blocks(),
            &[RichBlock::Paragraph {
                spans: vec![plain("a <b> &lt; c")]
            }]
        );
    }
}
