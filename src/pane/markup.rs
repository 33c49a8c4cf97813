//! Reading rendered issue fragments.
//!
//! The server sends each side as an HTML fragment: the escaped XML source with
//! `<span>` wrappers marking the focus anchor and inline edits. This module
//! strips the wrappers, decodes entities and remembers where the anchor and
//! the edit markers are. It is not an HTML renderer.

use unicode_width::UnicodeWidthChar;

const TAB_WIDTH: usize = 4;

/// Inline marker style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mark {
    #[default]
    Plain,
    Inserted,
    Deleted,
    Focus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub mark: Mark,
}

/// Position in the decoded text. `col` counts display columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextPos {
    pub line: usize,
    pub col: usize,
}

/// Anchor selectors, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnchorMarker {
    /// `id="focusAnchor"`
    FocusAnchor,
    /// `class="focusTarget"`
    FocusTarget,
    /// `class="editNewInline"`
    EditNew,
    /// `class="editOldInline"`
    EditOld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorSpan {
    pub marker: AnchorMarker,
    pub start: TextPos,
    /// Exclusive end.
    pub end: TextPos,
    pub tabindex: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub lines: Vec<Vec<Segment>>,
    pub anchor: Option<AnchorSpan>,
}

impl Document {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Raw text, shown as-is.
    pub fn plain(text: &str) -> Self {
        let mut builder = Builder::new();
        builder.push_text(text, Mark::Plain);
        builder.finish()
    }

    pub fn from_fragment(html: &str) -> Self {
        parse_fragment(html)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Decoded text of one line.
    pub fn line_text(&self, line: usize) -> String {
        self.lines
            .get(line)
            .map(|segs| segs.iter().map(|s| s.text.as_str()).collect())
            .unwrap_or_default()
    }
}

struct OpenElement {
    name: String,
    mark: Option<Mark>,
    candidate: Option<usize>,
}

struct Candidate {
    marker: AnchorMarker,
    start: TextPos,
    end: Option<TextPos>,
    tabindex: Option<i32>,
}

struct Builder {
    lines: Vec<Vec<Segment>>,
    current: Vec<Segment>,
    col: usize,
    open: Vec<OpenElement>,
    candidates: Vec<Candidate>,
}

impl Builder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            col: 0,
            open: Vec::new(),
            candidates: Vec::new(),
        }
    }

    fn pos(&self) -> TextPos {
        TextPos {
            line: self.lines.len(),
            col: self.col,
        }
    }

    fn current_mark(&self) -> Mark {
        self.open
            .iter()
            .rev()
            .find_map(|e| e.mark)
            .unwrap_or(Mark::Plain)
    }

    fn newline(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
        self.col = 0;
    }

    fn push_char(&mut self, ch: char, mark: Mark) {
        match ch {
            '\n' => self.newline(),
            '\r' => {}
            '\t' => {
                for _ in 0..TAB_WIDTH {
                    self.push_char(' ', mark);
                }
            }
            _ => {
                match self.current.last_mut() {
                    Some(seg) if seg.mark == mark => seg.text.push(ch),
                    _ => self.current.push(Segment {
                        text: ch.to_string(),
                        mark,
                    }),
                }
                self.col += ch.width().unwrap_or(0);
            }
        }
    }

    fn push_text(&mut self, text: &str, mark: Mark) {
        for ch in text.chars() {
            self.push_char(ch, mark);
        }
    }

    fn open_element(&mut self, tag: Tag) {
        let name = tag.name.clone();
        if name == "br" {
            self.newline();
            return;
        }
        if is_block(&name) && self.col > 0 {
            self.newline();
        }
        if tag.self_closing || is_void(&name) {
            return;
        }

        let marker = anchor_marker(&tag);
        let candidate = marker.map(|marker| {
            self.candidates.push(Candidate {
                marker,
                start: self.pos(),
                end: None,
                tabindex: tag.attr("tabindex").and_then(|v| v.trim().parse().ok()),
            });
            self.candidates.len() - 1
        });
        let mark = marker.map(|m| match m {
            AnchorMarker::EditNew => Mark::Inserted,
            AnchorMarker::EditOld => Mark::Deleted,
            AnchorMarker::FocusAnchor | AnchorMarker::FocusTarget => Mark::Focus,
        });

        self.open.push(OpenElement {
            name,
            mark,
            candidate,
        });
    }

    fn close_element(&mut self, name: &str) {
        let Some(idx) = self.open.iter().rposition(|e| e.name == name) else {
            return;
        };
        let pos = self.pos();
        for element in self.open.drain(idx..) {
            if let Some(c) = element.candidate {
                self.candidates[c].end = Some(pos);
            }
        }
        if is_block(name) && self.col > 0 {
            self.newline();
        }
    }

    fn finish(mut self) -> Document {
        let end = self.pos();
        if !self.current.is_empty() || self.lines.is_empty() {
            self.newline();
        }

        let anchor = self
            .candidates
            .iter()
            .enumerate()
            .min_by_key(|(i, c)| (c.marker, *i))
            .map(|(_, c)| AnchorSpan {
                marker: c.marker,
                start: c.start,
                end: c.end.unwrap_or(end),
                tabindex: c.tabindex,
            });

        Document {
            lines: self.lines,
            anchor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    name: String,
    closing: bool,
    self_closing: bool,
    attrs: Vec<(String, String)>,
}

impl Tag {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }
}

fn anchor_marker(tag: &Tag) -> Option<AnchorMarker> {
    if tag.attr("id") == Some("focusAnchor") {
        Some(AnchorMarker::FocusAnchor)
    } else if tag.has_class("focusTarget") {
        Some(AnchorMarker::FocusTarget)
    } else if tag.has_class("editNewInline") {
        Some(AnchorMarker::EditNew)
    } else if tag.has_class("editOldInline") {
        Some(AnchorMarker::EditOld)
    } else {
        None
    }
}

fn is_void(name: &str) -> bool {
    matches!(
        name,
        "br" | "hr" | "img" | "input" | "meta" | "link" | "wbr" | "col" | "source"
    )
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "div" | "p" | "li" | "tr" | "pre" | "ul" | "ol" | "table" | "section" | "blockquote"
            | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "hr"
    )
}

fn is_inline(name: &str) -> bool {
    matches!(
        name,
        "span" | "a" | "b" | "i" | "u" | "s" | "em" | "strong" | "code" | "mark" | "del"
            | "ins" | "sub" | "sup" | "small" | "td" | "th"
    )
}

fn is_known(name: &str) -> bool {
    is_inline(name) || is_block(name) || is_void(name)
}

/// `None` means the `<` was not a tag and is shown as text.
fn parse_tag(inner: &str) -> Option<Tag> {
    // "a < b" is text
    if inner.starts_with(char::is_whitespace) {
        return None;
    }
    let inner = inner.trim_end();
    let (closing, rest) = match inner.strip_prefix('/') {
        Some(r) => (true, r.trim_start()),
        None => (false, inner),
    };
    let (self_closing, rest) = match rest.strip_suffix('/') {
        Some(r) => (true, r),
        None => (false, rest),
    };

    let name_end = rest
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(rest.len());
    let name = rest[..name_end].to_ascii_lowercase();
    if !is_known(&name) {
        return None;
    }

    Some(Tag {
        name,
        closing,
        self_closing,
        attrs: parse_attrs(&rest[name_end..]),
    })
}

fn parse_attrs(mut s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    loop {
        s = s.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if s.is_empty() {
            break;
        }
        let key_end = s
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(s.len());
        let key = s[..key_end].to_string();
        s = s[key_end..].trim_start();

        let value = if let Some(after_eq) = s.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(q).unwrap_or(body.len());
                    s = body.get(end + 1..).unwrap_or("");
                    decode_entities(&body[..end])
                }
                _ => {
                    let end = after_eq
                        .find(char::is_whitespace)
                        .unwrap_or(after_eq.len());
                    s = &after_eq[end..];
                    decode_entities(&after_eq[..end])
                }
            }
        } else {
            String::new()
        };

        if !key.is_empty() {
            attrs.push((key, value));
        }
    }
    attrs
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Longest entity name we try to decode (`&#x10FFFF;`).
const MAX_ENTITY_LEN: usize = 10;

fn split_entity(s: &str) -> Option<(char, usize)> {
    let body = s.strip_prefix('&')?;
    let end = body
        .char_indices()
        .take(MAX_ENTITY_LEN)
        .find(|(_, c)| *c == ';')
        .map(|(i, _)| i)?;
    decode_entity(&body[..end]).map(|ch| (ch, end + 2))
}

fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match split_entity(rest) {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn parse_fragment(html: &str) -> Document {
    let mut builder = Builder::new();
    let mut rest = html;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '<' => {
                if let Some(comment) = rest.strip_prefix("<!--") {
                    rest = comment.find("-->").map(|i| &comment[i + 3..]).unwrap_or("");
                    continue;
                }
                let Some(close) = rest.find('>') else {
                    builder.push_text(rest, builder.current_mark());
                    break;
                };
                match parse_tag(&rest[1..close]) {
                    Some(tag) if tag.closing => builder.close_element(&tag.name),
                    Some(tag) => builder.open_element(tag),
                    None if rest[1..].starts_with('!') => {}
                    None => {
                        builder.push_char('<', builder.current_mark());
                        rest = &rest[1..];
                        continue;
                    }
                }
                rest = &rest[close + 1..];
            }
            '&' => {
                let mark = builder.current_mark();
                match split_entity(rest) {
                    Some((decoded, len)) => {
                        builder.push_char(decoded, mark);
                        rest = &rest[len..];
                    }
                    None => {
                        builder.push_char('&', mark);
                        rest = &rest[1..];
                    }
                }
            }
            _ => {
                builder.push_char(ch, builder.current_mark());
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    builder.finish()
}
