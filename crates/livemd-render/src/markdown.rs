//! Markdown to HTML fragment conversion using pulldown-cmark.
//!
//! The parser runs with source offsets. Before the event stream reaches
//! pulldown-cmark's HTML writer, block starts are replaced with opening
//! tags that carry [`LINE_ATTRIBUTE`] and images are re-emitted with
//! rewritten destinations. Closing tags are left to the writer.

use std::ops::Range;
use std::path::Path;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use tracing::trace;

use crate::error::RenderError;
use crate::escape::escape;
use crate::images::rewrite_image_dest;
use crate::page;
use crate::Renderer;

/// Attribute holding the 1-based source line a block starts on.
pub const LINE_ATTRIBUTE: &str = "data-md-line";

/// Options for markdown conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Enable tables extension.
    pub tables: bool,
    /// Enable footnotes extension.
    pub footnotes: bool,
    /// Enable strikethrough extension.
    pub strikethrough: bool,
    /// Enable task lists extension.
    pub task_lists: bool,
    /// Enable heading attributes extension (e.g. `# Title {#id .class}`).
    pub heading_attributes: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
            heading_attributes: true,
        }
    }
}

impl MarkdownOptions {
    fn to_pulldown_options(self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        if self.heading_attributes {
            opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        opts
    }
}

/// [`Renderer`] backed by pulldown-cmark.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    /// Renderer with every supported extension enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer with explicit extension options.
    pub const fn with_options(options: MarkdownOptions) -> Self {
        Self { options }
    }

    /// Render a full page: the shell with `source` already in place.
    pub fn render_page(
        &self,
        source: &[u8],
        source_path: Option<&Path>,
    ) -> Result<String, RenderError> {
        let fragment = self.render_fragment(source, source_path)?;
        Ok(page::fill(&fragment))
    }
}

impl Renderer for MarkdownRenderer {
    fn render_fragment(
        &self,
        source: &[u8],
        source_path: Option<&Path>,
    ) -> Result<String, RenderError> {
        let text = std::str::from_utf8(source)?;
        let base_dir = source_path.and_then(Path::parent);

        let parser = Parser::new_ext(text, self.options.to_pulldown_options()).into_offset_iter();
        let events = Decorator::new(text, base_dir).decorate(parser);

        let mut html = String::with_capacity(text.len());
        pulldown_cmark::html::push_html(&mut html, events.into_iter());
        trace!(source_bytes = source.len(), html_bytes = html.len(), "rendered fragment");
        Ok(html)
    }

    fn render_shell(&self) -> String {
        page::shell()
    }
}

// ---------------------------------------------------------------------------
// Line lookup
// ---------------------------------------------------------------------------

/// Byte offsets at which each source line starts.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i.saturating_add(1)))
            .collect();
        Self { starts }
    }

    /// 1-based line containing `offset`. Offsets past the end map to the
    /// last line.
    fn line_of(&self, offset: usize) -> u32 {
        let line = self.starts.partition_point(|&start| start <= offset);
        u32::try_from(line.max(1)).unwrap_or(u32::MAX)
    }
}

// ---------------------------------------------------------------------------
// Event decoration
// ---------------------------------------------------------------------------

struct Decorator<'p> {
    lines: LineIndex,
    base_dir: Option<&'p Path>,
}

impl<'p> Decorator<'p> {
    fn new(text: &str, base_dir: Option<&'p Path>) -> Self {
        Self {
            lines: LineIndex::new(text),
            base_dir,
        }
    }

    fn decorate<'a, I>(&self, events: I) -> Vec<Event<'a>>
    where
        I: Iterator<Item = (Event<'a>, Range<usize>)>,
    {
        let mut events = events;
        let mut out = Vec::new();

        while let Some((event, range)) = events.next() {
            let line = self.lines.line_of(range.start);
            match event {
                Event::Start(Tag::Paragraph) => out.push(open_tag("p", line, "")),
                Event::Start(Tag::Heading {
                    level, id, classes, ..
                }) => out.push(heading_open(level, line, id.as_deref(), &classes)),
                Event::Start(Tag::BlockQuote(None)) => {
                    out.push(open_tag("blockquote", line, "\n"));
                }
                Event::Start(Tag::CodeBlock(kind)) => out.push(code_open(&kind, line)),
                Event::Start(Tag::Item) => out.push(open_tag("li", line, "")),
                Event::Start(Tag::Table(alignments)) => {
                    out.push(open_tag("div", line, "\n"));
                    out.push(Event::Start(Tag::Table(alignments)));
                }
                Event::End(TagEnd::Table) => {
                    out.push(Event::End(TagEnd::Table));
                    out.push(Event::Html(CowStr::Borrowed("</div>\n")));
                }
                Event::Rule => out.push(Event::Html(
                    format!("<hr {LINE_ATTRIBUTE}=\"{line}\" />\n").into(),
                )),
                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    let alt = collect_alt_text(&mut events);
                    out.push(self.image(&dest_url, &title, &alt));
                }
                other => out.push(other),
            }
        }

        out
    }

    fn image<'a>(&self, dest: &str, title: &str, alt: &str) -> Event<'a> {
        let rewritten = rewrite_image_dest(dest, self.base_dir);
        let src = rewritten.as_deref().unwrap_or(dest);

        let mut html = format!("<img src=\"{}\" alt=\"{}\"", escape(src), escape(alt));
        if !title.is_empty() {
            html.push_str(&format!(" title=\"{}\"", escape(title)));
        }
        if rewritten.is_some() {
            html.push_str(" loading=\"lazy\" decoding=\"async\"");
        }
        html.push_str(" />");
        Event::InlineHtml(html.into())
    }
}

fn open_tag<'a>(name: &str, line: u32, suffix: &str) -> Event<'a> {
    Event::Html(format!("<{name} {LINE_ATTRIBUTE}=\"{line}\">{suffix}").into())
}

fn heading_open<'a>(
    level: HeadingLevel,
    line: u32,
    id: Option<&str>,
    classes: &[CowStr<'_>],
) -> Event<'a> {
    let mut html = format!("<{level} {LINE_ATTRIBUTE}=\"{line}\"");
    if let Some(id) = id {
        html.push_str(&format!(" id=\"{}\"", escape(id)));
    }
    if !classes.is_empty() {
        let joined = classes
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(" ");
        html.push_str(&format!(" class=\"{}\"", escape(&joined)));
    }
    html.push('>');
    Event::Html(html.into())
}

fn code_open<'a>(kind: &CodeBlockKind<'_>, line: u32) -> Event<'a> {
    let lang = match kind {
        CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
        CodeBlockKind::Indented => "",
    };

    let html = if lang.is_empty() {
        format!("<pre {LINE_ATTRIBUTE}=\"{line}\"><code>")
    } else {
        let lang = escape(lang);
        format!("<pre {LINE_ATTRIBUTE}=\"{line}\" data-lang=\"{lang}\"><code class=\"language-{lang}\">")
    };
    Event::Html(html.into())
}

/// Consume events up to the matching image end and return the plain text
/// they contain.
fn collect_alt_text<'a, I>(events: &mut I) -> String
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    let mut alt = String::new();
    let mut depth = 1_usize;

    for (event, _) in events.by_ref() {
        match event {
            Event::Start(Tag::Image { .. }) => depth = depth.saturating_add(1),
            Event::End(TagEnd::Image) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            Event::Text(text) | Event::Code(text) => alt.push_str(&text),
            Event::SoftBreak | Event::HardBreak => alt.push(' '),
            _ => {}
        }
    }

    alt
}
