//! HTML rendering of reStructuredText and Markdown documents.

use crate::error::MarkupError;
use crate::highlight;
use comrak::nodes::{AstNode, NodeCode, NodeHtmlBlock, NodeValue};
use comrak::{Anchorizer, Arena, Options};
use lazy_regex::{lazy_regex, Lazy, Regex};

/// Regex for matching the first line of an admonition block.
static ADMONITION_REGEX: Lazy<Regex> =
    lazy_regex!(r#"^!!! ?([\w\-]+(?: +[\w\-]+)*)(?: +"(.*?)")? *$"#);

/// Regex for matching a `key: value` metadata line.
static META_REGEX: Lazy<Regex> = lazy_regex!(r"^ {0,3}[A-Za-z0-9_\-]+:\s*.*$");

/// Regex for matching the opening or closing line of a fenced code block.
static FENCE_REGEX: Lazy<Regex> = lazy_regex!(r"^ {0,3}(`{3,}|~{3,})");

/// Regex for matching a code block written by the RST renderer.
static RST_CODE_REGEX: Lazy<Regex> =
    lazy_regex!(r#"(?s)<pre><code class="language-([^"\s]+)[^"]*">(.*?)</code></pre>"#);

/// Paragraph replaced with the table of contents.
const TOC_MARKER: &str = "[TOC]";

/// Class of the element wrapping highlighted code blocks.
const CODE_CLASS: &str = "code";

/// Renders a reStructuredText document into an HTML fragment.
///
/// `.. code:: <language>` blocks are highlighted like Markdown code.
pub fn render_rst(source: &[u8]) -> Result<String, MarkupError> {
    let source = std::str::from_utf8(source)?;
    if source.trim().is_empty() {
        return Ok(String::new());
    }
    let document = rst_parser::parse(source).map_err(|e| MarkupError::Rst(e.to_string()))?;
    let mut html = Vec::new();
    rst_renderer::render_html(&document, &mut html, false)
        .map_err(|e| MarkupError::Rst(e.to_string()))?;
    let html = String::from_utf8(html).map_err(|e| MarkupError::Encoding(e.utf8_error()))?;
    highlight_rst_code(&html)
}

/// Swaps the language tagged code blocks of rendered RST for highlighted ones.
fn highlight_rst_code(html: &str) -> Result<String, MarkupError> {
    let mut output = String::with_capacity(html.len());
    let mut last = 0;
    for captures in RST_CODE_REGEX.captures_iter(html) {
        let (Some(block), Some(language), Some(code)) =
            (captures.get(0), captures.get(1), captures.get(2))
        else {
            continue;
        };
        output.push_str(&html[last..block.start()]);
        output.push_str(&highlight::code_block(
            &unescape(code.as_str()),
            language.as_str(),
            CODE_CLASS,
        )?);
        last = block.end();
    }
    output.push_str(&html[last..]);
    Ok(output)
}

/// Renders a Markdown document into an HTML fragment.
///
/// Supports tables, footnotes, definition lists, strikethrough, wiki links,
/// `!!! type "title"` admonitions, a `[TOC]` marker and leading metadata
/// lines, which are dropped. Fenced code is highlighted.
pub fn render_markdown(source: &[u8]) -> Result<String, MarkupError> {
    let source = std::str::from_utf8(source)?;
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.footnotes = true;
    options.extension.description_lists = true;
    options.extension.strikethrough = true;
    options.extension.wikilinks_title_after_pipe = true;
    options.extension.header_ids = Some(String::new());
    options.render.unsafe_ = true;
    render_document(strip_meta(source), &options)
}

/// Drops the metadata block at the start of a document.
///
/// The block is a run of `key: value` lines, optionally opened by `---`,
/// with indented continuation lines. It ends at a blank line, at `---` or
/// `...`, or at the first line that is not metadata.
fn strip_meta(source: &str) -> &str {
    let mut rest = source;
    let mut keyed = false;
    for (index, line) in source.split_inclusive('\n').enumerate() {
        let trimmed = line.trim_end();
        if index == 0 && trimmed == "---" {
            rest = &rest[line.len()..];
            continue;
        }
        if trimmed.trim_start().is_empty() || trimmed == "---" || trimmed == "..." {
            return &rest[line.len()..];
        }
        if META_REGEX.is_match(trimmed) {
            keyed = true;
        } else if !(keyed && trimmed.starts_with("    ")) {
            break;
        }
        rest = &rest[line.len()..];
    }
    rest
}

#[derive(Debug, PartialEq, Eq)]
struct Admonition {
    classes: String,
    title: Option<String>,
    body: String,
}

impl Admonition {
    fn render(&self, options: &Options) -> Result<String, MarkupError> {
        let mut html = format!("<div class=\"admonition {}\">\n", escape(&self.classes));
        if let Some(title) = &self.title {
            html.push_str(&format!(
                "<p class=\"admonition-title\">{}</p>\n",
                escape(title)
            ));
        }
        html.push_str(&render_document(&self.body, options)?);
        html.push_str("</div>\n");
        Ok(html)
    }
}

fn placeholder(index: usize) -> String {
    format!("%%admonition-{index}%%")
}

fn placeholder_index(text: &str) -> Option<usize> {
    text.strip_prefix("%%admonition-")?
        .strip_suffix("%%")?
        .parse()
        .ok()
}

/// Cuts admonition blocks out of the source, leaving a placeholder
/// paragraph in place of each.
fn split_admonitions(source: &str) -> (String, Vec<Admonition>) {
    let mut output = String::with_capacity(source.len());
    let mut admonitions = Vec::new();
    let mut fence: Option<&str> = None;
    let mut lines = source.lines().peekable();
    while let Some(line) = lines.next() {
        if let Some(marker) = FENCE_REGEX.captures(line).and_then(|c| c.get(1)) {
            let marker = marker.as_str();
            match fence {
                None => fence = Some(marker),
                Some(open) if marker.starts_with(open) => fence = None,
                Some(_) => {}
            }
        }
        let captures = match fence {
            None => ADMONITION_REGEX.captures(line),
            Some(_) => None,
        };
        let Some(captures) = captures else {
            output.push_str(line);
            output.push('\n');
            continue;
        };
        let mut body = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() {
                body.push("");
            } else if let Some(stripped) = next
                .strip_prefix("    ")
                .or_else(|| next.strip_prefix('\t'))
            {
                body.push(stripped);
            } else {
                break;
            }
            lines.next();
        }
        let classes = captures[1].to_lowercase();
        let title = match captures.get(2) {
            None => classes.split(' ').next().map(capitalize),
            Some(title) if title.as_str().is_empty() => None,
            Some(title) => Some(title.as_str().to_string()),
        };
        output.push('\n');
        output.push_str(&placeholder(admonitions.len()));
        output.push_str("\n\n");
        admonitions.push(Admonition {
            classes,
            title,
            body: body.join("\n").trim_end().to_string(),
        });
    }
    (output, admonitions)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Collects the plain text of a node the way heading ids are computed.
fn node_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text<'a>(node: &'a AstNode<'a>, output: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(literal) | NodeValue::Code(NodeCode { literal, .. }) => {
            output.push_str(literal)
        }
        NodeValue::LineBreak | NodeValue::SoftBreak => output.push(' '),
        _ => {
            for child in node.children() {
                collect_text(child, output);
            }
        }
    }
}

#[derive(Debug)]
struct Heading {
    level: u8,
    id: String,
    text: String,
}

fn collect_headings<'a>(root: &'a AstNode<'a>) -> Vec<Heading> {
    let mut anchorizer = Anchorizer::new();
    root.descendants()
        .filter_map(|node| {
            let level = match &node.data.borrow().value {
                NodeValue::Heading(heading) => heading.level,
                _ => return None,
            };
            let text = node_text(node);
            Some(Heading {
                level,
                id: anchorizer.anchorize(text.clone()),
                text,
            })
        })
        .collect()
}

/// Builds the nested list of links to the headings.
fn table_of_contents(headings: &[Heading]) -> String {
    let mut html = String::from("<div class=\"toc\">\n");
    let mut levels: Vec<u8> = Vec::new();
    for heading in headings {
        while levels.last().is_some_and(|level| *level > heading.level) {
            html.push_str("</li>\n</ul>\n");
            levels.pop();
        }
        match levels.last() {
            Some(level) if *level == heading.level => html.push_str("</li>\n"),
            _ => {
                html.push_str("<ul>\n");
                levels.push(heading.level);
            }
        }
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            escape(&heading.id),
            escape(&heading.text)
        ));
    }
    for _ in levels {
        html.push_str("</li>\n</ul>\n");
    }
    html.push_str("</div>\n");
    html
}

fn replace_with_html<'a>(node: &'a AstNode<'a>, literal: String) {
    for child in node.children().collect::<Vec<_>>() {
        child.detach();
    }
    node.data.borrow_mut().value = NodeValue::HtmlBlock(NodeHtmlBlock {
        block_type: 6,
        literal,
    });
}

fn render_document(source: &str, options: &Options) -> Result<String, MarkupError> {
    let (source, admonitions) = split_admonitions(source);
    let arena = Arena::new();
    let root = comrak::parse_document(&arena, &source, options);
    let headings = collect_headings(root);
    for node in root.descendants().collect::<Vec<_>>() {
        let replacement = match &node.data.borrow().value {
            NodeValue::CodeBlock(code) => {
                let language = code.info.split_whitespace().next().unwrap_or_default();
                Some(highlight::code_block(&code.literal, language, CODE_CLASS)?)
            }
            NodeValue::Paragraph => {
                let text = node_text(node);
                let text = text.trim();
                if text == TOC_MARKER {
                    Some(table_of_contents(&headings))
                } else {
                    placeholder_index(text)
                        .and_then(|index| admonitions.get(index))
                        .map(|admonition| admonition.render(options))
                        .transpose()?
                }
            }
            _ => None,
        };
        if let Some(literal) = replacement {
            replace_with_html(node, literal);
        }
    }
    let mut html = Vec::new();
    comrak::format_html(root, options, &mut html)
        .map_err(|e| MarkupError::Markdown(e.to_string()))?;
    String::from_utf8(html).map_err(|e| MarkupError::Encoding(e.utf8_error()))
}
