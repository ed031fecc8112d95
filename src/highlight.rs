//! Syntax highlighting of paste content.
//!
//! Lexers are syntect syntaxes looked up by name or file extension, and
//! formatters decide how the highlighted tokens are written out. An empty
//! lexer name still runs the content through the formatter as plain text,
//! so line numbers and anchors are always present.

use crate::context::StyleArgs;
use crate::error::{HighlightError, Result};
use crate::template::GenericPage;
use actix_web::http::header::ContentType;
use actix_web::HttpResponse;
use askama::Template;
use lazy_regex::Lazy;
use std::fmt::Write;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{css_for_theme_with_class_style, line_tokens_to_classed_spans, ClassStyle};
use syntect::parsing::{ParseState, Scope, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

/// Theme used when no valid style is requested.
pub const DEFAULT_STYLE: &str = "InspiredGitHub";

/// Prefix of line anchors, e.g. `L-12`.
pub const LINE_ANCHOR: &str = "L";

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

static FALLBACK_THEME: Lazy<Theme> = Lazy::new(|| {
    THEME_SET
        .themes
        .get(DEFAULT_STYLE)
        .cloned()
        .unwrap_or_default()
});

/// Output writer for highlighted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formatter {
    /// HTML table with a line number column and line anchors.
    #[default]
    HtmlTable,
    /// Classed HTML spans without line numbers.
    Html,
    /// 24-bit ANSI escape sequences.
    Terminal,
    /// Content as is.
    Text,
}

impl Formatter {
    /// Looks up a formatter by name. No name selects [`Formatter::HtmlTable`].
    pub fn from_name(name: Option<&str>) -> std::result::Result<Self, HighlightError> {
        match name.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") => Ok(Self::HtmlTable),
            Some("html") => Ok(Self::Html),
            Some("terminal" | "console" | "terminal256" | "terminal16m" | "ansi") => {
                Ok(Self::Terminal)
            }
            Some("text" | "null" | "raw") => Ok(Self::Text),
            Some(_) => Err(HighlightError::InvalidFormatter),
        }
    }

    /// Returns `true` for formatters whose output is wrapped in a page.
    pub fn is_html(&self) -> bool {
        matches!(self, Self::HtmlTable | Self::Html)
    }
}

/// Returns the syntax for a lexer name.
///
/// An empty name selects plain text.
pub fn find_lexer(name: &str) -> std::result::Result<&'static SyntaxReference, HighlightError> {
    if name.is_empty() {
        return Ok(SYNTAX_SET.find_syntax_plain_text());
    }
    SYNTAX_SET
        .find_syntax_by_token(name)
        .or_else(|| {
            SYNTAX_SET
                .syntaxes()
                .iter()
                .find(|syntax| syntax.name.eq_ignore_ascii_case(name))
        })
        .ok_or(HighlightError::InvalidLexer)
}

/// Returns the theme for a style name, falling back to `default_style`
/// and then to [`DEFAULT_STYLE`].
pub fn find_theme(style: Option<&str>, default_style: &str) -> &'static Theme {
    style
        .and_then(|name| THEME_SET.themes.get(name))
        .or_else(|| THEME_SET.themes.get(default_style))
        .unwrap_or(&*FALLBACK_THEME)
}

/// Returns the names of the available styles.
pub fn styles() -> impl Iterator<Item = &'static str> {
    THEME_SET.themes.keys().map(String::as_str)
}

/// Splits the content into lines that all end with a newline.
fn normalize_lines(content: &str) -> String {
    content.lines().fold(String::new(), |mut text, line| {
        text.push_str(line);
        text.push('\n');
        text
    })
}

fn open_span(scope: &Scope) -> String {
    format!(r#"<span class="{}">"#, scope.build_string().replace('.', " "))
}

/// Returns one classed HTML fragment per line.
///
/// Scopes spanning several lines are closed at the end of each line and
/// reopened on the next one, so every fragment is balanced.
pub fn classed_lines(
    content: &str,
    syntax: &SyntaxReference,
) -> std::result::Result<Vec<String>, HighlightError> {
    let mut parse_state = ParseState::new(syntax);
    let mut scope_stack = ScopeStack::new();
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(content) {
        let reopen: String = scope_stack.as_slice().iter().map(open_span).collect();
        let ops = parse_state.parse_line(line, &SYNTAX_SET)?;
        let (html, _) =
            line_tokens_to_classed_spans(line, &ops, ClassStyle::Spaced, &mut scope_stack)?;
        let close = "</span>".repeat(scope_stack.len());
        lines.push(format!("{reopen}{html}{close}"));
    }
    Ok(lines)
}

fn anchored_lines(lines: &[String]) -> String {
    lines
        .iter()
        .enumerate()
        .fold(String::new(), |mut output, (index, line)| {
            let _ = write!(
                output,
                r#"<span id="{LINE_ANCHOR}-{n}">{line}</span>"#,
                n = index + 1
            );
            output
        })
}

fn html_table(lines: &[String]) -> String {
    let numbers = (1..=lines.len())
        .map(|n| format!(r##"<a href="#{LINE_ANCHOR}-{n}">{n}</a>"##))
        .collect::<Vec<String>>()
        .join("\n");
    format!(
        concat!(
            r#"<table class="highlighttable"><tr>"#,
            r#"<td class="linenos"><div class="linenodiv"><pre>{}</pre></div></td>"#,
            r#"<td class="code"><div class="highlight"><pre>{}</pre></div></td>"#,
            "</tr></table>"
        ),
        numbers,
        anchored_lines(lines)
    )
}

fn html_inline(lines: &[String]) -> String {
    format!(
        r#"<div class="highlight"><pre>{}</pre></div>"#,
        lines.concat()
    )
}

/// Highlights a code block embedded in a document.
///
/// Unknown languages fall back to plain text instead of failing.
pub fn code_block(
    code: &str,
    language: &str,
    css_class: &str,
) -> std::result::Result<String, HighlightError> {
    let syntax = find_lexer(language).unwrap_or_else(|_| SYNTAX_SET.find_syntax_plain_text());
    let lines = classed_lines(&normalize_lines(code), syntax)?;
    Ok(format!(
        r#"<div class="{css_class}"><pre>{}</pre></div>"#,
        lines.concat()
    ))
}

fn terminal(
    content: &str,
    syntax: &SyntaxReference,
    theme: &Theme,
) -> std::result::Result<String, HighlightError> {
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut output = String::new();
    for line in LinesWithEndings::from(content) {
        let ranges = highlighter.highlight_line(line, &SYNTAX_SET)?;
        output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
    }
    output.push_str("\x1b[0m");
    Ok(output)
}

/// Highlights content and writes it with the given formatter.
///
/// Returns the formatted text without any page around it.
pub fn format(
    content: &str,
    lexer_name: &str,
    formatter: Formatter,
    theme: &Theme,
) -> std::result::Result<String, HighlightError> {
    let syntax = find_lexer(lexer_name)?;
    let content = normalize_lines(content);
    Ok(match formatter {
        Formatter::HtmlTable => html_table(&classed_lines(&content, syntax)?),
        Formatter::Html => html_inline(&classed_lines(&content, syntax)?),
        Formatter::Terminal => terminal(&content, syntax, theme)?,
        Formatter::Text => content,
    })
}

/// Returns the stylesheet of a theme for the classes written by the HTML
/// formatters.
pub fn theme_css(theme: &Theme) -> std::result::Result<String, HighlightError> {
    Ok(css_for_theme_with_class_style(theme, ClassStyle::Spaced)?)
}

/// Highlights content into an HTTP response.
///
/// HTML output is wrapped in the page template, styled after the `style`
/// and `css` arguments. Other formatters answer with their raw output.
pub fn highlight(
    content: &[u8],
    lexer_name: &str,
    formatter_name: Option<&str>,
    style_args: &StyleArgs,
    default_style: &str,
) -> Result<HttpResponse> {
    let formatter = Formatter::from_name(formatter_name)?;
    let theme = find_theme(style_args.style.as_deref(), default_style);
    let content = std::str::from_utf8(content).map_err(HighlightError::from)?;
    let output = format(content, lexer_name, formatter, theme)?;
    if !formatter.is_html() {
        return Ok(HttpResponse::Ok()
            .insert_header(ContentType::plaintext())
            .body(output));
    }
    let theme_css = theme_css(theme)?;
    let page = GenericPage {
        title: lexer_name,
        cc: "container-fluid",
        theme_css: &theme_css,
        css: style_args.css.as_deref(),
        content: &output,
    }
    .render()?;
    Ok(HttpResponse::Ok()
        .insert_header(ContentType::html())
        .body(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use actix_web::body::to_bytes;
    use actix_web::http::header::CONTENT_TYPE;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    const CONTENT: &str = "fn main() {\n    println!(\"<hi>\");\n}\n/* a\nb */";

    fn body_text(body: &[u8]) -> String {
        String::from_utf8_lossy(body).to_string()
    }

    #[test]
    fn test_formatter_names() {
        assert!(matches!(Formatter::from_name(None), Ok(Formatter::HtmlTable)));
        assert!(matches!(Formatter::from_name(Some("")), Ok(Formatter::HtmlTable)));
        assert!(matches!(Formatter::from_name(Some("HTML")), Ok(Formatter::Html)));
        assert!(matches!(
            Formatter::from_name(Some("terminal256")),
            Ok(Formatter::Terminal)
        ));
        assert!(matches!(
            Formatter::from_name(Some("docx")),
            Err(HighlightError::InvalidFormatter)
        ));
        assert!(!Formatter::Terminal.is_html());
    }

    #[test]
    fn test_find_lexer() {
        assert!(find_lexer("rust").is_ok());
        assert!(find_lexer("rs").is_ok());
        assert!(find_lexer("Python").is_ok());
        assert_eq!("Plain Text", find_lexer("").map(|s| s.name.as_str()).unwrap_or_default());
        assert!(matches!(
            find_lexer("nonexistent-lexer-xyz"),
            Err(HighlightError::InvalidLexer)
        ));
        assert!(matches!(find_lexer(" "), Err(HighlightError::InvalidLexer)));
    }

    #[test]
    fn test_find_theme_fallback() {
        let default_name = THEME_SET
            .themes
            .get(DEFAULT_STYLE)
            .and_then(|theme| theme.name.clone());
        assert_eq!(
            default_name,
            find_theme(Some("no-such-style"), "no-such-default").name
        );
        assert_eq!(
            THEME_SET
                .themes
                .get("base16-ocean.dark")
                .and_then(|theme| theme.name.clone()),
            find_theme(None, "base16-ocean.dark").name
        );
    }

    #[test]
    fn test_classed_lines_are_balanced() -> std::result::Result<(), HighlightError> {
        let content = normalize_lines(CONTENT);
        let lines = classed_lines(&content, find_lexer("rust")?)?;
        assert_eq!(5, lines.len());
        for line in &lines {
            assert_eq!(
                line.matches("<span").count(),
                line.matches("</span>").count()
            );
        }
        assert!(lines[1].contains("&lt;hi&gt;"));
        assert!(lines[4].starts_with("<span class=\"source rust\"><span class=\"comment"));
        Ok(())
    }

    #[test]
    fn test_table_anchors() -> std::result::Result<(), HighlightError> {
        let theme = find_theme(None, DEFAULT_STYLE);
        let output = format("a\nb\nc", "", Formatter::HtmlTable, theme)?;
        assert!(output.starts_with(r#"<table class="highlighttable">"#));
        for n in 1..=3 {
            assert!(output.contains(&format!(r##"<a href="#L-{n}">{n}</a>"##)));
            assert!(output.contains(&format!(r#"<span id="L-{n}">"#)));
        }
        assert!(!output.contains("L-4"));
        Ok(())
    }

    #[test]
    fn test_text_and_terminal() -> std::result::Result<(), HighlightError> {
        let theme = find_theme(Some("base16-ocean.dark"), DEFAULT_STYLE);
        assert_eq!("a\nb\n", format("a\r\nb", "rust", Formatter::Text, theme)?);
        let output = format(CONTENT, "rust", Formatter::Terminal, theme)?;
        assert!(output.contains("\x1b[38;2;"));
        assert!(output.ends_with("\x1b[0m"));
        Ok(())
    }

    #[test]
    fn test_code_block() -> std::result::Result<(), HighlightError> {
        let html = code_block("let x = 1;", "rust", "code")?;
        assert!(html.starts_with(r#"<div class="code"><pre><span class="source rust">"#));
        let html = code_block("<b>", "no-such-language", "code")?;
        assert!(html.contains("&lt;b&gt;"));
        Ok(())
    }

    #[actix_rt::test]
    async fn test_highlight_without_lexer() -> Result<()> {
        let content = "first line\n  <second> & line\n\nlast";
        let response = highlight(
            content.as_bytes(),
            "",
            None,
            &StyleArgs::default(),
            DEFAULT_STYLE,
        )?;
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            Some("text/html; charset=utf-8"),
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
        );
        let body = body_text(&to_bytes(response.into_body()).await.unwrap_or_default());
        assert!(body.contains(r#"<div class="container-fluid">"#));
        assert!(body.contains("first line"));
        assert!(body.contains("  &lt;second&gt; &amp; line"));
        assert!(body.contains("last"));
        assert!(body.contains(r#"<span id="L-4">"#));
        Ok(())
    }

    #[actix_rt::test]
    async fn test_highlight_styles() -> Result<()> {
        let style_args = StyleArgs {
            style: Some(String::from("base16-ocean.dark")),
            css: Some(String::from("https://cdn.example/site.css")),
        };
        let response = highlight(b"x = 1", "python", None, &style_args, DEFAULT_STYLE)?;
        let body = body_text(&to_bytes(response.into_body()).await.unwrap_or_default());
        assert!(body.contains("<style>"));
        assert!(body.contains("site.css"));
        Ok(())
    }

    #[actix_rt::test]
    async fn test_highlight_raw_formatter() -> Result<()> {
        let response = highlight(
            b"plain",
            "",
            Some("text"),
            &StyleArgs::default(),
            DEFAULT_STYLE,
        )?;
        let body = to_bytes(response.into_body()).await.unwrap_or_default();
        assert_eq!(&body[..], b"plain\n");
        Ok(())
    }

    #[test]
    fn test_highlight_rejects_bad_input() {
        let style_args = StyleArgs::default();
        assert!(matches!(
            highlight(b"x", " ", None, &style_args, DEFAULT_STYLE).err(),
            Some(Error::Highlight(HighlightError::InvalidLexer))
        ));
        let error = highlight(b"a\xffb", "", None, &style_args, DEFAULT_STYLE).err();
        assert!(matches!(
            error,
            Some(Error::Highlight(HighlightError::Encoding(_)))
        ));
        assert_eq!(
            Some(StatusCode::BAD_REQUEST),
            error.map(|e| e.status_code())
        );
    }

    #[test]
    fn test_highlight_invalid_lexer() {
        let error = highlight(
            b"x",
            "nonexistent-lexer-xyz",
            None,
            &StyleArgs::default(),
            DEFAULT_STYLE,
        )
        .err();
        assert!(matches!(
            error,
            Some(Error::Highlight(HighlightError::InvalidLexer))
        ));
        assert_eq!(
            Some(StatusCode::BAD_REQUEST),
            error.map(|e| e.status_code())
        );
    }
}
