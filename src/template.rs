use askama::Template;

/// Page wrapping rendered HTML fragments.
#[derive(Template)]
#[template(path = "generic.html")]
pub struct GenericPage<'a> {
    /// Page title.
    pub title: &'a str,
    /// Class of the container element.
    pub cc: &'a str,
    /// Inline stylesheet, may be empty.
    pub theme_css: &'a str,
    /// URL of an extra stylesheet.
    pub css: Option<&'a str>,
    /// Rendered HTML, inserted unescaped.
    pub content: &'a str,
}
