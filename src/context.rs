//! Per-request data the helpers need, taken out of the request once and
//! passed around explicitly.

use crate::header::{self, Accept};
use actix_web::HttpRequest;
use std::collections::HashMap;
use url::{form_urlencoded, Url};

/// Query parameter asking for a redirect to the canonical URL.
pub const REDIRECT_PARAM: &str = "r";

/// Query parameters forwarded to the highlight page template.
pub const STYLE_PARAMS: [&str; 2] = ["style", "css"];

/// Decoded query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    /// Parses a raw query string. Later duplicates are ignored.
    pub fn parse(query: &str) -> Self {
        let mut params = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self(params)
    }

    /// Returns the value of a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the value of a parameter unless it is empty.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }
}

/// Theme and stylesheet choices for the highlight page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleArgs {
    /// Name of the color theme.
    pub style: Option<String>,
    /// URL of an extra stylesheet.
    pub css: Option<String>,
}

/// What the helpers read from the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// Scheme for absolute URLs.
    pub scheme: String,
    /// Host (and port) for absolute URLs.
    pub host: String,
    /// Media ranges the client accepts.
    pub accept: Accept,
    /// Query parameters.
    pub query: QueryParams,
}

impl RequestContext {
    /// Captures the context of an incoming request.
    ///
    /// `X-Forwarded-Proto` overrides the connection scheme.
    pub fn from_request(request: &HttpRequest) -> Self {
        let connection = request.connection_info();
        Self {
            scheme: header::forwarded_proto(request.headers())
                .unwrap_or_else(|| connection.scheme().to_string()),
            host: connection.host().to_string(),
            accept: Accept::from_headers(request.headers()),
            query: QueryParams::parse(request.query_string()),
        }
    }

    /// Returns `true` if the client asked to be redirected.
    pub fn wants_redirect(&self) -> bool {
        self.query.non_empty(REDIRECT_PARAM).is_some()
    }

    /// Returns the `style` and `css` query parameters.
    pub fn style_args(&self) -> StyleArgs {
        let [style, css] = STYLE_PARAMS.map(|key| self.query.non_empty(key).map(String::from));
        StyleArgs { style, css }
    }

    /// Builds an absolute URL from path segments.
    ///
    /// Each segment is percent-encoded on its own.
    pub fn absolute_url<I, S>(&self, segments: I) -> Result<Url, url::ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = Url::parse(&format!("{}://{}/", self.scheme, self.host))?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
