use actix_web::http::header::{
    ContentDisposition as ActixContentDisposition, DispositionParam, DispositionType, HeaderMap,
    ACCEPT, CONTENT_TYPE,
};
use mime::Mime;

/// Header set by reverse proxies to carry the original scheme.
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Ordered list of media ranges from an `Accept` header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accept(Vec<Mime>);

impl Accept {
    /// Parses a comma separated `Accept` value.
    ///
    /// Entries that are not valid media ranges are skipped.
    pub fn parse(value: &str) -> Self {
        Self(
            value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .filter_map(|v| v.parse::<Mime>().ok())
                .collect(),
        )
    }

    /// Reads the `Accept` header, treating a missing one as empty.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(Self::parse)
            .unwrap_or_default()
    }

    /// Returns the media ranges in the order they were sent.
    pub fn media_ranges(&self) -> &[Mime] {
        &self.0
    }

    /// Returns the first of `supported` the client lists explicitly.
    ///
    /// The client's order decides; entries with `q=0` are refusals and
    /// never match.
    pub fn preferred<'a>(&self, supported: &[&'a Mime]) -> Option<&'a Mime> {
        self.0
            .iter()
            .filter(|range| !is_refused(range))
            .find_map(|range| {
                supported
                    .iter()
                    .find(|mime| mime.essence_str() == range.essence_str())
                    .copied()
            })
    }
}

fn is_refused(range: &Mime) -> bool {
    range
        .get_param("q")
        .and_then(|q| q.as_str().parse::<f32>().ok())
        .map(|q| q <= 0.0)
        .unwrap_or(false)
}

/// Shape of a request body, taken from its `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
    /// `multipart/form-data`
    Multipart,
    /// Anything else, including a missing header.
    Unknown,
}

impl ContentKind {
    /// Classifies a `Content-Type` value, ignoring its parameters.
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<Mime>() {
            Ok(mime) => match (mime.type_(), mime.subtype()) {
                (mime::APPLICATION, mime::JSON) => Self::Json,
                (mime::APPLICATION, mime::WWW_FORM_URLENCODED) => Self::Form,
                (mime::MULTIPART, mime::FORM_DATA) => Self::Multipart,
                _ => Self::Unknown,
            },
            Err(_) => Self::Unknown,
        }
    }

    /// Reads the `Content-Type` header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(Self::parse)
            .unwrap_or(Self::Unknown)
    }
}

/// Returns the scheme a proxy received the request with, if any.
pub fn forwarded_proto(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// Wrapper for Actix content disposition header.
///
/// Aims to parse the field data from multipart body.
///
/// e.g. `Content-Disposition: form-data; name="c"; filename="a.txt"`
pub struct ContentDisposition {
    inner: ActixContentDisposition,
}

impl From<ActixContentDisposition> for ContentDisposition {
    fn from(content_disposition: ActixContentDisposition) -> Self {
        Self {
            inner: content_disposition,
        }
    }
}

impl ContentDisposition {
    /// Checks if the content disposition is a form data
    /// and has the field `field_name`.
    pub fn has_form_field(&self, field_name: &str) -> bool {
        self.inner.disposition == DispositionType::FormData
            && self
                .inner
                .parameters
                .contains(&DispositionParam::Name(field_name.to_string()))
    }

    /// Returns the file name if the field is a file upload.
    pub fn file_name(&self) -> Option<&str> {
        self.inner
            .parameters
            .iter()
            .find(|param| param.is_filename())
            .and_then(|param| param.as_filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    #[test]
    fn test_content_disposition() {
        let actix_content_disposition = ActixContentDisposition {
            disposition: DispositionType::FormData,
            parameters: vec![
                DispositionParam::Name(String::from("c")),
                DispositionParam::Filename(String::from("x.txt")),
            ],
        };
        let content_disposition = ContentDisposition::from(actix_content_disposition);
        assert!(content_disposition.has_form_field("c"));
        assert!(!content_disposition.has_form_field("test"));
        assert_eq!(Some("x.txt"), content_disposition.file_name());

        let actix_content_disposition = ActixContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Name(String::from("c"))],
        };
        let content_disposition = ContentDisposition::from(actix_content_disposition);
        assert!(!content_disposition.has_form_field("c"));
        assert!(content_disposition.file_name().is_none());
    }

    #[test]
    fn test_accept_preference() {
        let json = mime::APPLICATION_JSON;
        let plain = mime::TEXT_PLAIN;
        let supported = [&json, &plain];

        let accept = Accept::parse("text/html, application/json;q=0.9");
        assert_eq!(2, accept.media_ranges().len());
        assert_eq!(Some(&json), accept.preferred(&supported));

        let accept = Accept::parse("text/plain, application/json");
        assert_eq!(Some(&plain), accept.preferred(&supported));

        let accept = Accept::parse("application/json;q=0");
        assert_eq!(None, accept.preferred(&supported));

        let accept = Accept::parse("not a mime, */*");
        assert_eq!(1, accept.media_ranges().len());
        assert_eq!(None, accept.preferred(&supported));

        assert_eq!(Accept::default(), Accept::from_headers(&HeaderMap::new()));
    }

    #[test]
    fn test_content_kind() {
        assert_eq!(ContentKind::Json, ContentKind::parse("application/json"));
        assert_eq!(
            ContentKind::Json,
            ContentKind::parse("application/json; charset=utf-8")
        );
        assert_eq!(
            ContentKind::Form,
            ContentKind::parse("application/x-www-form-urlencoded")
        );
        assert_eq!(
            ContentKind::Multipart,
            ContentKind::parse("multipart/form-data; boundary=xyz")
        );
        assert_eq!(ContentKind::Unknown, ContentKind::parse("text/plain"));
        assert_eq!(ContentKind::Unknown, ContentKind::parse(""));
        assert_eq!(
            ContentKind::Unknown,
            ContentKind::from_headers(&HeaderMap::new())
        );
    }

    #[test]
    fn test_forwarded_proto() {
        let mut headers = HeaderMap::new();
        assert_eq!(None, forwarded_proto(&headers));
        headers.insert(
            HeaderName::from_static(X_FORWARDED_PROTO),
            HeaderValue::from_static("HTTPS, http"),
        );
        assert_eq!(Some(String::from("https")), forwarded_proto(&headers));
    }
}
