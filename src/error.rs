use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Convenience alias for results carrying an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to HTTP clients.
///
/// Each variant maps to a status code and a literal plain text body
/// through [`ResponseError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Highlighting failed.
    #[error(transparent)]
    Highlight(#[from] HighlightError),
    /// Markup could not be rendered.
    #[error(transparent)]
    Markup(#[from] MarkupError),
    /// Request body was present but could not be parsed.
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    /// Request body exceeded the configured limit.
    #[error("upload limit exceeded")]
    PayloadTooLarge,
    /// No content was supplied.
    #[error("no content")]
    NoContent,
    /// Invalid query parameter.
    #[error("invalid query parameter: {0}")]
    InvalidParameter(String),
    /// Response body could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(String),
    /// Absolute URL could not be built.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    /// Page template failed to render.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    /// Content could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Highlight(e) => e.status_code(),
            Self::Markup(e) => e.status_code(),
            Self::MalformedBody(_) | Self::NoContent | Self::InvalidParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Serialize(_) | Self::Url(_) | Self::Template(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }
}

/// Errors raised while highlighting content.
#[derive(Debug, Error)]
pub enum HighlightError {
    /// Lexer name is not empty and not known.
    #[error("No such lexer.")]
    InvalidLexer,
    /// Formatter name is not known.
    #[error("No such formatter.")]
    InvalidFormatter,
    /// Content was not valid UTF-8.
    #[error("content is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
    /// The highlighting engine failed.
    #[error("highlighting failed: {0}")]
    Engine(String),
}

impl From<syntect::Error> for HighlightError {
    fn from(e: syntect::Error) -> Self {
        Self::Engine(e.to_string())
    }
}

impl From<syntect::parsing::ParsingError> for HighlightError {
    fn from(e: syntect::parsing::ParsingError) -> Self {
        Self::Engine(e.to_string())
    }
}

impl ResponseError for HighlightError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidLexer | Self::InvalidFormatter | Self::Encoding(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }
}

/// Errors raised while rendering markup.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// Document was not valid UTF-8.
    #[error("document is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
    /// reStructuredText could not be parsed or rendered.
    #[error("invalid reStructuredText: {0}")]
    Rst(String),
    /// Markdown could not be rendered.
    #[error("markdown rendering failed: {0}")]
    Markdown(String),
    /// A code block could not be highlighted.
    #[error(transparent)]
    Highlight(#[from] HighlightError),
}

impl ResponseError for MarkupError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Encoding(_) | Self::Rst(_) => StatusCode::BAD_REQUEST,
            Self::Markdown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Highlight(e) => e.status_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn test_invalid_lexer_response() {
        let error = Error::from(HighlightError::InvalidLexer);
        assert_eq!(StatusCode::BAD_REQUEST, error.status_code());
        let body = to_bytes(error.error_response().into_body())
            .await
            .unwrap_or_default();
        assert_eq!(&body[..], b"No such lexer.");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            StatusCode::PAYLOAD_TOO_LARGE,
            Error::PayloadTooLarge.status_code()
        );
        assert_eq!(StatusCode::BAD_REQUEST, Error::NoContent.status_code());
        assert_eq!(
            StatusCode::INTERNAL_SERVER_ERROR,
            Error::Serialize(String::new()).status_code()
        );
        assert_eq!(
            StatusCode::BAD_REQUEST,
            Error::from(MarkupError::Rst(String::from("x"))).status_code()
        );
    }
}
