//! Extraction of paste content from request bodies.

use crate::error::{Error, Result};
use crate::header::{ContentDisposition, ContentKind};
use actix_multipart::Multipart;
use actix_web::dev::Payload;
use actix_web::web::{Bytes, BytesMut};
use actix_web::HttpRequest;
use futures_util::stream::StreamExt;
use url::form_urlencoded;

/// Name of the body field carrying the content.
pub const CONTENT_FIELD: &str = "c";

/// Content and file name found in a request body.
///
/// Both being absent means nothing was supplied, which is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContent {
    /// Content bytes.
    pub content: Option<Bytes>,
    /// Name of the uploaded file.
    pub filename: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct JsonBody {
    c: Option<String>,
    filename: Option<String>,
}

/// Reads the whole payload, failing once it grows past `limit` bytes.
async fn read_body(payload: &mut Payload, limit: usize) -> Result<Bytes> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| Error::MalformedBody(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(Error::PayloadTooLarge);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

fn from_json(body: &[u8]) -> Result<RequestContent> {
    let json: JsonBody = if body.is_empty() {
        JsonBody::default()
    } else {
        serde_json::from_slice(body).map_err(|e| Error::MalformedBody(e.to_string()))?
    };
    Ok(RequestContent {
        content: json
            .c
            .filter(|c| !c.is_empty())
            .map(|c| Bytes::from(c.into_bytes())),
        filename: json.filename,
    })
}

fn from_form(body: &[u8]) -> RequestContent {
    RequestContent {
        content: form_urlencoded::parse(body)
            .find(|(key, _)| key == CONTENT_FIELD)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
            .map(|value| Bytes::from(value.into_bytes())),
        filename: None,
    }
}

async fn from_multipart(mut multipart: Multipart, limit: usize) -> Result<RequestContent> {
    let mut file = None;
    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|e| Error::MalformedBody(e.to_string()))?;
        let content_disposition = ContentDisposition::from(field.content_disposition().clone());
        if !content_disposition.has_form_field(CONTENT_FIELD) {
            continue;
        }
        let filename = content_disposition.file_name().map(String::from);
        let mut bytes = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| Error::MalformedBody(e.to_string()))?;
            if bytes.len() + chunk.len() > limit {
                return Err(Error::PayloadTooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }
        match filename {
            None if !bytes.is_empty() => {
                return Ok(RequestContent {
                    content: Some(bytes.freeze()),
                    filename: None,
                });
            }
            Some(filename) if file.is_none() && !filename.is_empty() => {
                file = Some(RequestContent {
                    content: Some(bytes.freeze()),
                    filename: Some(filename),
                });
            }
            _ => {}
        }
    }
    Ok(file.unwrap_or_default())
}

/// Extracts the content of a paste from the request body.
///
/// - JSON bodies carry the content in `c` and the file name in `filename`.
/// - Form fields named `c` win over file uploads named `c`.
/// - Uploads keep their file name.
pub async fn extract_content(
    request: &HttpRequest,
    mut payload: Payload,
    limit: usize,
) -> Result<RequestContent> {
    match ContentKind::from_headers(request.headers()) {
        ContentKind::Json => from_json(&read_body(&mut payload, limit).await?),
        ContentKind::Form => Ok(from_form(&read_body(&mut payload, limit).await?)),
        ContentKind::Multipart => {
            from_multipart(Multipart::new(request.headers(), payload), limit).await
        }
        ContentKind::Unknown => Ok(RequestContent::default()),
    }
}
