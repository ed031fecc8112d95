//! Canonical URLs and the response descriptor of a paste.

use crate::context::RequestContext;
use crate::error::Result;
use crate::paste::{Paste, PasteId};
use crate::response::{self, Descriptor};
use crate::sid;
use actix_web::HttpResponse;
use url::Url;

/// Request specific values copied into the descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// File name appended to the URLs.
    pub filename: Option<String>,
    /// Identifier handed out to manage the paste.
    pub uuid: Option<String>,
    /// Outcome of the operation, e.g. `created`.
    pub status: Option<String>,
}

/// Builds the absolute URL of a paste under the given key.
pub fn id_url(
    context: &RequestContext,
    id: &PasteId,
    filename: Option<&str>,
) -> std::result::Result<Url, url::ParseError> {
    let segment = id.path_segment();
    context.absolute_url(
        std::iter::once(segment.as_str()).chain(filename.filter(|v| !v.is_empty())),
    )
}

/// Builds the canonical URL of a paste.
pub fn canonical_url(
    context: &RequestContext,
    paste: &Paste,
    filename: Option<&str>,
) -> std::result::Result<Url, url::ParseError> {
    id_url(context, &paste.canonical_id(), filename)
}

/// Builds the descriptor of a paste along with its canonical URL.
pub fn resolve(
    paste: &Paste,
    context: &RequestContext,
    options: &ResolveOptions,
) -> Result<(Descriptor, Url)> {
    let url = canonical_url(context, paste, options.filename.as_deref())?;
    let mut descriptor = Descriptor::new();
    descriptor
        .insert("url", url.as_str())
        .insert("long", sid::encode(&paste.digest, sid::LONG_LENGTH));
    if !paste.private {
        descriptor.insert("short", sid::encode(&paste.digest, sid::SHORT_LENGTH));
    }
    descriptor
        .insert("sha1", paste.digest.as_str())
        .insert_text("uuid", options.uuid.as_deref())
        .insert_text("status", options.status.as_deref())
        .insert_text("label", paste.label.as_deref())
        .insert_some("sunset", paste.sunset_at());
    Ok((descriptor, url))
}

/// Renders the descriptor of a paste, redirecting to its canonical URL
/// when the client asks for it.
pub fn paste_response(
    paste: &Paste,
    context: &RequestContext,
    options: &ResolveOptions,
) -> Result<HttpResponse> {
    let (descriptor, url) = resolve(paste, context, options)?;
    response::render(context, &descriptor, Some(url.as_str()))
}
