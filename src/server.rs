use crate::config::Config;
use crate::content::{self, RequestContent};
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::highlight;
use crate::markup;
use crate::paste::Paste;
use crate::resolve::{self, ResolveOptions};
use crate::template::GenericPage;
use crate::util;
use actix_web::http::header::ContentType;
use actix_web::web::Bytes;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use byte_unit::{Byte, UnitType};
use uuid::Uuid;

/// Lexer path segment standing for "no lexer".
const NO_LEXER: &str = "-";

/// Status reported for freshly created pastes.
const CREATED_STATUS: &str = "created";

/// Shows the usage page.
#[get("/")]
async fn index(request: HttpRequest) -> impl Responder {
    let context = RequestContext::from_request(&request);
    let base = format!("{}://{}", context.scheme, context.host);
    let styles = highlight::styles().collect::<Vec<_>>().join(", ");
    HttpResponse::Ok()
        .insert_header(ContentType::plaintext())
        .body(format!(
            "Create a paste:\n\
             \x20   curl -F c=@file {base}/\n\
             \x20   curl -F c=@file '{base}/?label=notes&private=1&sunset=1d'\n\
             \n\
             Highlight, render markup:\n\
             \x20   curl -F c=@file.py {base}/h/python\n\
             \x20   curl -F c=@file.py {base}/h/python/terminal\n\
             \x20   curl -F c=@README.md {base}/md\n\
             \x20   curl -F c=@README.rst {base}/rst\n\
             \n\
             Send 'Accept: application/json' for JSON, add '?r=1' to be redirected.\n\
             \n\
             Styles: {styles}\n"
        ))
}

fn remote_host(request: &HttpRequest) -> String {
    request
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown host")
        .to_string()
}

/// Reads the content of the request, failing if there is none.
async fn require_content(
    request: &HttpRequest,
    payload: web::Payload,
    config: &Config,
) -> Result<(Bytes, RequestContent)> {
    let mut content =
        content::extract_content(request, payload.into_inner(), config.server.content_limit())
            .await
            .map_err(|e| {
                tracing::warn!("rejected body from {}: {}", remote_host(request), e);
                e
            })?;
    match content.content.take() {
        Some(bytes) => Ok((bytes, content)),
        None => {
            tracing::warn!("{} sent no content", remote_host(request));
            Err(Error::NoContent)
        }
    }
}

/// Builds a paste record from the content and the upload options.
fn build_paste(content: &[u8], context: &RequestContext, config: &Config) -> Result<Paste> {
    let mut paste = Paste::from_content(content)?;
    paste.label = context.query.non_empty("label").map(String::from);
    paste.private = util::is_truthy(context.query.get("private"));
    paste.sunset = match context.query.non_empty("sunset") {
        Some(value) => Some(
            util::parse_lifetime(value)
                .map_err(|e| Error::InvalidParameter(format!("sunset: {e}")))?
                .as_secs(),
        ),
        None => config.paste.default_sunset.map(|v| v.as_secs()),
    };
    if paste.sunset.is_some_and(|secs| secs > 0) && paste.sunset_at().is_none() {
        return Err(Error::InvalidParameter(String::from("sunset: out of range")));
    }
    Ok(paste)
}

/// Creates a paste from the posted content.
#[post("/")]
async fn create(
    request: HttpRequest,
    payload: web::Payload,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let context = RequestContext::from_request(&request);
    let (bytes, content) = require_content(&request, payload, &config).await?;
    let paste = build_paste(&bytes, &context, &config)?;
    let options = ResolveOptions {
        filename: context
            .query
            .non_empty("filename")
            .map(String::from)
            .or(content.filename),
        uuid: Some(Uuid::new_v4().to_string()),
        status: Some(String::from(CREATED_STATUS)),
    };
    let size = Byte::from_u64(bytes.len() as u64).get_appropriate_unit(UnitType::Decimal);
    tracing::info!(
        "{} ({:.2}) is pasted from {}",
        paste.digest,
        size,
        remote_host(&request)
    );
    resolve::paste_response(&paste, &context, &options)
}

async fn highlight_content(
    request: HttpRequest,
    payload: web::Payload,
    config: web::Data<Config>,
    lexer: &str,
    formatter: Option<&str>,
) -> Result<HttpResponse> {
    let context = RequestContext::from_request(&request);
    let (bytes, _) = require_content(&request, payload, &config).await?;
    let lexer = if lexer == NO_LEXER { "" } else { lexer };
    highlight::highlight(
        &bytes,
        lexer,
        formatter,
        &context.style_args(),
        &config.highlight.default_style,
    )
}

/// Highlights the posted content with the default formatter.
#[post("/h/{lexer}")]
async fn highlight_default(
    request: HttpRequest,
    path: web::Path<String>,
    payload: web::Payload,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let lexer = path.into_inner();
    highlight_content(request, payload, config, &lexer, None).await
}

/// Highlights the posted content with a named formatter.
#[post("/h/{lexer}/{formatter}")]
async fn highlight_formatted(
    request: HttpRequest,
    path: web::Path<(String, String)>,
    payload: web::Payload,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let (lexer, formatter) = path.into_inner();
    highlight_content(request, payload, config, &lexer, Some(&formatter)).await
}

/// Wraps rendered markup in the page template.
fn markup_page(
    title: &str,
    html: &str,
    context: &RequestContext,
    config: &Config,
) -> Result<HttpResponse> {
    let style_args = context.style_args();
    let theme = highlight::find_theme(
        style_args.style.as_deref(),
        &config.highlight.default_style,
    );
    let theme_css = highlight::theme_css(theme)?;
    let page = GenericPage {
        title,
        cc: "container",
        theme_css: &theme_css,
        css: style_args.css.as_deref(),
        content: html,
    }
    .render()?;
    Ok(HttpResponse::Ok()
        .insert_header(ContentType::html())
        .body(page))
}

/// Renders the posted Markdown document.
#[post("/md")]
async fn markdown(
    request: HttpRequest,
    payload: web::Payload,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let context = RequestContext::from_request(&request);
    let (bytes, content) = require_content(&request, payload, &config).await?;
    let html = markup::render_markdown(&bytes)?;
    let title = content.filename.as_deref().unwrap_or("markdown");
    markup_page(title, &html, &context, &config)
}

/// Renders the posted reStructuredText document.
#[post("/rst")]
async fn rst(
    request: HttpRequest,
    payload: web::Payload,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let context = RequestContext::from_request(&request);
    let (bytes, content) = require_content(&request, payload, &config).await?;
    let html = markup::render_rst(&bytes)?;
    let title = content.filename.as_deref().unwrap_or("rst");
    markup_page(title, &html, &context, &config)
}

/// Configures the server routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(create)
        .service(highlight_default)
        .service(highlight_formatted)
        .service(markdown)
        .service(rst)
        .route("", web::head().to(HttpResponse::MethodNotAllowed));
}
