//! Content negotiated responses.

use crate::context::RequestContext;
use crate::error::Result;
use actix_web::http::header::{ContentType, LOCATION};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use chrono::{DateTime, SecondsFormat, Utc};
use mime::Mime;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Value of a response field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Plain text.
    Text(String),
    /// Point in time, written as ISO-8601.
    Timestamp(DateTime<Utc>),
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Timestamp(time) => {
                serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
        }
    }
}

impl From<String> for Field {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Field {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<DateTime<Utc>> for Field {
    fn from(time: DateTime<Utc>) -> Self {
        Self::Timestamp(time)
    }
}

/// Mapping of field names to values that keeps insertion order.
///
/// Keys are unique; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    fields: Vec<(&'static str, Field)>,
}

impl Descriptor {
    /// Creates an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field.
    pub fn insert(&mut self, key: &'static str, value: impl Into<Field>) -> &mut Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, field)) => *field = value,
            None => self.fields.push((key, value)),
        }
        self
    }

    /// Inserts a field only if `value` is present.
    pub fn insert_some<V: Into<Field>>(&mut self, key: &'static str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Inserts a text field only if it is present and not empty.
    pub fn insert_text(&mut self, key: &'static str, value: Option<&str>) -> &mut Self {
        self.insert_some(key, value.filter(|v| !v.is_empty()))
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Field> {
        let index = self.fields.iter().position(|(k, _)| *k == key)?;
        Some(self.fields.remove(index).1)
    }

    /// Returns the value of a field.
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Returns the field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(k, _)| *k)
    }

    /// Returns `true` if the field is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl Serialize for Descriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Serialization the response body is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `application/json`
    Json,
    /// Block style YAML, served as `text/plain`.
    Yaml,
}

impl Format {
    /// Picks JSON if the client lists it, YAML otherwise.
    pub fn negotiate(context: &RequestContext) -> Self {
        let json = mime::APPLICATION_JSON;
        match context.accept.preferred(&[&json]) {
            Some(_) => Self::Json,
            None => Self::Yaml,
        }
    }

    /// Returns the media type of the serialized body.
    pub fn mime(&self) -> Mime {
        match self {
            Self::Json => mime::APPLICATION_JSON,
            Self::Yaml => mime::TEXT_PLAIN,
        }
    }

    /// Serializes the data.
    pub fn serialize<T: Serialize>(&self, data: &T) -> Result<String> {
        Ok(match self {
            Self::Json => serde_json::to_string(data)?,
            Self::Yaml => serde_yaml::to_string(data)?,
        })
    }
}

/// Renders `data` in the format the client prefers.
///
/// If a redirect target is given and the client passed the `r` query
/// parameter, the response is a `302` to the target that still carries
/// the body.
pub fn render<T: Serialize>(
    context: &RequestContext,
    data: &T,
    redirect: Option<&str>,
) -> Result<HttpResponse> {
    let format = Format::negotiate(context);
    let body = format.serialize(data)?;
    let mut response = match redirect.filter(|_| context.wants_redirect()) {
        Some(location) => {
            let mut response = HttpResponse::build(StatusCode::FOUND);
            response.insert_header((LOCATION, location));
            response
        }
        None => HttpResponse::Ok(),
    };
    Ok(response
        .insert_header(ContentType(format.mime()))
        .body(body))
}
