use crate::sid;
use crate::util;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::io::Result as IoResult;

/// Representation of a single paste record.
///
/// Records are owned by the storage layer; the helpers here only read them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paste {
    /// Hex digest of the content.
    pub digest: String,
    /// Human chosen short name.
    pub label: Option<String>,
    /// Private pastes are only reachable by their full digest.
    pub private: bool,
    /// Creation time.
    pub date: DateTime<Utc>,
    /// Lifetime in seconds.
    pub sunset: Option<u64>,
}

impl Paste {
    /// Creates a public, unlabeled record for the given content, dated now.
    pub fn from_content(content: &[u8]) -> IoResult<Self> {
        Ok(Self {
            digest: util::sha1_digest(content)?,
            label: None,
            private: false,
            date: Utc::now(),
            sunset: None,
        })
    }

    /// Returns the instant the paste expires at, if it has a lifetime.
    ///
    /// A zero lifetime means the paste never expires.
    pub fn sunset_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.sunset.filter(|secs| *secs > 0)?;
        let lifetime = ChronoDuration::try_seconds(i64::try_from(secs).ok()?)?;
        self.date.checked_add_signed(lifetime)
    }

    /// Returns the key the canonical URL of the paste is built from.
    ///
    /// Private pastes win over labels, labels win over short sids.
    pub fn canonical_id(&self) -> PasteId {
        if self.private {
            PasteId::Sha1(self.digest.clone())
        } else if let Some(label) = self.label.as_ref().filter(|v| !v.is_empty()) {
            PasteId::Label(label.clone())
        } else {
            PasteId::Sid(sid::encode(&self.digest, sid::SHORT_LENGTH))
        }
    }
}

/// Key a paste URL is built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PasteId {
    /// Full content digest.
    Sha1(String),
    /// Label, reachable under `~label`.
    Label(String),
    /// Sid of some length.
    Sid(String),
}

impl PasteId {
    /// Returns the path segment naming the paste.
    pub fn path_segment(&self) -> String {
        match self {
            Self::Sha1(digest) => digest.clone(),
            Self::Label(label) => format!("~{label}"),
            Self::Sid(sid) => sid.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn paste() -> Paste {
        Paste {
            digest: String::from("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3"),
            label: None,
            private: false,
            date: Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap(),
            sunset: None,
        }
    }

    #[test]
    fn test_from_content() -> IoResult<()> {
        let paste = Paste::from_content(b"test")?;
        assert_eq!("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3", paste.digest);
        assert!(!paste.private);
        assert!(paste.label.is_none());
        Ok(())
    }

    #[test]
    fn test_canonical_id_priority() {
        let mut paste = paste();
        assert_eq!(
            PasteId::Sid(sid::encode(&paste.digest, sid::SHORT_LENGTH)),
            paste.canonical_id()
        );

        paste.label = Some(String::from("notes"));
        assert_eq!(PasteId::Label(String::from("notes")), paste.canonical_id());
        assert_eq!("~notes", paste.canonical_id().path_segment());

        paste.private = true;
        assert_eq!(PasteId::Sha1(paste.digest.clone()), paste.canonical_id());
    }

    #[test]
    fn test_sunset_at() {
        let mut paste = paste();
        assert_eq!(None, paste.sunset_at());
        paste.sunset = Some(0);
        assert_eq!(None, paste.sunset_at());
        paste.sunset = Some(3600);
        assert_eq!(
            Some(Utc.with_ymd_and_hms(2015, 1, 1, 1, 0, 0).unwrap()),
            paste.sunset_at()
        );
    }
}
