use ring::digest::{Context, SHA1_FOR_LEGACY_USE_ONLY};
use std::fmt::Write;
use std::io::{BufReader, Read, Result as IoResult};
use std::time::Duration;

/// Returns the lowercase hex SHA1 digest of the given input.
///
/// SHA1 is kept as the paste identifier, not for integrity.
pub fn sha1_digest<R: Read>(input: R) -> IoResult<String> {
    let mut reader = BufReader::new(input);
    let mut context = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
    let mut buffer = [0; 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        context.update(&buffer[..bytes_read]);
    }
    Ok(context
        .finish()
        .as_ref()
        .iter()
        .fold(String::with_capacity(40), |mut output, b| {
            let _ = write!(output, "{b:02x}");
            output
        }))
}

/// Parses a lifetime given either as plain seconds or a human readable
/// duration such as `1h 30m`.
pub fn parse_lifetime(value: &str) -> Result<Duration, humantime::DurationError> {
    let value = value.trim();
    match value.parse::<u64>() {
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => humantime::parse_duration(value),
    }
}

/// Interprets a query flag the way HTML forms send them.
///
/// Empty values and `0`/`false`/`no`/`off` are unset.
pub fn is_truthy(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !matches!(
            v.to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1sum() -> IoResult<()> {
        assert_eq!(
            "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3",
            sha1_digest(String::from("test").as_bytes())?
        );
        assert_eq!(
            "da39a3ee5e6b4b0d3255bfef95601890afd80709",
            sha1_digest(&b""[..])?
        );
        Ok(())
    }

    #[test]
    fn test_parse_lifetime() -> Result<(), humantime::DurationError> {
        assert_eq!(Duration::from_secs(90), parse_lifetime("90")?);
        assert_eq!(Duration::from_secs(5400), parse_lifetime("1h 30m")?);
        assert_eq!(Duration::from_secs(86400), parse_lifetime(" 1day ")?);
        assert!(parse_lifetime("soon").is_err());
        Ok(())
    }

    #[test]
    fn test_truthy() {
        assert!(is_truthy(Some("1")));
        assert!(is_truthy(Some("yes")));
        assert!(is_truthy(Some("on")));
        assert!(!is_truthy(Some("")));
        assert!(!is_truthy(Some("0")));
        assert!(!is_truthy(Some("False")));
        assert!(!is_truthy(None));
    }
}
