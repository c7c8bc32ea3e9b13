//! Resource path utilities.
//!
//! Splunk identifies a resource three ways: by its entry id (a full URL),
//! by its namespaced path (`/servicesNS/{owner}/{app}/...`) and by its plain
//! endpoint path (`/services/...` or the bare `data/inputs/...` form callers
//! use). Comparisons between them go through [`relative`].

use std::borrow::Cow;

use crate::error::{Result, SplunkError};

/// Reduce an id, URL or path to its endpoint-relative form.
///
/// # Example
///
/// ```
/// use splunk_client::path::relative;
///
/// assert_eq!(relative("https://localhost:8089/services/data/indexes/main"), "data/indexes/main");
/// assert_eq!(relative("/servicesNS/nobody/search/data/indexes/main"), "data/indexes/main");
/// assert_eq!(relative("data/indexes/main/"), "data/indexes/main");
/// ```
pub fn relative(path: &str) -> &str {
    let mut rest = path;
    if let Some((_, after_scheme)) = rest.split_once("://") {
        rest = after_scheme.find('/').map_or("", |i| &after_scheme[i..]);
    }
    let rest = rest.trim_matches('/');

    if let Some(namespaced) = rest.strip_prefix("servicesNS/") {
        // Skip owner and app.
        return namespaced.splitn(3, '/').nth(2).unwrap_or("");
    }
    if rest == "services" {
        return "";
    }
    rest.strip_prefix("services/").unwrap_or(rest)
}

/// Derive a collection member's name from its entry id.
///
/// The collection path (and its trailing separator) is stripped from the
/// id; the next path segment, percent-decoded, is the name.
///
/// # Example
///
/// ```
/// use splunk_client::path::member_name;
///
/// let name = member_name(
///     "https://localhost:8089/services/data/inputs/monitor/%2Fvar%2Flog%2Fmessages",
///     "data/inputs/monitor",
/// ).unwrap();
/// assert_eq!(name, "/var/log/messages");
/// ```
pub fn member_name(id: &str, collection_path: &str) -> Result<String> {
    member_segment(id, collection_path)
        .map(decode)
        .ok_or_else(|| {
            SplunkError::Parse(format!(
                "entry id `{id}` is not a member of `{collection_path}`"
            ))
        })
}

/// The raw (still encoded) member segment of an id.
pub(crate) fn member_segment<'a>(id: &'a str, collection_path: &str) -> Option<&'a str> {
    let id = relative(id);
    let collection = relative(collection_path);

    let rest = if collection.is_empty() {
        id
    } else {
        id.strip_prefix(collection)?.strip_prefix('/')?
    };

    rest.split('/').next().filter(|segment| !segment.is_empty())
}

/// Append an (unencoded) member name to a collection path.
pub fn join(collection_path: &str, name: &str) -> String {
    format!(
        "{}/{}",
        collection_path.trim_end_matches('/'),
        urlencoding::encode(name)
    )
}

/// Everything before the last segment of a path.
pub fn parent(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit_once('/')
        .map_or("", |(parent, _)| parent)
}

/// The last segment of a path, percent-decoded.
pub fn last_segment(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    decode(trimmed.rsplit('/').next().unwrap_or(trimmed))
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_name_plain_id() {
        assert_eq!(
            member_name(
                "https://localhost:8089/services/data/inputs/tcp/9999",
                "/services/data/inputs/tcp"
            )
            .unwrap(),
            "9999"
        );
    }

    #[test]
    fn test_member_name_namespaced_id() {
        assert_eq!(
            member_name(
                "https://localhost:8089/servicesNS/nobody/search/data/inputs/tcp/raw/9999",
                "data/inputs/tcp/raw"
            )
            .unwrap(),
            "9999"
        );
    }

    #[test]
    fn test_member_name_takes_next_segment_only() {
        assert_eq!(
            member_name("/services/data/inputs/tcp/raw/9999", "data/inputs/tcp").unwrap(),
            "raw"
        );
    }

    #[test]
    fn test_member_name_outside_collection() {
        let err = member_name("/services/data/indexes/main", "data/inputs/tcp").unwrap_err();
        assert!(matches!(err, SplunkError::Parse(_)));
    }

    #[test]
    fn test_member_name_requires_separator() {
        // `tcpx` shares a prefix with `tcp` but is not under it.
        assert!(member_name("/services/data/inputs/tcpx/1", "data/inputs/tcp").is_err());
    }

    #[test]
    fn test_relative_bare_host() {
        assert_eq!(relative("https://localhost:8089"), "");
        assert_eq!(relative("/services"), "");
    }

    #[test]
    fn test_join_encodes_name() {
        assert_eq!(
            join("data/inputs/monitor/", "/var/log/messages"),
            "data/inputs/monitor/%2Fvar%2Flog%2Fmessages"
        );
    }

    #[test]
    fn test_parent_and_last_segment() {
        assert_eq!(parent("data/inputs/tcp/raw/9999"), "data/inputs/tcp/raw");
        assert_eq!(parent("9999"), "");
        assert_eq!(last_segment("data/inputs/monitor/%2Fvar%2Flog"), "/var/log");
        assert_eq!(last_segment("data/indexes/main/"), "main");
    }
}
