use std::collections::HashMap;

use url::form_urlencoded;

use super::errors::DIDResolutionError;

pub type ParsedDIDUrl = (String, HashMap<String, String>, Option<String>);

/// Checks the `did:<method>:<method-specific-id>` shape and returns the method name.
pub fn method_name(did: &str) -> Result<&str, DIDResolutionError> {
    let mut parts = did.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("did"), Some(method), Some(id))
            if !method.is_empty()
                && method.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                && !id.is_empty() =>
        {
            Ok(method)
        }
        _ => Err(DIDResolutionError::InvalidDid),
    }
}

/// Parses DID URL into (did, query, fragment)
///
/// Paths are not dereferenced: a DID URL with a non-empty path gives `notFound`.
pub fn parse_did_url(did_url: &str) -> Result<ParsedDIDUrl, DIDResolutionError> {
    let (rest, fragment) = match did_url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment.to_string())),
        None => (did_url, None),
    };

    let (did_and_path, query) = match rest.split_once('?') {
        Some((did, query)) => (did, Some(query)),
        None => (rest, None),
    };

    let (did, path) = did_and_path.split_once('/').unwrap_or((did_and_path, ""));
    method_name(did).map_err(|_| DIDResolutionError::InvalidDidUrl)?;
    if !path.is_empty() {
        return Err(DIDResolutionError::NotFound);
    }

    let query = query
        .map(|query| {
            form_urlencoded::parse(query.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    Ok((did.to_string(), query, fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_url_parsing() {
        let (did, query, fragment) = parse_did_url("did:key:abcd?x=a&y=b#f").unwrap();
        assert_eq!(did, "did:key:abcd");
        assert_eq!(query.get("x").unwrap(), "a");
        assert_eq!(query.get("y").unwrap(), "b");
        assert_eq!(fragment.unwrap(), "f");

        let (did, query, fragment) = parse_did_url("did:web:example.com:a:b?m=hello+world").unwrap();
        assert_eq!(did, "did:web:example.com:a:b");
        assert_eq!(query.get("m").unwrap(), "hello world");
        assert!(fragment.is_none());
    }

    #[test]
    fn test_paths_are_not_dereferenced() {
        let did = "did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp";

        assert_eq!(parse_did_url(&format!("{did}/some/path")), Err(DIDResolutionError::NotFound));
        assert_eq!(parse_did_url(&format!("{did}/some/path#frag")), Err(DIDResolutionError::NotFound));
        assert_eq!(parse_did_url(&format!("{did}/")).unwrap().0, did);
        assert_eq!(parse_did_url("not-a-did/path"), Err(DIDResolutionError::InvalidDidUrl));
    }

    #[test]
    fn test_case_is_preserved() {
        let url = "did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp#z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp";
        let (did, query, fragment) = parse_did_url(url).unwrap();

        assert_eq!(did, "did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp");
        assert!(query.is_empty());
        assert_eq!(fragment.as_deref(), Some("z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp"));
    }

    #[test]
    fn test_invalid_dids() {
        for input in ["", "did", "did:", "did:key", "did:key:", "urn:key:abc", "did:KEY:abc"] {
            assert_eq!(method_name(input), Err(DIDResolutionError::InvalidDid), "{input}");
        }
        assert_eq!(method_name("did:web:example.com"), Ok("web"));
        assert_eq!(parse_did_url("not-a-did#frag"), Err(DIDResolutionError::InvalidDidUrl));
    }
}
