//! Node metadata and its canonical JSON form
//!
//! Metadata travels inside the parent's fork as a JSON object. Other
//!  implementations of the format compare manifests byte for byte, so the
//!  encoding here is fixed:
//!
//! - keys keep insertion order
//! - no whitespace around `:` or `,`
//! - every `;` inside a value is followed by exactly one space
//!   (`text/html;charset=utf-8` becomes `text/html; charset=utf-8`)

use std::borrow::Cow;

use indexmap::IndexMap;

/// String to string metadata, in insertion order
pub type Metadata = IndexMap<String, String>;

/// Metadata key naming the index document of a website manifest
pub const WEBSITE_INDEX_DOCUMENT: &str = "website-index-document";
/// Metadata key naming the error document of a website manifest
pub const WEBSITE_ERROR_DOCUMENT: &str = "website-error-document";

/// Whether the metadata carries one of the website document keys.
///  Such nodes are always value nodes, even without an entry.
pub fn is_website_metadata(metadata: &Metadata) -> bool {
    metadata.contains_key(WEBSITE_INDEX_DOCUMENT) || metadata.contains_key(WEBSITE_ERROR_DOCUMENT)
}

/// Encode metadata in its canonical JSON form
pub fn to_canonical_json(metadata: &Metadata) -> Result<String, serde_json::Error> {
    let mut out = String::from("{");
    for (i, (key, value)) in metadata.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&serde_json::to_string(key)?);
        out.push(':');
        out.push_str(&serde_json::to_string(&space_after_semicolons(value))?);
    }
    out.push('}');
    Ok(out)
}

/// Parse metadata from a (possibly padded) JSON blob
pub fn from_json_bytes(data: &[u8]) -> Result<Metadata, serde_json::Error> {
    // some producers pad with NUL rather than newline
    let end = data
        .iter()
        .rposition(|b| *b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    serde_json::from_slice(&data[..end])
}

/// Any run of spaces after a `;` becomes a single space, so canonical
///  values are left unchanged by a second pass.
fn space_after_semicolons(value: &str) -> Cow<'_, str> {
    if !value.contains(';') {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 4);
    let mut rest = value;
    while let Some(i) = rest.find(';') {
        out.push_str(&rest[..i]);
        out.push_str("; ");
        rest = rest[i + 1..].trim_start_matches(' ');
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod test {
    use super::*;

    fn metadata(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_canonical_json_is_compact_and_ordered() {
        let meta = metadata(&[("Filename", "index.html"), ("Content-Type", "text/html")]);
        assert_eq!(
            to_canonical_json(&meta).unwrap(),
            r#"{"Filename":"index.html","Content-Type":"text/html"}"#
        );
    }

    #[test]
    fn test_canonical_json_semicolon_spacing() {
        let compact = metadata(&[("Content-Type", "text/html;charset=utf-8")]);
        let spaced = metadata(&[("Content-Type", "text/html; charset=utf-8")]);
        let wide = metadata(&[("Content-Type", "text/html;   charset=utf-8")]);

        let expected = r#"{"Content-Type":"text/html; charset=utf-8"}"#;
        assert_eq!(to_canonical_json(&compact).unwrap(), expected);
        assert_eq!(to_canonical_json(&spaced).unwrap(), expected);
        assert_eq!(to_canonical_json(&wide).unwrap(), expected);
    }

    #[test]
    fn test_semicolon_spaces_collapse_to_one() {
        let meta = metadata(&[("k", "a;  b")]);
        let json = to_canonical_json(&meta).unwrap();
        assert_eq!(json.as_bytes(), br#"{"k":"a; b"}"#);
        // canonical output is a fixed point
        let again = metadata(&[("k", "a; b")]);
        assert_eq!(to_canonical_json(&again).unwrap(), json);
    }

    #[test]
    fn test_canonical_json_keeps_other_whitespace_and_escapes() {
        let meta = metadata(&[("Filename", "my \"file\".txt"), ("a;b", "x")]);
        assert_eq!(
            to_canonical_json(&meta).unwrap(),
            r#"{"Filename":"my \"file\".txt","a;b":"x"}"#
        );
    }

    #[test]
    fn test_empty_metadata() {
        assert_eq!(to_canonical_json(&Metadata::new()).unwrap(), "{}");
    }

    #[test]
    fn test_parse_padded_json() {
        let mut data = br#"{"b":"2","a":"1"}"#.to_vec();
        data.extend_from_slice(&[0x0a; 13]);
        let meta = from_json_bytes(&data).unwrap();
        assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["b", "a"]);

        let mut data = br#"{"a":"1"}"#.to_vec();
        data.extend_from_slice(&[0x00; 5]);
        assert_eq!(from_json_bytes(&data).unwrap()["a"], "1");

        assert!(from_json_bytes(b"not json").is_err());
    }

    #[test]
    fn test_website_metadata() {
        assert!(is_website_metadata(&metadata(&[(
            WEBSITE_INDEX_DOCUMENT,
            "index.html"
        )])));
        assert!(is_website_metadata(&metadata(&[(
            WEBSITE_ERROR_DOCUMENT,
            "404.html"
        )])));
        assert!(!is_website_metadata(&metadata(&[("Filename", "a")])));
    }
}
