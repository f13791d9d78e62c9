use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, TimeZone};

use super::Error;
use Error::MalformedMetadata;

/// Name written into the `X-Generator` header of freshly created catalogs.
pub const GENERATOR: &str = "pocatalog";

/// Ordered `Key: value` pairs of a PO header entry.
///
/// Order is kept exactly as read so that an unchanged header
/// is written back identically.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MetadataMap(Vec<(String, String)>);

impl MetadataMap {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers for a catalog that has never been written before.
    /// `Language` is only present when a locale is known.
    pub fn for_new_catalog<Tz>(locale: Option<&str>, created: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut map = MetadataMap::new();
        map.insert(
            "POT-Creation-Date",
            created.format("%Y-%m-%d %H:%M%z").to_string(),
        );
        map.insert("MIME-Version", "1.0");
        map.insert("Content-Type", "text/plain; charset=utf-8");
        map.insert("Content-Transfer-Encoding", "8bit");
        map.insert("X-Generator", GENERATOR);
        if let Some(locale) = locale {
            map.insert("Language", locale);
        }
        map
    }

    /// Returns the value stored under `key`. Header keys compare case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key`, replacing an existing value in place or appending a new line.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Returns a string that indicates the character set.
    pub fn charset(&self) -> Option<&str> {
        self.get("Content-Type")
            .and_then(|x| x.split("charset=").nth(1))
            .map(|c| c.split(';').next().unwrap_or(c).trim())
            .filter(|c| !c.is_empty())
    }

    /// Returns the `Language` header.
    pub fn language(&self) -> Option<&str> {
        self.get("Language").filter(|l| !l.is_empty())
    }
}

impl Deref for MetadataMap {
    type Target = [(String, String)];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Renders the map the way it is stored in the header's msgstr.
impl fmt::Display for MetadataMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (key, value) in &self.0 {
            writeln!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

/// The header entry of a PO file: its metadata and the comment lines above it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Header {
    /// Pairs from the header's msgstr.
    pub metadata: MetadataMap,
    /// `#` lines
    pub comments: Vec<String>,
    /// `#.` lines
    pub extracted_comments: Vec<String>,
    /// `#:` lines, as written
    pub references: Vec<String>,
    /// `#,` flags, usually `fuzzy` in a fresh template
    pub flags: Vec<String>,
}

impl Header {
    /// A header holding only `metadata`.
    pub fn new(metadata: MetadataMap) -> Self {
        Header {
            metadata,
            ..Default::default()
        }
    }
}

/// Where the header of a catalog comes from.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum HeaderEntry {
    /// The catalog was built in code. The writer generates fresh headers.
    #[default]
    New,
    /// The catalog was read from a file that had no header entry.
    /// Nothing is written in its place.
    Missing,
    /// The header entry as read, written back with all its comment lines.
    Present(Header),
}

impl HeaderEntry {
    /// Metadata of a present header.
    pub fn metadata(&self) -> Option<&MetadataMap> {
        match *self {
            HeaderEntry::Present(ref header) => Some(&header.metadata),
            HeaderEntry::New | HeaderEntry::Missing => None,
        }
    }
}

/// Parses the msgstr of a header entry. Blank lines are skipped.
pub(crate) fn parse_metadata(blob: &str) -> Result<MetadataMap, Error> {
    let mut map = MetadataMap::new();
    for line in blob.split('\n').filter(|s| !s.trim().is_empty()) {
        let pos = match line.bytes().position(|b| b == b':') {
            Some(p) => p,
            None => return Err(MalformedMetadata),
        };
        map.0
            .push((line[..pos].trim().to_owned(), line[pos + 1..].trim().to_owned()));
    }
    Ok(map)
}

#[test]
fn test_metadatamap_charset() {
    let mut map = MetadataMap::new();
    assert!(map.charset().is_none());
    map.insert("Content-Type", "");
    assert!(map.charset().is_none());
    map.insert("Content-Type", "abc");
    assert!(map.charset().is_none());
    map.insert("Content-Type", "text/plain; charset=utf-42");
    assert_eq!(map.charset().unwrap(), "utf-42");
    assert_eq!(map.len(), 1);
}

#[test]
fn test_parse_metadata_keeps_order() {
    let map = parse_metadata("Language: lt\nMIME-Version: 1.0\nX-Custom: a: b\n").unwrap();
    assert_eq!(map.language(), Some("lt"));
    assert_eq!(map.get("x-custom"), Some("a: b"));
    assert_eq!(
        map.to_string(),
        "Language: lt\nMIME-Version: 1.0\nX-Custom: a: b\n"
    );
}

#[test]
fn test_parse_metadata_rejects_line_without_colon() {
    assert!(matches!(
        parse_metadata("Language: lt\nnonsense\n"),
        Err(MalformedMetadata)
    ));
}

#[test]
fn test_for_new_catalog() {
    use chrono::{FixedOffset, TimeZone};

    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    let created = offset.with_ymd_and_hms(2018, 8, 27, 10, 0, 0).unwrap();

    let map = MetadataMap::for_new_catalog(Some("en"), created);
    assert_eq!(map.get("POT-Creation-Date"), Some("2018-08-27 10:00+0200"));
    assert_eq!(map.charset(), Some("utf-8"));
    assert_eq!(map.language(), Some("en"));
    assert_eq!(map.get("X-Generator"), Some(GENERATOR));

    let map = MetadataMap::for_new_catalog(None, created);
    assert!(map.language().is_none());
}

#[test]
fn test_header_entry_metadata() {
    assert!(HeaderEntry::New.metadata().is_none());
    assert!(HeaderEntry::Missing.metadata().is_none());

    let mut map = MetadataMap::new();
    map.insert("Language", "cs");
    let entry = HeaderEntry::Present(Header::new(map));
    assert_eq!(entry.metadata().and_then(MetadataMap::language), Some("cs"));
}
