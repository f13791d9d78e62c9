use chrono::Local;
use encoding::label::encoding_from_whatwg_label;
use encoding::types::EncoderTrap;
use serde::Deserialize;

use crate::metadata::{HeaderEntry, MetadataMap};
use crate::po::{self, PoItem};
use crate::{Catalog, Error, MessageEntry, CONTEXT_SEPARATOR};

/// WriteOptions controls how a catalog is written out.
///
/// Options can be built in code or loaded from a JSON configuration:
///
/// ```ignore
/// let options = WriteOptions::new().locale("fr").origins(false);
/// let options = WriteOptions::from_json(r#"{ "origins": false, "locale": "fr" }"#)?;
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct WriteOptions {
    /// Write `#:` reference lines.
    pub origins: bool,
    /// Write line numbers in references. Without them only paths are written.
    pub line_numbers: bool,
    /// Locale stored in the `Language` header of a newly created header.
    pub locale: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            origins: true,
            line_numbers: true,
            locale: None,
        }
    }
}

impl WriteOptions {
    /// Returns a new instance of WriteOptions with default options.
    pub fn new() -> Self {
        Default::default()
    }

    /// Loads options from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Enables or disables `#:` reference lines.
    pub fn origins(mut self, origins: bool) -> Self {
        self.origins = origins;
        self
    }

    /// Enables or disables line numbers in reference lines.
    pub fn line_numbers(mut self, line_numbers: bool) -> Self {
        self.line_numbers = line_numbers;
        self
    }

    /// Sets the locale for newly created headers.
    pub fn locale<L: Into<String>>(mut self, locale: L) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// Writes `catalog` as PO text.
///
/// Messages come out in catalog order. A header read from an existing
/// file keeps its pairs, their order and its comment lines, though long
/// strings are not folded the way the file may have folded them.
/// A file read without a header entry is written without one.
/// A catalog built in code gets a fresh set of headers stamped with
/// the current time.
pub fn write(catalog: &Catalog, options: &WriteOptions) -> String {
    let mut items = Vec::with_capacity(catalog.len() + 1);
    match catalog.header {
        HeaderEntry::New => {
            let metadata = MetadataMap::for_new_catalog(options.locale.as_deref(), Local::now());
            items.push(PoItem {
                msgstr: vec![metadata.to_string()],
                ..Default::default()
            });
        }
        HeaderEntry::Missing => {}
        HeaderEntry::Present(ref header) => items.push(PoItem {
            msgstr: vec![header.metadata.to_string()],
            comments: header.comments.clone(),
            extracted_comments: header.extracted_comments.clone(),
            references: header.references.clone(),
            flags: header.flags.clone(),
            ..Default::default()
        }),
    }
    items.extend(catalog.iter().map(|(key, entry)| to_item(key, entry, options)));

    log::debug!("writing {} messages", catalog.len());
    po::stringify(&items)
}

/// Writes `catalog` and encodes the text with the charset of its headers.
pub fn to_bytes(catalog: &Catalog, options: &WriteOptions) -> Result<Vec<u8>, Error> {
    let text = write(catalog, options);
    let charset = catalog
        .header
        .metadata()
        .and_then(MetadataMap::charset)
        .unwrap_or("utf-8");
    let encoding = encoding_from_whatwg_label(charset)
        .ok_or_else(|| Error::UnknownEncoding(charset.to_owned()))?;
    encoding
        .encode(&text, EncoderTrap::Strict)
        .map_err(|_| Error::EncodingError)
}

fn to_item(key: &str, entry: &MessageEntry, options: &WriteOptions) -> PoItem {
    let msgid = match entry.id {
        Some(ref id) => id.clone(),
        None => match key.rfind(CONTEXT_SEPARATOR) {
            Some(pos) => key[pos + CONTEXT_SEPARATOR.len_utf8()..].to_owned(),
            None => key.to_owned(),
        },
    };

    let mut references = Vec::new();
    if options.origins && !entry.origin.is_empty() {
        let tokens: Vec<String> = entry
            .origin
            .iter()
            .map(|origin| {
                if options.line_numbers {
                    origin.to_string()
                } else {
                    origin.path.clone()
                }
            })
            .collect();
        references.push(tokens.join(" "));
    }

    PoItem {
        msgctxt: entry.context.clone(),
        msgid,
        msgid_plural: None,
        msgstr: vec![entry.translation.clone()],
        comments: entry.comments.clone(),
        extracted_comments: entry.extracted_comments.clone(),
        references,
        flags: entry.flags.clone(),
        obsolete: entry.obsolete,
    }
}

#[cfg(test)]
fn headerless(text: &str) -> &str {
    let start = text.find("\n\n").map_or(text.len(), |pos| pos + 2);
    &text[start..]
}

#[test]
fn test_entry_layout() {
    use crate::Origin;

    let mut entry = MessageEntry::new("withEverything", "Everything");
    entry.context = Some("Support context".into());
    entry.extracted_comments = vec!["From the developer".into()];
    entry.comments = vec!["From the translator".into()];
    entry.origin = vec![Origin::new("src/App.js", 4), Origin::new("src/Component.js", 2)];
    entry.flags = vec!["fuzzy".into(), "otherFlag".into()];
    let catalog: Catalog = vec![("withEverything", entry)].into_iter().collect();

    let text = write(&catalog, &WriteOptions::new());
    assert_eq!(
        headerless(&text),
        "#. From the developer\n\
         # From the translator\n\
         #: src/App.js:4 src/Component.js:2\n\
         #, fuzzy, otherFlag\n\
         msgctxt \"Support context\"\n\
         msgid \"withEverything\"\n\
         msgstr \"Everything\"\n"
    );
}

#[test]
fn test_origins_suppressed() {
    use crate::Origin;

    let mut entry = MessageEntry::new("withOrigin", "Message with origin");
    entry.origin = vec![Origin::new("src/App.js", 4)];
    let catalog: Catalog = vec![("withOrigin", entry)].into_iter().collect();

    let text = write(&catalog, &WriteOptions::new().origins(false));
    assert!(!text.contains("#:"));

    let text = write(&catalog, &WriteOptions::new().line_numbers(false));
    assert!(text.contains("#: src/App.js\n"));
}

#[test]
fn test_id_falls_back_to_key() {
    let mut catalog = Catalog::new();
    catalog.insert(
        "static",
        MessageEntry {
            translation: "Static message".into(),
            ..Default::default()
        },
    );
    catalog.insert(
        "ctx\x04keyed",
        MessageEntry {
            translation: "Keyed".into(),
            context: Some("ctx".into()),
            ..Default::default()
        },
    );
    let text = write(&catalog, &WriteOptions::new());
    assert_eq!(
        headerless(&text),
        "msgid \"static\"\nmsgstr \"Static message\"\n\n\
         msgctxt \"ctx\"\nmsgid \"keyed\"\nmsgstr \"Keyed\"\n"
    );
}

#[test]
fn test_new_headers() {
    let text = write(&Catalog::new(), &WriteOptions::new().locale("en"));
    assert!(text.starts_with("msgid \"\"\nmsgstr \"\"\n\"POT-Creation-Date: "));
    assert!(text.contains("\"Language: en\\n\"\n"));
    assert!(text.contains("\"X-Generator: pocatalog\\n\"\n"));

    let text = write(&Catalog::new(), &WriteOptions::new());
    assert!(!text.contains("Language"));
}

#[test]
fn test_obsolete_round_trip() {
    use crate::read;

    let mut entry = MessageEntry::new("obsolete", "Obsolete message");
    entry.obsolete = true;
    entry.comments = vec!["still here".into()];
    let catalog: Catalog = vec![("obsolete", entry.clone())].into_iter().collect();

    let text = write(&catalog, &WriteOptions::new());
    assert!(text.contains("# still here\n#~ msgid \"obsolete\"\n#~ msgstr \"Obsolete message\"\n"));

    let back = read(&text).unwrap();
    assert_eq!(back.get("obsolete"), Some(&entry));
    assert_eq!(back.gettext("obsolete"), "obsolete");
}

#[test]
fn test_options_from_json() {
    let options = WriteOptions::from_json(r#"{ "origins": false, "locale": "cs" }"#).unwrap();
    assert_eq!(options, WriteOptions::new().origins(false).locale("cs"));

    let options = WriteOptions::from_json(r#"{ "lineNumbers": false }"#).unwrap();
    assert!(options.origins);
    assert!(!options.line_numbers);

    assert!(matches!(
        WriteOptions::from_json(r#"{ "origins": "yes" }"#),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_to_bytes_uses_header_charset() {
    use crate::read;

    let mut catalog = read(
        "msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=windows-1257\\n\"\n\n\
         msgid \"Garlic\"\nmsgstr \"Česnakas\"\n",
    )
    .unwrap();
    let bytes = to_bytes(&catalog, &WriteOptions::new()).unwrap();
    assert!(bytes.ends_with(b"msgstr \"\xc8esnakas\"\n"));

    catalog.get_mut("Garlic").unwrap().translation = "中文".into();
    assert!(matches!(
        to_bytes(&catalog, &WriteOptions::new()),
        Err(Error::EncodingError)
    ));
}

#[test]
fn test_header_comment_lines_are_written() {
    use crate::read;

    let text = "# SOME DESCRIPTIVE TITLE.\n\
                #. generated\n\
                #: po/POTFILES.in\n\
                #, fuzzy\n\
                msgid \"\"\n\
                msgstr \"Content-Type: text/plain; charset=utf-8\\n\"\n";
    let catalog = read(text).unwrap();
    let written = write(&catalog, &WriteOptions::new());
    assert_eq!(
        written,
        "#. generated\n\
         # SOME DESCRIPTIVE TITLE.\n\
         #: po/POTFILES.in\n\
         #, fuzzy\n\
         msgid \"\"\n\
         msgstr \"Content-Type: text/plain; charset=utf-8\\n\"\n"
    );
    assert_eq!(read(&written).unwrap(), catalog);
}

#[test]
fn test_empty_header_is_kept() {
    use crate::read;

    let text = "msgid \"\"\nmsgstr \"\"\n\nmsgid \"a\"\nmsgstr \"b\"\n";
    let catalog = read(text).unwrap();
    assert_eq!(write(&catalog, &WriteOptions::new()), text);

    let catalog = read("msgid \"a\"\nmsgstr \"b\"\n").unwrap();
    assert_eq!(
        write(&catalog, &WriteOptions::new()),
        "msgid \"a\"\nmsgstr \"b\"\n"
    );
}
