use encoding::label::encoding_from_whatwg_label;
use encoding::types::DecoderTrap::Strict;
use encoding::types::EncodingRef;
use encoding::Encoding;

use crate::diagnostics::{LogReporter, Reporter, Warning};
use crate::metadata::{parse_metadata, Header, HeaderEntry};
use crate::po::{self, PoItem};
use crate::{message_key, Catalog, Error, MessageEntry, Origin};

/// ReadOptions allows setting options for reading PO catalogs from bytes.
///
/// # Examples
/// ```ignore
/// extern crate encoding;
/// use encoding::all::ISO_8859_1;
///
/// let bytes = std::fs::read("french.po").unwrap();
/// let catalog = ReadOptions::new().force_encoding(ISO_8859_1).parse(&bytes).unwrap();
/// ```
#[allow(missing_debug_implementations)]
#[derive(Default)]
pub struct ReadOptions {
    force_encoding: Option<EncodingRef>,
}

impl ReadOptions {
    /// Returns a new instance of ReadOptions with default options.
    pub fn new() -> Self {
        Default::default()
    }

    /// Forces a use of a specific encoding
    /// when decoding the file.
    /// If this option is not enabled,
    /// the reader uses the charset named in the header
    /// or UTF-8 if there is no header.
    pub fn force_encoding(mut self, encoding: EncodingRef) -> Self {
        self.force_encoding = Some(encoding);
        self
    }

    /// Decodes `bytes` and reads the catalog, logging warnings.
    pub fn parse(&self, bytes: &[u8]) -> Result<Catalog, Error> {
        self.parse_with(bytes, &mut LogReporter)
    }

    /// Decodes `bytes` and reads the catalog, sending warnings to `reporter`.
    pub fn parse_with<R: Reporter>(&self, bytes: &[u8], reporter: &mut R) -> Result<Catalog, Error> {
        let encoding = match self.force_encoding {
            Some(enc) => enc,
            None => detect_encoding(bytes)?,
        };
        log::debug!("decoding PO catalog as {}", encoding.name());
        let text = encoding.decode(bytes, Strict)?;
        read_with(&text, reporter)
    }
}

/// Finds the charset of the header entry.
///
/// The file is scanned as Latin-1, which accepts every byte,
/// so the header can be located before the real encoding is known.
fn detect_encoding(bytes: &[u8]) -> Result<EncodingRef, Error> {
    let utf8: EncodingRef = encoding::all::UTF_8;
    let latin1 = encoding::all::ISO_8859_1.decode(bytes, Strict)?;
    let header = po::parse(&latin1)?.into_iter().find(PoItem::is_header);
    let charset = match header {
        Some(item) => {
            let msgstr = item.msgstr.first().map(String::as_str).unwrap_or("");
            parse_metadata(msgstr)?.charset().map(str::to_owned)
        }
        None => None,
    };
    match charset {
        // gettext writes CHARSET into templates that were never filled in
        None => Ok(utf8),
        Some(ref c) if c == "CHARSET" => Ok(utf8),
        Some(c) => encoding_from_whatwg_label(&c).ok_or(Error::UnknownEncoding(c)),
    }
}

/// Reads a catalog from PO text, logging warnings through the `log` crate.
pub fn read(source: &str) -> Result<Catalog, Error> {
    read_with(source, &mut LogReporter)
}

/// Reads a catalog from PO text, sending warnings to `reporter`.
///
/// A grammar error aborts the whole read; no partial catalog is returned.
pub fn read_with<R: Reporter>(source: &str, reporter: &mut R) -> Result<Catalog, Error> {
    let items = po::parse(source)?;
    let mut catalog = Catalog::new();
    catalog.header = HeaderEntry::Missing;

    for item in items {
        if catalog.header == HeaderEntry::Missing && item.is_header() {
            catalog.header = HeaderEntry::Present(to_header(item)?);
            continue;
        }

        let key = message_key(item.msgctxt.as_deref(), &item.msgid);
        let entry = to_entry(&key, item, reporter);
        if catalog.insert(key.as_str(), entry).is_some() {
            reporter.warn(Warning::DuplicateMessage { key });
        }
    }

    log::debug!("read {} messages", catalog.len());
    Ok(catalog)
}

fn to_header(item: PoItem) -> Result<Header, Error> {
    let msgstr = item.msgstr.first().map(String::as_str).unwrap_or("");
    Ok(Header {
        metadata: parse_metadata(msgstr)?,
        comments: item.comments,
        extracted_comments: item.extracted_comments,
        references: item.references,
        flags: item.flags,
    })
}

fn to_entry<R: Reporter>(key: &str, item: PoItem, reporter: &mut R) -> MessageEntry {
    if item.msgstr.len() > 1 {
        reporter.warn(Warning::MultipleTranslations { key: key.to_owned() });
    }
    let translation = item.msgstr.into_iter().next().unwrap_or_default();

    let mut origin = Vec::new();
    for reference in item.references.iter().flat_map(|r| r.split_whitespace()) {
        origin.push(parse_origin(key, reference, reporter));
    }

    MessageEntry {
        id: Some(item.msgid),
        translation,
        context: item.msgctxt,
        origin,
        comments: item.comments,
        extracted_comments: item.extracted_comments,
        flags: item.flags,
        obsolete: item.obsolete,
    }
}

/// Splits `path:line` on the last colon.
fn parse_origin<R: Reporter>(key: &str, reference: &str, reporter: &mut R) -> Origin {
    match reference.rsplit_once(':') {
        None => Origin::file(reference),
        Some((path, line)) => match line.parse() {
            Ok(line) if !path.is_empty() => Origin::new(path, line),
            _ => {
                reporter.warn(Warning::MalformedOrigin {
                    key: key.to_owned(),
                    reference: reference.to_owned(),
                });
                Origin::file(reference)
            }
        },
    }
}

#[cfg(test)]
fn read_collecting(source: &str) -> (Catalog, Vec<Warning>) {
    let mut warnings = Vec::new();
    let catalog = read_with(source, &mut warnings).unwrap();
    (catalog, warnings)
}

#[test]
fn test_comment_streams_are_independent() {
    let (catalog, warnings) = read_collecting(
        r#"
        #. First description
        #. Second comment
        #. Third comment
        msgid "withMultipleDescriptions"
        msgstr "Extra comments are separated from the first description line"

        # Translator comment
        #. Single description only
        # Another translator comment
        #. Second description?
        msgid "withDescriptionAndComments"
        msgstr "Second description joins translator comments"
        "#,
    );
    assert!(warnings.is_empty());

    let first = catalog.get("withMultipleDescriptions").unwrap();
    assert_eq!(
        first.extracted_comments,
        ["First description", "Second comment", "Third comment"]
    );
    assert!(first.comments.is_empty());

    let second = catalog.get("withDescriptionAndComments").unwrap();
    assert_eq!(
        second.extracted_comments,
        ["Single description only", "Second description?"]
    );
    assert_eq!(
        second.comments,
        ["Translator comment", "Another translator comment"]
    );
}

#[test]
fn test_multiple_translations_are_dropped() {
    let (catalog, warnings) = read_collecting(
        r#"
        msgid "withMultipleTranslation"
        msgstr[0] "This is just fine"
        msgstr[1] "Throw away that one"
        "#,
    );
    assert_eq!(
        catalog.get("withMultipleTranslation").unwrap().translation,
        "This is just fine"
    );
    assert_eq!(
        warnings,
        [Warning::MultipleTranslations {
            key: "withMultipleTranslation".into()
        }]
    );
    assert!(warnings[0].to_string().contains("Multiple translations"));
}

#[test]
fn test_context_keys() {
    let (catalog, warnings) = read_collecting(
        r#"
        msgctxt "menu"
        msgid "Open"
        msgstr "Ouvrir"

        msgctxt "door"
        msgid "Open"
        msgstr "Ouvert"

        msgid "Open"
        msgstr "Ouvrez"
        "#,
    );
    assert!(warnings.is_empty());
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.pgettext("menu", "Open"), "Ouvrir");
    assert_eq!(catalog.pgettext("door", "Open"), "Ouvert");
    assert_eq!(catalog.gettext("Open"), "Ouvrez");

    let door = catalog.get("door\x04Open").unwrap();
    assert_eq!(door.id.as_deref(), Some("Open"));
    assert_eq!(door.context.as_deref(), Some("door"));
}

#[test]
fn test_origins() {
    let (catalog, warnings) = read_collecting(
        r#"
        #: src/App.js:4 src/Component.js:2
        #: lib/util.js lib/bad.js:abc
        msgid "withOrigin"
        msgstr ""
        "#,
    );
    let entry = catalog.get("withOrigin").unwrap();
    assert_eq!(
        entry.origin,
        [
            Origin::new("src/App.js", 4),
            Origin::new("src/Component.js", 2),
            Origin::file("lib/util.js"),
            Origin::file("lib/bad.js:abc"),
        ]
    );
    assert_eq!(entry.origin[3].line_number(), 0);
    assert_eq!(
        warnings,
        [Warning::MalformedOrigin {
            key: "withOrigin".into(),
            reference: "lib/bad.js:abc".into()
        }]
    );
}

#[test]
fn test_header_and_flags() {
    let (catalog, _) = read_collecting(
        r#"
        # Lithuanian translations
        msgid ""
        msgstr ""
        "Language: lt\n"
        "Content-Type: text/plain; charset=utf-8\n"

        #, fuzzy,  custom
        msgid "Text"
        msgstr "Tekstas"
        "#,
    );
    let header = match catalog.header {
        HeaderEntry::Present(ref header) => header,
        ref other => panic!("expected a header, got {:?}", other),
    };
    assert_eq!(header.metadata.language(), Some("lt"));
    assert_eq!(header.comments, ["Lithuanian translations"]);
    assert!(header.flags.is_empty());
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get("Text").unwrap().flags, ["fuzzy", "custom"]);
}

#[test]
fn test_header_comment_lines() {
    let (catalog, _) = read_collecting(
        r#"
        # SOME DESCRIPTIVE TITLE.
        #. generated
        #: po/POTFILES.in
        #, fuzzy
        msgid ""
        msgstr ""
        "Content-Type: text/plain; charset=utf-8\n"
        "#,
    );
    assert_eq!(
        catalog.header,
        HeaderEntry::Present(Header {
            metadata: parse_metadata("Content-Type: text/plain; charset=utf-8\n").unwrap(),
            comments: vec!["SOME DESCRIPTIVE TITLE.".into()],
            extracted_comments: vec!["generated".into()],
            references: vec!["po/POTFILES.in".into()],
            flags: vec!["fuzzy".into()],
        })
    );
    assert!(catalog.is_empty());
}

#[test]
fn test_missing_and_empty_headers() {
    let (catalog, _) = read_collecting("msgid \"a\"\nmsgstr \"b\"\n");
    assert_eq!(catalog.header, HeaderEntry::Missing);

    let (catalog, _) = read_collecting("msgid \"\"\nmsgstr \"\"\n");
    assert_eq!(catalog.header, HeaderEntry::Present(Header::default()));
}

#[test]
fn test_duplicate_keys() {
    let (catalog, warnings) =
        read_collecting("msgid \"a\"\nmsgstr \"1\"\n\nmsgid \"a\"\nmsgstr \"2\"\n");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.gettext("a"), "2");
    assert_eq!(warnings, [Warning::DuplicateMessage { key: "a".into() }]);
}

#[test]
fn test_parse_error_is_fatal() {
    let result = read("msgid \"ok\"\nmsgstr \"fine\"\n\nmsgid \"broken\nmsgstr \"\"\n");
    assert!(matches!(result, Err(Error::Parse { line: 4, .. })));
}

#[test]
fn test_encodings() {
    let header: &[u8] =
        b"msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=windows-1257\\n\"\n\n";
    let body: &[u8] = b"msgid \"Garlic\"\nmsgstr \"\xc8esnakas\"\n";
    let bytes = [header, body].concat();

    let catalog = ReadOptions::new().parse(&bytes).unwrap();
    assert_eq!(catalog.gettext("Garlic"), "Česnakas");

    let forced = ReadOptions::new()
        .force_encoding(encoding::all::WINDOWS_1257)
        .parse(body)
        .unwrap();
    assert_eq!(forced.gettext("Garlic"), "Česnakas");

    let err = ReadOptions::new().parse(body).unwrap_err();
    assert!(matches!(err, Error::DecodingError));

    let unknown = b"msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=klingon\\n\"\n";
    assert!(matches!(
        ReadOptions::new().parse(unknown),
        Err(Error::UnknownEncoding(ref c)) if c == "klingon"
    ));
}
