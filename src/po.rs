//! Line grammar of PO files.
//!
//! This module knows about keywords, quoting and comment prefixes,
//! and nothing about catalogs. It turns text into a flat list of
//! [`PoItem`]s and back:
//!
//! - `#` translator comments, `#.` extracted comments
//! - `#:` references, `#,` flags, `#|` previous msgid (skipped)
//! - `msgctxt`, `msgid`, `msgid_plural`, `msgstr`, `msgstr[N]`
//! - `#~` obsolete keyword lines
//!
//! Obsolete items come out of [`parse`] in the same list as
//! active ones, marked with `obsolete: true`.

use crate::Error;

/// One message block of a PO file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PoItem {
    /// `msgctxt`
    pub msgctxt: Option<String>,
    /// `msgid`
    pub msgid: String,
    /// `msgid_plural`
    pub msgid_plural: Option<String>,
    /// `msgstr`, or every `msgstr[N]` in index order
    pub msgstr: Vec<String>,
    /// `#` lines
    pub comments: Vec<String>,
    /// `#.` lines
    pub extracted_comments: Vec<String>,
    /// `#:` lines, as written
    pub references: Vec<String>,
    /// `#,` flags
    pub flags: Vec<String>,
    /// The keyword lines were commented out with `#~`
    pub obsolete: bool,
}

impl PoItem {
    /// The header entry has an empty msgid and no context.
    pub fn is_header(&self) -> bool {
        self.msgid.is_empty() && self.msgctxt.is_none() && !self.obsolete
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Field {
    Ctxt,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Default)]
struct Builder {
    item: PoItem,
    has_msgid: bool,
    has_keyword: bool,
    last: Option<Field>,
}

impl Builder {
    fn finish(&mut self, items: &mut Vec<PoItem>) {
        let builder = std::mem::take(self);
        if builder.has_msgid {
            items.push(builder.item);
        } else if builder.has_keyword || !is_empty_item(&builder.item) {
            log::debug!("dropping comment block without msgid");
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Ctxt => self.item.msgctxt.get_or_insert_with(String::new),
            Field::Id => &mut self.item.msgid,
            Field::IdPlural => self.item.msgid_plural.get_or_insert_with(String::new),
            Field::Str(idx) => {
                while self.item.msgstr.len() <= idx {
                    self.item.msgstr.push(String::new());
                }
                &mut self.item.msgstr[idx]
            }
        }
    }
}

fn is_empty_item(item: &PoItem) -> bool {
    item.comments.is_empty()
        && item.extracted_comments.is_empty()
        && item.references.is_empty()
        && item.flags.is_empty()
}

/// Parses PO text into items, in file order.
pub fn parse(text: &str) -> Result<Vec<PoItem>, Error> {
    let mut items = Vec::new();
    let mut current = Builder::default();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r').trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("#~") {
            let rest = rest.trim_start();
            if rest.starts_with('|') || rest.is_empty() {
                continue;
            }
            parse_keyword_line(rest, line_no, true, &mut current, &mut items)?;
        } else if let Some(rest) = line.strip_prefix('#') {
            if current.has_msgid {
                current.finish(&mut items);
            }
            parse_comment(rest, &mut current.item);
        } else {
            parse_keyword_line(line, line_no, false, &mut current, &mut items)?;
        }
    }
    current.finish(&mut items);

    log::trace!("parsed {} PO items", items.len());
    Ok(items)
}

fn parse_comment(rest: &str, item: &mut PoItem) {
    if let Some(content) = rest.strip_prefix('.') {
        item.extracted_comments.push(comment_text(content));
    } else if let Some(content) = rest.strip_prefix(':') {
        let content = content.trim();
        if !content.is_empty() {
            item.references.push(content.to_owned());
        }
    } else if let Some(content) = rest.strip_prefix(',') {
        item.flags.extend(
            content
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_owned),
        );
    } else if rest.starts_with('|') {
        // previous msgid, not carried
    } else {
        item.comments.push(comment_text(rest));
    }
}

/// Drops the single space that separates the marker from the text.
fn comment_text(content: &str) -> String {
    content.strip_prefix(' ').unwrap_or(content).trim_end().to_owned()
}

fn parse_keyword_line(
    line: &str,
    line_no: usize,
    obsolete: bool,
    current: &mut Builder,
    items: &mut Vec<PoItem>,
) -> Result<(), Error> {
    if line.starts_with('"') {
        let field = current
            .last
            .ok_or_else(|| Error::parse(line_no, "string continuation without a keyword"))?;
        check_obsolete(current, obsolete, line_no)?;
        let value = parse_quoted(line, line_no)?;
        current.field_mut(field).push_str(&value);
        return Ok(());
    }

    let (keyword, rest) = match line.find(|c: char| c.is_whitespace() || c == '"') {
        Some(pos) => (&line[..pos], &line[pos..]),
        None => (line, ""),
    };
    let field = match keyword {
        "msgctxt" => Field::Ctxt,
        "msgid" => Field::Id,
        "msgid_plural" => Field::IdPlural,
        "msgstr" => Field::Str(0),
        _ => match keyword
            .strip_prefix("msgstr[")
            .and_then(|r| r.strip_suffix(']'))
        {
            Some(idx) => Field::Str(
                idx.parse()
                    .map_err(|_| Error::parse(line_no, "invalid msgstr index"))?,
            ),
            None => {
                return Err(Error::parse(
                    line_no,
                    format!("unexpected keyword {:?}", keyword),
                ))
            }
        },
    };

    // msgctxt or msgid after a complete msgid starts the next item
    if current.has_msgid && matches!(field, Field::Ctxt | Field::Id) {
        current.finish(items);
    }
    match field {
        Field::Ctxt | Field::Id => {}
        _ if !current.has_msgid => {
            return Err(Error::parse(line_no, format!("{} before msgid", keyword)));
        }
        // msgstr[N] must follow msgstr[N - 1]
        Field::Str(idx) if idx > current.item.msgstr.len() => {
            return Err(Error::parse(line_no, "msgstr index out of order"));
        }
        _ => {}
    }

    let value = parse_quoted(rest.trim(), line_no)?;
    if current.has_keyword {
        check_obsolete(current, obsolete, line_no)?;
    }
    current.item.obsolete = obsolete;
    current.has_keyword = true;
    if field == Field::Id {
        current.has_msgid = true;
    }
    *current.field_mut(field) = value;
    current.last = Some(field);
    Ok(())
}

fn check_obsolete(current: &Builder, obsolete: bool, line_no: usize) -> Result<(), Error> {
    if current.item.obsolete != obsolete {
        return Err(Error::parse(
            line_no,
            "obsolete and active lines mixed in one message",
        ));
    }
    Ok(())
}

/// Unquotes one `"..."` token, resolving escape sequences.
fn parse_quoted(s: &str, line_no: usize) -> Result<String, Error> {
    let body = s
        .strip_prefix('"')
        .ok_or_else(|| Error::parse(line_no, "expected quoted string"))?;
    let mut result = String::new();
    let mut chars = body.chars();

    loop {
        match chars.next() {
            None => return Err(Error::parse(line_no, "unterminated string")),
            Some('"') => break,
            Some('\\') => match chars.next() {
                None => return Err(Error::parse(line_no, "unterminated string")),
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('a') => result.push('\x07'),
                Some('b') => result.push('\x08'),
                Some('f') => result.push('\x0c'),
                Some('v') => result.push('\x0b'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(d @ '0'..='7') => {
                    // up to three octal digits, \0 through \377
                    let mut value = u32::from(d) - u32::from('0');
                    for _ in 0..2 {
                        match chars.clone().next().and_then(|c| c.to_digit(8)) {
                            Some(digit) => {
                                value = value * 8 + digit;
                                chars.next();
                            }
                            None => break,
                        }
                    }
                    let byte = u8::try_from(value)
                        .map_err(|_| Error::parse(line_no, "octal escape out of range"))?;
                    result.push(char::from(byte));
                }
                Some('x') => {
                    let mut value = None;
                    for _ in 0..2 {
                        match chars.clone().next().and_then(|c| c.to_digit(16)) {
                            Some(digit) => {
                                value = Some(value.unwrap_or(0) * 16 + digit);
                                chars.next();
                            }
                            None => break,
                        }
                    }
                    let value =
                        value.ok_or_else(|| Error::parse(line_no, "\\x without hex digits"))?;
                    result.push(char::from(value as u8));
                }
                Some(c) => {
                    return Err(Error::parse(
                        line_no,
                        format!("unknown escape sequence \\{}", c),
                    ))
                }
            },
            Some(c) => result.push(c),
        }
    }

    if !chars.as_str().trim().is_empty() {
        return Err(Error::parse(line_no, "unexpected text after string"));
    }
    Ok(result)
}

/// Quotes `text` as a single PO string token.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\x0b' => out.push_str("\\v"),
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn push_keyword(out: &mut String, prefix: &str, keyword: &str, value: &str) {
    let multiline = value
        .find('\n')
        .map_or(false, |pos| pos + 1 < value.len());
    if multiline {
        out.push_str(&format!("{}{} \"\"\n", prefix, keyword));
        for segment in value.split_inclusive('\n') {
            out.push_str(&format!("{}{}\n", prefix, escape(segment)));
        }
    } else {
        out.push_str(&format!("{}{} {}\n", prefix, keyword, escape(value)));
    }
}

fn push_comment(out: &mut String, marker: &str, text: &str) {
    out.push_str(marker);
    if !text.is_empty() {
        out.push(' ');
        out.push_str(text);
    }
    out.push('\n');
}

/// Writes items back as PO text.
///
/// Comment lines come in the order `#.`, `#`, `#:`, `#,`. Items are
/// separated by one blank line and the text ends with a newline.
pub fn stringify(items: &[PoItem]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for c in &item.extracted_comments {
            push_comment(&mut out, "#.", c);
        }
        for c in &item.comments {
            push_comment(&mut out, "#", c);
        }
        for r in &item.references {
            push_comment(&mut out, "#:", r);
        }
        if !item.flags.is_empty() {
            push_comment(&mut out, "#,", &item.flags.join(", "));
        }

        let prefix = if item.obsolete { "#~ " } else { "" };
        if let Some(ref ctxt) = item.msgctxt {
            push_keyword(&mut out, prefix, "msgctxt", ctxt);
        }
        push_keyword(&mut out, prefix, "msgid", &item.msgid);
        if let Some(ref plural) = item.msgid_plural {
            push_keyword(&mut out, prefix, "msgid_plural", plural);
            for (n, s) in item.msgstr.iter().enumerate() {
                push_keyword(&mut out, prefix, &format!("msgstr[{}]", n), s);
            }
        } else {
            let first = item.msgstr.first().map(String::as_str).unwrap_or("");
            push_keyword(&mut out, prefix, "msgstr", first);
        }
    }
    out
}

#[test]
fn test_parse_simple() {
    let items = parse("msgid \"Hello\"\nmsgstr \"Hola\"\n").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].msgid, "Hello");
    assert_eq!(items[0].msgstr, ["Hola"]);
}

#[test]
fn test_parse_multiline() {
    let input = r#"
msgid ""
"Hello "
"World"
msgstr "Hola Mundo"
"#;
    let items = parse(input).unwrap();
    assert_eq!(items[0].msgid, "Hello World");
}

#[test]
fn test_parse_plural() {
    let input = r#"
msgid "One item"
msgid_plural "%d items"
msgstr[0] "Un elemento"
msgstr[1] "%d elementos"
"#;
    let items = parse(input).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].msgid_plural.as_deref(), Some("%d items"));
    assert_eq!(items[0].msgstr, ["Un elemento", "%d elementos"]);
}

#[test]
fn test_parse_comments() {
    let input = r#"
# Translator comment
#. Extracted comment
#: file.c:123 other.c:7
#: third.c:1
#, c-format,fuzzy
#| msgid "Old"
msgid "Test %d"
msgstr "Prueba %d"
"#;
    let items = parse(input).unwrap();
    let item = &items[0];
    assert_eq!(item.comments, ["Translator comment"]);
    assert_eq!(item.extracted_comments, ["Extracted comment"]);
    assert_eq!(item.references, ["file.c:123 other.c:7", "third.c:1"]);
    assert_eq!(item.flags, ["c-format", "fuzzy"]);
}

#[test]
fn test_comments_start_next_item() {
    let input = "msgid \"a\"\nmsgstr \"A\"\n# about b\nmsgid \"b\"\nmsgstr \"B\"\n";
    let items = parse(input).unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0].comments.is_empty());
    assert_eq!(items[1].comments, ["about b"]);
}

#[test]
fn test_obsolete_lines() {
    let input = r#"
# kept around
#~ msgctxt "menu"
#~ msgid "Old"
#~ msgstr ""
#~ "Alt\n"
#~ "text"
"#;
    let items = parse(input).unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0].obsolete);
    assert_eq!(items[0].msgctxt.as_deref(), Some("menu"));
    assert_eq!(items[0].msgstr, ["Alt\ntext"]);
    assert_eq!(items[0].comments, ["kept around"]);
}

#[test]
fn test_escape_sequences() {
    let items = parse(r#"msgid "Line1\nLine2\tTab \"q\" \\"
msgstr """#)
    .unwrap();
    assert_eq!(items[0].msgid, "Line1\nLine2\tTab \"q\" \\");
    assert_eq!(escape(&items[0].msgid), r#""Line1\nLine2\tTab \"q\" \\""#);
}

#[test]
fn test_numeric_escapes() {
    let items = parse(r#"msgid "nul\0 oct\101\60 hex\x01\x7F"
msgstr """#)
    .unwrap();
    assert_eq!(items[0].msgid, "nul\0 octA0 hex\x01\x7f");

    let text = stringify(&items);
    assert_eq!(text, "msgid \"nul\\x00 octA0 hex\\x01\\x7f\"\nmsgstr \"\"\n");
    assert_eq!(parse(&text).unwrap(), items);
}

#[test]
fn test_escape_errors() {
    for bad in [r#"msgid "\q""#, r#"msgid "\400""#, r#"msgid "\xg""#] {
        let err = parse(bad).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }), "{}", bad);
    }
}

#[test]
fn test_parse_errors() {
    let err = parse("msgid \"a\"\nmsgstr \"b\nmsgid \"c\"\n").unwrap_err();
    assert!(matches!(err, Error::Parse { line: 2, .. }));

    let err = parse("msgid \"a\"\nmsgstr \"b\"\nbogus \"c\"\n").unwrap_err();
    assert!(matches!(err, Error::Parse { line: 3, .. }));

    let err = parse("\"floating\"\n").unwrap_err();
    assert!(matches!(err, Error::Parse { line: 1, .. }));

    let err = parse("msgstr \"no id\"\n").unwrap_err();
    assert!(matches!(err, Error::Parse { line: 1, .. }));

    for index in ["2", "20000000", "18446744073709551615"] {
        let text = format!("msgid \"a\"\nmsgstr[0] \"b\"\nmsgstr[{}] \"c\"\n", index);
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }
    let err = parse("msgid \"a\"\nmsgstr[1] \"b\"\n").unwrap_err();
    assert!(matches!(err, Error::Parse { line: 2, .. }));
}

#[test]
fn test_obsolete_continuation_of_active_message() {
    let err = parse("msgid \"a\"\nmsgstr \"b\"\n#~ \"junk\"\n").unwrap_err();
    assert!(matches!(err, Error::Parse { line: 3, .. }));

    let err = parse("#~ msgid \"a\"\n#~ msgstr \"b\"\n\"junk\"\n").unwrap_err();
    assert!(matches!(err, Error::Parse { line: 3, .. }));
}

#[test]
fn test_stringify_multiline_and_obsolete() {
    let item = PoItem {
        msgid: "id".into(),
        msgstr: vec!["one\ntwo".into()],
        obsolete: true,
        ..Default::default()
    };
    assert_eq!(
        stringify(&[item]),
        "#~ msgid \"id\"\n#~ msgstr \"\"\n#~ \"one\\n\"\n#~ \"two\"\n"
    );

    let item = PoItem {
        msgid: "trailing\n".into(),
        msgstr: vec![String::new()],
        ..Default::default()
    };
    assert_eq!(stringify(&[item]), "msgid \"trailing\\n\"\nmsgstr \"\"\n");
}
