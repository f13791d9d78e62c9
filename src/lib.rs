//! This crate holds translation catalogs in memory
//! and converts them to and from the gettext PO format.
//!
//! A [`Catalog`] maps message keys to [`MessageEntry`] values
//! and keeps the order in which they were inserted,
//! so that reading a PO file and writing it back
//! reproduces the same text.
//!
//! Messages with a context are keyed the same way gettext keys them:
//! the context, a `\x04` separator, then the msgid.
//! Two messages with the same msgid but different contexts
//! therefore never collide.
//!
//! Only the first translation of a plural message is kept.
//! Reading such a message reports a [`Warning`].
//!
//! # Example
//!
//! ```ignore
//! use pocatalog::{read, write, WriteOptions};
//!
//! let text = std::fs::read_to_string("locale/fr/messages.po")?;
//! let catalog = read(&text)?;
//!
//! // Will print out the French translation
//! // if it is found in the parsed file
//! // or "Name" otherwise.
//! println!("{}", catalog.gettext("Name"));
//!
//! let options = WriteOptions::new().locale("fr").origins(false);
//! std::fs::write("locale/fr/messages.po", write(&catalog, &options))?;
//! ```

#![warn(clippy::all)]
// https://pascalhertleif.de/artikel/good-practices-for-writing-rust-libraries/
#![deny(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces
)]

mod diagnostics;
mod error;
/// Header entry of a PO file.
/// Ordered `Key: value` pairs such as `Language` or `Content-Type`.
pub mod metadata;
pub mod po;
mod reader;
mod writer;

use std::collections::HashMap;
use std::fmt;

pub use crate::diagnostics::{LogReporter, Reporter, Warning};
pub use crate::reader::{read, read_with, ReadOptions};
pub use crate::writer::{to_bytes, write, WriteOptions};
pub use crate::error::Error;
pub use crate::metadata::{Header, HeaderEntry, MetadataMap};

const CONTEXT_SEPARATOR: char = '\x04';

/// Builds the catalog key of a message that has a context.
pub fn key_with_context(context: &str, key: &str) -> String {
    let mut result = context.to_owned();
    result.push(CONTEXT_SEPARATOR);
    result.push_str(key);
    result
}

/// Catalog key of a message with an optional context.
pub fn message_key(context: Option<&str>, msgid: &str) -> String {
    match context {
        Some(ctxt) => key_with_context(ctxt, msgid),
        None => msgid.to_owned(),
    }
}

/// Source location where a message was found.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Origin {
    /// File path as written in the reference comment
    pub path: String,
    /// Line number, when the reference has one
    pub line: Option<u32>,
}

impl Origin {
    /// Creates an origin pointing at `line` of `path`.
    pub fn new<P: Into<String>>(path: P, line: u32) -> Self {
        Origin {
            path: path.into(),
            line: Some(line),
        }
    }

    /// Creates an origin without a line number.
    pub fn file<P: Into<String>>(path: P) -> Self {
        Origin {
            path: path.into(),
            line: None,
        }
    }

    /// Line number, `0` when unknown.
    pub fn line_number(&self) -> u32 {
        self.line.unwrap_or(0)
    }
}

/// Formats as a `#:` reference token, `path:line`.
impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.path, line),
            None => f.write_str(&self.path),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
/// `MessageEntry` holds everything a catalog knows about one message:
/// its translation and the metadata translators see next to it.
pub struct MessageEntry {
    /// The msgid. When absent, the catalog key is used instead.
    pub id: Option<String>,
    /// The translation. Empty when the message is not translated yet.
    pub translation: String,
    /// Context disambiguating messages with the same msgid.
    pub context: Option<String>,
    /// Where in the sources the message occurs.
    pub origin: Vec<Origin>,
    /// Comments written by translators.
    pub comments: Vec<String>,
    /// Comments extracted from the source code for translators.
    pub extracted_comments: Vec<String>,
    /// Flags such as `fuzzy` or `c-format`.
    pub flags: Vec<String>,
    /// The message is no longer used in the sources.
    pub obsolete: bool,
}

impl MessageEntry {
    /// Constructs an entry with the given msgid and translation.
    pub fn new<I: Into<String>, T: Into<String>>(id: I, translation: T) -> Self {
        MessageEntry {
            id: Some(id.into()),
            translation: translation.into(),
            ..Default::default()
        }
    }

    /// Sets the context.
    pub fn with_context<C: Into<String>>(mut self, context: C) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Returns true when the entry carries the given flag.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// The key this entry belongs under when stored by msgid.
    pub fn key(&self) -> Option<String> {
        self.id
            .as_deref()
            .map(|id| message_key(self.context.as_deref(), id))
    }

    fn get_translated(&self) -> Option<&str> {
        if self.obsolete || self.has_flag("fuzzy") || self.translation.is_empty() {
            None
        } else {
            Some(&self.translation)
        }
    }
}

/// Catalog represents a set of translation messages
/// parsed out of one PO file, in file order.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    messages: Vec<(String, MessageEntry)>,
    index: HashMap<String, usize>,
    /// Header entry, with the comment lines above it.
    pub header: HeaderEntry,
}

impl Catalog {
    /// Creates a new, empty catalog.
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true when the catalog has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Inserts `entry` under `key`.
    ///
    /// An existing entry with the same key is replaced in place and returned.
    pub fn insert<K: Into<String>>(&mut self, key: K, entry: MessageEntry) -> Option<MessageEntry> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.messages[pos].1, entry)),
            None => {
                self.index.insert(key.clone(), self.messages.len());
                self.messages.push((key, entry));
                None
            }
        }
    }

    /// Returns the entry stored under `key`.
    pub fn get(&self, key: &str) -> Option<&MessageEntry> {
        self.index.get(key).map(|&pos| &self.messages[pos].1)
    }

    /// Returns the entry stored under `key` for modification.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut MessageEntry> {
        match self.index.get(key) {
            Some(&pos) => Some(&mut self.messages[pos].1),
            None => None,
        }
    }

    /// Returns true when an entry is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Iterates over `(key, entry)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MessageEntry)> {
        self.messages.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|(k, _)| k.as_str())
    }

    /// Merge another catalog.
    ///
    /// Entries of `other` replace entries with the same key,
    /// new keys are appended.
    pub fn merge(&mut self, other: &Catalog) {
        for (key, entry) in other.iter() {
            self.insert(key, entry.clone());
        }
    }

    /// Returns the translation of `msg_id` from the given catalog
    /// or `msg_id` itself if a usable translation does not exist.
    ///
    /// Obsolete, fuzzy and empty translations are not usable.
    pub fn gettext<'a>(&'a self, msg_id: &'a str) -> &'a str {
        self.get(msg_id)
            .and_then(MessageEntry::get_translated)
            .unwrap_or(msg_id)
    }

    /// Returns the translation of `msg_id`
    /// in the context `msg_context`
    /// or `msg_id` itself if a usable translation does not exist.
    pub fn pgettext<'a>(&'a self, msg_context: &str, msg_id: &'a str) -> &'a str {
        let key = key_with_context(msg_context, msg_id);
        self.get(&key)
            .and_then(MessageEntry::get_translated)
            .unwrap_or(msg_id)
    }
}

impl<K: Into<String>> FromIterator<(K, MessageEntry)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (K, MessageEntry)>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for (key, entry) in iter {
            catalog.insert(key, entry);
        }
        catalog
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = (&'a str, &'a MessageEntry);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Two catalogs are equal when they hold the same entries in the same order
/// and the same header.
impl PartialEq for Catalog {
    fn eq(&self, other: &Catalog) -> bool {
        self.messages == other.messages && self.header == other.header
    }
}

impl Eq for Catalog {}

#[test]
fn catalog_impls_send_sync() {
    fn check<T: Send + Sync>(_: T) {}
    check(Catalog::new());
}

#[test]
fn catalog_insert() {
    let mut cat = Catalog::new();
    for entry in [
        MessageEntry::new("thisisid", ""),
        MessageEntry::new("thisisid", "").with_context("context"),
        MessageEntry::new("anotherid", ""),
        MessageEntry::new("anotherid", "").with_context("context"),
    ] {
        let key = entry.key().unwrap();
        cat.insert(key, entry);
    }
    assert_eq!(
        cat.keys().collect::<Vec<_>>(),
        &[
            "thisisid",
            "context\x04thisisid",
            "anotherid",
            "context\x04anotherid",
        ]
    )
}

#[test]
fn catalog_insert_replaces_in_place() {
    let mut cat: Catalog = vec![
        ("a", MessageEntry::new("a", "1")),
        ("b", MessageEntry::new("b", "2")),
    ]
    .into_iter()
    .collect();

    let old = cat.insert("a", MessageEntry::new("a", "3"));
    assert_eq!(old.map(|e| e.translation), Some("1".to_owned()));
    assert_eq!(cat.keys().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(cat.get("a").unwrap().translation, "3");
    assert_eq!(cat.len(), 2);
}

#[test]
fn catalog_gettext() {
    let mut cat = Catalog::new();
    cat.insert("Text", MessageEntry::new("Text", "Tekstas"));
    cat.insert(
        "context\x04Text",
        MessageEntry::new("Text", "Tekstas kontekste").with_context("context"),
    );
    let mut fuzzy = MessageEntry::new("Image", "Paveikslelis");
    fuzzy.flags.push("fuzzy".into());
    cat.insert("Image", fuzzy);
    let mut gone = MessageEntry::new("Old", "Senas");
    gone.obsolete = true;
    cat.insert("Old", gone);
    cat.insert("Empty", MessageEntry::new("Empty", ""));

    assert_eq!(cat.gettext("Text"), "Tekstas");
    assert_eq!(cat.gettext("non-existent"), "non-existent");
    assert_eq!(cat.gettext("Image"), "Image");
    assert_eq!(cat.gettext("Old"), "Old");
    assert_eq!(cat.gettext("Empty"), "Empty");
}

#[test]
fn catalog_pgettext() {
    let mut cat = Catalog::new();
    cat.insert(
        "unit test\x04Text",
        MessageEntry::new("Text", "Tekstas").with_context("unit test"),
    );
    assert_eq!(cat.pgettext("unit test", "Text"), "Tekstas");
    assert_eq!(cat.pgettext("integration test", "Text"), "Text");
    assert_eq!(cat.gettext("Text"), "Text");
}

#[test]
fn catalog_merge() {
    let mut cat = Catalog::new();
    cat.insert("a", MessageEntry::new("a", "1"));
    let mut other = Catalog::new();
    other.insert("b", MessageEntry::new("b", "2"));
    other.insert("a", MessageEntry::new("a", "3"));
    cat.merge(&other);
    assert_eq!(cat.keys().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(cat.gettext("a"), "3");
}

#[test]
fn origin_display() {
    assert_eq!(Origin::new("src/App.js", 4).to_string(), "src/App.js:4");
    assert_eq!(Origin::file("src/App.js").to_string(), "src/App.js");
    assert_eq!(Origin::file("src/App.js").line_number(), 0);
}
