use std::fmt;

/// A recoverable problem found while reading a catalog.
/// Reading continues after a warning is reported.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Warning {
    /// More than one `msgstr` was found; only the first one was kept.
    MultipleTranslations {
        /// Catalog key of the message
        key: String,
    },
    /// A `#:` reference has a `:` but no numeric line after it.
    MalformedOrigin {
        /// Catalog key of the message
        key: String,
        /// The reference token as written
        reference: String,
    },
    /// The same key occurred twice; the later message replaced the earlier one.
    DuplicateMessage {
        /// Catalog key of the message
        key: String,
    },
}

impl Warning {
    /// Catalog key of the message the warning is about.
    pub fn key(&self) -> &str {
        match self {
            Warning::MultipleTranslations { key }
            | Warning::MalformedOrigin { key, .. }
            | Warning::DuplicateMessage { key } => key,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::MultipleTranslations { key } => write!(
                f,
                "Multiple translations for item with key {:?}, only the first one is kept",
                key
            ),
            Warning::MalformedOrigin { key, reference } => write!(
                f,
                "Reference {:?} of item with key {:?} has no line number",
                reference, key
            ),
            Warning::DuplicateMessage { key } => {
                write!(f, "Duplicate item with key {:?}, the last one wins", key)
            }
        }
    }
}

/// Sink for warnings produced while reading.
pub trait Reporter {
    /// Receives one warning.
    fn warn(&mut self, warning: Warning);
}

/// Collects warnings for later inspection.
impl Reporter for Vec<Warning> {
    fn warn(&mut self, warning: Warning) {
        self.push(warning);
    }
}

impl<F: FnMut(Warning)> Reporter for F {
    fn warn(&mut self, warning: Warning) {
        self(warning)
    }
}

/// Forwards every warning to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
    }
}

#[test]
fn multiple_translations_message() {
    let warning = Warning::MultipleTranslations {
        key: "withMultipleTranslation".into(),
    };
    assert!(warning.to_string().contains("Multiple translations"));
    assert_eq!(warning.key(), "withMultipleTranslation");
}

#[test]
fn closure_reporter() {
    let mut seen = Vec::new();
    {
        let mut reporter = |w: Warning| seen.push(w.key().to_owned());
        reporter.warn(Warning::DuplicateMessage { key: "a".into() });
    }
    assert_eq!(seen, ["a"]);
}
