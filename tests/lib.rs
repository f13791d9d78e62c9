extern crate pocatalog;

use pocatalog::{
    read, read_with, write, Catalog, HeaderEntry, MessageEntry, Origin, ReadOptions, Warning,
    WriteOptions,
};
use proptest::collection::vec;
use proptest::prelude::*;

const MESSAGES: &str = include_str!("../test_cases/messages.po");

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[test]
fn test_read_fixture() {
    let mut warnings = Vec::new();
    let catalog = read_with(MESSAGES, &mut warnings).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(catalog.len(), 11);

    let header = match catalog.header {
        HeaderEntry::Present(ref header) => header,
        ref other => panic!("expected a header, got {:?}", other),
    };
    assert_eq!(header.metadata.language(), Some("cs"));
    assert_eq!(header.metadata.charset(), Some("utf-8"));
    assert_eq!(header.comments, ["Czech translations of the demo application"]);
    assert_eq!(header.flags, ["fuzzy"]);

    let entry = catalog.get("withMultipleOrigins").unwrap();
    assert_eq!(
        entry.origin,
        [Origin::new("src/App.js", 4), Origin::new("src/Component.js", 2)]
    );

    let entry = catalog.get("Support context\x04withContext").unwrap();
    assert_eq!(entry.id.as_deref(), Some("withContext"));
    assert_eq!(entry.context.as_deref(), Some("Support context"));
    assert_eq!(entry.extracted_comments, ["Shown on the toolbar"]);
    assert_eq!(entry.comments, ["Keep it short"]);
    assert_eq!(entry.origin, [Origin::new("src/Toolbar.js", 12)]);
    assert_eq!(entry.flags, ["fuzzy", "c-format"]);

    let entry = catalog.get("Another context\x04withContext").unwrap();
    assert_eq!(entry.translation, "Jiný kontext");

    let entry = catalog.get("withNewlines").unwrap();
    assert_eq!(
        entry.translation,
        "První řádek\nDruhý řádek s \"uvozovkami\"\nTřetí"
    );

    let entry = catalog.get("obsolete").unwrap();
    assert!(entry.obsolete);
    assert_eq!(entry.translation, "Zastaralá zpráva");
    assert_eq!(entry.comments, ["Left over from the previous release"]);

    assert_eq!(catalog.gettext("static"), "Statická zpráva");
    assert_eq!(catalog.gettext("untranslated"), "untranslated");
    assert_eq!(catalog.gettext("withFlags"), "withFlags");
    assert_eq!(catalog.gettext("obsolete"), "obsolete");
    assert_eq!(catalog.pgettext("Another context", "withContext"), "Jiný kontext");
}

#[test]
fn test_write_the_same_catalog_as_it_was_read() {
    let catalog = read(MESSAGES).unwrap();
    let options = WriteOptions::new().locale("cs");
    assert_eq!(normalize(&write(&catalog, &options)), normalize(MESSAGES));
}

#[test]
fn test_crlf_input() {
    let crlf = MESSAGES.replace('\n', "\r\n");
    assert_eq!(read(&crlf).unwrap(), read(MESSAGES).unwrap());
}

#[test]
fn test_read_fixture_bytes() {
    let catalog = ReadOptions::new().parse(MESSAGES.as_bytes()).unwrap();
    assert_eq!(catalog, read(MESSAGES).unwrap());
    assert_eq!(
        pocatalog::to_bytes(&catalog, &WriteOptions::new()).unwrap(),
        MESSAGES.as_bytes()
    );
}

#[test]
fn test_no_origins() {
    let catalog = read(MESSAGES).unwrap();
    let text = write(&catalog, &WriteOptions::new().origins(false));
    assert!(!text.contains("#:"));

    let back = read(&text).unwrap();
    assert!(back.iter().all(|(_, entry)| entry.origin.is_empty()));
    assert_eq!(back.len(), catalog.len());
}

#[test]
fn test_plural_forms_collapse() {
    let mut warnings = Vec::new();
    let catalog = read_with(
        "msgid \"withMultipleTranslation\"\n\
         msgid_plural \"withMultipleTranslations\"\n\
         msgstr[0] \"This is just fine\"\n\
         msgstr[1] \"Throw away that one\"\n",
        &mut warnings,
    )
    .unwrap();
    assert_eq!(
        warnings,
        [Warning::MultipleTranslations {
            key: "withMultipleTranslation".into()
        }]
    );

    let text = write(&catalog, &WriteOptions::new());
    assert!(text.ends_with("msgid \"withMultipleTranslation\"\nmsgstr \"This is just fine\"\n"));
    assert!(!text.contains("Throw away"));
}

#[test]
fn test_context_disambiguation_round_trip() {
    let mut catalog = Catalog::new();
    for entry in [
        MessageEntry::new("Open", "Ouvrir").with_context("menu"),
        MessageEntry::new("Open", "Ouvert").with_context("door"),
    ] {
        let key = entry.key().unwrap();
        catalog.insert(key, entry);
    }

    let back = read(&write(&catalog, &WriteOptions::new())).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back.pgettext("menu", "Open"), "Ouvrir");
    assert_eq!(back.pgettext("door", "Open"), "Ouvert");
}

#[test]
fn test_flags_round_trip() {
    let mut entry = MessageEntry::new("withFlags", "Flags");
    entry.flags = vec!["fuzzy".into(), "custom".into()];
    let catalog: Catalog = vec![("withFlags", entry)].into_iter().collect();

    let back = read(&write(&catalog, &WriteOptions::new())).unwrap();
    assert_eq!(back.get("withFlags").unwrap().flags, ["fuzzy", "custom"]);
}

const COMMENT: &str = "[a-zA-Z0-9.?]([a-zA-Z0-9 .?]{0,20}[a-zA-Z0-9.?])?";

fn arb_origin() -> impl Strategy<Value = Origin> {
    ("[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.js", proptest::option::of(1u32..5000))
        .prop_map(|(path, line)| Origin { path, line })
}

fn arb_entry() -> impl Strategy<Value = MessageEntry> {
    (
        "[a-zA-Z][a-zA-Z0-9 .]{0,15}",
        "[ -~\n\t]{0,40}",
        proptest::option::of("[a-zA-Z][a-zA-Z0-9 ]{0,10}"),
        vec(arb_origin(), 0..3),
        vec(COMMENT, 0..3),
        vec(COMMENT, 0..3),
        vec("[a-z][a-z-]{0,10}", 0..3),
        any::<bool>(),
    )
        .prop_map(
            |(id, translation, context, origin, comments, extracted_comments, flags, obsolete)| {
                MessageEntry {
                    id: Some(id),
                    translation,
                    context,
                    origin,
                    comments,
                    extracted_comments,
                    flags,
                    obsolete,
                }
            },
        )
}

proptest! {
    #[test]
    fn catalog_survives_write_then_read(entries in vec(arb_entry(), 0..12)) {
        let catalog: Catalog = entries
            .into_iter()
            .map(|entry| (entry.key().unwrap(), entry))
            .collect();

        let text = write(&catalog, &WriteOptions::new());
        let back = read(&text).unwrap();
        prop_assert_eq!(
            back.iter().collect::<Vec<_>>(),
            catalog.iter().collect::<Vec<_>>()
        );

        // the headers created by the first write are kept from now on
        prop_assert_eq!(write(&back, &WriteOptions::new()), text);
    }

    #[test]
    fn origins_disabled_never_writes_references(entries in vec(arb_entry(), 1..8)) {
        let catalog: Catalog = entries
            .into_iter()
            .map(|entry| (entry.key().unwrap(), entry))
            .collect();
        let text = write(&catalog, &WriteOptions::new().origins(false));
        prop_assert!(!text.contains("#:"));
    }
}
