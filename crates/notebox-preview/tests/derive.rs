//! Preview derivation over generated documents.

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use notebox_preview::{derive, preview_page_count, text_pdf, PreviewGenerator, SENTINEL_TEXT};

fn marker(page: usize) -> String {
    format!("PAGE-{page:03}-MARKER")
}

fn document(pages: usize) -> Vec<u8> {
    let texts: Vec<String> = (1..=pages).map(marker).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    text_pdf(&refs).unwrap()
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|w| w == needle.as_bytes())
}

fn page_texts(bytes: &[u8]) -> Vec<Vec<u8>> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| doc.get_page_content(*id).unwrap())
        .collect()
}

#[test]
fn preview_page_counts_follow_the_rule() {
    for n in [0usize, 1, 2, 3, 4, 5, 6, 7, 10] {
        let preview = derive(&document(n)).unwrap();
        let expected = preview_page_count(n as u32) as usize + 1;
        assert_eq!(page_texts(&preview).len(), expected, "N={n}");
    }
}

#[test]
fn last_page_is_the_sentinel() {
    for n in [0usize, 3, 9] {
        let pages = page_texts(&derive(&document(n)).unwrap());
        let last = pages.last().unwrap();
        assert!(contains(last, SENTINEL_TEXT), "N={n}");
    }
}

#[test]
fn empty_document_yields_only_the_sentinel() {
    let pages = page_texts(&derive(&document(0)).unwrap());
    assert_eq!(pages.len(), 1);
    assert!(contains(&pages[0], SENTINEL_TEXT));
}

#[test]
fn kept_pages_are_copied_unchanged() {
    let full = document(7);
    let original = page_texts(&full);
    let preview = page_texts(&derive(&full).unwrap());
    assert_eq!(preview.len(), 4);
    assert_eq!(&preview[..3], &original[..3]);
}

#[test]
fn withheld_pages_do_not_survive_in_the_bytes() {
    let full = document(10);
    assert!(contains(&full, &marker(10)));
    let preview = derive(&full).unwrap();
    for page in 1..=3 {
        assert!(contains(&preview, &marker(page)), "page {page} kept");
    }
    for page in 4..=10 {
        assert!(!contains(&preview, &marker(page)), "page {page} withheld");
    }
}

#[test]
fn derivation_is_deterministic() {
    let full = document(5);
    let a = derive(&full).unwrap();
    let b = PreviewGenerator.derive(&full).unwrap();
    assert_eq!(a, b);
}

#[test]
fn preview_of_preview_stays_small() {
    let once = derive(&document(10)).unwrap();
    let twice = derive(&once).unwrap();
    assert_eq!(page_texts(&twice).len(), 2);
}

fn catalog_id(doc: &Document) -> ObjectId {
    doc.trailer.get(b"Root").unwrap().as_reference().unwrap()
}

fn form_stream(text: &str) -> Stream {
    let content = format!("BT /F1 12 Tf 0 0 Td ({text}) Tj ET");
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(200), Object::Integer(20)],
        },
        content.into_bytes(),
    )
}

fn widget(doc: &mut Document, page: ObjectId, appearance: &str) -> ObjectId {
    let ap = doc.add_object(form_stream(appearance));
    doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Rect" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(200), Object::Integer(20)],
        "P" => page,
        "AP" => dictionary! { "N" => ap },
    })
}

fn set_on(doc: &mut Document, id: ObjectId, key: &str, value: Object) {
    doc.get_object_mut(id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set(key, value);
}

/// Ten pages whose catalog, trailer and shared resources all reach page 10.
fn document_with_catalog_references() -> Vec<u8> {
    let mut doc = Document::load_mem(&document(10)).unwrap();
    let pages = doc.get_pages();
    let first = pages[&1];
    let last = pages[&10];

    // A form field split across page 1 and page 10.
    let visible = widget(&mut doc, first, "VISIBLE-WIDGET-ON-PAGE-1");
    let hidden = widget(&mut doc, last, "SECRET-ANSWER-ON-PAGE-10");
    let field = doc.add_object(dictionary! {
        "FT" => "Tx",
        "T" => Object::string_literal("answer"),
        "V" => Object::string_literal("SECRET-FIELD-VALUE"),
        "Kids" => vec![Object::from(visible), Object::from(hidden)],
    });
    set_on(&mut doc, visible, "Parent", field.into());
    set_on(&mut doc, hidden, "Parent", field.into());
    set_on(&mut doc, first, "Annots", Object::Array(vec![visible.into()]));
    set_on(&mut doc, last, "Annots", Object::Array(vec![hidden.into()]));

    // An outline entry pointing at page 10.
    let outlines = doc.new_object_id();
    let item = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Chapter 9 SECRET-SOLUTIONS"),
        "Parent" => outlines,
        "Dest" => vec![Object::from(last), Object::Name(b"Fit".to_vec())],
    });
    doc.objects.insert(
        outlines,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => item,
            "Last" => item,
            "Count" => 1i64,
        }),
    );

    let catalog = catalog_id(&doc);
    set_on(
        &mut doc,
        catalog,
        "AcroForm",
        Object::Dictionary(dictionary! { "Fields" => vec![Object::from(field)] }),
    );
    set_on(&mut doc, catalog, "Outlines", outlines.into());
    let info = doc.add_object(dictionary! {
        "Subject" => Object::string_literal("SECRET-INFO-SUBJECT"),
    });
    doc.trailer.set("Info", info);

    // A form XObject in the shared resources, painted only by page 10.
    let figure = doc.add_object(form_stream("SECRET-FIGURE-ON-PAGE-10"));
    let resources = doc
        .get_dictionary(last)
        .unwrap()
        .get(b"Resources")
        .unwrap()
        .as_reference()
        .unwrap();
    set_on(
        &mut doc,
        resources,
        "XObject",
        Object::Dictionary(dictionary! { "Fm9" => figure }),
    );
    let painter = doc.add_object(Stream::new(dictionary! {}, b"q /Fm9 Do Q".to_vec()));
    let original = doc
        .get_dictionary(last)
        .unwrap()
        .get(b"Contents")
        .unwrap()
        .clone();
    set_on(&mut doc, last, "Contents", Object::Array(vec![original, painter.into()]));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

#[test]
fn catalog_level_references_to_withheld_pages_are_not_copied() {
    let full = document_with_catalog_references();
    for secret in [
        "SECRET-ANSWER-ON-PAGE-10",
        "SECRET-FIELD-VALUE",
        "SECRET-SOLUTIONS",
        "SECRET-INFO-SUBJECT",
        "SECRET-FIGURE-ON-PAGE-10",
    ] {
        assert!(contains(&full, secret), "{secret} missing from source");
    }

    let preview = derive(&full).unwrap();
    assert_eq!(page_texts(&preview).len(), 4);
    assert!(!contains(&preview, "SECRET"));
    assert!(contains(&preview, "VISIBLE-WIDGET-ON-PAGE-1"));
    assert!(contains(&preview, &marker(1)));

    let doc = Document::load_mem(&preview).unwrap();
    let catalog = doc.get_dictionary(catalog_id(&doc)).unwrap();
    assert!(catalog.get(b"AcroForm").is_err());
    assert!(catalog.get(b"Outlines").is_err());
    assert!(doc.trailer.get(b"Info").is_err());
}

#[test]
fn copied_pages_point_at_the_new_page_tree() {
    let preview = derive(&document(5)).unwrap();
    let doc = Document::load_mem(&preview).unwrap();
    let root = doc
        .get_dictionary(catalog_id(&doc))
        .unwrap()
        .get(b"Pages")
        .unwrap()
        .as_reference()
        .unwrap();
    for page in doc.get_pages().values() {
        let parent = doc
            .get_dictionary(*page)
            .unwrap()
            .get(b"Parent")
            .unwrap()
            .as_reference()
            .unwrap();
        assert_eq!(parent, root);
    }
}
