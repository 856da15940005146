//! # Page Composition
//!
//! Builds simple single-font text pages: the sentinel page appended to every
//! preview, and whole text documents via [`text_pdf`].

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::PreviewError;

/// Headline of the sentinel page.
pub const SENTINEL_TEXT: &str = "Preview ends here";

const SENTINEL_SUBTITLE: &str = "Purchase this note to read the full document.";

/// A4 in PDF points.
const MEDIA_BOX: [i64; 4] = [0, 0, 595, 842];

fn media_box() -> Object {
    Object::Array(MEDIA_BOX.iter().map(|v| Object::Integer(*v)).collect())
}

fn font_resources(doc: &mut Document) -> ObjectId {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    })
}

fn text_operations(lines: &[(&str, i64)]) -> Vec<Operation> {
    let mut ops = vec![Operation::new("BT", vec![])];
    let mut y = 770;
    for (text, size) in lines {
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Integer(*size)],
        ));
        ops.push(Operation::new("Tm", vec![
            Object::Integer(1),
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(1),
            Object::Integer(72),
            Object::Integer(y),
        ]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        y -= size * 2;
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

fn add_text_page(
    doc: &mut Document,
    parent: ObjectId,
    resources: ObjectId,
    lines: &[(&str, i64)],
) -> Result<ObjectId, PreviewError> {
    let content = Content {
        operations: text_operations(lines),
    };
    let encoded = content
        .encode()
        .map_err(|e| PreviewError::Serialize(e.to_string()))?;
    let contents = doc.add_object(Stream::new(dictionary! {}, encoded));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "MediaBox" => media_box(),
        "Resources" => resources,
        "Contents" => contents,
    }))
}

/// Append the sentinel page as the last kid of the page tree root.
pub(crate) fn append_sentinel_page(
    doc: &mut Document,
    pages_id: ObjectId,
) -> Result<ObjectId, PreviewError> {
    let resources = font_resources(doc);
    let page_id = add_text_page(
        doc,
        pages_id,
        resources,
        &[(SENTINEL_TEXT, 28), (SENTINEL_SUBTITLE, 12)],
    )?;

    let pages = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    match pages.get_mut(b"Kids") {
        Ok(kids) => {
            kids.as_array_mut()?.push(Object::Reference(page_id));
        }
        Err(_) => {
            pages.set("Kids", vec![Object::Reference(page_id)]);
        }
    }
    let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    pages.set("Count", count + 1);
    Ok(page_id)
}

/// Build a PDF with one page per entry of `pages`, each showing its text.
///
/// An empty slice produces a valid document with no pages.
pub fn text_pdf(pages: &[&str]) -> Result<Vec<u8>, PreviewError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources = font_resources(&mut doc);

    let mut kids = Vec::with_capacity(pages.len());
    for text in pages {
        let page = add_text_page(&mut doc, pages_id, resources, &[(text, 18)])?;
        kids.push(Object::Reference(page));
    }
    let count = i64::try_from(kids.len())
        .map_err(|_| PreviewError::Serialize("too many pages".into()))?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PreviewError::Serialize(e.to_string()))?;
    Ok(out)
}
