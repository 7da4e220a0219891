// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory PDF builders for tests and benchmarks.
//
// Available to this crate's tests and, through the `fixtures` feature, to
// downstream crates' dev-dependencies. Panics on failure: these only ever run
// under test.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Width of the synthetic scan images.
pub const SCAN_WIDTH: u32 = 16;
/// Height of the synthetic scan images.
pub const SCAN_HEIGHT: u32 = 8;

/// A digital PDF with one page per entry, each page showing its text in Helvetica.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let page_id = add_page(
            &mut doc,
            pages_id,
            content,
            Some(dictionary! { "Font" => dictionary! { "F1" => font_id } }),
        );
        kids.push(Object::Reference(page_id));
    }

    finish(doc, pages_id, kids, None)
}

/// An image-only PDF with `pages` pages, each painting one raw 8-bit gray
/// image. Resources live on the page tree root so pages inherit them.
pub fn scanned_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let pixels = GrayImage::from_fn(SCAN_WIDTH, SCAN_HEIGHT, |x, _| {
        Luma([if x % 2 == 0 { 0 } else { 255 }])
    })
    .into_raw();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => SCAN_WIDTH as i64,
            "Height" => SCAN_HEIGHT as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        pixels,
    ));

    let kids = (0..pages)
        .map(|_| Object::Reference(add_page(&mut doc, pages_id, paint_image(), None)))
        .collect();

    finish(
        doc,
        pages_id,
        kids,
        Some(dictionary! { "XObject" => dictionary! { "Im1" => image_id } }),
    )
}

/// A one-page image-only PDF whose image is JPEG (DCTDecode) encoded.
pub fn jpeg_scanned_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let gray = GrayImage::from_pixel(SCAN_WIDTH, SCAN_HEIGHT, Luma([200]));
    let mut jpeg = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut jpeg, ImageFormat::Jpeg)
        .expect("encode fixture JPEG");

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => SCAN_WIDTH as i64,
            "Height" => SCAN_HEIGHT as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg.into_inner(),
    ));

    let page_id = add_page(
        &mut doc,
        pages_id,
        paint_image(),
        Some(dictionary! { "XObject" => dictionary! { "Im1" => image_id } }),
    );

    finish(doc, pages_id, vec![Object::Reference(page_id)], None)
}

/// A one-page PDF whose only image claims `u32::MAX` x `u32::MAX` RGB pixels
/// backed by a few bytes of samples.
pub fn oversized_image_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(u32::MAX),
            "Height" => i64::from(u32::MAX),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        vec![0; 48],
    ));

    let page_id = add_page(
        &mut doc,
        pages_id,
        paint_image(),
        Some(dictionary! { "XObject" => dictionary! { "Im1" => image_id } }),
    );

    finish(doc, pages_id, vec![Object::Reference(page_id)], None)
}

/// A one-page scan carrying a short text layer as well, like a scanner that
/// stamps a caption onto the page.
pub fn captioned_scan_pdf(caption: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let pixels = GrayImage::from_pixel(SCAN_WIDTH, SCAN_HEIGHT, Luma([128])).into_raw();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => SCAN_WIDTH as i64,
            "Height" => SCAN_HEIGHT as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        pixels,
    ));

    let mut content = paint_image();
    content.operations.extend([
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 8.into()]),
        Operation::new("Td", vec![72.into(), 40.into()]),
        Operation::new("Tj", vec![Object::string_literal(caption)]),
        Operation::new("ET", vec![]),
    ]);
    let page_id = add_page(
        &mut doc,
        pages_id,
        content,
        Some(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => dictionary! { "Im1" => image_id },
        }),
    );

    finish(doc, pages_id, vec![Object::Reference(page_id)], None)
}

fn paint_image() -> Content {
    Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![500.into(), 0.into(), 0.into(), 250.into(), 50.into(), 400.into()],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    }
}

fn add_page(doc: &mut Document, pages_id: ObjectId, content: Content, resources: Option<Dictionary>) -> ObjectId {
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.encode().expect("encode fixture content"),
    ));
    let mut page = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    };
    if let Some(resources) = resources {
        page.set("Resources", resources);
    }
    doc.add_object(page)
}

fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<Object>, resources: Option<Dictionary>) -> Vec<u8> {
    let count = kids.len() as i64;
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    if let Some(resources) = resources {
        pages.set("Resources", resources);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialise fixture PDF");
    bytes
}
