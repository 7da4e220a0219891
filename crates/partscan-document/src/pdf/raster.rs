// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization for scanned documents.
//
// A scanned PDF page is a content stream that paints one or more image
// XObjects. Rather than interpreting the whole page description, we decode the
// images the page references and hand those bitmaps to OCR. Image-less pages
// (or pages whose images use an encoding we cannot decode) yield no bitmaps.
//
// Supported encodings:
//   - DCTDecode (baseline/progressive JPEG, via the `image` crate)
//   - raw samples, uncompressed or FlateDecode/LZWDecode, at 8 bits per
//     component (Gray, RGB, CMYK, ICC-based) or 1 bit per component (Gray)

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use partscan_core::error::PartscanError;
use tracing::{debug, instrument};

use crate::pdf::reader::PdfReader;

/// Decode every image painted by `page_number` (1-indexed), in resource order.
#[instrument(skip(reader))]
pub fn page_images(reader: &PdfReader, page_number: u32) -> Result<Vec<DynamicImage>, PartscanError> {
    let doc = reader.document();
    let page_id = reader.page_id(page_number)?;

    let Some(resources) = page_resources(doc, page_id)? else {
        debug!("page has no resources");
        return Ok(Vec::new());
    };

    let xobjects = match resources.get(b"XObject") {
        Ok(obj) => resolve(doc, obj)?.as_dict().map_err(|err| {
            PartscanError::PdfError(format!("/XObject is not a dictionary: {}", err))
        })?,
        Err(_) => return Ok(Vec::new()),
    };

    let mut images = Vec::new();
    for (name, obj) in xobjects.iter() {
        let Ok(stream) = resolve(doc, obj)?.as_stream() else {
            continue;
        };
        if name_of(stream.dict.get(b"Subtype").ok()) != Some("Image") {
            continue;
        }
        match decode_image(doc, stream) {
            Ok(Some(image)) => images.push(image),
            Ok(None) => {
                debug!(xobject = %String::from_utf8_lossy(name), "image encoding not supported, skipped");
            }
            Err(err) => {
                debug!(xobject = %String::from_utf8_lossy(name), %err, "image could not be decoded, skipped");
            }
        }
    }

    debug!(count = images.len(), "page images decoded");
    Ok(images)
}

/// Find the `/Resources` dictionary of a page, following `/Parent` for
/// inherited resources.
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Option<&Dictionary>, PartscanError> {
    let mut node = Some(page_id);
    // Page trees are shallow; the bound guards against /Parent cycles.
    for _ in 0..64 {
        let Some(id) = node else {
            return Ok(None);
        };
        let dict = doc.get_dictionary(id).map_err(|err| {
            PartscanError::PdfError(format!("cannot read page tree node {:?}: {}", id, err))
        })?;
        if let Ok(resources) = dict.get(b"Resources") {
            let resources = resolve(doc, resources)?.as_dict().map_err(|err| {
                PartscanError::PdfError(format!("/Resources is not a dictionary: {}", err))
            })?;
            return Ok(Some(resources));
        }
        node = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(None)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, PartscanError> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).map_err(|err| {
            PartscanError::PdfError(format!("cannot resolve reference {:?}: {}", id, err))
        }),
        other => Ok(other),
    }
}

fn name_of(obj: Option<&Object>) -> Option<&str> {
    obj.and_then(|o| o.as_name().ok())
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
}

/// Filter names applied to a stream, outermost first.
fn filters(doc: &Document, dict: &Dictionary) -> Result<Vec<String>, PartscanError> {
    let Ok(filter) = dict.get(b"Filter") else {
        return Ok(Vec::new());
    };
    let names = match resolve(doc, filter)? {
        Object::Array(items) => items
            .iter()
            .filter_map(|item| name_of(Some(item)).map(str::to_owned))
            .collect(),
        single => name_of(Some(single)).map(str::to_owned).into_iter().collect(),
    };
    Ok(names)
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32, PartscanError> {
    dict.get(key)
        .and_then(Object::as_i64)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            PartscanError::ImageError(format!(
                "image has no valid /{}",
                String::from_utf8_lossy(key)
            ))
        })
}

/// Decode one image XObject. `Ok(None)` means the encoding is not supported.
fn decode_image(doc: &Document, stream: &Stream) -> Result<Option<DynamicImage>, PartscanError> {
    let dict = &stream.dict;

    // Stencil masks carry no page content of their own.
    if dict.get(b"ImageMask").and_then(Object::as_bool).unwrap_or(false) {
        return Ok(None);
    }

    let filters = filters(doc, dict)?;
    match filters.last().map(String::as_str) {
        Some("DCTDecode") if filters.len() == 1 => {
            let image = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|err| PartscanError::ImageError(format!("JPEG decode failed: {}", err)))?;
            Ok(Some(image))
        }
        Some("DCTDecode" | "JPXDecode" | "CCITTFaxDecode" | "JBIG2Decode" | "RunLengthDecode") => {
            Ok(None)
        }
        _ => {
            let samples = if filters.is_empty() {
                stream.content.clone()
            } else {
                stream.decompressed_content().map_err(|err| {
                    PartscanError::ImageError(format!("stream decompression failed: {}", err))
                })?
            };
            decode_samples(doc, dict, samples)
        }
    }
}

/// Colour components per sample for the supported colour spaces.
fn color_components(doc: &Document, dict: &Dictionary) -> Result<Option<u8>, PartscanError> {
    let Ok(space) = dict.get(b"ColorSpace") else {
        return Ok(None);
    };
    let components = match resolve(doc, space)? {
        Object::Array(items) => match name_of(items.first()) {
            Some("CalGray") => Some(1),
            Some("CalRGB") | Some("Lab") => Some(3),
            Some("ICCBased") => {
                let profile = match items.get(1) {
                    Some(obj) => resolve(doc, obj)?.as_stream().ok(),
                    None => None,
                };
                profile
                    .and_then(|s| s.dict.get(b"N").and_then(Object::as_i64).ok())
                    .and_then(|n| u8::try_from(n).ok())
            }
            _ => None,
        },
        other => match name_of(Some(other)) {
            Some("DeviceGray") | Some("G") => Some(1),
            Some("DeviceRGB") | Some("RGB") => Some(3),
            Some("DeviceCMYK") | Some("CMYK") => Some(4),
            _ => None,
        },
    };
    Ok(components)
}

fn decode_samples(
    doc: &Document,
    dict: &Dictionary,
    samples: Vec<u8>,
) -> Result<Option<DynamicImage>, PartscanError> {
    let width = dimension(dict, b"Width")?;
    let height = dimension(dict, b"Height")?;
    let bits = dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8);
    let (w, h) = (width as usize, height as usize);

    let image = match (color_components(doc, dict)?, bits) {
        (Some(1), 8) => {
            GrayImage::from_raw(width, height, truncated(samples, sample_len(w, h, 1)?)?)
                .map(DynamicImage::ImageLuma8)
        }
        (Some(3), 8) => {
            RgbImage::from_raw(width, height, truncated(samples, sample_len(w, h, 3)?)?)
                .map(DynamicImage::ImageRgb8)
        }
        (Some(4), 8) => {
            let cmyk = truncated(samples, sample_len(w, h, 4)?)?;
            RgbImage::from_raw(width, height, cmyk_to_rgb(&cmyk)).map(DynamicImage::ImageRgb8)
        }
        (Some(1), 1) => GrayImage::from_raw(width, height, unpack_bits(&samples, w, h)?)
            .map(DynamicImage::ImageLuma8),
        _ => return Ok(None),
    };

    image.map(Some).ok_or_else(|| {
        PartscanError::ImageError(format!("sample buffer does not fit {}x{}", width, height))
    })
}

/// Byte length of a `width` x `height` image with `channels` bytes per pixel.
fn sample_len(width: usize, height: usize, channels: usize) -> Result<usize, PartscanError> {
    width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(channels))
        .ok_or_else(|| {
            PartscanError::ImageError(format!("image of {}x{} is too large", width, height))
        })
}

fn truncated(mut samples: Vec<u8>, expected: usize) -> Result<Vec<u8>, PartscanError> {
    if samples.len() < expected {
        return Err(PartscanError::ImageError(format!(
            "expected {} sample bytes, stream has {}",
            expected,
            samples.len()
        )));
    }
    samples.truncate(expected);
    Ok(samples)
}

fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(cmyk.len() / 4 * 3);
    for px in cmyk.chunks_exact(4) {
        let k = 255 - u16::from(px[3]);
        for channel in &px[..3] {
            rgb.push(((255 - u16::from(*channel)) * k / 255) as u8);
        }
    }
    rgb
}

/// Expand 1-bit rows (padded to whole bytes) into 8-bit gray, 0 = black.
fn unpack_bits(packed: &[u8], width: usize, height: usize) -> Result<Vec<u8>, PartscanError> {
    let row_bytes = width.div_ceil(8);
    let expected = sample_len(row_bytes, height, 1)?;
    if packed.len() < expected {
        return Err(PartscanError::ImageError(format!(
            "expected {} bytes of 1-bit samples, stream has {}",
            expected,
            packed.len()
        )));
    }
    let mut out = Vec::with_capacity(sample_len(width, height, 1)?);
    for row in packed.chunks_exact(row_bytes).take(height) {
        for x in 0..width {
            let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
            out.push(if bit == 1 { 255 } else { 0 });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use lopdf::dictionary;

    #[test]
    fn decodes_raw_gray_page_images() {
        let bytes = fixtures::scanned_pdf(2);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        for page_number in reader.page_numbers() {
            let images = page_images(&reader, page_number).unwrap();
            assert_eq!(images.len(), 1);
            assert_eq!(images[0].width(), fixtures::SCAN_WIDTH);
            assert_eq!(images[0].height(), fixtures::SCAN_HEIGHT);
        }
    }

    #[test]
    fn decodes_jpeg_page_images() {
        let bytes = fixtures::jpeg_scanned_pdf();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let images = page_images(&reader, 1).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].width(), fixtures::SCAN_WIDTH);
    }

    #[test]
    fn text_page_has_no_images() {
        let bytes = fixtures::text_pdf(&["just text"]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert!(page_images(&reader, 1).unwrap().is_empty());
    }

    #[test]
    fn unpack_bits_handles_row_padding() {
        // 3 pixels wide: each row occupies one byte, low bits are padding.
        let packed = [0b1010_0000, 0b0100_0000];
        let out = unpack_bits(&packed, 3, 2).unwrap();
        assert_eq!(out, vec![255, 0, 255, 0, 255, 0]);
    }

    #[test]
    fn unpack_bits_rejects_short_stream() {
        assert!(unpack_bits(&[0xFF], 16, 1).is_err());
    }

    #[test]
    fn unpack_bits_rejects_overflowing_dimensions() {
        assert!(matches!(
            unpack_bits(&[0xFF], usize::MAX, 16),
            Err(PartscanError::ImageError(_))
        ));
    }

    #[test]
    fn oversized_dimensions_are_an_error() {
        let doc = Document::with_version("1.5");
        for space in ["DeviceRGB", "DeviceCMYK"] {
            let dict = lopdf::dictionary! {
                "Width" => i64::from(u32::MAX),
                "Height" => i64::from(u32::MAX),
                "ColorSpace" => space,
                "BitsPerComponent" => 8,
            };
            let result = decode_samples(&doc, &dict, vec![0; 64]);
            assert!(matches!(result, Err(PartscanError::ImageError(_))), "{space}");
        }
    }

    #[test]
    fn oversized_page_image_does_not_panic() {
        let bytes = fixtures::oversized_image_pdf();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert!(page_images(&reader, 1).unwrap().is_empty());
    }

    #[test]
    fn cmyk_black_and_white() {
        let rgb = cmyk_to_rgb(&[0, 0, 0, 0, 0, 0, 0, 255]);
        assert_eq!(rgb, vec![255, 255, 255, 0, 0, 0]);
    }
}
