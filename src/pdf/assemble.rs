//! Document assembly (§4.8, §9): resolves resources, emits each page's
//! content stream while glyph/image/ExtGState usage accrues, finalizes
//! font subsets, and emits the object graph, xref and trailer.
//!
//! Grounded on `victor::pdf::convert::InProgressDoc::write` (the
//! catalog/page-tree/info shape and the `Resources` dict built from the
//! accumulated font/ExtGState tables) generalized to also finalize image
//! XObjects and to scope each page's `/Resources` down to only the
//! aliases that page's own content actually used, rather than the
//! teacher's single document-wide resource dictionary shared by every
//! page — needed once pages stop sharing one global font set.

use std::collections::{BTreeSet, HashMap};

use crate::error::Result;
use crate::font::{self, LoadedFont};
use crate::image::{self, LoadedImage};
use crate::model::{Document, Metadata, Page, RenderOptions, Resources, ResourceSource};

use super::content::{self, GraphicsStateCache, PageContent};
use super::object::{dict, Dict, Object};
use super::writer::{ObjectId, ObjectTable};

pub fn render(document: &Document, options: &RenderOptions) -> Result<Vec<u8>> {
    log::debug!(
        "rendering {} page(s), {} font(s), {} image(s), compress={}",
        document.pages.len(),
        document.resources.fonts.len(),
        document.resources.images.len(),
        options.compress
    );

    for (index, page) in document.pages.iter().enumerate() {
        validate_page(index, page)?;
    }

    let fonts = load_fonts(&document.resources)?;
    let images = load_images(&document.resources)?;

    let mut gs_cache = GraphicsStateCache::new();
    let page_contents: Vec<PageContent> = document
        .pages
        .iter()
        .map(|page| content::emit_page(page, &fonts, &images, &mut gs_cache))
        .collect::<Result<_>>()?;

    let mut font_used = BTreeSet::new();
    let mut image_used = BTreeSet::new();
    for page_content in &page_contents {
        font_used.extend(page_content.fonts_used.iter().cloned());
        image_used.extend(page_content.images_used.iter().cloned());
    }

    let mut objects = ObjectTable::new(options.compress);

    let mut font_objects: HashMap<String, ObjectId> = HashMap::new();
    for alias in &font_used {
        let embedded = font::cid::embed(&mut objects, &fonts[alias])?;
        font_objects.insert(alias.clone(), embedded);
    }

    let mut image_objects: HashMap<String, ObjectId> = HashMap::new();
    for alias in &image_used {
        let id = match &images[alias] {
            LoadedImage::Raster(raster) => embed_raster(&mut objects, raster),
            LoadedImage::Vector(vector) => embed_vector(&mut objects, vector),
        };
        image_objects.insert(alias.clone(), id);
    }

    let mut gs_objects: HashMap<String, ObjectId> = HashMap::new();
    for (stroke_alpha, fill_alpha, name) in gs_cache.entries() {
        let ca = stroke_alpha.map(|a| a as f32 / 255.0).unwrap_or(1.0);
        let ca_fill = fill_alpha.map(|a| a as f32 / 255.0).unwrap_or(1.0);
        let id = objects.add_dictionary(dict! {
            "Type" => "ExtGState",
            "CA" => ca,
            "ca" => ca_fill,
        });
        gs_objects.insert(name.clone(), id);
    }

    let page_tree_id = objects.reserve();
    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(document.pages.len());
    for (page, page_content) in document.pages.iter().zip(page_contents.iter()) {
        let content_id = objects.add_stream(dict! {}, &page_content.bytes);

        let mut font_dict = Dict::new();
        for alias in &page_content.fonts_used {
            font_dict = font_dict.set(alias, font_objects[alias]);
        }
        let mut xobject_dict = Dict::new();
        for alias in &page_content.images_used {
            xobject_dict = xobject_dict.set(alias, image_objects[alias]);
        }
        let mut extgstate_dict = Dict::new();
        for name in &page_content.gs_used {
            extgstate_dict = extgstate_dict.set(name, gs_objects[name]);
        }

        let page_id = objects.add_dictionary(dict! {
            "Type" => "Page",
            "Parent" => page_tree_id,
            "MediaBox" => vec![0.0f32, 0.0, page.width, page.height],
            "Resources" => dict! {
                "Font" => font_dict,
                "XObject" => xobject_dict,
                "ExtGState" => extgstate_dict,
            },
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let page_count = page_ids.len();
    objects.fill_dictionary(
        page_tree_id,
        dict! {
            "Type" => "Pages",
            "Count" => page_count,
            "Kids" => page_ids,
        },
    );

    let catalog_id = objects.add_dictionary(dict! {
        "Type" => "Catalog",
        "Pages" => page_tree_id,
    });

    let info_id = build_info(&mut objects, &document.metadata);

    let mut output = Vec::new();
    objects.finish(&mut output, catalog_id, info_id)?;
    log::debug!("rendered {} bytes", output.len());
    Ok(output)
}

fn validate_page(index: usize, page: &Page) -> Result<()> {
    if !page.width.is_finite() || !page.height.is_finite() || page.width <= 0.0 || page.height <= 0.0 {
        return Err(crate::error::Error::InvalidPageSize {
            index,
            width: page.width,
            height: page.height,
        });
    }
    Ok(())
}

fn read_source(source: &ResourceSource) -> Result<Vec<u8>> {
    match source {
        ResourceSource::Path(path) => Ok(std::fs::read(path)?),
        ResourceSource::Bytes(bytes) => Ok(bytes.clone()),
    }
}

fn load_fonts(resources: &Resources) -> Result<HashMap<String, LoadedFont>> {
    resources
        .fonts
        .iter()
        .map(|(alias, resource)| {
            let bytes = read_source(&resource.source)?;
            Ok((alias.clone(), LoadedFont::parse(alias, bytes)?))
        })
        .collect()
}

fn load_images(resources: &Resources) -> Result<HashMap<String, LoadedImage>> {
    resources
        .images
        .iter()
        .map(|(alias, resource)| {
            let bytes = read_source(&resource.source)?;
            Ok((alias.clone(), image::load(alias, &bytes)?))
        })
        .collect()
}

fn embed_raster(objects: &mut ObjectTable, raster: &crate::image::raster::RasterImage) -> ObjectId {
    objects.add_raw_stream(
        dict! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => raster.width as i64,
            "Height" => raster.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        },
        &raster.jpeg_bytes,
    )
}

fn embed_vector(objects: &mut ObjectTable, vector: &crate::image::svg::VectorImage) -> ObjectId {
    // The Form's content stream is written in the SVG's own native pixel
    // space (`svg.rs` never normalizes it), so `/BBox` matches that space
    // exactly. Without a `/Matrix` entry a Form's space is NOT implicitly
    // treated as a unit square the way an Image XObject's pixel grid is —
    // a `[w 0 0 h x y] cm` before `Do` would scale by `w`/`h` on top of
    // the BBox's own native units. `/Matrix` normalizes form space to a
    // unit square first, so that later scaling produces the intended
    // on-page footprint.
    let scale_x = if vector.width > 0.0 { 1.0 / vector.width } else { 1.0 };
    let scale_y = if vector.height > 0.0 { 1.0 / vector.height } else { 1.0 };
    objects.add_stream(
        dict! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1i64,
            "BBox" => vec![0.0f32, 0.0, vector.width, vector.height],
            "Matrix" => vec![scale_x, 0.0, 0.0, scale_y, 0.0, 0.0],
        },
        &vector.content,
    )
}

fn build_info(objects: &mut ObjectTable, metadata: &Metadata) -> Option<ObjectId> {
    let mut dict = Dict::new();
    let mut set = |dict: &mut Dict, key: &str, value: &Option<String>| {
        if let Some(value) = value {
            *dict = std::mem::take(dict).set(key, Object::text_string(value));
        }
    };
    set(&mut dict, "Title", &metadata.title);
    set(&mut dict, "Author", &metadata.author);
    set(&mut dict, "Subject", &metadata.subject);
    set(&mut dict, "Creator", &metadata.creator);
    set(&mut dict, "Producer", &metadata.producer);
    set(&mut dict, "CreationDate", &metadata.creation_date);

    if dict.0.is_empty() {
        None
    } else {
        Some(objects.add_dictionary(dict))
    }
}
