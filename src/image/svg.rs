//! Vector image parsing (§4.5): walks a parsed SVG tree and hand-emits
//! PDF path operators into a Form XObject content stream. Scope is
//! deliberately narrow — flat, solid-color fills and strokes on `<path>`
//! geometry (quadratic curves elevated to cubic for PDF's `c` operator).
//! Gradients, patterns, nested raster/text content and clip paths are not
//! walked; see `DESIGN.md`. No crate in the corpus renders *to* PDF
//! operators (that's this crate's own job), so this part is grounded only
//! in `usvg`'s tree shape, not in a teacher pattern for the walk itself.

use usvg::{Node, Options, Paint, Tree};

use crate::error::{Error, Result};
use crate::pdf::object::write_number;

pub struct VectorImage {
    pub width: f32,
    pub height: f32,
    pub content: Vec<u8>,
}

pub fn parse(alias: &str, bytes: &[u8]) -> Result<VectorImage> {
    let tree = Tree::from_data(bytes, &Options::default()).map_err(|err| Error::ImageDecode {
        alias: alias.to_string(),
        message: err.to_string(),
    })?;
    let size = tree.size();
    let mut content = Vec::new();
    write_group(tree.root(), &mut content);
    Ok(VectorImage {
        width: size.width(),
        height: size.height(),
        content,
    })
}

fn write_group(group: &usvg::Group, out: &mut Vec<u8>) {
    for node in group.children() {
        match node {
            Node::Group(child) => write_group(child, out),
            Node::Path(path) => write_path(path, out),
            // Raster images and text nested inside an SVG aren't walked;
            // this crate's own raster/text pipelines are a separate path.
            Node::Image(_) | Node::Text(_) => {}
        }
    }
}

fn write_path(path: &usvg::Path, out: &mut Vec<u8>) {
    if !path.is_visible() {
        return;
    }
    let fill = path.fill();
    let stroke = path.stroke();
    if fill.is_none() && stroke.is_none() {
        return;
    }

    out.extend_from_slice(b"q\n");
    emit_cm(&path.abs_transform(), out);

    let mut current = (0.0f32, 0.0f32);
    for segment in path.data().segments() {
        match segment {
            tiny_skia_path::PathSegment::MoveTo(p) => {
                emit_xy(out, p.x, p.y, b"m");
                current = (p.x, p.y);
            }
            tiny_skia_path::PathSegment::LineTo(p) => {
                emit_xy(out, p.x, p.y, b"l");
                current = (p.x, p.y);
            }
            tiny_skia_path::PathSegment::QuadTo(c, p) => {
                let c1 = (current.0 + 2.0 / 3.0 * (c.x - current.0), current.1 + 2.0 / 3.0 * (c.y - current.1));
                let c2 = (p.x + 2.0 / 3.0 * (c.x - p.x), p.y + 2.0 / 3.0 * (c.y - p.y));
                emit_curve(out, c1, c2, (p.x, p.y));
                current = (p.x, p.y);
            }
            tiny_skia_path::PathSegment::CubicTo(c1, c2, p) => {
                emit_curve(out, (c1.x, c1.y), (c2.x, c2.y), (p.x, p.y));
                current = (p.x, p.y);
            }
            tiny_skia_path::PathSegment::Close => out.extend_from_slice(b"h\n"),
        }
    }

    if let Some(fill) = fill {
        if let Paint::Color(color) = fill.paint() {
            emit_color(out, color, false);
        }
    }
    if let Some(stroke) = stroke {
        if let Paint::Color(color) = stroke.paint() {
            emit_color(out, color, true);
        }
        write_number(stroke.width().get(), out).ok();
        out.extend_from_slice(b" w\n");
    }

    let op: &[u8] = match (fill.is_some(), stroke.is_some()) {
        (true, true) => b"B\n",
        (true, false) => b"f\n",
        (false, true) => b"S\n",
        (false, false) => b"n\n",
    };
    out.extend_from_slice(op);
    out.extend_from_slice(b"Q\n");
}

fn emit_xy(out: &mut Vec<u8>, x: f32, y: f32, op: &[u8]) {
    write_number(x, out).ok();
    out.push(b' ');
    write_number(y, out).ok();
    out.push(b' ');
    out.extend_from_slice(op);
    out.push(b'\n');
}

fn emit_curve(out: &mut Vec<u8>, c1: (f32, f32), c2: (f32, f32), end: (f32, f32)) {
    for &(x, y) in &[c1, c2, end] {
        write_number(x, out).ok();
        out.push(b' ');
        write_number(y, out).ok();
        out.push(b' ');
    }
    out.extend_from_slice(b"c\n");
}

fn emit_cm(transform: &usvg::Transform, out: &mut Vec<u8>) {
    for value in [transform.sx, transform.ky, transform.kx, transform.sy, transform.tx, transform.ty] {
        write_number(value, out).ok();
        out.push(b' ');
    }
    out.extend_from_slice(b"cm\n");
}

fn emit_color(out: &mut Vec<u8>, color: &usvg::Color, stroke: bool) {
    write_number(color.red as f32 / 255.0, out).ok();
    out.push(b' ');
    write_number(color.green as f32 / 255.0, out).ok();
    out.push(b' ');
    write_number(color.blue as f32 / 255.0, out).ok();
    out.push(b' ');
    out.extend_from_slice(if stroke { b"RG\n" } else { b"rg\n" });
}
