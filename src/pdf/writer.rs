//! The object table and file structure: allocates object numbers, records
//! byte offsets at emission, and produces the final xref table and trailer.
//!
//! Grounded on `victor::pdf::file_structure::PdfFile` (streaming
//! `CountingWriter`, `assign_object_id`/`write_object` split so forward
//! references work) merged with `victor::pdf::syntax::PdfFile` (the
//! buffer-per-object table that makes recomputing offsets after
//! compression trivial). We buffer each object's serialized bytes — the
//! assembler already buffers content streams per page to track glyph/image
//! usage (§4.8 step 2), so nothing is lost by buffering the rest too, and
//! it lets `add_stream` compress inline rather than needing a second pass.

use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::object::{Dict, Object};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    pub fn number(self) -> u32 {
        self.0
    }
}

pub struct ObjectTable {
    compress: bool,
    /// Serialized `"N 0 obj\n...\nendobj\n"` bytes, indexed by `id.0 - 1`.
    objects: Vec<Vec<u8>>,
}

impl ObjectTable {
    pub fn new(compress: bool) -> Self {
        ObjectTable {
            compress,
            objects: Vec::new(),
        }
    }

    /// Reserve an object number without writing content yet, so later
    /// objects can reference it before it exists (e.g. a page referencing
    /// its own not-yet-built page tree parent).
    pub fn reserve(&mut self) -> ObjectId {
        self.objects.push(Vec::new());
        ObjectId(self.objects.len() as u32)
    }

    pub fn add_dictionary(&mut self, dict: Dict) -> ObjectId {
        let id = self.reserve();
        self.fill_dictionary(id, dict);
        id
    }

    /// Fill in an object number reserved earlier with `reserve`.
    pub fn fill_dictionary(&mut self, id: ObjectId, dict: Dict) {
        let mut body = Vec::new();
        dict.write(&mut body).expect("writing to Vec is infallible");
        self.objects[(id.0 - 1) as usize] = wrap(id, &body);
    }

    /// Add a stream object. `extra` entries (e.g. `/Subtype /Form`) are
    /// merged into the stream dictionary alongside `/Length` and, when
    /// compression is enabled, `/Filter /FlateDecode`.
    pub fn add_stream(&mut self, extra: Dict, content: &[u8]) -> ObjectId {
        let id = self.reserve();
        self.fill_stream(id, extra, content);
        id
    }

    /// Add a stream whose bytes are already in their final on-disk
    /// encoding (JPEG image data) and must not be Flate-compressed on top
    /// regardless of the table's `compress` setting — `extra` already
    /// names the filter that applies to `content` (e.g. `/DCTDecode`).
    pub fn add_raw_stream(&mut self, extra: Dict, content: &[u8]) -> ObjectId {
        let id = self.reserve();
        let dict = extra.set("Length", content.len());
        let mut body = Vec::new();
        dict.write(&mut body).expect("writing to Vec is infallible");
        body.extend_from_slice(b"\nstream\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\nendstream");
        self.objects[(id.0 - 1) as usize] = wrap(id, &body);
        id
    }

    pub fn fill_stream(&mut self, id: ObjectId, extra: Dict, content: &[u8]) {
        let (dict, payload) = if self.compress {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(content)
                .expect("writing to Vec is infallible");
            let compressed = encoder.finish().expect("zlib encoding is infallible");
            (
                extra.set("Filter", "FlateDecode").set("Length", compressed.len()),
                compressed,
            )
        } else {
            (extra.set("Length", content.len()), content.to_vec())
        };

        let mut body = Vec::new();
        dict.write(&mut body).expect("writing to Vec is infallible");
        body.extend_from_slice(b"\nstream\n");
        body.extend_from_slice(&payload);
        body.extend_from_slice(b"\nendstream");
        self.objects[(id.0 - 1) as usize] = wrap(id, &body);
    }

    /// Write the full PDF: header, every object, xref table, trailer.
    pub fn finish<W: Write>(
        &self,
        w: &mut W,
        root: ObjectId,
        info: Option<ObjectId>,
    ) -> io::Result<()> {
        let mut offsets = Vec::with_capacity(self.objects.len());

        let mut out = CountingWriter { inner: w, position: 0 };
        out.write_all(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n")?;
        let mut position = out.position;

        for object in &self.objects {
            offsets.push(position as u64);
            out.write_all(object)?;
            position = out.position;
        }

        let startxref = position;
        let size = self.objects.len() + 1;
        write!(out, "xref\n0 {}\n", size)?;
        out.write_all(b"0000000000 65535 f \n")?;
        for offset in &offsets {
            write!(out, "{:010} 00000 n \n", offset)?;
        }

        let mut trailer = Dict::new().set("Size", size).set("Root", root);
        if let Some(info) = info {
            trailer = trailer.set("Info", info);
        }
        out.write_all(b"trailer\n")?;
        trailer.write(&mut out)?;
        write!(out, "\nstartxref\n{}\n%%EOF", startxref)?;
        Ok(())
    }
}

/// Wraps an object's serialized dictionary/stream body in the
/// `"N 0 obj\n...\nendobj\n"` indirect-object envelope (§4.1, §6).
fn wrap(id: ObjectId, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 32);
    write!(out, "{} 0 obj\n", id.0).unwrap();
    out.extend_from_slice(body);
    out.extend_from_slice(b"\nendobj\n");
    out
}

struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    position: usize,
}

impl<'a, W: Write> Write for CountingWriter<'a, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n;
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.position += buf.len();
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Convenience for building a `Dict` and handing it straight to
/// `Object::from`, used where a nested dictionary is built inline.
pub(crate) fn obj(dict: Dict) -> Object {
    Object::Dictionary(dict)
}
