use thiserror::Error;

/// The single error kind returned by [`crate::render`].
///
/// Every variant carries enough context to explain *what* failed without a
/// caller needing to inspect the document again. There is no retry path:
/// the first error aborts rendering (see the crate's error handling design).
///
/// This covers every condition `render` itself can detect against an
/// already-typed [`crate::model::Document`]. A host binding that builds
/// that document from an untyped source (JSON, a dict, ...) has its own
/// validation layer above this one — missing fields, unknown element
/// kinds, and "set exactly one of path/bytes" are that layer's job, not
/// representable here once a `Document` already exists (see `DESIGN.md`).
#[derive(Debug, Error)]
pub enum Error {
    #[error("page {index}: page size must be finite and strictly positive, got ({width}, {height})")]
    InvalidPageSize {
        index: usize,
        width: f32,
        height: f32,
    },

    #[error("unresolved font reference {alias:?}")]
    UnresolvedFont { alias: String },

    #[error("unresolved image reference {alias:?}")]
    UnresolvedImage { alias: String },

    #[error("font {alias:?}: failed to parse: {message}")]
    FontParse { alias: String, message: String },

    #[error("font {alias:?}: unsupported font flavor (only TrueType/OpenType with glyf or CFF outlines are supported)")]
    UnsupportedFontFlavor { alias: String },

    #[error("image {alias:?}: failed to decode: {message}")]
    ImageDecode { alias: String, message: String },

    #[error("image {alias:?}: unknown image format (expected SVG, PNG, JPEG or WebP)")]
    UnknownImageFormat { alias: String },

    #[error("invalid color {component_name} component {value}: must be 0..=255")]
    InvalidColor {
        component_name: &'static str,
        value: i64,
    },

    #[error("barcode128 element requires `font` when `human_readable` is set")]
    BarcodeMissingFont,

    #[error("qrcode value is empty")]
    EmptyQrValue,

    #[error("qrcode value is {actual_bytes} bytes, too long for any supported quartile-EC symbol version ({max_bytes} bytes max)")]
    QrValueTooLong {
        max_bytes: usize,
        actual_bytes: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
