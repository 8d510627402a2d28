//! Hand-rolled Code-128 and QR generators (§4.6, §4.7). Neither has a
//! usable crate anywhere in this crate's dependency stack — barcode and
//! QR generation are niche enough that no example project in the
//! retrieval pack pulls one in either — so both are implemented directly
//! against the published symbologies instead.

pub mod code128;
pub mod qr;
