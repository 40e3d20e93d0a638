//! Decoding of the `CompressedEntityXml` payload.

use archive::{decode_text, extract_first_entry, ZipPackage};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::error::{RibbonError, RibbonResult};

const PAYLOAD_LABEL: &str = "CompressedEntityXml";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Decode a base64 ribbon payload into XML text.
///
/// The payload is normally a zip archive holding a single XML entry. A
/// payload that is not a zip archive is taken to be the XML itself.
pub fn decode_ribbon_payload(encoded: &str) -> RibbonResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(RibbonError::InvalidPayload("payload is empty".to_string()));
    }

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| RibbonError::InvalidPayload(format!("base64 decode failed: {}", e)))?;

    if !bytes.starts_with(ZIP_MAGIC) {
        debug!(bytes = bytes.len(), "Ribbon payload is not zipped, reading as text");
        return Ok(decode_text(bytes, PAYLOAD_LABEL, PAYLOAD_LABEL)?);
    }

    let package = ZipPackage::from_bytes(bytes, PAYLOAD_LABEL)?;
    let (entry, xml) = extract_first_entry(package, PAYLOAD_LABEL)?;
    debug!(entry = %entry, chars = xml.len(), "Ribbon payload decoded");
    Ok(xml)
}
