//! Password protection of a finished PDF.
//!
//! Uses the standard security handler with 128-bit RC4 (revision 3), which
//! every mainstream viewer can open. The same password is used as user and
//! owner password, so anyone who can open the file has full permissions.
//! Protected files are written with a classic cross-reference table.

use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::xref::XrefType;
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::SystemTime;

use crate::error::{MixError, Result};

/// Encrypt `pdf` so it can only be opened with `password`.
///
/// # Errors
///
/// Returns [`MixError::Protection`] if the password is empty, the input is
/// not a PDF or is already encrypted.
pub fn protect(pdf: &[u8], password: &str) -> Result<Vec<u8>> {
    if password.is_empty() {
        return Err(protection("password must not be empty"));
    }

    let mut doc = Document::load_mem(pdf).map_err(|e| protection(format!("cannot load PDF: {e}")))?;
    if doc.is_encrypted() {
        return Err(protection("PDF is already encrypted"));
    }

    let mut trailer = Dictionary::new();
    for key in [&b"Root"[..], b"Info", b"ID"] {
        if let Ok(value) = doc.trailer.get(key) {
            trailer.set(key, value.clone());
        }
    }
    doc.trailer = trailer;
    doc.reference_table.cross_reference_type = XrefType::CrossReferenceTable;

    if !doc.trailer.has(b"ID") {
        let id = document_id(pdf);
        doc.trailer.set(
            "ID",
            vec![
                Object::String(id.clone(), StringFormat::Hexadecimal),
                Object::String(id, StringFormat::Hexadecimal),
            ],
        );
    }

    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password: password,
        user_password: password,
        key_length: 128,
        permissions: Permissions::all(),
    };
    let state = EncryptionState::try_from(version)
        .map_err(|e| protection(format!("cannot derive keys: {e}")))?;
    doc.encrypt(&state)
        .map_err(|e| protection(format!("cannot encrypt: {e}")))?;

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| protection(format!("cannot save: {e}")))?;

    log::debug!("Encrypted PDF ({} bytes)", buffer.len());
    Ok(buffer)
}

/// Decrypt a PDF produced by [`protect`].
///
/// # Errors
///
/// Returns [`MixError::Protection`] if the input is not encrypted or the
/// password is wrong.
pub fn unlock(pdf: &[u8], password: &str) -> Result<Vec<u8>> {
    let (detached, encrypt_id) =
        detach_encrypt(pdf).ok_or_else(|| protection("PDF is not encrypted"))?;

    let mut doc =
        Document::load_mem(&detached).map_err(|e| protection(format!("cannot load PDF: {e}")))?;
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
    if !doc.is_encrypted() {
        return Err(protection("PDF is not encrypted"));
    }

    doc.decrypt(password)
        .map_err(|e| protection(format!("cannot decrypt: {e}")))?;

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| protection(format!("cannot save: {e}")))?;
    Ok(buffer)
}

/// Blank out the trailer's `/Encrypt` entry and return the referenced id.
///
/// lopdf drops every object of an encrypted file unless the user password
/// is empty. Without the entry the objects load as stored, still encrypted,
/// and the blanking keeps every xref offset valid.
fn detach_encrypt(pdf: &[u8]) -> Option<(Vec<u8>, ObjectId)> {
    const KEY: &[u8] = b"/Encrypt";

    let mut end = pdf.len();
    while let Some(start) = pdf[..end].windows(KEY.len()).rposition(|w| w == KEY) {
        if let Some((id, len)) = parse_reference(&pdf[start + KEY.len()..]) {
            let mut detached = pdf.to_vec();
            detached[start..start + KEY.len() + len].fill(b' ');
            return Some((detached, id));
        }
        end = start;
    }
    None
}

/// Parse `<id> <generation> R`, returning the id and the bytes consumed.
fn parse_reference(bytes: &[u8]) -> Option<(ObjectId, usize)> {
    let mut pos = 0;
    let id = read_number(bytes, &mut pos)?;
    let generation = read_number(bytes, &mut pos)?;
    pos += leading_whitespace(&bytes[pos..]);

    if bytes.get(pos) != Some(&b'R') {
        return None;
    }
    let id = (u32::try_from(id).ok()?, u16::try_from(generation).ok()?);
    Some((id, pos + 1))
}

fn read_number(bytes: &[u8], pos: &mut usize) -> Option<u64> {
    *pos += leading_whitespace(&bytes[*pos..]);
    let digits = bytes[*pos..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let number = std::str::from_utf8(&bytes[*pos..*pos + digits]).ok()?.parse().ok()?;
    *pos += digits;
    Some(number)
}

fn leading_whitespace(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|&&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0'))
        .count()
}

/// 16-byte file identifier derived from the content and the current time.
fn document_id(pdf: &[u8]) -> Vec<u8> {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let mut id = Vec::with_capacity(16);
    for salt in 0u8..2 {
        let mut hasher = DefaultHasher::new();
        salt.hash(&mut hasher);
        pdf.hash(&mut hasher);
        now.hash(&mut hasher);
        id.extend_from_slice(&hasher.finish().to_be_bytes());
    }
    id
}

fn protection(reason: impl Into<String>) -> MixError {
    MixError::Protection {
        reason: reason.into(),
    }
}
