//! Conversion between UTF-8 and the windows-1251 code page.
//!
//! Inbound CSV cells arrive as windows-1251 bytes and are decoded to text.
//! Outbound cells are encoded back; characters outside the code page become
//! a placeholder byte which is then folded into whitespace.

use crate::utils::error::{CallerError, Result};
use encoding_rs::{EncoderResult, WINDOWS_1251};

/// Byte written in place of a character the code page cannot represent.
pub const PLACEHOLDER: u8 = 0x1A;

/// Decodes windows-1251 bytes. On an unmappable byte the error carries the
/// best-effort decoding so the caller can log it and carry on.
pub fn to_unicode(bytes: &[u8]) -> Result<String> {
    match WINDOWS_1251.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => Ok(text.into_owned()),
        None => {
            let (lossy, _) = WINDOWS_1251.decode_without_bom_handling(bytes);
            Err(CallerError::Encoding {
                lossy: lossy.into_owned(),
            })
        }
    }
}

/// Decodes a cell, logging and keeping the lossy value on failure.
pub fn to_unicode_lossy(bytes: &[u8]) -> String {
    match to_unicode(bytes) {
        Ok(text) => text,
        Err(CallerError::Encoding { lossy }) => {
            tracing::warn!("Converting to utf-8 failed, kept '{}'", lossy);
            lossy
        }
        Err(e) => {
            tracing::warn!("Converting to utf-8 failed: {}", e);
            String::new()
        }
    }
}

/// Encodes text as windows-1251 and sanitizes the result.
pub fn from_unicode(text: &str) -> Vec<u8> {
    sanitize(&encode_with_placeholder(text))
}

fn encode_with_placeholder(text: &str) -> Vec<u8> {
    let mut encoder = WINDOWS_1251.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut remaining = text;

    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_without_replacement(remaining.len())
            .unwrap_or(remaining.len());
        out.reserve(needed + 1);

        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(remaining, &mut out, true);
        remaining = &remaining[read..];

        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(_) => out.push(PLACEHOLDER),
        }
    }

    out
}

/// Turns placeholder bytes into spaces, collapses whitespace runs to a
/// single space and trims both ends. Applying it twice changes nothing.
pub fn sanitize(bytes: &[u8]) -> Vec<u8> {
    bytes
        .split(|b| *b == PLACEHOLDER || b.is_ascii_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(&b' ')
}
