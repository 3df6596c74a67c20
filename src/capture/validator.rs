//! Sanity checks for captured image buffers.

use crate::error_handling::types::ValidationError;

/// The 8-byte signature every PNG file starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Smallest buffer accepted as a real screen capture.
pub const MIN_IMAGE_BYTES: usize = 1024;

pub fn has_png_signature(buffer: &[u8]) -> bool {
    buffer.len() >= PNG_SIGNATURE.len() && buffer[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// Checks the signature and that the buffer holds at least `min_len` bytes.
pub fn validate_image(buffer: &[u8], min_len: usize) -> Result<(), ValidationError> {
    if buffer.len() < PNG_SIGNATURE.len() {
        return Err(ValidationError::TooShort(buffer.len()));
    }
    if !has_png_signature(buffer) {
        return Err(ValidationError::BadSignature);
    }
    if buffer.len() < min_len {
        return Err(ValidationError::TooSmall {
            len: buffer.len(),
            min: min_len,
        });
    }
    Ok(())
}

pub fn is_valid_image(buffer: &[u8]) -> bool {
    validate_image(buffer, MIN_IMAGE_BYTES).is_ok()
}

/// A PNG-signed buffer of `len` bytes, for tests that need something that
/// passes validation.
#[cfg(test)]
pub(crate) fn fake_png(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len.max(PNG_SIGNATURE.len())];
    buf[..PNG_SIGNATURE.len()].copy_from_slice(&PNG_SIGNATURE);
    buf
}
