use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::cipher::ciphertext_len;
use crate::codec::Failure;
use crate::iv::{Iv, IV_LEN};

/// Byte length of the decoded token for an identifier of `identifier_len` bytes:
/// the IV followed by the padded ciphertext.
pub(crate) fn encoded_len(identifier_len: usize) -> usize {
    IV_LEN + ciphertext_len(identifier_len)
}

/// Frames `iv ‖ ciphertext` as unpadded base64url.
pub(crate) fn encode(iv: &Iv, ciphertext: &[u8]) -> String {
    let mut data = Vec::with_capacity(IV_LEN + ciphertext.len());
    data.extend_from_slice(iv);
    data.extend_from_slice(ciphertext);
    URL_SAFE_NO_PAD.encode(data)
}

/// Splits a token back into its IV and ciphertext.  Rejects anything outside the
/// base64url alphabet (including `=` padding) and tokens too short to hold an IV.
pub(crate) fn decode(token: &str) -> Result<(Iv, Vec<u8>), Failure> {
    let data = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| Failure::Format)?;
    if data.len() < IV_LEN {
        return Err(Failure::Format);
    }

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&data[..IV_LEN]);
    Ok((iv, data[IV_LEN..].to_vec()))
}
