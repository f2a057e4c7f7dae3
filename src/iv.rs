use hmac::Mac;

use crate::SecretKey;

/// Length of the AES-CBC initialization vector in bytes.
pub(crate) const IV_LEN: usize = 16;

pub(crate) type Iv = [u8; IV_LEN];

/// Derives the IV for `identifier`: the first 16 bytes of
/// HMAC-SHA256(key, identifier).  The same identifier and key always give the
/// same IV, which is what makes share links stable without a lookup table.
pub(crate) fn derive_iv(identifier: &str, key: &SecretKey) -> Iv {
    let mut hmac = key.iv_mac().clone();
    hmac.update(identifier.as_bytes());
    let digest = hmac.finalize().into_bytes();

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&digest[..IV_LEN]);
    iv
}
