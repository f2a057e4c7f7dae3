use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;

use crate::codec::Failure;
use crate::iv::Iv;
use crate::SecretKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size in bytes.
pub(crate) const BLOCK_LEN: usize = 16;

/// Length of the ciphertext for a plaintext of `plaintext_len` bytes.  PKCS#7
/// always adds at least one byte, so a full block of padding follows block-aligned input.
pub(crate) fn ciphertext_len(plaintext_len: usize) -> usize {
    (plaintext_len / BLOCK_LEN + 1) * BLOCK_LEN
}

/// AES-256-CBC encrypts `plaintext` with PKCS#7 padding.
pub(crate) fn encrypt(plaintext: &[u8], key: &SecretKey, iv: &Iv) -> Vec<u8> {
    Aes256CbcEnc::new(&(*key.cipher_key()).into(), &(*iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// AES-256-CBC decrypts `ciphertext` and strips the PKCS#7 padding.
///
/// A wrong key, a wrong IV and a tampered ciphertext all look the same here:
/// the padding does not check out.  There is no MAC, so roughly one in 256
/// tampered inputs still unpads to something.
pub(crate) fn decrypt(ciphertext: &[u8], key: &SecretKey, iv: &Iv) -> Result<Vec<u8>, Failure> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(Failure::Padding);
    }
    Aes256CbcDec::new(&(*key.cipher_key()).into(), &(*iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Failure::Padding)
}
