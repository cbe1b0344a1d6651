//! AES primitives. Encrypted buffers are laid out as
//! `nonce(12) || ciphertext || tag(16)` for GCM and `nonce(12) || ciphertext`
//! for CTR. The CTR IV is the nonce followed by a big-endian 32-bit counter
//! starting at one.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{AesGcm, KeyInit, Nonce};
use parq_core::errors::{CryptoError, Error, Result};
use rand::RngCore;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
const CTR_COUNTER_START: [u8; 4] = [0, 0, 0, 1];

type Aes128Gcm = AesGcm<aes::Aes128, aes_gcm::aead::consts::U12>;
type Aes192Gcm = AesGcm<aes::Aes192, aes_gcm::aead::consts::U12>;
type Aes256Gcm = AesGcm<aes::Aes256, aes_gcm::aead::consts::U12>;

type Ctr128Aes128 = ctr::Ctr32BE<aes::Aes128>;
type Ctr128Aes192 = ctr::Ctr32BE<aes::Aes192>;
type Ctr128Aes256 = ctr::Ctr32BE<aes::Aes256>;

pub fn check_key_length(key: &[u8]) -> Result<()> {
    match key.len() {
        16 | 24 | 32 => Ok(()),
        other => Err(Error::Encryption(CryptoError::KeyUnavailable(format!(
            "AES keys are 16, 24 or 32 bytes, got {}",
            other
        )))),
    }
}

pub fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

fn gcm_seal(key: &[u8], nonce: &[u8; NONCE_LEN], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let payload = Payload {
        msg: plaintext,
        aad,
    };
    let nonce = Nonce::from_slice(nonce);
    let sealed = match key.len() {
        16 => Aes128Gcm::new_from_slice(key).unwrap().encrypt(nonce, payload),
        24 => Aes192Gcm::new_from_slice(key).unwrap().encrypt(nonce, payload),
        32 => Aes256Gcm::new_from_slice(key).unwrap().encrypt(nonce, payload),
        _ => return Err(Error::Encryption(CryptoError::KeyUnavailable(
            "bad AES key length".to_string(),
        ))),
    };
    sealed.map_err(|_| Error::Encryption(CryptoError::TagMismatch))
}

fn gcm_open(key: &[u8], nonce: &[u8], sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let payload = Payload { msg: sealed, aad };
    let nonce = Nonce::from_slice(nonce);
    let opened = match key.len() {
        16 => Aes128Gcm::new_from_slice(key).unwrap().decrypt(nonce, payload),
        24 => Aes192Gcm::new_from_slice(key).unwrap().decrypt(nonce, payload),
        32 => Aes256Gcm::new_from_slice(key).unwrap().decrypt(nonce, payload),
        _ => return Err(Error::Encryption(CryptoError::KeyUnavailable(
            "bad AES key length".to_string(),
        ))),
    };
    opened.map_err(|_| Error::Encryption(CryptoError::TagMismatch))
}

/// GCM: `nonce || ciphertext || tag`.
pub fn encrypt_gcm(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    check_key_length(key)?;
    let nonce = random_nonce();
    let sealed = gcm_seal(key, &nonce, plaintext, aad)?;
    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

pub fn decrypt_gcm(key: &[u8], buffer: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    check_key_length(key)?;
    if buffer.len() < NONCE_LEN + TAG_LEN {
        return Err(Error::Encryption(CryptoError::TagMismatch));
    }
    let (nonce, sealed) = buffer.split_at(NONCE_LEN);
    gcm_open(key, nonce, sealed, aad)
}

fn ctr_apply(key: &[u8], nonce: &[u8], data: &mut [u8]) -> Result<()> {
    let mut iv = [0u8; 16];
    iv[..NONCE_LEN].copy_from_slice(nonce);
    iv[NONCE_LEN..].copy_from_slice(&CTR_COUNTER_START);
    match key.len() {
        16 => Ctr128Aes128::new_from_slices(key, &iv).unwrap().apply_keystream(data),
        24 => Ctr128Aes192::new_from_slices(key, &iv).unwrap().apply_keystream(data),
        32 => Ctr128Aes256::new_from_slices(key, &iv).unwrap().apply_keystream(data),
        _ => {
            return Err(Error::Encryption(CryptoError::KeyUnavailable(
                "bad AES key length".to_string(),
            )))
        }
    }
    Ok(())
}

/// CTR: `nonce || ciphertext`, no authentication tag.
pub fn encrypt_ctr(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    check_key_length(key)?;
    let nonce = random_nonce();
    let mut out = Vec::with_capacity(NONCE_LEN + plaintext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(plaintext);
    let (nonce, body) = out.split_at_mut(NONCE_LEN);
    ctr_apply(key, nonce, body)?;
    Ok(out)
}

pub fn decrypt_ctr(key: &[u8], buffer: &[u8]) -> Result<Vec<u8>> {
    check_key_length(key)?;
    if buffer.len() < NONCE_LEN {
        return Err(Error::Encryption(CryptoError::TagMismatch));
    }
    let (nonce, body) = buffer.split_at(NONCE_LEN);
    let mut out = body.to_vec();
    ctr_apply(key, nonce, &mut out)?;
    Ok(out)
}
