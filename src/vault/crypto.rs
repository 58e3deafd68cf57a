//! Passphrase-based sealing of vault records
//!
//! Key: Argon2id(passphrase, random 16-byte salt) -> 32 bytes.
//! Cipher: AES-256-GCM with a random 96-bit nonce.
//! Envelope: `qv1$argon2id$m=<kib>,t=<iters>,p=<lanes>$<salt>$<nonce>$<ciphertext>`
//! (standard base64). Everything before the nonce is bound as associated data.

use crate::config::KdfSettings;
use crate::error::{AppError, AppResult};
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;

const ENVELOPE_VERSION: &str = "qv1";
const KDF_NAME: &str = "argon2id";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Upper bounds accepted when opening a record, so a tampered header cannot
/// make us allocate or spin without limit.
const MAX_M_COST_KIB: u32 = 1024 * 1024;
const MAX_T_COST: u32 = 16;
const MAX_P_COST: u32 = 16;

fn derive_key(passphrase: &str, salt: &[u8], kdf: &KdfSettings) -> AppResult<[u8; KEY_LEN]> {
    let params = Params::new(kdf.m_cost_kib, kdf.t_cost, kdf.p_cost, Some(KEY_LEN))
        .map_err(|e| AppError::Config(format!("Invalid KDF parameters: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| AppError::Config(format!("Key derivation failed: {}", e)))?;
    Ok(key)
}

fn header(kdf: &KdfSettings, salt_b64: &str) -> String {
    format!(
        "{}${}$m={},t={},p={}${}",
        ENVELOPE_VERSION, KDF_NAME, kdf.m_cost_kib, kdf.t_cost, kdf.p_cost, salt_b64
    )
}

fn parse_kdf_params(field: &str) -> Option<KdfSettings> {
    let mut m_cost_kib = None;
    let mut t_cost = None;
    let mut p_cost = None;

    for part in field.split(',') {
        let (name, value) = part.split_once('=')?;
        let value: u32 = value.parse().ok()?;
        match name {
            "m" => m_cost_kib = Some(value),
            "t" => t_cost = Some(value),
            "p" => p_cost = Some(value),
            _ => return None,
        }
    }

    let kdf = KdfSettings {
        m_cost_kib: m_cost_kib?,
        t_cost: t_cost?,
        p_cost: p_cost?,
    };

    if kdf.m_cost_kib > MAX_M_COST_KIB || kdf.t_cost > MAX_T_COST || kdf.p_cost > MAX_P_COST {
        return None;
    }
    Some(kdf)
}

/// Encrypt `plaintext` under `passphrase`, returning a self-describing envelope.
pub fn seal(plaintext: &[u8], passphrase: &str, kdf: &KdfSettings) -> AppResult<String> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(passphrase, &salt, kdf)?;
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| AppError::Config(format!("Failed to create cipher: {}", e)))?;

    let aad = header(kdf, &STANDARD.encode(salt));
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|e| AppError::Serialization(format!("Failed to encrypt vault record: {}", e)))?;

    Ok(format!(
        "{}${}${}",
        aad,
        STANDARD.encode(nonce_bytes),
        STANDARD.encode(ciphertext)
    ))
}

/// Decrypt an envelope produced by [`seal`].
///
/// Every failure (malformed envelope, unsupported version, wrong passphrase,
/// tampering) is `DecryptionFailed`; the cipher cannot tell them apart.
pub fn open(envelope: &str, passphrase: &str) -> AppResult<Vec<u8>> {
    let parts: Vec<&str> = envelope.trim().split('$').collect();
    let [version, kdf_name, params, salt_b64, nonce_b64, ciphertext_b64] = parts[..] else {
        return Err(AppError::DecryptionFailed);
    };
    if version != ENVELOPE_VERSION || kdf_name != KDF_NAME {
        return Err(AppError::DecryptionFailed);
    }

    let kdf = parse_kdf_params(params).ok_or(AppError::DecryptionFailed)?;
    let salt = STANDARD
        .decode(salt_b64)
        .map_err(|_| AppError::DecryptionFailed)?;
    let nonce_bytes = STANDARD
        .decode(nonce_b64)
        .map_err(|_| AppError::DecryptionFailed)?;
    let ciphertext = STANDARD
        .decode(ciphertext_b64)
        .map_err(|_| AppError::DecryptionFailed)?;
    if salt.len() != SALT_LEN || nonce_bytes.len() != NONCE_LEN {
        return Err(AppError::DecryptionFailed);
    }

    let key = derive_key(passphrase, &salt, &kdf).map_err(|_| AppError::DecryptionFailed)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| AppError::DecryptionFailed)?;

    let aad = header(&kdf, salt_b64);
    cipher
        .decrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: &ciphertext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|_| AppError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> KdfSettings {
        KdfSettings {
            m_cost_kib: 256,
            t_cost: 1,
            p_cost: 1,
        }
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let sealed = seal(b"{\"host\":\"h\"}", "hunter2", &light()).unwrap();
        assert!(sealed.starts_with("qv1$argon2id$m=256,t=1,p=1$"));
        assert!(!sealed.contains("host"));
        assert_eq!(open(&sealed, "hunter2").unwrap(), b"{\"host\":\"h\"}");
    }

    #[test]
    fn test_fresh_salt_and_nonce_each_time() {
        let a = seal(b"same", "pw", &light()).unwrap();
        let b = seal(b"same", "pw", &light()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let sealed = seal(b"data", "right", &light()).unwrap();
        assert!(matches!(open(&sealed, "wrong"), Err(AppError::DecryptionFailed)));
    }

    #[test]
    fn test_tampered_header_fails() {
        let sealed = seal(b"data", "pw", &light()).unwrap();
        let tampered = sealed.replacen("t=1", "t=2", 1);
        assert!(matches!(open(&tampered, "pw"), Err(AppError::DecryptionFailed)));
    }

    #[test]
    fn test_malformed_envelopes_fail() {
        for bad in [
            "",
            "U2FsdGVkX1+legacy",
            "qv1$argon2id$m=256,t=1,p=1$AAAA$BBBB",
            "qv2$argon2id$m=256,t=1,p=1$a$b$c",
            "qv1$argon2id$m=999999999,t=1,p=1$a$b$c",
            "qv1$argon2id$m=256,t=1$a$b$c",
            "qv1$argon2id$m=256,t=1,p=1$!!$!!$!!",
        ] {
            assert!(
                matches!(open(bad, "pw"), Err(AppError::DecryptionFailed)),
                "{:?} should not open",
                bad
            );
        }
    }

    #[test]
    fn test_parse_kdf_params_bounds() {
        assert_eq!(parse_kdf_params("m=256,t=1,p=1"), Some(light()));
        assert_eq!(parse_kdf_params("p=1,t=1,m=256"), Some(light()));
        assert_eq!(parse_kdf_params("m=256,t=17,p=1"), None);
        assert_eq!(parse_kdf_params("m=256,t=1,p=1,x=2"), None);
    }
}
