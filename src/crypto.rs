use ::anyhow::anyhow;
use ::chacha20poly1305::aead::{Aead, AeadCore, KeyInit};
use ::chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use ::rand::distributions::Alphanumeric;
use ::rand::rngs::OsRng;
use ::rand::Rng;

const NONCE_LEN: usize = 12;
const CREDENTIAL_LEN: usize = 32;

/// Seals peer credentials for storage. Credentials live encrypted in the
/// options store and are decrypted only at the point of use. The blob format
/// is base64(nonce || ciphertext).
pub struct CredentialCipher {
    cipher: ChaCha20Poly1305,
}

impl CredentialCipher {
    /// Key material is an operator-supplied string of any length; the actual
    /// cipher key is its SHA-256 digest.
    pub fn new(key_material: &str) -> CredentialCipher {
        let digest = ::hmac_sha256::Hash::hash(key_material.as_bytes());
        CredentialCipher {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&digest)),
        }
    }

    pub fn encrypt(&self, plain: &str) -> ::anyhow::Result<String> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plain.as_bytes())
            .map_err(|err| anyhow!("credential encryption failed: {}", err))?;

        let mut blob = nonce.to_vec();
        blob.extend_from_slice(&sealed);
        Ok(::base64::encode(blob))
    }

    pub fn decrypt(&self, blob: &str) -> ::anyhow::Result<String> {
        let raw = ::base64::decode(blob)
            .map_err(|err| anyhow!("credential blob is not base64: {}", err))?;

        if raw.len() <= NONCE_LEN {
            return Err(anyhow!("credential blob too short"));
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|err| anyhow!("credential decryption failed: {}", err))?;

        Ok(String::from_utf8(plain)?)
    }
}

/// Random alphanumeric credential issued to this instance on first start.
pub fn generate_credential() -> String {
    ::rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CREDENTIAL_LEN)
        .map(char::from)
        .collect()
}
