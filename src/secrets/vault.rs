//! 프로필 blob 암호화/복호화
//!
//! 파일 포맷 (v1):
//! - magic: `PRIVYUS1` (8 bytes)
//! - nonce: 24 bytes (XChaCha20-Poly1305)
//! - ciphertext: AEAD 결과 (= 암호문 + 태그)
//!
//! AAD: magic를 AAD로 사용 (포맷 바인딩)

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::Rng;
use zeroize::Zeroize;

use crate::models::UserProfile;

/// 파일 매직 (8 bytes)
pub const PROFILE_MAGIC: &[u8; 8] = b"PRIVYUS1";

/// 프로필 키 길이 (256-bit)
pub const PROFILE_KEY_LEN: usize = 32;

/// Nonce 길이 (XChaCha20-Poly1305용 24 bytes)
pub const NONCE_LEN: usize = 24;

/// Vault 오류
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Invalid profile magic")]
    InvalidMagic,

    #[error("Invalid profile format: {0}")]
    InvalidFormat(String),

    #[error("Invalid profile key")]
    InvalidKey,

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 프로필 암호화 키 (drop 시 zeroize)
///
/// 저장할 때마다 새로 생성되며, 키체인에는 base64 문자열로 보관합니다.
#[derive(Clone)]
pub struct ProfileKey {
    bytes: [u8; PROFILE_KEY_LEN],
}

impl ProfileKey {
    /// 새 키 생성 (CSPRNG)
    pub fn generate() -> Self {
        let mut bytes = [0u8; PROFILE_KEY_LEN];
        rand::thread_rng().fill(&mut bytes);
        Self { bytes }
    }

    /// 키체인 문자열에서 키 복원
    pub fn from_encoded(encoded: &str) -> Result<Self, VaultError> {
        let mut decoded = BASE64
            .decode(encoded.trim())
            .map_err(|_| VaultError::InvalidKey)?;

        if decoded.len() != PROFILE_KEY_LEN {
            decoded.zeroize();
            return Err(VaultError::InvalidKey);
        }

        let mut bytes = [0u8; PROFILE_KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();

        Ok(Self { bytes })
    }

    /// 키체인 저장용 base64 인코딩
    pub fn encode(&self) -> String {
        BASE64.encode(self.bytes)
    }
}

impl Drop for ProfileKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ProfileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProfileKey(..)")
    }
}

/// 프로필을 직렬화하여 암호화된 blob으로 변환
pub fn seal_profile(key: &ProfileKey, profile: &UserProfile) -> Result<Vec<u8>, VaultError> {
    // 프로필을 JSON으로 직렬화
    let mut plaintext = serde_json::to_vec(profile)?;

    // 랜덤 nonce 생성
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill(&mut nonce);

    let cipher = XChaCha20Poly1305::new((&key.bytes).into());

    let result = cipher.encrypt(
        XNonce::from_slice(&nonce),
        Payload {
            msg: &plaintext,
            aad: PROFILE_MAGIC,
        },
    );
    plaintext.zeroize();
    let ciphertext = result.map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;

    let mut blob = Vec::with_capacity(PROFILE_MAGIC.len() + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(PROFILE_MAGIC);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);

    Ok(blob)
}

/// 암호화된 blob을 복호화하여 프로필로 역직렬화
pub fn open_profile(key: &ProfileKey, blob: &[u8]) -> Result<UserProfile, VaultError> {
    let header_len = PROFILE_MAGIC.len() + NONCE_LEN;
    if blob.len() < header_len {
        return Err(VaultError::InvalidFormat(format!(
            "blob too short ({} bytes)",
            blob.len()
        )));
    }

    // Magic 검증
    let (magic, rest) = blob.split_at(PROFILE_MAGIC.len());
    if magic != PROFILE_MAGIC {
        return Err(VaultError::InvalidMagic);
    }

    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let cipher = XChaCha20Poly1305::new((&key.bytes).into());

    let mut plaintext = cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: PROFILE_MAGIC,
            },
        )
        .map_err(|e| VaultError::DecryptionFailed(e.to_string()))?;

    let profile: Result<UserProfile, _> = serde_json::from_slice(&plaintext);

    // 평문 메모리 지우기
    plaintext.zeroize();

    Ok(profile?)
}
