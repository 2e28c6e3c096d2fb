//! Secrets 모듈
//!
//! 계정별 키 + 암호화된 프로필 blob 아키텍처를 통해 프로필을 안전하게 관리합니다.
//!
//! - Keychain에는 계정(email)마다 프로필 키 1개만 저장
//! - 프로필은 `documents/<email>` 파일에 AEAD로 암호화하여 저장
//! - 저장할 때마다 키를 교체하므로 이전 blob은 복구할 수 없음

pub mod keychain;
pub mod vault;

pub use keychain::{KeyringSecretStore, MemorySecretStore, SecretStore, SecretStoreError};
pub use vault::{ProfileKey, VaultError};
