//! Secure Key-Value Service
//!
//! 계정별 프로필 암호화 키를 보관하는 보안 저장소.
//! 실제 앱에서는 OS 키체인/키링을 사용하고, 테스트에서는 메모리 구현을 주입합니다.

use std::collections::HashMap;
use std::sync::Mutex;

use keyring::{Entry, Error as KeyringError};

/// Secure store 오류
#[derive(Debug, thiserror::Error)]
pub enum SecretStoreError {
    #[error("Secure store key must not be empty")]
    InvalidKey,

    #[error("Secure store error: {0}")]
    Backend(String),
}

/// 계정 ID → 비밀 문자열 보안 저장소
///
/// 덮어쓰기 시 이전 값은 복구할 수 없습니다.
pub trait SecretStore: Send + Sync {
    fn load(&self, account: &str) -> Result<Option<String>, SecretStoreError>;

    fn store(&self, account: &str, secret: &str) -> Result<(), SecretStoreError>;

    /// 계정 키 삭제 (없으면 Ok)
    ///
    /// 저장소는 이 메서드를 호출하지 않습니다. 로그아웃/purge 뒤에도 같은 계정으로
    /// 다시 로그인하면 프로필을 열 수 있어야 하므로, 키 파기는 계정 자체를 지우는
    /// 호스트 앱의 몫입니다.
    fn delete(&self, account: &str) -> Result<(), SecretStoreError>;
}

fn validate_account(account: &str) -> Result<(), SecretStoreError> {
    if account.trim().is_empty() {
        return Err(SecretStoreError::InvalidKey);
    }
    Ok(())
}

fn map_keyring_error(err: KeyringError) -> SecretStoreError {
    SecretStoreError::Backend(err.to_string())
}

/// OS 키체인/키링 기반 구현
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, account: &str) -> Result<Entry, SecretStoreError> {
        validate_account(account)?;
        Entry::new(&self.service, account).map_err(map_keyring_error)
    }
}

impl SecretStore for KeyringSecretStore {
    fn load(&self, account: &str) -> Result<Option<String>, SecretStoreError> {
        match self.entry(account)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(err) => Err(map_keyring_error(err)),
        }
    }

    fn store(&self, account: &str, secret: &str) -> Result<(), SecretStoreError> {
        self.entry(account)?
            .set_password(secret)
            .map_err(map_keyring_error)
    }

    fn delete(&self, account: &str) -> Result<(), SecretStoreError> {
        match self.entry(account)?.delete_password() {
            Ok(()) => Ok(()),
            Err(KeyringError::NoEntry) => Ok(()),
            Err(err) => Err(map_keyring_error(err)),
        }
    }
}

/// 메모리 기반 구현 (테스트 / 키체인이 없는 환경)
#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: Mutex<bool>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후의 store 호출을 실패시킴 (키 저장 실패 시나리오용)
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }

    fn lock_entries(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, SecretStoreError> {
        self.entries
            .lock()
            .map_err(|e| SecretStoreError::Backend(e.to_string()))
    }
}

impl SecretStore for MemorySecretStore {
    fn load(&self, account: &str) -> Result<Option<String>, SecretStoreError> {
        validate_account(account)?;
        Ok(self.lock_entries()?.get(account).cloned())
    }

    fn store(&self, account: &str, secret: &str) -> Result<(), SecretStoreError> {
        validate_account(account)?;
        let fail = self.fail_writes.lock().map(|flag| *flag).unwrap_or(false);
        if fail {
            return Err(SecretStoreError::Backend("write rejected".to_string()));
        }
        self.lock_entries()?
            .insert(account.to_string(), secret.to_string());
        Ok(())
    }

    fn delete(&self, account: &str) -> Result<(), SecretStoreError> {
        validate_account(account)?;
        self.lock_entries()?.remove(account);
        Ok(())
    }
}
