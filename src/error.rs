//! Privy Error Types
//!
//! 저장소 / 동기화 계층 에러 타입 정의

use serde::Serialize;
use thiserror::Error;

use crate::secrets::keychain::SecretStoreError;
use crate::secrets::vault::VaultError;
use crate::sync::remote::RemoteStatus;

/// 저장소 공통 에러
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 히스토리 파일 쓰기 실패 (복구 불가)
    #[error("History write failed: {0}")]
    HistoryWrite(std::io::Error),
}

impl StoreError {
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, StoreError::HistoryWrite(_))
    }
}

/// 프로필 저장 실패 원인 태그
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveFailureCause {
    Serialization,
    Write,
    KeyStore,
}

/// 프로필 저장 에러
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Failed to serialize profile: {0}")]
    Serialization(String),

    #[error("Failed to write profile: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to store encryption key: {0}")]
    KeyStore(#[from] SecretStoreError),

    /// 이메일이 없거나 파일 이름으로 쓸 수 없는 프로필은 저장 위치를 정할 수 없음 (복구 불가)
    #[error("Profile has no account email")]
    MissingAccountEmail,

    #[error("Account email cannot be used as a file name: {0}")]
    InvalidAccountEmail(String),
}

impl SaveError {
    /// 실패 원인 태그. 복구 불가 에러는 None.
    pub fn cause(&self) -> Option<SaveFailureCause> {
        match self {
            SaveError::Serialization(_) => Some(SaveFailureCause::Serialization),
            SaveError::Write(_) => Some(SaveFailureCause::Write),
            SaveError::KeyStore(_) => Some(SaveFailureCause::KeyStore),
            SaveError::MissingAccountEmail | SaveError::InvalidAccountEmail(_) => None,
        }
    }

    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            SaveError::MissingAccountEmail | SaveError::InvalidAccountEmail(_)
        )
    }
}

impl From<VaultError> for SaveError {
    fn from(error: VaultError) -> Self {
        SaveError::Serialization(error.to_string())
    }
}

/// 동기화 에러
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote request failed: {0}")]
    Remote(RemoteStatus),

    #[error("No history entry at index {0}")]
    NoSuchEntry(usize),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Save error: {0}")]
    Save(#[from] SaveError),
}

impl SyncError {
    pub fn remote_status(&self) -> Option<RemoteStatus> {
        match self {
            SyncError::Remote(status) => Some(*status),
            _ => None,
        }
    }
}

/// UI 계층 전달용 직렬화 가능한 에러
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<&SaveError> for ErrorReport {
    fn from(error: &SaveError) -> Self {
        let code = match error {
            SaveError::Serialization(_) => "SERIALIZATION_FAILED",
            SaveError::Write(_) => "WRITE_FAILED",
            SaveError::KeyStore(_) => "KEY_STORE_FAILED",
            SaveError::MissingAccountEmail => "MISSING_ACCOUNT_EMAIL",
            SaveError::InvalidAccountEmail(_) => "INVALID_ACCOUNT_EMAIL",
        };

        ErrorReport {
            code: code.to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

impl From<&SyncError> for ErrorReport {
    fn from(error: &SyncError) -> Self {
        match error {
            SyncError::Save(save) => save.into(),
            SyncError::Remote(status) => ErrorReport {
                code: "REMOTE_FAILED".to_string(),
                message: error.to_string(),
                details: Some(format!("{:?}", status)),
            },
            SyncError::NoSuchEntry(_) => ErrorReport {
                code: "NO_SUCH_ENTRY".to_string(),
                message: error.to_string(),
                details: None,
            },
            SyncError::Store(_) => ErrorReport {
                code: "STORE_FAILED".to_string(),
                message: error.to_string(),
                details: None,
            },
        }
    }
}
