//! 저장소 설정
//!
//! 환경 변수(.env / .env.local 포함)로 문서 디렉토리와 키체인 서비스 이름을 지정합니다.
//! - `PRIVY_DOCUMENTS_DIR`: 프로필 blob / history.dat 가 저장될 디렉토리
//! - `PRIVY_KEYCHAIN_SERVICE`: 키체인 서비스 이름

use std::path::{Path, PathBuf};

use tracing::debug;

pub const DOCUMENTS_DIR_ENV: &str = "PRIVY_DOCUMENTS_DIR";
pub const KEYCHAIN_SERVICE_ENV: &str = "PRIVY_KEYCHAIN_SERVICE";

/// 기본 키체인 서비스 이름
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "com.privy.app";

/// 히스토리 파일 이름 (계정과 무관한 단일 경로)
pub const HISTORY_FILE_NAME: &str = "history.dat";

/// 현재 사용자 마커 파일 이름
pub const CURRENT_USER_FILE_NAME: &str = "current.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub documents_dir: PathBuf,
    pub keychain_service: String,
}

impl StorageConfig {
    pub fn new(documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }

    /// 환경 변수에서 설정 로드
    ///
    /// .env.local → .env 순으로 로드하며, 파일이 없어도 무시합니다.
    /// 이미 설정된 환경 변수는 덮어쓰지 않습니다.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::dotenv();

        let documents_dir = non_empty_env(DOCUMENTS_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_documents_dir);

        let keychain_service = non_empty_env(KEYCHAIN_SERVICE_ENV)
            .unwrap_or_else(|| DEFAULT_KEYCHAIN_SERVICE.to_string());

        debug!(
            "[Config] documents_dir={}, keychain_service={}",
            documents_dir.display(),
            keychain_service
        );

        Self {
            documents_dir,
            keychain_service,
        }
    }

    pub fn with_keychain_service(mut self, service: impl Into<String>) -> Self {
        self.keychain_service = service.into();
        self
    }

    /// 계정별 암호화 프로필 경로
    pub fn profile_path(&self, account_email: &str) -> PathBuf {
        self.documents_dir.join(account_email)
    }

    pub fn history_path(&self) -> PathBuf {
        self.documents_dir.join(HISTORY_FILE_NAME)
    }

    pub fn current_user_path(&self) -> PathBuf {
        self.documents_dir.join(CURRENT_USER_FILE_NAME)
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_documents_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Privy")
}
