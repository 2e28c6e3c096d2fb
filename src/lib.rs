//! Privy Core Library
//!
//! 연락처 교환 앱의 로컬 암호화 저장소와 히스토리 동기화를 담당합니다.
//!
//! - `storage::SecureStore`: 현재 사용자 프로필(암호화) + 히스토리 목록 영속화
//! - `sync::HistorySyncCoordinator`: 원격 히스토리와 로컬 목록 동기화 / 삭제
//! - `dispatch::MainQueue`: 저장 완료 콜백을 UI 컨텍스트로 전달

pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod secrets;
pub mod storage;
pub mod sync;

pub use config::StorageConfig;
pub use dispatch::{main_queue, MainQueue, MainQueueRunner};
pub use error::{ErrorReport, SaveError, SaveFailureCause, StoreError, SyncError};
pub use models::{ContactCard, HistoryEntry, HistoryList, LoginCredential, UserProfile};
pub use storage::{LoadFailure, SecureStore};
pub use sync::{DeleteOutcome, HistoryRemote, HistorySyncCoordinator, RemoteStatus};

use tracing::info;

/// tracing 구독자 초기화 (`RUST_LOG`로 필터 지정, 기본 info)
///
/// 이미 전역 구독자가 설정되어 있으면 아무것도 하지 않습니다.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .is_ok();

    if installed {
        info!("Privy core logging initialized");
    }
}
