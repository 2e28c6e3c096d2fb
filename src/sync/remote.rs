//! 원격 히스토리 협력자
//!
//! 네트워크 클라이언트는 이 crate 밖에 있으며, 코디네이터는 이 trait만 사용합니다.
//! 각 호출은 정확히 한 번 결과를 반환하고, 재시도는 구현체나 호출자의 몫입니다.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::HistoryList;

/// 원격 호출 실패 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteStatus {
    Unauthorized,
    NotFound,
    ServerError,
    NetworkUnavailable,
    Unknown,
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RemoteStatus::Unauthorized => "unauthorized",
            RemoteStatus::NotFound => "not found",
            RemoteStatus::ServerError => "server error",
            RemoteStatus::NetworkUnavailable => "network unavailable",
            RemoteStatus::Unknown => "unknown error",
        };
        f.write_str(text)
    }
}

/// 성공 시 payload, 실패 시 상태
pub type RemoteResult<T> = Result<T, RemoteStatus>;

/// 히스토리 원격 API
#[async_trait]
pub trait HistoryRemote: Send + Sync {
    /// 서버 기준 전체 히스토리 (최신순)
    async fn refresh_history(&self) -> RemoteResult<HistoryList>;

    /// uuid로 히스토리 항목 삭제
    async fn remove_from_history(&self, uuid: &str) -> RemoteResult<()>;

    async fn logout(&self) -> RemoteResult<()>;
}
