//! 코디네이터 테스트용 스크립트 원격 구현

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::HistoryList;
use crate::sync::remote::{HistoryRemote, RemoteResult, RemoteStatus};

/// 기록된 원격 호출
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Refresh,
    Remove(String),
    Logout,
}

/// 응답을 미리 큐에 넣어두고 호출을 기록하는 가짜 원격
///
/// 큐가 비어 있으면 `RemoteStatus::Unknown`으로 실패합니다.
#[derive(Default)]
pub struct FakeRemote {
    refresh_responses: Mutex<VecDeque<RemoteResult<HistoryList>>>,
    remove_responses: Mutex<VecDeque<RemoteResult<()>>>,
    logout_responses: Mutex<VecDeque<RemoteResult<()>>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_refresh(&self, response: RemoteResult<HistoryList>) {
        self.refresh_responses.lock().await.push_back(response);
    }

    pub async fn push_remove(&self, response: RemoteResult<()>) {
        self.remove_responses.lock().await.push_back(response);
    }

    pub async fn push_logout(&self, response: RemoteResult<()>) {
        self.logout_responses.lock().await.push_back(response);
    }

    pub async fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl HistoryRemote for FakeRemote {
    async fn refresh_history(&self) -> RemoteResult<HistoryList> {
        self.calls.lock().await.push(RemoteCall::Refresh);
        self.refresh_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(RemoteStatus::Unknown))
    }

    async fn remove_from_history(&self, uuid: &str) -> RemoteResult<()> {
        self.calls.lock().await.push(RemoteCall::Remove(uuid.to_string()));
        self.remove_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(RemoteStatus::Unknown))
    }

    async fn logout(&self) -> RemoteResult<()> {
        self.calls.lock().await.push(RemoteCall::Logout);
        self.logout_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(RemoteStatus::Unknown))
    }
}
