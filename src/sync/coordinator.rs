//! History Sync Coordinator
//!
//! 메모리상의 히스토리 목록을 원격 기준 데이터와 맞추고, 결과를 저장소에 반영합니다.
//!
//! - refresh: 성공 시 목록 전체 교체 + 저장, 실패 시 아무것도 바꾸지 않음
//! - delete: 원격 삭제 후 메모리에서는 항상 제거, 저장은 원격 성공 시에만
//!   (원격 실패 시 메모리와 파일이 다음 refresh 전까지 어긋남)
//! - 겹치는 호출은 서로 조정하지 않음 (single-flight 아님)

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::models::{HistoryEntry, HistoryList};
use crate::storage::SecureStore;
use crate::sync::remote::{HistoryRemote, RemoteStatus};

/// 삭제 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// uuid가 없어 원격 삭제 불가. 목록 변경 없음.
    Skipped,
    /// 원격 삭제 성공, 메모리 + 파일 모두 반영
    Removed,
    /// 원격 삭제 실패, 메모리에서만 제거됨
    RemovedLocally(RemoteStatus),
}

pub struct HistorySyncCoordinator {
    store: Arc<SecureStore>,
    remote: Arc<dyn HistoryRemote>,
    entries: RwLock<HistoryList>,
}

impl HistorySyncCoordinator {
    /// 저장된 히스토리를 초기 상태로 로드하여 생성
    pub async fn open(store: Arc<SecureStore>, remote: Arc<dyn HistoryRemote>) -> Self {
        let entries = store.load_history_list().await;
        info!("[Sync] Opened with {} history entries", entries.len());
        Self {
            store,
            remote,
            entries: RwLock::new(entries),
        }
    }

    /// 현재 메모리 목록 스냅샷
    pub async fn entries(&self) -> HistoryList {
        self.entries.read().await.clone()
    }

    pub async fn entry(&self, index: usize) -> Option<HistoryEntry> {
        self.entries.read().await.get(index).cloned()
    }

    /// 디스크에서 다시 읽어 메모리 목록 교체 (화면 재진입 시)
    pub async fn reload(&self) -> HistoryList {
        let loaded = self.store.load_history_list().await;
        let mut entries = self.entries.write().await;
        *entries = loaded.clone();
        loaded
    }

    /// 원격에서 전체 히스토리를 받아 교체
    ///
    /// 실패 시 메모리 목록은 호출 전과 동일하며, 반환되는 목록도 그 목록입니다.
    pub async fn refresh(&self) -> (HistoryList, Result<(), SyncError>) {
        let fetched = match self.remote.refresh_history().await {
            Ok(list) => list,
            Err(status) => {
                warn!("[Sync] Refresh failed: {}", status);
                return (self.entries().await, Err(SyncError::Remote(status)));
            }
        };

        let mut entries = self.entries.write().await;
        if let Err(e) = self.store.save_history_list(&fetched).await {
            return (entries.clone(), Err(e.into()));
        }
        *entries = fetched;

        info!("[Sync] Refreshed, {} entries", entries.len());
        (entries.clone(), Ok(()))
    }

    /// index 위치의 항목 삭제
    pub async fn delete(&self, index: usize) -> Result<DeleteOutcome, SyncError> {
        let uuid = {
            let entries = self.entries.read().await;
            let entry = entries.get(index).ok_or(SyncError::NoSuchEntry(index))?;
            match entry.resolved_uuid() {
                Some(uuid) => uuid.to_string(),
                None => {
                    debug!("[Sync] Entry {} has no uuid, nothing to delete", index);
                    return Ok(DeleteOutcome::Skipped);
                }
            }
        };

        let remote_result = self.remote.remove_from_history(&uuid).await;

        let mut entries = self.entries.write().await;
        remove_entry(&mut entries, index, &uuid);

        match remote_result {
            Ok(()) => {
                self.store.save_history_list(&entries).await?;
                debug!("[Sync] Entry removed, {} remaining", entries.len());
                Ok(DeleteOutcome::Removed)
            }
            Err(status) => {
                warn!(
                    "[Sync] Remote delete failed ({}), removed in memory only",
                    status
                );
                Ok(DeleteOutcome::RemovedLocally(status))
            }
        }
    }

    /// 원격 로그아웃 후 현재 사용자 마커와 히스토리 목록 정리
    ///
    /// 원격 실패 시 로컬 상태는 그대로 둡니다.
    pub async fn logout(&self) -> Result<(), SyncError> {
        if let Err(status) = self.remote.logout().await {
            warn!("[Sync] Logout failed: {}", status);
            return Err(SyncError::Remote(status));
        }

        self.store.commit_current_user(None).await?;

        let mut entries = self.entries.write().await;
        entries.clear();
        self.store.save_history_list(&entries).await?;

        info!("[Sync] Logged out, history cleared");
        Ok(())
    }
}

/// 원격 호출 동안 목록이 바뀌었을 수 있으므로 index의 uuid가 일치할 때만 그 위치를 지우고,
/// 아니면 같은 uuid의 첫 항목을 지움
fn remove_entry(entries: &mut HistoryList, index: usize, uuid: &str) {
    let position = if entries.get(index).and_then(|e| e.resolved_uuid()) == Some(uuid) {
        Some(index)
    } else {
        entries.iter().position(|e| e.resolved_uuid() == Some(uuid))
    };

    match position {
        Some(position) => {
            entries.remove(position);
        }
        None => debug!("[Sync] Entry already gone from memory"),
    }
}
