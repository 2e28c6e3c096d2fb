//! Sync 모듈
//!
//! 원격 히스토리와 로컬 히스토리를 맞추는 코디네이터와 원격 협력자 trait

pub mod coordinator;
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{DeleteOutcome, HistorySyncCoordinator};
pub use remote::{HistoryRemote, RemoteResult, RemoteStatus};
