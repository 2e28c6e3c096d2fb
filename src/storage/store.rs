//! Secure Store - 암호화 프로필 + 히스토리 목록 영속화
//!
//! - 프로필: 저장할 때마다 새 키를 생성하여 암호화하고, 키는 계정(email) 이름으로 키체인에 저장
//! - 히스토리: `history.dat` 에 평문 JSON으로 원자적 저장
//! - 동시성: 하나의 RwLock 게이트로 읽기는 병렬, 쓰기는 배타적으로 처리
//!
//! 프로필 로드 실패 원인은 반환값으로 드러나지 않고 `last_load_failure()`로만 조회합니다.

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::config::{StorageConfig, CURRENT_USER_FILE_NAME, HISTORY_FILE_NAME};
use crate::dispatch::MainQueue;
use crate::error::{SaveError, StoreError};
use crate::models::{HistoryEntry, HistoryList, LoginCredential, UserProfile};
use crate::secrets::keychain::{KeyringSecretStore, SecretStore};
use crate::secrets::vault::{self, ProfileKey, VaultError};
use crate::storage::fs::{DiskFileSystem, FileSystem};

/// 프로필 로드 실패 원인 (진단 전용)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadFailure {
    #[error("account email cannot name a profile file")]
    InvalidAccount,

    #[error("no encryption key for account")]
    KeyMissing,

    #[error("key store lookup failed: {0}")]
    KeyStore(String),

    #[error("stored key is malformed")]
    InvalidKey,

    #[error("profile blob unreadable: {0}")]
    BlobRead(String),

    #[error("profile blob could not be decrypted: {0}")]
    Decrypt(String),

    #[error("profile could not be deserialized: {0}")]
    Deserialize(String),
}

impl From<VaultError> for LoadFailure {
    fn from(error: VaultError) -> Self {
        match error {
            VaultError::InvalidKey => LoadFailure::InvalidKey,
            VaultError::Serialization(e) => LoadFailure::Deserialize(e.to_string()),
            other => LoadFailure::Decrypt(other.to_string()),
        }
    }
}

/// 현재 사용자 마커
#[derive(Debug, Serialize, Deserialize)]
struct CurrentUserMarker {
    email: String,
}

/// 계정 이메일이 문서 디렉토리 안의 단일 파일 이름으로 쓰일 수 있는지 확인
///
/// 저장소가 직접 쓰는 파일 이름과 원자적 쓰기의 임시 파일 모양(`.*.tmp`)은 거부합니다.
fn is_valid_account_file_name(email: &str) -> bool {
    !email.is_empty()
        && email != "."
        && email != ".."
        && !email.contains(['/', '\\', '\0'])
        && email != HISTORY_FILE_NAME
        && email != CURRENT_USER_FILE_NAME
        && !(email.starts_with('.') && email.ends_with(".tmp"))
}

/// 사용자 프로필 / 히스토리 저장소
pub struct SecureStore {
    config: StorageConfig,
    fs: Arc<dyn FileSystem>,
    secrets: Arc<dyn SecretStore>,
    main_queue: MainQueue,
    /// 읽기 병렬 / 쓰기 배타 게이트
    gate: RwLock<()>,
    /// 마지막 프로필 로드 실패 원인
    last_load_failure: Mutex<Option<LoadFailure>>,
}

impl SecureStore {
    pub fn new(
        config: StorageConfig,
        fs: Arc<dyn FileSystem>,
        secrets: Arc<dyn SecretStore>,
        main_queue: MainQueue,
    ) -> Self {
        Self {
            config,
            fs,
            secrets,
            main_queue,
            gate: RwLock::new(()),
            last_load_failure: Mutex::new(None),
        }
    }

    /// 실제 디스크 + OS 키체인을 사용하는 저장소
    pub fn with_system_services(config: StorageConfig, main_queue: MainQueue) -> Self {
        let secrets = KeyringSecretStore::new(config.keychain_service.clone());
        Self::new(config, Arc::new(DiskFileSystem), Arc::new(secrets), main_queue)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    // =====================================
    // 프로필 읽기
    // =====================================

    /// 현재 사용자 프로필 로드
    ///
    /// 키 없음 / 파일 없음 / 복호화 실패 / 역직렬화 실패는 모두 `None`으로 수렴합니다.
    /// 원인은 `last_load_failure()`로 조회할 수 있습니다.
    pub async fn load_current_user(&self, credential: &LoginCredential) -> Option<UserProfile> {
        let result = {
            let _guard = self.gate.read().await;
            self.read_profile(credential.email.trim())
        };

        match result {
            Ok(profile) => {
                self.record_load_failure(None);
                debug!("[Store] Profile loaded");
                Some(profile)
            }
            Err(failure) => {
                match &failure {
                    LoadFailure::KeyMissing => debug!("[Store] No profile key for account"),
                    other => warn!("[Store] Profile load failed: {}", other),
                }
                self.record_load_failure(Some(failure));
                None
            }
        }
    }

    /// 마지막 프로필 로드 실패 원인 (성공 시 None으로 초기화)
    pub fn last_load_failure(&self) -> Option<LoadFailure> {
        self.last_load_failure
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
    }

    fn record_load_failure(&self, failure: Option<LoadFailure>) {
        if let Ok(mut slot) = self.last_load_failure.lock() {
            *slot = failure;
        }
    }

    fn read_profile(&self, email: &str) -> Result<UserProfile, LoadFailure> {
        if !is_valid_account_file_name(email) {
            return Err(LoadFailure::InvalidAccount);
        }

        let encoded = self
            .secrets
            .load(email)
            .map_err(|e| LoadFailure::KeyStore(e.to_string()))?
            .map(Zeroizing::new)
            .ok_or(LoadFailure::KeyMissing)?;

        let key = ProfileKey::from_encoded(&encoded)?;

        let blob = self
            .fs
            .read(&self.config.profile_path(email))
            .map_err(|e| LoadFailure::BlobRead(e.to_string()))?;

        Ok(vault::open_profile(&key, &blob)?)
    }

    /// 현재 사용자 마커에 기록된 계정 이메일
    pub async fn current_account(&self) -> Option<String> {
        let _guard = self.gate.read().await;
        let bytes = self.fs.read(&self.config.current_user_path()).ok()?;
        serde_json::from_slice::<CurrentUserMarker>(&bytes)
            .ok()
            .map(|marker| marker.email)
    }

    // =====================================
    // 프로필 저장
    // =====================================

    /// 현재 사용자 저장 (None이면 현재 사용자 마커 삭제)
    ///
    /// 저장은 백그라운드 태스크에서 쓰기 게이트를 잡고 수행되며,
    /// `completion`은 결과와 상관없이 항상 main 큐에서 호출됩니다.
    pub fn save_current_user<F>(
        self: &Arc<Self>,
        profile: Option<UserProfile>,
        completion: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<(), SaveError>) + Send + 'static,
    {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = store.commit_current_user(profile).await;
            store.main_queue.post(move || completion(outcome));
        })
    }

    /// 현재 사용자 저장 (완료까지 대기)
    pub async fn commit_current_user(&self, profile: Option<UserProfile>) -> Result<(), SaveError> {
        let _guard = self.gate.write().await;

        let Some(profile) = profile else {
            self.purge_current_user_marker();
            return Ok(());
        };

        let email = profile
            .account_email()
            .ok_or_else(|| {
                error!("[Store] Refusing to save profile without account email");
                SaveError::MissingAccountEmail
            })?
            .to_string();

        if !is_valid_account_file_name(&email) {
            error!("[Store] Refusing to save profile with unusable account email");
            return Err(SaveError::InvalidAccountEmail(email));
        }

        // 저장마다 키 교체
        let key = ProfileKey::generate();
        let blob = vault::seal_profile(&key, &profile)?;

        let path = self.config.profile_path(&email);
        let previous = match self.fs.read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(SaveError::Write(e)),
        };

        self.fs.write_atomic(&path, &blob)?;

        let encoded = Zeroizing::new(key.encode());
        if let Err(e) = self.secrets.store(&email, &encoded) {
            error!("[Store] Failed to store profile key: {}", e);
            self.restore_profile_blob(&path, previous);
            return Err(SaveError::KeyStore(e));
        }

        // blob과 키는 이미 커밋됨. 마커는 보조 정보라 실패해도 저장은 성공
        if let Err(e) = self.write_current_user_marker(&email) {
            warn!("[Store] Failed to write current user marker: {}", e);
        }

        info!("[Store] Profile saved");
        Ok(())
    }

    /// 키 저장 실패 시 이전 blob으로 되돌려 기존 키로 계속 열 수 있게 함
    fn restore_profile_blob(&self, path: &Path, previous: Option<Vec<u8>>) {
        let result = match previous {
            Some(bytes) => self.fs.write_atomic(path, &bytes),
            None => self.fs.remove(path),
        };

        if let Err(e) = result {
            error!("[Store] Failed to roll back profile blob: {}", e);
        }
    }

    fn write_current_user_marker(&self, email: &str) -> Result<(), SaveError> {
        let marker = CurrentUserMarker {
            email: email.to_string(),
        };
        let data =
            serde_json::to_vec(&marker).map_err(|e| SaveError::Serialization(e.to_string()))?;
        self.fs.write_atomic(&self.config.current_user_path(), &data)?;
        Ok(())
    }

    fn purge_current_user_marker(&self) {
        match self.fs.remove(&self.config.current_user_path()) {
            Ok(()) => info!("[Store] Current user purged"),
            Err(e) => warn!("[Store] Failed to purge current user marker: {}", e),
        }
    }

    // =====================================
    // 히스토리
    // =====================================

    /// 히스토리 목록 로드. 파일이 없거나 손상되었으면 빈 목록.
    pub async fn load_history_list(&self) -> HistoryList {
        let path = self.config.history_path();
        let bytes = {
            let _guard = self.gate.read().await;
            self.fs.read(&path)
        };

        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("[Store] No history file, starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!("[Store] Failed to read history: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_slice::<HistoryList>(&bytes) {
            Ok(list) => {
                debug!("[Store] History loaded, {} entries", list.len());
                list
            }
            Err(e) => {
                warn!("[Store] Malformed history file ignored: {}", e);
                Vec::new()
            }
        }
    }

    /// 히스토리 목록을 원자적으로 덮어쓰기
    ///
    /// 반환 시점에 쓰기가 완료되어 있습니다. 쓰기 실패는 복구 불가 에러입니다.
    pub async fn save_history_list(&self, list: &[HistoryEntry]) -> Result<(), StoreError> {
        let data = serde_json::to_vec(list)?;
        let path = self.config.history_path();

        let _guard = self.gate.write().await;
        self.fs.write_atomic(&path, &data).map_err(|e| {
            error!("[Store] History write failed: {}", e);
            StoreError::HistoryWrite(e)
        })?;

        debug!("[Store] History saved, {} entries", list.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{main_queue, MainQueueRunner};
    use crate::error::SaveFailureCause;
    use crate::models::{ContactCard, RegistrationInfo};
    use crate::secrets::keychain::MemorySecretStore;
    use crate::storage::fs::MemoryFileSystem;
    use std::time::Duration;

    const EMAIL: &str = "jo@example.com";

    struct Harness {
        store: Arc<SecureStore>,
        fs: Arc<MemoryFileSystem>,
        secrets: Arc<MemorySecretStore>,
        runner: MainQueueRunner,
    }

    fn harness() -> Harness {
        let fs = Arc::new(MemoryFileSystem::new());
        let secrets = Arc::new(MemorySecretStore::new());
        let (queue, runner) = main_queue();
        let store = Arc::new(SecureStore::new(
            StorageConfig::new("/docs"),
            fs.clone(),
            secrets.clone(),
            queue,
        ));
        Harness {
            store,
            fs,
            secrets,
            runner,
        }
    }

    fn profile(email: Option<&str>, first_name: &str) -> UserProfile {
        let mut profile = UserProfile {
            registration_information: Some(RegistrationInfo {
                email: email.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        };
        profile.info_types.uuid = Some("me-1".to_string());
        profile.info_types.basic.first_name = Some(first_name.to_string());
        profile.info_types.developer.github = Some("jo".to_string());
        profile
    }

    fn credential() -> LoginCredential {
        LoginCredential::new(EMAIL, "whatever the user typed")
    }

    fn entry(uuid: &str, name: &str) -> ContactCard {
        let mut card = ContactCard {
            uuid: Some(uuid.to_string()),
            ..Default::default()
        };
        card.basic.first_name = Some(name.to_string());
        card
    }

    #[tokio::test]
    async fn test_profile_roundtrip() {
        let h = harness();
        let original = profile(Some(EMAIL), "Jo");

        h.store.commit_current_user(Some(original.clone())).await.unwrap();

        let loaded = h.store.load_current_user(&credential()).await;
        assert_eq!(loaded, Some(original));
        assert_eq!(h.store.last_load_failure(), None);
        assert_eq!(h.store.current_account().await.as_deref(), Some(EMAIL));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let h = harness();

        assert_eq!(h.store.load_current_user(&credential()).await, None);
        assert_eq!(h.store.last_load_failure(), Some(LoadFailure::KeyMissing));
    }

    #[tokio::test]
    async fn test_wrong_key_is_not_found() {
        let h = harness();
        h.store
            .commit_current_user(Some(profile(Some(EMAIL), "Jo")))
            .await
            .unwrap();

        // 다른 유효한 키로 교체
        h.secrets
            .store(EMAIL, &ProfileKey::generate().encode())
            .unwrap();

        assert_eq!(h.store.load_current_user(&credential()).await, None);
        assert!(matches!(
            h.store.last_load_failure(),
            Some(LoadFailure::Decrypt(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_key_and_corrupt_blob_are_not_found() {
        let h = harness();
        h.store
            .commit_current_user(Some(profile(Some(EMAIL), "Jo")))
            .await
            .unwrap();

        h.fs.insert("/docs/jo@example.com", b"garbage".to_vec());
        assert_eq!(h.store.load_current_user(&credential()).await, None);
        assert!(matches!(
            h.store.last_load_failure(),
            Some(LoadFailure::Decrypt(_))
        ));

        h.secrets.store(EMAIL, "not-a-key").unwrap();
        assert_eq!(h.store.load_current_user(&credential()).await, None);
        assert_eq!(h.store.last_load_failure(), Some(LoadFailure::InvalidKey));
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let h = harness();
        h.secrets
            .store(EMAIL, &ProfileKey::generate().encode())
            .unwrap();

        assert_eq!(h.store.load_current_user(&credential()).await, None);
        assert!(matches!(
            h.store.last_load_failure(),
            Some(LoadFailure::BlobRead(_))
        ));
    }

    #[tokio::test]
    async fn test_every_save_rotates_key() {
        let h = harness();
        let path = Path::new("/docs/jo@example.com");

        h.store
            .commit_current_user(Some(profile(Some(EMAIL), "Jo")))
            .await
            .unwrap();
        let first_key = h.secrets.load(EMAIL).unwrap().unwrap();
        let first_blob = h.fs.read(path).unwrap();

        h.store
            .commit_current_user(Some(profile(Some(EMAIL), "Joanna")))
            .await
            .unwrap();
        let second_key = h.secrets.load(EMAIL).unwrap().unwrap();
        assert_ne!(first_key, second_key);

        // 이전 blob은 새 키로 열 수 없음
        let key = ProfileKey::from_encoded(&second_key).unwrap();
        assert!(vault::open_profile(&key, &first_blob).is_err());

        let loaded = h.store.load_current_user(&credential()).await.unwrap();
        assert_eq!(loaded.info_types.basic.first_name.as_deref(), Some("Joanna"));
    }

    #[tokio::test]
    async fn test_key_store_failure_keeps_previous_profile_readable() {
        let h = harness();
        let original = profile(Some(EMAIL), "Jo");
        h.store.commit_current_user(Some(original.clone())).await.unwrap();

        h.secrets.set_fail_writes(true);
        let err = h
            .store
            .commit_current_user(Some(profile(Some(EMAIL), "Changed")))
            .await
            .unwrap_err();
        assert_eq!(err.cause(), Some(SaveFailureCause::KeyStore));

        assert_eq!(h.store.load_current_user(&credential()).await, Some(original));
    }

    #[tokio::test]
    async fn test_key_store_failure_on_first_save_leaves_no_blob() {
        let h = harness();
        h.secrets.set_fail_writes(true);

        let err = h
            .store
            .commit_current_user(Some(profile(Some(EMAIL), "Jo")))
            .await
            .unwrap_err();
        assert_eq!(err.cause(), Some(SaveFailureCause::KeyStore));
        assert!(!h.fs.contains(Path::new("/docs/jo@example.com")));
        assert_eq!(h.store.current_account().await, None);
    }

    #[tokio::test]
    async fn test_write_failure_reports_write_cause() {
        let h = harness();
        h.fs.set_fail_writes(true);

        let err = h
            .store
            .commit_current_user(Some(profile(Some(EMAIL), "Jo")))
            .await
            .unwrap_err();
        assert_eq!(err.cause(), Some(SaveFailureCause::Write));
        assert_eq!(h.secrets.load(EMAIL).unwrap(), None);
    }

    #[tokio::test]
    async fn test_profile_without_email_is_unrecoverable() {
        let h = harness();

        let err = h
            .store
            .commit_current_user(Some(profile(None, "Jo")))
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::MissingAccountEmail));
        assert!(err.is_unrecoverable());

        let err = h
            .store
            .commit_current_user(Some(profile(Some("../escape"), "Jo")))
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::InvalidAccountEmail(_)));
        assert!(!h.fs.contains(Path::new("/docs/../escape")));
    }

    #[tokio::test]
    async fn test_reserved_file_names_are_not_accounts() {
        let h = harness();
        h.store.save_history_list(&[entry("a1", "Jo")]).await.unwrap();

        for email in ["history.dat", "current.json", ".jo.0000.tmp"] {
            let err = h
                .store
                .commit_current_user(Some(profile(Some(email), "Jo")))
                .await
                .unwrap_err();
            assert!(matches!(err, SaveError::InvalidAccountEmail(_)), "{email}");
            assert!(err.is_unrecoverable());
            assert_eq!(h.secrets.load(email).unwrap(), None);
        }

        assert_eq!(h.store.load_history_list().await, vec![entry("a1", "Jo")]);
        assert_eq!(h.store.current_account().await, None);
    }

    /// 현재 사용자 마커 쓰기만 실패하는 파일 시스템
    struct MarkerFailFileSystem {
        inner: MemoryFileSystem,
    }

    impl FileSystem for MarkerFailFileSystem {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.inner.read(path)
        }

        fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()> {
            if path.ends_with(CURRENT_USER_FILE_NAME) {
                return Err(io::Error::new(io::ErrorKind::Other, "marker write refused"));
            }
            self.inner.write_atomic(path, data)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            self.inner.remove(path)
        }
    }

    #[tokio::test]
    async fn test_marker_write_failure_does_not_fail_committed_save() {
        let (queue, _runner) = main_queue();
        let store = SecureStore::new(
            StorageConfig::new("/docs"),
            Arc::new(MarkerFailFileSystem {
                inner: MemoryFileSystem::new(),
            }),
            Arc::new(MemorySecretStore::new()),
            queue,
        );

        let saved = profile(Some(EMAIL), "New");
        store.commit_current_user(Some(saved.clone())).await.unwrap();

        assert_eq!(store.load_current_user(&credential()).await, Some(saved));
        assert_eq!(store.current_account().await, None);
    }

    #[tokio::test]
    async fn test_save_none_purges_current_user() {
        let h = harness();
        h.store
            .commit_current_user(Some(profile(Some(EMAIL), "Jo")))
            .await
            .unwrap();
        assert!(h.store.current_account().await.is_some());

        h.store.commit_current_user(None).await.unwrap();
        assert_eq!(h.store.current_account().await, None);

        // 키는 파기하지 않음: 같은 계정으로 다시 로그인하면 프로필을 열 수 있음
        assert!(h.secrets.load(EMAIL).unwrap().is_some());
        assert!(h.store.load_current_user(&credential()).await.is_some());
    }

    #[tokio::test]
    async fn test_save_completion_delivered_on_main_queue() {
        let mut h = harness();
        let outcome = Arc::new(Mutex::new(None));

        let slot = outcome.clone();
        h.store
            .save_current_user(Some(profile(Some(EMAIL), "Jo")), move |result| {
                *slot.lock().unwrap() = Some(result.is_ok());
            })
            .await
            .unwrap();

        // main 큐가 돌기 전에는 콜백이 실행되지 않음
        assert_eq!(*outcome.lock().unwrap(), None);
        assert_eq!(h.runner.run_pending(), 1);
        assert_eq!(*outcome.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_save_failure_completion_carries_cause() {
        let mut h = harness();
        let outcome = Arc::new(Mutex::new(None));

        let slot = outcome.clone();
        h.store
            .save_current_user(Some(profile(None, "Jo")), move |result| {
                *slot.lock().unwrap() = Some(result.is_err());
            })
            .await
            .unwrap();

        assert_eq!(h.runner.run_pending(), 1);
        assert_eq!(*outcome.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_history_roundtrip_including_empty() {
        let h = harness();
        let list = vec![entry("a1", "Jo"), entry("b2", "Sam"), ContactCard::default()];

        h.store.save_history_list(&list).await.unwrap();
        assert_eq!(h.store.load_history_list().await, list);

        h.store.save_history_list(&[]).await.unwrap();
        assert_eq!(h.store.load_history_list().await, Vec::<ContactCard>::new());
        assert_eq!(h.fs.read(Path::new("/docs/history.dat")).unwrap(), b"[]");
    }

    #[tokio::test]
    async fn test_history_missing_or_malformed_is_empty() {
        let h = harness();
        assert!(h.store.load_history_list().await.is_empty());

        h.fs.insert("/docs/history.dat", b"{not json".to_vec());
        assert!(h.store.load_history_list().await.is_empty());

        h.fs.insert("/docs/history.dat", vec![0xff, 0xfe, 0x00]);
        assert!(h.store.load_history_list().await.is_empty());
    }

    #[tokio::test]
    async fn test_history_file_scenario() {
        let h = harness();
        h.fs.insert(
            "/docs/history.dat",
            br#"[{"uuid":"a1","basic":{"firstName":"Jo"}}]"#.to_vec(),
        );

        let list = h.store.load_history_list().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].uuid.as_deref(), Some("a1"));
        assert_eq!(list[0].basic.first_name.as_deref(), Some("Jo"));
    }

    #[tokio::test]
    async fn test_history_write_failure_is_unrecoverable() {
        let h = harness();
        h.store.save_history_list(&[entry("a1", "Jo")]).await.unwrap();

        h.fs.set_fail_writes(true);
        let err = h
            .store
            .save_history_list(&[entry("b2", "Sam")])
            .await
            .unwrap_err();
        assert!(err.is_unrecoverable());

        // 이전 내용은 그대로
        assert_eq!(h.store.load_history_list().await, vec![entry("a1", "Jo")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_profile_reads_are_consistent() {
        let h = harness();
        let original = profile(Some(EMAIL), "Jo");
        h.store.commit_current_user(Some(original.clone())).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = h.store.clone();
                tokio::spawn(async move { store.load_current_user(&credential()).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Some(original.clone()));
        }
    }

    /// write_atomic 진입 후 해제 신호가 올 때까지 멈추는 파일 시스템
    struct GatedFileSystem {
        inner: MemoryFileSystem,
        entered: Mutex<std::sync::mpsc::Sender<()>>,
        release: Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl FileSystem for GatedFileSystem {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.inner.read(path)
        }

        fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
            self.inner.write_atomic(path, data)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            self.inner.remove(path)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_write_in_progress_excludes_reads() {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let fs = Arc::new(GatedFileSystem {
            inner: MemoryFileSystem::new(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        fs.inner.insert(
            "/docs/history.dat",
            serde_json::to_vec(&vec![entry("old", "Old")]).unwrap(),
        );

        let (queue, _runner) = main_queue();
        let store = Arc::new(SecureStore::new(
            StorageConfig::new("/docs"),
            fs,
            Arc::new(MemorySecretStore::new()),
            queue,
        ));

        let writer = {
            let store = store.clone();
            tokio::spawn(async move { store.save_history_list(&[entry("new", "New")]).await })
        };

        // writer가 게이트를 잡고 쓰기 도중일 때까지 대기
        tokio::task::spawn_blocking(move || entered_rx.recv())
            .await
            .unwrap()
            .unwrap();

        let mut reader = {
            let store = store.clone();
            tokio::spawn(async move { store.load_history_list().await })
        };

        assert!(tokio::time::timeout(Duration::from_millis(100), &mut reader)
            .await
            .is_err());

        release_tx.send(()).unwrap();
        writer.await.unwrap().unwrap();

        let seen = reader.await.unwrap();
        assert_eq!(seen, vec![entry("new", "New")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_profile_save_in_progress_excludes_loads() {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let fs = Arc::new(GatedFileSystem {
            inner: MemoryFileSystem::new(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });

        let (queue, _runner) = main_queue();
        let store = Arc::new(SecureStore::new(
            StorageConfig::new("/docs"),
            fs,
            Arc::new(MemorySecretStore::new()),
            queue,
        ));

        let saved = profile(Some(EMAIL), "New");
        let writer = {
            let store = store.clone();
            let saved = saved.clone();
            tokio::spawn(async move { store.commit_current_user(Some(saved)).await })
        };

        // blob 쓰기 도중 (키는 아직 저장 전)
        let entered_rx = tokio::task::spawn_blocking(move || {
            entered_rx.recv().map(|_| entered_rx)
        })
        .await
        .unwrap()
        .unwrap();

        let mut reader = {
            let store = store.clone();
            tokio::spawn(async move { store.load_current_user(&credential()).await })
        };

        assert!(tokio::time::timeout(Duration::from_millis(100), &mut reader)
            .await
            .is_err());

        // blob 쓰기 + 마커 쓰기
        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();
        writer.await.unwrap().unwrap();
        drop(entered_rx);

        assert_eq!(reader.await.unwrap(), Some(saved));
    }
}
