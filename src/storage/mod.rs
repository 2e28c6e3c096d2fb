//! Storage 모듈
//!
//! 현재 사용자 프로필(암호화)과 히스토리 목록(평문)을 로컬 문서 디렉토리에 영속화합니다.

pub mod fs;
pub mod store;

pub use fs::{DiskFileSystem, FileSystem, MemoryFileSystem};
pub use store::{LoadFailure, SecureStore};
