//! 스토리지 에러 타입
//!
//! [`StoreError`]는 스토리지 크레이트 내부에서 발생하는 모든 에러를
//! 표현합니다. `From<StoreError> for LogvaultError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logvault_core::error::{LogvaultError, StorageError};

/// 스토리지 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite 엔진 에러
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// 데이터베이스 열기 실패
    #[error("failed to open database '{path}': {reason}")]
    Open { path: String, reason: String },

    /// 체인 다이제스트 검증 실패
    #[error("hmac chain broken at row {id}")]
    ChainBroken { id: i64 },
}

impl From<StoreError> for LogvaultError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Open { path, reason } => {
                LogvaultError::Storage(StorageError::Open { path, reason })
            }
            StoreError::ChainBroken { id } => {
                LogvaultError::Storage(StorageError::ChainBroken { id })
            }
            other => LogvaultError::Storage(StorageError::Query(other.to_string())),
        }
    }
}
