#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`store`]: SQLite 로그 스토어 (스키마, 삽입, 범위 조회, 체인 검증)
//! - [`chain`]: 행 단위 SHA-256 XOR 체인 다이제스트
//! - [`queue`]: 크기/시간 트리거 배치 쓰기 큐
//! - [`error`]: 도메인 에러 타입
//!
//! # 데이터 흐름
//!
//! ```text
//! 수신기 -> WriteQueue.enqueue -> (크기/시간 트리거) -> LogStore.insert_batch
//!                                                          |
//!                                                 트랜잭션 + 체인 다이제스트
//! ```

pub mod chain;
pub mod error;
pub mod queue;
pub mod store;

// --- 주요 타입 re-export ---

pub use chain::{DIGEST_LEN, ZERO_DIGEST, chain_digest};
pub use error::StoreError;
pub use queue::WriteQueue;
pub use store::LogStore;
