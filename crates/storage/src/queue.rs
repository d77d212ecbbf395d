//! 쓰기 큐 — 배치 삽입을 위한 스테이징 버퍼
//!
//! [`WriteQueue`]는 수신기가 생성한 [`LogEntry`]를 인메모리에 모아
//! 크기 또는 시간 트리거로 [`LogStore::insert_batch`]에 전달합니다.
//!
//! # 플러시 정책
//! - `enqueue` 시 버퍼 길이가 `batch_size` 이상이면 락을 쥔 채 즉시 플러시
//! - `try_flush`는 마지막 플러시 후 `flush_interval`이 경과했거나
//!   크기 조건이 충족된 경우에만 플러시
//! - 실패한 배치는 재적재하지 않습니다 (전체 롤백 후 드롭)
//!
//! 플러시 타이밍은 단조 시계([`Instant`])를, 레코드 타임스탬프는
//! 벽시계를 사용합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::sync::Mutex;
use tokio::time::Instant;

use logvault_core::metrics as m;
use logvault_core::types::LogEntry;

use crate::error::StoreError;
use crate::store::LogStore;

/// 배치 쓰기 큐
///
/// 모든 메서드는 내부 mutex로 직렬화되므로 여러 수신기 태스크가
/// 동시에 `enqueue`해도 안전합니다. 용량 상한은 없으며, 스토리지가
/// 뒤처지는 경우의 배압은 호출자 몫입니다.
pub struct WriteQueue {
    store: Arc<Mutex<LogStore>>,
    inner: Mutex<QueueInner>,
    batch_size: usize,
    flush_interval: Duration,
    flushed_total: AtomicU64,
    batch_count: AtomicU64,
}

struct QueueInner {
    entries: Vec<LogEntry>,
    last_flush: Instant,
}

impl WriteQueue {
    /// 새 쓰기 큐를 생성합니다.
    pub fn new(store: Arc<Mutex<LogStore>>, batch_size: usize, flush_interval: Duration) -> Self {
        // batch_size 0은 엔트리마다 플러시하게 되므로 최소 1로 보정
        let batch_size = batch_size.max(1);
        Self {
            store,
            inner: Mutex::new(QueueInner {
                entries: Vec::with_capacity(batch_size.min(10_000)),
                last_flush: Instant::now(),
            }),
            batch_size,
            flush_interval,
            flushed_total: AtomicU64::new(0),
            batch_count: AtomicU64::new(0),
        }
    }

    /// 공유 스토어 핸들을 반환합니다.
    pub fn store(&self) -> Arc<Mutex<LogStore>> {
        Arc::clone(&self.store)
    }

    /// 엔트리를 큐에 추가합니다.
    ///
    /// 버퍼가 `batch_size`에 도달하면 락을 쥔 채 즉시 플러시하며,
    /// 이번 호출로 플러시된 행 수를 반환합니다 (플러시가 없으면 0).
    pub async fn enqueue(&self, entry: LogEntry) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.entries.push(entry);
        gauge!(m::QUEUE_DEPTH).set(inner.entries.len() as f64);

        if inner.entries.len() >= self.batch_size {
            return self.flush_locked(&mut inner).await;
        }
        Ok(0)
    }

    /// 엔트리 여러 개를 한 번에 추가합니다.
    pub async fn enqueue_batch(&self, entries: Vec<LogEntry>) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.entries.extend(entries);
        gauge!(m::QUEUE_DEPTH).set(inner.entries.len() as f64);

        if inner.entries.len() >= self.batch_size {
            return self.flush_locked(&mut inner).await;
        }
        Ok(0)
    }

    /// 플러시 조건 충족 여부를 확인합니다.
    ///
    /// 마지막 플러시 후 `flush_interval`이 경과했거나 버퍼 길이가
    /// `batch_size` 이상이면 `true`입니다.
    pub async fn should_flush(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.last_flush.elapsed() >= self.flush_interval
            || inner.entries.len() >= self.batch_size
    }

    /// 플러시 조건이 충족된 경우에만 플러시합니다.
    pub async fn try_flush(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.last_flush.elapsed() >= self.flush_interval
            || inner.entries.len() >= self.batch_size
        {
            return self.flush_locked(&mut inner).await;
        }
        Ok(0)
    }

    /// 무조건 플러시합니다. 기록된 행 수를 반환합니다.
    pub async fn flush(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        self.flush_locked(&mut inner).await
    }

    /// [`flush`](Self::flush)와 동일하며, 종료 경로에서 호출됩니다.
    pub async fn force_flush(&self) -> Result<usize, StoreError> {
        self.flush().await
    }

    /// 현재 큐에 대기 중인 엔트리 수를 반환합니다.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// 큐가 비어있는지 확인합니다.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    /// 지금까지 영속화된 행 수를 반환합니다.
    pub fn flushed_total(&self) -> u64 {
        self.flushed_total.load(Ordering::SeqCst)
    }

    /// 지금까지 커밋된 배치 수를 반환합니다.
    pub fn batch_count(&self) -> u64 {
        self.batch_count.load(Ordering::SeqCst)
    }

    async fn flush_locked(&self, inner: &mut QueueInner) -> Result<usize, StoreError> {
        inner.last_flush = Instant::now();
        if inner.entries.is_empty() {
            return Ok(0);
        }

        let result = {
            let mut store = self.store.lock().await;
            store.insert_batch(&inner.entries)
        };

        // 성공/실패와 무관하게 버퍼를 비움 (용량은 유지).
        // 실패한 배치는 전체 롤백되며 재적재하지 않는다.
        inner.entries.clear();
        gauge!(m::QUEUE_DEPTH).set(0.0);

        match result {
            Ok(written) => {
                self.flushed_total.fetch_add(written as u64, Ordering::SeqCst);
                self.batch_count.fetch_add(1, Ordering::SeqCst);
                counter!(m::STORAGE_ROWS_WRITTEN_TOTAL).increment(written as u64);
                counter!(m::QUEUE_BATCHES_FLUSHED_TOTAL).increment(1);
                tracing::debug!(written, "flushed batch to storage");
                Ok(written)
            }
            Err(e) => {
                tracing::error!(error = %e, "batch flush failed, entries dropped");
                Err(e)
            }
        }
    }
}
