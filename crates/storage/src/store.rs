//! 로그 스토어 — SQLite 기반 영속 저장소
//!
//! [`LogStore`]는 로그 행을 SQLite에 영속화하면서 행마다 체인
//! 다이제스트를 유지합니다. 스키마는 열 때 멱등적으로 생성되며,
//! 재시작 시 마지막 행의 다이제스트를 읽어 체인을 이어갑니다.
//!
//! # 동시성
//! `LogStore`는 내부적으로 단일 연결을 소유하며 `Sync`가 아닙니다.
//! 여러 태스크에서 사용할 때는 `Arc<tokio::sync::Mutex<LogStore>>`로
//! 감싸 직렬화합니다. 체인 다이제스트의 선형성은 이 직렬화에
//! 의존합니다.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};

use logvault_core::types::{Level, LogEntry, LogSource};

use crate::chain::{DIGEST_LEN, ZERO_DIGEST, chain_digest};
use crate::error::StoreError;

/// 스키마 DDL — 열 때마다 멱등 적용됩니다.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS logs (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp  INTEGER NOT NULL,
    level      INTEGER NOT NULL,
    source     INTEGER NOT NULL,
    host       TEXT NOT NULL,
    facility   INTEGER,
    app_name   TEXT,
    proc_id    TEXT,
    msg_id     TEXT,
    message    TEXT NOT NULL,
    raw_data   BLOB NOT NULL,
    hmac       BLOB NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
);
CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp);
CREATE INDEX IF NOT EXISTS idx_logs_level     ON logs(level);
CREATE INDEX IF NOT EXISTS idx_logs_source    ON logs(source);
CREATE INDEX IF NOT EXISTS idx_logs_host      ON logs(host);
CREATE INDEX IF NOT EXISTS idx_logs_app_name  ON logs(app_name);
";

const INSERT_SQL: &str = "
INSERT INTO logs (timestamp, level, source, host, facility, app_name, proc_id, msg_id, message, raw_data, hmac)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

const SELECT_COLS: &str =
    "id, timestamp, level, source, host, facility, app_name, proc_id, msg_id, message, raw_data, hmac";

/// SQLite 로그 스토어
///
/// 단일 연결과 직전 행의 체인 다이제스트를 소유합니다.
pub struct LogStore {
    conn: Connection,
    prev_hmac: [u8; DIGEST_LEN],
}

impl LogStore {
    /// 파일 경로의 데이터베이스를 열고 스키마를 적용합니다.
    ///
    /// WAL 저널 모드, synchronous=NORMAL, 5초 busy timeout을 설정한 뒤
    /// 마지막 행에서 체인 다이제스트를 복원합니다.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_display = path.as_ref().display().to_string();
        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path_display,
            reason: e.to_string(),
        })?;
        Self::init(conn)
    }

    /// 인메모리 데이터베이스를 엽니다 (테스트용).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: ":memory:".to_owned(),
            reason: e.to_string(),
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        // journal_mode pragma는 결과 행을 반환하므로 query_row로 실행
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_millis(5_000))?;
        conn.execute_batch(SCHEMA_SQL)?;

        let prev_hmac = load_chain_tip(&conn);

        Ok(Self { conn, prev_hmac })
    }

    /// 엔트리 하나를 삽입하고 부여된 행 ID를 반환합니다.
    pub fn insert(&mut self, entry: &LogEntry) -> Result<i64, StoreError> {
        insert_row(&self.conn, &mut self.prev_hmac, entry)
    }

    /// 엔트리 배치를 단일 트랜잭션으로 삽입합니다.
    ///
    /// 하나라도 실패하면 전체가 롤백되고 체인 상태는 변하지 않습니다.
    /// 성공적으로 기록된 행 수를 반환합니다.
    pub fn insert_batch(&mut self, entries: &[LogEntry]) -> Result<usize, StoreError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut prev = self.prev_hmac;
        let tx = self.conn.transaction()?;
        let mut written = 0usize;
        for entry in entries {
            insert_row(&tx, &mut prev, entry)?;
            written += 1;
        }
        tx.commit()?;

        self.prev_hmac = prev;
        Ok(written)
    }

    /// 저장된 전체 행 수를 반환합니다.
    pub fn count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 타임스탬프 범위로 조회합니다 (최신순, limit 적용).
    ///
    /// 반환되는 엔트리의 텍스트/BLOB 열은 모두 복사본입니다.
    pub fn query_by_time_range(
        &self,
        from: i64,
        to: i64,
        limit: usize,
    ) -> Result<Vec<LogEntry>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM logs \
             WHERE timestamp BETWEEN ?1 AND ?2 \
             ORDER BY timestamp DESC LIMIT ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![from, to, limit as i64], row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 전체 체인을 처음부터 재계산하여 검증합니다.
    ///
    /// 검증된 행 수를 반환하며, 불일치가 발견되면 해당 행 ID와 함께
    /// `ChainBroken`을 반환합니다.
    pub fn verify_chain(&self) -> Result<u64, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, raw_data, hmac FROM logs ORDER BY id ASC")?;
        let mut rows = stmt.query([])?;

        let mut prev = ZERO_DIGEST;
        let mut verified = 0u64;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let raw: Vec<u8> = row.get(1)?;
            let stored: Vec<u8> = row.get(2)?;

            let expected = chain_digest(&raw, id, &prev);
            if stored != expected {
                return Err(StoreError::ChainBroken { id });
            }
            prev = expected;
            verified += 1;
        }
        Ok(verified)
    }

    /// 현재 체인 끝 다이제스트를 반환합니다.
    pub fn chain_tip(&self) -> [u8; DIGEST_LEN] {
        self.prev_hmac
    }
}

/// 마지막 행에서 체인 다이제스트를 복원합니다.
///
/// 행이 없거나 hmac 열이 손상된 경우 체인 시작(0)으로 취급합니다.
fn load_chain_tip(conn: &Connection) -> [u8; DIGEST_LEN] {
    let tip: Result<Option<Vec<u8>>, _> = conn
        .query_row(
            "SELECT hmac FROM logs ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional();

    match tip {
        Ok(Some(bytes)) if bytes.len() == DIGEST_LEN => {
            let mut digest = [0u8; DIGEST_LEN];
            digest.copy_from_slice(&bytes);
            digest
        }
        Ok(Some(bytes)) => {
            tracing::warn!(
                len = bytes.len(),
                "last row has malformed hmac, restarting chain from zero"
            );
            ZERO_DIGEST
        }
        Ok(None) => ZERO_DIGEST,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load chain tip, restarting chain from zero");
            ZERO_DIGEST
        }
    }
}

/// 행 하나를 삽입하고 체인 상태를 전진시킵니다.
///
/// 예상 ID로 다이제스트를 계산해 삽입한 뒤, 엔진이 실제로 부여한 ID가
/// 다르면 (동일 DB에 동시 기록자가 있는 경우) 다이제스트를 재계산하여
/// 해당 행을 갱신합니다.
fn insert_row(
    conn: &Connection,
    prev: &mut [u8; DIGEST_LEN],
    entry: &LogEntry,
) -> Result<i64, StoreError> {
    let expected_id: i64 =
        conn.query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM logs", [], |row| {
            row.get(0)
        })?;
    let digest = chain_digest(&entry.raw_data, expected_id, prev);

    conn.execute(
        INSERT_SQL,
        params![
            entry.timestamp,
            entry.level.code(),
            entry.source.code(),
            entry.host,
            entry.facility,
            entry.app_name,
            entry.proc_id,
            entry.msg_id,
            entry.message,
            entry.raw_data,
            digest.as_slice(),
        ],
    )?;

    let actual_id = conn.last_insert_rowid();
    if actual_id != expected_id {
        tracing::warn!(
            expected = expected_id,
            actual = actual_id,
            "row id mismatch, recomputing chain digest"
        );
        let fixed = chain_digest(&entry.raw_data, actual_id, prev);
        conn.execute(
            "UPDATE logs SET hmac = ?1 WHERE id = ?2",
            params![fixed.as_slice(), actual_id],
        )?;
        *prev = fixed;
        return Ok(actual_id);
    }

    *prev = digest;
    Ok(actual_id)
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogEntry> {
    Ok(LogEntry {
        id: Some(row.get(0)?),
        timestamp: row.get(1)?,
        level: Level::from_code(row.get::<_, i64>(2)? as u8),
        source: LogSource::from_code(row.get::<_, i64>(3)? as u8),
        host: row.get(4)?,
        facility: row.get::<_, Option<i64>>(5)?.map(|v| v as u8),
        app_name: row.get(6)?,
        proc_id: row.get(7)?,
        msg_id: row.get(8)?,
        message: row.get(9)?,
        raw_data: row.get(10)?,
        hmac: Some(row.get(11)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(message: &str, raw: &[u8]) -> LogEntry {
        let mut entry = LogEntry::new(LogSource::Syslog, message, raw.to_vec());
        entry.timestamp = 1_700_000_000;
        entry.host = "testhost".to_owned();
        entry
    }

    #[test]
    fn open_in_memory_starts_empty() {
        let store = LogStore::open_in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.chain_tip(), ZERO_DIGEST);
    }

    #[test]
    fn schema_is_idempotent() {
        let store = LogStore::open_in_memory().unwrap();
        // 동일 연결에 DDL 재적용
        store.conn.execute_batch(SCHEMA_SQL).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn insert_assigns_dense_increasing_ids() {
        let mut store = LogStore::open_in_memory().unwrap();
        for expected in 1..=5i64 {
            let id = store.insert(&make_entry("m", b"raw")).unwrap();
            assert_eq!(id, expected);
        }
        assert_eq!(store.count().unwrap(), 5);
    }

    #[test]
    fn insert_produces_distinct_32_byte_digests() {
        let mut store = LogStore::open_in_memory().unwrap();
        store.insert(&make_entry("a", b"first record")).unwrap();
        store.insert(&make_entry("b", b"second record")).unwrap();

        let rows = store.query_by_time_range(0, i64::MAX, 10).unwrap();
        assert_eq!(rows.len(), 2);
        let h1 = rows[0].hmac.as_ref().unwrap();
        let h2 = rows[1].hmac.as_ref().unwrap();
        assert_eq!(h1.len(), 32);
        assert_eq!(h2.len(), 32);
        assert_ne!(h1, h2);
    }

    #[test]
    fn verify_chain_accepts_untampered_rows() {
        let mut store = LogStore::open_in_memory().unwrap();
        for i in 0..10 {
            store
                .insert(&make_entry(&format!("m{i}"), format!("raw{i}").as_bytes()))
                .unwrap();
        }
        assert_eq!(store.verify_chain().unwrap(), 10);
    }

    #[test]
    fn verify_chain_detects_tampered_raw_data() {
        let mut store = LogStore::open_in_memory().unwrap();
        store.insert(&make_entry("a", b"original")).unwrap();
        store.insert(&make_entry("b", b"untouched")).unwrap();

        store
            .conn
            .execute("UPDATE logs SET raw_data = X'DEAD' WHERE id = 1", [])
            .unwrap();

        let err = store.verify_chain().unwrap_err();
        assert!(matches!(err, StoreError::ChainBroken { id: 1 }));
    }

    #[test]
    fn verify_chain_detects_deleted_row() {
        let mut store = LogStore::open_in_memory().unwrap();
        for i in 0..3 {
            store.insert(&make_entry("m", format!("r{i}").as_bytes())).unwrap();
        }
        store.conn.execute("DELETE FROM logs WHERE id = 2", []).unwrap();

        // 행 2 삭제 후 행 3의 체인 링크가 깨짐
        let err = store.verify_chain().unwrap_err();
        assert!(matches!(err, StoreError::ChainBroken { id: 3 }));
    }

    #[test]
    fn raw_data_roundtrips_byte_exact_including_nuls() {
        let mut store = LogStore::open_in_memory().unwrap();
        let raw = vec![0x00, 0xFF, 0x00, 0x7F, 0x80, 0x00];
        store.insert(&make_entry("nul bytes", &raw)).unwrap();

        let rows = store.query_by_time_range(0, i64::MAX, 1).unwrap();
        assert_eq!(rows[0].raw_data, raw);
    }

    #[test]
    fn query_by_time_range_filters_orders_and_limits() {
        let mut store = LogStore::open_in_memory().unwrap();
        for ts in [100i64, 200, 300, 400] {
            let mut entry = make_entry("m", b"r");
            entry.timestamp = ts;
            store.insert(&entry).unwrap();
        }

        let rows = store.query_by_time_range(150, 400, 2).unwrap();
        assert_eq!(rows.len(), 2);
        // 최신순 정렬
        assert_eq!(rows[0].timestamp, 400);
        assert_eq!(rows[1].timestamp, 300);
    }

    #[test]
    fn optional_fields_roundtrip() {
        let mut store = LogStore::open_in_memory().unwrap();
        let mut entry = make_entry("with meta", b"raw");
        entry.facility = Some(16);
        entry.app_name = Some("myapp".to_owned());
        entry.proc_id = Some("1234".to_owned());
        entry.level = Level::Warning;
        entry.source = LogSource::RestApi;
        store.insert(&entry).unwrap();

        let rows = store.query_by_time_range(0, i64::MAX, 1).unwrap();
        assert_eq!(rows[0].facility, Some(16));
        assert_eq!(rows[0].app_name.as_deref(), Some("myapp"));
        assert_eq!(rows[0].proc_id.as_deref(), Some("1234"));
        assert_eq!(rows[0].msg_id, None);
        assert_eq!(rows[0].level, Level::Warning);
        assert_eq!(rows[0].source, LogSource::RestApi);
    }

    #[test]
    fn insert_batch_writes_all_rows() {
        let mut store = LogStore::open_in_memory().unwrap();
        let entries: Vec<LogEntry> = (0..7)
            .map(|i| make_entry(&format!("m{i}"), format!("raw{i}").as_bytes()))
            .collect();

        let written = store.insert_batch(&entries).unwrap();
        assert_eq!(written, 7);
        assert_eq!(store.count().unwrap(), 7);
        assert_eq!(store.verify_chain().unwrap(), 7);
    }

    #[test]
    fn insert_batch_of_empty_slice_is_noop() {
        let mut store = LogStore::open_in_memory().unwrap();
        assert_eq!(store.insert_batch(&[]).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn insert_batch_rolls_back_entirely_on_failure() {
        let mut store = LogStore::open_in_memory().unwrap();
        let tip_before = store.chain_tip();

        // 페이지 수를 제한하여 배치 중간에 SQLITE_FULL 유도
        store.conn.execute_batch("PRAGMA max_page_count = 16").unwrap();
        let entries: Vec<LogEntry> = (0..128)
            .map(|_| make_entry("big", &vec![0xAB; 8192]))
            .collect();

        let result = store.insert_batch(&entries);
        assert!(result.is_err());
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.chain_tip(), tip_before);
    }

    #[test]
    fn chain_resumes_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("logs.db");

        {
            let mut store = LogStore::open(&db_path).unwrap();
            store.insert(&make_entry("first", b"one")).unwrap();
            store.insert(&make_entry("second", b"two")).unwrap();
        }

        let mut store = LogStore::open(&db_path).unwrap();
        assert_ne!(store.chain_tip(), ZERO_DIGEST);
        store.insert(&make_entry("third", b"three")).unwrap();

        // 재시작을 가로지른 체인도 끊김 없이 검증됨
        assert_eq!(store.verify_chain().unwrap(), 3);
    }

    #[test]
    fn single_insert_matches_manual_digest() {
        let mut store = LogStore::open_in_memory().unwrap();
        let entry = make_entry("m", b"known raw bytes");
        let id = store.insert(&entry).unwrap();

        let expected = chain_digest(b"known raw bytes", id, &ZERO_DIGEST);
        let rows = store.query_by_time_range(0, i64::MAX, 1).unwrap();
        assert_eq!(rows[0].hmac.as_deref().unwrap(), &expected[..]);
    }
}
