//! 체인 다이제스트 — 행 단위 SHA-256 XOR 체인
//!
//! 행 *i*의 다이제스트는 `SHA256(raw_data_i ‖ le64(id_i)) XOR digest_{i-1}`로
//! 정의되며, `digest_0 = 0^256`입니다. 행 하나를 삭제하거나 수정하면 해당
//! 행 이후의 모든 다이제스트 검증이 실패합니다.

use sha2::{Digest, Sha256};

/// 체인 다이제스트 길이 (바이트)
pub const DIGEST_LEN: usize = 32;

/// 체인 시작값 (모든 비트 0)
pub const ZERO_DIGEST: [u8; DIGEST_LEN] = [0u8; DIGEST_LEN];

/// 행의 체인 다이제스트를 계산합니다.
///
/// `raw`는 원본 레코드 바이트, `id`는 스토리지가 부여한 행 ID,
/// `prev`는 직전 행의 다이제스트입니다.
pub fn chain_digest(raw: &[u8], id: i64, prev: &[u8; DIGEST_LEN]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    hasher.update(id.to_le_bytes());
    let digest = hasher.finalize();

    let mut out = [0u8; DIGEST_LEN];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = digest[i] ^ prev[i];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let a = chain_digest(b"record", 1, &ZERO_DIGEST);
        let b = chain_digest(b"record", 1, &ZERO_DIGEST);
        assert_eq!(a, b);
    }

    #[test]
    fn digest_depends_on_raw_bytes() {
        let a = chain_digest(b"record-a", 1, &ZERO_DIGEST);
        let b = chain_digest(b"record-b", 1, &ZERO_DIGEST);
        assert_ne!(a, b);
    }

    #[test]
    fn digest_depends_on_row_id() {
        let a = chain_digest(b"record", 1, &ZERO_DIGEST);
        let b = chain_digest(b"record", 2, &ZERO_DIGEST);
        assert_ne!(a, b);
    }

    #[test]
    fn digest_depends_on_previous_link() {
        let prev = chain_digest(b"first", 1, &ZERO_DIGEST);
        let a = chain_digest(b"second", 2, &ZERO_DIGEST);
        let b = chain_digest(b"second", 2, &prev);
        assert_ne!(a, b);
    }

    #[test]
    fn xor_with_zero_prev_is_plain_sha256() {
        // prev가 0이면 다이제스트는 SHA256(raw ‖ le64(id)) 그대로
        let digest = chain_digest(b"x", 7, &ZERO_DIGEST);

        let mut hasher = Sha256::new();
        hasher.update(b"x");
        hasher.update(7i64.to_le_bytes());
        let expected = hasher.finalize();

        assert_eq!(&digest[..], &expected[..]);
    }

    #[test]
    fn chaining_twice_with_same_link_cancels_out() {
        // XOR 특성: (d ^ p) ^ p == d
        let prev = chain_digest(b"first", 1, &ZERO_DIGEST);
        let chained = chain_digest(b"second", 2, &prev);
        let unchained = chain_digest(b"second", 2, &ZERO_DIGEST);

        let mut recovered = [0u8; DIGEST_LEN];
        for i in 0..DIGEST_LEN {
            recovered[i] = chained[i] ^ prev[i];
        }
        assert_eq!(recovered, unchained);
    }

    #[test]
    fn empty_raw_data_is_valid_input() {
        let digest = chain_digest(b"", 1, &ZERO_DIGEST);
        assert_ne!(digest, ZERO_DIGEST);
    }
}
