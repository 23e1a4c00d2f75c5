//! Transient-error classification and shrink-and-retry sizing: substring
//! matching against the error's `Display` text rather than a
//! structured error taxonomy from the adapter.

const TRANSIENT_SUBSTRINGS: &[&str] = &[
    "dial tcp",
    "too many",
    "timeout",
    "connection reset",
    "connection refused",
];

/// True if `err`'s message matches one of the known network/rate-limit
/// substrings worth retrying rather than aborting the cycle outright.
pub fn is_transient(err: &anyhow::Error) -> bool {
    let msg = err.to_string();
    TRANSIENT_SUBSTRINGS.iter().any(|s| msg.contains(s))
}

/// Shrinks `amount` by 0.02%, refusing to go below the fee-dust floor
/// `original * (1 - 3*fee)` (three legs' worth of fee headroom). Returns
/// `None` once the floor is reached, signaling the caller to abort.
pub fn shrink(amount: f64, original: f64, fee: f64) -> Option<f64> {
    let floor = original * (1.0 - 3.0 * fee);
    let shrunk = amount * (1.0 - 0.0002);
    if shrunk < floor {
        None
    } else {
        Some(shrunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_transient_substrings() {
        assert!(is_transient(&anyhow::anyhow!("dial tcp 1.2.3.4:443: i/o timeout")));
        assert!(is_transient(&anyhow::anyhow!("429 too many requests")));
        assert!(!is_transient(&anyhow::anyhow!("insufficient balance")));
    }

    #[test]
    fn shrink_stops_at_fee_dust_floor() {
        let original = 100.0;
        let fee = 0.001;
        let floor = original * (1.0 - 3.0 * fee);

        let mut current = original;
        let mut iterations = 0;
        while let Some(next) = shrink(current, original, fee) {
            assert!(next >= floor);
            current = next;
            iterations += 1;
            assert!(iterations < 10_000, "shrink loop did not converge");
        }
        assert!(current >= floor);
    }
}
