//! Centralized integer conversions.
//!
//! Saturating helpers clamp instead of truncating; use them where a best-effort
//! value is acceptable (paging bounds, durations for metrics and logs).

#[inline]
#[must_use]
pub fn u64_to_usize_saturating(v: u64) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}

#[inline]
#[must_use]
pub fn usize_to_u64(v: usize) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

#[inline]
#[must_use]
pub fn u128_to_u64_saturating(v: u128) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_saturate() {
        assert_eq!(u64_to_usize_saturating(7), 7);
        assert_eq!(usize_to_u64(usize::MAX), u64::try_from(usize::MAX).unwrap_or(u64::MAX));
        assert_eq!(u128_to_u64_saturating(u128::MAX), u64::MAX);
        assert_eq!(u128_to_u64_saturating(42), 42);
    }
}
