use super::{errors::Error, traits::BYTES_LENGTH_32};

/// Uses `seed` when it is exactly 32 bytes, otherwise draws a fresh one from the OS.
pub(super) fn seed_or_random(seed: &[u8]) -> Result<[u8; BYTES_LENGTH_32], Error> {
    if let Ok(seed) = <[u8; BYTES_LENGTH_32]>::try_from(seed) {
        return Ok(seed);
    }

    let mut fresh = [0u8; BYTES_LENGTH_32];
    getrandom::getrandom(&mut fresh).map_err(|_| Error::RandomnessUnavailable)?;
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_seed_is_kept() {
        let seed = [7u8; BYTES_LENGTH_32];
        assert_eq!(seed_or_random(&seed).unwrap(), seed);
    }

    #[test]
    fn test_short_or_missing_seed_is_replaced() {
        let first = seed_or_random(&[1, 2, 3]).unwrap();
        let second = seed_or_random(&[]).unwrap();
        assert_ne!(first, second);
        assert_ne!(first, [0u8; BYTES_LENGTH_32]);
    }
}
