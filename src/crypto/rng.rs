//! Randomness for keys, nonces, IVs and RSA key pairs.

use getrandom::fill;
use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// A cryptographically secure source of random bytes.
///
/// Production code uses [`OsRandom`]. Tests can inject [`SeededRandom`] to get
/// reproducible fixtures.
pub trait SecureRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), CryptoError>;
}

/// The operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), CryptoError> {
        fill(buf).map_err(|_| CryptoError::RandomGeneration)
    }
}

/// Deterministic ChaCha20 stream. Never use it for real secrets.
pub struct SeededRandom {
    inner: ChaCha20Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl SecureRandom for SeededRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), CryptoError> {
        self.inner.fill_bytes(buf);
        Ok(())
    }
}

/// Draw `len` fresh bytes into a buffer that is wiped on drop.
pub(crate) fn random_bytes(
    rng: &mut dyn SecureRandom,
    len: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut buf = Zeroizing::new(vec![0u8; len]);
    rng.fill(&mut buf)?;
    Ok(buf)
}

/// Build the generator handed to RSA key generation and padding.
///
/// The RSA backend wants an infallible `RngCore`, so the fallible source is
/// only asked once, for a 256-bit seed. A failing source therefore surfaces
/// before key generation starts.
pub(crate) fn key_pair_rng(rng: &mut dyn SecureRandom) -> Result<ChaCha20Rng, CryptoError> {
    let mut seed = Zeroizing::new([0u8; 32]);
    rng.fill(&mut seed[..])?;
    Ok(ChaCha20Rng::from_seed(*seed))
}

#[cfg(test)]
pub(crate) struct FailingRandom;

#[cfg(test)]
impl SecureRandom for FailingRandom {
    fn fill(&mut self, _buf: &mut [u8]) -> Result<(), CryptoError> {
        Err(CryptoError::RandomGeneration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_random_fills_buffer() {
        let a = random_bytes(&mut OsRandom, 32).unwrap();
        let b = random_bytes(&mut OsRandom, 32).unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(*a, *b);
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let a = random_bytes(&mut SeededRandom::new(7), 64).unwrap();
        let b = random_bytes(&mut SeededRandom::new(7), 64).unwrap();
        let c = random_bytes(&mut SeededRandom::new(8), 64).unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn failing_source_is_reported() {
        assert!(matches!(
            random_bytes(&mut FailingRandom, 16),
            Err(CryptoError::RandomGeneration)
        ));
        assert!(matches!(
            key_pair_rng(&mut FailingRandom),
            Err(CryptoError::RandomGeneration)
        ));
    }
}
