// Deterministic uniform stream for reproducing reference sampling scenarios
use rand::RngCore;

/// Replays a preset sequence of uniform doubles, then panics when exhausted.
///
/// `rand`'s standard f64 distribution maps `next_u64() >> 11` onto a
/// multiple of 2^-53, so any preset value that is itself a multiple of
/// 2^-53 (which includes every double in [0.5, 1) and the usual test
/// values 0.0, 0.25, 0.5, 1 - 1e-15) is reproduced exactly by
/// `rng.gen::<f64>()`.
#[derive(Debug, Clone)]
pub struct FakeStreamRng {
    values: Vec<f64>,
    index: usize,
}

impl FakeStreamRng {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(
            values.iter().all(|v| (0.0..1.0).contains(v)),
            "fake stream values must lie in [0, 1)"
        );
        FakeStreamRng { values, index: 0 }
    }

    /// Number of preset values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.values.len() - self.index
    }
}

const F64_SCALE: f64 = (1u64 << 53) as f64;

impl RngCore for FakeStreamRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let value = *self
            .values
            .get(self.index)
            .expect("fake uniform stream exhausted");
        self.index += 1;
        // Invert (next_u64 >> 11) * 2^-53
        ((value * F64_SCALE) as u64) << 11
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_exact_replay() {
        let stream = vec![0.0, 0.25, 0.5, 0.75, 1.0 - 1e-15];
        let mut rng = FakeStreamRng::new(stream.clone());
        for expected in stream {
            let u: f64 = rng.gen();
            assert_eq!(u, expected);
        }
    }

    #[test]
    #[should_panic(expected = "fake uniform stream exhausted")]
    fn test_exhaustion_panics() {
        let mut rng = FakeStreamRng::new(vec![0.5]);
        let _: f64 = rng.gen();
        let _: f64 = rng.gen();
    }

    #[test]
    fn test_remaining() {
        let mut rng = FakeStreamRng::new(vec![0.5, 0.5]);
        assert_eq!(rng.remaining(), 2);
        let _: f64 = rng.gen();
        assert_eq!(rng.remaining(), 1);
    }
}
