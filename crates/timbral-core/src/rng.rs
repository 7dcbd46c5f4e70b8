//! Deterministic pseudo-random source for phase and noise generation.
//!
//! Sub-model rendering needs randomness (oscillator start phases, noise
//! spectra). Instead of a process-wide generator, callers construct a
//! [`PhaseRng`] and pass it into `render`, so tests can pin the sequence and
//! the compositor can derive one independent stream per pitch with
//! [`PhaseRng::for_note`].

use core::f32::consts::TAU;

/// Xorshift32 generator. Cheap, `Copy`, and fully determined by its seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRng {
    state: u32,
}

impl Default for PhaseRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PhaseRng {
    /// Create a generator from a seed. Any seed is valid, including 0.
    pub fn new(seed: u64) -> Self {
        let mixed = splitmix64(seed);
        let state = (mixed ^ (mixed >> 32)) as u32;
        // xorshift has a fixed point at zero
        Self {
            state: if state == 0 { 0x9E37_79B9 } else { state },
        }
    }

    /// Stream for one pitch, independent of how many other pitches were
    /// rendered before it.
    pub fn for_note(seed: u64, note_number: i32) -> Self {
        Self::new(seed ^ splitmix64(note_number as i64 as u64))
    }

    /// Next raw 32-bit value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform value in [0, 1).
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform phase in [0, 2π).
    #[inline]
    pub fn next_phase(&mut self) -> f32 {
        self.next_unit() * TAU
    }
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = PhaseRng::new(42);
        let mut b = PhaseRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn note_streams_differ() {
        let mut a = PhaseRng::for_note(7, 60);
        let mut b = PhaseRng::for_note(7, 61);
        let same = (0..16).filter(|_| a.next_u32() == b.next_u32()).count();
        assert!(same < 16);
    }

    #[test]
    fn ranges_hold() {
        let mut rng = PhaseRng::new(0);
        for _ in 0..10_000 {
            let u = rng.next_unit();
            assert!((0.0..1.0).contains(&u), "unit out of range: {u}");
            let p = rng.next_phase();
            assert!((0.0..TAU).contains(&p), "phase out of range: {p}");
        }
    }
}
