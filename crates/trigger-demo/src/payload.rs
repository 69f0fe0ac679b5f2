/// Source of example data observed by the instrumented system.
///
/// Payload generation advances every tick whether or not any gate fires,
/// so gating never changes what the observed system computes.
pub trait PayloadSource {
    /// Produces the value for the next tick.
    fn next_value(&mut self) -> u16;
}

/// Seed used when none is supplied.
pub const DEFAULT_LFSR_SEED: u16 = 0xACE1;

/// 16-bit Fibonacci LFSR over `x^16 + x^14 + x^13 + x^11 + 1`.
///
/// The polynomial is maximal length: any non-zero seed cycles through all
/// 65535 non-zero states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lfsr16 {
    state: u16,
}

impl Lfsr16 {
    /// Creates a generator. A zero seed would lock up and is replaced by 1.
    #[must_use]
    pub const fn new(seed: u16) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Current register contents.
    #[must_use]
    pub const fn state(self) -> u16 {
        self.state
    }

    /// Shifts once and returns the new register contents.
    #[allow(clippy::missing_const_for_fn)]
    pub fn step(&mut self) -> u16 {
        let s = self.state;
        let bit = (s ^ (s >> 2) ^ (s >> 3) ^ (s >> 5)) & 1;
        self.state = (s >> 1) | (bit << 15);
        self.state
    }
}

impl Default for Lfsr16 {
    fn default() -> Self {
        Self::new(DEFAULT_LFSR_SEED)
    }
}

impl PayloadSource for Lfsr16 {
    fn next_value(&mut self) -> u16 {
        self.step()
    }
}
