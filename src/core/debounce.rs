//! Shift-register debouncing of a single digital input.
//!
//! Every sample shifts one bit into [`DebounceState`]: `1` for an inactive
//! line, `0` for an active one. The top [`GUARD_BITS`] are forced high on
//! every update so that "one inactive sample followed by [`STABLE_SAMPLES`]
//! active ones" is a single equality test against [`PRESS_PATTERN`].
//!
//! With a 5 ms sample period the line has to stay active for 60 ms.

use embedded_hal::digital::InputPin;

use crate::domain::entity::ButtonPress;

/// Storage for the sample history.
pub type DebounceRegister = u16;

/// Bits forced high on every update.
pub const GUARD_BITS: u32 = 3;

/// Consecutive active samples required for a press.
pub const STABLE_SAMPLES: u32 = 12;

/// Guard bits, one inactive baseline sample and the stable window fill the
/// register exactly.
const _: () = assert!(GUARD_BITS + 1 + STABLE_SAMPLES == DebounceRegister::BITS);

pub const GUARD_MASK: DebounceRegister = !(DebounceRegister::MAX >> GUARD_BITS);

/// Guard bits, an inactive sample, then [`STABLE_SAMPLES`] active samples.
pub const PRESS_PATTERN: DebounceRegister = GUARD_MASK | (1 << STABLE_SAMPLES);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceState(DebounceRegister);

impl DebounceState {
    /// A history of inactive samples.
    pub const fn new() -> Self {
        Self(DebounceRegister::MAX)
    }

    /// Shift in one sample. Returns `true` on the sample that completes a press.
    pub fn sample(&mut self, active: bool) -> bool {
        self.0 = (self.0 << 1) | DebounceRegister::from(!active) | GUARD_MASK;
        self.0 == PRESS_PATTERN
    }
}

impl Default for DebounceState {
    fn default() -> Self {
        Self::new()
    }
}

/// Logic level of the line while the button is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveLevel {
    Low,
    High,
}

/// Debouncer bound to an input pin.
pub struct InputDebouncer<P> {
    pin: P,
    level: ActiveLevel,
    state: DebounceState,
}

impl<P: InputPin> InputDebouncer<P> {
    pub fn new(pin: P, level: ActiveLevel) -> Self {
        Self {
            pin,
            level,
            state: DebounceState::new(),
        }
    }

    /// Sample the pin once. Must be called at a fixed period.
    pub fn tick(&mut self) -> Result<Option<ButtonPress>, P::Error> {
        let active = match self.level {
            ActiveLevel::Low => self.pin.is_low()?,
            ActiveLevel::High => self.pin.is_high()?,
        };
        Ok(self.state.sample(active).then_some(ButtonPress))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::convert::Infallible;
    use std::vec::Vec;

    use embedded_hal::digital::ErrorType;
    use proptest::prelude::*;

    use super::*;

    const N: usize = STABLE_SAMPLES as usize;

    fn feed(state: &mut DebounceState, samples: impl IntoIterator<Item = bool>) -> usize {
        samples.into_iter().filter(|&s| state.sample(s)).count()
    }

    fn run(active: bool, len: usize) -> impl Iterator<Item = bool> {
        core::iter::repeat_n(active, len)
    }

    #[test]
    fn masks_follow_the_configuration() {
        assert_eq!(GUARD_MASK, 0xE000);
        assert_eq!(PRESS_PATTERN, 0xF000);
    }

    #[test]
    fn stable_press_fires_once() {
        let mut state = DebounceState::new();
        assert_eq!(feed(&mut state, run(false, N)), 0);
        assert_eq!(feed(&mut state, run(true, N - 1)), 0);
        assert!(state.sample(true));
        assert_eq!(feed(&mut state, run(true, 100)), 0);
    }

    #[test]
    fn short_press_never_fires() {
        let mut state = DebounceState::new();
        for _ in 0..10 {
            assert_eq!(feed(&mut state, run(true, N - 1)), 0);
            assert_eq!(feed(&mut state, run(false, 1)), 0);
        }
    }

    #[test]
    fn bounce_restarts_the_window() {
        let mut state = DebounceState::new();
        let bouncy = [true, false, true, true, false, true];
        assert_eq!(feed(&mut state, bouncy), 0);
        assert_eq!(feed(&mut state, run(true, N)), 1);
    }

    #[test]
    fn refires_after_baseline() {
        let mut state = DebounceState::new();
        assert_eq!(feed(&mut state, run(true, N)), 1);
        assert_eq!(feed(&mut state, run(true, N)), 0);
        assert_eq!(feed(&mut state, run(false, 1)), 0);
        assert_eq!(feed(&mut state, run(true, N)), 1);
    }

    proptest! {
        #[test]
        fn at_most_one_press_per_active_run(samples in proptest::collection::vec(any::<bool>(), 0..400)) {
            let mut state = DebounceState::new();
            let mut fired_in_run = 0;
            let mut run_len = 0usize;
            for active in samples {
                if active {
                    run_len += 1;
                } else {
                    run_len = 0;
                    fired_in_run = 0;
                }
                if state.sample(active) {
                    fired_in_run += 1;
                    prop_assert_eq!(run_len, N);
                }
                prop_assert!(fired_in_run <= 1);
            }
        }
    }

    struct ScriptedPin {
        levels: Vec<bool>,
        next: usize,
    }

    impl ErrorType for ScriptedPin {
        type Error = Infallible;
    }

    impl InputPin for ScriptedPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            let level = self.levels.get(self.next).copied().unwrap_or(true);
            self.next += 1;
            Ok(level)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|high| !high)
        }
    }

    #[test]
    fn active_low_pin_fires_on_held_low() {
        let mut levels = std::vec![true; N];
        levels.extend(std::vec![false; N + 20]);
        let pin = ScriptedPin { levels, next: 0 };
        let mut debouncer = InputDebouncer::new(pin, ActiveLevel::Low);

        let presses = (0..2 * N + 20)
            .filter_map(|_| debouncer.tick().unwrap())
            .count();
        assert_eq!(presses, 1);
    }

    #[test]
    fn active_high_pin_ignores_low_level() {
        let pin = ScriptedPin {
            levels: std::vec![false; 3 * N],
            next: 0,
        };
        let mut debouncer = InputDebouncer::new(pin, ActiveLevel::High);
        assert!((0..3 * N).all(|_| debouncer.tick().unwrap().is_none()));
    }
}
