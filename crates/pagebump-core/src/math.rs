//! Math polyfill for hosts without a standard math library.
//!
//! The only function the codec layer needs is `exp2`. General exponentiation
//! is delegated to a host primitive; this module just fixes the base at 2.

/// A host-provided generic power primitive: `base ^ exponent`.
pub trait Power {
    fn pow(&self, base: f64, exponent: f64) -> f64;
}

impl<F> Power for F
where
    F: Fn(f64, f64) -> f64,
{
    #[inline]
    fn pow(&self, base: f64, exponent: f64) -> f64 {
        self(base, exponent)
    }
}

/// Power primitive backed by `f64::powf`, for hosts that do have libm.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdPower;

impl Power for StdPower {
    #[inline]
    fn pow(&self, base: f64, exponent: f64) -> f64 {
        base.powf(exponent)
    }
}

/// Compute `2^n` through the host's power primitive.
#[inline]
pub fn exp_two<P: Power + ?Sized>(power: &P, n: f64) -> f64 {
    power.pow(2.0, n)
}
