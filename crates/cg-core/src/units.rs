// cg-core/src/units.rs

use uom::si::f64::Frequency as UomFrequency;

// Public canonical unit types (SI, f64)
pub type Frequency = UomFrequency;

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}
