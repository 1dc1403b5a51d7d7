// wedm-core/src/units.rs
//
// Process quantities are stored as plain f64 in the units of the machine
// (µm for the gap axis, mm for wire/workpiece geometry, µs for time).
// These helpers route every conversion to SI through uom.

use uom::si::f64::{Length as UomLength, Time as UomTime};

// Public canonical unit types (SI, f64)
pub type Length = UomLength;
pub type Time = UomTime;

#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

#[inline]
pub fn um(v: f64) -> Length {
    use uom::si::length::micrometer;
    Length::new::<micrometer>(v)
}

#[inline]
pub fn us(v: f64) -> Time {
    use uom::si::time::microsecond;
    Time::new::<microsecond>(v)
}

#[inline]
pub fn in_meters(l: Length) -> f64 {
    use uom::si::length::meter;
    l.get::<meter>()
}

#[inline]
pub fn in_millimeters(l: Length) -> f64 {
    use uom::si::length::millimeter;
    l.get::<millimeter>()
}

#[inline]
pub fn in_micrometers(l: Length) -> f64 {
    use uom::si::length::micrometer;
    l.get::<micrometer>()
}

#[inline]
pub fn in_seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

/// Microseconds to seconds.
#[inline]
pub fn us_to_s(v: f64) -> f64 {
    in_seconds(us(v))
}

/// Millimeters to meters.
#[inline]
pub fn mm_to_m(v: f64) -> f64 {
    in_meters(mm(v))
}

/// Micrometers to millimeters.
#[inline]
pub fn um_to_mm(v: f64) -> f64 {
    in_millimeters(um(v))
}

/// Millimeters to micrometers.
#[inline]
pub fn mm_to_um(v: f64) -> f64 {
    in_micrometers(mm(v))
}

pub mod constants {
    /// Reference ambient temperature [K].
    pub const ROOM_TEMPERATURE_K: f64 = 293.15;

    /// Cubic micrometers per cubic millimeter.
    pub const UM3_PER_MM3: f64 = 1.0e9;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn machine_unit_conversions() {
        assert!(close(us_to_s(1.0), 1e-6));
        assert!(close(us_to_s(1000.0), 1e-3));
        assert!(close(mm_to_m(0.2), 2e-4));
        assert!(close(um_to_mm(50.0), 0.05));
        assert!(close(mm_to_um(0.12), 120.0));
    }
}
