// pr-core/src/units.rs
//
// Facility drawings are in imperial units: coordinates in feet, nominal pipe
// diameters in inches, pressure ratings in psi, temperature limits in °F.

use uom::si::f64::{
    Length as UomLength, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

pub type Length = UomLength;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn ft(v: f64) -> Length {
    use uom::si::length::foot;
    Length::new::<foot>(v)
}

#[inline]
pub fn inches(v: f64) -> Length {
    use uom::si::length::inch;
    Length::new::<inch>(v)
}

#[inline]
pub fn psi(v: f64) -> Pressure {
    use uom::si::pressure::psi;
    Pressure::new::<psi>(v)
}

#[inline]
pub fn deg_f(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_fahrenheit;
    Temperature::new::<degree_fahrenheit>(v)
}

#[inline]
pub fn as_ft(v: Length) -> f64 {
    use uom::si::length::foot;
    v.get::<foot>()
}

#[inline]
pub fn as_inches(v: Length) -> f64 {
    use uom::si::length::inch;
    v.get::<inch>()
}

#[inline]
pub fn as_psi(v: Pressure) -> f64 {
    use uom::si::pressure::psi;
    v.get::<psi>()
}

#[inline]
pub fn as_deg_f(v: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_fahrenheit;
    v.get::<degree_fahrenheit>()
}
