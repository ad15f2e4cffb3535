// Domain layer: namespace handles, viewers, extension slots and the ports
// through which the external namespace manager drives this crate.

pub mod model;
pub mod ports;
