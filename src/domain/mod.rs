// Domain layer: run model and the storage port.

pub mod model;
pub mod ports;
