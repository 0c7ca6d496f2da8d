// Domain layer: plain data types and the ports (traits) for the external systems the harness drives.

pub mod model;
pub mod ports;
