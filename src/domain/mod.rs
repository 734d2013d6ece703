// Domain layer: records, the date window and the backend port.

pub mod model;
pub mod ports;
pub mod window;
