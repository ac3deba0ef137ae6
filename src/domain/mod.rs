// Domain layer: core models and ports. Adapters and core services depend on this, never the reverse.

pub mod model;
pub mod ports;
