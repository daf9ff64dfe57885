pub mod alarm;
pub mod device;
pub mod inter_adapter;
pub mod openflow;
pub mod scalar;

pub use alarm::*;
pub use device::*;
pub use inter_adapter::*;
pub use openflow::*;
pub use scalar::*;
