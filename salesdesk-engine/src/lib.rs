pub mod session;
pub mod simulator;
pub mod timer;
pub mod traits;
