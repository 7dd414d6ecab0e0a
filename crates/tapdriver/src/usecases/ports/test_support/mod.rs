//! Deterministic doubles for the driver, factory, clock and sleeper ports.

mod mock_clock;
mod mock_driver;
mod mock_factory;

pub use mock_clock::{MockClock, MockSleeper};
pub use mock_driver::MockDriver;
pub use mock_factory::MockDriverFactory;
