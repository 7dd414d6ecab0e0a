pub mod clock;
pub mod driver;
pub mod errors;
pub mod extension;
pub mod sleeper;
#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, saturating_millis};
pub use driver::{AutomationDriver, DriverFactory, ElementRef};
pub use errors::{DriverError, NO_SUCH_CONTEXT_MESSAGE};
pub use extension::{ElementHandles, Extension, ExtensionContext};
pub use sleeper::{RealSleeper, Sleeper};
