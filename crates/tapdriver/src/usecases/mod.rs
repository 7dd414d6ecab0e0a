pub mod action_lock;
pub mod actions;
pub mod context;
pub mod element_registry;
pub mod elements;
pub mod extensions;
pub mod implicit_wait;
pub mod ports;
pub mod session;

pub use actions::{
    ActionChainScheduler, PerformActionsUseCase, PerformActionsUseCaseImpl, ScheduleReport,
};
pub use context::ExecutionContextController;
pub use element_registry::{ElementIdStyle, ElementRegistry, HandleMinter};
pub use elements::{FindElementUseCase, FindElementUseCaseImpl};
pub use extensions::ExtensionRegistry;
pub use implicit_wait::{DEFAULT_POLL_INTERVAL, poll_until};
pub use session::{SEND_KEYS_COMMAND, Session, SessionDefaults, SessionManager, Timeouts};
