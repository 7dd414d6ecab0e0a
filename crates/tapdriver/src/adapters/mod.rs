//! Wire-facing layer: routing, payload parsing, handlers and error mapping.

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod response;
pub mod router;
pub mod usecase_container;

pub use command::{CommandContext, CommandRequest, Handler, HandlerFn, SessionScope};
pub use dispatcher::CommandDispatcher;
pub use error::{CATCH_ALL_PREFIX, ErrorTranslator};
pub use response::WireResponse;
pub use router::{CommandRouter, HttpMethod, NotFound, URL_PREFIX};
pub use usecase_container::UseCaseContainer;
