use serde_json::Value;

use crate::adapters::command::CommandContext;
use crate::usecases::ports::DriverError;

/// Answers commands clients may send but this server does not implement.
pub fn unknown_command(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    Err(DriverError::UnknownCommand(format!(
        "The requested command {} {} is not recognised",
        ctx.request.method, ctx.request.uri
    )))
}
