use serde_json::Value;
use tracing::info;

use super::common::{done, size_json};
use crate::adapters::command::CommandContext;
use crate::adapters::payload::PayloadExt;
use crate::usecases::ports::DriverError;

pub fn get_context(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    Ok(Value::String(ctx.session()?.current_context().name().to_string()))
}

pub fn list_contexts(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let names = ctx
        .session()?
        .enumerate_contexts()?
        .iter()
        .map(|context| Value::String(context.name().to_string()))
        .collect();
    Ok(Value::Array(names))
}

/// Shared by `context` and `window`: both bodies carry `name`.
pub fn switch_context(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let name = ctx.body().req_str("name")?;
    let session = ctx.session()?;
    if session.switch_context(name)? {
        info!(session_id = %session.id(), context = %session.current_context(), "Context switched");
    }
    Ok(done())
}

pub fn window_size(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    Ok(size_json(ctx.driver()?.window_size()?))
}

/// Frames only exist inside a web surface; switching invalidates handles.
pub fn switch_frame(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let session = ctx.session()?;
    let frame = ctx.body().get("id").cloned().unwrap_or(Value::Null);
    session.driver().switch_frame(&frame)?;
    session.clear_elements();
    Ok(done())
}
