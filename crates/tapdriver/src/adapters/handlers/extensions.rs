use serde_json::Value;

use super::common::done;
use crate::adapters::command::CommandContext;
use crate::adapters::payload::PayloadExt;
use crate::usecases::ports::DriverError;

pub fn load_extension(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    ctx.session()?;
    let name = ctx.body().req_str("name")?;
    ctx.usecases.extensions.load(name)?;
    Ok(done())
}

pub fn execute_extension(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let name = ctx.param("name")?;
    let args = extension_args(ctx.body());
    ctx.usecases
        .extensions
        .execute(ctx.session()?, name, &args)
}

/// `args` or `payload` when present, else the body itself. Arrays spread
/// into the argument list; an empty body means no arguments.
fn extension_args(body: &Value) -> Vec<Value> {
    let payload = body
        .get("args")
        .or_else(|| body.get("payload"))
        .unwrap_or(body);
    match payload {
        Value::Array(args) => args.clone(),
        Value::Null => Vec::new(),
        Value::Object(map) if map.is_empty() => Vec::new(),
        other => vec![other.clone()],
    }
}
