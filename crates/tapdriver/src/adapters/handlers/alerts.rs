use serde_json::Value;

use super::common::done;
use crate::adapters::command::CommandContext;
use crate::adapters::payload::PayloadExt;
use crate::usecases::ports::DriverError;

pub fn alert_text(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    Ok(Value::String(ctx.driver()?.alert_text()?))
}

pub fn set_alert_text(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let text = ctx.body().req_str("text")?;
    ctx.driver()?.set_alert_text(text)?;
    Ok(done())
}

pub fn accept_alert(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    ctx.driver()?.accept_alert()?;
    Ok(done())
}

pub fn dismiss_alert(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    ctx.driver()?.dismiss_alert()?;
    Ok(done())
}
