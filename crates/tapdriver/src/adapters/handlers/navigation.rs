use serde_json::Value;

use super::common::done;
use crate::adapters::command::CommandContext;
use crate::adapters::payload::PayloadExt;
use crate::usecases::ports::DriverError;

pub fn current_url(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    Ok(Value::String(ctx.driver()?.current_url()?))
}

pub fn title(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    Ok(Value::String(ctx.driver()?.title()?))
}

pub fn open_url(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let url = ctx.body().req_str("url")?;
    let session = ctx.session()?;
    session.driver().navigate(url, session.timeouts().page_load)?;
    session.clear_elements();
    Ok(done())
}

pub fn back(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let session = ctx.session()?;
    session.driver().back()?;
    session.clear_elements();
    Ok(done())
}

pub fn forward(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let session = ctx.session()?;
    session.driver().forward()?;
    session.clear_elements();
    Ok(done())
}

pub fn refresh(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let session = ctx.session()?;
    session.driver().refresh()?;
    session.clear_elements();
    Ok(done())
}
