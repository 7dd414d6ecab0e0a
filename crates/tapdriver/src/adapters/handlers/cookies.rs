use serde_json::Value;

use super::common::done;
use crate::adapters::command::CommandContext;
use crate::domain::Cookie;
use crate::usecases::ports::DriverError;

pub fn get_cookies(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let cookies = ctx.driver()?.cookies()?;
    serde_json::to_value(cookies)
        .map_err(|err| DriverError::unknown_with_source("Could not encode cookies", err))
}

pub fn add_cookie(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let raw = ctx
        .body()
        .get("cookie")
        .cloned()
        .ok_or_else(|| DriverError::InvalidArgument("Missing parameter 'cookie'".to_string()))?;
    let cookie: Cookie = serde_json::from_value(raw)
        .map_err(|err| DriverError::InvalidArgument(format!("Invalid cookie: {err}")))?;
    ctx.driver()?.add_cookie(cookie)?;
    Ok(done())
}

pub fn delete_all_cookies(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    ctx.driver()?.delete_all_cookies()?;
    Ok(done())
}

pub fn delete_cookie(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let name = ctx.param("name")?;
    ctx.driver()?.delete_cookie(name)?;
    Ok(done())
}
