use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use super::common::done;
use crate::adapters::command::CommandContext;
use crate::adapters::payload::PayloadExt;
use crate::domain::Orientation;
use crate::usecases::ports::DriverError;

pub fn keys(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let text = ctx.body().keys_text()?;
    ctx.driver()?.send_keys_to_active(&text)?;
    Ok(done())
}

fn script_args(body: &Value) -> Result<Vec<Value>, DriverError> {
    match body.get("args") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(args)) => Ok(args.clone()),
        Some(_) => Err(DriverError::InvalidArgument(
            "Script arguments must be an array".to_string(),
        )),
    }
}

/// In NATIVE_APP a script naming a bundled extension runs that extension.
pub fn execute(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let script = ctx.body().req_str("script")?;
    let args = script_args(ctx.body())?;
    let session = ctx.session()?;
    if !session.current_context().is_web() {
        if let Some(result) = ctx.usecases.extensions.run_script(session, script, &args) {
            return result;
        }
    }
    session.driver().execute_script(script, &args)
}

pub fn execute_async(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let script = ctx.body().req_str("script")?;
    let args = script_args(ctx.body())?;
    let session = ctx.session()?;
    session
        .driver()
        .execute_async_script(script, &args, session.timeouts().script)
}

/// Base64 PNG of the current screen.
pub fn screenshot(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let png = ctx.driver()?.screenshot()?;
    Ok(Value::String(STANDARD.encode(png)))
}

pub fn page_source(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    Ok(Value::String(ctx.driver()?.page_source()?))
}

pub fn get_orientation(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let orientation = ctx.driver()?.orientation()?;
    serde_json::to_value(orientation)
        .map_err(|err| DriverError::unknown_with_source("Could not encode orientation", err))
}

pub fn set_orientation(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let value = ctx.body().req_str("orientation")?;
    let orientation = Orientation::parse(value).ok_or_else(|| {
        DriverError::InvalidArgument(format!("Unknown orientation '{value}'"))
    })?;
    ctx.driver()?.rotate(orientation)?;
    Ok(done())
}

pub fn get_brightness(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    Ok(Value::from(ctx.driver()?.brightness()?))
}

/// Levels outside 0..=1 are clamped; 0 turns the screen off.
pub fn set_brightness(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let level = ctx.body().req_f64("brightness")?;
    if !level.is_finite() {
        return Err(DriverError::InvalidArgument(format!(
            "Brightness must be a number, got {level}"
        )));
    }
    ctx.driver()?.set_brightness(level.clamp(0.0, 1.0))?;
    Ok(done())
}
