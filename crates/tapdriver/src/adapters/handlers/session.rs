use std::time::Duration;

use serde_json::{Map, Value, json};

use super::common::done;
use crate::adapters::command::CommandContext;
use crate::adapters::payload::PayloadExt;
use crate::domain::{Capabilities, TimeoutKind};
use crate::usecases::ports::DriverError;

pub const SERVER_NAME: &str = "tapdriver";

pub fn status(_ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    Ok(json!({
        "build": { "version": env!("CARGO_PKG_VERSION"), "name": SERVER_NAME },
        "os": { "arch": std::env::consts::ARCH, "name": std::env::consts::OS },
        "ready": true,
    }))
}

pub fn new_session(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let capabilities = match ctx.body().get("desiredCapabilities") {
        None | Some(Value::Null) => Capabilities::default(),
        Some(Value::Object(map)) => Capabilities::new(map.clone()),
        Some(_) => {
            return Err(DriverError::SessionNotCreated(
                "desiredCapabilities must be a JSON object".to_string(),
            ));
        }
    };
    let session = ctx.usecases.sessions.create(capabilities)?;
    Ok(session.capabilities().to_value())
}

pub fn list_sessions(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let sessions: Vec<Value> = ctx
        .usecases
        .sessions
        .list()
        .iter()
        .map(|session| {
            json!({
                "id": session.id().as_str(),
                "capabilities": session.capabilities().to_value(),
            })
        })
        .collect();
    Ok(Value::Array(sessions))
}

pub fn get_session(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    Ok(ctx.session()?.capabilities().to_value())
}

pub fn delete_session(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let id = ctx.param("sessionId")?;
    ctx.usecases.sessions.delete(id);
    Ok(done())
}

fn millis(ctx: &CommandContext<'_>) -> Result<Duration, DriverError> {
    ctx.body().req_u64("ms").map(Duration::from_millis)
}

pub fn set_implicit_wait(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    ctx.session()?.set_timeout(TimeoutKind::Implicit, millis(ctx)?);
    Ok(done())
}

pub fn set_async_script_timeout(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    ctx.session()?.set_timeout(TimeoutKind::Script, millis(ctx)?);
    Ok(done())
}

pub fn set_timeouts(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let kind = ctx.body().req_str("type")?;
    let kind = TimeoutKind::parse(kind)
        .ok_or_else(|| DriverError::InvalidArgument(format!("Unknown timeout type '{kind}'")))?;
    ctx.session()?.set_timeout(kind, millis(ctx)?);
    Ok(done())
}

/// `{command, ...options}`; options merge into what the command already has.
pub fn configure(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let command = ctx.body().req_str("command")?;
    let options: Map<String, Value> = ctx
        .body()
        .as_object()
        .into_iter()
        .flatten()
        .filter(|(key, _)| key.as_str() != "command")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    ctx.session()?.configure(command, options);
    Ok(done())
}

pub fn get_configuration(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let command = ctx.param("command")?;
    Ok(Value::Object(
        ctx.session()?.command_config(command).unwrap_or_default(),
    ))
}
