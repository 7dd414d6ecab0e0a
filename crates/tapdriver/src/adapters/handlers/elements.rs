use serde_json::Value;

use super::common::{done, point_json, rect_json, size_json};
use crate::adapters::command::CommandContext;
use crate::adapters::payload::{PayloadExt, element_json, parse_locator};
use crate::usecases::ports::DriverError;
use crate::usecases::{FindElementUseCase, SEND_KEYS_COMMAND};

pub fn find_element(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let locator = parse_locator(ctx.body())?;
    let id = ctx.usecases.elements.find_one(ctx.session()?, &locator, None)?;
    Ok(element_json(&id))
}

pub fn find_elements(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let locator = parse_locator(ctx.body())?;
    let ids = ctx.usecases.elements.find_all(ctx.session()?, &locator, None)?;
    Ok(Value::Array(ids.iter().map(element_json).collect()))
}

pub fn find_child(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let locator = parse_locator(ctx.body())?;
    let root = ctx.param("id")?;
    let id = ctx
        .usecases
        .elements
        .find_one(ctx.session()?, &locator, Some(root))?;
    Ok(element_json(&id))
}

pub fn find_children(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let locator = parse_locator(ctx.body())?;
    let root = ctx.param("id")?;
    let ids = ctx
        .usecases
        .elements
        .find_all(ctx.session()?, &locator, Some(root))?;
    Ok(Value::Array(ids.iter().map(element_json).collect()))
}

pub fn active_element(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let id = ctx.usecases.elements.active(ctx.session()?)?;
    Ok(element_json(&id))
}

pub fn attribute(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    let name = ctx.param("name")?;
    Ok(ctx
        .driver()?
        .attribute(&element, name)?
        .map_or(Value::Null, Value::String))
}

pub fn clear(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    ctx.driver()?.clear(&element)?;
    Ok(done())
}

pub fn click(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    ctx.driver()?.click(&element)?;
    Ok(done())
}

pub fn submit(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    ctx.driver()?.submit(&element)?;
    Ok(done())
}

pub fn displayed(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    Ok(Value::Bool(ctx.driver()?.is_displayed(&element)?))
}

pub fn enabled(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    Ok(Value::Bool(ctx.driver()?.is_enabled(&element)?))
}

pub fn selected(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    Ok(Value::Bool(ctx.driver()?.is_selected(&element)?))
}

pub fn location(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    Ok(point_json(ctx.driver()?.rect(&element)?.origin()))
}

pub fn location_in_view(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    Ok(point_json(ctx.driver()?.location_in_view(&element)?))
}

pub fn size(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    Ok(size_json(ctx.driver()?.rect(&element)?.size()))
}

pub fn rect(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    Ok(rect_json(ctx.driver()?.rect(&element)?))
}

pub fn tag_name(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    Ok(Value::String(ctx.driver()?.tag_name(&element)?))
}

pub fn text(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    Ok(Value::String(ctx.driver()?.text(&element)?))
}

pub fn send_keys(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    let text = ctx.body().keys_text()?;
    let session = ctx.session()?;
    let native_events = session
        .command_config(SEND_KEYS_COMMAND)
        .and_then(|config| config.get("nativeEvents").and_then(Value::as_bool))
        .unwrap_or(true);
    tracing::debug!(native_events, chars = text.chars().count(), "Sending keys");
    let driver = session.driver();
    if !native_events {
        driver.clear(&element)?;
    }
    driver.send_keys(&element, &text)?;
    Ok(done())
}

pub fn equals(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    let other = ctx.element_param("other")?;
    Ok(Value::Bool(element == other))
}

pub fn element_source(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let element = ctx.element()?;
    ctx.driver()?.element_source(&element)
}
