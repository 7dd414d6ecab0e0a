//! Single touch gestures. Element targets are hit at their centre.

use serde_json::Value;

use super::common::done;
use crate::adapters::command::CommandContext;
use crate::adapters::payload::{PayloadExt, parse_flick, parse_scroll};
use crate::domain::{ElementId, FlickGesture, Point, ScrollGesture};
use crate::usecases::ports::DriverError;

fn element_centre(ctx: &CommandContext<'_>, id: &ElementId) -> Result<Point, DriverError> {
    let session = ctx.session()?;
    let element = session.resolve(id)?;
    Ok(session.driver().rect(&element)?.center())
}

fn target(ctx: &CommandContext<'_>) -> Result<Point, DriverError> {
    let id = ctx
        .body()
        .opt_element("element")
        .ok_or_else(|| DriverError::InvalidArgument("Missing parameter 'element'".to_string()))?;
    element_centre(ctx, &id)
}

fn coordinates(ctx: &CommandContext<'_>) -> Result<Point, DriverError> {
    Ok(Point::new(ctx.body().req_i32("x")?, ctx.body().req_i32("y")?))
}

pub fn single_tap(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let at = target(ctx)?;
    ctx.driver()?.tap(at)?;
    Ok(done())
}

/// Inspector tap at raw screen coordinates; answers with an empty string.
pub fn inspector_tap(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let at = coordinates(ctx)?;
    ctx.driver()?.tap(at)?;
    Ok(Value::String(String::new()))
}

pub fn double_tap(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let at = target(ctx)?;
    ctx.driver()?.double_tap(at)?;
    Ok(done())
}

pub fn long_press(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let at = target(ctx)?;
    ctx.driver()?.long_press(at)?;
    Ok(done())
}

pub fn down(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    ctx.driver()?.touch_down(coordinates(ctx)?)?;
    Ok(done())
}

pub fn up(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    ctx.driver()?.touch_up(coordinates(ctx)?)?;
    Ok(done())
}

pub fn move_to(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    ctx.driver()?.touch_move(coordinates(ctx)?)?;
    Ok(done())
}

pub fn scroll(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    match parse_scroll(ctx.body())? {
        ScrollGesture::FromElement {
            element,
            x_offset,
            y_offset,
        } => {
            let from = element_centre(ctx, &element)?;
            ctx.driver()?.scroll(Some(from), x_offset, y_offset)?;
        }
        ScrollGesture::Offset { x_offset, y_offset } => {
            ctx.driver()?.scroll(None, x_offset, y_offset)?;
        }
    }
    Ok(done())
}

pub fn flick(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    match parse_flick(ctx.body())? {
        FlickGesture::FromElement {
            element,
            x_offset,
            y_offset,
            speed,
        } => {
            let from = element_centre(ctx, &element)?;
            ctx.driver()?.flick(from, x_offset, y_offset, speed)?;
        }
        FlickGesture::Speed { x_speed, y_speed } => {
            ctx.driver()?.flick_speed(x_speed, y_speed)?;
        }
    }
    Ok(done())
}
