use serde_json::{Value, json};
use tracing::{Span, info_span};

use crate::adapters::command::{CommandRequest, Handler};
use crate::domain::{Point, Rect, Size};

/// Span every dispatched command runs in; `session_id` is empty for
/// commands outside a session.
pub fn command_span(request: &CommandRequest, handler: &Handler) -> Span {
    info_span!(
        "command",
        method = %request.method,
        command = handler.name,
        session_id = request.session_id().unwrap_or_default()
    )
}

/// Value of commands that only report success.
pub fn done() -> Value {
    Value::Null
}

pub fn point_json(point: Point) -> Value {
    json!({ "x": point.x, "y": point.y })
}

pub fn size_json(size: Size) -> Value {
    json!({ "width": size.width, "height": size.height })
}

pub fn rect_json(rect: Rect) -> Value {
    json!({ "x": rect.x, "y": rect.y, "width": rect.width, "height": rect.height })
}
