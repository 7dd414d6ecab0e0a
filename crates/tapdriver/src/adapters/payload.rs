//! Typed access to JSON command bodies.
//!
//! Missing or mistyped fields become `InvalidArgument`, naming the field.

use serde_json::{Map, Value};

use crate::domain::{
    ActionBatch, ActionChain, ElementId, FlickGesture, Locator, LocatorError, Point, PointerAction,
    PointerOrigin, ScrollGesture,
};
use crate::usecases::ports::DriverError;

/// Only this input device is understood by the action scheduler.
pub const TOUCH_DEVICE: &str = "touch";

fn missing(key: &str) -> DriverError {
    DriverError::InvalidArgument(format!("Missing or invalid parameter '{key}'"))
}

pub trait PayloadExt {
    fn opt_str(&self, key: &str) -> Option<&str>;
    fn req_str(&self, key: &str) -> Result<&str, DriverError>;
    fn opt_i32(&self, key: &str) -> Option<i32>;
    fn req_i32(&self, key: &str) -> Result<i32, DriverError>;
    fn req_u64(&self, key: &str) -> Result<u64, DriverError>;
    fn req_f64(&self, key: &str) -> Result<f64, DriverError>;
    fn opt_object(&self, key: &str) -> Option<&Map<String, Value>>;
    /// Element handle given either as a string or as `{"ELEMENT": id}`.
    fn opt_element(&self, key: &str) -> Option<ElementId>;
    /// `value: ["a", "b"]` joined into one string.
    fn keys_text(&self) -> Result<String, DriverError>;
}

impl PayloadExt for Value {
    fn opt_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn req_str(&self, key: &str) -> Result<&str, DriverError> {
        self.opt_str(key).ok_or_else(|| missing(key))
    }

    fn opt_i32(&self, key: &str) -> Option<i32> {
        let value = self.get(key)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f.round() as i64))
            .and_then(|n| i32::try_from(n).ok())
    }

    fn req_i32(&self, key: &str) -> Result<i32, DriverError> {
        self.opt_i32(key).ok_or_else(|| missing(key))
    }

    fn req_u64(&self, key: &str) -> Result<u64, DriverError> {
        let value = self.get(key).ok_or_else(|| missing(key))?;
        value
            .as_u64()
            .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .ok_or_else(|| missing(key))
    }

    fn req_f64(&self, key: &str) -> Result<f64, DriverError> {
        let value = self.get(key).ok_or_else(|| missing(key))?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| missing(key))
    }

    fn opt_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    fn opt_element(&self, key: &str) -> Option<ElementId> {
        ElementId::from_wire(self.get(key)?)
    }

    fn keys_text(&self) -> Result<String, DriverError> {
        match self.get("value") {
            Some(Value::Array(parts)) => Ok(parts
                .iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()),
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(missing("value")),
        }
    }
}

pub fn element_json(id: &ElementId) -> Value {
    id.to_wire()
}

/// `{using, value}` to a locator; bad strategies are InvalidSelector.
pub fn parse_locator(body: &Value) -> Result<Locator, DriverError> {
    let using = body.req_str("using")?;
    let value = body.opt_str("value").unwrap_or_default();
    Locator::parse(using, value).map_err(|err| match err {
        LocatorError::UnknownStrategy(_) | LocatorError::EmptyValue(_) => {
            DriverError::InvalidSelector(err.to_string())
        }
    })
}

pub fn parse_scroll(body: &Value) -> Result<ScrollGesture, DriverError> {
    let x_offset = body.req_i32("xoffset")?;
    let y_offset = body.req_i32("yoffset")?;
    Ok(match body.opt_element("element") {
        Some(element) => ScrollGesture::FromElement {
            element,
            x_offset,
            y_offset,
        },
        None => ScrollGesture::Offset { x_offset, y_offset },
    })
}

pub fn parse_flick(body: &Value) -> Result<FlickGesture, DriverError> {
    match body.opt_element("element") {
        Some(element) => Ok(FlickGesture::FromElement {
            element,
            x_offset: body.req_i32("xoffset")?,
            y_offset: body.req_i32("yoffset")?,
            speed: body.req_i32("speed")?,
        }),
        None => Ok(FlickGesture::Speed {
            x_speed: body.req_i32("xspeed")?,
            y_speed: body.req_i32("yspeed")?,
        }),
    }
}

fn parse_origin(action: &Value, name: &str) -> Result<PointerOrigin, DriverError> {
    match action.opt_element("element") {
        Some(element) => Ok(PointerOrigin::Element {
            element,
            offset: Point::new(
                action.opt_i32("x").unwrap_or(0),
                action.opt_i32("y").unwrap_or(0),
            ),
        }),
        None => {
            let (Some(x), Some(y)) = (action.opt_i32("x"), action.opt_i32("y")) else {
                return Err(DriverError::InvalidArgument(format!(
                    "Action '{name}' needs an element or both x and y"
                )));
            };
            Ok(PointerOrigin::Viewport(Point::new(x, y)))
        }
    }
}

fn parse_action(action: &Value) -> Result<PointerAction, DriverError> {
    let name = action.req_str("name")?;
    match name {
        "pointerDown" => Ok(PointerAction::Down(parse_origin(action, name)?)),
        "pointerMove" => Ok(PointerAction::Move(parse_origin(action, name)?)),
        "pointerUp" => Ok(PointerAction::Up),
        "pointerCancel" => Ok(PointerAction::Cancel),
        "pause" => {
            let ms = action.get("ms").map(|_| action.req_u64("ms")).transpose()?;
            Ok(PointerAction::Pause(std::time::Duration::from_millis(
                ms.unwrap_or(0),
            )))
        }
        other => Err(DriverError::UnsupportedOperation(format!(
            "Action: {other} was not recognised."
        ))),
    }
}

/// `{payload: [{inputDevice, id?, actions: [...]}]}` to a batch.
///
/// Each chain's pointer id is its index in the payload.
pub fn parse_action_batch(body: &Value) -> Result<ActionBatch, DriverError> {
    let chains = body
        .get("payload")
        .or_else(|| body.get("actions"))
        .and_then(Value::as_array)
        .ok_or_else(|| missing("payload"))?;

    let mut parsed = Vec::with_capacity(chains.len());
    for (index, chain) in chains.iter().enumerate() {
        let device = chain.req_str("inputDevice")?;
        if device != TOUCH_DEVICE {
            return Err(DriverError::UnsupportedOperation(format!(
                "Input device '{device}' is not supported"
            )));
        }
        let actions = chain
            .get("actions")
            .and_then(Value::as_array)
            .ok_or_else(|| missing("actions"))?
            .iter()
            .map(parse_action)
            .collect::<Result<Vec<_>, _>>()?;
        let label = chain.opt_str("id").unwrap_or(device);
        parsed.push(ActionChain::new(label, index, actions));
    }
    Ok(ActionBatch::new(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Strategy;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_parse_locator() {
        let locator = parse_locator(&json!({"using": "id", "value": "login"})).unwrap();
        assert_eq!(locator.strategy, Strategy::Id);
        assert!(matches!(
            parse_locator(&json!({"using": "-ios predicate", "value": "x"})),
            Err(DriverError::InvalidSelector(_))
        ));
        assert!(matches!(
            parse_locator(&json!({"using": "id", "value": ""})),
            Err(DriverError::InvalidSelector(_))
        ));
        assert!(matches!(
            parse_locator(&json!({"value": "x"})),
            Err(DriverError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_keys_text_joins_parts() {
        assert_eq!(json!({"value": ["he", "llo", 1]}).keys_text().unwrap(), "hello1");
        assert!(json!({}).keys_text().is_err());
    }

    #[test]
    fn test_opt_element_accepts_both_forms() {
        assert_eq!(json!({"element": "4"}).opt_element("element"), Some(ElementId::new("4")));
        assert_eq!(
            json!({"element": {"ELEMENT": "5"}}).opt_element("element"),
            Some(ElementId::new("5"))
        );
        assert_eq!(json!({"element": ""}).opt_element("element"), None);
    }

    #[test]
    fn test_numbers_accept_floats() {
        assert_eq!(json!({"x": 10.6}).opt_i32("x"), Some(11));
        assert_eq!(json!({"x": "10"}).opt_i32("x"), None);
    }

    #[test]
    fn test_parse_action_batch() {
        let body = json!({"payload": [
            {"inputDevice": "touch", "id": "finger1", "actions": [
                {"name": "pointerDown", "x": 10, "y": 20},
                {"name": "pause", "ms": 100},
                {"name": "pointerMove", "element": "7", "x": 3},
                {"name": "pointerUp"}
            ]},
            {"inputDevice": "touch", "actions": [{"name": "pointerCancel"}]}
        ]});
        let batch = parse_action_batch(&body).unwrap();
        assert_eq!(batch.len(), 2);
        let first = &batch.chains()[0];
        assert_eq!(first.device(), "finger1");
        assert_eq!(first.context.pointer_id, 0);
        assert_eq!(
            first.peek_next(),
            Some(&PointerAction::Down(PointerOrigin::Viewport(Point::new(10, 20))))
        );
        assert_eq!(batch.chains()[1].context.pointer_id, 1);
        assert_eq!(batch.tick_count(), 4);

        let mut chain = first.clone();
        chain.advance();
        assert_eq!(chain.advance(), Some(PointerAction::Pause(Duration::from_millis(100))));
        assert_eq!(
            chain.advance(),
            Some(PointerAction::Move(PointerOrigin::Element {
                element: ElementId::new("7"),
                offset: Point::new(3, 0),
            }))
        );
    }

    #[test]
    fn test_unknown_action_name() {
        let body = json!({"payload": [{"inputDevice": "touch", "actions": [{"name": "wiggle"}]}]});
        match parse_action_batch(&body).unwrap_err() {
            DriverError::UnsupportedOperation(message) => {
                assert_eq!(message, "Action: wiggle was not recognised.")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_non_touch_device_is_unsupported() {
        let body = json!({"payload": [{"inputDevice": "keyboard", "actions": []}]});
        assert!(matches!(
            parse_action_batch(&body),
            Err(DriverError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_position_without_element_needs_both_coordinates() {
        let body = json!({"payload": [{"inputDevice": "touch", "actions": [{"name": "pointerDown", "x": 1}]}]});
        assert!(matches!(
            parse_action_batch(&body),
            Err(DriverError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_gestures() {
        assert_eq!(
            parse_scroll(&json!({"xoffset": 0, "yoffset": -300})).unwrap(),
            ScrollGesture::Offset {
                x_offset: 0,
                y_offset: -300
            }
        );
        assert_eq!(
            parse_flick(&json!({"xspeed": 10, "yspeed": 20})).unwrap(),
            FlickGesture::Speed {
                x_speed: 10,
                y_speed: 20
            }
        );
        assert!(parse_flick(&json!({"element": "1", "xoffset": 1})).is_err());
    }
}
