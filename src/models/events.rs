//! Custom analytics events, event batches and click events

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::current_timestamp;
use crate::api::{ApiResponse, ChatbaseClient, Endpoint};
use crate::error::{ChatbaseError, Result};

/// A named event property holding one typed value.
///
/// When several slots are filled, `prepare` picks the first in the order
/// string, integer, float, bool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomEventProperty {
    pub property_name: String,
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default)]
    pub integer_value: Option<i64>,
    #[serde(default)]
    pub float_value: Option<f64>,
    #[serde(default)]
    pub bool_value: Option<bool>,
}

impl CustomEventProperty {
    /// Property with no value set. `prepare` fails until one is filled in.
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            ..Default::default()
        }
    }

    pub fn string(property_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            ..Self::new(property_name)
        }
    }

    pub fn integer(property_name: impl Into<String>, value: i64) -> Self {
        Self {
            integer_value: Some(value),
            ..Self::new(property_name)
        }
    }

    pub fn float(property_name: impl Into<String>, value: f64) -> Self {
        Self {
            float_value: Some(value),
            ..Self::new(property_name)
        }
    }

    pub fn boolean(property_name: impl Into<String>, value: bool) -> Self {
        Self {
            bool_value: Some(value),
            ..Self::new(property_name)
        }
    }

    /// Two-key wire object: `property_name` plus the first set value slot.
    pub fn prepare(&self) -> Result<Value> {
        let (key, value) = if let Some(ref v) = self.string_value {
            ("string_value", Value::from(v.as_str()))
        } else if let Some(v) = self.integer_value {
            ("integer_value", Value::from(v))
        } else if let Some(v) = self.float_value {
            let number = serde_json::Number::from_f64(v).ok_or_else(|| {
                ChatbaseError::InvalidEvent(format!(
                    "property '{}' has a non-finite float value",
                    self.property_name
                ))
            })?;
            ("float_value", Value::Number(number))
        } else if let Some(v) = self.bool_value {
            ("bool_value", Value::from(v))
        } else {
            return Err(ChatbaseError::InvalidEvent(format!(
                "property '{}' has no value set",
                self.property_name
            )));
        };

        let mut map = Map::with_capacity(2);
        map.insert("property_name".into(), Value::from(self.property_name.as_str()));
        map.insert(key.into(), value);
        Ok(Value::Object(map))
    }
}

/// Parses `name=value`. The value becomes an integer, a finite float or a
/// bool when it reads as one, otherwise a string.
impl FromStr for CustomEventProperty {
    type Err = ChatbaseError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, raw) = s.split_once('=').ok_or_else(|| {
            ChatbaseError::InvalidEvent(format!("expected name=value, got '{}'", s))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatbaseError::InvalidEvent(format!(
                "missing property name in '{}'",
                s
            )));
        }

        if let Ok(v) = raw.parse::<i64>() {
            return Ok(Self::integer(name, v));
        }
        if let Ok(v) = raw.parse::<f64>() {
            if v.is_finite() {
                return Ok(Self::float(name, v));
            }
        }
        match raw {
            "true" => Ok(Self::boolean(name, true)),
            "false" => Ok(Self::boolean(name, false)),
            _ => Ok(Self::string(name, raw)),
        }
    }
}

/// Input accepted by [`CustomEvent::add_property`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyInput {
    Property(CustomEventProperty),
    /// Raw keyed fields, e.g. `{"property_name": "p", "integer_value": 5}`.
    Fields(Map<String, Value>),
}

impl From<CustomEventProperty> for PropertyInput {
    fn from(property: CustomEventProperty) -> Self {
        PropertyInput::Property(property)
    }
}

impl From<Map<String, Value>> for PropertyInput {
    fn from(fields: Map<String, Value>) -> Self {
        PropertyInput::Fields(fields)
    }
}

impl TryFrom<Value> for PropertyInput {
    type Error = ChatbaseError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(PropertyInput::Fields(fields)),
            other => Err(ChatbaseError::InvalidEvent(format!(
                "wrong property type: {}",
                other
            ))),
        }
    }
}

impl TryFrom<PropertyInput> for CustomEventProperty {
    type Error = ChatbaseError;

    fn try_from(input: PropertyInput) -> Result<Self> {
        match input {
            PropertyInput::Property(property) => Ok(property),
            PropertyInput::Fields(fields) => serde_json::from_value(Value::Object(fields))
                .map_err(|e| ChatbaseError::InvalidEvent(format!("wrong property fields: {}", e))),
        }
    }
}

#[derive(Serialize)]
struct EventPayload<'a> {
    api_key: &'a str,
    user_id: &'a str,
    intent: &'a str,
    platform: &'a str,
    version: &'a str,
    timestamp_millis: i64,
    properties: Vec<Value>,
}

/// Custom analytics event with typed properties.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent {
    pub api_key: String,
    pub user_id: String,
    pub intent: String,
    pub platform: String,
    pub version: String,
    /// Epoch milliseconds; creation time unless overridden.
    pub timestamp_millis: i64,
    properties: Vec<CustomEventProperty>,
}

impl CustomEvent {
    pub fn new(
        api_key: impl Into<String>,
        user_id: impl Into<String>,
        intent: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            user_id: user_id.into(),
            intent: intent.into(),
            platform: platform.into(),
            version: String::new(),
            timestamp_millis: current_timestamp(),
            properties: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_timestamp_millis(mut self, timestamp_millis: i64) -> Self {
        self.timestamp_millis = timestamp_millis;
        self
    }

    pub fn properties(&self) -> &[CustomEventProperty] {
        &self.properties
    }

    /// Append a built property, or convert raw fields into one first.
    pub fn add_property(&mut self, property: impl Into<PropertyInput>) -> Result<()> {
        let property = CustomEventProperty::try_from(property.into())?;
        self.properties.push(property);
        Ok(())
    }

    /// Append a property given as a JSON value; only objects are accepted.
    pub fn add_property_value(&mut self, value: Value) -> Result<()> {
        self.add_property(PropertyInput::try_from(value)?)
    }

    fn payload(&self) -> Result<EventPayload<'_>> {
        let properties = self
            .properties
            .iter()
            .map(CustomEventProperty::prepare)
            .collect::<Result<Vec<_>>>()?;
        Ok(EventPayload {
            api_key: &self.api_key,
            user_id: &self.user_id,
            intent: &self.intent,
            platform: &self.platform,
            version: &self.version,
            timestamp_millis: self.timestamp_millis,
            properties,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.payload()?)?)
    }

    /// POST to `/apis/v1/events/insert`.
    pub fn send(&self, client: &ChatbaseClient) -> Result<ApiResponse> {
        client.post(Endpoint::Event, &self.api_key, self.to_json()?)
    }
}

#[derive(Serialize)]
struct BatchEventsPayload<'a> {
    api_key: &'a str,
    events: Vec<EventPayload<'a>>,
}

/// Batch of custom events sent in one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomBatchEvents {
    pub api_key: String,
    events: Vec<CustomEvent>,
}

impl CustomBatchEvents {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[CustomEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn add(&mut self, event: CustomEvent) {
        self.events.push(event);
    }

    pub fn to_json(&self) -> Result<String> {
        let events = self
            .events
            .iter()
            .map(CustomEvent::payload)
            .collect::<Result<Vec<_>>>()?;
        let payload = BatchEventsPayload {
            api_key: &self.api_key,
            events,
        };
        Ok(serde_json::to_string(&payload)?)
    }

    /// POST to `/apis/v1/events/insert_batch`.
    pub fn send(&self, client: &ChatbaseClient) -> Result<ApiResponse> {
        client.post(Endpoint::BatchEvents, &self.api_key, self.to_json()?)
    }
}

/// Link click tracked through the click API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClickEvent {
    pub api_key: String,
    pub url: String,
    pub platform: String,
    pub user_id: String,
    pub version: String,
}

impl ClickEvent {
    pub fn new(
        api_key: impl Into<String>,
        url: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            url: url.into(),
            platform: platform.into(),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// POST to `/api/click`.
    pub fn send(&self, client: &ChatbaseClient) -> Result<ApiResponse> {
        client.post(Endpoint::Click, &self.api_key, self.to_json()?)
    }
}
