use serde::{Deserialize, Serialize};

use crate::{Element, ElementFlags, ElementId, ElementKind, Endpoint, ModelError, Result};

/// Editable property of an element.
///
/// A closed descriptor table instead of string-keyed dynamic bags: every key
/// knows which element kinds it applies to and which value shape it holds,
/// so commands can be validated when they are built rather than when they
/// run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    Label,
    Flags,
    SourceState,
    TargetState,
    Guard,
    Signal,
    Timeout,
}

impl PropertyKey {
    /// All property keys
    pub const ALL: [PropertyKey; 7] = [
        PropertyKey::Label,
        PropertyKey::Flags,
        PropertyKey::SourceState,
        PropertyKey::TargetState,
        PropertyKey::Guard,
        PropertyKey::Signal,
        PropertyKey::Timeout,
    ];

    /// Whether elements of `kind` carry this property
    pub fn applies_to(self, kind: ElementKind) -> bool {
        match self {
            PropertyKey::Label | PropertyKey::Flags => true,
            PropertyKey::SourceState | PropertyKey::TargetState | PropertyKey::Guard => kind.is_transition(),
            PropertyKey::Signal => kind == ElementKind::SignalTransition,
            PropertyKey::Timeout => kind == ElementKind::TimeoutTransition,
        }
    }

    /// Whether `value` has the shape this key stores
    pub fn accepts(self, value: &PropertyValue) -> bool {
        match self {
            PropertyKey::Label | PropertyKey::Guard | PropertyKey::Signal => matches!(value, PropertyValue::Text(_)),
            PropertyKey::Flags => matches!(value, PropertyValue::Flags(_)),
            PropertyKey::SourceState | PropertyKey::TargetState => matches!(value, PropertyValue::ElementRef(_)),
            PropertyKey::Timeout => matches!(value, PropertyValue::Millis(_)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PropertyKey::Label => "label",
            PropertyKey::Flags => "flags",
            PropertyKey::SourceState => "sourceState",
            PropertyKey::TargetState => "targetState",
            PropertyKey::Guard => "guard",
            PropertyKey::Signal => "signal",
            PropertyKey::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tagged property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Text(String),
    Flags(ElementFlags),
    ElementRef(Option<ElementId>),
    Millis(u64),
}

impl PropertyValue {
    /// Shape name for error messages
    pub fn shape(&self) -> &'static str {
        match self {
            PropertyValue::Text(_) => "text",
            PropertyValue::Flags(_) => "flags",
            PropertyValue::ElementRef(_) => "element reference",
            PropertyValue::Millis(_) => "milliseconds",
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<ElementFlags> for PropertyValue {
    fn from(value: ElementFlags) -> Self {
        PropertyValue::Flags(value)
    }
}

/// Validate a key/value pair against the element it is meant for.
pub fn validate_property(element: &Element, key: PropertyKey, value: &PropertyValue) -> Result<()> {
    if !key.applies_to(element.kind()) {
        return Err(ModelError::PropertyNotApplicable {
            key,
            kind: element.kind(),
        });
    }
    if !key.accepts(value) {
        return Err(ModelError::PropertyTypeMismatch { key, shape: value.shape() });
    }
    Ok(())
}

/// Read a property. `None` when the key does not apply to the element's kind.
pub fn read_property(element: &Element, key: PropertyKey) -> Option<PropertyValue> {
    if !key.applies_to(element.kind()) {
        return None;
    }
    match key {
        PropertyKey::Label => Some(PropertyValue::Text(element.label.clone())),
        PropertyKey::Flags => Some(PropertyValue::Flags(element.flags)),
        PropertyKey::SourceState => Some(PropertyValue::ElementRef(element.endpoint(Endpoint::Source))),
        PropertyKey::TargetState => Some(PropertyValue::ElementRef(element.endpoint(Endpoint::Target))),
        PropertyKey::Guard => element.transition().map(|t| PropertyValue::Text(t.guard.clone())),
        PropertyKey::Signal => element.transition().map(|t| PropertyValue::Text(t.signal.clone())),
        PropertyKey::Timeout => element.transition().map(|t| PropertyValue::Millis(t.timeout_ms)),
    }
}

/// Write a non-endpoint property, returning the prior value.
///
/// Endpoint keys are rejected here; they need resolution checks against the
/// tree and go through [`crate::StateChart::set_transition_endpoint`].
pub(crate) fn write_plain_property(element: &mut Element, key: PropertyKey, value: PropertyValue) -> Result<PropertyValue> {
    validate_property(element, key, &value)?;
    let kind = element.kind();
    let old = match (key, value) {
        (PropertyKey::Label, PropertyValue::Text(text)) => PropertyValue::Text(std::mem::replace(&mut element.label, text)),
        (PropertyKey::Flags, PropertyValue::Flags(flags)) => PropertyValue::Flags(std::mem::replace(&mut element.flags, flags)),
        (PropertyKey::Guard, PropertyValue::Text(text)) => {
            let transition = element.transition_mut().ok_or(ModelError::PropertyNotApplicable { key, kind })?;
            PropertyValue::Text(std::mem::replace(&mut transition.guard, text))
        }
        (PropertyKey::Signal, PropertyValue::Text(text)) => {
            let transition = element.transition_mut().ok_or(ModelError::PropertyNotApplicable { key, kind })?;
            PropertyValue::Text(std::mem::replace(&mut transition.signal, text))
        }
        (PropertyKey::Timeout, PropertyValue::Millis(millis)) => {
            let transition = element.transition_mut().ok_or(ModelError::PropertyNotApplicable { key, kind })?;
            PropertyValue::Millis(std::mem::replace(&mut transition.timeout_ms, millis))
        }
        // Endpoint keys need resolution checks; the chart routes them to
        // set_transition_endpoint before this function is reached.
        (key, value) => return Err(ModelError::PropertyTypeMismatch { key, shape: value.shape() }),
    };
    Ok(old)
}
