use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Stable identifier of an element within a [`crate::StateChart`].
///
/// Ids are allocated by the chart and never reused for its lifetime, so a
/// stale id fails to resolve instead of silently pointing at a new element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(u64);

impl ElementId {
    pub(crate) const fn new(raw: u64) -> Self {
        ElementId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Capability flags controlling how a presentation layer may interact
    /// with an element.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u8 {
        /// Element can be moved by dragging
        const DRAG_ENABLED = 1 << 0;

        /// Element can be selected
        const SELECTABLE = 1 << 1;

        /// Element label can be edited in place
        const EDITABLE = 1 << 2;
    }
}

// bitflags types don't derive serde; round-trip through the raw bits.
impl Serialize for ElementFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for ElementFlags {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Ok(ElementFlags::from_bits_truncate(bits))
    }
}

/// Kind of an element in the state-chart tree.
///
/// Closed sum: state-like kinds own children, transition-like kinds carry
/// non-owning source/target references.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Root composite of a chart
    StateMachine,
    /// Hierarchical state, may own child states and transitions
    State,
    /// History pseudo state (shallow/deep semantics live in the host)
    HistoryState,
    /// Final state
    FinalState,
    /// Initial/choice/junction style pseudo state
    PseudoState,
    /// Plain transition
    Transition,
    /// Transition triggered by a named signal
    SignalTransition,
    /// Transition triggered by a timeout
    TimeoutTransition,
}

impl ElementKind {
    /// All element kinds
    pub const ALL: [ElementKind; 8] = [
        ElementKind::StateMachine,
        ElementKind::State,
        ElementKind::HistoryState,
        ElementKind::FinalState,
        ElementKind::PseudoState,
        ElementKind::Transition,
        ElementKind::SignalTransition,
        ElementKind::TimeoutTransition,
    ];

    /// Whether elements of this kind may own children
    pub fn is_state(self) -> bool {
        matches!(
            self,
            ElementKind::StateMachine
                | ElementKind::State
                | ElementKind::HistoryState
                | ElementKind::FinalState
                | ElementKind::PseudoState
        )
    }

    /// Whether elements of this kind carry source/target endpoints
    pub fn is_transition(self) -> bool {
        !self.is_state()
    }

    /// Default capability flags for a freshly created element of this kind.
    /// The chart root stays in place; everything else is interactive.
    pub fn default_flags(self) -> ElementFlags {
        match self {
            ElementKind::StateMachine => ElementFlags::SELECTABLE | ElementFlags::EDITABLE,
            _ => ElementFlags::DRAG_ENABLED | ElementFlags::SELECTABLE | ElementFlags::EDITABLE,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::StateMachine => write!(f, "state machine"),
            ElementKind::State => write!(f, "state"),
            ElementKind::HistoryState => write!(f, "history state"),
            ElementKind::FinalState => write!(f, "final state"),
            ElementKind::PseudoState => write!(f, "pseudo state"),
            ElementKind::Transition => write!(f, "transition"),
            ElementKind::SignalTransition => write!(f, "signal transition"),
            ElementKind::TimeoutTransition => write!(f, "timeout transition"),
        }
    }
}

/// Endpoint slot of a transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Source,
    Target,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Target => write!(f, "target"),
        }
    }
}

/// Transition payload: non-owning endpoint references plus trigger data.
///
/// Endpoints may be `None` (dangling) while an edit is in flight, but once
/// set they must resolve to a state in the same chart; the chart enforces
/// that on every write and clears them when the referenced state is removed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionData {
    pub source: Option<ElementId>,
    pub target: Option<ElementId>,
    /// Guard expression, uninterpreted by the model
    #[serde(default)]
    pub guard: String,
    /// Signal name (signal transitions)
    #[serde(default)]
    pub signal: String,
    /// Timeout in milliseconds (timeout transitions)
    #[serde(default)]
    pub timeout_ms: u64,
}

/// One node's payload in the state-chart tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    kind: ElementKind,
    pub label: String,
    pub flags: ElementFlags,
    transition: Option<TransitionData>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Element {
            kind,
            label: String::new(),
            flags: kind.default_flags(),
            transition: kind.is_transition().then(TransitionData::default),
        }
    }

    pub fn with_label(kind: ElementKind, label: impl Into<String>) -> Self {
        let mut element = Element::new(kind);
        element.label = label.into();
        element
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Label for display, with a kind placeholder for unnamed elements
    pub fn display_string(&self) -> String {
        if self.label.is_empty() {
            format!("<unnamed {}>", self.kind)
        } else {
            self.label.clone()
        }
    }

    pub fn transition(&self) -> Option<&TransitionData> {
        self.transition.as_ref()
    }

    pub fn source(&self) -> Option<ElementId> {
        self.transition.as_ref().and_then(|t| t.source)
    }

    pub fn target(&self) -> Option<ElementId> {
        self.transition.as_ref().and_then(|t| t.target)
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> Option<ElementId> {
        match endpoint {
            Endpoint::Source => self.source(),
            Endpoint::Target => self.target(),
        }
    }

    /// Raw endpoint write without resolution checks. Only the chart may call
    /// this; [`crate::StateChart::set_transition_endpoint`] is the public way.
    pub(crate) fn set_endpoint_raw(&mut self, endpoint: Endpoint, state: Option<ElementId>) -> Option<ElementId> {
        let Some(transition) = self.transition.as_mut() else {
            return None;
        };
        match endpoint {
            Endpoint::Source => std::mem::replace(&mut transition.source, state),
            Endpoint::Target => std::mem::replace(&mut transition.target, state),
        }
    }

    pub(crate) fn transition_mut(&mut self) -> Option<&mut TransitionData> {
        self.transition.as_mut()
    }
}
