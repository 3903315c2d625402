use crate::config::StyleState;
use crate::controller::Control;
use crate::page::Placement;
use serde::Serialize;
use std::collections::HashMap;

/// The host side of a booklet: whatever actually styles and animates page
/// elements and owns the control buttons.
pub trait Surface {
    type Element;

    /// Absolute positioning, height and stacking order.
    fn place(&mut self, element: &Self::Element, placement: Placement);

    /// Sets width and right offset immediately, cancelling any transition.
    fn apply_style(&mut self, element: &Self::Element, state: StyleState);

    /// Transitions width and right offset to `state` over `duration_ms`.
    fn animate_to(&mut self, element: &Self::Element, state: StyleState, duration_ms: u32);

    /// Adds or removes the disabled marker on every element of `control`.
    fn set_disabled(&mut self, control: Control, disabled: bool);

    /// Broadcasts the close signal to the host.
    fn emit_close(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SurfaceCall<E> {
    Place {
        element: E,
        placement: Placement,
    },
    ApplyStyle {
        element: E,
        state: StyleState,
    },
    AnimateTo {
        element: E,
        state: StyleState,
        duration_ms: u32,
    },
    SetDisabled {
        control: Control,
        disabled: bool,
    },
    EmitClose,
}

/// Surface that only writes down what it was asked to do.
#[derive(Debug, Clone)]
pub struct RecordingSurface<E> {
    calls: Vec<SurfaceCall<E>>,
    disabled: HashMap<Control, bool>,
}

impl<E> Default for RecordingSurface<E> {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            disabled: HashMap::new(),
        }
    }
}

impl<E: Clone> RecordingSurface<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SurfaceCall<E>] {
        &self.calls
    }

    /// Takes the calls recorded since the last drain.
    pub fn drain(&mut self) -> Vec<SurfaceCall<E>> {
        std::mem::take(&mut self.calls)
    }

    /// Whether `control` currently carries the disabled marker.
    pub fn is_disabled(&self, control: Control) -> bool {
        self.disabled.get(&control).copied().unwrap_or(false)
    }

    pub fn close_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SurfaceCall::EmitClose))
            .count()
    }

    /// Elements that were animated, in order.
    pub fn animated(&self) -> Vec<E> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::AnimateTo { element, .. } => Some(element.clone()),
                _ => None,
            })
            .collect()
    }
}

impl<E: Clone> Surface for RecordingSurface<E> {
    type Element = E;

    fn place(&mut self, element: &E, placement: Placement) {
        self.calls.push(SurfaceCall::Place {
            element: element.clone(),
            placement,
        });
    }

    fn apply_style(&mut self, element: &E, state: StyleState) {
        self.calls.push(SurfaceCall::ApplyStyle {
            element: element.clone(),
            state,
        });
    }

    fn animate_to(&mut self, element: &E, state: StyleState, duration_ms: u32) {
        self.calls.push(SurfaceCall::AnimateTo {
            element: element.clone(),
            state,
            duration_ms,
        });
    }

    fn set_disabled(&mut self, control: Control, disabled: bool) {
        self.disabled.insert(control, disabled);
        self.calls
            .push(SurfaceCall::SetDisabled { control, disabled });
    }

    fn emit_close(&mut self) {
        self.calls.push(SurfaceCall::EmitClose);
    }
}
