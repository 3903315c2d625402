//! Page-turn state machine.
//!
//! [`Booklet`] owns the page registry and the current index. Every command
//! returns the [`Effect`]s the host has to carry out; effects with a delay
//! go on the host's timer queue, the rest are applied right away through
//! [`Booklet::apply`].

use crate::config::Settings;
use crate::page::{PageId, PageRegistry, Panel, TurnMethod};
use crate::surface::Surface;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Next,
    Prev,
    Close,
}

impl From<TurnMethod> for Control {
    fn from(method: TurnMethod) -> Self {
        match method {
            TurnMethod::Next => Control::Next,
            TurnMethod::Prev => Control::Prev,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Give a page its absolute layout.
    Place { page: PageId },
    /// Snap a page to its start state without animating.
    Reset { page: PageId },
    /// Run a page's `method` animation once `after_ms` have elapsed.
    Animate {
        page: PageId,
        method: TurnMethod,
        after_ms: u32,
    },
    SetDisabled { control: Control, disabled: bool },
    /// Broadcast the close signal.
    Close,
    /// Mark turn `turn` as finished animating.
    Settle { turn: u64, after_ms: u32 },
}

impl Effect {
    pub fn delay_ms(&self) -> u32 {
        match self {
            Effect::Animate { after_ms, .. } | Effect::Settle { after_ms, .. } => *after_ms,
            _ => 0,
        }
    }
}

/// Enabled/disabled state of the navigation controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

impl ControlState {
    pub fn for_position(current: usize, page_count: usize) -> Self {
        Self {
            prev_disabled: current == 0,
            next_disabled: current >= page_count,
        }
    }

    pub fn is_disabled(&self, control: Control) -> bool {
        match control {
            Control::Next => self.next_disabled,
            Control::Prev => self.prev_disabled,
            Control::Close => false,
        }
    }

    fn effects(&self) -> [Effect; 2] {
        [
            Effect::SetDisabled {
                control: Control::Prev,
                disabled: self.prev_disabled,
            },
            Effect::SetDisabled {
                control: Control::Next,
                disabled: self.next_disabled,
            },
        ]
    }
}

/// A turn whose animations have not all run yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTurn {
    pub id: u64,
    pub method: TurnMethod,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    page: PageId,
    x: i32,
    method: TurnMethod,
}

#[derive(Debug)]
pub struct Booklet<E> {
    settings: Settings,
    pages: PageRegistry<E>,
    current: usize,
    pending: Option<PendingTurn>,
    gesture: Option<Gesture>,
    turns: u64,
}

impl<E> Booklet<E> {
    pub fn new(
        settings: Settings,
        left: impl IntoIterator<Item = E>,
        right: impl IntoIterator<Item = E>,
    ) -> Self {
        let pages = PageRegistry::build(&settings, left, right);
        if pages.left.len() != pages.right.len() {
            debug!(
                left = pages.left.len(),
                right = pages.right.len(),
                "Panels differ in length, extra pages will not turn"
            );
        }
        Self {
            settings,
            pages,
            current: 0,
            pending: None,
            gesture: None,
            turns: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pages(&self) -> &PageRegistry<E> {
        &self.pages
    }

    /// Number of pages turned forward so far.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Upper bound of the current index.
    pub fn page_count(&self) -> usize {
        self.pages.pair_count()
    }

    pub fn pending(&self) -> Option<PendingTurn> {
        self.pending
    }

    pub fn controls(&self) -> ControlState {
        ControlState::for_position(self.current, self.page_count())
    }

    /// Initial layout: every page placed and reset, controls synced.
    pub fn mount(&self) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(self.pages.left.len() * 2 + 2);
        for page in self.pages.iter() {
            effects.push(Effect::Place { page: page.id });
            effects.push(Effect::Reset { page: page.id });
        }
        effects.extend(self.controls().effects());
        effects
    }

    pub fn turn_next(&mut self) -> Vec<Effect> {
        self.turn(TurnMethod::Next)
    }

    pub fn turn_prev(&mut self) -> Vec<Effect> {
        self.turn(TurnMethod::Prev)
    }

    pub fn turn(&mut self, method: TurnMethod) -> Vec<Effect> {
        if let Some(pending) = self.pending.filter(|_| self.settings.serialize_turns) {
            debug!(
                method = method.as_str(),
                pending = pending.id,
                "Turn rejected, previous turn still animating"
            );
            return Vec::new();
        }

        let (index, order) = match method {
            TurnMethod::Next if self.current < self.page_count() => {
                (self.current, [Panel::Right, Panel::Left])
            }
            TurnMethod::Prev if self.current > 0 => (self.current - 1, [Panel::Left, Panel::Right]),
            _ => {
                debug!(
                    method = method.as_str(),
                    current = self.current,
                    "Turn out of bounds, ignored"
                );
                return Vec::new();
            }
        };

        let speed = self.settings.speed;
        let mut effects = Vec::with_capacity(5);
        for (step, panel) in order.into_iter().enumerate() {
            effects.push(Effect::Animate {
                page: PageId::new(panel, index),
                method,
                after_ms: speed.saturating_mul(step as u32),
            });
        }

        self.current = match method {
            TurnMethod::Next => self.current + 1,
            TurnMethod::Prev => self.current - 1,
        };
        self.turns += 1;
        self.pending = Some(PendingTurn {
            id: self.turns,
            method,
        });
        effects.push(Effect::Settle {
            turn: self.turns,
            after_ms: speed.saturating_mul(2),
        });
        effects.extend(self.controls().effects());

        info!(
            method = method.as_str(),
            current = self.current,
            page_count = self.page_count(),
            "Turned page"
        );
        effects
    }

    /// A click on one of the controls.
    pub fn click(&mut self, control: Control) -> Vec<Effect> {
        match control {
            Control::Close => {
                info!("Close requested");
                vec![Effect::Close]
            }
            Control::Next | Control::Prev if self.controls().is_disabled(control) => {
                debug!(?control, "Click on disabled control ignored");
                Vec::new()
            }
            Control::Next => self.turn(TurnMethod::Next),
            Control::Prev => self.turn(TurnMethod::Prev),
        }
    }

    /// Starts a drag gesture on `page`. Replaces any gesture still open.
    pub fn pointer_down(&mut self, page: PageId, x: i32) {
        self.gesture = self.pages.get(page).map(|p| Gesture {
            page,
            x,
            method: p.method,
        });
    }

    /// Ends the drag gesture started on `page`. The gesture is consumed
    /// whatever the outcome.
    pub fn pointer_up(&mut self, page: PageId, x: i32) -> Vec<Effect> {
        let gesture = match self.gesture {
            Some(gesture) if gesture.page == page => gesture,
            _ => return Vec::new(),
        };
        self.gesture = None;

        let delta = gesture.x.saturating_sub(x);
        let turns = match gesture.method {
            TurnMethod::Next => delta > 0,
            TurnMethod::Prev => delta < 0,
        };
        if !turns {
            debug!(
                delta,
                method = gesture.method.as_str(),
                "Drag did not match page direction"
            );
            return Vec::new();
        }
        self.turn(gesture.method)
    }

    pub fn settle(&mut self, turn: u64) {
        if self.pending.map(|p| p.id) == Some(turn) {
            self.pending = None;
        }
    }

    /// Carries out `effect` on `surface`. Effects naming a page that does
    /// not exist are skipped.
    pub fn apply<S>(&mut self, effect: &Effect, surface: &mut S)
    where
        S: Surface<Element = E>,
    {
        match *effect {
            Effect::Place { page } => {
                if let Some(page) = self.pages.get(page) {
                    surface.place(&page.element, page.placement(self.settings.page.height));
                }
            }
            Effect::Reset { page } => {
                if let Some(page) = self.pages.get(page) {
                    surface.apply_style(&page.element, page.css.start);
                }
            }
            Effect::Animate { page, method, .. } => match self.pages.get(page) {
                Some(page) => {
                    let (from, to) = page.endpoints(method);
                    surface.apply_style(&page.element, from);
                    surface.animate_to(&page.element, to, self.settings.speed);
                }
                None => debug!(?page, "No page to animate"),
            },
            Effect::SetDisabled { control, disabled } => surface.set_disabled(control, disabled),
            Effect::Close => surface.emit_close(),
            Effect::Settle { turn, .. } => self.settle(turn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn booklet(pages: usize) -> Booklet<usize> {
        Booklet::new(Settings::default(), 0..pages, 100..100 + pages)
    }

    fn animations(effects: &[Effect]) -> Vec<(PageId, u32)> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Animate { page, after_ms, .. } => Some((*page, *after_ms)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn starts_at_front() {
        let b = booklet(3);
        assert_eq!(b.current(), 0);
        assert_eq!(b.page_count(), 3);
        assert_eq!(
            b.controls(),
            ControlState {
                prev_disabled: true,
                next_disabled: false
            }
        );
    }

    #[test]
    fn mount_places_and_resets_every_page() {
        let b = Booklet::new(Settings::default(), 0..2, 10..13);
        let effects = b.mount();
        let places = effects
            .iter()
            .filter(|e| matches!(e, Effect::Place { .. }))
            .count();
        let resets = effects
            .iter()
            .filter(|e| matches!(e, Effect::Reset { .. }))
            .count();
        assert_eq!(places, 5);
        assert_eq!(resets, 5);
        assert_eq!(
            &effects[effects.len() - 2..],
            &[
                Effect::SetDisabled {
                    control: Control::Prev,
                    disabled: true
                },
                Effect::SetDisabled {
                    control: Control::Next,
                    disabled: false
                },
            ]
        );
    }

    #[test]
    fn next_animates_right_then_left() {
        let mut b = booklet(3);
        let effects = b.turn_next();
        assert_eq!(
            animations(&effects),
            vec![
                (PageId::new(Panel::Right, 0), 0),
                (PageId::new(Panel::Left, 0), 720),
            ]
        );
        assert!(effects.iter().all(|e| !matches!(
            e,
            Effect::Animate {
                method: TurnMethod::Prev,
                ..
            }
        )));
        assert_eq!(b.current(), 1);
    }

    #[test]
    fn prev_animates_left_then_right_of_previous_pair() {
        let mut b = booklet(3);
        b.turn_next();
        b.turn_next();
        let effects = b.turn_prev();
        assert_eq!(
            animations(&effects),
            vec![
                (PageId::new(Panel::Left, 1), 0),
                (PageId::new(Panel::Right, 1), 720),
            ]
        );
        assert_eq!(b.current(), 1);
    }

    #[test]
    fn turn_emits_settle_and_control_state() {
        let mut b = booklet(1);
        let effects = b.turn_next();
        assert!(effects.contains(&Effect::Settle {
            turn: 1,
            after_ms: 1440
        }));
        assert!(effects.contains(&Effect::SetDisabled {
            control: Control::Next,
            disabled: true
        }));
        assert!(effects.contains(&Effect::SetDisabled {
            control: Control::Prev,
            disabled: false
        }));
    }

    #[test]
    fn out_of_bounds_turns_are_noops() {
        let mut b = booklet(1);
        assert!(b.turn_prev().is_empty());
        assert_eq!(b.current(), 0);
        b.turn_next();
        assert!(b.turn_next().is_empty());
        assert_eq!(b.current(), 1);
    }

    #[test]
    fn empty_booklet_is_inert() {
        let mut b = booklet(0);
        assert!(b.turn_next().is_empty());
        assert!(b.turn_prev().is_empty());
        assert_eq!(
            b.controls(),
            ControlState {
                prev_disabled: true,
                next_disabled: true
            }
        );
    }

    #[test]
    fn bounds_hold_for_any_call_sequence() {
        for n in 0..5 {
            for pattern in 0u32..256 {
                let mut b = booklet(n);
                for bit in 0..8 {
                    if pattern & (1 << bit) == 0 {
                        b.turn_next();
                    } else {
                        b.turn_prev();
                    }
                    assert!(b.current() <= n);
                    assert_eq!(b.controls(), ControlState::for_position(b.current(), n));
                }
            }
        }
    }

    #[test]
    fn next_then_prev_restores_index() {
        for start in 0..3 {
            let mut b = booklet(3);
            for _ in 0..start {
                b.turn_next();
            }
            b.turn_next();
            b.turn_prev();
            assert_eq!(b.current(), start);
        }
    }

    #[test]
    fn disabled_click_does_nothing() {
        let mut b = booklet(2);
        assert!(b.click(Control::Prev).is_empty());
        assert_eq!(b.current(), 0);
        b.click(Control::Next);
        b.click(Control::Next);
        assert!(b.click(Control::Next).is_empty());
        assert_eq!(b.current(), 2);
    }

    #[test]
    fn close_click_only_signals() {
        let mut b = booklet(2);
        b.turn_next();
        assert_eq!(b.click(Control::Close), vec![Effect::Close]);
        assert_eq!(b.current(), 1);
    }

    #[test]
    fn drag_left_on_right_page_turns_next() {
        let mut b = booklet(2);
        let page = PageId::new(Panel::Right, 0);
        b.pointer_down(page, 200);
        assert!(!b.pointer_up(page, 150).is_empty());
        assert_eq!(b.current(), 1);
    }

    #[test]
    fn drag_right_on_left_page_turns_prev() {
        let mut b = booklet(2);
        b.turn_next();
        let page = PageId::new(Panel::Left, 0);
        b.pointer_down(page, 100);
        let effects = b.pointer_up(page, 180);
        assert_eq!(animations(&effects).len(), 2);
        assert_eq!(b.current(), 0);
    }

    #[test]
    fn drag_without_matching_delta_does_nothing() {
        let mut b = booklet(2);
        b.turn_next();
        let page = PageId::new(Panel::Left, 0);
        b.pointer_down(page, 100);
        assert!(b.pointer_up(page, 100).is_empty());
        b.pointer_down(page, 100);
        assert!(b.pointer_up(page, 40).is_empty());
        assert_eq!(b.current(), 1);
    }

    #[test]
    fn gesture_is_single_shot() {
        let mut b = booklet(3);
        let page = PageId::new(Panel::Right, 0);
        b.pointer_down(page, 200);
        b.pointer_up(page, 100);
        assert!(b.pointer_up(page, 100).is_empty());
        assert_eq!(b.current(), 1);

        // consumed even when the drag went the wrong way
        b.pointer_down(page, 100);
        b.pointer_up(page, 200);
        assert!(b.pointer_up(page, 0).is_empty());
        assert_eq!(b.current(), 1);
    }

    #[test]
    fn pointer_up_elsewhere_keeps_gesture() {
        let mut b = booklet(3);
        let down = PageId::new(Panel::Right, 0);
        b.pointer_down(down, 200);
        assert!(b.pointer_up(PageId::new(Panel::Right, 1), 0).is_empty());
        assert!(!b.pointer_up(down, 0).is_empty());
    }

    #[test]
    fn pointer_down_on_missing_page_is_ignored() {
        let mut b = booklet(1);
        let ghost = PageId::new(Panel::Right, 9);
        b.pointer_down(ghost, 200);
        assert!(b.pointer_up(ghost, 0).is_empty());
    }

    #[test]
    fn overlapping_turns_allowed_by_default() {
        let mut b = booklet(3);
        b.turn_next();
        assert!(!b.turn_next().is_empty());
        assert_eq!(b.current(), 2);
    }

    #[test]
    fn serialized_turns_wait_for_settle() {
        let settings = Settings::from_options(&json!({"serializeTurns": true})).unwrap();
        let mut b = Booklet::new(settings, 0..3, 10..13);
        b.turn_next();
        assert!(b.turn_next().is_empty());
        assert_eq!(b.current(), 1);
        assert_eq!(
            b.pending(),
            Some(PendingTurn {
                id: 1,
                method: TurnMethod::Next
            })
        );
        b.settle(1);
        assert!(!b.turn_next().is_empty());
        assert_eq!(b.current(), 2);
    }

    #[test]
    fn stale_settle_keeps_newer_turn_pending() {
        let mut b = booklet(3);
        b.turn_next();
        b.turn_next();
        b.settle(1);
        assert_eq!(b.pending().map(|p| p.id), Some(2));
    }

    #[test]
    fn effects_serialize_with_tag() {
        let effect = Effect::Animate {
            page: PageId::new(Panel::Left, 2),
            method: TurnMethod::Prev,
            after_ms: 720,
        };
        assert_eq!(
            serde_json::to_value(effect).unwrap(),
            json!({
                "effect": "animate",
                "page": {"panel": "left", "index": 2},
                "method": "prev",
                "after_ms": 720
            })
        );
    }
}
