//! A booklet wired to a surface and a virtual-clock timer queue.
//!
//! This is the single writer of a booklet outside the browser: every host
//! interaction goes through [`Session::handle`], which runs immediate
//! effects on the surface and parks delayed ones on the [`Timeline`].

use crate::controller::{Booklet, Control, Effect};
use crate::page::{PageId, TurnMethod};
use crate::surface::Surface;
use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// One host interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Turn { method: TurnMethod },
    Click { control: Control },
    PointerDown { page: PageId, x: i32 },
    PointerUp { page: PageId, x: i32 },
    /// Let `ms` milliseconds pass, running whatever falls due.
    Wait { ms: u64 },
}

pub struct Session<S: Surface> {
    booklet: Booklet<S::Element>,
    surface: S,
    timeline: Timeline<Effect>,
}

impl<S: Surface> Session<S> {
    /// Wraps `booklet` and lays it out on `surface`.
    pub fn new(booklet: Booklet<S::Element>, surface: S) -> Self {
        let mut session = Self {
            booklet,
            surface,
            timeline: Timeline::new(),
        };
        let effects = session.booklet.mount();
        session.dispatch(effects);
        session
    }

    pub fn booklet(&self) -> &Booklet<S::Element> {
        &self.booklet
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn now_ms(&self) -> u64 {
        self.timeline.now_ms()
    }

    pub fn current(&self) -> usize {
        self.booklet.current()
    }

    /// When the next delayed effect falls due.
    pub fn next_due(&self) -> Option<u64> {
        self.timeline.next_due()
    }

    /// Whether delayed effects are still waiting on the clock.
    pub fn is_idle(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn handle(&mut self, command: Command) {
        let effects = match command {
            Command::Turn { method } => self.booklet.turn(method),
            Command::Click { control } => self.booklet.click(control),
            Command::PointerDown { page, x } => {
                self.booklet.pointer_down(page, x);
                Vec::new()
            }
            Command::PointerUp { page, x } => self.booklet.pointer_up(page, x),
            Command::Wait { ms } => {
                self.advance(ms);
                Vec::new()
            }
        };
        self.dispatch(effects);
    }

    pub fn turn_next(&mut self) {
        self.handle(Command::Turn {
            method: TurnMethod::Next,
        });
    }

    pub fn turn_prev(&mut self) {
        self.handle(Command::Turn {
            method: TurnMethod::Prev,
        });
    }

    pub fn click(&mut self, control: Control) {
        self.handle(Command::Click { control });
    }

    /// Runs everything due within the next `ms` milliseconds.
    pub fn advance(&mut self, ms: u64) {
        let until = self.timeline.now_ms().saturating_add(ms);
        while let Some((at, effect)) = self.timeline.pop_due(until) {
            trace!(at, ?effect, "Timer fired");
            self.booklet.apply(&effect, &mut self.surface);
        }
        self.timeline.advance_clock(until);
    }

    /// Runs the queue dry.
    pub fn run_until_idle(&mut self) {
        while let Some(due) = self.timeline.next_due() {
            let now = self.timeline.now_ms();
            self.advance(due.saturating_sub(now));
        }
    }

    fn dispatch(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect.delay_ms() {
                0 => self.booklet.apply(&effect, &mut self.surface),
                delay => self.timeline.schedule(delay, effect),
            }
        }
    }
}
