//! Pointer gesture primitives and per-device action chains.

use std::time::Duration;

use super::geometry::Point;
use super::session_types::ElementId;

/// Where a pointer primitive lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOrigin {
    /// Absolute viewport coordinates.
    Viewport(Point),
    /// An element's location shifted by `offset`.
    Element { element: ElementId, offset: Point },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerAction {
    Down(PointerOrigin),
    Up,
    Move(PointerOrigin),
    Pause(Duration),
    Cancel,
}

impl PointerAction {
    pub fn name(&self) -> &'static str {
        match self {
            PointerAction::Down(_) => "pointerDown",
            PointerAction::Up => "pointerUp",
            PointerAction::Move(_) => "pointerMove",
            PointerAction::Pause(_) => "pause",
            PointerAction::Cancel => "pointerCancel",
        }
    }

    pub fn is_pause(&self) -> bool {
        matches!(self, PointerAction::Pause(_))
    }
}

/// Pressed state and last known coordinates of one pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerContext {
    pub pointer_id: usize,
    pub pressed: bool,
    pub position: Point,
}

impl PointerContext {
    pub fn new(pointer_id: usize) -> Self {
        Self {
            pointer_id,
            pressed: false,
            position: Point::default(),
        }
    }

    pub fn press(&mut self, at: Point) {
        self.pressed = true;
        self.position = at;
    }

    pub fn move_to(&mut self, at: Point) {
        self.position = at;
    }

    pub fn release(&mut self) {
        self.pressed = false;
    }
}

/// Ordered primitives for one input device plus that device's pointer context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionChain {
    device: String,
    actions: Vec<PointerAction>,
    cursor: usize,
    pub context: PointerContext,
}

impl ActionChain {
    pub fn new(device: impl Into<String>, pointer_id: usize, actions: Vec<PointerAction>) -> Self {
        Self {
            device: device.into(),
            actions,
            cursor: 0,
            context: PointerContext::new(pointer_id),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.actions.len()
    }

    pub fn peek_next(&self) -> Option<&PointerAction> {
        self.actions.get(self.cursor)
    }

    /// Returns the next primitive and advances the cursor.
    pub fn advance(&mut self) -> Option<PointerAction> {
        let action = self.actions.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(action)
    }

    /// Rewinds the cursor and releases the pointer so the chain can run again.
    pub fn restart(&mut self) {
        self.cursor = 0;
        self.context = PointerContext::new(self.context.pointer_id);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn dispatch_count(&self) -> usize {
        self.actions.iter().filter(|a| !a.is_pause()).count()
    }
}

/// Chains supplied together; they advance in lock-step ticks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionBatch {
    chains: Vec<ActionChain>,
}

impl ActionBatch {
    pub fn new(chains: Vec<ActionChain>) -> Self {
        Self { chains }
    }

    pub fn chains(&self) -> &[ActionChain] {
        &self.chains
    }

    pub fn chains_mut(&mut self) -> &mut [ActionChain] {
        &mut self.chains
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn dispatch_count(&self) -> usize {
        self.chains.iter().map(ActionChain::dispatch_count).sum()
    }

    /// Length of the longest chain, i.e. the number of ticks the batch takes.
    pub fn tick_count(&self) -> usize {
        self.chains.iter().map(ActionChain::len).max().unwrap_or(0)
    }
}
