use crate::geometry::{Corner, Point, Rectangle};
use crate::store::RectangleStore;

// ── Interaction State ───────────────────────────────────────────────────────

/// What the primary pointer is currently doing. Only one gesture can be in
/// progress, and every non-idle state names the rectangle it mutates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interaction {
    Idle,
    Drawing { index: usize, start: Point },
    Dragging { index: usize, last: Point },
    Resizing { index: usize, corner: Corner },
}

impl Interaction {
    fn target(&self) -> Option<usize> {
        match *self {
            Interaction::Idle => None,
            Interaction::Drawing { index, .. }
            | Interaction::Dragging { index, .. }
            | Interaction::Resizing { index, .. } => Some(index),
        }
    }

    fn with_target(self, new_index: usize) -> Self {
        match self {
            Interaction::Idle => Interaction::Idle,
            Interaction::Drawing { start, .. } => Interaction::Drawing {
                index: new_index,
                start,
            },
            Interaction::Dragging { last, .. } => Interaction::Dragging {
                index: new_index,
                last,
            },
            Interaction::Resizing { corner, .. } => Interaction::Resizing {
                index: new_index,
                corner,
            },
        }
    }
}

// ── Editor ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Editor {
    store: RectangleStore,
    interaction: Interaction,
    active: Option<usize>,
    draw_mode: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            store: RectangleStore::new(),
            interaction: Interaction::Idle,
            active: None,
            draw_mode: false,
        }
    }

    pub fn rectangles(&self) -> &RectangleStore {
        &self.store
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_rectangle(&self) -> Option<&Rectangle> {
        self.active.and_then(|i| self.store.get(i))
    }

    pub fn draw_mode(&self) -> bool {
        self.draw_mode
    }

    pub fn toggle_draw_mode(&mut self) {
        self.set_draw_mode(!self.draw_mode);
    }

    /// Only gates new rectangles; a gesture already running carries on.
    pub fn set_draw_mode(&mut self, enabled: bool) {
        if self.draw_mode != enabled {
            self.draw_mode = enabled;
            log::debug!("draw mode {}", if enabled { "on" } else { "off" });
        }
    }

    /// Returns whether a rectangle was started.
    pub fn pointer_down(&mut self, p: Point) -> bool {
        if !self.draw_mode || self.interaction != Interaction::Idle {
            return false;
        }
        let index = self.store.push(Rectangle::empty_at(p));
        self.interaction = Interaction::Drawing { index, start: p };
        log::trace!("drawing rectangle {index} from ({}, {})", p.x, p.y);
        true
    }

    pub fn pointer_move(&mut self, p: Point) {
        match self.interaction {
            Interaction::Idle => {}
            Interaction::Drawing { index, start } => {
                self.store.update(index, Rectangle::from_corners(start, p));
            }
            Interaction::Dragging { index, last } => {
                if let Some(rect) = self.store.get_mut(index) {
                    rect.translate(p.x - last.x, p.y - last.y);
                }
                self.interaction = Interaction::Dragging { index, last: p };
            }
            Interaction::Resizing { index, corner } => {
                if let Some(rect) = self.store.get_mut(index) {
                    rect.drag_corner(corner, p);
                }
            }
        }
    }

    /// Ends whatever gesture is running. A resize that dragged a corner past
    /// its opposite corner is flipped back to a non-negative size here.
    pub fn pointer_up(&mut self) {
        if let Interaction::Resizing { index, .. } = self.interaction {
            if let Some(rect) = self.store.get_mut(index).filter(|r| !r.is_normalized()) {
                *rect = rect.normalized();
                log::trace!("rectangle {index} flipped after resize");
            }
        }
        self.interaction = Interaction::Idle;
    }

    pub fn select(&mut self, index: usize) {
        if index < self.store.len() {
            self.active = Some(index);
        }
    }

    pub fn deselect(&mut self) {
        self.active = None;
    }

    pub fn begin_drag(&mut self, index: usize, p: Point) -> bool {
        if self.interaction != Interaction::Idle || self.active != Some(index) {
            return false;
        }
        self.interaction = Interaction::Dragging { index, last: p };
        true
    }

    pub fn begin_resize(&mut self, index: usize, corner: Corner) -> bool {
        if self.interaction != Interaction::Idle || self.active != Some(index) {
            return false;
        }
        self.interaction = Interaction::Resizing { index, corner };
        true
    }

    pub fn delete(&mut self, index: usize) -> Option<Rectangle> {
        let removed = self.store.remove(index)?;
        self.active = None;
        match self.interaction.target() {
            Some(target) if target == index => self.interaction = Interaction::Idle,
            Some(target) if target > index => {
                self.interaction = self.interaction.with_target(target - 1);
            }
            _ => {}
        }
        log::debug!("deleted rectangle {index}, {} left", self.store.len());
        Some(removed)
    }

    pub fn delete_active(&mut self) -> Option<Rectangle> {
        self.active.and_then(|i| self.delete(i))
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.active = None;
        self.interaction = Interaction::Idle;
    }

    pub fn coordinate_report(&self) -> Vec<String> {
        self.store
            .iter()
            .enumerate()
            .map(|(i, rect)| {
                let [p1, p2, p3, p4] = rect.corners();
                format!(
                    "Rectangle {}: p1({}, {}) p2({}, {}) p3({}, {}) p4({}, {})",
                    i + 1,
                    p1.x,
                    p1.y,
                    p2.x,
                    p2.y,
                    p3.x,
                    p3.y,
                    p4.x,
                    p4.y
                )
            })
            .collect()
    }
}
