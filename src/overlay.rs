use crate::geometry::{self, Corner, Point, Rectangle};
use crate::interaction::Editor;

pub const HANDLE_RADIUS: f32 = 8.0;

const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 120, 255);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlayEvent {
    Select(usize),
    Delete(usize),
    MoveStart(usize),
    ResizeStart(usize, Corner),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Grab {
    Corner(Corner),
    Move,
}

pub fn handle_at(rect: &Rectangle, p: Point, radius: f32) -> Option<Corner> {
    Corner::ALL.into_iter().find(|&c| {
        let h = rect.corner(c);
        (p.x - h.x).abs() <= radius && (p.y - h.y).abs() <= radius
    })
}

/// What pressing at `p` would grab on the active rectangle. Corners win
/// over the move grip when a tiny rectangle makes them overlap.
pub fn grab_at(rect: &Rectangle, p: Point, radius: f32) -> Option<Grab> {
    if let Some(corner) = handle_at(rect, p, radius) {
        return Some(Grab::Corner(corner));
    }
    let c = rect.center();
    let (dx, dy) = (p.x - c.x, p.y - c.y);
    (dx * dx + dy * dy <= radius * radius).then_some(Grab::Move)
}

pub fn show(
    ui: &mut egui::Ui,
    editor: &Editor,
    image_origin: egui::Pos2,
    stroke: egui::Stroke,
) -> Vec<OverlayEvent> {
    let mut events = Vec::new();

    for (i, rect) in editor.rectangles().iter().enumerate() {
        let screen = geometry::screen_rect(rect, image_origin);
        ui.painter()
            .rect_stroke(screen, 0.0, stroke, egui::StrokeKind::Middle);

        let body = ui.interact(screen, ui.id().with(("rect", i)), egui::Sense::click());
        if body.clicked() {
            events.push(OverlayEvent::Select(i));
        }
    }

    // Registered last so the affordances sit above every rectangle body.
    if let (Some(i), Some(rect)) = (editor.active(), editor.active_rectangle()) {
        active_affordances(ui, i, rect, image_origin, &mut events);
    }

    events
}

fn active_affordances(
    ui: &mut egui::Ui,
    index: usize,
    rect: &Rectangle,
    image_origin: egui::Pos2,
    events: &mut Vec<OverlayEvent>,
) {
    let screen = geometry::screen_rect(rect, image_origin);
    let painter = ui.painter().clone();

    painter.rect_stroke(
        screen.expand(4.0),
        2.0,
        egui::Stroke::new(1.5, SELECTION_COLOR),
        egui::StrokeKind::Middle,
    );
    for corner in Corner::ALL {
        let center = geometry::to_screen(rect.corner(corner), image_origin);
        painter.circle(
            center,
            HANDLE_RADIUS,
            egui::Color32::WHITE,
            egui::Stroke::new(1.5, SELECTION_COLOR),
        );
    }
    let grip = geometry::to_screen(rect.center(), image_origin);
    painter.circle_stroke(grip, HANDLE_RADIUS, egui::Stroke::new(1.5, SELECTION_COLOR));
    painter.text(
        grip,
        egui::Align2::CENTER_CENTER,
        "✥",
        egui::FontId::proportional(HANDLE_RADIUS * 1.5),
        SELECTION_COLOR,
    );

    let grab_area = screen.expand(HANDLE_RADIUS);
    let grabs = ui.interact(grab_area, ui.id().with(("grab", index)), egui::Sense::drag());

    let grab_under = |pos: Option<egui::Pos2>| {
        pos.and_then(|pos| grab_at(rect, geometry::to_image_local(pos, image_origin), HANDLE_RADIUS))
    };
    if grabs.hovered() {
        match grab_under(grabs.hover_pos()) {
            Some(Grab::Corner(corner)) => ui.ctx().set_cursor_icon(corner.cursor()),
            Some(Grab::Move) => ui.ctx().set_cursor_icon(egui::CursorIcon::Move),
            None => {}
        }
    }
    if grabs.drag_started() {
        let origin = ui.input(|i| i.pointer.press_origin());
        match grab_under(origin) {
            Some(Grab::Corner(corner)) => events.push(OverlayEvent::ResizeStart(index, corner)),
            Some(Grab::Move) => events.push(OverlayEvent::MoveStart(index)),
            None => {}
        }
    }

    let delete_rect = egui::Rect::from_center_size(
        egui::pos2(screen.center().x, screen.top() - 20.0),
        egui::vec2(24.0, 20.0),
    );
    let delete = ui
        .interact(delete_rect, ui.id().with(("delete", index)), egui::Sense::click())
        .on_hover_text("Delete rectangle");
    let visuals = *ui.style().interact(&delete);
    painter.rect(
        delete_rect,
        visuals.corner_radius,
        visuals.weak_bg_fill,
        visuals.bg_stroke,
        egui::StrokeKind::Inside,
    );
    painter.text(
        delete_rect.center(),
        egui::Align2::CENTER_CENTER,
        "🗑",
        egui::FontId::proportional(12.0),
        visuals.text_color(),
    );
    if delete.clicked() {
        events.push(OverlayEvent::Delete(index));
    }
}

pub fn apply(editor: &mut Editor, events: &[OverlayEvent], pointer: Option<Point>) {
    for event in events {
        match *event {
            OverlayEvent::Select(i) => editor.select(i),
            OverlayEvent::Delete(i) => {
                editor.delete(i);
            }
            OverlayEvent::MoveStart(i) => {
                if let Some(p) = pointer {
                    editor.begin_drag(i, p);
                }
            }
            OverlayEvent::ResizeStart(i, corner) => {
                editor.begin_resize(i, corner);
            }
        }
    }
}
