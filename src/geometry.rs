// ── Points & Rectangles ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box; `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn empty_at(p: Point) -> Self {
        Self::new(p.x, p.y, 0.0, 0.0)
    }

    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn normalized(&self) -> Self {
        Self::from_corners(
            Point::new(self.x, self.y),
            Point::new(self.x + self.width, self.y + self.height),
        )
    }

    pub fn is_normalized(&self) -> bool {
        self.width >= 0.0 && self.height >= 0.0
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => Point::new(self.x, self.y),
            Corner::TopRight => Point::new(self.x + self.width, self.y),
            Corner::BottomLeft => Point::new(self.x, self.y + self.height),
            Corner::BottomRight => Point::new(self.x + self.width, self.y + self.height),
        }
    }

    /// p1..p4 clockwise from the top-left corner.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.corner(Corner::TopLeft),
            self.corner(Corner::TopRight),
            self.corner(Corner::BottomRight),
            self.corner(Corner::BottomLeft),
        ]
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Moves `corner` to `p` while the opposite corner stays where it is.
    /// Width and height are allowed to go negative when `p` crosses over.
    pub fn drag_corner(&mut self, corner: Corner, p: Point) {
        match corner {
            Corner::TopLeft => {
                self.width += self.x - p.x;
                self.height += self.y - p.y;
                self.x = p.x;
                self.y = p.y;
            }
            Corner::TopRight => {
                self.width = p.x - self.x;
                self.height += self.y - p.y;
                self.y = p.y;
            }
            Corner::BottomLeft => {
                self.width += self.x - p.x;
                self.height = p.y - self.y;
                self.x = p.x;
            }
            Corner::BottomRight => {
                self.width = p.x - self.x;
                self.height = p.y - self.y;
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn cursor(self) -> egui::CursorIcon {
        match self {
            Corner::TopLeft | Corner::BottomRight => egui::CursorIcon::ResizeNwSe,
            Corner::TopRight | Corner::BottomLeft => egui::CursorIcon::ResizeNeSw,
        }
    }
}

// ── Coordinate Mapper ───────────────────────────────────────────────────────

/// Window position to image-local pixels. Positions outside the image are kept.
pub fn to_image_local(pointer: egui::Pos2, image_origin: egui::Pos2) -> Point {
    Point::new(pointer.x - image_origin.x, pointer.y - image_origin.y)
}

pub fn to_screen(p: Point, image_origin: egui::Pos2) -> egui::Pos2 {
    egui::pos2(p.x + image_origin.x, p.y + image_origin.y)
}

pub fn screen_rect(rect: &Rectangle, image_origin: egui::Pos2) -> egui::Rect {
    egui::Rect::from_two_pos(
        to_screen(rect.corner(Corner::TopLeft), image_origin),
        to_screen(rect.corner(Corner::BottomRight), image_origin),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes() {
        let a = Rectangle::from_corners(Point::new(150.0, 120.0), Point::new(50.0, 50.0));
        assert_eq!(a, Rectangle::new(50.0, 50.0, 100.0, 70.0));
        let b = Rectangle::from_corners(Point::new(50.0, 50.0), Point::new(150.0, 120.0));
        assert_eq!(a, b);
    }

    #[test]
    fn normalized_flips_negative_size() {
        let r = Rectangle::new(100.0, 100.0, -40.0, -10.0);
        assert_eq!(r.normalized(), Rectangle::new(60.0, 90.0, 40.0, 10.0));
        assert!(!r.is_normalized());
        assert!(r.normalized().is_normalized());
    }

    #[test]
    fn corners_are_clockwise() {
        let r = Rectangle::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(
            r.corners(),
            [
                Point::new(10.0, 20.0),
                Point::new(40.0, 20.0),
                Point::new(40.0, 60.0),
                Point::new(10.0, 60.0),
            ]
        );
    }

    #[test]
    fn drag_bottom_right() {
        let mut r = Rectangle::new(50.0, 50.0, 100.0, 100.0);
        r.drag_corner(Corner::BottomRight, Point::new(200.0, 200.0));
        assert_eq!(r, Rectangle::new(50.0, 50.0, 150.0, 150.0));
    }

    #[test]
    fn drag_top_left_keeps_bottom_right_fixed() {
        let mut r = Rectangle::new(50.0, 50.0, 100.0, 100.0);
        r.drag_corner(Corner::TopLeft, Point::new(20.0, 30.0));
        assert_eq!(r, Rectangle::new(20.0, 30.0, 130.0, 120.0));
        assert_eq!(r.corner(Corner::BottomRight), Point::new(150.0, 150.0));
    }

    #[test]
    fn drag_top_right_and_bottom_left() {
        let mut r = Rectangle::new(50.0, 50.0, 100.0, 100.0);
        r.drag_corner(Corner::TopRight, Point::new(180.0, 40.0));
        assert_eq!(r, Rectangle::new(50.0, 40.0, 130.0, 110.0));
        assert_eq!(r.corner(Corner::BottomLeft), Point::new(50.0, 150.0));

        let mut r = Rectangle::new(50.0, 50.0, 100.0, 100.0);
        r.drag_corner(Corner::BottomLeft, Point::new(70.0, 170.0));
        assert_eq!(r, Rectangle::new(70.0, 50.0, 80.0, 120.0));
        assert_eq!(r.corner(Corner::TopRight), Point::new(150.0, 50.0));
    }

    #[test]
    fn drag_past_opposite_corner_goes_negative() {
        let mut r = Rectangle::new(50.0, 50.0, 100.0, 100.0);
        r.drag_corner(Corner::BottomRight, Point::new(10.0, 20.0));
        assert_eq!(r.width, -40.0);
        assert_eq!(r.height, -30.0);
    }

    #[test]
    fn mapper_subtracts_origin_without_clamping() {
        let origin = egui::pos2(100.0, -250.0);
        let p = to_image_local(egui::pos2(150.0, 50.0), origin);
        assert_eq!(p, Point::new(50.0, 300.0));
        let outside = to_image_local(egui::pos2(0.0, -300.0), origin);
        assert_eq!(outside, Point::new(-100.0, -50.0));
        assert_eq!(to_screen(p, origin), egui::pos2(150.0, 50.0));
    }
}
