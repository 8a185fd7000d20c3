use crate::geometry::Rectangle;

/// Rectangles in insertion order. The position in the list is the
/// rectangle's identity; removing one shifts everything after it down.
#[derive(Clone, Debug, Default)]
pub struct RectangleStore {
    rects: Vec<Rectangle>,
}

impl RectangleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rect: Rectangle) -> usize {
        self.rects.push(rect);
        self.rects.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Rectangle> {
        self.rects.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Rectangle> {
        self.rects.get_mut(index)
    }

    pub fn update(&mut self, index: usize, rect: Rectangle) -> bool {
        match self.rects.get_mut(index) {
            Some(slot) => {
                *slot = rect;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Rectangle> {
        if index < self.rects.len() {
            Some(self.rects.remove(index))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rectangle> {
        self.rects.iter()
    }

    pub fn as_slice(&self) -> &[Rectangle] {
        &self.rects
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(n: f32) -> Rectangle {
        Rectangle::new(n, n, 10.0, 10.0)
    }

    #[test]
    fn push_returns_insertion_index() {
        let mut store = RectangleStore::new();
        assert_eq!(store.push(rect(0.0)), 0);
        assert_eq!(store.push(rect(1.0)), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_shifts_later_entries_down() {
        let mut store = RectangleStore::new();
        for i in 0..4 {
            store.push(rect(i as f32));
        }
        assert_eq!(store.remove(1), Some(rect(1.0)));
        assert_eq!(store.as_slice(), &[rect(0.0), rect(2.0), rect(3.0)]);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut store = RectangleStore::new();
        store.push(rect(0.0));
        assert_eq!(store.remove(5), None);
        assert_eq!(store.as_slice(), &[rect(0.0)]);
    }

    #[test]
    fn update_in_place() {
        let mut store = RectangleStore::new();
        store.push(rect(0.0));
        assert!(store.update(0, rect(7.0)));
        assert!(!store.update(1, rect(8.0)));
        assert_eq!(store.get(0), Some(&rect(7.0)));
    }
}
