/// Rotation state over `len` visible items.
///
/// With more than one item the rendered track holds a clone of the first item after the last,
/// so rotation always moves forward: advancing onto the clone is animated, then [`Carousel::settle`]
/// snaps back to index 0 without animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Carousel {
    index: usize,
    len: usize,
    animating: bool,
}

impl Carousel {
    /// Index into the rendered track, which may be the clone slot `len`.
    pub fn track_index(&self) -> usize {
        self.index
    }

    pub fn track_len(&self) -> usize {
        if self.len > 1 {
            self.len + 1
        } else {
            self.len
        }
    }

    /// Index into the visible items.
    pub fn position(&self) -> usize {
        if self.len == 0 {
            0
        } else {
            self.index % self.len
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn on_clone(&self) -> bool {
        self.len > 1 && self.index == self.len
    }

    /// Follows a change in the visible set.
    pub fn sync(&mut self, len: usize) {
        let changed = len != self.len;
        self.len = len;
        if len <= 1 || self.index > len || (changed && self.index == len) {
            self.reset();
        }
    }

    /// Moves one slot forward. Returns false when there is nothing to rotate.
    pub fn advance(&mut self) -> bool {
        if self.len <= 1 {
            self.reset();
            return false;
        }
        if self.on_clone() {
            self.settle();
        }
        self.index += 1;
        self.animating = true;
        true
    }

    /// End of the slide animation; leaves the clone slot for the real first item.
    pub fn settle(&mut self) {
        if self.on_clone() {
            self.index = 0;
        }
        self.animating = false;
    }

    fn reset(&mut self) {
        self.index = 0;
        self.animating = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carousel(len: usize) -> Carousel {
        let mut c = Carousel::default();
        c.sync(len);
        c
    }

    #[test]
    fn two_items_alternate_without_skips() {
        let mut c = carousel(2);
        let mut seen = vec![c.position()];
        for _ in 0..6 {
            assert!(c.advance());
            c.settle();
            seen.push(c.position());
        }
        assert_eq!(seen, vec![0, 1, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn wrap_passes_through_the_clone_then_snaps() {
        let mut c = carousel(3);
        c.advance();
        c.advance();
        c.advance();
        assert_eq!(c.track_index(), 3);
        assert!(c.on_clone());
        assert!(c.is_animating());
        assert_eq!(c.position(), 0);
        assert_eq!(c.track_len(), 4);

        c.settle();
        assert_eq!(c.track_index(), 0);
        assert!(!c.is_animating());
    }

    #[test]
    fn advancing_from_the_clone_settles_first() {
        let mut c = carousel(2);
        c.advance();
        c.advance();
        assert!(c.on_clone());
        c.advance();
        assert_eq!(c.track_index(), 1);
    }

    #[test]
    fn single_or_empty_sets_never_rotate() {
        for len in [0, 1] {
            let mut c = carousel(len);
            assert!(!c.advance());
            assert_eq!(c.track_index(), 0);
            assert_eq!(c.track_len(), len);
        }
    }

    #[test]
    fn shrinking_mid_animation_resets_to_start() {
        let mut c = carousel(4);
        c.advance();
        c.advance();
        assert!(c.is_animating());
        c.sync(1);
        assert_eq!(c.track_index(), 0);
        assert!(!c.is_animating());

        let mut c = carousel(4);
        c.advance();
        c.advance();
        c.advance();
        c.sync(2);
        assert_eq!(c.track_index(), 0);
    }

    #[test]
    fn growing_keeps_the_current_slot() {
        let mut c = carousel(3);
        c.advance();
        c.settle();
        c.sync(5);
        assert_eq!(c.track_index(), 1);
    }
}
