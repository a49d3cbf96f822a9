/// Selection cursor and visible window over the filtered result.
///
/// `view_start..view_end` is the slice of rows on screen. While the result is
/// non-empty the selection always sits inside that slice; when it is empty all
/// three indices are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub selected: usize,
    pub view_start: usize,
    pub view_end: usize,
    pub page_size: usize,
}

impl ViewState {
    pub fn new(page_size: usize, len: usize) -> Self {
        let mut view = Self {
            selected: 0,
            view_start: 0,
            view_end: 0,
            page_size: page_size.max(1),
        };
        view.invalidate(len);
        view
    }

    pub fn move_up(&mut self) {
        if self.selected == 0 {
            return;
        }
        self.selected -= 1;
        if self.selected < self.view_start {
            self.view_start -= 1;
            self.view_end -= 1;
        }
    }

    pub fn move_down(&mut self, len: usize) {
        if self.selected + 1 >= len {
            return;
        }
        self.selected += 1;
        if self.selected >= self.view_end {
            self.view_start += 1;
            self.view_end += 1;
        }
    }

    /// Back to the top after the result list was replaced.
    pub fn invalidate(&mut self, len: usize) {
        self.selected = 0;
        self.view_start = 0;
        self.view_end = self.page_size.min(len);
    }

    /// Adopts a new page size, keeping the selection where it is.
    pub fn resize(&mut self, page_size: usize, len: usize) {
        self.page_size = page_size.max(1);
        if len == 0 {
            self.invalidate(0);
            return;
        }

        self.selected = self.selected.min(len - 1);
        self.view_start = self.view_start.min(self.selected);
        self.view_end = (self.view_start + self.page_size).min(len);
        if self.selected >= self.view_end {
            self.view_start = self.selected + 1 - self.page_size;
            self.view_end = self.selected + 1;
        }
    }

    pub fn visible(&self) -> std::ops::Range<usize> {
        self.view_start..self.view_end
    }
}

#[cfg(test)]
mod tests {
    use super::ViewState;

    fn assert_invariants(view: &ViewState, len: usize) {
        if len == 0 {
            assert_eq!((view.selected, view.view_start, view.view_end), (0, 0, 0));
            return;
        }
        assert!(view.view_start <= view.selected, "{view:?}");
        assert!(view.selected < view.view_end, "{view:?}");
        assert!(view.view_end <= len, "{view:?}");
        assert!(
            view.view_end - view.view_start <= view.page_size,
            "{view:?}"
        );
    }

    #[test]
    fn window_scrolls_with_selection() {
        let mut view = ViewState::new(3, 10);
        assert_eq!(view.visible(), 0..3);

        for _ in 0..4 {
            view.move_down(10);
        }
        assert_eq!(view.selected, 4);
        assert_eq!(view.visible(), 2..5);

        for _ in 0..3 {
            view.move_up();
        }
        assert_eq!(view.selected, 1);
        assert_eq!(view.visible(), 1..4);
    }

    #[test]
    fn selection_clamps_at_both_ends() {
        let mut view = ViewState::new(5, 2);
        view.move_up();
        assert_eq!(view.selected, 0);
        view.move_down(2);
        view.move_down(2);
        view.move_down(2);
        assert_eq!(view.selected, 1);
        assert_eq!(view.visible(), 0..2);
    }

    #[test]
    fn empty_result_stays_at_zero() {
        let mut view = ViewState::new(4, 0);
        view.move_down(0);
        view.move_up();
        assert_invariants(&view, 0);

        view.resize(2, 0);
        assert_invariants(&view, 0);
        view.resize(9, 0);
        assert_eq!(view.page_size, 9);
        assert_invariants(&view, 0);
    }

    #[test]
    fn resize_after_the_result_empties_resets() {
        let mut view = ViewState::new(3, 10);
        for _ in 0..7 {
            view.move_down(10);
        }
        view.resize(4, 0);
        assert_eq!(view.page_size, 4);
        assert_invariants(&view, 0);
    }

    #[test]
    fn invalidate_resets_to_top() {
        let mut view = ViewState::new(3, 10);
        for _ in 0..6 {
            view.move_down(10);
        }
        view.invalidate(2);
        assert_eq!(
            view,
            ViewState {
                selected: 0,
                view_start: 0,
                view_end: 2,
                page_size: 3,
            }
        );
    }

    #[test]
    fn growing_page_keeps_selection() {
        let mut view = ViewState::new(3, 10);
        for _ in 0..5 {
            view.move_down(10);
        }
        assert_eq!(view.visible(), 3..6);

        view.resize(6, 10);
        assert_eq!(view.selected, 5);
        assert_eq!(view.visible(), 3..9);
        assert_invariants(&view, 10);
    }

    #[test]
    fn shrinking_page_keeps_selection_visible() {
        let mut view = ViewState::new(8, 10);
        for _ in 0..6 {
            view.move_down(10);
        }
        assert_eq!(view.visible(), 0..8);

        view.resize(3, 10);
        assert_eq!(view.selected, 6);
        assert_eq!(view.visible(), 4..7);
        assert_invariants(&view, 10);
    }

    #[test]
    fn zero_height_still_shows_the_selection() {
        let mut view = ViewState::new(5, 10);
        view.move_down(10);
        view.resize(0, 10);
        assert_eq!(view.page_size, 1);
        assert_eq!(view.visible(), 1..2);
    }

    #[test]
    fn random_walks_hold_invariants() {
        let len = 17;
        let mut view = ViewState::new(4, len);
        let mut seed: u32 = 7;
        for step in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            match (seed >> 16) % 5 {
                0 | 1 => view.move_down(len),
                2 | 3 => view.move_up(),
                _ => view.resize(1 + (step % 7), len),
            }
            assert_invariants(&view, len);
        }
    }
}
