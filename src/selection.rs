use std::collections::BTreeSet;

/// Landmark indices selected when the user asks for the default set.
///
/// Covers the face oval, eyebrows, eye outlines, nose ridge and both lip
/// contours of the 468-point face mesh. Ascending, no duplicates.
pub const DEFAULT_LANDMARK_INDICES: [usize; 133] = [
    0, 1, 2, 4, 5, 6, 7, 10, 13, 14, 17, 21, 30, 33, 37, 39, 40, 46, 48, 52, 53, 54, 55, 58, 61,
    63, 65, 66, 67, 70, 78, 80, 81, 82, 84, 91, 93, 98, 103, 105, 107, 109, 127, 132, 133, 136,
    144, 145, 146, 148, 149, 150, 152, 153, 154, 155, 157, 158, 159, 160, 161, 162, 163, 168, 172,
    173, 176, 181, 191, 195, 197, 234, 246, 249, 251, 260, 263, 267, 269, 270, 276, 278, 282, 283,
    284, 285, 288, 291, 293, 295, 296, 297, 300, 308, 310, 311, 312, 314, 321, 323, 327, 332, 334,
    336, 338, 356, 361, 362, 365, 373, 374, 375, 377, 378, 379, 380, 381, 382, 384, 385, 386, 387,
    388, 389, 390, 397, 398, 400, 405, 409, 415, 454, 466,
];

/// The set of landmark indices the user has toggled on.
///
/// Backed by an ordered set, so every view of it is ascending and
/// duplicate-free without re-sorting. Indices are not checked against the
/// detector's range and survive frame and image changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    indices: BTreeSet<usize>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `index`, returning whether it is now selected.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.indices.remove(&index) {
            false
        } else {
            self.indices.insert(index);
            true
        }
    }

    /// Replace the selection with `defaults`, dropping duplicates.
    pub fn select_default(&mut self, defaults: &[usize]) {
        self.indices = defaults.iter().copied().collect();
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Ascending, duplicate-free indices. The canonical order for display
    /// and export.
    pub fn sorted_list(&self) -> Vec<usize> {
        self.indices.iter().copied().collect()
    }
}

impl FromIterator<usize> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self {
            indices: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_indices_are_sorted_and_unique() {
        assert!(DEFAULT_LANDMARK_INDICES.windows(2).all(|w| w[0] < w[1]));
        assert!(DEFAULT_LANDMARK_INDICES.iter().all(|&i| i < 468));
    }

    #[test]
    fn toggle_reports_membership() {
        let mut sel = SelectionSet::new();
        assert!(sel.toggle(42));
        assert!(sel.contains(42));
        assert!(!sel.toggle(42));
        assert!(!sel.contains(42));
    }

    #[test]
    fn double_toggle_restores_prior_state() {
        let mut sel: SelectionSet = [3, 9, 27].into_iter().collect();
        for i in [0, 3, 9, 100, 467] {
            let before = sel.clone();
            sel.toggle(i);
            sel.toggle(i);
            assert_eq!(sel, before, "index {i}");
        }
    }

    #[test]
    fn sorted_list_independent_of_toggle_order() {
        let mut sel = SelectionSet::new();
        for i in [300, 5, 77, 5, 0, 466, 77, 12, 77] {
            sel.toggle(i);
        }
        // 5 toggled twice is gone, 77 toggled three times stays
        assert_eq!(sel.sorted_list(), vec![0, 12, 77, 300, 466]);
        assert_eq!(sel.len(), 5);
    }

    #[test]
    fn select_default_dedups_and_is_idempotent() {
        let mut sel = SelectionSet::new();
        sel.toggle(999);
        sel.select_default(&[4, 1, 4, 2]);
        assert_eq!(sel.sorted_list(), vec![1, 2, 4]);

        let once = sel.clone();
        sel.select_default(&[4, 1, 4, 2]);
        assert_eq!(sel, once);

        sel.select_default(&DEFAULT_LANDMARK_INDICES);
        assert_eq!(sel.sorted_list(), DEFAULT_LANDMARK_INDICES.to_vec());
    }

    #[test]
    fn clear_empties() {
        let mut sel: SelectionSet = [1, 2].into_iter().collect();
        sel.clear();
        assert!(sel.is_empty());
        assert!(sel.sorted_list().is_empty());
    }
}
