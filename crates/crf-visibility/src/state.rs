//! Visibility state of one open form view.

use std::collections::BTreeMap;

use crf_model::{CellId, LayoutId, LayoutUid};

/// Result of applying a visibility verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The target already had the requested visibility.
    Unchanged,
    Shown,
    Hidden,
}

impl Transition {
    fn between(previous: bool, next: bool) -> Self {
        match (previous, next) {
            (false, true) => Transition::Shown,
            (true, false) => Transition::Hidden,
            _ => Transition::Unchanged,
        }
    }
}

/// Shown flags per mounted (layout instance, cell) and per layout.
///
/// Entries exist only for mounted cells and layouts; everything starts SHOWN.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityState {
    cells: BTreeMap<LayoutUid, BTreeMap<CellId, bool>>,
    layouts: BTreeMap<LayoutId, bool>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount_cell(&mut self, layout_uid: &LayoutUid, cell: &CellId) {
        self.cells
            .entry(layout_uid.clone())
            .or_default()
            .entry(cell.clone())
            .or_insert(true);
    }

    pub fn mount_layout(&mut self, layout: &LayoutId) {
        self.layouts.entry(layout.clone()).or_insert(true);
    }

    /// Sets a cell's visibility; `None` when the cell is not mounted.
    pub fn set_cell(&mut self, layout_uid: &LayoutUid, cell: &CellId, shown: bool) -> Option<Transition> {
        let slot = self.cells.get_mut(layout_uid)?.get_mut(cell)?;
        let transition = Transition::between(*slot, shown);
        *slot = shown;
        Some(transition)
    }

    /// Sets a layout's visibility; `None` when the layout is not mounted.
    pub fn set_layout(&mut self, layout: &LayoutId, shown: bool) -> Option<Transition> {
        let slot = self.layouts.get_mut(layout)?;
        let transition = Transition::between(*slot, shown);
        *slot = shown;
        Some(transition)
    }

    pub fn cell_shown(&self, layout_uid: &LayoutUid, cell: &CellId) -> Option<bool> {
        self.cells.get(layout_uid)?.get(cell).copied()
    }

    pub fn layout_shown(&self, layout: &LayoutId) -> Option<bool> {
        self.layouts.get(layout).copied()
    }

    /// Forgets every cell of a layout instance.
    pub fn unmount_instance(&mut self, layout_uid: &LayoutUid) -> bool {
        self.cells.remove(layout_uid).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.layouts.is_empty()
    }

    pub fn layouts(&self) -> impl Iterator<Item = (&LayoutId, bool)> {
        self.layouts.iter().map(|(id, shown)| (id, *shown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(value: &str) -> LayoutUid {
        LayoutUid::new(value).unwrap()
    }

    fn cell(value: &str) -> CellId {
        CellId::new(value).unwrap()
    }

    #[test]
    fn cells_start_shown() {
        let mut state = VisibilityState::new();
        state.mount_cell(&uid("L"), &cell("C1"));
        assert_eq!(state.cell_shown(&uid("L"), &cell("C1")), Some(true));
        assert_eq!(state.cell_shown(&uid("L"), &cell("C2")), None);
    }

    #[test]
    fn repeated_verdicts_are_unchanged() {
        let mut state = VisibilityState::new();
        state.mount_cell(&uid("L"), &cell("C1"));
        assert_eq!(state.set_cell(&uid("L"), &cell("C1"), false), Some(Transition::Hidden));
        assert_eq!(state.set_cell(&uid("L"), &cell("C1"), false), Some(Transition::Unchanged));
        assert_eq!(state.set_cell(&uid("L"), &cell("C1"), true), Some(Transition::Shown));
    }

    #[test]
    fn unmounted_targets_are_not_created() {
        let mut state = VisibilityState::new();
        assert_eq!(state.set_cell(&uid("L"), &cell("C1"), false), None);
        assert_eq!(state.set_layout(&LayoutId::new("L").unwrap(), false), None);
        assert!(state.is_empty());
    }

    #[test]
    fn unmounting_an_instance_keeps_the_others() {
        let mut state = VisibilityState::new();
        state.mount_cell(&uid("L#1"), &cell("C1"));
        state.mount_cell(&uid("L#2"), &cell("C1"));
        assert!(state.unmount_instance(&uid("L#1")));
        assert_eq!(state.cell_shown(&uid("L#1"), &cell("C1")), None);
        assert_eq!(state.cell_shown(&uid("L#2"), &cell("C1")), Some(true));
    }
}
