use crate::config::{AnimCss, PanelCss, Settings, StyleState};
use serde::{Deserialize, Serialize};

/// Base stacking order shared by both panels.
pub const BASE_Z_INDEX: i32 = 5000;
/// Stacking distance between two neighbouring pages of a panel.
pub const Z_INDEX_STEP: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Left,
    Right,
}

impl Panel {
    /// Sign of the z-index progression: left pages stack upward, right pages
    /// downward.
    fn z_operator(self) -> i32 {
        match self {
            Panel::Left => 1,
            Panel::Right => -1,
        }
    }
}

/// Direction of a page turn. Also the method a page is bound to for drag
/// gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnMethod {
    Next,
    Prev,
}

impl TurnMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnMethod::Next => "next",
            TurnMethod::Prev => "prev",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId {
    pub panel: Panel,
    pub index: usize,
}

impl PageId {
    pub fn new(panel: Panel, index: usize) -> Self {
        Self { panel, index }
    }
}

/// Absolute layout given to a page before its first reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub height: u32,
    pub z_index: i32,
}

#[derive(Debug, Clone)]
pub struct Page<E> {
    pub element: E,
    pub id: PageId,
    pub z_index: i32,
    pub method: TurnMethod,
    pub css: AnimCss,
}

impl<E> Page<E> {
    fn new(element: E, panel: Panel, index: usize, css: &PanelCss) -> Self {
        let (method, css) = match panel {
            Panel::Left => (TurnMethod::Prev, css.left),
            Panel::Right => (TurnMethod::Next, css.right),
        };
        Self {
            element,
            id: PageId::new(panel, index),
            z_index: z_index_for(panel, index),
            method,
            css,
        }
    }

    pub fn placement(&self, height: u32) -> Placement {
        Placement {
            height,
            z_index: self.z_index,
        }
    }

    /// Endpoints of the animation for a turn in `method` direction: where
    /// the page snaps to first and where it transitions to.
    pub fn endpoints(&self, method: TurnMethod) -> (StyleState, StyleState) {
        match method {
            TurnMethod::Next => (self.css.start, self.css.end),
            TurnMethod::Prev => (self.css.end, self.css.start),
        }
    }
}

pub fn z_index_for(panel: Panel, index: usize) -> i32 {
    let index = i32::try_from(index).unwrap_or(i32::MAX / Z_INDEX_STEP);
    BASE_Z_INDEX.saturating_add(index.saturating_mul(Z_INDEX_STEP) * panel.z_operator())
}

/// Both page stacks of a booklet, in document order.
#[derive(Debug, Clone)]
pub struct PageRegistry<E> {
    pub left: Vec<Page<E>>,
    pub right: Vec<Page<E>>,
}

impl<E> PageRegistry<E> {
    pub fn build(
        settings: &Settings,
        left: impl IntoIterator<Item = E>,
        right: impl IntoIterator<Item = E>,
    ) -> Self {
        let css = settings.anim_css();
        let left = left
            .into_iter()
            .enumerate()
            .map(|(i, element)| Page::new(element, Panel::Left, i, &css))
            .collect();
        let right = right
            .into_iter()
            .enumerate()
            .map(|(i, element)| Page::new(element, Panel::Right, i, &css))
            .collect();
        Self { left, right }
    }

    pub fn get(&self, id: PageId) -> Option<&Page<E>> {
        match id.panel {
            Panel::Left => self.left.get(id.index),
            Panel::Right => self.right.get(id.index),
        }
    }

    /// Number of complete page pairs. Pages beyond the shorter panel are
    /// placed but never turned.
    pub fn pair_count(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page<E>> {
        self.left.iter().chain(self.right.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(left: usize, right: usize) -> PageRegistry<String> {
        PageRegistry::build(
            &Settings::default(),
            (0..left).map(|i| format!("l{i}")),
            (0..right).map(|i| format!("r{i}")),
        )
    }

    #[test]
    fn pages_are_index_aligned() {
        let pages = registry(4, 4);
        assert_eq!(pages.pair_count(), 4);
        for i in 0..4 {
            assert_eq!(pages.left[i].id, PageId::new(Panel::Left, i));
            assert_eq!(pages.right[i].id, PageId::new(Panel::Right, i));
            assert_eq!(pages.left[i].element, format!("l{i}"));
            assert_eq!(pages.right[i].element, format!("r{i}"));
        }
    }

    #[test]
    fn z_index_stacks_left_up_and_right_down() {
        let pages = registry(3, 3);
        let left: Vec<i32> = pages.left.iter().map(|p| p.z_index).collect();
        let right: Vec<i32> = pages.right.iter().map(|p| p.z_index).collect();
        assert_eq!(left, vec![5000, 5010, 5020]);
        assert_eq!(right, vec![5000, 4990, 4980]);
    }

    #[test]
    fn bound_method_follows_panel() {
        let pages = registry(1, 1);
        assert_eq!(pages.left[0].method, TurnMethod::Prev);
        assert_eq!(pages.right[0].method, TurnMethod::Next);
    }

    #[test]
    fn pages_carry_their_panel_css() {
        let pages = registry(2, 2);
        let css = Settings::default().anim_css();
        assert_eq!(pages.left[1].css, css.left);
        assert_eq!(pages.right[1].css, css.right);
        let placement = pages.left[1].placement(304);
        assert_eq!(placement.height, 304);
        assert_eq!(placement.z_index, 5010);
    }

    #[test]
    fn endpoints_reverse_for_prev() {
        let pages = registry(0, 1);
        let page = &pages.right[0];
        assert_eq!(page.endpoints(TurnMethod::Next), (page.css.start, page.css.end));
        assert_eq!(page.endpoints(TurnMethod::Prev), (page.css.end, page.css.start));
    }

    #[test]
    fn empty_and_uneven_panels() {
        let pages = registry(0, 0);
        assert!(pages.is_empty());
        assert_eq!(pages.pair_count(), 0);

        let pages = registry(2, 5);
        assert_eq!(pages.pair_count(), 2);
        assert!(pages.get(PageId::new(Panel::Right, 4)).is_some());
        assert!(pages.get(PageId::new(Panel::Left, 2)).is_none());
        assert_eq!(pages.iter().count(), 7);
    }
}
