use std::collections::BTreeSet;

/// Set of checked rows in a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<K: Ord + Clone> {
    selected: BTreeSet<K>,
}

impl<K: Ord + Clone> Default for Selection<K> {
    fn default() -> Self {
        Self {
            selected: BTreeSet::new(),
        }
    }
}

impl<K: Ord + Clone> Selection<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one row; returns whether it is now selected
    pub fn toggle(&mut self, key: K) -> bool {
        if self.selected.remove(&key) {
            false
        } else {
            self.selected.insert(key);
            true
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.selected.contains(key)
    }

    /// True when `visible` is non-empty and every row in it is selected
    pub fn is_all_selected<'a, I>(&self, visible: I) -> bool
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let mut any = false;
        for key in visible {
            any = true;
            if !self.selected.contains(key) {
                return false;
            }
        }
        any
    }

    /// Header checkbox: clear when everything visible is selected, otherwise select all visible
    pub fn toggle_all<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a K> + Clone,
        K: 'a,
    {
        if self.is_all_selected(visible.clone()) {
            self.selected.clear();
        } else {
            self.selected = visible.into_iter().cloned().collect();
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.selected.iter()
    }

    pub fn to_vec(&self) -> Vec<K> {
        self.selected.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_select_all() {
        let visible = vec!["a".to_string(), "b".to_string()];
        let mut selection = Selection::new();

        assert!(!selection.is_all_selected(&visible));
        assert!(selection.toggle("a".to_string()));
        assert!(!selection.is_all_selected(&visible));

        selection.toggle_all(&visible);
        assert!(selection.is_all_selected(&visible));
        assert_eq!(selection.len(), 2);

        selection.toggle_all(&visible);
        assert!(selection.is_empty());

        assert!(selection.toggle("b".to_string()));
        assert!(!selection.toggle("b".to_string()));
    }

    #[test]
    fn test_empty_list_is_never_all_selected() {
        let visible: Vec<i64> = Vec::new();
        let mut selection = Selection::new();
        assert!(!selection.is_all_selected(&visible));
        selection.toggle_all(&visible);
        assert!(selection.is_empty());
    }
}
