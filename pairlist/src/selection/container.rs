use crate::Error;
use crate::errors::check_index;

use super::Selection;

/// An ordered collection of `Selection`, typically representing groups of
/// particles such as molecules, fragments or isolates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContainer {
    items: Vec<Selection>,
}

impl SelectionContainer {
    /// Create a new container with the given items
    pub fn new(items: Vec<Selection>) -> SelectionContainer {
        SelectionContainer { items }
    }

    /// Get the number of items in this container
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if this container is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the item at the given position
    pub fn get(&self, item: usize) -> Option<&Selection> {
        self.items.get(item)
    }

    /// Iterate over all items in this container
    pub fn iter(&self) -> std::slice::Iter<'_, Selection> {
        self.items.iter()
    }

    /// Get the largest upper bound of all items
    pub fn upper_bound(&self) -> usize {
        self.items.iter().map(|item| item.upper_bound()).max().unwrap_or(0)
    }

    /// Get a single selection containing the indices of all items
    pub fn union(&self) -> Selection {
        let items = self.items.iter().collect::<Vec<_>>();
        return Selection::union(&items);
    }

    /// Get a mask of size `max(upper_bound, self.upper_bound())`, set to true
    /// for every index belonging to at least one item.
    pub fn membership_flags(&self, upper_bound: usize) -> Vec<bool> {
        let mut flags = vec![false; usize::max(upper_bound, self.upper_bound())];
        for item in &self.items {
            for i in item {
                flags[i] = true;
            }
        }
        return flags;
    }

    /// Get a map of size `max(upper_bound, self.upper_bound())` from index to
    /// the position of the item containing it. If an index belongs to more
    /// than one item, the last item wins.
    pub fn item_of(&self, upper_bound: usize) -> Vec<Option<usize>> {
        let mut membership = vec![None; usize::max(upper_bound, self.upper_bound())];
        for (item_i, item) in self.items.iter().enumerate() {
            for i in item {
                membership[i] = Some(item_i);
            }
        }
        return membership;
    }

    /// Create a new container where all the items listed in `to_fuse` are
    /// merged into a single item. The fused item takes the place of the first
    /// fused item, all other items keep their relative order.
    pub fn fuse(&self, to_fuse: &Selection) -> Result<SelectionContainer, Error> {
        if let Some(&last) = to_fuse.indices().last() {
            check_index(last, self.len())?;
        }

        if to_fuse.len() < 2 {
            return Ok(self.clone());
        }

        let first = to_fuse.indices()[0];
        let fused = to_fuse.iter().map(|i| &self.items[i]).collect::<Vec<_>>();

        let mut items = Vec::with_capacity(self.len() + 1 - to_fuse.len());
        for (item_i, item) in self.items.iter().enumerate() {
            if item_i == first {
                items.push(Selection::union(&fused));
            } else if !to_fuse.contains(item_i) {
                items.push(item.clone());
            }
        }

        return Ok(SelectionContainer { items });
    }

    /// Create a new container without the items listed in `to_remove`
    pub fn remove(&self, to_remove: &Selection) -> Result<SelectionContainer, Error> {
        if let Some(&last) = to_remove.indices().last() {
            check_index(last, self.len())?;
        }

        let items = self.items.iter()
            .enumerate()
            .filter(|&(item_i, _)| !to_remove.contains(item_i))
            .map(|(_, item)| item.clone())
            .collect();

        return Ok(SelectionContainer { items });
    }
}

impl From<Vec<Selection>> for SelectionContainer {
    fn from(items: Vec<Selection>) -> SelectionContainer {
        SelectionContainer::new(items)
    }
}

impl std::ops::Index<usize> for SelectionContainer {
    type Output = Selection;

    fn index(&self, item: usize) -> &Selection {
        &self.items[item]
    }
}

impl<'a> IntoIterator for &'a SelectionContainer {
    type Item = &'a Selection;
    type IntoIter = std::slice::Iter<'a, Selection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
