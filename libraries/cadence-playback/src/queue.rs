//! Media queue with a separate play order
//!
//! Items stay in insertion order, which is what callers see and index into.
//! Traversal follows the play order: the identity permutation normally, a
//! random permutation while shuffle is enabled.
//!
//! ```text
//! items:      [A, B, C, D, E]      (indices used by remove/replace/play_at)
//! play order: [2, 0, 4, 1, 3]      (C -> A -> E -> B -> D when shuffled)
//! current:    Some(0)              (A, order position 1)
//! ```

use rand::Rng;

use crate::shuffle::{insertion_point, shuffled_order};
use crate::types::{MediaItem, RepeatMode};

/// Item taken out of the queue by [`MediaQueue::remove`]
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedItem {
    pub item: MediaItem,

    /// The removed item was the current one
    pub was_current: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MediaQueue {
    /// Items in insertion order
    items: Vec<MediaItem>,

    /// Play order as indices into `items`
    order: Vec<usize>,

    /// Index into `items` of the current item
    current: Option<usize>,

    /// Whether `order` is a random permutation
    shuffled: bool,
}

impl MediaQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item
    ///
    /// While shuffled, the item lands at a random point of the part of the
    /// play order that has not been reached yet.
    pub fn push<R: Rng + ?Sized>(&mut self, item: MediaItem, rng: &mut R) {
        let index = self.items.len();
        self.items.push(item);

        if self.shuffled {
            let after = self.current_order_position().map_or(0, |pos| pos + 1);
            let at = insertion_point(after, self.order.len(), rng);
            self.order.insert(at, index);
        } else {
            self.order.push(index);
        }
    }

    /// Remove the item at `index`
    ///
    /// The current index follows its item. When the current item itself is
    /// removed, the item that took its place in the play order becomes
    /// current (clamped to the end), or nothing when the queue is now empty.
    pub fn remove(&mut self, index: usize) -> Option<RemovedItem> {
        if index >= self.items.len() {
            return None;
        }

        let order_pos = self.order.iter().position(|&i| i == index)?;
        let item = self.items.remove(index);
        self.order.remove(order_pos);
        for entry in &mut self.order {
            if *entry > index {
                *entry -= 1;
            }
        }

        let was_current = self.current == Some(index);
        self.current = match self.current {
            Some(current) if current == index => {
                if self.order.is_empty() {
                    None
                } else {
                    Some(self.order[order_pos.min(self.order.len() - 1)])
                }
            }
            Some(current) if current > index => Some(current - 1),
            other => other,
        };

        Some(RemovedItem { item, was_current })
    }

    /// Swap the item at `index` for `item`, returning the old one
    pub fn replace(&mut self, index: usize, item: MediaItem) -> Option<MediaItem> {
        self.items
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, item))
    }

    /// Remove everything; shuffle stays enabled for later additions
    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
        self.current = None;
    }

    /// Replace all items, keeping the shuffle setting
    ///
    /// Nothing is current afterwards.
    pub fn set_items<R: Rng + ?Sized>(&mut self, items: Vec<MediaItem>, rng: &mut R) {
        self.items = items;
        self.current = None;
        self.order = if self.shuffled {
            shuffled_order(self.items.len(), None, rng)
        } else {
            (0..self.items.len()).collect()
        };
    }

    /// Enable or disable shuffle, rebuilding the play order
    ///
    /// The current item becomes the first entry of a new shuffled order.
    pub fn set_shuffled<R: Rng + ?Sized>(&mut self, enabled: bool, rng: &mut R) {
        self.shuffled = enabled;
        self.order = if enabled {
            shuffled_order(self.items.len(), self.current, rng)
        } else {
            (0..self.items.len()).collect()
        };
    }

    /// Make `index` the current item
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// Index of the item after the current one in play order
    ///
    /// `RepeatMode::All` wraps around; otherwise `None` at the end. With no
    /// current item, the first item in play order.
    pub fn next_index(&self, repeat: RepeatMode) -> Option<usize> {
        let Some(pos) = self.current_order_position() else {
            return self.first_in_order();
        };

        match self.order.get(pos + 1) {
            Some(&next) => Some(next),
            None if repeat == RepeatMode::All => self.first_in_order(),
            None => None,
        }
    }

    /// Index of the item before the current one in play order
    ///
    /// `RepeatMode::All` wraps to the last item; otherwise `None` at the start.
    pub fn previous_index(&self, repeat: RepeatMode) -> Option<usize> {
        let Some(pos) = self.current_order_position() else {
            return self.first_in_order();
        };

        if pos > 0 {
            Some(self.order[pos - 1])
        } else if repeat == RepeatMode::All {
            self.order.last().copied()
        } else {
            None
        }
    }

    /// First index in play order
    pub fn first_in_order(&self) -> Option<usize> {
        self.order.first().copied()
    }

    /// Position of an item with this id
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn play_order(&self) -> &[usize] {
        &self.order
    }

    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.current.and_then(|index| self.items.get(index))
    }

    pub fn index(&self) -> Option<usize> {
        self.current
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    fn current_order_position(&self) -> Option<usize> {
        let current = self.current?;
        self.order.iter().position(|&i| i == current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::shuffle_rng;
    use std::collections::HashSet;

    fn item(id: &str) -> MediaItem {
        MediaItem::from_path(format!("/music/{id}.mp3"))
    }

    fn ids(queue: &MediaQueue) -> Vec<String> {
        queue
            .items()
            .iter()
            .map(|i| i.title.clone())
            .collect()
    }

    fn queue_of(names: &[&str]) -> MediaQueue {
        let mut rng = shuffle_rng(Some(1));
        let mut queue = MediaQueue::new();
        for name in names {
            queue.push(item(name), &mut rng);
        }
        queue
    }

    #[test]
    fn push_keeps_insertion_order() {
        let queue = queue_of(&["a", "b", "c"]);
        assert_eq!(ids(&queue), vec!["a", "b", "c"]);
        assert_eq!(queue.play_order(), &[0, 1, 2]);
        assert_eq!(queue.index(), None);
    }

    #[test]
    fn remove_before_current_shifts_index() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.select(2);

        let removed = queue.remove(0).unwrap();
        assert!(!removed.was_current);
        assert_eq!(queue.index(), Some(1));
        assert_eq!(queue.current().unwrap().title, "c");
    }

    #[test]
    fn remove_after_current_keeps_index() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.select(0);

        queue.remove(2).unwrap();
        assert_eq!(queue.index(), Some(0));
        assert_eq!(ids(&queue), vec!["a", "b"]);
    }

    #[test]
    fn remove_current_moves_to_following_item() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.select(1);

        let removed = queue.remove(1).unwrap();
        assert!(removed.was_current);
        assert_eq!(removed.item.title, "b");
        assert_eq!(queue.current().unwrap().title, "c");
    }

    #[test]
    fn remove_current_last_clamps() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.select(2);

        queue.remove(2).unwrap();
        assert_eq!(queue.index(), Some(1));
        assert_eq!(queue.current().unwrap().title, "b");
    }

    #[test]
    fn remove_only_item_clears_index() {
        let mut queue = queue_of(&["a"]);
        queue.select(0);

        queue.remove(0).unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.index(), None);
    }

    #[test]
    fn remove_out_of_bounds() {
        let mut queue = queue_of(&["a"]);
        assert!(queue.remove(1).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn replace_swaps_in_place() {
        let mut queue = queue_of(&["a", "b", "c"]);
        let old = queue.replace(1, item("x")).unwrap();

        assert_eq!(old.title, "b");
        assert_eq!(ids(&queue), vec!["a", "x", "c"]);
        assert!(queue.replace(3, item("y")).is_none());
    }

    #[test]
    fn next_and_previous_without_repeat() {
        let mut queue = queue_of(&["a", "b", "c"]);
        assert_eq!(queue.next_index(RepeatMode::Off), Some(0));

        queue.select(0);
        assert_eq!(queue.next_index(RepeatMode::Off), Some(1));
        assert_eq!(queue.previous_index(RepeatMode::Off), None);

        queue.select(2);
        assert_eq!(queue.next_index(RepeatMode::Off), None);
        assert_eq!(queue.next_index(RepeatMode::One), None);
        assert_eq!(queue.previous_index(RepeatMode::Off), Some(1));
    }

    #[test]
    fn repeat_all_wraps_both_ways() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.select(2);
        assert_eq!(queue.next_index(RepeatMode::All), Some(0));

        queue.select(0);
        assert_eq!(queue.previous_index(RepeatMode::All), Some(2));
    }

    #[test]
    fn shuffle_keeps_current_first_and_all_items() {
        let mut rng = shuffle_rng(Some(3));
        let mut queue = queue_of(&["a", "b", "c", "d", "e", "f"]);
        queue.select(3);

        queue.set_shuffled(true, &mut rng);
        assert!(queue.is_shuffled());
        assert_eq!(queue.play_order()[0], 3);
        let unique: HashSet<usize> = queue.play_order().iter().copied().collect();
        assert_eq!(unique.len(), 6);

        // Items themselves are never reordered
        assert_eq!(ids(&queue), vec!["a", "b", "c", "d", "e", "f"]);
        assert_eq!(queue.index(), Some(3));

        queue.set_shuffled(false, &mut rng);
        assert_eq!(queue.play_order(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(queue.index(), Some(3));
    }

    #[test]
    fn push_while_shuffled_lands_after_current() {
        let mut rng = shuffle_rng(Some(11));
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.select(1);
        queue.set_shuffled(true, &mut rng);

        queue.push(item("e"), &mut rng);

        let order = queue.play_order();
        assert_eq!(order.len(), 5);
        assert_eq!(order[0], 1);
        let pos = order.iter().position(|&i| i == 4).unwrap();
        assert!(pos >= 1);
    }

    #[test]
    fn removing_while_shuffled_keeps_order_consistent() {
        let mut rng = shuffle_rng(Some(21));
        let mut queue = queue_of(&["a", "b", "c", "d", "e"]);
        queue.select(0);
        queue.set_shuffled(true, &mut rng);

        queue.remove(2).unwrap();

        let mut order: Vec<usize> = queue.play_order().to_vec();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(queue.current().unwrap().title, "a");
    }

    #[test]
    fn set_items_resets_current() {
        let mut rng = shuffle_rng(Some(2));
        let mut queue = queue_of(&["a", "b"]);
        queue.select(1);

        queue.set_items(vec![item("x"), item("y"), item("z")], &mut rng);
        assert_eq!(queue.index(), None);
        assert_eq!(queue.first_in_order(), Some(0));
        assert_eq!(ids(&queue), vec!["x", "y", "z"]);
    }

    #[test]
    fn clear_empties_everything() {
        let mut queue = queue_of(&["a", "b"]);
        queue.select(0);
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.index(), None);
        assert!(queue.play_order().is_empty());
        assert_eq!(queue.next_index(RepeatMode::All), None);
    }

    #[test]
    fn position_of_finds_by_id() {
        let queue = queue_of(&["a", "b"]);
        assert_eq!(queue.position_of("/music/b.mp3"), Some(1));
        assert_eq!(queue.position_of("missing"), None);
    }
}
