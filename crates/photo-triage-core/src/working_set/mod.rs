//! The collection of pictures under review.
//!
//! Items live in an arena and are never physically removed while the set
//! exists; a dead item is just skipped by traversal. Two ordered views share
//! the arena: the full sequence of every scanned item, and the compare
//! sequence holding the items currently tagged for comparison. Both are
//! ordered by path.


use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::catalog::{CatalogItem, ItemId};
use crate::discovery::discover_reviewable;
use crate::error::{Error, Result};
use crate::metadata::MetadataProvider;
use crate::reporter::Reporter;
use crate::types::{Disposition, Offset, Rotation};

/// Which sequence the cursor walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Full,
    Compare,
}

/// Cursor movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    First,
    Last,
    /// Absolute index into the active sequence, wrapping
    To(usize),
    /// Signed number of live items to step over, wrapping
    By(isize),
}

#[derive(Debug, Default, Clone)]
pub struct WorkingSet {
    items: Vec<CatalogItem>,
    full: Vec<ItemId>,
    compare: Vec<ItemId>,
    view: View,
    cursor: Option<usize>,
    /// Full-view cursor saved while the compare view is active
    saved_cursor: Option<usize>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from every reviewable picture under `root`.
    ///
    /// Orientation that can't be read defaults to no rotation and is
    /// reported, it never stops the scan.
    pub fn scan<M, R>(
        root: &Path,
        max_depth: Option<usize>,
        metadata: &M,
        reporter: &mut R,
    ) -> Result<Self>
    where
        M: MetadataProvider + ?Sized,
        R: Reporter,
    {
        let root = std::fs::canonicalize(root).map_err(|_| Error::FileNotFound(root.to_path_buf()))?;
        let mut set = Self::new();

        for path in discover_reviewable(&root, max_depth)? {
            let rotation = match metadata.read_orientation(&path) {
                Ok(rotation) => rotation.unwrap_or_default(),
                Err(e) => {
                    reporter.notice(&path, format!("metadata unreadable, not rotating: {}", e));
                    Rotation::Deg0
                }
            };
            set.insert(path, rotation);
        }

        log::info!("Scanned {} pictures under {}", set.len(), root.display());
        Ok(set)
    }

    /// Add an item keeping path order; returns the existing id for a known path
    pub fn insert(&mut self, path: impl Into<PathBuf>, rotation: Rotation) -> ItemId {
        let path = path.into();
        match self.search(&self.full, &path) {
            Ok(pos) => self.full[pos],
            Err(pos) => {
                let id = ItemId(self.items.len());
                self.items.push(CatalogItem::new(path, rotation));
                self.full.insert(pos, id);
                if self.view == View::Full {
                    self.shift_cursor_for_insert(pos);
                } else if let Some(saved) = self.saved_cursor.as_mut() {
                    if pos <= *saved {
                        *saved += 1;
                    }
                }
                id
            }
        }
    }

    fn search(&self, seq: &[ItemId], path: &Path) -> std::result::Result<usize, usize> {
        seq.binary_search_by(|id| self.items[id.0].path().cmp(path))
    }

    fn shift_cursor_for_insert(&mut self, pos: usize) {
        match self.cursor {
            Some(c) if pos <= c => self.cursor = Some(c + 1),
            Some(_) => {}
            None => self.cursor = Some(pos),
        }
    }

    // -- Accessors --

    /// Number of items in the full sequence, dead ones included
    pub fn len(&self) -> usize {
        self.full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.full.iter().filter(|id| self.items[id.0].is_alive()).count()
    }

    pub fn item(&self, id: ItemId) -> &CatalogItem {
        &self.items[id.0]
    }

    pub fn find(&self, path: &Path) -> Option<ItemId> {
        self.search(&self.full, path).ok().map(|pos| self.full[pos])
    }

    /// Every item in path order
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &CatalogItem)> {
        self.full.iter().map(move |&id| (id, &self.items[id.0]))
    }

    pub fn full_ids(&self) -> &[ItemId] {
        &self.full
    }

    pub fn compare_ids(&self) -> &[ItemId] {
        &self.compare
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// The sequence the cursor walks
    pub fn active(&self) -> &[ItemId] {
        match self.view {
            View::Full => &self.full,
            View::Compare => &self.compare,
        }
    }

    pub fn current(&self) -> Option<ItemId> {
        let id = *self.active().get(self.cursor?)?;
        self.items[id.0].is_alive().then_some(id)
    }

    pub fn current_item(&self) -> Option<&CatalogItem> {
        self.current().map(|id| self.item(id))
    }

    /// 1-based cursor position and active sequence length
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current()?;
        self.cursor.map(|c| (c + 1, self.active().len()))
    }

    /// Live items per disposition
    pub fn tally(&self) -> BTreeMap<Disposition, usize> {
        let mut tally = BTreeMap::new();
        for (_, item) in self.iter().filter(|(_, item)| item.is_alive()) {
            *tally.entry(item.disposition()).or_insert(0) += 1;
        }
        tally
    }

    // -- Navigation --

    fn is_live_at(&self, index: usize) -> bool {
        self.items[self.active()[index].0].is_alive()
    }

    /// Nearest live index from `from` stepping by `dir` (+1 or -1), wrapping.
    /// `from` itself is considered when `inclusive`.
    fn next_live(&self, from: usize, dir: isize, inclusive: bool) -> Option<usize> {
        let len = self.active().len() as isize;
        if len == 0 {
            return None;
        }
        let first = if inclusive { 0 } else { 1 };
        (first..=len)
            .map(|k| (from as isize + dir * k).rem_euclid(len) as usize)
            .find(|&i| self.is_live_at(i))
    }

    fn live_in_active(&self) -> usize {
        self.active()
            .iter()
            .filter(|id| self.items[id.0].is_alive())
            .count()
    }

    /// Move the cursor, skipping dead items
    pub fn move_cursor(&mut self, movement: Move) -> Result<ItemId> {
        let len = self.active().len();
        let live = self.live_in_active();
        if live == 0 {
            self.cursor = None;
            return Err(Error::EmptyWorkingSet);
        }

        let target = match (movement, self.cursor) {
            (Move::First, _) => self.next_live(0, 1, true),
            (Move::Last, _) => self.next_live(len - 1, -1, true),
            (Move::To(index), _) => self.next_live(index % len, 1, true),
            (Move::By(_), None) => self.next_live(0, 1, true),
            (Move::By(delta), Some(cursor)) => {
                let cursor = cursor.min(len - 1);
                if !self.is_live_at(cursor) {
                    // Landing on the next live item counts as the first step
                    let dir = if delta < 0 { -1 } else { 1 };
                    let start = self.next_live(cursor, dir, true);
                    start.map(|s| self.step(s, delta.signum(), delta.unsigned_abs().saturating_sub(1), live))
                } else {
                    Some(self.step(cursor, delta.signum(), delta.unsigned_abs(), live))
                }
            }
        };

        let target = target.ok_or(Error::EmptyWorkingSet)?;
        self.cursor = Some(target);
        Ok(self.active()[target])
    }

    /// Step `count` live items from the live index `from`
    fn step(&self, from: usize, dir: isize, count: usize, live: usize) -> usize {
        let mut at = from;
        if dir == 0 {
            return at;
        }
        for _ in 0..count % live {
            at = self.next_live(at, dir, false).unwrap_or(at);
        }
        at
    }

    /// Put the cursor on a live item, preferring the current position
    fn settle_cursor(&mut self) {
        let len = self.active().len();
        self.cursor = match self.cursor {
            _ if len == 0 => None,
            Some(c) => self.next_live(c.min(len - 1), 1, true),
            None => self.next_live(0, 1, true),
        };
    }

    // -- Tagging --

    /// Replace the disposition of an item
    pub fn set_disposition(&mut self, id: ItemId, disposition: Disposition) {
        if disposition == Disposition::Compare {
            self.select_for_compare(id);
            return;
        }
        if self.items[id.0].disposition() == Disposition::Compare {
            self.remove_from_compare(id);
        }
        self.items[id.0].set_disposition(disposition);
    }

    /// Tag the current item
    pub fn tag(&mut self, disposition: Disposition) -> Result<ItemId> {
        let id = self.current().ok_or(Error::EmptyWorkingSet)?;
        self.set_disposition(id, disposition);
        Ok(id)
    }

    pub fn untag(&mut self) -> Result<ItemId> {
        self.tag(Disposition::None)
    }

    /// Tag an item Compare and add it to the compare sequence
    pub fn select_for_compare(&mut self, id: ItemId) {
        if self.items[id.0].disposition() == Disposition::Compare {
            return;
        }
        self.items[id.0].set_disposition(Disposition::Compare);

        let path = self.items[id.0].path().to_path_buf();
        if let Err(pos) = self.search(&self.compare, &path) {
            self.compare.insert(pos, id);
            if self.view == View::Compare {
                self.shift_cursor_for_insert(pos);
            }
        }
    }

    /// Keep an item's Compare tag through the next switch back to the full
    /// view; it leaves the compare sequence and will be staged on commit.
    pub fn finalize_compare(&mut self, id: ItemId) {
        if self.items[id.0].disposition() == Disposition::Compare {
            self.remove_from_compare(id);
        }
    }

    fn remove_from_compare(&mut self, id: ItemId) {
        let Some(pos) = self.compare.iter().position(|&c| c == id) else {
            return;
        };
        self.compare.remove(pos);
        if self.view == View::Compare {
            if let Some(c) = self.cursor {
                if pos < c {
                    self.cursor = Some(c - 1);
                }
            }
            self.settle_cursor();
        }
    }

    /// Change the active sequence.
    ///
    /// Leaving the compare view clears the Compare tag of everything still
    /// in the compare sequence and empties it.
    pub fn switch_view(&mut self, to_compare: bool) {
        match (self.view, to_compare) {
            (View::Full, true) => {
                self.saved_cursor = self.cursor;
                self.view = View::Compare;
                self.cursor = None;
                self.settle_cursor();
            }
            (View::Compare, false) => {
                for id in std::mem::take(&mut self.compare) {
                    if self.items[id.0].disposition() == Disposition::Compare {
                        self.items[id.0].set_disposition(Disposition::None);
                    }
                }
                self.view = View::Full;
                self.cursor = self.saved_cursor.take();
                self.settle_cursor();
            }
            _ => {}
        }
    }

    // -- Liveness --

    /// Mark an item dead; it stays in storage but traversal skips it
    pub fn expunge(&mut self, id: ItemId) {
        self.items[id.0].kill();
    }

    /// Expunge the current item and advance to the next live one in the
    /// active sequence. `Ok(None)` when nothing is left.
    pub fn remove_current(&mut self) -> Result<Option<ItemId>> {
        let id = self.current().ok_or(Error::EmptyWorkingSet)?;
        self.expunge(id);
        Ok(self.advance_from_dead())
    }

    fn advance_from_dead(&mut self) -> Option<ItemId> {
        let cursor = self.cursor?;
        self.cursor = self.next_live(cursor, 1, false);
        self.current()
    }

    /// Load the current item's content; items that fail to load are
    /// expunged, reported and skipped until one loads or none are left.
    pub fn materialize<T, E, F, R>(&mut self, reporter: &mut R, mut load: F) -> Result<(ItemId, T)>
    where
        E: std::fmt::Display,
        F: FnMut(&CatalogItem) -> std::result::Result<T, E>,
        R: Reporter,
    {
        loop {
            let id = match self.current() {
                Some(id) => id,
                None => {
                    self.settle_cursor();
                    self.current().ok_or(Error::EmptyWorkingSet)?
                }
            };
            match load(&self.items[id.0]) {
                Ok(content) => return Ok((id, content)),
                Err(e) => {
                    reporter.failed("load", self.items[id.0].path(), &e);
                    self.expunge(id);
                    self.advance_from_dead().ok_or(Error::EmptyWorkingSet)?;
                }
            }
        }
    }

    /// Drop dead items from the compare sequence and put the cursor back on
    /// a live item
    pub fn compact(&mut self) {
        let current = self.current();
        let items = &self.items;
        self.compare.retain(|id| items[id.0].is_alive());
        if let Some(saved) = self.saved_cursor {
            self.saved_cursor = Some(saved.min(self.full.len().saturating_sub(1)));
        }

        self.cursor = match current {
            Some(id) => self.active().iter().position(|&a| a == id),
            None => self.cursor,
        };
        self.settle_cursor();
    }

    // -- Per-item view state --

    pub fn set_offset(&mut self, id: ItemId, offset: Offset) {
        self.items[id.0].last_viewed_offset = Some(offset);
    }

    pub fn offset(&self, id: ItemId) -> Option<Offset> {
        self.items[id.0].last_viewed_offset
    }
}
