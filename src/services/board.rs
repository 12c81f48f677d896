//! Board store — authoritative card/column state and ordering.
//!
//! DESIGN
//! ======
//! Columns are a fixed set established at construction; cards live in a map
//! keyed by id, and each column owns an ordered `Vec<CardId>` that is the
//! sole source of truth for intra-column position. `Card.column_id` is a
//! denormalized back-reference kept in lockstep with exactly one sequence.
//!
//! CONCURRENCY
//! ===========
//! One readers-writer lock over the whole store. A move touches two columns'
//! sequences and must never be observed half-applied, so every mutation takes
//! the lock exclusively; reads share it. No I/O happens under the lock —
//! rendering works against returned snapshots.
//!
//! ERROR HANDLING
//! ==============
//! Operations validate both endpoints before mutating, so a rejected call
//! never leaves a partial mutation behind.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

// =============================================================================
// TYPES
// =============================================================================

pub type CardId = u64;
pub type ColumnId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    pub content: String,
    pub column_id: ColumnId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    /// Rank among columns. Distinct per column; defines render order and the
    /// promote/demote adjacency relation.
    pub order: i32,
}

/// A column together with its cards in stored sequence order. The promote and
/// demote flags are captured under the same lock as the cards, so a snapshot's
/// affordances always agree with the cards it lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSnapshot {
    pub column: Column,
    pub cards: Vec<Card>,
    /// Whether a column with the next-higher order exists.
    pub can_promote: bool,
    /// Whether a column with the next-lower order exists.
    pub can_demote: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("card not found: {0}")]
    CardNotFound(CardId),
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),
    #[error("card {0} has no adjacent column in that direction")]
    InvalidTransition(CardId),
}

// =============================================================================
// STORE
// =============================================================================

struct BoardData {
    cards: HashMap<CardId, Card>,
    columns: HashMap<ColumnId, Column>,
    /// column id -> ordered card ids.
    column_cards: HashMap<ColumnId, Vec<CardId>>,
    next_card_id: CardId,
}

pub struct BoardStore {
    inner: RwLock<BoardData>,
}

impl BoardStore {
    /// Create a store over a fixed set of columns. Column CRUD is not
    /// supported; the set given here lives for the process lifetime.
    #[must_use]
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let columns: HashMap<ColumnId, Column> = columns.into_iter().map(|c| (c.id, c)).collect();
        let column_cards = columns.keys().map(|id| (*id, Vec::new())).collect();
        Self {
            inner: RwLock::new(BoardData { cards: HashMap::new(), columns, column_cards, next_card_id: 1 }),
        }
    }

    /// Store pre-populated with the default three-column board and a few
    /// starter cards.
    #[must_use]
    pub fn seeded() -> Self {
        let store = Self::new([
            Column { id: 1, title: "To Do".into(), order: 0 },
            Column { id: 2, title: "In Progress".into(), order: 1 },
            Column { id: 3, title: "Done".into(), order: 2 },
        ]);
        {
            let mut data = store.write();
            add_card_locked(&mut data, "Blog post", "Once the app is working and looking good, write it up", 1);
            add_card_locked(&mut data, "Post to HN", "", 1);
            add_card_locked(
                &mut data,
                "Build app",
                "Implement minimal Kanban Board with columns and draggable/editable cards",
                2,
            );
        }
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, BoardData> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BoardData> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// READS
// =============================================================================

impl BoardStore {
    /// Look up a single card.
    ///
    /// # Errors
    ///
    /// Returns `CardNotFound` if the id is unknown.
    pub fn get_card(&self, card_id: CardId) -> Result<Card, StoreError> {
        let data = self.read();
        data.cards.get(&card_id).cloned().ok_or(StoreError::CardNotFound(card_id))
    }

    /// Snapshot one column with its cards in sequence order.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` if the id is unknown.
    pub fn get_column(&self, column_id: ColumnId) -> Result<ColumnSnapshot, StoreError> {
        let data = self.read();
        snapshot_column(&data, column_id)
    }

    /// Snapshot every column, ordered by ascending `order`.
    #[must_use]
    pub fn get_columns(&self) -> Vec<ColumnSnapshot> {
        let data = self.read();
        let mut columns: Vec<&Column> = data.columns.values().collect();
        columns.sort_by_key(|c| c.order);
        columns.into_iter().map(|column| build_snapshot(&data, column)).collect()
    }

    /// Total number of cards on the board.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.read().cards.len()
    }

    /// Whether the card's column has a neighbor with the next-higher order.
    /// Uses the identical adjacency lookup as [`BoardStore::promote`], so UI
    /// affordances never diverge from the actions actually permitted.
    #[must_use]
    pub fn can_promote(&self, card_id: CardId) -> bool {
        self.card_affordances(card_id).0
    }

    /// Whether the card's column has a neighbor with the next-lower order.
    #[must_use]
    pub fn can_demote(&self, card_id: CardId) -> bool {
        self.card_affordances(card_id).1
    }

    /// Both affordances for one card, read under a single lock acquisition so
    /// the pair cannot straddle a concurrent move. Unknown cards get neither.
    #[must_use]
    pub fn card_affordances(&self, card_id: CardId) -> (bool, bool) {
        let data = self.read();
        (adjacent_column(&data, card_id, 1).is_ok(), adjacent_column(&data, card_id, -1).is_ok())
    }
}

// =============================================================================
// MUTATIONS
// =============================================================================

impl BoardStore {
    /// Create a card at the end of the column's sequence. Ids are assigned
    /// monotonically and never reused.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` if the column id is unknown.
    pub fn add_card(&self, title: &str, content: &str, column_id: ColumnId) -> Result<Card, StoreError> {
        let mut data = self.write();
        if !data.columns.contains_key(&column_id) {
            return Err(StoreError::ColumnNotFound(column_id));
        }
        Ok(add_card_locked(&mut data, title, content, column_id))
    }

    /// Update a card's title and content in place. Never changes the card's
    /// column or position.
    ///
    /// # Errors
    ///
    /// Returns `CardNotFound` if the id is unknown.
    pub fn update_card(&self, card_id: CardId, title: &str, content: &str) -> Result<Card, StoreError> {
        let mut data = self.write();
        let card = data.cards.get_mut(&card_id).ok_or(StoreError::CardNotFound(card_id))?;
        card.title = title.to_owned();
        card.content = content.to_owned();
        Ok(card.clone())
    }

    /// Move a card into `new_column_id` at `position`. `None` or any position
    /// at or past the end of the target sequence appends. Returns snapshots
    /// of the old and new column for event construction and re-rendering.
    ///
    /// # Errors
    ///
    /// Returns `CardNotFound` or `ColumnNotFound` if either endpoint is
    /// unknown; no mutation occurs on failure.
    pub fn move_card(
        &self,
        card_id: CardId,
        new_column_id: ColumnId,
        position: Option<usize>,
    ) -> Result<(ColumnSnapshot, ColumnSnapshot), StoreError> {
        let mut data = self.write();
        let from = move_card_locked(&mut data, card_id, new_column_id, position)?;
        Ok((snapshot_column(&data, from)?, snapshot_column(&data, new_column_id)?))
    }

    /// Move a card to the end of the column with the next-higher order.
    ///
    /// # Errors
    ///
    /// Returns `CardNotFound` if the id is unknown or `InvalidTransition`
    /// if the card is already in the last column.
    pub fn promote(&self, card_id: CardId) -> Result<(ColumnSnapshot, ColumnSnapshot), StoreError> {
        self.shift(card_id, 1)
    }

    /// Move a card to the end of the column with the next-lower order.
    ///
    /// # Errors
    ///
    /// Returns `CardNotFound` if the id is unknown or `InvalidTransition`
    /// if the card is already in the first column.
    pub fn demote(&self, card_id: CardId) -> Result<(ColumnSnapshot, ColumnSnapshot), StoreError> {
        self.shift(card_id, -1)
    }

    fn shift(&self, card_id: CardId, offset: i32) -> Result<(ColumnSnapshot, ColumnSnapshot), StoreError> {
        let mut data = self.write();
        let target = adjacent_column(&data, card_id, offset)?;
        let from = move_card_locked(&mut data, card_id, target, None)?;
        Ok((snapshot_column(&data, from)?, snapshot_column(&data, target)?))
    }

    /// Remove a card from its column's sequence and the card map atomically.
    /// Returns the removed card so callers can report its column.
    ///
    /// # Errors
    ///
    /// Returns `CardNotFound` if the id is unknown.
    pub fn delete_card(&self, card_id: CardId) -> Result<Card, StoreError> {
        let mut data = self.write();
        let card = data.cards.remove(&card_id).ok_or(StoreError::CardNotFound(card_id))?;
        if let Some(sequence) = data.column_cards.get_mut(&card.column_id) {
            sequence.retain(|id| *id != card_id);
        }
        Ok(card)
    }
}

// =============================================================================
// LOCKED HELPERS
// =============================================================================

fn add_card_locked(data: &mut BoardData, title: &str, content: &str, column_id: ColumnId) -> Card {
    let card = Card { id: data.next_card_id, title: title.to_owned(), content: content.to_owned(), column_id };
    data.next_card_id += 1;
    data.cards.insert(card.id, card.clone());
    data.column_cards.entry(column_id).or_default().push(card.id);
    card
}

/// Core move algorithm. Validates both endpoints, then removes the card from
/// its current sequence BEFORE computing the insertion index: for same-column
/// moves, an index computed against the original sequence is off by one.
/// Returns the column the card came from.
fn move_card_locked(
    data: &mut BoardData,
    card_id: CardId,
    new_column_id: ColumnId,
    position: Option<usize>,
) -> Result<ColumnId, StoreError> {
    if !data.columns.contains_key(&new_column_id) {
        return Err(StoreError::ColumnNotFound(new_column_id));
    }
    let old_column_id = data.cards.get(&card_id).ok_or(StoreError::CardNotFound(card_id))?.column_id;

    if let Some(sequence) = data.column_cards.get_mut(&old_column_id) {
        sequence.retain(|id| *id != card_id);
    }

    let sequence = data.column_cards.entry(new_column_id).or_default();
    let index = position.map_or(sequence.len(), |p| p.min(sequence.len()));
    sequence.insert(index, card_id);

    if let Some(card) = data.cards.get_mut(&card_id) {
        card.column_id = new_column_id;
    }
    Ok(old_column_id)
}

fn adjacent_column(data: &BoardData, card_id: CardId, offset: i32) -> Result<ColumnId, StoreError> {
    let card = data.cards.get(&card_id).ok_or(StoreError::CardNotFound(card_id))?;
    let current = data.columns.get(&card.column_id).ok_or(StoreError::ColumnNotFound(card.column_id))?;
    data.columns
        .values()
        .find(|c| c.order == current.order + offset)
        .map(|c| c.id)
        .ok_or(StoreError::InvalidTransition(card_id))
}

fn snapshot_column(data: &BoardData, column_id: ColumnId) -> Result<ColumnSnapshot, StoreError> {
    let column = data.columns.get(&column_id).ok_or(StoreError::ColumnNotFound(column_id))?;
    Ok(build_snapshot(data, column))
}

fn build_snapshot(data: &BoardData, column: &Column) -> ColumnSnapshot {
    ColumnSnapshot {
        cards: cards_for_column(data, column.id),
        can_promote: data.columns.values().any(|c| c.order == column.order + 1),
        can_demote: data.columns.values().any(|c| c.order == column.order - 1),
        column: column.clone(),
    }
}

fn cards_for_column(data: &BoardData, column_id: ColumnId) -> Vec<Card> {
    data.column_cards
        .get(&column_id)
        .map(|ids| ids.iter().filter_map(|id| data.cards.get(id).cloned()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
