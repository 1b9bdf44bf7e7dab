//! Item catalog: ordinary items, special items and their effects.

use thiserror::Error;

/// Catalog identity of an item. Tiles hold ids, never item copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u16);

/// Side effect run when a special item is popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Empties the triggering tile's row and column.
    LineClear,
    /// Adds one move to the budget.
    BonusMove,
    /// Empties the 3x3 block centred on the triggering tile.
    Blast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Ordinary,
    /// `affinity: None` matches next to any anchor item; `Some(id)` only next to `id`.
    Special {
        effect: Effect,
        affinity: Option<ItemId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    /// Single-character glyph, used by level layouts and the text presenter.
    pub symbol: char,
    /// Score weight.
    pub value: u32,
    pub kind: ItemKind,
}

impl Item {
    pub fn ordinary(name: &str, symbol: char, value: u32) -> Self {
        Self {
            name: name.to_string(),
            symbol,
            value,
            kind: ItemKind::Ordinary,
        }
    }

    pub fn special(name: &str, symbol: char, value: u32, effect: Effect) -> Self {
        Self {
            name: name.to_string(),
            symbol,
            value,
            kind: ItemKind::Special {
                effect,
                affinity: None,
            },
        }
    }

    #[inline]
    pub fn is_special(&self) -> bool {
        matches!(self.kind, ItemKind::Special { .. })
    }

    pub fn effect(&self) -> Option<Effect> {
        match self.kind {
            ItemKind::Special { effect, .. } => Some(effect),
            ItemKind::Ordinary => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown item: {0}")]
    UnknownItem(String),
    #[error("item {0} is listed twice")]
    Duplicate(String),
    #[error("level needs at least two ordinary items, got {0}")]
    TooFewItems(usize),
    #[error("{0} is a special item and cannot be used as an ordinary one")]
    NotOrdinary(String),
    #[error("{0} is not a special item")]
    NotSpecial(String),
}

/// Immutable set of item definitions plus the level's ordinary and special pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<Item>,
    level_items: Vec<ItemId>,
    special_items: Vec<ItemId>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// Build a catalog whose level pools are every ordinary and every special item.
    pub fn new(items: Vec<Item>) -> Result<Self, CatalogError> {
        for (i, item) in items.iter().enumerate() {
            if items[..i]
                .iter()
                .any(|other| other.name == item.name || other.symbol == item.symbol)
            {
                return Err(CatalogError::Duplicate(item.name.clone()));
            }
        }
        let ids = (0..items.len()).map(|i| ItemId(i as u16));
        let (special_items, level_items): (Vec<_>, Vec<_>) =
            ids.partition(|id| items[usize::from(id.0)].is_special());
        if level_items.len() < 2 {
            return Err(CatalogError::TooFewItems(level_items.len()));
        }
        Ok(Self {
            items,
            level_items,
            special_items,
        })
    }

    /// Five ordinary items and the three specials: dynamite, clover, bomb.
    pub fn standard() -> Self {
        Self {
            items: vec![
                Item::ordinary("apple", 'A', 10),
                Item::ordinary("banana", 'B', 10),
                Item::ordinary("cherry", 'C', 10),
                Item::ordinary("grape", 'G', 10),
                Item::ordinary("pear", 'P', 10),
                Item::special("dynamite", '*', 20, Effect::LineClear),
                Item::special("clover", '+', 20, Effect::BonusMove),
                Item::special("bomb", '@', 20, Effect::Blast),
            ],
            level_items: (0..5).map(ItemId).collect(),
            special_items: (5..8).map(ItemId).collect(),
        }
    }

    /// Restrict the level pools to the named items.
    pub fn for_level(&self, ordinary: &[&str], specials: &[&str]) -> Result<Self, CatalogError> {
        let mut level_items = Vec::with_capacity(ordinary.len());
        for name in ordinary {
            let id = self.require(name)?;
            if self[id].is_special() {
                return Err(CatalogError::NotOrdinary((*name).to_string()));
            }
            if level_items.contains(&id) {
                return Err(CatalogError::Duplicate((*name).to_string()));
            }
            level_items.push(id);
        }
        if level_items.len() < 2 {
            return Err(CatalogError::TooFewItems(level_items.len()));
        }
        let mut special_items = Vec::with_capacity(specials.len());
        for name in specials {
            let id = self.require(name)?;
            if !self[id].is_special() {
                return Err(CatalogError::NotSpecial((*name).to_string()));
            }
            if special_items.contains(&id) {
                return Err(CatalogError::Duplicate((*name).to_string()));
            }
            special_items.push(id);
        }
        Ok(Self {
            items: self.items.clone(),
            level_items,
            special_items,
        })
    }

    /// Set a special item's affinity; `None` makes it a wildcard.
    pub fn set_affinity(&mut self, special: ItemId, affinity: Option<ItemId>) {
        if let Some(Item {
            kind: ItemKind::Special { affinity: slot, .. },
            ..
        }) = self.items.get_mut(usize::from(special.0))
        {
            *slot = affinity;
        }
    }

    /// Ordinary items spawnable in this level, in catalog order.
    pub fn items_for_level(&self) -> &[ItemId] {
        &self.level_items
    }

    /// Special items spawnable in this level, in catalog order.
    pub fn special_items(&self) -> &[ItemId] {
        &self.special_items
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(usize::from(id.0))
    }

    pub fn by_name(&self, name: &str) -> Option<ItemId> {
        self.position(|item| item.name.eq_ignore_ascii_case(name))
    }

    pub fn by_symbol(&self, symbol: char) -> Option<ItemId> {
        self.position(|item| item.symbol == symbol)
    }

    fn position(&self, pred: impl Fn(&Item) -> bool) -> Option<ItemId> {
        self.items
            .iter()
            .position(pred)
            .map(|i| ItemId(i as u16))
    }

    fn require(&self, name: &str) -> Result<ItemId, CatalogError> {
        self.by_name(name)
            .ok_or_else(|| CatalogError::UnknownItem(name.to_string()))
    }

    #[inline]
    pub fn is_special(&self, id: ItemId) -> bool {
        self.get(id).is_some_and(Item::is_special)
    }

    #[inline]
    pub fn value(&self, id: ItemId) -> u32 {
        self.get(id).map_or(0, |item| item.value)
    }

    #[inline]
    pub fn effect(&self, id: ItemId) -> Option<Effect> {
        self.get(id).and_then(Item::effect)
    }

    pub fn symbol(&self, id: ItemId) -> char {
        self.get(id).map_or('?', |item| item.symbol)
    }

    /// Whether a special item may join a region anchored on `anchor`.
    pub fn accepts_anchor(&self, special: ItemId, anchor: ItemId) -> bool {
        match self.get(special).map(|item| item.kind) {
            Some(ItemKind::Special { affinity, .. }) => affinity.is_none_or(|a| a == anchor),
            _ => false,
        }
    }
}

impl std::ops::Index<ItemId> for Catalog {
    type Output = Item;

    fn index(&self, id: ItemId) -> &Item {
        &self.items[usize::from(id.0)]
    }
}
