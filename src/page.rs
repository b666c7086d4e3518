//! Linear page index <-> (character, side) mapping
//!
//! Pages 0 and 1 show the anchor character (right, then left). The next N
//! pages are every catalog character's right side, the N after that every
//! left side. Indices wrap in both directions.

use crate::constants::pages::ANCHOR_PAGES;
use crate::types::Side;

/// A resolved page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub index: i64,
    pub character: String,
    pub side: Side,
}

/// Character catalog plus the anchor character, fixed for a session
#[derive(Debug, Clone)]
pub struct PageModel {
    anchor: String,
    catalog: Vec<String>,
}

impl PageModel {
    pub fn new(anchor: impl Into<String>, catalog: Vec<String>) -> Self {
        Self {
            anchor: anchor.into(),
            catalog,
        }
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn total_pages(&self) -> i64 {
        ANCHOR_PAGES + 2 * self.catalog.len() as i64
    }

    /// Wrap any index (negative included) into `[0, total_pages)`
    pub fn normalize(&self, index: i64) -> i64 {
        index.rem_euclid(self.total_pages())
    }

    pub fn character(&self, index: i64) -> &str {
        let index = self.normalize(index);
        if index < ANCHOR_PAGES {
            return &self.anchor;
        }
        let n = self.catalog.len() as i64;
        &self.catalog[((index - ANCHOR_PAGES) % n) as usize]
    }

    pub fn side(&self, index: i64) -> Side {
        let index = self.normalize(index);
        match index {
            0 => Side::Right,
            1 => Side::Left,
            _ if index - ANCHOR_PAGES < self.catalog.len() as i64 => Side::Right,
            _ => Side::Left,
        }
    }

    pub fn page(&self, index: i64) -> Page {
        let index = self.normalize(index);
        Page {
            index,
            character: self.character(index).to_string(),
            side: self.side(index),
        }
    }

    /// First page showing `character` on `side`, matched case-insensitively.
    /// Catalog pages win over the anchor pages so the anchor character can
    /// still be reached by its own catalog entry.
    pub fn find(&self, character: &str, side: Side) -> Option<i64> {
        let wanted = character.trim();
        if let Some(pos) = self
            .catalog
            .iter()
            .position(|name| name.eq_ignore_ascii_case(wanted))
        {
            let base = ANCHOR_PAGES + pos as i64;
            return Some(match side {
                Side::Right => base,
                Side::Left => base + self.catalog.len() as i64,
            });
        }
        if self.anchor.eq_ignore_ascii_case(wanted) {
            return Some(match side {
                Side::Right => 0,
                Side::Left => 1,
            });
        }
        None
    }
}
