//! Fixed catalog of entity categories.
//!
//! Trend responses group entities by category and must cover every entry of
//! this catalog. The names are wire values of the target.

use std::fmt;

pub const CATEGORIES: [&str; 25] = [
    "いじっぱり",
    "うっかりや",
    "おくびょう",
    "おだやか",
    "おっとり",
    "おとなしい",
    "がんばりや",
    "きまぐれ",
    "さみしがり",
    "しんちょう",
    "すなお",
    "ずぶとい",
    "せっかち",
    "てれや",
    "なまいき",
    "のうてんき",
    "のんき",
    "ひかえめ",
    "まじめ",
    "むじゃき",
    "やんちゃ",
    "ゆうかん",
    "ようき",
    "れいせい",
    "わんぱく",
];

/// Position of a category in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Category(usize);

impl Category {
    pub fn parse(name: &str) -> Result<Self, UnknownCategory> {
        CATEGORIES
            .iter()
            .position(|c| *c == name)
            .map(Category)
            .ok_or_else(|| UnknownCategory(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        CATEGORIES[self.0]
    }

    /// Category by catalog position, wrapping around
    pub fn nth(n: usize) -> Self {
        Category(n % CATEGORIES.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

/// Set of catalog categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategorySet {
    bits: u32,
}

impl CategorySet {
    pub fn insert(&mut self, category: Category) {
        self.bits |= 1 << category.0;
    }

    pub fn contains(&self, category: Category) -> bool {
        self.bits & (1 << category.0) != 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Every catalog category is present
    pub fn is_full(&self) -> bool {
        self.len() == CATEGORIES.len()
    }

    /// Catalog categories not in the set
    pub fn missing(&self) -> Vec<&'static str> {
        (0..CATEGORIES.len())
            .map(Category)
            .filter(|c| !self.contains(*c))
            .map(Category::name)
            .collect()
    }
}
