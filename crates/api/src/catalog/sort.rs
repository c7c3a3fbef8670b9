//! Sort keys per collection.
//!
//! Every ordering ends with `created_at DESC, id ASC` so pages are deterministic
//! when the primary key ties.

use std::fmt::Debug;

/// Tiebreak applied after every primary ordering.
pub const TIEBREAK_ORDER: &str = "created_at DESC, id ASC";

/// A collection's sort key.
pub trait SortKey: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Parse a query string value. Unknown values return `None`.
    fn parse(raw: &str) -> Option<Self>;

    fn as_str(&self) -> &'static str;

    /// SQL ordering for the primary comparator, `None` when the tiebreak alone applies.
    fn primary_order(&self) -> Option<&'static str>;
}

/// Full SQL `ORDER BY` expression for a sort key.
pub fn order_by_clause<S: SortKey>(sort: S) -> String {
    match sort.primary_order() {
        Some(primary) => format!("{}, {}", primary, TIEBREAK_ORDER),
        None => TIEBREAK_ORDER.to_string(),
    }
}

/// Product orderings. There is no popularity signal for products, so
/// `popular` is not accepted and falls back to `newest` like any unknown key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl SortKey for ProductSort {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "newest" => Some(ProductSort::Newest),
            "price-asc" => Some(ProductSort::PriceAsc),
            "price-desc" => Some(ProductSort::PriceDesc),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ProductSort::Newest => "newest",
            ProductSort::PriceAsc => "price-asc",
            ProductSort::PriceDesc => "price-desc",
        }
    }

    fn primary_order(&self) -> Option<&'static str> {
        match self {
            ProductSort::Newest => None,
            ProductSort::PriceAsc => Some("price_cents ASC"),
            ProductSort::PriceDesc => Some("price_cents DESC"),
        }
    }
}

/// Asset orderings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssetSort {
    #[default]
    Newest,
    /// Most downloaded first.
    Popular,
    /// Title A-Z, ignoring case. Compared by code point, independent of the
    /// database locale.
    Name,
}

impl SortKey for AssetSort {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "newest" => Some(AssetSort::Newest),
            "popular" => Some(AssetSort::Popular),
            "name" => Some(AssetSort::Name),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            AssetSort::Newest => "newest",
            AssetSort::Popular => "popular",
            AssetSort::Name => "name",
        }
    }

    fn primary_order(&self) -> Option<&'static str> {
        match self {
            AssetSort::Newest => None,
            AssetSort::Popular => Some("download_count DESC"),
            AssetSort::Name => Some(r#"LOWER(title) COLLATE "C" ASC"#),
        }
    }
}
