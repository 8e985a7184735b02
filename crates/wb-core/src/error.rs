/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or parsing core view-models.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A coin amount could not be parsed.
    #[error("invalid price: \"{0}\"")]
    InvalidPrice(String),

    /// A rarity name is not one of common, uncommon, rare, unique.
    #[error("unknown rarity: \"{0}\"")]
    UnknownRarity(String),

    /// A fundamental rune tier is outside 0..=3, or property runes exceed the potency tier.
    #[error("invalid rune configuration: {0}")]
    InvalidRuneTier(String),
}
