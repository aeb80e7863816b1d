//! Three-state field values.
//!
//! A GraphQL response only carries the fields the request selected, so an
//! entity field can be absent because it was never asked for, present but
//! explicitly `null`, or present with a value. [`Maybe`] keeps those apart.

/// A field value that may have been omitted from the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Maybe<T> {
    /// The field was not part of the request.
    Omitted,
    /// The field was requested and the service returned `null`.
    Null,
    /// The field was requested and carries a value.
    Value(T),
}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Self::Omitted
    }
}

impl<T> Maybe<T> {
    /// Returns `true` if the field was not requested.
    #[must_use]
    pub const fn is_omitted(&self) -> bool {
        matches!(self, Self::Omitted)
    }

    /// Returns `true` if the field was requested and is `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if the field carries a value.
    #[must_use]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Borrow the inner value.
    #[must_use]
    pub const fn as_ref(&self) -> Maybe<&T> {
        match self {
            Self::Omitted => Maybe::Omitted,
            Self::Null => Maybe::Null,
            Self::Value(value) => Maybe::Value(value),
        }
    }

    /// Map the inner value, keeping `Omitted` and `Null` as they are.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Maybe<U> {
        match self {
            Self::Omitted => Maybe::Omitted,
            Self::Null => Maybe::Null,
            Self::Value(value) => Maybe::Value(f(value)),
        }
    }

    /// Return the value, discarding the omitted/null distinction.
    #[must_use]
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Omitted | Self::Null => None,
        }
    }

    /// `None` when omitted, `Some(None)` when null, `Some(Some(_))` otherwise.
    #[must_use]
    pub fn requested(self) -> Option<Option<T>> {
        match self {
            Self::Omitted => None,
            Self::Null => Some(None),
            Self::Value(value) => Some(Some(value)),
        }
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_omitted() {
        let value: Maybe<String> = Maybe::default();
        assert!(value.is_omitted());
        assert_ne!(value, Maybe::Null);
    }

    #[test]
    fn requested_keeps_the_three_states_apart() {
        assert_eq!(Maybe::<u8>::Omitted.requested(), None);
        assert_eq!(Maybe::<u8>::Null.requested(), Some(None));
        assert_eq!(Maybe::Value(3_u8).requested(), Some(Some(3)));
    }

    #[test]
    fn map_preserves_markers() {
        assert_eq!(Maybe::<u8>::Omitted.map(u32::from), Maybe::Omitted);
        assert_eq!(Maybe::<u8>::Null.map(u32::from), Maybe::Null);
        assert_eq!(Maybe::Value(2_u8).map(u32::from), Maybe::Value(2_u32));
    }

    #[test]
    fn from_option_never_produces_omitted() {
        assert_eq!(Maybe::from(None::<u8>), Maybe::Null);
        assert_eq!(Maybe::from(Some(1_u8)), Maybe::Value(1));
    }
}
