//! Conversion of raw response objects into one of several entity types.
//!
//! A union-typed response field is declared as a fixed list of
//! [`Candidate`]s. When more than one candidate is possible the object must
//! carry a `__typename` discriminator naming one of them; with a single
//! candidate the discriminator is optional and checked by the entity itself.
//! Candidate tables are `const`, so a union whose candidates share a type
//! name fails to compile rather than misbehaving at runtime.

use std::fmt;

use serde_json::{Map, Value};
use tracing::trace;

use crate::entity::Entity;
use crate::error::ConversionError;
use crate::maybe::Maybe;

/// Response key carrying the GraphQL type name.
pub const TYPENAME_KEY: &str = "__typename";

type Decode<U> = fn(Map<String, Value>) -> Result<U, ConversionError>;

/// One entity type a union field may resolve to.
pub struct Candidate<U> {
    typename: &'static str,
    decode: Decode<U>,
}

impl<U> Candidate<U> {
    /// Candidate decoding entity `E` and wrapping it into `U`.
    #[must_use]
    pub const fn of<E>() -> Self
    where
        E: Entity,
        U: From<E>,
    {
        Self {
            typename: E::TYPENAME,
            decode: decode_into::<E, U>,
        }
    }

    /// GraphQL type name this candidate answers to.
    #[must_use]
    pub const fn typename(&self) -> &'static str {
        self.typename
    }
}

impl<U> Clone for Candidate<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Candidate<U> {}

impl<U> fmt::Debug for Candidate<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("typename", &self.typename)
            .finish_non_exhaustive()
    }
}

fn decode_into<E, U>(data: Map<String, Value>) -> Result<U, ConversionError>
where
    E: Entity,
    U: From<E>,
{
    E::from_api_response(data).map(U::from)
}

/// Value handed to an [`EntityConverter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming<U> {
    /// The field was not requested.
    Omitted,
    /// An already converted entity.
    Entity(U),
    /// Raw JSON from the response.
    Json(Value),
}

impl<U> From<Value> for Incoming<U> {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug)]
enum CandidateSet<U: 'static> {
    Single(Candidate<U>),
    Union(&'static [Candidate<U>]),
}

/// Converts raw values into one of a fixed set of entity types.
#[derive(Debug)]
pub struct EntityConverter<U: 'static> {
    candidates: CandidateSet<U>,
}

impl<U: 'static> Clone for CandidateSet<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U: 'static> Copy for CandidateSet<U> {}

impl<U: 'static> Clone for EntityConverter<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U: 'static> Copy for EntityConverter<U> {}

impl<E: Entity + 'static> EntityConverter<E> {
    /// Converter for exactly one entity type; no discriminator is required.
    #[must_use]
    pub const fn single() -> Self {
        Self {
            candidates: CandidateSet::Single(Candidate::of::<E>()),
        }
    }
}

impl<U: 'static> EntityConverter<U> {
    /// Converter over a declared candidate list.
    ///
    /// # Panics
    ///
    /// Panics if the list is empty, if two candidates share a type name, or
    /// if a multi-candidate list contains an entity without a type name.
    /// Used from a `const` item this is a compile error.
    #[must_use]
    pub const fn union(candidates: &'static [Candidate<U>]) -> Self {
        assert!(
            !candidates.is_empty(),
            "an entity converter needs at least one candidate"
        );
        assert!(
            candidates.len() == 1 || all_named(candidates),
            "union candidates must declare a type name"
        );
        assert!(
            distinct_typenames(candidates),
            "union candidates must have distinct type names"
        );
        Self {
            candidates: CandidateSet::Union(candidates),
        }
    }

    /// The declared candidates, in declaration order.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate<U>] {
        match &self.candidates {
            CandidateSet::Single(candidate) => std::slice::from_ref(candidate),
            CandidateSet::Union(candidates) => *candidates,
        }
    }

    /// Type names of the declared candidates.
    #[must_use]
    pub fn typenames(&self) -> Vec<&'static str> {
        self.candidates().iter().map(Candidate::typename).collect()
    }

    /// Convert a raw value into one of the candidate entities.
    ///
    /// `Omitted` and already converted entities are returned unchanged and a
    /// JSON `null` becomes [`Maybe::Null`].
    pub fn convert(&self, incoming: Incoming<U>) -> Result<Maybe<U>, ConversionError> {
        match incoming {
            Incoming::Omitted => Ok(Maybe::Omitted),
            Incoming::Entity(entity) => Ok(Maybe::Value(entity)),
            Incoming::Json(Value::Null) => Ok(Maybe::Null),
            Incoming::Json(Value::Object(mut data)) => {
                let candidate = self.select(&mut data)?;
                (candidate.decode)(data).map(Maybe::Value)
            }
            Incoming::Json(other) => Err(ConversionError::invalid_value("object", &other)),
        }
    }

    /// Shorthand for converting raw JSON.
    pub fn convert_value(&self, value: Value) -> Result<Maybe<U>, ConversionError> {
        self.convert(Incoming::Json(value))
    }

    fn select(&self, data: &mut Map<String, Value>) -> Result<Candidate<U>, ConversionError> {
        let candidates = self.candidates();
        if let [only] = candidates {
            return Ok(*only);
        }

        let Some(typename) = take_typename(data)? else {
            return Err(ConversionError::Disambiguation {
                candidates: self.typenames(),
            });
        };

        match candidates
            .iter()
            .find(|candidate| candidate.typename == typename)
        {
            Some(candidate) => {
                trace!(typename = %typename, "resolved union candidate");
                Ok(*candidate)
            }
            None => Err(ConversionError::UnknownType {
                typename,
                candidates: self.typenames(),
            }),
        }
    }
}

/// Remove the discriminator from a raw object.
pub(crate) fn take_typename(
    data: &mut Map<String, Value>,
) -> Result<Option<String>, ConversionError> {
    match data.remove(TYPENAME_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(typename)) => Ok(Some(typename)),
        Some(other) => Err(ConversionError::invalid_value("string __typename", &other)),
    }
}

const fn all_named<U>(candidates: &[Candidate<U>]) -> bool {
    let mut i = 0;
    while i < candidates.len() {
        if candidates[i].typename.is_empty() {
            return false;
        }
        i += 1;
    }
    true
}

const fn distinct_typenames<U>(candidates: &[Candidate<U>]) -> bool {
    let mut i = 0;
    while i < candidates.len() {
        let mut j = i + 1;
        while j < candidates.len() {
            if str_eq(candidates[i].typename, candidates[j].typename) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// An enum over several entity types, resolved by `__typename`.
///
/// Implemented by [`entity_union!`](crate::entity_union).
pub trait Resolve: Sized + 'static {
    /// Candidate entity types, in declaration order.
    const CANDIDATES: &'static [Candidate<Self>];

    /// Converter over [`Self::CANDIDATES`].
    const CONVERTER: EntityConverter<Self> = EntityConverter::union(Self::CANDIDATES);

    /// Type name of the held variant.
    fn typename(&self) -> &'static str;
}

/// Declare an enum over entity types that resolves by `__typename`.
///
/// Each variant wraps exactly one [`Entity`](crate::Entity) type. The macro
/// derives `Debug`, `Clone`, `PartialEq` and `Eq`, one `From` impl per
/// variant, [`Resolve`] and [`ToJson`](crate::ToJson).
///
/// ```ignore
/// entity_union! {
///     pub enum AccountResult {
///         Success(Account),
///         Error(AccountError),
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity_union {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident($entity:ty) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant($entity), )+
        }

        $(
            impl ::core::convert::From<$entity> for $name {
                fn from(value: $entity) -> Self {
                    Self::$variant(value)
                }
            }
        )+

        impl $crate::Resolve for $name {
            const CANDIDATES: &'static [$crate::Candidate<Self>] = &[
                $( $crate::Candidate::of::<$entity>(), )+
            ];

            fn typename(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => <$entity as $crate::Entity>::TYPENAME, )+
                }
            }
        }

        impl $crate::ToJson for $name {
            fn to_json(&self, case: $crate::KeyCase) -> $crate::__serde_json::Value {
                match self {
                    $(
                        Self::$variant(inner) => $crate::__serde_json::Value::Object(
                            $crate::Entity::to_json_map(inner, case),
                        ),
                    )+
                }
            }
        }
    };
}
