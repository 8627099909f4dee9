//! Parameter bags and the cleaned-data wrapper.

use serde::Serialize;
use serde_json::{Map, Value};
use std::ops::Deref;

/// Marker that replaces the value of every blacklisted key.
pub const FILTERED_MARKER: &str = "[FILTERED]";

/// A string-keyed, arbitrarily nested parameter structure.
pub type ParamsBag = Map<String, Value>;

/// Convert a JSON value into a bag, if it is an object.
pub fn to_bag(value: &Value) -> Option<ParamsBag> {
    value.as_object().cloned()
}

/// Data that has been through a [`ParamsCleaner`](crate::ParamsCleaner).
///
/// Only this crate can construct a `Cleaned<T>` from arbitrary data, so a
/// value of this type is proof that cleaning ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cleaned<T>(T);

impl<T> Cleaned<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(value)
    }

    /// Unwrap the cleaned value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Cleaned<ParamsBag> {
    /// An empty bag, which is trivially clean.
    pub fn empty() -> Self {
        Self(ParamsBag::new())
    }
}

impl<T> Deref for Cleaned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> AsRef<T> for Cleaned<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}
