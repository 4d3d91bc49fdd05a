//! Per-type decoder overrides.
//!
//! A [`DecoderRegistry`] holds at most one override hook for each scalar type
//! (`String`, `i64`, `f64` and `bool`). When a hook is installed it replaces
//! the default decoder completely, and its error is reported as
//! [`DecodeError::Custom`]. `Option<T>` resolves `T` through the same
//! registry.
//!
//! Registries are plain values: each [`Instrument`](crate::Instrument) owns
//! one, and cloning a registry shares its hooks.

use std::fmt;
use std::sync::Arc;

use crate::decode::MessageDecodable;
use crate::error::{BoxError, DecodeError};

/// A function that replaces the default decoder of `T`.
pub type DecodeHook<T> = Arc<dyn Fn(&str) -> Result<T, BoxError> + Send + Sync>;

/// Override hooks for the scalar types.
#[derive(Clone, Default)]
pub struct DecoderRegistry {
    string: Option<DecodeHook<String>>,
    int: Option<DecodeHook<i64>>,
    double: Option<DecodeHook<f64>>,
    boolean: Option<DecodeHook<bool>>,
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for String {}
    impl Sealed for i64 {}
    impl Sealed for f64 {}
    impl Sealed for bool {}
}

/// Scalar types whose default decoder can be overridden.
///
/// This trait is sealed.
pub trait Overridable: MessageDecodable + sealed::Sealed {
    #[doc(hidden)]
    fn slot(registry: &DecoderRegistry) -> Option<&DecodeHook<Self>>;

    #[doc(hidden)]
    fn slot_mut(registry: &mut DecoderRegistry) -> &mut Option<DecodeHook<Self>>;
}

macro_rules! impl_overridable {
    ($ty:ty, $field:ident) => {
        impl Overridable for $ty {
            fn slot(registry: &DecoderRegistry) -> Option<&DecodeHook<Self>> {
                registry.$field.as_ref()
            }

            fn slot_mut(registry: &mut DecoderRegistry) -> &mut Option<DecodeHook<Self>> {
                &mut registry.$field
            }
        }
    };
}

impl_overridable!(String, string);
impl_overridable!(i64, int);
impl_overridable!(f64, double);
impl_overridable!(bool, boolean);

impl DecoderRegistry {
    /// Creates a registry without overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or removes the override for `T`.
    ///
    /// Passing `None` restores the default decoder.
    pub fn set_override<T: Overridable>(&mut self, hook: Option<DecodeHook<T>>) {
        tracing::debug!(
            "{} override for {}",
            if hook.is_some() { "installing" } else { "removing" },
            std::any::type_name::<T>()
        );
        *T::slot_mut(self) = hook;
    }

    /// Installs a closure as the override for `T`.
    pub fn install<T, F>(&mut self, hook: F)
    where
        T: Overridable,
        F: Fn(&str) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.set_override::<T>(Some(Arc::new(hook)));
    }

    /// Removes the override for `T`.
    pub fn clear<T: Overridable>(&mut self) {
        self.set_override::<T>(None);
    }

    /// Returns true if an override for `T` is installed.
    #[must_use]
    pub fn is_overridden<T: Overridable>(&self) -> bool {
        T::slot(self).is_some()
    }

    /// Decodes a message as `T`, using the override for `T` when installed.
    pub fn decode<T: MessageDecodable>(&self, message: &str) -> Result<T, DecodeError> {
        T::decode_in(self, message)
    }

    /// Runs the override for `T` if installed, otherwise its default decoder.
    pub(crate) fn dispatch<T: Overridable>(&self, message: &str) -> Result<T, DecodeError> {
        match T::slot(self) {
            Some(hook) => hook(message).map_err(DecodeError::Custom),
            None => T::decoded(message).map_err(Into::into),
        }
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("string", &self.string.is_some())
            .field("int", &self.int.is_some())
            .field("double", &self.double.is_some())
            .field("boolean", &self.boolean.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntDecodeError;

    #[test]
    fn test_defaults_without_overrides() {
        let registry = DecoderRegistry::new();
        assert_eq!(registry.decode::<i64>("0x1F").unwrap(), 31);
        assert!(registry.decode::<f64>("9.9e37").unwrap().is_infinite());
        assert!(!registry.decode::<bool>("off").unwrap());
        assert_eq!(registry.decode::<String>(" raw ").unwrap(), " raw ");
    }

    #[test]
    fn test_override_replaces_default() {
        let mut registry = DecoderRegistry::new();
        registry.install::<bool, _>(|message| match message {
            "HIGH" => Ok(true),
            "LOW" => Ok(false),
            other => Err(format!("unexpected level {other}").into()),
        });

        assert!(registry.is_overridden::<bool>());
        assert!(registry.decode::<bool>("HIGH").unwrap());

        // The default spellings are no longer accepted.
        let err = registry.decode::<bool>("1").unwrap_err();
        assert!(matches!(err, DecodeError::Custom(_)));
        assert_eq!(err.to_string(), "custom decoder failed: unexpected level 1");
    }

    #[test]
    fn test_clear_restores_default() {
        let mut registry = DecoderRegistry::new();
        registry.install::<i64, _>(|_| Ok(-1));
        assert_eq!(registry.decode::<i64>("5").unwrap(), -1);

        registry.set_override::<i64>(None);
        assert!(!registry.is_overridden::<i64>());
        assert_eq!(registry.decode::<i64>("5").unwrap(), 5);
        assert!(matches!(
            registry.decode::<i64>("5.5"),
            Err(DecodeError::Int(IntDecodeError::NotAnInteger))
        ));
    }

    #[test]
    fn test_overrides_are_per_type() {
        let mut registry = DecoderRegistry::new();
        registry.install::<f64, _>(|message| Ok(message.len() as f64));

        assert_eq!(registry.decode::<f64>("abc").unwrap(), 3.0);
        assert_eq!(registry.decode::<i64>("3").unwrap(), 3);
        assert!(!registry.is_overridden::<String>());
    }

    #[test]
    fn test_optional_uses_override() {
        let mut registry = DecoderRegistry::new();
        registry.install::<i64, _>(|message| Ok(i64::try_from(message.len())?));

        assert_eq!(registry.decode::<Option<i64>>("abcd").unwrap(), Some(4));
        assert_eq!(registry.decode::<Option<i64>>("").unwrap(), None);
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = DecoderRegistry::new();
        let second = DecoderRegistry::new();
        first.install::<String, _>(|message| Ok(message.to_uppercase()));

        assert_eq!(first.decode::<String>("idn").unwrap(), "IDN");
        assert_eq!(second.decode::<String>("idn").unwrap(), "idn");
    }
}
