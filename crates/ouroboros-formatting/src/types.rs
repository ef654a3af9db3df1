//! Runtime type descriptors and boxed values
//!
//! Formatters are selected per requested type at runtime, so the engine works
//! with a [`TypeDescriptor`] (what the caller asked for) and a [`Value`] (what
//! a formatter produced or the caller supplied).

use crate::error::{FormattingError, FormattingResult};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

type DefaultFactory = fn() -> Option<Value>;

// ============================================================================
// Value
// ============================================================================

/// Type-erased, cheaply clonable value
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: Arc<str>,
}

impl Value {
    /// Box a value, remembering its runtime type
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: short_type_name(std::any::type_name::<T>()).into(),
        }
    }

    /// Runtime type of the boxed value
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Short runtime type name (e.g. `Vec<String>`)
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// True when both handles point at the same allocation
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type_name", &self.type_name)
            .finish()
    }
}

// ============================================================================
// Type Descriptor
// ============================================================================

/// Runtime description of a requested or declared type
#[derive(Clone)]
pub struct TypeDescriptor {
    id: TypeId,
    name: Arc<str>,
    nullable: bool,
    accepts_any: bool,
    assignable: Vec<TypeId>,
    default: DefaultFactory,
}

impl TypeDescriptor {
    /// A non-nullable value type; its default is `T::default()`
    pub fn value<T: Any + Send + Sync + Default>() -> Self {
        Self::build::<T>(false, || Some(Value::new(T::default())))
    }

    /// A nullable reference-like type; its default is `None`
    pub fn reference<T: Any + Send + Sync>() -> Self {
        Self::build::<T>(true, || None)
    }

    /// `Option<T>`: a nullable wrapper accepting values of `T`
    pub fn nullable<T: Any + Send + Sync>() -> Self {
        let mut descriptor = Self::build::<T>(true, || None);
        descriptor.name = format!("Option<{}>", descriptor.name).into();
        descriptor
    }

    /// The universal type: nullable and assignable from every value
    pub fn object() -> Self {
        Self {
            id: TypeId::of::<dyn Any + Send + Sync>(),
            name: "Object".into(),
            nullable: true,
            accepts_any: true,
            assignable: Vec::new(),
            default: || None,
        }
    }

    fn build<T: Any>(nullable: bool, default: DefaultFactory) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()).into(),
            nullable,
            accepts_any: false,
            assignable: Vec::new(),
            default,
        }
    }

    /// Also accept values of `U` (interface or base-type style assignment)
    pub fn assignable_from<U: Any>(mut self) -> Self {
        self.assignable.push(TypeId::of::<U>());
        self
    }

    /// Override the display name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into().into();
        self
    }

    /// Make this descriptor nullable, keeping its name unless it was a value type
    pub fn into_nullable(mut self) -> Self {
        if !self.nullable {
            self.name = format!("Option<{}>", self.name).into();
            self.nullable = true;
            self.default = || None;
        }
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `None` is an acceptable value
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether a value of runtime type `type_id` may be stored under this type
    pub fn is_assignable_from(&self, type_id: TypeId) -> bool {
        self.accepts_any || self.id == type_id || self.assignable.contains(&type_id)
    }

    /// Whether `value` is an instance of this type
    pub fn is_instance(&self, value: &Value) -> bool {
        self.is_assignable_from(value.type_id())
    }

    /// Default value: `T::default()` for value types, `None` otherwise
    pub fn default_value(&self) -> Option<Value> {
        (self.default)()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.nullable == other.nullable && self.name == other.name
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("nullable", &self.nullable)
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// Typed
// ============================================================================

/// Rust types that can cross the type-erased formatter boundary
pub trait Typed: Sized + Send + Sync + 'static {
    /// Descriptor used for negotiation
    fn type_descriptor() -> TypeDescriptor;

    /// Convert into an optional boxed value
    fn into_value(self) -> Option<Value>;

    /// Convert back from an optional boxed value
    fn from_value(value: Option<Value>) -> FormattingResult<Self>;
}

/// Clone the `T` out of `value`, or report an `InvalidCast` against `expected`
pub fn downcast_clone<T: Any + Clone>(value: Option<Value>, expected: &TypeDescriptor) -> FormattingResult<T> {
    let cast_error = |actual: &str| FormattingError::InvalidCast {
        expected: expected.name().to_string(),
        actual: actual.to_string(),
    };
    match value {
        Some(value) => value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| cast_error(value.type_name())),
        None => Err(cast_error("null")),
    }
}

/// Implement [`Typed`] for `Clone` types.
///
/// `value:` types are non-nullable and default to `T::default()`;
/// `reference:` types are nullable and default to `None`.
///
/// ```ignore
/// ouroboros_formatting::impl_typed!(reference: Widget, Order);
/// ```
#[macro_export]
macro_rules! impl_typed {
    ($ctor:ident: $($ty:ty),* $(,)?) => {
        $(
            impl $crate::types::Typed for $ty {
                fn type_descriptor() -> $crate::types::TypeDescriptor {
                    $crate::types::TypeDescriptor::$ctor::<$ty>()
                }

                fn into_value(self) -> ::std::option::Option<$crate::types::Value> {
                    ::std::option::Option::Some($crate::types::Value::new(self))
                }

                fn from_value(
                    value: ::std::option::Option<$crate::types::Value>,
                ) -> $crate::error::FormattingResult<Self> {
                    $crate::types::downcast_clone(
                        value,
                        &<Self as $crate::types::Typed>::type_descriptor(),
                    )
                }
            }
        )*
    };
}

impl_typed!(value: bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
impl_typed!(reference: String, bytes::Bytes);

impl<T: Clone + Send + Sync + 'static> Typed for Vec<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::reference::<Vec<T>>()
    }

    fn into_value(self) -> Option<Value> {
        Some(Value::new(self))
    }

    fn from_value(value: Option<Value>) -> FormattingResult<Self> {
        downcast_clone(value, &Self::type_descriptor())
    }
}

impl<T: Typed> Typed for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        T::type_descriptor().into_nullable()
    }

    fn into_value(self) -> Option<Value> {
        self.and_then(T::into_value)
    }

    fn from_value(value: Option<Value>) -> FormattingResult<Self> {
        match value {
            None => Ok(None),
            some => T::from_value(some).map(Some),
        }
    }
}

/// Strip module paths from a `std::any::type_name` string
pub(crate) fn short_type_name(full: &str) -> String {
    let mut short = String::with_capacity(full.len());
    let mut path = String::new();

    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            path.push(c);
        } else {
            short.push_str(path.rsplit("::").next().unwrap_or_default());
            path.clear();
            short.push(c);
        }
    }
    short.push_str(path.rsplit("::").next().unwrap_or_default());
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Widget {
        id: u32,
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("i32"), "i32");
        assert_eq!(
            short_type_name("alloc::vec::Vec<alloc::string::String>"),
            "Vec<String>"
        );
        assert_eq!(
            short_type_name("std::collections::hash::map::HashMap<alloc::string::String, i32>"),
            "HashMap<String, i32>"
        );
    }

    #[test]
    fn test_value_type_default() {
        let descriptor = TypeDescriptor::value::<i32>();
        assert!(!descriptor.is_nullable());
        let default = descriptor.default_value().unwrap();
        assert_eq!(default.downcast_ref::<i32>(), Some(&0));
    }

    #[test]
    fn test_reference_and_nullable_defaults() {
        assert!(TypeDescriptor::reference::<String>().default_value().is_none());
        let nullable = TypeDescriptor::nullable::<i32>();
        assert!(nullable.is_nullable());
        assert_eq!(nullable.name(), "Option<i32>");
        assert!(nullable.default_value().is_none());
        assert!(nullable.is_instance(&Value::new(5i32)));
    }

    #[test]
    fn test_assignability() {
        let list = TypeDescriptor::reference::<Vec<String>>()
            .named("IList<String>")
            .assignable_from::<std::collections::VecDeque<String>>();

        assert!(list.is_instance(&Value::new(Vec::<String>::new())));
        assert!(list.is_instance(&Value::new(std::collections::VecDeque::<String>::new())));
        assert!(!list.is_instance(&Value::new(HashMap::<String, String>::new())));
        assert!(TypeDescriptor::object().is_instance(&Value::new(Widget::default())));
    }

    #[test]
    fn test_typed_round_trip_through_value() {
        let value = Widget { id: 7 };
        let boxed = Value::new(value.clone());
        assert_eq!(boxed.type_name(), "Widget");
        assert_eq!(boxed.downcast_ref::<Widget>(), Some(&value));

        assert_eq!(i32::from_value(42i32.into_value()).unwrap(), 42);
        assert_eq!(Option::<i32>::from_value(None).unwrap(), None);
        assert_eq!(Option::<String>::type_descriptor().name(), "String");
        assert_eq!(Option::<u8>::type_descriptor().name(), "Option<u8>");
    }

    #[test]
    fn test_typed_cast_failures() {
        let err = i32::from_value(None).unwrap_err();
        assert_eq!(err.to_string(), "Unable to cast object of type 'null' to type 'i32'.");

        let err = String::from_value(Some(Value::new(1u8))).unwrap_err();
        assert!(matches!(err, FormattingError::InvalidCast { .. }));
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Meters(f64);

    #[derive(Debug, Clone, PartialEq)]
    struct Label(String);

    impl_typed!(value: Meters);
    impl_typed!(reference: Label);

    #[test]
    fn test_impl_typed_for_downstream_types() {
        let meters = Meters::type_descriptor();
        assert_eq!(meters.name(), "Meters");
        assert!(!meters.is_nullable());
        assert_eq!(
            meters.default_value().unwrap().downcast_ref::<Meters>(),
            Some(&Meters(0.0))
        );
        assert_eq!(Meters::from_value(Meters(2.5).into_value()).unwrap(), Meters(2.5));

        let label = Label::type_descriptor();
        assert!(label.is_nullable());
        assert!(label.default_value().is_none());
        assert_eq!(
            Option::<Label>::from_value(Label("a".to_string()).into_value()).unwrap(),
            Some(Label("a".to_string()))
        );

        let err = Label::from_value(Some(Value::new(Meters(1.0)))).unwrap_err();
        assert_eq!(err.to_string(), "Unable to cast object of type 'Meters' to type 'Label'.");
    }
}
