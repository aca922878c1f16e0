//! Record descriptors and safe field access.
//!
//! A record type describes its fields once through [`Record::describe`]; the
//! resulting [`RecordDescriptor`] is registered per concrete type (generic
//! instantiations included) and lives for the rest of the process. Field
//! values are reached through [`RecordFields`] by field index, so a resolved
//! field path is just a sequence of indices.

use crate::value::ColumnValue;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// How a field's column name is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnTag {
    /// Use the field name (or no prefix, for embedded records)
    Default,
    /// Explicit column name (or prefix, for embedded records)
    Named(&'static str),
    /// Never matched to any column
    Excluded,
}

/// What a field holds.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A single column value
    Leaf,
    /// A record embedded by value; its fields are flattened into the parent
    Embedded(fn() -> &'static RecordDescriptor),
    /// A record behind a pointer; never descended
    Indirect,
}

/// One field of a record, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub tag: ColumnTag,
    pub exported: bool,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// An exported leaf field whose column name is its field name.
    pub const fn leaf(name: &'static str) -> Self {
        Self {
            name,
            tag: ColumnTag::Default,
            exported: true,
            kind: FieldKind::Leaf,
        }
    }

    /// A record of type `T` embedded by value, without a prefix.
    pub fn embedded<T: Record>(name: &'static str) -> Self {
        Self {
            name,
            tag: ColumnTag::Default,
            exported: true,
            kind: FieldKind::Embedded(<T as Record>::descriptor),
        }
    }

    /// A record embedded behind a pointer (`Box`, `Arc`, `Option`, ...).
    pub const fn indirect(name: &'static str) -> Self {
        Self {
            name,
            tag: ColumnTag::Default,
            exported: true,
            kind: FieldKind::Indirect,
        }
    }

    /// Override the column name.
    pub const fn column(mut self, column: &'static str) -> Self {
        self.tag = ColumnTag::Named(column);
        self
    }

    /// Prefix the embedded record's columns with `prefix_`.
    pub const fn prefix(self, prefix: &'static str) -> Self {
        self.column(prefix)
    }

    /// Exclude the field from column matching.
    pub const fn excluded(mut self) -> Self {
        self.tag = ColumnTag::Excluded;
        self
    }

    /// Mark the field as not externally visible.
    pub const fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    /// The column name a leaf answers to, `None` when excluded.
    pub fn column_name(&self) -> Option<&'static str> {
        match self.tag {
            ColumnTag::Default => Some(self.name),
            ColumnTag::Named(name) => Some(name),
            ColumnTag::Excluded => None,
        }
    }
}

/// Ordered field list of a record type.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    pub fn new(type_name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self { type_name, fields }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

/// Mutable access to one field of a record.
pub enum FieldMut<'a> {
    Leaf(&'a mut dyn ColumnValue),
    Embedded(&'a mut dyn RecordFields),
}

/// Shared access to one field of a record.
pub enum FieldRef<'a> {
    Leaf(&'a dyn ColumnValue),
    Embedded(&'a dyn RecordFields),
}

/// Index-addressed field access.
///
/// Indices follow the order of [`RecordDescriptor::fields`]. Indirect fields
/// return `None`.
pub trait RecordFields {
    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;

    fn field_ref(&self, index: usize) -> Option<FieldRef<'_>>;
}

/// A record type rows can be materialized into.
///
/// Usually derived:
///
/// ```rust
/// use rowmap::Record;
///
/// #[derive(Debug, Default, Record)]
/// pub struct Address {
///     pub street: String,
///     pub city: String,
/// }
///
/// #[derive(Debug, Default, Record)]
/// pub struct Person {
///     pub id: i64,
///     #[column_name = "full_name"]
///     pub name: String,
///     #[embedded = "addr"]
///     pub address: Address,
/// }
///
/// let fields = Person::descriptor().fields();
/// assert_eq!(fields[1].column_name(), Some("full_name"));
/// ```
pub trait Record: RecordFields + Default + 'static {
    /// Build the descriptor. Called at most once per type by [`Record::descriptor`].
    fn describe() -> RecordDescriptor;

    /// The registered descriptor for this type.
    fn descriptor() -> &'static RecordDescriptor {
        descriptor_of::<Self>()
    }
}

static REGISTRY: Lazy<RwLock<HashMap<TypeId, &'static RecordDescriptor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn descriptor_of<T: Record>() -> &'static RecordDescriptor {
    let id = TypeId::of::<T>();
    let cached = REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied();
    if let Some(descriptor) = cached {
        return descriptor;
    }

    let built = T::describe();
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    *registry
        .entry(id)
        .or_insert_with(|| Box::leak(Box::new(built)))
}

/// Walk `path` from `record` down to a leaf destination.
pub(crate) fn leaf_mut<'a>(
    mut record: &'a mut dyn RecordFields,
    path: &[usize],
) -> Option<&'a mut dyn ColumnValue> {
    let (last, parents) = path.split_last()?;
    for &index in parents {
        record = match record.field_mut(index)? {
            FieldMut::Embedded(inner) => inner,
            FieldMut::Leaf(_) => return None,
        };
    }
    match record.field_mut(*last)? {
        FieldMut::Leaf(value) => Some(value),
        FieldMut::Embedded(_) => None,
    }
}

/// Shared counterpart of [`leaf_mut`].
pub(crate) fn leaf_ref<'a>(
    mut record: &'a dyn RecordFields,
    path: &[usize],
) -> Option<&'a dyn ColumnValue> {
    let (last, parents) = path.split_last()?;
    for &index in parents {
        record = match record.field_ref(index)? {
            FieldRef::Embedded(inner) => inner,
            FieldRef::Leaf(_) => return None,
        };
    }
    match record.field_ref(*last)? {
        FieldRef::Leaf(value) => Some(value),
        FieldRef::Embedded(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ColumnValue;
    use sea_query::Value;

    #[derive(Default)]
    struct Inner {
        code: String,
    }

    impl RecordFields for Inner {
        fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>> {
            match index {
                0 => Some(FieldMut::Leaf(&mut self.code)),
                _ => None,
            }
        }

        fn field_ref(&self, index: usize) -> Option<FieldRef<'_>> {
            match index {
                0 => Some(FieldRef::Leaf(&self.code)),
                _ => None,
            }
        }
    }

    impl Record for Inner {
        fn describe() -> RecordDescriptor {
            RecordDescriptor::new("Inner", vec![FieldDescriptor::leaf("code")])
        }
    }

    #[derive(Default)]
    struct Outer {
        id: i64,
        inner: Inner,
    }

    impl RecordFields for Outer {
        fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>> {
            match index {
                0 => Some(FieldMut::Leaf(&mut self.id)),
                1 => Some(FieldMut::Embedded(&mut self.inner)),
                _ => None,
            }
        }

        fn field_ref(&self, index: usize) -> Option<FieldRef<'_>> {
            match index {
                0 => Some(FieldRef::Leaf(&self.id)),
                1 => Some(FieldRef::Embedded(&self.inner)),
                _ => None,
            }
        }
    }

    impl Record for Outer {
        fn describe() -> RecordDescriptor {
            RecordDescriptor::new(
                "Outer",
                vec![
                    FieldDescriptor::leaf("id"),
                    FieldDescriptor::embedded::<Inner>("inner").prefix("in"),
                ],
            )
        }
    }

    #[test]
    fn test_descriptor_is_registered_once() {
        let first = Outer::descriptor();
        let second = Outer::descriptor();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.type_name(), "Outer");
    }

    #[test]
    fn test_combinators() {
        let field = FieldDescriptor::leaf("name").column("full_name").private();
        assert_eq!(field.column_name(), Some("full_name"));
        assert!(!field.exported);

        let field = FieldDescriptor::leaf("secret").excluded();
        assert_eq!(field.column_name(), None);

        let field = FieldDescriptor::embedded::<Inner>("inner").prefix("in");
        assert_eq!(field.tag, ColumnTag::Named("in"));
        match field.kind {
            FieldKind::Embedded(get) => assert_eq!(get().fields().len(), 1),
            _ => panic!("expected embedded kind"),
        }
    }

    #[test]
    fn test_leaf_paths() {
        let mut outer = Outer::default();
        leaf_mut(&mut outer, &[1, 0])
            .unwrap()
            .scan_value(Value::String(Some("X1".into())))
            .unwrap();
        assert_eq!(outer.inner.code, "X1");

        let value = leaf_ref(&outer, &[1, 0]).unwrap().to_value();
        assert_eq!(value, Value::String(Some("X1".into())));

        assert!(leaf_mut(&mut outer, &[1]).is_none());
        assert!(leaf_mut(&mut outer, &[0, 0]).is_none());
        assert!(leaf_mut(&mut outer, &[]).is_none());
        assert!(leaf_ref(&outer, &[7]).is_none());
    }
}
