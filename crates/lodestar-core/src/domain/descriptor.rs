//! Schema definition types: fields, classes, shadow kinds, value ranges.

use std::fmt;
use std::sync::Arc;

use super::value::{Entity, Value};

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    I64,
    F64,
    Str,
    Bool,
    Ref,
    List,
}

/// A pure update function for cascading shadow variables.
///
/// Arguments: the element entity and the previous element's value of the
/// *same* shadow field (or `None` at the head of the list / for non-list
/// entities). Must not read anything else.
pub type CascadeFn = Arc<dyn Fn(&Entity, Option<&Value>) -> Value + Send + Sync>;

/// Kind of a shadow (computed, never directly assigned) variable.
#[derive(Clone)]
pub enum ShadowKind {
    /// The entity whose list variable currently contains this element.
    InverseRelation {
        source_class: Arc<str>,
        source_variable: Arc<str>,
    },
    /// The list neighbor at index - 1.
    PreviousElement {
        source_class: Arc<str>,
        source_variable: Arc<str>,
    },
    /// The list neighbor at index + 1.
    NextElement {
        source_class: Arc<str>,
        source_variable: Arc<str>,
    },
    /// Current position in the owning list.
    Index {
        source_class: Arc<str>,
        source_variable: Arc<str>,
    },
    /// User-supplied pure function of this element's other fields and the
    /// previous element's corresponding shadow. Propagated strictly in list
    /// order with early stop once a recomputed value is unchanged.
    Cascading {
        source_fields: Vec<Arc<str>>,
        update: CascadeFn,
    },
    /// Recomputed in the same pass as another cascading shadow.
    Piggyback { anchor: Arc<str>, update: CascadeFn },
}

impl fmt::Debug for ShadowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowKind::InverseRelation { source_class, source_variable } => f
                .debug_struct("InverseRelation")
                .field("source_class", source_class)
                .field("source_variable", source_variable)
                .finish(),
            ShadowKind::PreviousElement { source_class, source_variable } => f
                .debug_struct("PreviousElement")
                .field("source_class", source_class)
                .field("source_variable", source_variable)
                .finish(),
            ShadowKind::NextElement { source_class, source_variable } => f
                .debug_struct("NextElement")
                .field("source_class", source_class)
                .field("source_variable", source_variable)
                .finish(),
            ShadowKind::Index { source_class, source_variable } => f
                .debug_struct("Index")
                .field("source_class", source_class)
                .field("source_variable", source_variable)
                .finish(),
            ShadowKind::Cascading { source_fields, .. } => f
                .debug_struct("Cascading")
                .field("source_fields", source_fields)
                .finish_non_exhaustive(),
            ShadowKind::Piggyback { anchor, .. } => f
                .debug_struct("Piggyback")
                .field("anchor", anchor)
                .finish_non_exhaustive(),
        }
    }
}

/// Definition of one field on an entity or fact class.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Arc<str>,
    pub field_type: FieldType,
    /// Name of the registered value range; `Some` marks a genuine variable.
    pub value_range: Option<Arc<str>>,
    /// `Some` marks a shadow variable.
    pub shadow: Option<ShadowKind>,
}

impl FieldDef {
    /// A plain (problem-fact) field.
    pub fn new(name: impl Into<Arc<str>>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            value_range: None,
            shadow: None,
        }
    }

    /// A genuine planning variable backed by a named value range.
    pub fn variable(
        name: impl Into<Arc<str>>,
        field_type: FieldType,
        value_range: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            value_range: Some(value_range.into()),
            shadow: None,
        }
    }

    /// A genuine list planning variable whose elements come from a named
    /// entity-class value range.
    pub fn list_variable(name: impl Into<Arc<str>>, value_range: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::List,
            value_range: Some(value_range.into()),
            shadow: None,
        }
    }

    /// A shadow variable of the given kind.
    pub fn shadow(name: impl Into<Arc<str>>, field_type: FieldType, kind: ShadowKind) -> Self {
        Self {
            name: name.into(),
            field_type,
            value_range: None,
            shadow: Some(kind),
        }
    }

    /// Returns true if this field is a genuine planning variable.
    pub fn is_genuine_variable(&self) -> bool {
        self.value_range.is_some()
    }

    /// Returns true if this field is a genuine list planning variable.
    pub fn is_list_variable(&self) -> bool {
        self.is_genuine_variable() && self.field_type == FieldType::List
    }

    /// Returns true if this field is a shadow variable.
    pub fn is_shadow_variable(&self) -> bool {
        self.shadow.is_some()
    }
}

/// Definition of a planning-entity class.
#[derive(Debug, Clone)]
pub struct EntityClassDef {
    pub name: Arc<str>,
    pub fields: Vec<FieldDef>,
    /// Indices of genuine planning variables, precomputed.
    pub genuine_variable_indices: Vec<usize>,
    /// Indices of shadow variables, precomputed.
    pub shadow_variable_indices: Vec<usize>,
}

impl EntityClassDef {
    pub fn new(name: impl Into<Arc<str>>, fields: Vec<FieldDef>) -> Self {
        let genuine_variable_indices = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_genuine_variable())
            .map(|(i, _)| i)
            .collect();
        let shadow_variable_indices = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_shadow_variable())
            .map(|(i, _)| i)
            .collect();
        Self {
            name: name.into(),
            fields,
            genuine_variable_indices,
            shadow_variable_indices,
        }
    }

    /// Looks up a field index by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name.as_ref() == name)
    }
}

/// Definition of a problem-fact class.
#[derive(Debug, Clone)]
pub struct FactClassDef {
    pub name: Arc<str>,
    pub fields: Vec<FieldDef>,
}

impl FactClassDef {
    pub fn new(name: impl Into<Arc<str>>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Looks up a field index by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name.as_ref() == name)
    }
}

/// Declared candidate source of a genuine variable, registered under a name
/// and resolved to concrete class indices once at `freeze()` time.
#[derive(Debug, Clone)]
pub enum ValueRangeDef {
    /// Integer interval `[min, max)`.
    IntRange { min: i64, max: i64 },
    /// Every fact of the named class, as `Value::FactRef`.
    FactClass(Arc<str>),
    /// Every entity of the named class, as `Value::Ref`.
    EntityClass(Arc<str>),
}
