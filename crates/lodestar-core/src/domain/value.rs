//! Dynamic values, entities and facts.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A value in a dynamic solution.
#[derive(Debug, Clone)]
pub enum Value {
    /// No value assigned (uninitialized planning variable).
    None,
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    Str(Arc<str>),
    /// Boolean value.
    Bool(bool),
    /// Reference to an entity: (class_idx, entity_idx).
    Ref(usize, usize),
    /// Reference to a fact: (class_idx, fact_idx).
    FactRef(usize, usize),
    /// Ordered list of values (list planning variable).
    List(Vec<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            // Bitwise, to stay consistent with Hash.
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Ref(c1, e1), Value::Ref(c2, e2)) => c1 == c2 && e1 == e2,
            (Value::FactRef(c1, f1), Value::FactRef(c2, f2)) => c1 == c2 && f1 == f2,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order across all variants (discriminant first, then payload).
/// Needed for ordered joiner indexes and deterministic analysis output.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        fn rank(v: &Value) -> u8 {
            match v {
                Value::None => 0,
                Value::Int(_) => 1,
                Value::Float(_) => 2,
                Value::Str(_) => 3,
                Value::Bool(_) => 4,
                Value::Ref(..) => 5,
                Value::FactRef(..) => 6,
                Value::List(_) => 7,
            }
        }
        match (self, other) {
            (Value::None, Value::None) => Ordering::Equal,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Ref(c1, e1), Value::Ref(c2, e2)) => (c1, e1).cmp(&(c2, e2)),
            (Value::FactRef(c1, f1), Value::FactRef(c2, f2)) => (c1, f1).cmp(&(c2, f2)),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::None => {}
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Str(v) => v.hash(state),
            Value::Bool(v) => v.hash(state),
            Value::Ref(c, e) => {
                c.hash(state);
                e.hash(state);
            }
            Value::FactRef(c, f) => {
                c.hash(state);
                f.hash(state);
            }
            Value::List(v) => v.hash(state),
        }
    }
}

impl Value {
    /// Returns true if this value is None.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns true if this value is assigned (not None).
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Attempts to extract an i64 value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to extract an f64 value.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Attempts to extract a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to extract a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract an entity reference.
    pub fn as_entity_ref(&self) -> Option<(usize, usize)> {
        match self {
            Value::Ref(class_idx, entity_idx) => Some((*class_idx, *entity_idx)),
            _ => None,
        }
    }

    /// Attempts to extract a fact reference.
    pub fn as_fact_ref(&self) -> Option<(usize, usize)> {
        match self {
            Value::FactRef(class_idx, fact_idx) => Some((*class_idx, *fact_idx)),
            _ => None,
        }
    }

    /// Attempts to extract a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to extract a mutable list.
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.into())
    }
}

/// A planning entity with runtime-defined fields.
///
/// Identity is the stable `id`, unique within its class collection.
/// Entities are created at problem-load time and mutated only through the
/// solver's move application.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Unique identifier within the entity's class.
    pub id: i64,
    /// Field values in order matching the class definition.
    pub fields: Vec<Value>,
}

impl Entity {
    /// Creates a new entity with the given ID and fields.
    pub fn new(id: i64, fields: Vec<Value>) -> Self {
        Self { id, fields }
    }

    /// Gets a field value by index.
    pub fn get(&self, field_idx: usize) -> &Value {
        &self.fields[field_idx]
    }

    /// Sets a field value by index.
    pub fn set(&mut self, field_idx: usize, value: Value) {
        self.fields[field_idx] = value;
    }
}

/// An immutable problem fact with runtime-defined fields.
///
/// Facts have no lifecycle beyond load time and are never mutated during
/// solving.
#[derive(Debug, Clone)]
pub struct Fact {
    /// Unique identifier within the fact's class.
    pub id: i64,
    /// Field values in order matching the class definition.
    pub fields: Vec<Value>,
}

impl Fact {
    /// Creates a new fact with the given ID and fields.
    pub fn new(id: i64, fields: Vec<Value>) -> Self {
        Self { id, fields }
    }

    /// Gets a field value by index.
    pub fn get(&self, field_idx: usize) -> &Value {
        &self.fields[field_idx]
    }
}
