//! The planning solution: facts, entities and a score.

use std::sync::Arc;

use crate::score::Score;

use super::registry::DomainRegistry;
use super::value::{Entity, Fact, Value};
use super::descriptor::ShadowKind;

/// Aggregates all problem facts, all planning entities and a score.
///
/// One `Solution` instance exists per active solve; it is cloned whenever an
/// improving score is found (best-so-far tracking). The schema lives in the
/// shared frozen [`DomainRegistry`].
#[derive(Debug, Clone)]
pub struct Solution<Sc: Score> {
    registry: Arc<DomainRegistry>,
    /// Entities organized by class index: `entities[class_idx][entity_idx]`.
    pub entities: Vec<Vec<Entity>>,
    /// Facts organized by class index: `facts[class_idx][fact_idx]`.
    pub facts: Vec<Vec<Fact>>,
    /// Current score if calculated.
    pub score: Option<Sc>,
}

impl<Sc: Score> Solution<Sc> {
    /// Creates an empty solution for the given frozen registry.
    pub fn new(registry: Arc<DomainRegistry>) -> Self {
        let entity_count = registry.entity_classes().len();
        let fact_count = registry.fact_classes().len();
        Self {
            registry,
            entities: vec![Vec::new(); entity_count],
            facts: vec![Vec::new(); fact_count],
            score: Option::None,
        }
    }

    /// Returns the shared domain registry.
    pub fn registry(&self) -> &Arc<DomainRegistry> {
        &self.registry
    }

    /// Adds an entity to the given class, padding missing fields with None.
    pub fn add_entity(&mut self, class_idx: usize, mut entity: Entity) -> usize {
        let field_count = self.registry.entity_classes()[class_idx].fields.len();
        entity.fields.resize(field_count, Value::None);
        self.entities[class_idx].push(entity);
        self.entities[class_idx].len() - 1
    }

    /// Adds a fact to the given class.
    pub fn add_fact(&mut self, class_idx: usize, fact: Fact) -> usize {
        self.facts[class_idx].push(fact);
        self.facts[class_idx].len() - 1
    }

    /// Gets an entity by class index and entity index.
    pub fn entity(&self, class_idx: usize, entity_idx: usize) -> &Entity {
        &self.entities[class_idx][entity_idx]
    }

    /// Gets a mutable entity by class index and entity index.
    pub fn entity_mut(&mut self, class_idx: usize, entity_idx: usize) -> &mut Entity {
        &mut self.entities[class_idx][entity_idx]
    }

    /// Gets a fact by class index and fact index.
    pub fn fact(&self, class_idx: usize, fact_idx: usize) -> &Fact {
        &self.facts[class_idx][fact_idx]
    }

    /// Reads a field value, following one level of entity/fact reference.
    pub fn deref_field(&self, value: &Value, field_idx: usize) -> Option<Value> {
        match value {
            Value::Ref(c, e) => Some(self.entities[*c][*e].fields[field_idx].clone()),
            Value::FactRef(c, f) => Some(self.facts[*c][*f].fields[field_idx].clone()),
            _ => Option::None,
        }
    }

    /// Returns true when every genuine variable holds a value, including
    /// list-variable membership of elements.
    ///
    /// An element's membership is tracked through its inverse-relation
    /// shadow: unassigned elements have a None inverse.
    pub fn is_initialized(&self) -> bool {
        for (class_idx, class) in self.registry.entity_classes().iter().enumerate() {
            for entity in &self.entities[class_idx] {
                for &var_idx in &class.genuine_variable_indices {
                    if class.fields[var_idx].is_list_variable() {
                        continue;
                    }
                    if entity.fields[var_idx].is_none() {
                        return false;
                    }
                }
                for &shadow_idx in &class.shadow_variable_indices {
                    if matches!(
                        class.fields[shadow_idx].shadow,
                        Some(ShadowKind::InverseRelation { .. })
                    ) && entity.fields[shadow_idx].is_none()
                    {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Number of unassigned genuine variables (list membership included).
    pub fn unassigned_count(&self) -> usize {
        let mut count = 0;
        for (class_idx, class) in self.registry.entity_classes().iter().enumerate() {
            for entity in &self.entities[class_idx] {
                for &var_idx in &class.genuine_variable_indices {
                    if !class.fields[var_idx].is_list_variable() && entity.fields[var_idx].is_none()
                    {
                        count += 1;
                    }
                }
                for &shadow_idx in &class.shadow_variable_indices {
                    if matches!(
                        class.fields[shadow_idx].shadow,
                        Some(ShadowKind::InverseRelation { .. })
                    ) && entity.fields[shadow_idx].is_none()
                    {
                        count += 1;
                    }
                }
            }
        }
        count
    }
}
