//! The domain descriptor registry.
//!
//! Holds, per entity type, the genuine/shadow variable descriptors and the
//! value range backing each genuine variable. All validation happens at
//! `freeze()`, before any solve starts: duplicate types, missing value
//! ranges and cyclic shadow dependencies are registration errors, never
//! evaluation-time surprises.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, SolverError};
use crate::score::Score;

use super::descriptor::{
    CascadeFn, EntityClassDef, FactClassDef, FieldType, ShadowKind, ValueRangeDef,
};
use super::solution::Solution;
use super::value::Value;

/// A value range with class names resolved to indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedValueRange {
    /// Integer interval `[min, max)`.
    IntRange { min: i64, max: i64 },
    /// All facts of the class index.
    FactClass(usize),
    /// All entities of the class index.
    EntityClass(usize),
}

/// One cascading shadow with its piggybacked companions, in execution order.
#[derive(Clone)]
pub struct CascadePlan {
    pub field: usize,
    pub update: CascadeFn,
    pub piggybacks: Vec<(usize, CascadeFn)>,
}

impl std::fmt::Debug for CascadePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadePlan")
            .field("field", &self.field)
            .field("piggybacks", &self.piggybacks.len())
            .finish()
    }
}

/// Precomputed propagation plan for one list variable.
///
/// Built at `freeze()` by wiring the owner class's list field to the shadow
/// fields declared on the element class.
#[derive(Debug)]
pub struct ListShadowPlan {
    pub owner_class: usize,
    pub owner_field: usize,
    pub element_class: usize,
    pub inverse_field: Option<usize>,
    pub index_field: Option<usize>,
    pub previous_field: Option<usize>,
    pub next_field: Option<usize>,
    /// Cascading shadows on the element class, dependency order.
    pub cascades: Vec<CascadePlan>,
}

/// Cascading shadows triggered by basic-variable changes on a class.
#[derive(Debug, Default)]
pub struct ClassShadowPlan {
    pub cascades: Vec<CascadePlan>,
}

/// Registry of entity classes, fact classes and value ranges.
///
/// Mutable while being populated; [`DomainRegistry::freeze`] validates the
/// whole schema and returns an immutable `Arc` shared by the solve session.
#[derive(Debug, Default)]
pub struct DomainRegistry {
    entity_classes: Vec<EntityClassDef>,
    fact_classes: Vec<FactClassDef>,
    value_ranges: Vec<(Arc<str>, ValueRangeDef)>,
    /// Per entity class, per field: resolved range for genuine variables.
    resolved_ranges: Vec<Vec<Option<ResolvedValueRange>>>,
    list_plans: Vec<ListShadowPlan>,
    class_plans: Vec<ClassShadowPlan>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity class.
    ///
    /// Fails with [`SolverError::DuplicateType`] if a class with the same
    /// name (entity or fact) is already registered.
    pub fn register_entity(&mut self, def: EntityClassDef) -> Result<usize> {
        self.check_unique_name(&def.name)?;
        self.entity_classes.push(def);
        Ok(self.entity_classes.len() - 1)
    }

    /// Registers a fact class.
    pub fn register_fact(&mut self, def: FactClassDef) -> Result<usize> {
        self.check_unique_name(&def.name)?;
        self.fact_classes.push(def);
        Ok(self.fact_classes.len() - 1)
    }

    /// Registers a named value range.
    pub fn register_value_range(
        &mut self,
        name: impl Into<Arc<str>>,
        def: ValueRangeDef,
    ) -> Result<()> {
        let name = name.into();
        if self.value_ranges.iter().any(|(n, _)| *n == name) {
            return Err(SolverError::DuplicateType(name.to_string()));
        }
        self.value_ranges.push((name, def));
        Ok(())
    }

    fn check_unique_name(&self, name: &Arc<str>) -> Result<()> {
        let taken = self.entity_classes.iter().any(|c| c.name == *name)
            || self.fact_classes.iter().any(|c| c.name == *name);
        if taken {
            return Err(SolverError::DuplicateType(name.to_string()));
        }
        Ok(())
    }

    /// Validates the schema and returns the immutable registry.
    ///
    /// Checks, in order:
    /// 1. every genuine variable names a registered value range, with class
    ///    names resolvable (`MissingValueRange`);
    /// 2. list variables are backed by entity-class ranges;
    /// 3. the shadow dependency graph of each class is acyclic
    ///    (`CyclicShadowDependency`), producing the propagation order;
    /// 4. list-element shadows reference an existing owner list variable.
    pub fn freeze(mut self) -> Result<Arc<DomainRegistry>> {
        self.resolve_ranges()?;
        self.build_shadow_plans()?;
        Ok(Arc::new(self))
    }

    fn resolve_ranges(&mut self) -> Result<()> {
        let mut resolved_per_class = Vec::with_capacity(self.entity_classes.len());
        for class in &self.entity_classes {
            let mut per_field = Vec::with_capacity(class.fields.len());
            for field in &class.fields {
                let resolved = match &field.value_range {
                    Option::None => Option::None,
                    Some(range_name) => {
                        let def = self
                            .value_ranges
                            .iter()
                            .find(|(n, _)| n == range_name)
                            .map(|(_, d)| d)
                            .ok_or_else(|| SolverError::MissingValueRange {
                                class: class.name.to_string(),
                                variable: field.name.to_string(),
                                range: range_name.to_string(),
                            })?;
                        let resolved = match def {
                            ValueRangeDef::IntRange { min, max } => {
                                ResolvedValueRange::IntRange { min: *min, max: *max }
                            }
                            ValueRangeDef::FactClass(name) => {
                                let idx = self
                                    .fact_classes
                                    .iter()
                                    .position(|c| c.name == *name)
                                    .ok_or_else(|| SolverError::MissingValueRange {
                                        class: class.name.to_string(),
                                        variable: field.name.to_string(),
                                        range: range_name.to_string(),
                                    })?;
                                ResolvedValueRange::FactClass(idx)
                            }
                            ValueRangeDef::EntityClass(name) => {
                                let idx = self
                                    .entity_classes
                                    .iter()
                                    .position(|c| c.name == *name)
                                    .ok_or_else(|| SolverError::MissingValueRange {
                                        class: class.name.to_string(),
                                        variable: field.name.to_string(),
                                        range: range_name.to_string(),
                                    })?;
                                ResolvedValueRange::EntityClass(idx)
                            }
                        };
                        if field.field_type == FieldType::List
                            && !matches!(resolved, ResolvedValueRange::EntityClass(_))
                        {
                            return Err(SolverError::DomainModel(format!(
                                "list variable '{}.{}' must be backed by an entity-class value range",
                                class.name, field.name
                            )));
                        }
                        Some(resolved)
                    }
                };
                per_field.push(resolved);
            }
            resolved_per_class.push(per_field);
        }
        self.resolved_ranges = resolved_per_class;
        Ok(())
    }

    /// Topologically sorts each class's shadow fields and wires list plans.
    fn build_shadow_plans(&mut self) -> Result<()> {
        let mut class_plans: Vec<ClassShadowPlan> = Vec::new();
        let mut list_plans: Vec<ListShadowPlan> = Vec::new();

        // One plan per list variable, keyed by (owner_class, owner_field).
        for (owner_class, class) in self.entity_classes.iter().enumerate() {
            for &field_idx in &class.genuine_variable_indices {
                if !class.fields[field_idx].is_list_variable() {
                    continue;
                }
                let element_class = match self.resolved_ranges[owner_class][field_idx] {
                    Some(ResolvedValueRange::EntityClass(idx)) => idx,
                    _ => unreachable!("validated by resolve_ranges"),
                };
                list_plans.push(ListShadowPlan {
                    owner_class,
                    owner_field: field_idx,
                    element_class,
                    inverse_field: Option::None,
                    index_field: Option::None,
                    previous_field: Option::None,
                    next_field: Option::None,
                    cascades: Vec::new(),
                });
            }
        }

        for (class_idx, class) in self.entity_classes.iter().enumerate() {
            let order = self.shadow_topological_order(class_idx)?;
            let mut plan = ClassShadowPlan::default();

            for &field_idx in &order {
                let field = &class.fields[field_idx];
                let kind = field.shadow.as_ref().expect("order contains shadows only");
                match kind {
                    ShadowKind::InverseRelation { source_class, source_variable }
                    | ShadowKind::PreviousElement { source_class, source_variable }
                    | ShadowKind::NextElement { source_class, source_variable }
                    | ShadowKind::Index { source_class, source_variable } => {
                        let list_plan = list_plans
                            .iter_mut()
                            .find(|p| {
                                p.element_class == class_idx
                                    && self.entity_classes[p.owner_class].name == *source_class
                                    && self.entity_classes[p.owner_class].fields[p.owner_field]
                                        .name
                                        == *source_variable
                            })
                            .ok_or_else(|| {
                                SolverError::DomainModel(format!(
                                    "shadow '{}.{}' references unknown list variable '{}.{}'",
                                    class.name, field.name, source_class, source_variable
                                ))
                            })?;
                        let slot = match kind {
                            ShadowKind::InverseRelation { .. } => &mut list_plan.inverse_field,
                            ShadowKind::PreviousElement { .. } => &mut list_plan.previous_field,
                            ShadowKind::NextElement { .. } => &mut list_plan.next_field,
                            ShadowKind::Index { .. } => &mut list_plan.index_field,
                            _ => unreachable!(),
                        };
                        *slot = Some(field_idx);
                    }
                    ShadowKind::Cascading { update, .. } => {
                        let mut cascade = CascadePlan {
                            field: field_idx,
                            update: Arc::clone(update),
                            piggybacks: Vec::new(),
                        };
                        // Piggybacks ride in the same pass as their anchor.
                        for &other_idx in &class.shadow_variable_indices {
                            if let Some(ShadowKind::Piggyback { anchor, update }) =
                                class.fields[other_idx].shadow.as_ref()
                            {
                                if *anchor == field.name {
                                    cascade.piggybacks.push((other_idx, Arc::clone(update)));
                                }
                            }
                        }
                        plan.cascades.push(cascade);
                    }
                    ShadowKind::Piggyback { anchor, .. } => {
                        let anchored = class.shadow_variable_indices.iter().any(|&i| {
                            class.fields[i].name == *anchor
                                && matches!(
                                    class.fields[i].shadow,
                                    Some(ShadowKind::Cascading { .. })
                                )
                        });
                        if !anchored {
                            return Err(SolverError::DomainModel(format!(
                                "piggyback shadow '{}.{}' references unknown cascading anchor '{}'",
                                class.name, field.name, anchor
                            )));
                        }
                    }
                }
            }
            class_plans.push(plan);
        }

        // List-element cascades run inside the list walk instead.
        for list_plan in &mut list_plans {
            list_plan.cascades = class_plans[list_plan.element_class].cascades.clone();
        }
        for list_plan in &list_plans {
            class_plans[list_plan.element_class].cascades.clear();
        }

        self.class_plans = class_plans;
        self.list_plans = list_plans;
        Ok(())
    }

    /// Kahn's algorithm over a class's shadow fields.
    ///
    /// Edges: cascading source fields that are themselves shadows, and
    /// piggyback anchors. Rejects cycles rather than attempting runtime
    /// cycle detection.
    fn shadow_topological_order(&self, class_idx: usize) -> Result<Vec<usize>> {
        let class = &self.entity_classes[class_idx];
        let nodes = &class.shadow_variable_indices;

        for &node in nodes {
            if let Some(ShadowKind::Cascading { source_fields, .. }) =
                class.fields[node].shadow.as_ref()
            {
                for name in source_fields {
                    if class.field_index(name).is_none() {
                        return Err(SolverError::DomainModel(format!(
                            "cascading shadow '{}.{}' references unknown source field '{}'",
                            class.name, class.fields[node].name, name
                        )));
                    }
                }
            }
        }

        let depends_on = |field_idx: usize| -> Vec<usize> {
            match class.fields[field_idx].shadow.as_ref() {
                Some(ShadowKind::Cascading { source_fields, .. }) => source_fields
                    .iter()
                    .filter_map(|name| class.field_index(name))
                    .filter(|i| class.fields[*i].is_shadow_variable())
                    .collect(),
                Some(ShadowKind::Piggyback { anchor, .. }) => class
                    .field_index(anchor)
                    .into_iter()
                    .filter(|i| class.fields[*i].is_shadow_variable())
                    .collect(),
                _ => Vec::new(),
            }
        };

        let mut in_degree: HashMap<usize, usize> =
            nodes.iter().map(|&n| (n, depends_on(n).len())).collect();
        let mut ready: Vec<usize> = nodes
            .iter()
            .copied()
            .filter(|n| in_degree[n] == 0)
            .collect();
        let mut order = Vec::with_capacity(nodes.len());

        while let Some(node) = ready.pop() {
            order.push(node);
            for &other in nodes {
                if depends_on(other).contains(&node) {
                    let deg = in_degree.get_mut(&other).expect("node registered");
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(other);
                    }
                }
            }
        }

        if order.len() != nodes.len() {
            let stuck = nodes
                .iter()
                .find(|n| !order.contains(n))
                .expect("cycle leaves at least one node unordered");
            return Err(SolverError::CyclicShadowDependency {
                class: class.name.to_string(),
                variable: class.fields[*stuck].name.to_string(),
            });
        }
        Ok(order)
    }

    // --- frozen accessors ---

    pub fn entity_classes(&self) -> &[EntityClassDef] {
        &self.entity_classes
    }

    pub fn fact_classes(&self) -> &[FactClassDef] {
        &self.fact_classes
    }

    pub fn entity_class_index(&self, name: &str) -> Option<usize> {
        self.entity_classes.iter().position(|c| c.name.as_ref() == name)
    }

    pub fn fact_class_index(&self, name: &str) -> Option<usize> {
        self.fact_classes.iter().position(|c| c.name.as_ref() == name)
    }

    pub fn list_plans(&self) -> &[ListShadowPlan] {
        &self.list_plans
    }

    pub fn class_plan(&self, class_idx: usize) -> &ClassShadowPlan {
        &self.class_plans[class_idx]
    }

    /// Finds the propagation plan for a list variable, if any shadows exist.
    pub fn list_plan(&self, owner_class: usize, owner_field: usize) -> Option<&ListShadowPlan> {
        self.list_plans
            .iter()
            .find(|p| p.owner_class == owner_class && p.owner_field == owner_field)
    }

    /// Returns the resolved value range backing a genuine variable.
    pub fn variable_range(&self, class_idx: usize, field_idx: usize) -> Option<ResolvedValueRange> {
        self.resolved_ranges
            .get(class_idx)
            .and_then(|fields| fields.get(field_idx))
            .copied()
            .flatten()
    }

    /// Returns the concrete candidate collection for a variable on a given
    /// solution instance.
    ///
    /// Fails with [`SolverError::MissingValueRange`] if the field is not a
    /// genuine variable with a resolved range.
    pub fn resolve_value_range<Sc: Score>(
        &self,
        class_idx: usize,
        field_idx: usize,
        solution: &Solution<Sc>,
    ) -> Result<Vec<Value>> {
        let range = self.variable_range(class_idx, field_idx).ok_or_else(|| {
            let class = &self.entity_classes[class_idx];
            SolverError::MissingValueRange {
                class: class.name.to_string(),
                variable: class.fields[field_idx].name.to_string(),
                range: class.fields[field_idx]
                    .value_range
                    .as_deref()
                    .unwrap_or("<unset>")
                    .to_string(),
            }
        })?;
        Ok(match range {
            ResolvedValueRange::IntRange { min, max } => {
                (min..max).map(Value::Int).collect()
            }
            ResolvedValueRange::FactClass(idx) => (0..solution.facts[idx].len())
                .map(|i| Value::FactRef(idx, i))
                .collect(),
            ResolvedValueRange::EntityClass(idx) => (0..solution.entities[idx].len())
                .map(|i| Value::Ref(idx, i))
                .collect(),
        })
    }
}
