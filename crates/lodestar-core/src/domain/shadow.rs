//! Shadow-variable propagation.
//!
//! Whenever a genuine variable changes, dependent shadow variables are
//! recomputed in the dependency order validated at registry `freeze()`.
//! The propagator touches only the affected slice of a list:
//!
//! - inverse: O(1) per inserted element
//! - index: elements at or after the mutation point
//! - previous/next: the 2-3 boundary neighbors
//! - cascading: strictly in list order from the mutation point, stopping
//!   early once a recomputed value equals the cached value
//! - piggyback: same pass as its anchor cascade

use std::sync::Arc;

use smallvec::SmallVec;

use crate::score::Score;

use super::registry::{DomainRegistry, ListShadowPlan};
use super::solution::Solution;
use super::value::Value;

/// Recomputes shadow variables after genuine-variable mutations.
///
/// Stateless apart from the shared registry; safe to share per session.
#[derive(Debug, Clone)]
pub struct ShadowPropagator {
    registry: Arc<DomainRegistry>,
}

impl ShadowPropagator {
    pub fn new(registry: Arc<DomainRegistry>) -> Self {
        Self { registry }
    }

    /// Rebuilds every shadow variable from scratch.
    ///
    /// Used when a working solution is (re)loaded into a session.
    pub fn refresh_all<Sc: Score>(&self, solution: &mut Solution<Sc>) {
        for class_idx in 0..self.registry.entity_classes().len() {
            let plan = self.registry.class_plan(class_idx);
            if plan.cascades.is_empty() {
                continue;
            }
            for entity_idx in 0..solution.entities[class_idx].len() {
                self.run_basic_cascades(solution, class_idx, entity_idx);
            }
        }
        for plan_idx in 0..self.registry.list_plans().len() {
            let plan = &self.registry.list_plans()[plan_idx];
            let (owner_class, owner_field) = (plan.owner_class, plan.owner_field);
            for owner_idx in 0..solution.entities[owner_class].len() {
                let len = solution.entities[owner_class][owner_idx].fields[owner_field]
                    .as_list()
                    .map(|l| l.len())
                    .unwrap_or(0);
                self.after_list_change(solution, owner_class, owner_idx, owner_field, 0, len);
            }
        }
    }

    /// Recomputes shadows after a basic (non-list) variable change.
    ///
    /// If the entity is an element currently assigned to a list, the
    /// cascade walk restarts from its position in that list; otherwise its
    /// cascades are recomputed with no predecessor.
    pub fn after_basic_change<Sc: Score>(
        &self,
        solution: &mut Solution<Sc>,
        class_idx: usize,
        entity_idx: usize,
    ) {
        for plan in self.registry.list_plans() {
            if plan.element_class != class_idx || plan.cascades.is_empty() {
                continue;
            }
            if let Some((owner_idx, at)) =
                self.locate_in_list(solution, plan, class_idx, entity_idx)
            {
                let (owner_class, owner_field) = (plan.owner_class, plan.owner_field);
                self.after_list_change(solution, owner_class, owner_idx, owner_field, at, at + 1);
                return;
            }
        }

        self.run_basic_cascades(solution, class_idx, entity_idx);
    }

    /// Finds the (owner, position) of an element, through its inverse and
    /// index shadows when declared, otherwise by scanning the owners.
    fn locate_in_list<Sc: Score>(
        &self,
        solution: &Solution<Sc>,
        plan: &ListShadowPlan,
        class_idx: usize,
        entity_idx: usize,
    ) -> Option<(usize, usize)> {
        if let (Some(inverse_field), Some(index_field)) = (plan.inverse_field, plan.index_field) {
            let entity = &solution.entities[class_idx][entity_idx];
            let (oc, oi) = entity.fields[inverse_field].as_entity_ref()?;
            let at = entity.fields[index_field].as_int()? as usize;
            return (oc == plan.owner_class).then_some((oi, at));
        }
        for (owner_idx, owner) in solution.entities[plan.owner_class].iter().enumerate() {
            let hit = owner.fields[plan.owner_field].as_list().and_then(|list| {
                list.iter()
                    .position(|v| v.as_entity_ref() == Some((class_idx, entity_idx)))
            });
            if let Some(at) = hit {
                return Some((owner_idx, at));
            }
        }
        Option::None
    }

    fn run_basic_cascades<Sc: Score>(
        &self,
        solution: &mut Solution<Sc>,
        class_idx: usize,
        entity_idx: usize,
    ) {
        let plan = self.registry.class_plan(class_idx);
        for cascade in &plan.cascades {
            let new = (cascade.update)(&solution.entities[class_idx][entity_idx], Option::None);
            solution.entities[class_idx][entity_idx].fields[cascade.field] = new;
            for (pig_field, pig_update) in &cascade.piggybacks {
                let new =
                    (pig_update)(&solution.entities[class_idx][entity_idx], Option::None);
                solution.entities[class_idx][entity_idx].fields[*pig_field] = new;
            }
        }
    }

    /// Recomputes shadows after a list-variable mutation on one owner.
    ///
    /// `[from, to)` is the directly affected element range (empty for a
    /// plain removal at `from`). Inverse is set for the inserted range,
    /// index for everything at or after `from`, previous/next only at the
    /// range boundaries, and cascades walk forward from `from` with the
    /// bounded-propagation early stop.
    pub fn after_list_change<Sc: Score>(
        &self,
        solution: &mut Solution<Sc>,
        owner_class: usize,
        owner_idx: usize,
        owner_field: usize,
        from: usize,
        to: usize,
    ) {
        let Some(plan_idx) = self
            .registry
            .list_plans()
            .iter()
            .position(|p| p.owner_class == owner_class && p.owner_field == owner_field)
        else {
            return;
        };
        let plan = &self.registry.list_plans()[plan_idx];

        // Element refs are copied out so elements can be mutated below.
        let elements: SmallVec<[(usize, usize); 16]> = solution.entities[owner_class][owner_idx]
            .fields[owner_field]
            .as_list()
            .map(|l| l.iter().filter_map(|v| v.as_entity_ref()).collect())
            .unwrap_or_default();
        let len = elements.len();
        let to = to.min(len);

        if let Some(inverse_field) = plan.inverse_field {
            for &(ec, ei) in elements.iter().take(to).skip(from) {
                solution.entities[ec][ei].fields[inverse_field] =
                    Value::Ref(owner_class, owner_idx);
            }
        }

        if let Some(index_field) = plan.index_field {
            for (i, &(ec, ei)) in elements.iter().enumerate().skip(from) {
                solution.entities[ec][ei].fields[index_field] = Value::Int(i as i64);
            }
        }

        // Only the boundary neighbors changed; interior shifts keep their
        // neighbor refs intact.
        let lo = from.saturating_sub(1);
        let hi = (to + 1).min(len);
        for i in lo..hi {
            let (ec, ei) = elements[i];
            if let Some(previous_field) = plan.previous_field {
                let prev = if i == 0 {
                    Value::None
                } else {
                    let (pc, pi) = elements[i - 1];
                    Value::Ref(pc, pi)
                };
                solution.entities[ec][ei].fields[previous_field] = prev;
            }
            if let Some(next_field) = plan.next_field {
                let next = if i + 1 < len {
                    let (nc, ni) = elements[i + 1];
                    Value::Ref(nc, ni)
                } else {
                    Value::None
                };
                solution.entities[ec][ei].fields[next_field] = next;
            }
        }
        self.run_list_cascades(solution, plan, &elements, from, to);
    }

    fn run_list_cascades<Sc: Score>(
        &self,
        solution: &mut Solution<Sc>,
        plan: &ListShadowPlan,
        elements: &[(usize, usize)],
        from: usize,
        to: usize,
    ) {
        for cascade in &plan.cascades {
            for (i, &(ec, ei)) in elements.iter().enumerate().skip(from) {
                let prev = if i == 0 {
                    Option::None
                } else {
                    let (pc, pi) = elements[i - 1];
                    Some(solution.entities[pc][pi].fields[cascade.field].clone())
                };
                let new = (cascade.update)(&solution.entities[ec][ei], prev.as_ref());
                let mut changed = solution.entities[ec][ei].fields[cascade.field] != new;
                solution.entities[ec][ei].fields[cascade.field] = new;

                for (pig_field, pig_update) in &cascade.piggybacks {
                    let prev_pig = if i == 0 {
                        Option::None
                    } else {
                        let (pc, pi) = elements[i - 1];
                        Some(solution.entities[pc][pi].fields[*pig_field].clone())
                    };
                    let new = (pig_update)(&solution.entities[ec][ei], prev_pig.as_ref());
                    changed |= solution.entities[ec][ei].fields[*pig_field] != new;
                    solution.entities[ec][ei].fields[*pig_field] = new;
                }

                // Downstream values are unaffected once a recomputation is
                // a no-op past the mutated range.
                if !changed && i >= to {
                    break;
                }
            }
        }
    }

    /// Clears the membership and cascaded shadows of an element removed
    /// from every list.
    pub fn clear_element_shadows<Sc: Score>(
        &self,
        solution: &mut Solution<Sc>,
        element_class: usize,
        element_idx: usize,
    ) {
        for plan in self.registry.list_plans() {
            if plan.element_class != element_class {
                continue;
            }
            let entity = &mut solution.entities[element_class][element_idx];
            for field in [
                plan.inverse_field,
                plan.index_field,
                plan.previous_field,
                plan.next_field,
            ]
            .into_iter()
            .flatten()
            {
                entity.fields[field] = Value::None;
            }
            for cascade in &plan.cascades {
                entity.fields[cascade.field] = Value::None;
                for (pig_field, _) in &cascade.piggybacks {
                    entity.fields[*pig_field] = Value::None;
                }
            }
        }
    }
}
