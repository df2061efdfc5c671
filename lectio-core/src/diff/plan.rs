//! Computes the operations that bring the calendar in line with the schedule.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::calendar_event::CalendarEvent;
use crate::diff::{DiffKind, Operation};
use crate::equivalence::is_equivalent;
use crate::module::Module;
use crate::namespace::Namespace;

/// A module whose stored event is stale or cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub module: Module,
    pub event: CalendarEvent,
}

/// Three disjoint sets of work. Each entry is independent of every other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub to_insert: Vec<Module>,
    pub to_update: Vec<PendingUpdate>,
    pub to_delete: Vec<CalendarEvent>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_insert.len() + self.to_update.len() + self.to_delete.len()
    }

    pub fn count(&self, kind: DiffKind) -> usize {
        match kind {
            DiffKind::Insert => self.to_insert.len(),
            DiffKind::Update => self.to_update.len(),
            DiffKind::Delete => self.to_delete.len(),
        }
    }

    /// Write operations for the executor. Updates keep the stored event's id.
    pub fn into_operations(self, namespace: &Namespace) -> Vec<Operation> {
        let inserts = self
            .to_insert
            .iter()
            .map(|module| Operation::Insert(CalendarEvent::from_module(module, namespace)));

        let updates = self.to_update.iter().map(|pending| {
            let mut event = CalendarEvent::from_module(&pending.module, namespace);
            event.external_id = pending.event.external_id.clone();
            Operation::Update(event)
        });

        let deletes = self
            .to_delete
            .into_iter()
            .map(|event| Operation::Delete(event.external_id));

        inserts.chain(updates).chain(deletes).collect()
    }
}

/// Plans against a complete module set and a complete event set.
///
/// `events` should already be limited to `namespace`; entries without the tag
/// are skipped regardless, so they can never be touched.
pub fn plan(
    modules: &HashMap<String, Module>,
    events: &HashMap<String, CalendarEvent>,
    namespace: &Namespace,
) -> SyncPlan {
    let mut sync_plan = SyncPlan::default();

    for module in modules.values() {
        let external_id = namespace.to_external_id(&module.id);

        let Some(event) = events.get(&external_id) else {
            sync_plan.to_insert.push(module.clone());
            continue;
        };

        if !event.is_well_formed() {
            warn!(
                external_id = %external_id,
                "Stored event has unusable start/end, rewriting it"
            );
        }

        if event.is_cancelled() || !is_equivalent(module, event) {
            sync_plan.to_update.push(PendingUpdate {
                module: module.clone(),
                event: event.clone(),
            });
        }
    }

    for (external_id, event) in events {
        if !namespace.owns(external_id) {
            debug!(external_id = %external_id, "Skipping event outside namespace");
            continue;
        }

        let module_id = namespace.to_module_id(external_id);
        if !modules.contains_key(module_id) && !event.is_cancelled() {
            sync_plan.to_delete.push(event.clone());
        }
    }

    sync_plan.to_insert.sort_by(|a, b| by_start(Some(a.start), Some(b.start), &a.id, &b.id));
    sync_plan.to_update.sort_by(|a, b| {
        by_start(
            Some(a.module.start),
            Some(b.module.start),
            &a.module.id,
            &b.module.id,
        )
    });
    sync_plan
        .to_delete
        .sort_by(|a, b| by_start(a.start, b.start, &a.external_id, &b.external_id));

    sync_plan
}

/// Orders by start time (unknown times last), then id, so output is stable.
fn by_start<T: PartialOrd>(a: Option<T>, b: Option<T>, a_id: &str, b_id: &str) -> Ordering {
    let by_time = match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_time.then_with(|| a_id.cmp(b_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar_event::{ColorMarker, LifecycleState};
    use crate::module::ModuleStatus;
    use crate::module::tests::make_test_module;
    use chrono::Duration;
    use std::collections::HashSet;

    fn modules(list: Vec<Module>) -> HashMap<String, Module> {
        list.into_iter().map(|m| (m.id.clone(), m)).collect()
    }

    fn events(list: Vec<CalendarEvent>) -> HashMap<String, CalendarEvent> {
        list.into_iter().map(|e| (e.external_id.clone(), e)).collect()
    }

    fn projected(module: &Module) -> CalendarEvent {
        CalendarEvent::from_module(module, &Namespace::default())
    }

    fn orphan(external_id: &str, lifecycle: LifecycleState) -> CalendarEvent {
        let mut event = projected(&make_test_module("0"));
        event.external_id = external_id.to_string();
        event.lifecycle = lifecycle;
        event
    }

    #[test]
    fn test_missing_event_is_inserted() {
        let m = modules(vec![make_test_module("42")]);
        let plan = plan(&m, &HashMap::new(), &Namespace::default());

        assert_eq!(plan.to_insert, vec![m["42"].clone()]);
        assert!(plan.to_update.is_empty());
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn test_room_change_is_updated() {
        let module = make_test_module("42");
        let mut stored = projected(&module);
        stored.room = "23".to_string();

        let m = modules(vec![module.clone()]);
        let e = events(vec![stored.clone()]);
        let plan = plan(&m, &e, &Namespace::default());

        assert!(plan.to_insert.is_empty());
        assert_eq!(
            plan.to_update,
            vec![PendingUpdate {
                module,
                event: stored
            }]
        );
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn test_orphan_is_deleted() {
        let e = events(vec![orphan("lec7", LifecycleState::Confirmed)]);
        let plan = plan(&HashMap::new(), &e, &Namespace::default());

        assert_eq!(plan.to_delete, vec![e["lec7"].clone()]);
        assert!(plan.to_insert.is_empty());
        assert!(plan.to_update.is_empty());
    }

    #[test]
    fn test_cancelled_orphan_is_left_alone() {
        let e = events(vec![orphan("lec7", LifecycleState::Cancelled)]);
        let plan = plan(&HashMap::new(), &e, &Namespace::default());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_cancelled_event_forces_update() {
        let module = make_test_module("42");
        let mut stored = projected(&module);
        stored.lifecycle = LifecycleState::Cancelled;

        let plan = plan(
            &modules(vec![module]),
            &events(vec![stored]),
            &Namespace::default(),
        );
        assert_eq!(plan.to_update.len(), 1);
        assert!(plan.to_insert.is_empty());
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn test_equivalent_events_need_nothing() {
        let list: Vec<Module> = (0..20)
            .map(|i| {
                let mut m = make_test_module(&i.to_string());
                m.start += Duration::hours(i);
                m.end += Duration::hours(i);
                m.status = match i % 3 {
                    0 => ModuleStatus::Unchanged,
                    1 => ModuleStatus::Changed,
                    _ => ModuleStatus::Cancelled,
                };
                m
            })
            .collect();
        let e = events(list.iter().map(projected).collect());

        let plan = plan(&modules(list), &e, &Namespace::default());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_untagged_events_never_touched() {
        let mut personal = orphan("dentist1", LifecycleState::Confirmed);
        personal.title = "Dentist".to_string();
        // Same key as a module id, but not in the namespace
        let shadow = orphan("42", LifecycleState::Confirmed);

        let module = make_test_module("42");
        let e = events(vec![personal, shadow]);
        let plan = plan(&modules(vec![module]), &e, &Namespace::default());

        assert_eq!(plan.to_insert.len(), 1);
        assert!(plan.to_update.is_empty());
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn test_malformed_event_is_updated_not_fatal() {
        let module = make_test_module("42");
        let mut stored = projected(&module);
        stored.start = None;

        let plan = plan(
            &modules(vec![module]),
            &events(vec![stored]),
            &Namespace::default(),
        );
        assert_eq!(plan.to_update.len(), 1);
    }

    #[test]
    fn test_plan_sets_are_disjoint() {
        let unchanged = make_test_module("1");
        let mut moved = make_test_module("2");
        moved.start += Duration::hours(1);
        moved.end += Duration::hours(1);
        let new = make_test_module("3");

        let mut stale = projected(&make_test_module("2"));
        stale.color = ColorMarker::Green;

        let e = events(vec![
            projected(&unchanged),
            stale,
            orphan("lec4", LifecycleState::Confirmed),
            orphan("lec5", LifecycleState::Cancelled),
            orphan("holiday", LifecycleState::Confirmed),
        ]);
        let ns = Namespace::default();
        let plan = plan(&modules(vec![unchanged, moved, new]), &e, &ns);

        let inserts: HashSet<String> = plan.to_insert.iter().map(|m| m.id.clone()).collect();
        let updates: HashSet<String> = plan.to_update.iter().map(|u| u.module.id.clone()).collect();
        let deletes: HashSet<String> = plan
            .to_delete
            .iter()
            .map(|e| ns.to_module_id(&e.external_id).to_string())
            .collect();

        assert_eq!(inserts, HashSet::from(["3".to_string()]));
        assert_eq!(updates, HashSet::from(["2".to_string()]));
        assert_eq!(deletes, HashSet::from(["4".to_string()]));
        assert!(inserts.is_disjoint(&updates));
        assert!(inserts.is_disjoint(&deletes));
        assert!(updates.is_disjoint(&deletes));
    }

    #[test]
    fn test_into_operations_keeps_stored_id_for_updates() {
        let module = make_test_module("42");
        let mut stored = projected(&module);
        stored.room = "23".to_string();

        let plan = SyncPlan {
            to_insert: vec![make_test_module("1")],
            to_update: vec![PendingUpdate {
                module: module.clone(),
                event: stored,
            }],
            to_delete: vec![orphan("lec7", LifecycleState::Confirmed)],
        };

        let ops = plan.into_operations(&Namespace::default());
        let described: Vec<(DiffKind, &str)> =
            ops.iter().map(|op| (op.kind(), op.external_id())).collect();
        assert_eq!(
            described,
            vec![
                (DiffKind::Insert, "lec1"),
                (DiffKind::Update, "lec42"),
                (DiffKind::Delete, "lec7"),
            ]
        );

        match &ops[1] {
            Operation::Update(event) => assert_eq!(event.room, "22"),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_output_is_sorted_by_start() {
        let mut late = make_test_module("b");
        late.start += Duration::hours(3);
        late.end += Duration::hours(3);
        let early = make_test_module("a");

        let plan = plan(
            &modules(vec![late, early]),
            &HashMap::new(),
            &Namespace::default(),
        );
        let ids: Vec<&str> = plan.to_insert.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
