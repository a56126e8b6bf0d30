//! Task dependency graph utilities.

use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};

use super::Task;
use crate::error::TaskError;

/// Per-task in-degree and reverse edges, ignoring dependencies that are not
/// part of `tasks`.
fn edges(tasks: &[&dyn Task]) -> (Vec<usize>, Vec<Vec<usize>>) {
    let type_to_idx: HashMap<TypeId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.task_id(), i))
        .collect();

    let in_degree: Vec<usize> = tasks
        .iter()
        .map(|t| {
            t.dependencies()
                .iter()
                .filter(|d| type_to_idx.contains_key(d))
                .count()
        })
        .collect();

    let mut reverse_deps: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, t) in tasks.iter().enumerate() {
        for dep in t.dependencies() {
            if let Some(&dep_idx) = type_to_idx.get(dep)
                && let Some(rd) = reverse_deps.get_mut(dep_idx)
            {
                rd.push(i);
            }
        }
    }

    (in_degree, reverse_deps)
}

/// Order `tasks` so every task follows its dependencies (Kahn's algorithm).
///
/// Among tasks that are ready at the same time, the one listed first wins,
/// so the result is deterministic.
///
/// # Errors
///
/// Returns [`TaskError::DependencyCycle`] naming the tasks left unordered.
pub fn execution_order<'a>(tasks: &[&'a dyn Task]) -> Result<Vec<&'a dyn Task>, TaskError> {
    let (mut in_degree, reverse_deps) = edges(tasks);

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter_map(|(i, &d)| (d == 0).then_some(i))
        .collect();
    let mut order = Vec::with_capacity(tasks.len());

    while let Some(idx) = ready.pop_first() {
        if let Some(&task) = tasks.get(idx) {
            order.push(task);
        }
        for &dep in reverse_deps.get(idx).into_iter().flatten() {
            if let Some(count) = in_degree.get_mut(dep) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(dep);
                }
            }
        }
    }

    if order.len() != tasks.len() {
        let stuck: Vec<&str> = tasks
            .iter()
            .zip(&in_degree)
            .filter(|(_, d)| **d > 0)
            .map(|(t, _)| t.name())
            .collect();
        return Err(TaskError::DependencyCycle(stuck.join(", ")));
    }
    Ok(order)
}

/// Detect cycles in the task dependency graph.
///
/// Returns `true` if the graph contains at least one cycle.
#[must_use]
pub fn has_cycle(tasks: &[&dyn Task]) -> bool {
    execution_order(tasks).is_err()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tasks::{Context, TaskResult};

    use anyhow::Result;

    // Each mock is a distinct type so TypeId-based deps work.
    macro_rules! mock_task {
        ($name:ident, $display:expr, $deps:expr) => {
            struct $name;
            impl Task for $name {
                fn name(&self) -> &str {
                    $display
                }
                fn dependencies(&self) -> &[TypeId] {
                    const DEPS: &[TypeId] = $deps;
                    DEPS
                }
                fn should_run(&self, _ctx: &Context<'_>) -> bool {
                    true
                }
                fn run(&self, _ctx: &Context<'_>) -> Result<TaskResult> {
                    Ok(TaskResult::Ok)
                }
            }
        };
    }

    mock_task!(TaskA, "a", &[]);
    mock_task!(TaskB, "b", &[]);

    // Chain: DepA → DepB → DepC
    mock_task!(DepA, "dep-a", &[]);
    mock_task!(DepB, "dep-b", &[TypeId::of::<DepA>()]);
    mock_task!(DepC, "dep-c", &[TypeId::of::<DepB>()]);

    // Diamond: DiaA → DiaB + DiaC → DiaD
    mock_task!(DiaA, "dia-a", &[]);
    mock_task!(DiaB, "dia-b", &[TypeId::of::<DiaA>()]);
    mock_task!(DiaC, "dia-c", &[TypeId::of::<DiaA>()]);
    mock_task!(DiaD, "dia-d", &[TypeId::of::<DiaB>(), TypeId::of::<DiaC>()]);

    // Cyclic: CycA → CycB → CycA
    mock_task!(CycA, "cyc-a", &[TypeId::of::<CycB>()]);
    mock_task!(CycB, "cyc-b", &[TypeId::of::<CycA>()]);

    fn names(tasks: &[&dyn Task]) -> Vec<String> {
        execution_order(tasks)
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    #[test]
    fn independent_tasks_keep_list_order() {
        assert_eq!(names(&[&TaskB, &TaskA]), vec!["b", "a"]);
    }

    #[test]
    fn chain_is_reordered() {
        assert_eq!(names(&[&DepC, &DepA, &DepB]), vec!["dep-a", "dep-b", "dep-c"]);
    }

    #[test]
    fn diamond_orders_join_last() {
        let order = names(&[&DiaD, &DiaC, &DiaB, &DiaA]);
        assert_eq!(order[0], "dia-a");
        assert_eq!(order[3], "dia-d");
    }

    #[test]
    fn cycle_is_an_error() {
        let tasks: Vec<&dyn Task> = vec![&TaskA, &CycA, &CycB];
        assert!(has_cycle(&tasks));
        let err = execution_order(&tasks).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Task dependency cycle detected: cyc-a, cyc-b"
        );
    }

    #[test]
    fn missing_dep_is_ignored() {
        let tasks: Vec<&dyn Task> = vec![&DepC, &TaskA];
        assert!(!has_cycle(&tasks));
        assert_eq!(names(&tasks), vec!["dep-c", "a"]);
    }

    #[test]
    fn apply_tasks_have_resolvable_dependencies() {
        use std::collections::HashSet;
        let tasks = crate::tasks::all_apply_tasks();
        let present: HashSet<TypeId> = tasks.iter().map(|t| t.task_id()).collect();
        for task in &tasks {
            for dep in task.dependencies() {
                assert!(
                    present.contains(dep),
                    "task '{}' depends on a TypeId not in the task list",
                    task.name()
                );
            }
        }
    }

    #[test]
    fn apply_tasks_have_no_cycles() {
        let tasks = crate::tasks::all_apply_tasks();
        let task_refs: Vec<&dyn Task> = tasks.iter().map(Box::as_ref).collect();
        assert!(!has_cycle(&task_refs));
    }
}
