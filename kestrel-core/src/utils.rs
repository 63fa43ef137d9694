//! Dependency ordering helpers shared by the resolution strategies, and the
//! tracker that keeps a bean type from being constructed twice at once.

use std::any::Any;

/// Extracts a readable message from a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

pub mod dependency {
    use std::collections::{BTreeSet, HashSet};

    use parking_lot::Mutex;

    use crate::key::TypeKey;

    /// Tracks bean types currently being constructed.
    ///
    /// Construction of a type is exclusive: while a [`CreationGuard`] for a
    /// key is alive, further attempts to start creating that key fail.
    #[derive(Debug, Default)]
    pub struct CreationTracker {
        creating: Mutex<HashSet<TypeKey>>,
    }

    impl CreationTracker {
        pub fn new() -> Self {
            Self::default()
        }

        /// Checks if a type is currently being constructed.
        pub fn is_creating(&self, key: &TypeKey) -> bool {
            self.creating.lock().contains(key)
        }

        /// Marks a type as being constructed.
        ///
        /// Returns `None` if the type is already being constructed. The mark
        /// is cleared when the returned guard is dropped.
        pub fn start_creating(&self, key: TypeKey) -> Option<CreationGuard<'_>> {
            if self.creating.lock().insert(key) {
                Some(CreationGuard { tracker: self, key })
            } else {
                None
            }
        }
    }

    /// RAII mark for a type under construction
    #[derive(Debug)]
    pub struct CreationGuard<'a> {
        tracker: &'a CreationTracker,
        key: TypeKey,
    }

    impl Drop for CreationGuard<'_> {
        fn drop(&mut self) {
            self.tracker.creating.lock().remove(&self.key);
        }
    }

    /// Best-effort reorder of pending beans by direct dependency edges.
    ///
    /// Every pair is compared once against the input order: an item that some
    /// earlier item depends on directly is placed immediately in front of the
    /// earliest such dependent. Unrelated items in between do not hide the
    /// edge. Placement uses input positions only, so ordering is not
    /// propagated through intermediate items: for `A -> B -> C` all pending,
    /// `[A, B, C]` becomes `[B, A, C]` and neither `B` nor `A` can be built
    /// once `C` is attempted last.
    pub fn pairwise_reorder<T, F>(items: Vec<T>, depends_on: F) -> Vec<T>
    where
        F: Fn(&T, &T) -> bool,
    {
        // (slot, anchored, input index): moved items sort ahead of the item
        // whose slot they take.
        let mut placement: Vec<(usize, bool, usize)> = (0..items.len())
            .map(|index| {
                match (0..index).find(|&earlier| depends_on(&items[earlier], &items[index])) {
                    Some(dependent) => (dependent, false, index),
                    None => (index, true, index),
                }
            })
            .collect();
        placement.sort_unstable();

        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        placement
            .into_iter()
            .filter_map(|(_, _, index)| slots[index].take())
            .collect()
    }

    /// Result of [`topological_order`]
    #[derive(Debug, Default, PartialEq, Eq)]
    pub struct TopologicalOrder {
        /// Node indices, dependencies before dependents
        pub order: Vec<usize>,
        /// Nodes that can never be ordered (on or behind a cycle)
        pub blocked: Vec<usize>,
        /// Each detected cycle, first node repeated at the end
        pub cycles: Vec<Vec<usize>>,
    }

    /// Performs a stable topological sort on a dependency graph.
    ///
    /// `dependencies[i]` lists the nodes that node `i` depends on. Among the
    /// nodes ready at any point the lowest index goes first, so unrelated
    /// nodes keep their input order. Nodes that cannot be ordered are
    /// reported in `blocked`, and the cycles among them in `cycles`.
    pub fn topological_order(dependencies: &[Vec<usize>]) -> TopologicalOrder {
        let count = dependencies.len();
        let mut in_degree = vec![0usize; count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

        // For each node -> [deps], deps come before node
        for (node, deps) in dependencies.iter().enumerate() {
            for &dep in deps.iter().filter(|&&dep| dep < count) {
                in_degree[node] += 1;
                dependents[dep].push(node);
            }
        }

        let mut ready: BTreeSet<usize> = (0..count).filter(|&n| in_degree[n] == 0).collect();
        let mut order = Vec::with_capacity(count);

        while let Some(node) = ready.pop_first() {
            order.push(node);

            for &dependent in &dependents[node] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        let blocked: Vec<usize> = (0..count).filter(|&n| in_degree[n] > 0).collect();
        let cycles = find_cycles(dependencies, &blocked);

        TopologicalOrder {
            order,
            blocked,
            cycles,
        }
    }

    /// DFS-based cycle detection restricted to `candidates`
    fn find_cycles(dependencies: &[Vec<usize>], candidates: &[usize]) -> Vec<Vec<usize>> {
        let mut visited = HashSet::new();
        let mut cycles = Vec::new();

        for &node in candidates {
            if !visited.contains(&node) {
                let mut rec_stack = Vec::new();
                detect_cycle_dfs(node, dependencies, &mut visited, &mut rec_stack, &mut cycles);
            }
        }

        cycles
    }

    fn detect_cycle_dfs(
        node: usize,
        graph: &[Vec<usize>],
        visited: &mut HashSet<usize>,
        rec_stack: &mut Vec<usize>,
        cycles: &mut Vec<Vec<usize>>,
    ) {
        visited.insert(node);
        rec_stack.push(node);

        if let Some(deps) = graph.get(node) {
            for &dep in deps.iter().filter(|&&dep| dep < graph.len()) {
                if !visited.contains(&dep) {
                    detect_cycle_dfs(dep, graph, visited, rec_stack, cycles);
                } else if let Some(start) = rec_stack.iter().position(|&n| n == dep) {
                    let mut cycle = rec_stack[start..].to_vec();
                    cycle.push(dep);
                    cycles.push(cycle);
                }
            }
        }

        rec_stack.pop();
    }
}
