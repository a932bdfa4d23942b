//! Directed acyclic graph over string-named vertices: cycle detection,
//! transitive reduction, and a parallel topological walk.
//!
//! The walk dispatches every runnable vertex to its own worker thread and
//! collects completions over a channel; a vertex becomes runnable when all
//! of its outgoing edges (dependencies) have completed successfully.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::mpsc;

/// A single structural defect found by [`Dag::validate`].
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidateError {
    #[error("Cycle: {}", .0.join(", "))]
    Cycle(Vec<String>),
    #[error("edge references unknown vertex {0:?}")]
    UnknownVertex(String),
}

/// Accumulates validation defects and reports them as a single error.
#[derive(Debug, PartialEq)]
pub struct MultiError {
    pub errors: Vec<ValidateError>,
}

impl std::fmt::Display for MultiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.errors.len() == 1 {
            return write!(f, "1 error occurred:\n\n* {}", self.errors[0]);
        }
        write!(f, "{} errors occurred:\n", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n* {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

/// Returned by [`Dag::walk`].
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum WalkFailure {
    /// At least one callback reported failure; per-vertex detail is the
    /// caller's to track.
    #[error("errors occurred during walk")]
    VertexFailed,
    /// Some vertices could never become runnable, meaning the graph had a
    /// cycle or an edge to an unknown vertex.  `validate` reports which.
    #[error("walk stalled with {0} unrunnable vertices")]
    Stalled(usize),
}

#[derive(Clone, Default)]
pub struct Dag {
    vertices: BTreeSet<String>,
    /// Edges out of each vertex: the vertices it depends on.
    down: BTreeMap<String, BTreeSet<String>>,
    /// Edges into each vertex: the vertices that depend on it.
    up: BTreeMap<String, BTreeSet<String>>,
}

impl Dag {
    pub fn new() -> Dag {
        Dag::default()
    }

    pub fn add(&mut self, name: &str) {
        self.vertices.insert(name.to_string());
    }

    pub fn has(&self, name: &str) -> bool {
        self.vertices.contains(name)
    }

    /// Add an edge `from -> to` ("from depends on to").  Idempotent.
    pub fn connect(&mut self, from: &str, to: &str) {
        self.down
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self.up
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
    }

    fn disconnect(&mut self, from: &str, to: &str) {
        if let Some(tos) = self.down.get_mut(from) {
            tos.remove(to);
        }
        if let Some(froms) = self.up.get_mut(to) {
            froms.remove(from);
        }
    }

    pub fn vertices(&self) -> impl Iterator<Item = &str> {
        self.vertices.iter().map(String::as_str)
    }

    /// Direct dependencies of `name`, name-ascending.
    pub fn down_edges(&self, name: &str) -> impl Iterator<Item = &str> {
        self.down
            .get(name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Everything `name` transitively depends on, name-ascending.
    pub fn ancestors(&self, name: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.reachable_into(name, &mut out);
        out.remove(name);
        out
    }

    /// Collect all vertices reachable from `start` by one or more edges.
    fn reachable_into(&self, start: &str, out: &mut BTreeSet<String>) {
        let Some(next) = self.down.get(start) else {
            return;
        };
        for w in next {
            if out.insert(w.clone()) {
                self.reachable_into(w, out);
            }
        }
    }

    /// Check that every edge endpoint is a known vertex and that the graph
    /// is acyclic.  All defects are reported at once.
    pub fn validate(&self) -> Result<(), MultiError> {
        let mut errors = Vec::new();

        let mut unknown = BTreeSet::new();
        for (from, tos) in &self.down {
            if !self.vertices.contains(from) {
                unknown.insert(from.clone());
            }
            for to in tos {
                if !self.vertices.contains(to) {
                    unknown.insert(to.clone());
                }
            }
        }
        errors.extend(unknown.into_iter().map(ValidateError::UnknownVertex));

        for scc in self.tarjan() {
            let self_loop = scc.len() == 1
                && self
                    .down
                    .get(&scc[0])
                    .is_some_and(|tos| tos.contains(&scc[0]));
            if scc.len() > 1 || self_loop {
                errors.push(ValidateError::Cycle(scc));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MultiError { errors })
        }
    }

    /// Tarjan's strongly-connected components, in pop order.
    fn tarjan(&self) -> Vec<Vec<String>> {
        struct State<'a> {
            dag: &'a Dag,
            next_index: usize,
            index: HashMap<&'a str, usize>,
            lowlink: HashMap<&'a str, usize>,
            stack: Vec<&'a str>,
            on_stack: HashSet<&'a str>,
            sccs: Vec<Vec<String>>,
        }

        fn connect<'a>(st: &mut State<'a>, v: &'a str) {
            st.index.insert(v, st.next_index);
            st.lowlink.insert(v, st.next_index);
            st.next_index += 1;
            st.stack.push(v);
            st.on_stack.insert(v);

            if let Some(next) = st.dag.down.get(v) {
                for w in next {
                    let w = w.as_str();
                    if !st.dag.vertices.contains(w) {
                        continue;
                    }
                    if !st.index.contains_key(w) {
                        connect(st, w);
                        let low = st.lowlink[w].min(st.lowlink[v]);
                        st.lowlink.insert(v, low);
                    } else if st.on_stack.contains(w) {
                        let low = st.index[w].min(st.lowlink[v]);
                        st.lowlink.insert(v, low);
                    }
                }
            }

            if st.lowlink[v] == st.index[v] {
                let mut scc = Vec::new();
                while let Some(w) = st.stack.pop() {
                    st.on_stack.remove(w);
                    scc.push(w.to_string());
                    if w == v {
                        break;
                    }
                }
                st.sccs.push(scc);
            }
        }

        let mut st = State {
            dag: self,
            next_index: 0,
            index: HashMap::new(),
            lowlink: HashMap::new(),
            stack: Vec::new(),
            on_stack: HashSet::new(),
            sccs: Vec::new(),
        };
        for v in &self.vertices {
            if !st.index.contains_key(v.as_str()) {
                connect(&mut st, v);
            }
        }
        st.sccs
    }

    /// Remove every direct edge that is shadowed by a longer path.
    /// Reachability is unchanged; requires an acyclic graph.
    pub fn transitive_reduction(&mut self) {
        let vertices: Vec<String> = self.vertices.iter().cloned().collect();
        for u in &vertices {
            let Some(direct) = self.down.get(u) else {
                continue;
            };
            let direct: Vec<String> = direct.iter().cloned().collect();
            for d in &direct {
                let mut reachable = BTreeSet::new();
                self.reachable_into(d, &mut reachable);
                for w in &direct {
                    if w != d && reachable.contains(w) {
                        self.disconnect(u, w);
                    }
                }
            }
        }
    }

    /// Walk the graph in parallel.  Each vertex is passed to `f` on its own
    /// thread once all of its dependencies have completed with `true`; the
    /// dependents of a failed vertex are never visited.
    pub fn walk<F>(&self, f: F) -> Result<(), WalkFailure>
    where
        F: Fn(&str) -> bool + Send + Sync,
    {
        let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
        for v in &self.vertices {
            let deps = self
                .down
                .get(v)
                .map_or(0, |tos| tos.iter().filter(|to| self.vertices.contains(*to)).count());
            pending.insert(v, deps);
        }

        let mut failed = false;
        let mut visited = 0;
        std::thread::scope(|s| {
            let f = &f;
            let (tx, rx) = mpsc::channel();
            let mut ready: Vec<&str> = pending
                .iter()
                .filter(|&(_, &deps)| deps == 0)
                .map(|(&v, _)| v)
                .collect();
            let mut running = 0;
            loop {
                for name in ready.drain(..) {
                    let tx = tx.clone();
                    s.spawn(move || {
                        let ok = f(name);
                        // Send failure is fine: it means the walk is over.
                        let _ = tx.send((name, ok));
                    });
                    running += 1;
                    visited += 1;
                }
                if running == 0 {
                    break;
                }
                let (name, ok) = rx.recv().unwrap();
                running -= 1;
                if !ok {
                    failed = true;
                    continue;
                }
                if let Some(dependents) = self.up.get(name) {
                    for dependent in dependents {
                        if let Some(deps) = pending.get_mut(dependent.as_str()) {
                            *deps -= 1;
                            if *deps == 0 {
                                ready.push(dependent);
                            }
                        }
                    }
                }
            }
        });

        if failed {
            Err(WalkFailure::VertexFailed)
        } else if visited < pending.len() {
            Err(WalkFailure::Stalled(pending.len() - visited))
        } else {
            Ok(())
        }
    }
}
