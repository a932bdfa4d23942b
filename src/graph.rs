//! The build graph: targets keyed by name plus the DAG connecting them,
//! and the per-target error aggregation for a walk.

use crate::dag::{Dag, MultiError, WalkFailure};
use crate::target::Target;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Returned when targets fail while walking the graph.  The individual
/// failures are keyed by target name.
#[derive(Debug)]
pub struct WalkError {
    pub errors: BTreeMap<String, anyhow::Error>,
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} targets failed", self.errors.len())
    }
}

impl std::error::Error for WalkError {}

#[derive(Default)]
pub struct Graph {
    targets: Mutex<HashMap<String, Arc<Target>>>,
    dag: Mutex<Dag>,
}

impl Graph {
    pub fn new() -> Graph {
        Graph::default()
    }

    /// Add the target to the graph unless one with the same name already
    /// exists; either way, the target that is in the graph is returned.
    pub fn add(&self, target: Target) -> Arc<Target> {
        let mut targets = self.targets.lock().unwrap();
        if let Some(existing) = targets.get(target.name()) {
            return existing.clone();
        }
        let target = Arc::new(target);
        targets.insert(target.name().to_string(), target.clone());
        self.dag.lock().unwrap().add(target.name());
        target
    }

    pub fn target(&self, name: &str) -> Option<Arc<Target>> {
        self.targets.lock().unwrap().get(name).cloned()
    }

    /// Record that `target` depends on `dependency`.
    pub fn connect(&self, target: &str, dependency: &str) {
        self.dag.lock().unwrap().connect(target, dependency);
    }

    pub fn validate(&self) -> Result<(), MultiError> {
        self.dag.lock().unwrap().validate()
    }

    pub fn transitive_reduction(&self) {
        self.dag.lock().unwrap().transitive_reduction();
    }

    /// Everything `name` transitively depends on, name-ascending.
    pub fn dependencies(&self, name: &str) -> anyhow::Result<Vec<Arc<Target>>> {
        let dag = self.dag.lock().unwrap();
        if !dag.has(name) {
            anyhow::bail!("unknown target {:?}", name);
        }
        let names = dag.ancestors(name);
        drop(dag);

        let targets = self.targets.lock().unwrap();
        Ok(names
            .iter()
            .filter_map(|name| targets.get(name).cloned())
            .collect())
    }

    /// Walk the graph in parallel, calling `f` for every target after its
    /// dependencies succeeded.  The synthetic root is skipped silently.
    pub fn walk<F>(&self, f: F) -> anyhow::Result<()>
    where
        F: Fn(&Target) -> anyhow::Result<()> + Send + Sync,
    {
        let errors = Mutex::new(BTreeMap::new());
        let dag = self.dag.lock().unwrap().clone();
        let result = dag.walk(|name| {
            let Some(target) = self.target(name) else {
                let err = anyhow::anyhow!("vertex has no target");
                errors.lock().unwrap().insert(name.to_string(), err);
                return false;
            };
            if let Target::Root(_) = &*target {
                return true;
            }
            match f(&target) {
                Ok(()) => true,
                Err(err) => {
                    errors.lock().unwrap().insert(name.to_string(), err);
                    false
                }
            }
        });

        match result {
            Ok(()) => Ok(()),
            Err(WalkFailure::VertexFailed) => Err(WalkError {
                errors: errors.into_inner().unwrap(),
            }
            .into()),
            Err(err @ WalkFailure::Stalled(_)) => Err(err.into()),
        }
    }

    /// Render the graph's edges in dot format.
    pub fn dot(&self, w: &mut dyn io::Write) -> io::Result<()> {
        let dag = self.dag.lock().unwrap();
        writeln!(w, "digraph {{")?;
        for v in dag.vertices() {
            for dep in dag.down_edges(v) {
                writeln!(w, "  {:?} -> {:?}", v, dep)?;
            }
        }
        writeln!(w, "}}")
    }

    /// List each vertex followed by its direct dependencies.
    pub fn plain(&self, w: &mut dyn io::Write) -> io::Result<()> {
        let dag = self.dag.lock().unwrap();
        for v in dag.vertices() {
            writeln!(w, "{}", v)?;
            for dep in dag.down_edges(v) {
                writeln!(w, "  {}", dep)?;
            }
        }
        Ok(())
    }
}
