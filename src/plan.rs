//! Planning: recursively discovering the dependency graph of the requested
//! targets, then executing it in parallel.

use crate::cancel::Cancel;
use crate::graph::Graph;
use crate::semaphore::Semaphore;
use crate::target::{RootTarget, Target};
use crate::trace;
use anyhow::Context;
use std::sync::Arc;

/// Materializes a Target at its first mention during planning.
pub type TargetFactory = Box<dyn Fn(&str) -> anyhow::Result<Target> + Send + Sync>;

pub struct Plan {
    new_target: TargetFactory,
    graph: Graph,
}

impl Plan {
    pub fn new(new_target: TargetFactory) -> Plan {
        Plan {
            new_target,
            graph: Graph::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Build the graph, starting from the given targets.
    pub fn plan(&self, cancel: &Cancel, targets: &[String]) -> anyhow::Result<()> {
        for name in targets {
            self.materialize(cancel, name)?;
        }

        // A root target collects the requested targets so the walk has a
        // single entry point.
        self.expand(
            cancel,
            Target::Root(RootTarget {
                deps: targets.to_vec(),
            }),
        )?;

        self.graph.validate()?;
        self.graph.transitive_reduction();
        Ok(())
    }

    fn materialize(&self, cancel: &Cancel, name: &str) -> anyhow::Result<Arc<Target>> {
        // Target already exists in the graph.
        if let Some(target) = self.graph.target(name) {
            return Ok(target);
        }
        let target = (self.new_target)(name)?;
        self.expand(cancel, target)
    }

    fn expand(&self, cancel: &Cancel, target: Target) -> anyhow::Result<Arc<Target>> {
        let target = self.graph.add(target);
        let deps = target
            .dependencies(cancel)
            .with_context(|| format!("error getting dependencies for {}", target.name()))?;
        for dep in deps {
            let dep = self.materialize(cancel, &dep)?;
            self.graph.connect(target.name(), dep.name());
        }
        Ok(target)
    }

    /// Execute the plan.  A failed target stops only its dependents;
    /// independent branches keep building.
    pub fn exec(&self, cancel: &Cancel, semaphore: &Semaphore) -> anyhow::Result<()> {
        self.graph.walk(|target| {
            let acquired = semaphore.acquire(cancel);
            let result = if cancel.is_cancelled() {
                Err(anyhow::anyhow!("cancelled"))
            } else {
                trace::scope(target.name(), || target.exec(cancel))
            };
            if acquired {
                semaphore.release();
            }
            result
        })
    }

    /// Everything `name` transitively depends on.
    pub fn dependencies(&self, name: &str) -> anyhow::Result<Vec<Arc<Target>>> {
        self.graph.dependencies(name)
    }
}
