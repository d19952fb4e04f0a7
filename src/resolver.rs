use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::registry::{Registry, RegistryError, Target};

#[derive(Debug, Serialize)]
pub struct ExecutionPlan {
    pub requested: String,
    pub targets: Vec<PlannedTarget>,
}

#[derive(Debug, Serialize)]
pub struct PlannedTarget {
    pub name: String,
    pub commands: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("dependency cycle detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
}

/// Compute the execution order for `requested`: every dependency precedes its
/// dependents, each target appears at most once, dependencies are visited in
/// declaration order so the plan is reproducible for a given registry.
pub fn resolve(registry: &Registry, requested: &str) -> Result<ExecutionPlan, ResolveError> {
    let mut ordered = Vec::new();
    let mut placed = HashSet::new();
    let mut in_progress = Vec::new();
    visit(registry, requested, &mut in_progress, &mut placed, &mut ordered)?;

    Ok(ExecutionPlan {
        requested: requested.to_string(),
        targets: ordered
            .into_iter()
            .map(|target| PlannedTarget {
                name: target.name.clone(),
                commands: target.commands.clone(),
                workdir: target.workdir.clone(),
            })
            .collect(),
    })
}

fn visit<'a>(
    registry: &'a Registry,
    name: &str,
    in_progress: &mut Vec<&'a str>,
    placed: &mut HashSet<&'a str>,
    ordered: &mut Vec<&'a Target>,
) -> Result<(), ResolveError> {
    let target = registry.lookup(name)?;

    if placed.contains(target.name.as_str()) {
        return Ok(());
    }

    if let Some(entry) = in_progress.iter().position(|n| *n == target.name) {
        let mut cycle: Vec<String> = in_progress[entry..].iter().map(|n| n.to_string()).collect();
        cycle.push(target.name.clone());
        return Err(ResolveError::CyclicDependency { cycle });
    }

    in_progress.push(&target.name);
    for dependency in &target.dependencies {
        visit(registry, dependency, in_progress, placed, ordered)?;
    }
    in_progress.pop();

    placed.insert(&target.name);
    ordered.push(target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ResolveError, resolve};
    use crate::registry::{Registry, RegistryError, Target};

    fn registry(targets: &[(&str, &[&str])]) -> Registry {
        let mut registry = Registry::default();
        for (name, dependencies) in targets {
            registry
                .define(Target {
                    name: name.to_string(),
                    dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
                    commands: Vec::new(),
                    workdir: None,
                })
                .expect("test targets should be unique");
        }
        registry
    }

    fn plan_names(registry: &Registry, requested: &str) -> Vec<String> {
        resolve(registry, requested)
            .expect("plan should resolve")
            .targets
            .into_iter()
            .map(|t| t.name)
            .collect()
    }

    #[test]
    fn dependencies_precede_dependents() {
        let registry = registry(&[("install", &[]), ("install_dev", &["install"])]);
        assert_eq!(plan_names(&registry, "install_dev"), vec!["install", "install_dev"]);
    }

    #[test]
    fn shared_dependencies_appear_once() {
        let registry = registry(&[
            ("base", &[]),
            ("lint", &["base"]),
            ("test", &["base"]),
            ("all", &["lint", "test"]),
        ]);
        let names = plan_names(&registry, "all");
        assert_eq!(names, vec!["base", "lint", "test", "all"]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let registry = registry(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["b", "a"]),
            ("d", &["c", "b"]),
        ]);
        let first = plan_names(&registry, "d");
        let second = plan_names(&registry, "d");
        assert_eq!(first, second);
        let position = |name: &str| first.iter().position(|n| n == name).unwrap();
        assert!(position("a") < position("b"));
        assert!(position("b") < position("c"));
        assert!(position("c") < position("d"));
    }

    #[test]
    fn standalone_target_resolves_to_itself() {
        let registry = registry(&[("lint", &[])]);
        assert_eq!(plan_names(&registry, "lint"), vec!["lint"]);
    }

    #[test]
    fn reports_cycles_by_path() {
        let registry = registry(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let err = resolve(&registry, "a").expect_err("cycle should be detected");
        match err {
            ResolveError::CyclicDependency { cycle } => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn detects_self_dependency() {
        let registry = registry(&[("loop", &["loop"])]);
        let err = resolve(&registry, "loop").expect_err("self-cycle should be detected");
        assert!(matches!(err, ResolveError::CyclicDependency { .. }));
    }

    #[test]
    fn unknown_dependency_surfaces_registry_error() {
        let registry = registry(&[("test", &["install"])]);
        let err = resolve(&registry, "test").expect_err("unknown dependency should fail");
        match err {
            ResolveError::Registry(RegistryError::UnknownTarget(name)) => {
                assert_eq!(name, "install");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_requested_target_fails_before_planning() {
        let registry = registry(&[("install", &[])]);
        let err = resolve(&registry, "deploy").expect_err("unknown target should fail");
        assert!(matches!(
            err,
            ResolveError::Registry(RegistryError::UnknownTarget(_))
        ));
    }
}
