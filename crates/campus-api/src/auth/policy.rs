// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Policy engine.
//!
//! Evaluates `(subject, resource, action)` requests with a Casbin enforcer
//! built from a model file and a CSV policy file.
//!
//! # Model file
//!
//! ```text
//! [request_definition]
//! r = sub, obj, act
//!
//! [policy_definition]
//! p = sub, obj, act
//!
//! [role_definition]
//! g = _, _
//!
//! [policy_effect]
//! e = some(where (p.eft == allow))
//!
//! [matchers]
//! m = g(r.sub, p.sub) && keyMatch2(r.obj, p.obj) && r.act == p.act
//! ```
//!
//! Any matcher the Casbin expression language accepts is allowed, including
//! the built-in `keyMatch`, `keyMatch2` and `regexMatch` functions.
//!
//! # Policy file
//!
//! ```text
//! p, admin, /api/users/*, GET
//! p, teacher, /teachers/:id/courses, GET
//! g, manager, staff
//! ```
//!
//! Rows are checked before they reach the enforcer: `p` rows need three
//! fields, `g` rows two, and any other row type is rejected with its line
//! number.
//!
//! # Concurrency
//!
//! The enforcer lives behind one async `RwLock`. Mutations take the write
//! lock; a reload builds a complete enforcer first and swaps it in, so
//! readers never see a partial change.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use casbin::{CoreApi, DefaultModel, Enforcer, MemoryAdapter, MgmtApi, RbacApi};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::error::PolicyError;

/// The model used when none is configured.
pub const DEFAULT_MODEL: &str = r#"[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && keyMatch2(r.obj, p.obj) && r.act == p.act
"#;

// =============================================================================
// Rules
// =============================================================================

/// A permission rule granting `action` on `object` to `subject`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Role (or user) the rule applies to.
    pub subject: String,
    /// Resource path or pattern.
    pub object: String,
    /// Action, e.g. an HTTP method.
    pub action: String,
}

impl PolicyRule {
    /// Creates a rule.
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
        }
    }

    fn params(&self) -> Vec<String> {
        vec![self.subject.clone(), self.object.clone(), self.action.clone()]
    }

    fn from_params(params: &[String]) -> Option<Self> {
        match params {
            [sub, obj, act, ..] => Some(Self::new(sub.as_str(), obj.as_str(), act.as_str())),
            _ => None,
        }
    }
}

/// A role assignment: `user` inherits every rule of `role`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// The inheriting subject.
    pub user: String,
    /// The inherited role.
    pub role: String,
}

impl RoleAssignment {
    fn params(&self) -> Vec<String> {
        vec![self.user.clone(), self.role.clone()]
    }

    fn from_params(params: &[String]) -> Option<Self> {
        match params {
            [user, role, ..] => Some(Self {
                user: user.clone(),
                role: role.clone(),
            }),
            _ => None,
        }
    }
}

// =============================================================================
// Policy file
// =============================================================================

/// Validated rows of a policy file, with their 1-based line numbers.
#[derive(Debug, Default)]
struct PolicyRows {
    rules: Vec<(usize, PolicyRule)>,
    assignments: Vec<(usize, RoleAssignment)>,
}

impl PolicyRows {
    fn parse(text: &str) -> Result<Self, PolicyError> {
        let mut rows = Self::default();
        let mut seen_rules = HashSet::new();
        let mut seen_assignments = HashSet::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.iter().any(|f| f.is_empty()) {
                return Err(PolicyError::line(idx + 1, "empty field"));
            }
            match fields.as_slice() {
                ["p", sub, obj, act] => {
                    let rule = PolicyRule::new(*sub, *obj, *act);
                    if seen_rules.insert(rule.clone()) {
                        rows.rules.push((idx + 1, rule));
                    }
                }
                ["g", user, role] => {
                    let assignment = RoleAssignment {
                        user: user.to_string(),
                        role: role.to_string(),
                    };
                    if seen_assignments.insert(assignment.clone()) {
                        rows.assignments.push((idx + 1, assignment));
                    }
                }
                ["p", ..] => {
                    return Err(PolicyError::line(idx + 1, "expected `p, sub, obj, act`"));
                }
                ["g", ..] => {
                    return Err(PolicyError::line(idx + 1, "expected `g, user, role`"));
                }
                [other, ..] => {
                    return Err(PolicyError::line(
                        idx + 1,
                        format!("unknown policy type `{other}`"),
                    ));
                }
                [] => {}
            }
        }

        Ok(rows)
    }
}

/// Builds a fully loaded enforcer from model and policy text.
async fn build_enforcer(model_text: &str, policy_text: &str) -> Result<Enforcer, PolicyError> {
    let rows = PolicyRows::parse(policy_text)?;

    let model = DefaultModel::from_str(model_text)
        .await
        .map_err(|e| PolicyError::model(e.to_string()))?;
    let mut enforcer = Enforcer::new(model, MemoryAdapter::default())
        .await
        .map_err(|e| PolicyError::model(e.to_string()))?;

    // Rows are unique here, so a `false` means the model has no slot for them.
    for (line, rule) in rows.rules {
        if !enforcer
            .add_policy(rule.params())
            .await
            .map_err(PolicyError::enforcer)?
        {
            return Err(PolicyError::line(line, "rule rejected by the model"));
        }
    }
    for (line, assignment) in rows.assignments {
        if !enforcer
            .add_grouping_policy(assignment.params())
            .await
            .map_err(PolicyError::enforcer)?
        {
            return Err(PolicyError::line(
                line,
                "role assignment but the model has no role definition",
            ));
        }
    }

    // Evaluate the matcher once so expression errors surface at load time.
    enforcer
        .enforce(("", "", ""))
        .map_err(|e| PolicyError::model(format!("matcher cannot be evaluated: {e}")))?;

    Ok(enforcer)
}

// =============================================================================
// PolicyEngine
// =============================================================================

/// Files a policy engine was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySource {
    /// Model definition path.
    pub model_path: PathBuf,
    /// Policy CSV path.
    pub policy_path: PathBuf,
}

/// Casbin-backed policy engine with runtime mutation and reload.
pub struct PolicyEngine {
    enforcer: RwLock<Enforcer>,
    source: Option<PolicySource>,
}

impl fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl PolicyEngine {
    /// Builds an engine from model and policy text.
    pub async fn from_strs(model: &str, policy: &str) -> Result<Self, PolicyError> {
        let enforcer = build_enforcer(model, policy).await?;
        info!(
            rules = enforcer.get_policy().len(),
            groupings = enforcer.get_grouping_policy().len(),
            "Policy loaded"
        );
        Ok(Self {
            enforcer: RwLock::new(enforcer),
            source: None,
        })
    }

    /// Loads an engine from a model file and a policy file.
    pub async fn from_files(
        model_path: impl AsRef<Path>,
        policy_path: impl AsRef<Path>,
    ) -> Result<Self, PolicyError> {
        let source = PolicySource {
            model_path: model_path.as_ref().to_path_buf(),
            policy_path: policy_path.as_ref().to_path_buf(),
        };
        let (model, policy) = read_source(&source).await?;
        let mut engine = Self::from_strs(&model, &policy).await?;
        engine.source = Some(source);
        Ok(engine)
    }

    /// Re-reads the backing files and swaps the enforcer in one step.
    ///
    /// On error the current enforcer is kept.
    pub async fn reload(&self) -> Result<(), PolicyError> {
        let source = self.source.as_ref().ok_or(PolicyError::NoSource)?;
        let (model, policy) = read_source(source).await?;
        let enforcer = build_enforcer(&model, &policy).await?;
        let rules = enforcer.get_policy().len();
        *self.enforcer.write().await = enforcer;
        info!(rules, "Policy reloaded");
        Ok(())
    }

    /// Returns `true` if the model allows `action` on `object` for `subject`.
    ///
    /// Evaluation errors deny.
    pub async fn enforce(&self, subject: &str, object: &str, action: &str) -> bool {
        let decision = self.enforcer.read().await.enforce((subject, object, action));
        match decision {
            Ok(allowed) => {
                debug!(subject, object, action, allowed, "Policy decision");
                allowed
            }
            Err(e) => {
                warn!(subject, object, action, error = %e, "Policy evaluation failed");
                false
            }
        }
    }

    /// Adds a rule. Returns `false` if it already existed.
    pub async fn add_rule(&self, rule: PolicyRule) -> Result<bool, PolicyError> {
        let added = self
            .enforcer
            .write()
            .await
            .add_policy(rule.params())
            .await
            .map_err(PolicyError::enforcer)?;
        if added {
            info!(subject = %rule.subject, object = %rule.object, action = %rule.action, "Policy rule added");
        }
        Ok(added)
    }

    /// Removes a rule. Returns `false` if it did not exist.
    pub async fn remove_rule(&self, rule: &PolicyRule) -> Result<bool, PolicyError> {
        let removed = self
            .enforcer
            .write()
            .await
            .remove_policy(rule.params())
            .await
            .map_err(PolicyError::enforcer)?;
        if removed {
            info!(subject = %rule.subject, object = %rule.object, action = %rule.action, "Policy rule removed");
        }
        Ok(removed)
    }

    /// Assigns `role` to `user`. Returns `false` if already assigned.
    pub async fn assign_role(&self, user: &str, role: &str) -> Result<bool, PolicyError> {
        let added = self
            .enforcer
            .write()
            .await
            .add_grouping_policy(vec![user.to_string(), role.to_string()])
            .await
            .map_err(PolicyError::enforcer)?;
        if added {
            info!(user, role, "Role assigned");
        }
        Ok(added)
    }

    /// Removes `role` from `user`. Returns `false` if it was not assigned.
    pub async fn unassign_role(&self, user: &str, role: &str) -> Result<bool, PolicyError> {
        let removed = self
            .enforcer
            .write()
            .await
            .remove_grouping_policy(vec![user.to_string(), role.to_string()])
            .await
            .map_err(PolicyError::enforcer)?;
        if removed {
            info!(user, role, "Role unassigned");
        }
        Ok(removed)
    }

    /// Returns all rules, sorted.
    pub async fn rules(&self) -> Vec<PolicyRule> {
        let mut rules: Vec<PolicyRule> = self
            .enforcer
            .read()
            .await
            .get_policy()
            .iter()
            .filter_map(|p| PolicyRule::from_params(p))
            .collect();
        rules.sort();
        rules
    }

    /// Returns all role assignments, sorted.
    pub async fn role_assignments(&self) -> Vec<RoleAssignment> {
        let mut assignments: Vec<RoleAssignment> = self
            .enforcer
            .read()
            .await
            .get_grouping_policy()
            .iter()
            .filter_map(|g| RoleAssignment::from_params(g))
            .collect();
        assignments.sort();
        assignments
    }

    /// Returns the roles `user` holds, directly or transitively.
    pub async fn roles_for(&self, user: &str) -> Vec<String> {
        let mut roles: Vec<String> = self
            .enforcer
            .write()
            .await
            .get_implicit_roles_for_user(user, None)
            .into_iter()
            .filter(|r| r != user)
            .collect();
        roles.sort();
        roles.dedup();
        roles
    }

    /// Returns the backing files, if loaded from disk.
    pub fn source(&self) -> Option<&PolicySource> {
        self.source.as_ref()
    }
}

async fn read_source(source: &PolicySource) -> Result<(String, String), PolicyError> {
    async fn read(path: &Path) -> Result<String, PolicyError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PolicyError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }
    Ok((read(&source.model_path).await?, read(&source.policy_path).await?))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const POLICY: &str = "\
p, admin, /api/users, GET
p, admin, /api/users/:id, DELETE
p, teacher, /teachers/:id/courses, GET
p, staff, /reports/*, GET
g, manager, staff
g, admin, manager
";

    async fn engine() -> PolicyEngine {
        PolicyEngine::from_strs(DEFAULT_MODEL, POLICY).await.unwrap()
    }

    #[tokio::test]
    async fn test_enforce_direct_and_pattern() {
        let engine = engine().await;
        assert!(engine.enforce("admin", "/api/users", "GET").await);
        assert!(engine.enforce("admin", "/api/users/7", "DELETE").await);
        assert!(!engine.enforce("admin", "/api/users/7", "GET").await);
        assert!(!engine.enforce("admin", "/api/users/7/marks", "DELETE").await);
        assert!(engine.enforce("teacher", "/teachers/abc/courses", "GET").await);
        assert!(!engine.enforce("teacher", "/api/users", "GET").await);
        assert!(!engine.enforce("student", "/teachers/abc/courses", "GET").await);
    }

    #[tokio::test]
    async fn test_wildcard_suffix() {
        let engine = engine().await;
        assert!(engine.enforce("staff", "/reports/2024/q1", "GET").await);
        assert!(!engine.enforce("staff", "/reports", "GET").await);
    }

    #[tokio::test]
    async fn test_transitive_roles() {
        let engine = engine().await;
        assert!(engine.enforce("manager", "/reports/x", "GET").await);
        assert!(engine.enforce("admin", "/reports/x", "GET").await);
        assert!(!engine.enforce("teacher", "/reports/x", "GET").await);
        assert_eq!(engine.roles_for("admin").await, vec!["manager", "staff"]);
        assert!(engine.roles_for("teacher").await.is_empty());
    }

    #[tokio::test]
    async fn test_role_cycle_terminates() {
        let engine = engine().await;
        assert!(engine.assign_role("staff", "admin").await.unwrap());
        assert!(engine.enforce("staff", "/api/users", "GET").await);
        assert!(engine.enforce("manager", "/api/users", "GET").await);
        assert_eq!(engine.roles_for("staff").await, vec!["admin", "manager"]);
    }

    #[tokio::test]
    async fn test_add_remove_rule() {
        let engine = engine().await;
        let rule = PolicyRule::new("student", "/courses", "GET");

        assert!(!engine.enforce("student", "/courses", "GET").await);
        assert!(engine.add_rule(rule.clone()).await.unwrap());
        assert!(!engine.add_rule(rule.clone()).await.unwrap());
        assert!(engine.enforce("student", "/courses", "GET").await);
        assert!(engine.rules().await.contains(&rule));

        assert!(engine.remove_rule(&rule).await.unwrap());
        assert!(!engine.remove_rule(&rule).await.unwrap());
        assert!(!engine.enforce("student", "/courses", "GET").await);
    }

    #[tokio::test]
    async fn test_assign_unassign_role() {
        let engine = engine().await;
        assert!(!engine.enforce("teacher", "/reports/x", "GET").await);

        assert!(engine.assign_role("teacher", "staff").await.unwrap());
        assert!(engine.enforce("teacher", "/reports/x", "GET").await);

        assert!(engine.unassign_role("teacher", "staff").await.unwrap());
        assert!(!engine.unassign_role("teacher", "staff").await.unwrap());
        assert!(!engine.enforce("teacher", "/reports/x", "GET").await);
    }

    #[tokio::test]
    async fn test_listings_are_sorted() {
        let engine = engine().await;
        let rules = engine.rules().await;
        assert_eq!(rules.len(), 4);
        assert!(rules.windows(2).all(|w| w[0] <= w[1]));

        let assignments = engine.role_assignments().await;
        assert_eq!(
            assignments,
            vec![
                RoleAssignment {
                    user: "admin".into(),
                    role: "manager".into()
                },
                RoleAssignment {
                    user: "manager".into(),
                    role: "staff".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_exact_model_without_roles() {
        let model = DEFAULT_MODEL
            .replace("[role_definition]\ng = _, _\n", "")
            .replace("g(r.sub, p.sub)", "r.sub == p.sub")
            .replace("keyMatch2(r.obj, p.obj)", "r.obj == p.obj");
        let engine = PolicyEngine::from_strs(&model, "p, admin, /api/users/:id, GET\n")
            .await
            .unwrap();

        assert!(engine.enforce("admin", "/api/users/:id", "GET").await);
        assert!(!engine.enforce("admin", "/api/users/1", "GET").await);

        assert!(PolicyEngine::from_strs(&model, "g, a, b\n").await.is_err());
    }

    #[tokio::test]
    async fn test_regex_action_matcher() {
        let model = DEFAULT_MODEL.replace("r.act == p.act", "regexMatch(r.act, p.act)");
        let engine = PolicyEngine::from_strs(&model, "p, admin, /api/users, (GET)|(POST)\n")
            .await
            .unwrap();

        assert!(engine.enforce("admin", "/api/users", "GET").await);
        assert!(engine.enforce("admin", "/api/users", "POST").await);
        assert!(!engine.enforce("admin", "/api/users", "DELETE").await);
    }

    #[tokio::test]
    async fn test_malformed_policy_line() {
        let err = PolicyEngine::from_strs(DEFAULT_MODEL, "p, admin, /x\n")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::Policy { line: 1, .. }));

        let err = PolicyEngine::from_strs(DEFAULT_MODEL, "# comment\n\nx, a, b, c\n")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::Policy { line: 3, .. }));

        let err = PolicyEngine::from_strs(DEFAULT_MODEL, "p, admin, , GET\n")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::Policy { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_rows_collapse() {
        let engine = PolicyEngine::from_strs(DEFAULT_MODEL, "p, a, /x, GET\np, a, /x, GET\n")
            .await
            .unwrap();
        assert_eq!(engine.rules().await.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_model() {
        let err = PolicyEngine::from_strs("[request_definition]\nr = sub, obj\n", "")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::Model(_)));

        let broken = DEFAULT_MODEL.replace("r.act == p.act", "(r.act ==");
        let err = PolicyEngine::from_strs(&broken, "p, admin, /x, GET\n")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::Model(_)));
    }

    #[tokio::test]
    async fn test_reload_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.conf");
        let policy_path = dir.path().join("policy.csv");
        std::fs::write(&model_path, DEFAULT_MODEL).unwrap();
        std::fs::write(&policy_path, "p, admin, /a, GET\n").unwrap();

        let engine = PolicyEngine::from_files(&model_path, &policy_path)
            .await
            .unwrap();
        assert!(engine.enforce("admin", "/a", "GET").await);
        assert!(!engine.enforce("admin", "/b", "GET").await);

        let mut f = std::fs::OpenOptions::new()
            .append(true)
            .open(&policy_path)
            .unwrap();
        writeln!(f, "p, admin, /b, GET").unwrap();
        engine.reload().await.unwrap();
        assert!(engine.enforce("admin", "/b", "GET").await);

        // A broken file keeps the previous rules.
        std::fs::write(&policy_path, "p, broken\n").unwrap();
        assert!(engine.reload().await.is_err());
        assert!(engine.enforce("admin", "/b", "GET").await);
    }

    #[tokio::test]
    async fn test_reload_without_source() {
        assert!(matches!(
            engine().await.reload().await,
            Err(PolicyError::NoSource)
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = PolicyEngine::from_files("/nonexistent/model.conf", "/nonexistent/p.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::Io { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mutation_visible_to_concurrent_readers() {
        let engine = Arc::new(engine().await);
        let stop = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let stop = Arc::clone(&stop);
                tokio::spawn(async move {
                    while !stop.load(Ordering::Relaxed) {
                        // Existing rules are never disturbed by unrelated writes.
                        assert!(engine.enforce("admin", "/api/users", "GET").await);
                        let _ = engine.enforce("student", "/dyn", "POST").await;
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        let rule = PolicyRule::new("student", "/dyn", "POST");
        for _ in 0..100 {
            engine.add_rule(rule.clone()).await.unwrap();
            assert!(engine.enforce("student", "/dyn", "POST").await);
            engine.remove_rule(&rule).await.unwrap();
            assert!(!engine.enforce("student", "/dyn", "POST").await);
        }

        stop.store(true, Ordering::Relaxed);
        for r in readers {
            r.await.unwrap();
        }
    }
}
