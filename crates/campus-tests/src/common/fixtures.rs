// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built accounts, courses and configuration text.
//!
//! The policy fixtures are the files shipped in `config/`, so the integration
//! suites exercise the same rules an operator starts from.

use campus_api::auth::{PasswordHasher, TokenConfig};
use campus_core::{NewCourse, NewUser, Role};

// =============================================================================
// Secrets and Files
// =============================================================================

/// Access token secret used by the harness.
pub const ACCESS_SECRET: &str = "integration-access-secret-0123456789abcdef";

/// Refresh token secret used by the harness.
pub const REFRESH_SECRET: &str = "integration-refresh-secret-0123456789abcdef";

/// The shipped policy model.
pub const POLICY_MODEL: &str = include_str!("../../../../config/rbac_model.conf");

/// The shipped policy rules.
pub const POLICY_CSV: &str = include_str!("../../../../config/rbac_policy.csv");

/// The shipped sample configuration.
pub const SAMPLE_CONFIG: &str = include_str!("../../../../config/campus.yaml");

/// Token settings with the harness secrets and default lifetimes.
pub fn token_config() -> TokenConfig {
    TokenConfig::new(ACCESS_SECRET, REFRESH_SECRET)
}

/// A cheap Argon2id hasher.
pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::for_testing()
}

// =============================================================================
// Account Fixtures
// =============================================================================

/// A seeded account with its plaintext password.
#[derive(Debug, Clone)]
pub struct AccountFixture {
    /// Login name.
    pub username: &'static str,
    /// Plaintext password.
    pub password: &'static str,
    /// Assigned role.
    pub role: Role,
}

impl AccountFixture {
    /// Hashes the password and builds the store record.
    pub fn to_new_user(&self, hasher: &PasswordHasher) -> NewUser {
        let hash = hasher.hash(self.password).expect("hashing failed");
        NewUser::new(self.username, hash, self.role)
            .with_name(self.username, "Fixture")
            .with_email(format!("{}@campus.example", self.username))
    }
}

/// Standard accounts, one per role plus a second student.
pub struct AccountFixtures;

impl AccountFixtures {
    /// Administrator.
    pub fn root() -> AccountFixture {
        AccountFixture {
            username: "root",
            password: "root-password",
            role: Role::Admin,
        }
    }

    /// Manager.
    pub fn maria() -> AccountFixture {
        AccountFixture {
            username: "maria",
            password: "manager-password",
            role: Role::Manager,
        }
    }

    /// Teacher whose password is `secret`.
    pub fn alice() -> AccountFixture {
        AccountFixture {
            username: "alice",
            password: "secret",
            role: Role::Teacher,
        }
    }

    /// A second teacher.
    pub fn tom() -> AccountFixture {
        AccountFixture {
            username: "tom",
            password: "teacher-password",
            role: Role::Teacher,
        }
    }

    /// Student.
    pub fn bob() -> AccountFixture {
        AccountFixture {
            username: "bob",
            password: "hunter2",
            role: Role::Student,
        }
    }

    /// A second student.
    pub fn carol() -> AccountFixture {
        AccountFixture {
            username: "carol",
            password: "carol-password",
            role: Role::Student,
        }
    }

    /// Every standard account.
    pub fn all() -> Vec<AccountFixture> {
        vec![
            Self::root(),
            Self::maria(),
            Self::alice(),
            Self::tom(),
            Self::bob(),
            Self::carol(),
        ]
    }
}

// =============================================================================
// Course Fixtures
// =============================================================================

/// Standard courses.
pub struct CourseFixtures;

impl CourseFixtures {
    /// A five-credit algebra course.
    pub fn algebra() -> NewCourse {
        NewCourse {
            name: "Linear Algebra".to_string(),
            code: "MATH101".to_string(),
            faculty: "Science".to_string(),
            description: Some("Vectors, matrices and linear maps".to_string()),
            credits: 5,
        }
    }

    /// A three-credit history course.
    pub fn history() -> NewCourse {
        NewCourse {
            name: "World History".to_string(),
            code: "HIST110".to_string(),
            faculty: "Humanities".to_string(),
            description: None,
            credits: 3,
        }
    }
}

// =============================================================================
// Configuration Fixtures
// =============================================================================

/// A minimal YAML configuration with both secrets set.
pub fn minimal_yaml() -> String {
    format!(
        r#"
security:
  tokens:
    access:
      secret: "{ACCESS_SECRET}"
    refresh:
      secret: "{REFRESH_SECRET}"
"#
    )
}

/// A YAML configuration that enables the policy engine with the given files.
pub fn policy_yaml(model_path: &str, policy_path: &str) -> String {
    format!(
        r#"{}
policy:
  enabled: true
  model_path: "{model_path}"
  policy_path: "{policy_path}"
"#,
        minimal_yaml()
    )
}
