//! Stage bookkeeping shared by the build, push and deploy stages.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Build,
    Login,
    Push,
    Deploy,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Build => "Build",
            Stage::Login => "Login",
            Stage::Push => "Push",
            Stage::Deploy => "Deploy",
        })
    }
}

/// One package's failure inside a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Package directory key
    pub package: String,
    /// What was attempted (build definition and image, image, or remote command)
    pub target: String,
    pub detail: String,
}

impl ItemFailure {
    pub fn new(
        package: impl Into<String>,
        target: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            target: target.into(),
            detail: detail.into(),
        }
    }
}

/// Per-item results of a fan-out stage.
#[derive(Debug, Clone)]
pub struct StageReport<T> {
    pub stage: Stage,
    pub succeeded: Vec<T>,
    pub failures: Vec<ItemFailure>,
}

impl<T> StageReport<T> {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            succeeded: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Successful items, or every collected failure if any item failed.
    pub fn into_result(self) -> Result<Vec<T>, StageFailure> {
        if self.failures.is_empty() {
            Ok(self.succeeded)
        } else {
            Err(StageFailure {
                stage: self.stage,
                failures: self.failures,
            })
        }
    }
}

/// A stage in which at least one item failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub failures: Vec<ItemFailure>,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.failures.len() == 1 {
            "package"
        } else {
            "packages"
        };
        write!(
            f,
            "{} failed for {} {}:",
            self.stage,
            self.failures.len(),
            noun
        )?;
        for failure in &self.failures {
            write!(
                f,
                "\n- {} ({}): {}",
                failure.package, failure.target, failure.detail
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for StageFailure {}
