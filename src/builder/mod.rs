//! Build plans.
//!
//! A [`BuildPlan`] is selected once from the settings. Each plan knows its
//! patch rules and how to configure, build and install; the rest of the
//! pipeline never branches on the compiler again.

pub mod autotools;
pub mod context;
pub mod nmake;
pub mod patch;
pub mod vcvars;

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::core::settings::Settings;
use crate::util::process::CommandRunner;

pub use autotools::{AutotoolsPlan, ConfigureShell};
pub use context::RecipeContext;
pub use nmake::NmakePlan;
pub use patch::{apply_rules, check_rules, MissPolicy, PatchMiss, PatchReport, PatchRule};

/// Files touched by an install step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallOutcome {
    /// Files copied into the package by copy rules.
    pub copied: Vec<PathBuf>,
    /// Files deleted because they belong to the other linkage.
    pub pruned: Vec<PathBuf>,
}

/// The operations every build plan provides.
pub trait BuildSteps {
    /// Substitutions to apply to the pristine sources, in order.
    fn patch_rules(&self, ctx: &RecipeContext) -> Result<Vec<PatchRule>>;

    /// Prepare the build. May capture state needed by later steps.
    fn configure(&mut self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<()>;

    fn build(&self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<()>;

    /// Populate the package directory from the build output.
    fn install(&self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<InstallOutcome>;
}

/// How the library gets built for a given configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BuildPlan {
    Autotools(AutotoolsPlan),
    Nmake(NmakePlan),
}

impl BuildPlan {
    /// Visual Studio goes through nmake, everything else through autotools.
    pub fn select(settings: &Settings) -> Self {
        if settings.is_msvc() {
            BuildPlan::Nmake(NmakePlan::default())
        } else {
            BuildPlan::Autotools(AutotoolsPlan::new(settings))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuildPlan::Autotools(_) => "autotools",
            BuildPlan::Nmake(_) => "nmake",
        }
    }

    fn steps(&self) -> &dyn BuildSteps {
        match self {
            BuildPlan::Autotools(plan) => plan,
            BuildPlan::Nmake(plan) => plan,
        }
    }

    fn steps_mut(&mut self) -> &mut dyn BuildSteps {
        match self {
            BuildPlan::Autotools(plan) => plan,
            BuildPlan::Nmake(plan) => plan,
        }
    }
}

impl BuildSteps for BuildPlan {
    fn patch_rules(&self, ctx: &RecipeContext) -> Result<Vec<PatchRule>> {
        self.steps().patch_rules(ctx)
    }

    fn configure(&mut self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<()> {
        self.steps_mut().configure(ctx, runner)
    }

    fn build(&self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<()> {
        self.steps().build(ctx, runner)
    }

    fn install(&self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<InstallOutcome> {
        self.steps().install(ctx, runner)
    }
}
