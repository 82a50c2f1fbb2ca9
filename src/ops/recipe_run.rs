//! The full recipe: fetch, patch, build, package, publish.

use std::time::Instant;

use anyhow::Result;
use serde::Serialize;

use crate::builder::patch::{apply_rules, check_rules, MissPolicy, PatchMiss, PatchReport};
use crate::builder::{BuildPlan, BuildSteps, RecipeContext};
use crate::core::cpp_info::CppInfo;
use crate::ops::package::{package, PackageReport};
use crate::ops::package_info::publish;
use crate::sources::download::Downloader;
use crate::sources::tarball::{fetch_source, FetchOptions, Fetched};
use crate::util::process::CommandRunner;
use crate::util::shell::{format_duration, Shell, Status};

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub plan: BuildPlan,
    pub from_cache: bool,
    pub patch: PatchReport,
    pub package: PackageReport,
    pub cpp_info: CppInfo,
}

/// Fetch and extract the pinned sources for `ctx`.
pub fn fetch(
    ctx: &RecipeContext,
    opts: &FetchOptions,
    downloader: &dyn Downloader,
    shell: &Shell,
) -> Result<Fetched> {
    fetch_source(&ctx.archive, opts, &ctx.build_dir, downloader, shell)
}

/// Apply the plan's patch rules to the extracted sources.
pub fn patch(plan: &BuildPlan, ctx: &RecipeContext, shell: &Shell) -> Result<PatchReport> {
    let rules = plan.patch_rules(ctx)?;
    shell.status(
        Status::Patching,
        format!("{} rules ({} plan)", rules.len(), plan.name()),
    );

    let report = apply_rules(&ctx.source_dir(), &rules, ctx.miss_policy)?;
    if !report.misses.is_empty() && ctx.miss_policy == MissPolicy::Warn {
        shell.warn(format!(
            "{} patch rule(s) matched nothing; upstream sources may have drifted",
            report.misses.len()
        ));
    }
    Ok(report)
}

/// Report the plan's rules that would miss on the extracted sources.
pub fn check_patch(plan: &BuildPlan, ctx: &RecipeContext) -> Result<Vec<PatchMiss>> {
    let rules = plan.patch_rules(ctx)?;
    check_rules(&ctx.source_dir(), &rules)
}

/// Run every step in order. The first failure aborts the run; the working
/// directories are left as they are.
pub fn run_recipe(
    ctx: &RecipeContext,
    fetch_opts: &FetchOptions,
    downloader: &dyn Downloader,
    runner: &dyn CommandRunner,
    shell: &Shell,
) -> Result<RunReport> {
    let start = Instant::now();
    let mut plan = BuildPlan::select(&ctx.settings);

    shell.note(format!(
        "{} {} ({} {} {}, {:?}, {} plan)",
        ctx.archive.name,
        ctx.archive.version,
        ctx.settings.os,
        ctx.settings.compiler,
        ctx.settings.arch,
        ctx.linkage(),
        plan.name()
    ));

    let fetched = fetch(ctx, fetch_opts, downloader, shell)?;
    let patch_report = patch(&plan, ctx, shell)?;

    shell.status(Status::Configuring, ctx.source_dir().display());
    plan.configure(ctx, runner)?;

    shell.status(Status::Building, format!("{} (-j{})", ctx.archive.name, ctx.jobs));
    plan.build(ctx, runner)?;

    let package_report = package(&plan, ctx, runner, shell)?;
    let cpp_info = publish(ctx)?;
    shell.status(
        Status::Packaged,
        format!("{} -> {}", cpp_info.libs.join(", "), ctx.package_dir().display()),
    );

    shell.status(
        Status::Finished,
        format!("mpdecimal in {}", format_duration(start.elapsed())),
    );

    Ok(RunReport {
        plan,
        from_cache: fetched.from_cache,
        patch: patch_report,
        package: package_report,
        cpp_info,
    })
}
