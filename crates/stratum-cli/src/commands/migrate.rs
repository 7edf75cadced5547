use super::Context;
use anyhow::{Context as _, Result};
use stratum_core::MigrationMode;

pub async fn run(context: &Context, workspace: &str, mode: MigrationMode) -> Result<()> {
    let service = context.migration_service()?;

    println!("🔄 Migrating workspace '{}' ({})...", workspace, mode);

    let report = match service.migrate(workspace, mode).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(workspace, mode = %mode, step = e.step_name(), "Upgrade aborted: {}", e);
            return Err(e).with_context(|| format!("Workspace '{}' was not upgraded", workspace));
        }
    };
    tracing::info!(
        workspace,
        mode = %mode,
        modules = report.modules_migrated.len(),
        hook_failures = report.hook_failures.len(),
        "Upgrade finished in {:?}",
        report.elapsed
    );

    for module in &report.modules_migrated {
        println!("  ✓ {}", module);
    }
    for failure in &report.hook_failures {
        println!("  ⚠ upgrade hook of '{}' failed: {}", failure.module, failure.error);
    }

    if report.is_clean() {
        println!(
            "✅ Workspace '{}' upgraded in {:.2?}",
            workspace, report.elapsed
        );
    } else {
        println!(
            "⚠️  Workspace '{}' upgraded in {:.2?} with {} hook failure(s)",
            workspace,
            report.elapsed,
            report.hook_failures.len()
        );
    }

    Ok(())
}
