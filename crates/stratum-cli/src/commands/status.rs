use super::Context;
use anyhow::Result;

pub async fn run(context: &Context, workspace: &str) -> Result<()> {
    let service = context.migration_service()?;
    let states = service.status(workspace).await?;

    println!("📋 Workspace '{}'", workspace);
    for (module, completed) in states.modules() {
        println!("  {} ({} completed)", module, completed.len());
        for step in completed.iter() {
            println!("    - {}", step);
        }
    }

    Ok(())
}
