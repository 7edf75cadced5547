use super::Context;
use anyhow::Result;

pub fn run(context: &Context) -> Result<()> {
    let path = context.config_service.path();
    let source = if path.exists() { "" } else { " (not found, defaults)" };

    println!("# config: {}{}", path.display(), source);
    println!("# data root: {}", context.data_root.display());
    print!("{}", context.config_service.render(&context.config)?);

    Ok(())
}
