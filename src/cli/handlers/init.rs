use crate::cli::commands::InitArgs;
use crate::io::config_io;

use super::{CmdResult, Context, finish};

/// Create the data directory, write config.toml and seed the task list.
pub fn cmd_init(ctx: &Context, args: InitArgs) -> CmdResult {
    std::fs::create_dir_all(&ctx.data_dir)?;

    let wrote_config = config_io::write_default_config(&ctx.data_dir, args.force)?;
    if !wrote_config {
        eprintln!(
            "config.toml already exists in {} (use --force to overwrite)",
            ctx.data_dir.display()
        );
    }

    // Re-read so a freshly written config is the one in effect
    let ctx = Context::at(ctx.data_dir.clone(), ctx.json)?;
    let had_document = ctx.document_path().exists();
    let session = ctx.open_session(false)?;
    finish(&ctx, session);

    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "data_dir": ctx.data_dir.display().to_string(),
                "config_written": wrote_config,
                "document_created": !had_document,
            })
        );
    } else if had_document {
        println!("task list already present at {}", ctx.document_path().display());
    } else {
        println!("initialized daylist in {}", ctx.data_dir.display());
    }
    Ok(())
}
