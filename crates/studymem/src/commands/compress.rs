use super::Context;
use std::sync::Arc;
use studymem_core::Module;

pub async fn run(ctx: &Context, student_id: &str, module: Module, use_ai: bool) -> anyhow::Result<()> {
    let engine = ctx.engine(Arc::new(ctx.archived_sessions()?), use_ai)?;

    match engine.compress(student_id, module, use_ai).await? {
        Some(payload) => println!("{}", serde_json::to_string_pretty(&payload)?),
        None => println!(
            "{}",
            serde_json::json!({
                "module": module,
                "compressed": false,
                "reason": "no uncompressed insights",
            })
        ),
    }
    Ok(())
}
