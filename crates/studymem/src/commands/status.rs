use super::Context;

pub fn run(ctx: &Context, student_id: &str) -> anyhow::Result<()> {
    let engine = ctx.reader()?;
    let modules = engine.module_status(student_id)?;
    let output = serde_json::json!({
        "student_id": student_id,
        "compression_threshold": engine.config().compression_threshold,
        "modules": modules,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
