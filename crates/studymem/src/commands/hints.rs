use super::Context;
use studymem_core::Module;

pub fn run(ctx: &Context, student_id: &str, module: Option<Module>) -> anyhow::Result<()> {
    let engine = ctx.reader()?;
    let hints = match module {
        Some(module) => engine.get_module_hints(student_id, module)?,
        None => engine.get_adaptive_hints(student_id)?,
    };
    let output = serde_json::json!({
        "student_id": student_id,
        "module": module.unwrap_or(Module::Reading),
        "hints": hints,
        "welcome": engine.welcome_message(student_id)?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
