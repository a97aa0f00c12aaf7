use super::Context;
use studymem_core::Module;

pub fn run(ctx: &Context, student_id: &str, module: Option<Module>) -> anyhow::Result<()> {
    let engine = ctx.reader()?;
    let output = match module {
        Some(module) => serde_json::to_value(engine.get_memory(student_id, module)?)?,
        None => match engine.memory_board(student_id)? {
            Some(board) => serde_json::to_value(board)?,
            None => serde_json::json!({
                "student_id": student_id,
                "memory": null,
            }),
        },
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
