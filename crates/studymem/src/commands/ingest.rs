use super::Context;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use studymem_sessions::{append_jsonl, read_jsonl, SessionRecord, SessionSource};
use tracing::info;

#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub sessions: usize,
    pub skipped_in_progress: usize,
    /// Records identical to what the archive already holds
    pub already_archived: usize,
    /// "student/module" for every compression the batch triggered
    pub compressions: Vec<String>,
}

/// Archive the sessions in `file`, then run the completion hook for each
/// completed one in file order. Records already archived unchanged are not
/// appended again; a changed record (e.g. now completed) is.
pub async fn ingest(ctx: &Context, file: &Path, use_ai: bool) -> anyhow::Result<IngestReport> {
    if !file.exists() {
        anyhow::bail!("session file not found: {}", file.display());
    }
    let records: Vec<SessionRecord> = read_jsonl(file)?;

    let mut report = IngestReport::default();
    let archive = ctx.paths.sessions_path();
    let archived = ctx.archived_sessions()?;
    for record in &records {
        let known = archived.session(record.module(), record.student_id(), record.session_id());
        if known.as_ref() == Some(record) {
            report.already_archived += 1;
            continue;
        }
        append_jsonl(&archive, record)?;
        archived.insert(record.clone());
    }

    let engine = ctx.engine(Arc::new(archived), use_ai)?;
    for record in &records {
        if !record.is_complete() {
            report.skipped_in_progress += 1;
            continue;
        }
        report.sessions += 1;
        let student_id = record.student_id();
        let module = record.module();
        if engine
            .record_session(student_id, module, record.session_id())
            .await
            .is_some()
        {
            report.compressions.push(format!("{}/{}", student_id, module));
        }
    }

    info!(
        sessions = report.sessions,
        compressions = report.compressions.len(),
        "ingest finished"
    );
    Ok(report)
}

pub async fn run(ctx: &Context, file: &Path, use_ai: bool) -> anyhow::Result<()> {
    let report = ingest(ctx, file, use_ai).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
