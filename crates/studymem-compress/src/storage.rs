use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use studymem_core::{Insight, Module};
use studymem_learn::{CompressedPayload, MemoryBoard, ModuleSlot, OverallPatterns};

/// Result of appending an insight
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// New row; the module counter was incremented
    Inserted(Insight),
    /// The session already had an insight; nothing changed
    Existing(Insight),
}

impl AppendOutcome {
    pub fn insight(&self) -> &Insight {
        match self {
            AppendOutcome::Inserted(i) | AppendOutcome::Existing(i) => i,
        }
    }

    pub fn into_insight(self) -> Insight {
        match self {
            AppendOutcome::Inserted(i) | AppendOutcome::Existing(i) => i,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, AppendOutcome::Inserted(_))
    }
}

/// Insight log plus one memory board per student
pub struct MemoryDb {
    conn: Connection,
}

impl MemoryDb {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS insights (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id TEXT NOT NULL,
                module TEXT NOT NULL,
                session_id TEXT NOT NULL,
                observations TEXT NOT NULL,
                is_compressed INTEGER NOT NULL DEFAULT 0,
                compressed_at TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (student_id, module, session_id)
            );
            CREATE INDEX IF NOT EXISTS idx_insights_pending
                ON insights(student_id, module, is_compressed);
            CREATE TABLE IF NOT EXISTS memory_boards (
                student_id TEXT PRIMARY KEY,
                overall_patterns TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS memory_slots (
                student_id TEXT NOT NULL,
                module TEXT NOT NULL,
                payload TEXT NOT NULL,
                last_compressed_at TEXT,
                sessions_since_compression INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (student_id, module)
            );
            CREATE TRIGGER IF NOT EXISTS insights_compression_one_way
            BEFORE UPDATE OF is_compressed ON insights
            WHEN OLD.is_compressed = 1 AND NEW.is_compressed = 0
            BEGIN
                SELECT RAISE(ABORT, 'compressed insights cannot be reopened');
            END;
            CREATE TRIGGER IF NOT EXISTS insights_content_immutable
            BEFORE UPDATE OF student_id, module, session_id, observations, created_at ON insights
            BEGIN
                SELECT RAISE(ABORT, 'insight content is immutable');
            END;
            CREATE TRIGGER IF NOT EXISTS insights_append_only
            BEFORE DELETE ON insights
            BEGIN
                SELECT RAISE(ABORT, 'insights are append-only');
            END;
            ",
        )?;
        Ok(())
    }

    /// Store an insight and count it toward the next compression, in one
    /// transaction. A session that already has an insight is left untouched.
    pub fn append_insight(&mut self, insight: &Insight) -> Result<AppendOutcome> {
        let student_id = insight.student_id();
        let module = insight.module();

        let tx = self.conn.transaction()?;
        Self::ensure_board(&tx, student_id, insight.created_at())?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO insights (student_id, module, session_id, observations, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                student_id,
                module.as_str(),
                insight.session_id(),
                serde_json::to_string(insight.observations())?,
                insight.created_at().to_rfc3339(),
            ],
        )? == 1;

        if !inserted {
            let existing = Self::find(&tx, student_id, module, insight.session_id())?
                .ok_or_else(|| anyhow!("insight for session {} vanished", insight.session_id()))?;
            tx.commit()?;
            return Ok(AppendOutcome::Existing(existing));
        }

        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE memory_slots SET sessions_since_compression = sessions_since_compression + 1
             WHERE student_id = ?1 AND module = ?2",
            params![student_id, module.as_str()],
        )?;
        tx.commit()?;
        Ok(AppendOutcome::Inserted(insight.clone().with_id(id)))
    }

    pub fn find_insight(
        &self,
        student_id: &str,
        module: Module,
        session_id: &str,
    ) -> Result<Option<Insight>> {
        Self::find(&self.conn, student_id, module, session_id)
    }

    /// Insights not yet consumed by a compression, oldest first
    pub fn uncompressed_insights(&self, student_id: &str, module: Module) -> Result<Vec<Insight>> {
        self.query_insights(
            "SELECT id, student_id, session_id, observations, compressed_at, created_at
             FROM insights
             WHERE student_id = ?1 AND module = ?2 AND is_compressed = 0
             ORDER BY created_at, id",
            student_id,
            module,
        )
    }

    /// Full insight log of a module, oldest first
    pub fn insights(&self, student_id: &str, module: Module) -> Result<Vec<Insight>> {
        self.query_insights(
            "SELECT id, student_id, session_id, observations, compressed_at, created_at
             FROM insights
             WHERE student_id = ?1 AND module = ?2
             ORDER BY created_at, id",
            student_id,
            module,
        )
    }

    /// Counter driving the compression trigger; 0 for unknown students
    pub fn sessions_since_compression(&self, student_id: &str, module: Module) -> Result<usize> {
        let count: Option<i64> = self
            .conn
            .query_row(
                "SELECT sessions_since_compression FROM memory_slots
                 WHERE student_id = ?1 AND module = ?2",
                params![student_id, module.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0).max(0) as usize)
    }

    /// Read a student's board without creating it
    pub fn board(&self, student_id: &str) -> Result<Option<MemoryBoard>> {
        Self::read_board(&self.conn, student_id)
    }

    /// Apply a compression in one transaction: module slot payload,
    /// `last_compressed_at`, counter reset, overall patterns and the
    /// compressed flag on every consumed insight. Rolls back unless each id
    /// flips from uncompressed exactly once.
    pub fn commit_compression(
        &mut self,
        student_id: &str,
        payload: &CompressedPayload,
        insight_ids: &[i64],
        at: DateTime<Utc>,
    ) -> Result<MemoryBoard> {
        let module = payload.module();
        let at_str = at.to_rfc3339();

        let tx = self.conn.transaction()?;
        Self::ensure_board(&tx, student_id, at)?;
        let mut board = Self::read_board(&tx, student_id)?
            .ok_or_else(|| anyhow!("memory board for {} missing", student_id))?;

        let mut marked = 0;
        for id in insight_ids {
            marked += tx.execute(
                "UPDATE insights SET is_compressed = 1, compressed_at = ?1
                 WHERE id = ?2 AND student_id = ?3 AND module = ?4 AND is_compressed = 0",
                params![at_str, id, student_id, module.as_str()],
            )?;
        }
        if marked != insight_ids.len() {
            // Dropping the transaction rolls every write back
            bail!(
                "compression batch for {}/{} changed: marked {} of {} insights",
                student_id,
                module,
                marked,
                insight_ids.len()
            );
        }

        // Insights appended while the batch was being built stay pending
        let pending: i64 = tx.query_row(
            "SELECT COUNT(*) FROM insights
             WHERE student_id = ?1 AND module = ?2 AND is_compressed = 0",
            params![student_id, module.as_str()],
            |row| row.get(0),
        )?;

        board.apply_compression(payload.clone(), at);
        board.restore_slot(
            module,
            ModuleSlot {
                payload: payload.clone(),
                last_compressed_at: Some(at),
                sessions_since_compression: pending as usize,
            },
        );

        tx.execute(
            "UPDATE memory_slots
             SET payload = ?3, last_compressed_at = ?4, sessions_since_compression = ?5
             WHERE student_id = ?1 AND module = ?2",
            params![
                student_id,
                module.as_str(),
                serde_json::to_string(payload)?,
                at_str,
                pending,
            ],
        )?;
        tx.execute(
            "UPDATE memory_boards SET overall_patterns = ?2, updated_at = ?3 WHERE student_id = ?1",
            params![
                student_id,
                serde_json::to_string(&board.overall_patterns)?,
                at_str,
            ],
        )?;
        tx.commit()?;
        Ok(board)
    }

    fn ensure_board(conn: &Connection, student_id: &str, now: DateTime<Utc>) -> Result<()> {
        let now = now.to_rfc3339();
        conn.execute(
            "INSERT OR IGNORE INTO memory_boards (student_id, overall_patterns, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![
                student_id,
                serde_json::to_string(&OverallPatterns::default())?,
                now
            ],
        )?;
        for module in Module::ALL {
            conn.execute(
                "INSERT OR IGNORE INTO memory_slots (student_id, module, payload)
                 VALUES (?1, ?2, ?3)",
                params![
                    student_id,
                    module.as_str(),
                    serde_json::to_string(&CompressedPayload::empty(module))?
                ],
            )?;
        }
        Ok(())
    }

    fn read_board(conn: &Connection, student_id: &str) -> Result<Option<MemoryBoard>> {
        let header: Option<(String, String)> = conn
            .query_row(
                "SELECT overall_patterns, created_at FROM memory_boards WHERE student_id = ?1",
                params![student_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((overall, created_at)) = header else {
            return Ok(None);
        };

        let mut board = MemoryBoard::new(student_id, created_at.parse()?);
        board.overall_patterns = serde_json::from_str(&overall)?;

        let mut stmt = conn.prepare(
            "SELECT payload, last_compressed_at, sessions_since_compression
             FROM memory_slots WHERE student_id = ?1",
        )?;
        let mut rows = stmt.query(params![student_id])?;
        while let Some(row) = rows.next()? {
            let payload: CompressedPayload = serde_json::from_str(&row.get::<_, String>(0)?)?;
            let last_compressed_at = row
                .get::<_, Option<String>>(1)?
                .map(|s| s.parse::<DateTime<Utc>>())
                .transpose()?;
            let sessions: i64 = row.get(2)?;
            board.restore_slot(
                payload.module(),
                ModuleSlot {
                    payload,
                    last_compressed_at,
                    sessions_since_compression: sessions.max(0) as usize,
                },
            );
        }
        Ok(Some(board))
    }

    fn find(
        conn: &Connection,
        student_id: &str,
        module: Module,
        session_id: &str,
    ) -> Result<Option<Insight>> {
        let mut stmt = conn.prepare(
            "SELECT id, student_id, session_id, observations, compressed_at, created_at
             FROM insights
             WHERE student_id = ?1 AND module = ?2 AND session_id = ?3",
        )?;
        let mut rows = stmt.query(params![student_id, module.as_str(), session_id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_insight(row)?))
        } else {
            Ok(None)
        }
    }

    fn query_insights(&self, sql: &str, student_id: &str, module: Module) -> Result<Vec<Insight>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params![student_id, module.as_str()])?;
        let mut insights = Vec::new();
        while let Some(row) = rows.next()? {
            insights.push(Self::row_to_insight(row)?);
        }
        Ok(insights)
    }

    fn row_to_insight(row: &rusqlite::Row) -> Result<Insight> {
        Ok(Insight::restore(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            serde_json::from_str(&row.get::<_, String>(3)?)?,
            row.get::<_, Option<String>>(4)?
                .map(|s| s.parse::<DateTime<Utc>>())
                .transpose()?,
            row.get::<_, String>(5)?.parse()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use studymem_core::{Observations, PhonemeError, SpeakingObservations};
    use studymem_learn::FrequencyAggregator;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 20, 10, minute, 0).unwrap()
    }

    fn speaking(session: &str, phonemes: &[&str], minute: u32) -> Insight {
        Insight::new(
            "s1",
            session,
            Observations::Speaking(SpeakingObservations {
                phoneme_errors: phonemes
                    .iter()
                    .map(|p| PhonemeError {
                        phoneme: p.to_string(),
                        accuracy: 40.0,
                    })
                    .collect(),
                ..Default::default()
            }),
            at(minute),
        )
    }

    fn compress_all(db: &mut MemoryDb, at: DateTime<Utc>) -> Result<MemoryBoard> {
        let pending = db.uncompressed_insights("s1", Module::Speaking)?;
        let payload = CompressedPayload::build(
            Module::Speaking,
            &pending,
            &FrequencyAggregator::default(),
            at,
        );
        let ids: Vec<i64> = pending.iter().filter_map(Insight::id).collect();
        db.commit_compression("s1", &payload, &ids, at)
    }

    #[test]
    fn test_append_counts_once_per_session() {
        let mut db = MemoryDb::open_in_memory().unwrap();

        let first = db.append_insight(&speaking("a", &["th"], 0)).unwrap();
        assert!(first.was_inserted());
        assert!(first.insight().id().is_some());

        let again = db.append_insight(&speaking("a", &["r"], 1)).unwrap();
        assert!(!again.was_inserted());
        assert_eq!(again.insight(), first.insight());

        assert_eq!(db.sessions_since_compression("s1", Module::Speaking).unwrap(), 1);
        assert_eq!(db.sessions_since_compression("s1", Module::Reading).unwrap(), 0);
        assert_eq!(db.sessions_since_compression("ghost", Module::Speaking).unwrap(), 0);
    }

    #[test]
    fn test_board_created_lazily() {
        let mut db = MemoryDb::open_in_memory().unwrap();
        assert!(db.board("s1").unwrap().is_none());

        db.append_insight(&speaking("a", &["th"], 0)).unwrap();
        let board = db.board("s1").unwrap().unwrap();
        assert_eq!(board.created_at, at(0));
        assert!(board.payload(Module::Writing).is_empty());
        assert_eq!(board.slot(Module::Speaking).sessions_since_compression, 1);

        // Later writes keep the original creation time
        db.append_insight(&speaking("b", &["th"], 5)).unwrap();
        let again = db.board("s1").unwrap().unwrap();
        assert_eq!(again.created_at, at(0));
        assert_eq!(again.slot(Module::Speaking).sessions_since_compression, 2);
    }

    #[test]
    fn test_commit_compression_marks_and_resets() {
        let mut db = MemoryDb::open_in_memory().unwrap();
        for (i, session) in ["a", "b", "c"].iter().enumerate() {
            db.append_insight(&speaking(session, &["th"], i as u32)).unwrap();
        }

        let board = compress_all(&mut db, at(30)).unwrap();
        assert_eq!(board.slot(Module::Speaking).sessions_since_compression, 0);
        assert_eq!(board.slot(Module::Speaking).last_compressed_at, Some(at(30)));

        assert!(db.uncompressed_insights("s1", Module::Speaking).unwrap().is_empty());
        let all = db.insights("s1", Module::Speaking).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|i| i.compressed_at() == Some(at(30))));

        let stored = db.board("s1").unwrap().unwrap();
        assert_eq!(stored, board);
        assert_eq!(stored.payload(Module::Speaking).total_sessions_analyzed, 3);
    }

    #[test]
    fn test_commit_rolls_back_on_mismatch() {
        let mut db = MemoryDb::open_in_memory().unwrap();
        db.append_insight(&speaking("a", &["th"], 0)).unwrap();
        db.append_insight(&speaking("b", &["th"], 1)).unwrap();
        let before = db.board("s1").unwrap();

        let pending = db.uncompressed_insights("s1", Module::Speaking).unwrap();
        let payload = CompressedPayload::build(
            Module::Speaking,
            &pending,
            &FrequencyAggregator::default(),
            at(30),
        );
        // An id that does not exist aborts after the real ones were marked
        let mut ids: Vec<i64> = pending.iter().filter_map(Insight::id).collect();
        ids.push(9_999);

        assert!(db.commit_compression("s1", &payload, &ids, at(30)).is_err());
        assert_eq!(db.uncompressed_insights("s1", Module::Speaking).unwrap().len(), 2);
        assert_eq!(db.board("s1").unwrap(), before);
        assert_eq!(db.sessions_since_compression("s1", Module::Speaking).unwrap(), 2);
    }

    #[test]
    fn test_recompressing_consumed_batch_fails() {
        let mut db = MemoryDb::open_in_memory().unwrap();
        db.append_insight(&speaking("a", &["th"], 0)).unwrap();
        let pending = db.uncompressed_insights("s1", Module::Speaking).unwrap();
        let payload = CompressedPayload::build(
            Module::Speaking,
            &pending,
            &FrequencyAggregator::default(),
            at(10),
        );
        let ids: Vec<i64> = pending.iter().filter_map(Insight::id).collect();

        db.commit_compression("s1", &payload, &ids, at(10)).unwrap();
        assert!(db.commit_compression("s1", &payload, &ids, at(20)).is_err());

        let board = db.board("s1").unwrap().unwrap();
        assert_eq!(board.slot(Module::Speaking).last_compressed_at, Some(at(10)));
    }

    #[test]
    fn test_late_insight_stays_pending() {
        let mut db = MemoryDb::open_in_memory().unwrap();
        db.append_insight(&speaking("a", &["th"], 0)).unwrap();
        let pending = db.uncompressed_insights("s1", Module::Speaking).unwrap();
        let payload = CompressedPayload::build(
            Module::Speaking,
            &pending,
            &FrequencyAggregator::default(),
            at(10),
        );
        let ids: Vec<i64> = pending.iter().filter_map(Insight::id).collect();

        db.append_insight(&speaking("late", &["r"], 5)).unwrap();
        let board = db.commit_compression("s1", &payload, &ids, at(10)).unwrap();

        assert_eq!(board.slot(Module::Speaking).sessions_since_compression, 1);
        assert_eq!(db.sessions_since_compression("s1", Module::Speaking).unwrap(), 1);
    }

    #[test]
    fn test_compressed_flag_is_one_way() {
        let mut db = MemoryDb::open_in_memory().unwrap();
        db.append_insight(&speaking("a", &["th"], 0)).unwrap();
        compress_all(&mut db, at(10)).unwrap();

        let reopen = db
            .conn
            .execute("UPDATE insights SET is_compressed = 0, compressed_at = NULL", []);
        assert!(reopen.is_err());

        let rewrite = db.conn.execute("UPDATE insights SET observations = '{}'", []);
        assert!(rewrite.is_err());

        let delete = db.conn.execute("DELETE FROM insights", []);
        assert!(delete.is_err());

        assert!(db.insights("s1", Module::Speaking).unwrap()[0].is_compressed());
    }

    #[test]
    fn test_reopen_file_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.db");
        {
            let mut db = MemoryDb::open(&path).unwrap();
            db.append_insight(&speaking("a", &["th"], 0)).unwrap();
            db.append_insight(&speaking("b", &["th"], 1)).unwrap();
            compress_all(&mut db, at(10)).unwrap();
        }

        let db = MemoryDb::open(&path).unwrap();
        let board = db.board("s1").unwrap().unwrap();
        assert_eq!(board.payload(Module::Speaking).total_sessions_analyzed, 2);
        assert_eq!(db.insights("s1", Module::Speaking).unwrap().len(), 2);
    }
}
