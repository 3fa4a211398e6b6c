use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::Path;
use studyflow_core::{
    repo::Repository, Card, CardId, CoreError, Deck, DeckId, Difficulty, Review, SessionRecord,
    StudySessionProgress,
};
use tracing::info;

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let url = format!("sqlite://{}?mode=rwc", path.as_ref().to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        info!(path = %path.as_ref().display(), "sqlite store opened");
        Ok(repo)
    }

    /// Each in-memory connection is its own database, so the pool holds one.
    pub async fn open_memory() -> Result<Self, CoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS decks (
          id          TEXT PRIMARY KEY,
          name        TEXT NOT NULL UNIQUE COLLATE NOCASE,
          subject     TEXT,
          created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cards (
          id          TEXT PRIMARY KEY,
          deck_id     TEXT NOT NULL,
          front       TEXT NOT NULL,
          back        TEXT NOT NULL,
          hint        TEXT,
          tags        TEXT NOT NULL,
          suspended   INTEGER NOT NULL DEFAULT 0,
          created_at  TEXT NOT NULL,
          FOREIGN KEY(deck_id) REFERENCES decks(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS reviews (
          id           TEXT PRIMARY KEY,
          card_id      TEXT NOT NULL,
          difficulty   INTEGER NOT NULL,
          reviewed_at  TEXT NOT NULL,
          FOREIGN KEY(card_id) REFERENCES cards(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS sessions (
          id           TEXT PRIMARY KEY,
          deck_id      TEXT NOT NULL,
          started_at   TEXT NOT NULL,
          finished_at  TEXT NOT NULL,
          progress     TEXT NOT NULL,
          FOREIGN KEY(deck_id) REFERENCES decks(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards (deck_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_reviews_card_time ON reviews (card_id, reviewed_at);
        CREATE INDEX IF NOT EXISTS idx_sessions_deck ON sessions (deck_id, started_at);
        "#;

        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("sqlite schema"))?;
        }
        Ok(())
    }

    async fn deck_exists(&self, id: DeckId) -> Result<bool, CoreError> {
        Ok(sqlx::query("SELECT 1 FROM decks WHERE id=? LIMIT 1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read deck"))?
            .is_some())
    }
}

const CARD_COLUMNS: &str = "id,deck_id,front,back,hint,tags,suspended,created_at";

#[async_trait::async_trait]
impl Repository for SqliteRepo {
    // ===== Decks =====
    async fn create_deck(&self, name: &str, subject: Option<&str>) -> Result<Deck, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::InvalidArgument("deck name must not be empty"));
        }
        let exists = sqlx::query("SELECT 1 FROM decks WHERE lower(name)=lower(?) LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read deck"))?
            .is_some();
        if exists {
            return Err(CoreError::Conflict("deck name already exists"));
        }

        let deck = Deck::new(name).with_subject(subject.map(str::to_string));
        sqlx::query("INSERT INTO decks (id,name,subject,created_at) VALUES (?,?,?,?)")
            .bind(deck.id.to_string())
            .bind(&deck.name)
            .bind(deck.subject.clone())
            .bind(dt_to_str(deck.created_at))
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("insert deck"))?;
        Ok(deck)
    }

    async fn get_deck(&self, id: DeckId) -> Result<Deck, CoreError> {
        let row = sqlx::query("SELECT id,name,subject,created_at FROM decks WHERE id=?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read deck"))?;
        row_into_deck(row.ok_or(CoreError::NotFound("deck"))?)
    }

    async fn list_decks(&self) -> Result<Vec<Deck>, CoreError> {
        let rows =
            sqlx::query("SELECT id,name,subject,created_at FROM decks ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("list decks"))?;
        rows.into_iter().map(row_into_deck).collect()
    }

    async fn delete_deck(&self, id: DeckId) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        // Manual cascade (robust even if PRAGMA foreign_keys is off)
        sqlx::query("DELETE FROM reviews WHERE card_id IN (SELECT id FROM cards WHERE deck_id=?)")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del reviews"))?;

        sqlx::query("DELETE FROM sessions WHERE deck_id=?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del sessions"))?;

        sqlx::query("DELETE FROM cards WHERE deck_id=?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del cards"))?;

        let res = sqlx::query("DELETE FROM decks WHERE id=?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del deck"))?;
        if res.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(CoreError::NotFound("deck"));
        }

        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))
    }

    // ===== Cards =====
    async fn add_card(
        &self,
        deck_id: DeckId,
        front: &str,
        back: &str,
        hint: Option<&str>,
        tags: &[String],
    ) -> Result<Card, CoreError> {
        if !self.deck_exists(deck_id).await? {
            return Err(CoreError::NotFound("deck"));
        }

        let mut card = Card::new(deck_id, front, back);
        card.hint = hint.map(|s| s.to_string());
        card.tags = tags.to_vec();

        sqlx::query(
            r#"INSERT INTO cards (id,deck_id,front,back,hint,tags,suspended,created_at)
               VALUES (?,?,?,?,?,?,?,?)"#,
        )
        .bind(card.id.to_string())
        .bind(card.deck_id.to_string())
        .bind(&card.front)
        .bind(&card.back)
        .bind(card.hint.clone())
        .bind(tags_to_str(&card.tags)?)
        .bind(bool_to_i(card.suspended))
        .bind(dt_to_str(card.created_at))
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("insert card"))?;

        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        let row = sqlx::query(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id=?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read card"))?;
        row_into_card(row.ok_or(CoreError::NotFound("card"))?)
    }

    async fn list_cards(&self, deck_id: Option<DeckId>) -> Result<Vec<Card>, CoreError> {
        let rows = if let Some(did) = deck_id {
            sqlx::query(&format!(
                "SELECT {CARD_COLUMNS} FROM cards WHERE deck_id=? ORDER BY created_at ASC"
            ))
            .bind(did.to_string())
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(&format!("SELECT {CARD_COLUMNS} FROM cards ORDER BY created_at ASC"))
                .fetch_all(&self.pool)
                .await
        }
        .map_err(|_| CoreError::Storage("list cards"))?;
        rows.into_iter().map(row_into_card).collect()
    }

    async fn update_card(&self, card: &Card) -> Result<Card, CoreError> {
        let res = sqlx::query(
            r#"UPDATE cards SET deck_id=?, front=?, back=?, hint=?, tags=?, suspended=?
               WHERE id=?"#,
        )
        .bind(card.deck_id.to_string())
        .bind(&card.front)
        .bind(&card.back)
        .bind(card.hint.clone())
        .bind(tags_to_str(&card.tags)?)
        .bind(bool_to_i(card.suspended))
        .bind(card.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("update card"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("card"));
        }
        Ok(card.clone())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;
        sqlx::query("DELETE FROM reviews WHERE card_id=?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del reviews"))?;
        let res = sqlx::query("DELETE FROM cards WHERE id=?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del card"))?;
        if res.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(CoreError::NotFound("card"));
        }
        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))
    }

    async fn set_suspended(&self, id: CardId, suspended: bool) -> Result<(), CoreError> {
        let res = sqlx::query("UPDATE cards SET suspended=? WHERE id=?")
            .bind(bool_to_i(suspended))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("suspend"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("card"));
        }
        Ok(())
    }

    // ===== Reviews =====
    async fn insert_review(&self, review: &Review) -> Result<(), CoreError> {
        let card_exists = sqlx::query("SELECT 1 FROM cards WHERE id=? LIMIT 1")
            .bind(review.card_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read card"))?
            .is_some();
        if !card_exists {
            return Err(CoreError::NotFound("card"));
        }
        sqlx::query("INSERT INTO reviews (id,card_id,difficulty,reviewed_at) VALUES (?,?,?,?)")
            .bind(review.id.to_string())
            .bind(review.card_id.to_string())
            .bind(review.difficulty.as_score() as i64)
            .bind(dt_to_str(review.reviewed_at))
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("insert review"))?;
        Ok(())
    }

    async fn list_reviews_for_card(&self, card_id: CardId) -> Result<Vec<Review>, CoreError> {
        let rows = sqlx::query(
            r#"SELECT id,card_id,difficulty,reviewed_at
               FROM reviews WHERE card_id=? ORDER BY reviewed_at ASC"#,
        )
        .bind(card_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list reviews"))?;
        rows.into_iter().map(row_into_review).collect()
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, CoreError> {
        let rows = sqlx::query(
            "SELECT id,card_id,difficulty,reviewed_at FROM reviews ORDER BY reviewed_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list reviews"))?;
        rows.into_iter().map(row_into_review).collect()
    }

    // ===== Sessions =====
    async fn save_session(&self, session: &SessionRecord) -> Result<(), CoreError> {
        if !self.deck_exists(session.deck_id).await? {
            return Err(CoreError::NotFound("deck"));
        }
        let progress = serde_json::to_string(&session.progress)
            .map_err(|_| CoreError::Storage("encode progress"))?;
        sqlx::query(
            r#"INSERT INTO sessions (id,deck_id,started_at,finished_at,progress)
               VALUES (?,?,?,?,?)
               ON CONFLICT(id) DO UPDATE SET finished_at=excluded.finished_at,
                                             progress=excluded.progress"#,
        )
        .bind(session.id.to_string())
        .bind(session.deck_id.to_string())
        .bind(dt_to_str(session.started_at))
        .bind(dt_to_str(session.finished_at))
        .bind(progress)
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("insert session"))?;
        Ok(())
    }

    async fn list_sessions(&self, deck_id: Option<DeckId>) -> Result<Vec<SessionRecord>, CoreError> {
        let rows = if let Some(did) = deck_id {
            sqlx::query(
                r#"SELECT id,deck_id,started_at,finished_at,progress
                   FROM sessions WHERE deck_id=? ORDER BY started_at ASC"#,
            )
            .bind(did.to_string())
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"SELECT id,deck_id,started_at,finished_at,progress
                   FROM sessions ORDER BY started_at ASC"#,
            )
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|_| CoreError::Storage("list sessions"))?;
        rows.into_iter().map(row_into_session).collect()
    }
}

// ===== Helpers =====
fn uuid_from_str(s: String) -> Result<uuid::Uuid, CoreError> {
    uuid::Uuid::parse_str(&s).map_err(|_| CoreError::Storage("bad uuid"))
}

fn dt_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn dt_from_str(s: String) -> Result<DateTime<Utc>, CoreError> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map_err(|_| CoreError::Storage("bad datetime"))
        .map(|dt| dt.with_timezone(&Utc))
}

fn tags_to_str(tags: &[String]) -> Result<String, CoreError> {
    serde_json::to_string(tags).map_err(|_| CoreError::Storage("encode tags"))
}

fn bool_to_i(b: bool) -> i64 {
    if b {
        1
    } else {
        0
    }
}

fn row_into_deck(row: sqlx::sqlite::SqliteRow) -> Result<Deck, CoreError> {
    Ok(Deck {
        id: uuid_from_str(row.get::<String, _>("id"))?,
        name: row.get::<String, _>("name"),
        subject: row.get::<Option<String>, _>("subject"),
        created_at: dt_from_str(row.get::<String, _>("created_at"))?,
    })
}

fn row_into_card(row: sqlx::sqlite::SqliteRow) -> Result<Card, CoreError> {
    let tags_json: String = row.get("tags");
    let tags: Vec<String> =
        serde_json::from_str(&tags_json).map_err(|_| CoreError::Storage("bad tags"))?;

    Ok(Card {
        id: uuid_from_str(row.get::<String, _>("id"))?,
        deck_id: uuid_from_str(row.get::<String, _>("deck_id"))?,
        front: row.get::<String, _>("front"),
        back: row.get::<String, _>("back"),
        hint: row.get::<Option<String>, _>("hint"),
        tags,
        suspended: row.get::<i64, _>("suspended") != 0,
        created_at: dt_from_str(row.get::<String, _>("created_at"))?,
    })
}

fn row_into_review(row: sqlx::sqlite::SqliteRow) -> Result<Review, CoreError> {
    Ok(Review {
        id: uuid_from_str(row.get::<String, _>("id"))?,
        card_id: uuid_from_str(row.get::<String, _>("card_id"))?,
        difficulty: Difficulty::from_score(row.get::<i64, _>("difficulty"))
            .ok_or(CoreError::Storage("bad difficulty"))?,
        reviewed_at: dt_from_str(row.get::<String, _>("reviewed_at"))?,
    })
}

fn row_into_session(row: sqlx::sqlite::SqliteRow) -> Result<SessionRecord, CoreError> {
    let progress: StudySessionProgress =
        serde_json::from_str(&row.get::<String, _>("progress"))
            .map_err(|_| CoreError::Storage("bad progress"))?;
    Ok(SessionRecord {
        id: uuid_from_str(row.get::<String, _>("id"))?,
        deck_id: uuid_from_str(row.get::<String, _>("deck_id"))?,
        started_at: dt_from_str(row.get::<String, _>("started_at"))?,
        finished_at: dt_from_str(row.get::<String, _>("finished_at"))?,
        progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cards_and_reviews_round_trip() {
        let repo = SqliteRepo::open_memory().await.unwrap();
        let deck = repo.create_deck("Optics", Some("Physics")).await.unwrap();
        let card = repo
            .add_card(deck.id, "n = ?", "c / v", Some("refraction"), &["light".into()])
            .await
            .unwrap();
        repo.set_suspended(card.id, true).await.unwrap();

        let loaded = repo.get_card(card.id).await.unwrap();
        assert!(loaded.suspended);
        assert_eq!(loaded.tags, vec!["light".to_string()]);
        assert_eq!(repo.get_deck(deck.id).await.unwrap().subject.as_deref(), Some("Physics"));

        repo.insert_review(&Review::new(card.id, Difficulty::Hard, Utc::now()))
            .await
            .unwrap();
        let reviews = repo.list_reviews_for_card(card.id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].difficulty, Difficulty::Hard);
    }

    #[tokio::test]
    async fn duplicate_deck_name_conflicts() {
        let repo = SqliteRepo::open_memory().await.unwrap();
        repo.create_deck("Optics", None).await.unwrap();
        assert_eq!(
            repo.create_deck("OPTICS", None).await.unwrap_err(),
            CoreError::Conflict("deck name already exists")
        );
    }

    #[tokio::test]
    async fn sessions_upsert_and_cascade() {
        let repo = SqliteRepo::open_memory().await.unwrap();
        let deck = repo.create_deck("Cells", None).await.unwrap();
        let p0 = StudySessionProgress::initial(2, None).unwrap();
        let mut rec = SessionRecord::new(deck.id, Utc::now(), p0.clone());
        repo.save_session(&rec).await.unwrap();

        rec.progress = p0.rate_card("a", Difficulty::Easy).next_card();
        repo.save_session(&rec).await.unwrap();

        let listed = repo.list_sessions(Some(deck.id)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].progress, rec.progress);

        repo.delete_deck(deck.id).await.unwrap();
        assert!(repo.list_sessions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_rows_are_storage_errors() {
        let repo = SqliteRepo::open_memory().await.unwrap();
        let deck = repo.create_deck("Cells", None).await.unwrap();
        let card = repo.add_card(deck.id, "q", "a", None, &[]).await.unwrap();
        let rec = SessionRecord::new(deck.id, Utc::now(), StudySessionProgress::initial(1, None).unwrap());
        repo.save_session(&rec).await.unwrap();

        sqlx::query("UPDATE cards SET tags = 'not json' WHERE id = ?")
            .bind(card.id.to_string())
            .execute(&repo.pool)
            .await
            .unwrap();
        assert_eq!(repo.get_card(card.id).await.unwrap_err(), CoreError::Storage("bad tags"));

        let overfull = r#"{"subject":null,"total_cards":1,"current_index":0,"ratings":{"a":"easy","b":"hard"}}"#;
        sqlx::query("UPDATE sessions SET progress = ? WHERE id = ?")
            .bind(overfull)
            .bind(rec.id.to_string())
            .execute(&repo.pool)
            .await
            .unwrap();
        assert_eq!(
            repo.list_sessions(None).await.unwrap_err(),
            CoreError::Storage("bad progress")
        );
    }

    #[tokio::test]
    async fn file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studyflow.sqlite3");
        {
            let repo = SqliteRepo::open_file(&path).await.unwrap();
            repo.create_deck("Kept", None).await.unwrap();
        }
        let repo = SqliteRepo::open_file(&path).await.unwrap();
        let decks = repo.list_decks().await.unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].name, "Kept");
    }
}
