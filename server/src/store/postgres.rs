//! Postgres room store.
//!
//! Strokes are stored as JSONB rows in `room_strokes`, ordered by a
//! `BIGSERIAL` sequence. `(room_id, stroke_id)` is unique so a resent commit
//! is detected by the insert itself.

use async_trait::async_trait;
use frames::model::{Room, Stroke};
use sqlx::PgPool;
use sqlx::types::Json;

use super::{AppendOutcome, RoomStore, StoreError};

#[derive(Debug, Clone)]
pub struct PgRoomStore {
    pool: PgPool,
}

impl PgRoomStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomStore for PgRoomStore {
    async fn find_or_create_room(&self, room_id: &str) -> Result<Room, StoreError> {
        sqlx::query("INSERT INTO rooms (room_id) VALUES ($1) ON CONFLICT (room_id) DO NOTHING")
            .bind(room_id)
            .execute(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, (Json<Stroke>,)>(
            "SELECT stroke FROM room_strokes WHERE room_id = $1 ORDER BY seq ASC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Room { room_id: room_id.to_owned(), strokes: rows.into_iter().map(|(Json(s),)| s).collect() })
    }

    async fn append_stroke(&self, room_id: &str, stroke: &Stroke) -> Result<AppendOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO rooms (room_id) VALUES ($1) ON CONFLICT (room_id) DO NOTHING")
            .bind(room_id)
            .execute(tx.as_mut())
            .await?;

        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO room_strokes (room_id, stroke_id, owner, stroke) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (room_id, stroke_id) DO NOTHING \
             RETURNING seq",
        )
        .bind(room_id)
        .bind(&stroke.id)
        .bind(&stroke.owner)
        .bind(Json(stroke))
        .fetch_optional(tx.as_mut())
        .await?;

        let outcome = if inserted.is_some() {
            AppendOutcome::Appended(stroke.clone())
        } else {
            let (Json(existing),) = sqlx::query_as::<_, (Json<Stroke>,)>(
                "SELECT stroke FROM room_strokes WHERE room_id = $1 AND stroke_id = $2",
            )
            .bind(room_id)
            .bind(&stroke.id)
            .fetch_one(tx.as_mut())
            .await?;
            AppendOutcome::Duplicate(existing)
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn remove_latest_stroke_by_owner(&self, room_id: &str, owner: &str) -> Result<Option<Stroke>, StoreError> {
        let row = sqlx::query_as::<_, (Json<Stroke>,)>(
            "DELETE FROM room_strokes \
             WHERE seq = ( \
                 SELECT seq FROM room_strokes \
                 WHERE room_id = $1 AND owner = $2 \
                 ORDER BY seq DESC LIMIT 1 \
                 FOR UPDATE \
             ) \
             RETURNING stroke",
        )
        .bind(room_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(Json(s),)| s))
    }

    async fn reset_strokes(&self, room_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM room_strokes WHERE room_id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
