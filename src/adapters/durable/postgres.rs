//! PostgreSQL durable event store.
//!
//! Chunks are written with a single multi-row insert, so a chunk is either
//! fully stored or not at all. `ON CONFLICT (id) DO NOTHING` lets the drain
//! service re-attempt a chunk whose hot copies were not deleted last time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::events::{DurableEvent, QueuedRoomEvent};
use crate::domain::foundation::{RoomId, Timestamp};
use crate::ports::{DurableEventStore, DurableStoreError};

/// PostgreSQL implementation of DurableEventStore.
#[derive(Clone)]
pub struct PostgresDurableEventStore {
    pool: PgPool,
}

impl PostgresDurableEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DurableEventStore for PostgresDurableEventStore {
    async fn insert_batch(&self, events: &[DurableEvent]) -> Result<u64, DurableStoreError> {
        if events.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO room_events \
             (id, room_id, type, stateful, payload, created_by_id, created_at, updated_at) ",
        );
        builder.push_values(events, |mut row, event| {
            row.push_bind(*event.id.as_uuid())
                .push_bind(*event.room_id.as_uuid())
                .push_bind(event.event_type.clone())
                .push_bind(event.stateful)
                .push_bind(event.payload.clone())
                .push_bind(event.created_by_id.map(|id| *id.as_uuid()))
                .push_bind(*event.created_at.as_datetime())
                .push_bind(*event.updated_at.as_datetime());
        });
        builder.push(" ON CONFLICT (id) DO NOTHING");

        let result = builder.build().execute(&self.pool).await.map_err(|e| {
            DurableStoreError::Database(format!("Failed to insert room events: {}", e))
        })?;

        Ok(result.rows_affected())
    }

    async fn append_marker(&self, marker: &QueuedRoomEvent) -> Result<(), DurableStoreError> {
        sqlx::query(
            r#"
            INSERT INTO queued_room_events (id, room_id, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(marker.id)
        .bind(marker.room_id.as_uuid())
        .bind(marker.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DurableStoreError::Database(format!("Failed to append drain marker: {}", e)))?;

        Ok(())
    }

    async fn last_drained_at(
        &self,
        room_id: RoomId,
    ) -> Result<Option<Timestamp>, DurableStoreError> {
        let latest: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            SELECT MAX(created_at) FROM queued_room_events WHERE room_id = $1
            "#,
        )
        .bind(room_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DurableStoreError::Database(format!("Failed to read drain marker: {}", e)))?;

        Ok(latest.map(Timestamp::from_datetime))
    }
}

impl std::fmt::Debug for PostgresDurableEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresDurableEventStore").finish_non_exhaustive()
    }
}
