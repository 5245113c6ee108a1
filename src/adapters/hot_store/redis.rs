//! Redis-backed hot event store for multi-server deployments.
//!
//! Layout per room:
//!
//! | Key | Type | Contents |
//! |-----|------|----------|
//! | `room-events:{room}:data` | hash | event id -> event JSON |
//! | `room-events:{room}:index` | sorted set | event id scored by creation millis |
//! | `room-events:rooms` | sorted set (score 0) | room ids with staged events, paged lexicographically |
//!
//! Appends run as one atomic pipeline. Deletes run as a script so the room
//! leaves `room-events:rooms` in the same step its index becomes empty.
//! Time windows are applied at millisecond precision. Type and stateful
//! filters are applied while walking the index in fixed-size windows, so a
//! query never holds more than one window of events beyond its result.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};

use crate::domain::events::{EventSpec, RoomEvent};
use crate::domain::foundation::RoomId;
use crate::ports::{HotEventStore, HotStoreError};

const KEY_PREFIX: &str = "room-events";
const HMGET_BATCH: usize = 200;

const DELETE_SCRIPT: &str = r#"
local removed = 0
for i = 2, #ARGV do
  removed = removed + redis.call('HDEL', KEYS[1], ARGV[i])
  redis.call('ZREM', KEYS[2], ARGV[i])
end
if redis.call('ZCARD', KEYS[2]) == 0 then
  redis.call('ZREM', KEYS[3], ARGV[1])
end
return removed
"#;

impl From<redis::RedisError> for HotStoreError {
    fn from(err: redis::RedisError) -> Self {
        HotStoreError::Unavailable(err.to_string())
    }
}

/// Redis hot event store.
#[derive(Clone)]
pub struct RedisHotEventStore {
    conn: MultiplexedConnection,
    delete_script: Script,
}

impl RedisHotEventStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            delete_script: Script::new(DELETE_SCRIPT),
        }
    }

    fn rooms_key() -> String {
        format!("{}:rooms", KEY_PREFIX)
    }

    fn index_key(room_id: RoomId) -> String {
        format!("{}:{}:index", KEY_PREFIX, room_id)
    }

    fn data_key(room_id: RoomId) -> String {
        format!("{}:{}:data", KEY_PREFIX, room_id)
    }

    /// Score bounds for a spec's window, `[min, max)`.
    fn score_bounds(spec: &EventSpec) -> (String, String) {
        let (after, before) = spec.window();
        let min = after
            .map(|t| t.as_unix_millis().to_string())
            .unwrap_or_else(|| "-inf".to_string());
        let max = before
            .map(|t| format!("({}", t.as_unix_millis()))
            .unwrap_or_else(|| "+inf".to_string());
        (min, max)
    }

    /// Resolve ids to events, preserving order and skipping ids whose data
    /// vanished between the two reads.
    async fn load_events(
        &self,
        room_id: RoomId,
        ids: &[String],
    ) -> Result<Vec<RoomEvent>, HotStoreError> {
        let mut conn = self.conn.clone();
        let mut events = Vec::with_capacity(ids.len());
        for batch in ids.chunks(HMGET_BATCH) {
            let values: Vec<Option<String>> = redis::cmd("HMGET")
                .arg(Self::data_key(room_id))
                .arg(batch)
                .query_async(&mut conn)
                .await?;
            for raw in values.into_iter().flatten() {
                let event: RoomEvent = serde_json::from_str(&raw)
                    .map_err(|e| HotStoreError::Serialization(e.to_string()))?;
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Walk the window in index order, `HMGET_BATCH` ids at a time, until
    /// `skip + take` events matching the spec have been seen.
    async fn scan_matching(
        &self,
        spec: &EventSpec,
        newest_first: bool,
        skip: usize,
        take: usize,
    ) -> Result<Vec<RoomEvent>, HotStoreError> {
        let mut conn = self.conn.clone();
        let (min, max) = Self::score_bounds(spec);
        let key = Self::index_key(spec.room_id());
        let mut scan = FilteredScan::new(skip, take);
        let mut position = 0isize;

        loop {
            let ids: Vec<String> = if newest_first {
                conn.zrevrangebyscore_limit(&key, &max, &min, position, HMGET_BATCH as isize)
                    .await?
            } else {
                conn.zrangebyscore_limit(&key, &min, &max, position, HMGET_BATCH as isize)
                    .await?
            };
            let exhausted = ids.len() < HMGET_BATCH;
            position += ids.len() as isize;

            let events = self.load_events(spec.room_id(), &ids).await?;
            if scan.absorb(spec, events) || exhausted {
                return Ok(scan.finish());
            }
        }
    }
}

/// Skip/take over a stream of candidate batches, keeping only matches.
#[derive(Debug)]
struct FilteredScan {
    skip: usize,
    take: usize,
    matched: Vec<RoomEvent>,
}

impl FilteredScan {
    fn new(skip: usize, take: usize) -> Self {
        Self {
            skip,
            take,
            matched: Vec::with_capacity(take.min(HMGET_BATCH)),
        }
    }

    /// Returns true once `take` matches are collected.
    fn absorb(&mut self, spec: &EventSpec, batch: Vec<RoomEvent>) -> bool {
        for event in batch {
            if self.matched.len() == self.take {
                break;
            }
            if !spec.matches(&event) {
                continue;
            }
            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }
            self.matched.push(event);
        }
        self.matched.len() == self.take
    }

    fn finish(self) -> Vec<RoomEvent> {
        self.matched
    }
}

#[async_trait]
impl HotEventStore for RedisHotEventStore {
    async fn append(&self, event: &RoomEvent) -> Result<(), HotStoreError> {
        let json =
            serde_json::to_string(event).map_err(|e| HotStoreError::Serialization(e.to_string()))?;
        let room_id = event.room_id();
        let id = event.id().to_string();
        let score = event.created_at().as_unix_millis();

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .hset(Self::data_key(room_id), &id, json)
            .ignore()
            .zadd(Self::index_key(room_id), &id, score)
            .ignore()
            .zadd(Self::rooms_key(), room_id.to_string(), 0)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn fetch_page(
        &self,
        spec: &EventSpec,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RoomEvent>, HotStoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        if spec.is_window_only() {
            let mut conn = self.conn.clone();
            let (min, max) = Self::score_bounds(spec);
            let ids: Vec<String> = conn
                .zrangebyscore_limit(
                    Self::index_key(spec.room_id()),
                    min,
                    max,
                    offset as isize,
                    limit as isize,
                )
                .await?;
            return self.load_events(spec.room_id(), &ids).await;
        }

        self.scan_matching(spec, false, offset, limit).await
    }

    async fn get_latest(
        &self,
        spec: &EventSpec,
        limit: usize,
    ) -> Result<Vec<RoomEvent>, HotStoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        if spec.is_window_only() {
            let mut conn = self.conn.clone();
            let (min, max) = Self::score_bounds(spec);
            let ids: Vec<String> = conn
                .zrevrangebyscore_limit(
                    Self::index_key(spec.room_id()),
                    max,
                    min,
                    0,
                    limit as isize,
                )
                .await?;
            return self.load_events(spec.room_id(), &ids).await;
        }

        self.scan_matching(spec, true, 0, limit).await
    }

    async fn delete(&self, events: &[RoomEvent]) -> Result<u64, HotStoreError> {
        let mut by_room: std::collections::BTreeMap<RoomId, Vec<String>> = Default::default();
        for event in events {
            by_room
                .entry(event.room_id())
                .or_default()
                .push(event.id().to_string());
        }

        let mut conn = self.conn.clone();
        let mut removed = 0u64;
        for (room_id, ids) in by_room {
            let mut invocation = self.delete_script.prepare_invoke();
            invocation
                .key(Self::data_key(room_id))
                .key(Self::index_key(room_id))
                .key(Self::rooms_key())
                .arg(room_id.to_string());
            for id in &ids {
                invocation.arg(id);
            }
            let count: u64 = invocation.invoke_async(&mut conn).await?;
            removed += count;
        }
        Ok(removed)
    }

    async fn pending_rooms(
        &self,
        after: Option<RoomId>,
        limit: usize,
    ) -> Result<Vec<RoomId>, HotStoreError> {
        let mut conn = self.conn.clone();
        let min = after
            .map(|id| format!("({}", id))
            .unwrap_or_else(|| "-".to_string());
        let raw: Vec<String> = conn
            .zrangebylex_limit(Self::rooms_key(), min, "+", 0, limit as isize)
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|s| match s.parse::<RoomId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(member = %s, error = %e, "Skipping malformed room id in hot store");
                    None
                }
            })
            .collect())
    }
}

impl std::fmt::Debug for RedisHotEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisHotEventStore").finish_non_exhaustive()
    }
}
