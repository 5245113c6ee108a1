//! RoomLifecycleService - room-level operations that must not interleave.
//!
//! Closing a room and switching the active question both read and then
//! write several entities. Both take the same in-process lock for the room,
//! so a question can never be activated against a room that is being
//! closed. Closing additionally raises a cross-process advisory marker so
//! other instances can see a close is in progress.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::adapters::events::RoomEventBus;
use crate::adapters::locks::AsyncKeyedLock;
use crate::domain::foundation::{DomainError, ErrorCode, RoomId, RoomQuestionId, UserId};
use crate::domain::room::{Room, RoomQuestion, RoomQuestionState, RoomStatus};
use crate::ports::AdvisoryLock;

use super::change_tracking::{CommitSummary, UnitOfWork, UnitOfWorkFactory};

/// Default lifetime of the close-room advisory marker.
pub const DEFAULT_ADVISORY_TTL: Duration = Duration::from_secs(30);

pub struct RoomLifecycleService {
    units: UnitOfWorkFactory,
    bus: Arc<RoomEventBus>,
    locks: AsyncKeyedLock<String>,
    advisory: Arc<dyn AdvisoryLock>,
    advisory_ttl: Duration,
}

impl RoomLifecycleService {
    pub fn new(
        units: UnitOfWorkFactory,
        bus: Arc<RoomEventBus>,
        advisory: Arc<dyn AdvisoryLock>,
    ) -> Self {
        Self {
            units,
            bus,
            locks: AsyncKeyedLock::new(),
            advisory,
            advisory_ttl: DEFAULT_ADVISORY_TTL,
        }
    }

    pub fn with_advisory_ttl(mut self, ttl: Duration) -> Self {
        self.advisory_ttl = ttl;
        self
    }

    /// Whether any instance is currently closing the room.
    pub async fn is_closing(&self, room_id: RoomId) -> Result<bool, DomainError> {
        Ok(self.advisory.is_held(&close_key(room_id)).await?)
    }

    /// Close the room and drop its bus channel.
    ///
    /// Closing an already closed room commits nothing. Fails with
    /// `Conflict` when another instance holds the close marker.
    pub async fn close_room(
        &self,
        room_id: RoomId,
        actor: Option<UserId>,
        cancel: &CancellationToken,
    ) -> Result<CommitSummary, DomainError> {
        let guard = self.locks.acquire(room_key(room_id), cancel).await?;

        let key = close_key(room_id);
        if !self.advisory.try_acquire(&key, self.advisory_ttl).await? {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Room {} is already being closed", room_id),
            ));
        }

        let result = self.close_locked(room_id, actor).await;

        if let Err(e) = self.advisory.release(&key).await {
            tracing::warn!(room_id = %room_id, error = %e, "Failed to release close marker");
        }
        guard.release();
        result
    }

    async fn close_locked(
        &self,
        room_id: RoomId,
        actor: Option<UserId>,
    ) -> Result<CommitSummary, DomainError> {
        let mut uow = self.begin(actor);
        let room = load_room(&mut uow, room_id).await?;
        if room.status.is_closed() {
            return Ok(CommitSummary::default());
        }

        uow.update(room.with_status(RoomStatus::Close)).await?;
        let summary = uow.commit().await?;

        self.bus.drop_room(room_id);
        tracing::info!(room_id = %room_id, "Room closed");
        Ok(summary)
    }

    /// Make `room_question_id` the room's only active question.
    pub async fn activate_question(
        &self,
        room_id: RoomId,
        room_question_id: RoomQuestionId,
        actor: Option<UserId>,
        cancel: &CancellationToken,
    ) -> Result<CommitSummary, DomainError> {
        let guard = self.locks.acquire(room_key(room_id), cancel).await?;

        let mut uow = self.begin(actor);
        let room = load_room(&mut uow, room_id).await?;
        if room.status.is_closed() {
            return Err(DomainError::new(
                ErrorCode::RoomClosed,
                format!("Room {} is closed", room_id),
            ));
        }

        let target: RoomQuestion = uow
            .load(*room_question_id.as_uuid())
            .await?
            .filter(|q: &RoomQuestion| q.room_id == room_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::RoomQuestionNotFound,
                    format!("Room question {} not found in room {}", room_question_id, room_id),
                )
            })?;

        let questions = self.units.store().room_questions(room_id).await?;
        for question in questions {
            if question.is_active() && question.id != target.id {
                uow.update(question.with_state(RoomQuestionState::Closed))
                    .await?;
            }
        }
        if !target.is_active() {
            uow.update(target.with_state(RoomQuestionState::Active))
                .await?;
        }

        let summary = uow.commit().await?;
        guard.release();
        Ok(summary)
    }

    fn begin(&self, actor: Option<UserId>) -> UnitOfWork {
        let uow = self.units.begin();
        match actor {
            Some(actor) => uow.with_actor(actor),
            None => uow,
        }
    }
}

fn room_key(room_id: RoomId) -> String {
    format!("room:{}", room_id)
}

fn close_key(room_id: RoomId) -> String {
    format!("close-room:{}", room_id)
}

async fn load_room(uow: &mut UnitOfWork, room_id: RoomId) -> Result<Room, DomainError> {
    uow.load::<Room>(*room_id.as_uuid())
        .await?
        .ok_or_else(|| DomainError::new(ErrorCode::RoomNotFound, format!("Room {} not found", room_id)))
}
