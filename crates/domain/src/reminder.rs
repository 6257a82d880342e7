use crate::{
    shared::entity::{Entity, ID},
    Club, Event,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// Who should receive the notification of a `ReminderJob`.
/// The recipients are resolved when the job fires, not when it is scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReminderTarget {
    /// A single `User` asked to be reminded about the `Event`
    #[serde(rename_all = "camelCase")]
    SingleRecipient { user_id: ID },
    /// Every current follower of the `Club` hosting the `Event`
    ClubFollowers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderJobKind {
    SingleRecipient,
    ClubFollowers,
}

impl ReminderJobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleRecipient => "single_recipient",
            Self::ClubFollowers => "club_followers",
        }
    }
}

impl Display for ReminderJobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Unknown reminder job kind: {0}")]
pub struct InvalidJobKindError(String);

impl FromStr for ReminderJobKind {
    type Err = InvalidJobKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_recipient" => Ok(Self::SingleRecipient),
            "club_followers" => Ok(Self::ClubFollowers),
            _ => Err(InvalidJobKindError(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Reminder would fire at {fire_at} which is not after {now}")]
pub struct InvalidDelayError {
    pub fire_at: i64,
    pub now: i64,
}

/// A `ReminderJob` is a persisted description of a push notification
/// that should be sent at `fire_at`. It is owned by the delay queue until
/// it has fired once, after which it is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderJob {
    pub id: ID,
    pub target: ReminderTarget,
    /// The `Event` the reminder is about. Only the reference is stored,
    /// the `Event` is looked up again when the job fires.
    pub event_id: ID,
    /// Timestamp in millis at which the job becomes eligible to run
    pub fire_at: i64,
    /// Timestamp in millis of when the job was scheduled
    pub created_at: i64,
}

impl ReminderJob {
    /// Creates a new `ReminderJob`, rejecting jobs that would not fire
    /// strictly after `now`.
    pub fn new(
        target: ReminderTarget,
        event_id: ID,
        fire_at: i64,
        now: i64,
    ) -> Result<Self, InvalidDelayError> {
        if fire_at <= now {
            return Err(InvalidDelayError { fire_at, now });
        }
        Ok(Self {
            id: Default::default(),
            target,
            event_id,
            fire_at,
            created_at: now,
        })
    }

    pub fn kind(&self) -> ReminderJobKind {
        match self.target {
            ReminderTarget::SingleRecipient { .. } => ReminderJobKind::SingleRecipient,
            ReminderTarget::ClubFollowers => ReminderJobKind::ClubFollowers,
        }
    }

    pub fn user_id(&self) -> Option<&ID> {
        match &self.target {
            ReminderTarget::SingleRecipient { user_id } => Some(user_id),
            ReminderTarget::ClubFollowers => None,
        }
    }

    /// Milliseconds left until the job fires
    pub fn delay(&self, now: i64) -> i64 {
        self.fire_at - now
    }

    pub fn handle(&self) -> JobHandle {
        JobHandle {
            job_id: self.id,
            fire_at: self.fire_at,
        }
    }
}

impl Entity for ReminderJob {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Returned to the caller when a `ReminderJob` has been enqueued
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobHandle {
    pub job_id: ID,
    pub fire_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReminderJobStatus {
    /// Waiting for `fire_at` to pass
    Pending,
    /// Claimed by a worker at the given timestamp
    Running { claimed_at: i64 },
    /// The dispatcher errored. Failed jobs are never retried.
    Failed { reason: String },
}

impl ReminderJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running { .. } => "running",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Content of a push notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

impl NotificationPayload {
    /// Reminder for a `User` that asked to be reminded personally
    pub fn personal_reminder(event: &Event, tz: &Tz) -> Self {
        Self {
            title: format!("Reminder: {}", event.title),
            body: format!("{} starts at {}", event.title, event.formatted_start(tz)),
        }
    }

    /// Reminder sent to every follower of the hosting `Club`
    pub fn club_reminder(club: &Club, event: &Event, tz: &Tz) -> Self {
        Self {
            title: format!("Reminder from {}", club.name),
            body: format!("{} starts at {}", event.title, event.formatted_start(tz)),
        }
    }
}
