//! Giveaway state: entry collection, deduplication and winner selection.
//!
//! Nothing in here talks to Discord. The `/giveaway` command and the button
//! handler in [`crate::commands::giveaway`] drive a [`Giveaway`] through its
//! `Open -> Closed` lifecycle and turn the outcomes into messages.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use itertools::Itertools;
use poise::serenity_prelude as serenity;
use rand::seq::IndexedRandom;
use rand::Rng;
use thiserror::Error;

const CUSTOM_ID_PREFIX: &str = "giveaway:";

/// Stable identity of a Discord user, independent of their display attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId(u64);

impl ActorId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl From<serenity::UserId> for ActorId {
    fn from(id: serenity::UserId) -> Self {
        Self(id.get())
    }
}

impl From<ActorId> for serenity::UserId {
    fn from(id: ActorId) -> Self {
        serenity::UserId::new(id.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GiveawayError {
    #[error("The giveaway duration cannot be negative.")]
    NegativeDuration,
    #[error("A giveaway needs at least one winner.")]
    NoWinners,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Open,
    Closed,
}

/// Answer to a single press of the entry button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgment {
    /// The actor was added; carries the new participant count.
    Entered { participants: usize },
    AlreadyEntered,
    Ended,
}

impl Acknowledgment {
    /// Text shown privately to the actor who pressed the button.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Entered { .. } => "You've successfully entered the giveaway!",
            Self::AlreadyEntered => "You are already entered in the giveaway!",
            Self::Ended => "This giveaway has ended.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NoParticipants,
    Winners(Vec<ActorId>),
}

impl Resolution {
    #[must_use]
    pub fn announcement(&self, prize: &str) -> String {
        match self {
            Self::NoParticipants => "No one participated in the giveaway.".to_owned(),
            Self::Winners(winners) => {
                let mentions = winners.iter().map(|winner| winner.mention()).join(", ");
                format!("🎉 Congratulations {mentions}! You won the **{prize}**!")
            }
        }
    }

    #[must_use]
    pub fn winners(&self) -> &[ActorId] {
        match self {
            Self::NoParticipants => &[],
            Self::Winners(winners) => winners,
        }
    }
}

#[derive(Debug)]
pub struct Giveaway {
    prize: String,
    duration: Duration,
    winner_count: usize,
    host: ActorId,
    host_name: String,
    participants: BTreeSet<ActorId>,
    phase: Phase,
}

impl Giveaway {
    /// Validates the host's arguments and opens a giveaway with no participants.
    pub fn new(
        host: ActorId,
        host_name: impl Into<String>,
        prize: impl Into<String>,
        duration_secs: i64,
        winners: i64,
    ) -> Result<Self, GiveawayError> {
        let duration_secs = u64::try_from(duration_secs).map_err(|_| GiveawayError::NegativeDuration)?;
        if winners < 1 {
            return Err(GiveawayError::NoWinners);
        }

        Ok(Self {
            prize: prize.into(),
            duration: Duration::from_secs(duration_secs),
            winner_count: usize::try_from(winners).unwrap_or(usize::MAX),
            host,
            host_name: host_name.into(),
            participants: BTreeSet::new(),
            phase: Phase::Open,
        })
    }

    #[must_use]
    pub fn prize(&self) -> &str {
        &self.prize
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn host(&self) -> ActorId {
        self.host
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "Prize: **{}**\nClick 🎉 button to enter!\nDuration: **{} seconds**\nNumber of Winners: **{}**",
            self.prize,
            self.duration.as_secs(),
            self.winner_count,
        )
    }

    #[must_use]
    pub fn footer(&self) -> String {
        format!("Giveaway hosted by {}", self.host_name)
    }

    /// Label of the entry button for the current participant count.
    #[must_use]
    pub fn entry_label(&self) -> String {
        match (self.phase, self.participants.len()) {
            (Phase::Open, 0) => "🎉".to_owned(),
            (Phase::Open, count) => format!("🎉({count})"),
            (Phase::Closed, count) => format!("🎉({count}) ended"),
        }
    }

    pub fn enter(&mut self, actor: ActorId) -> Acknowledgment {
        if self.phase == Phase::Closed {
            return Acknowledgment::Ended;
        }

        if self.participants.insert(actor) {
            Acknowledgment::Entered { participants: self.participants.len() }
        } else {
            Acknowledgment::AlreadyEntered
        }
    }

    /// Closes the giveaway and draws its winners.
    ///
    /// Returns `None` if the giveaway was already closed, so a giveaway is only
    /// ever resolved once. The winners are a uniformly random subset of size
    /// `min(winners, participants)`; `rng` is left untouched when nobody entered.
    pub fn resolve<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Resolution> {
        if self.phase == Phase::Closed {
            return None;
        }
        self.phase = Phase::Closed;

        if self.participants.is_empty() {
            return Some(Resolution::NoParticipants);
        }

        let amount = self.winner_count.min(self.participants.len());
        let pool = self.participants.iter().copied().collect::<Vec<_>>();
        let winners = pool.choose_multiple(rng, amount).copied().collect();

        Some(Resolution::Winners(winners))
    }
}

pub type SharedGiveaway = Arc<Mutex<Giveaway>>;

/// Locks a giveaway, recovering the state if a previous holder panicked.
pub fn lock(giveaway: &SharedGiveaway) -> MutexGuard<'_, Giveaway> {
    giveaway.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Giveaways that are still accepting entries, keyed by the id embedded in
/// their button's custom id.
#[derive(Debug, Default)]
pub struct GiveawayRegistry {
    open: Mutex<HashMap<u64, SharedGiveaway>>,
}

impl GiveawayRegistry {
    pub fn insert(&self, id: u64, giveaway: Giveaway) -> SharedGiveaway {
        let giveaway = Arc::new(Mutex::new(giveaway));
        self.entries().insert(id, Arc::clone(&giveaway));
        giveaway
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<SharedGiveaway> {
        self.entries().get(&id).cloned()
    }

    pub fn remove(&self, id: u64) -> Option<SharedGiveaway> {
        self.entries().remove(&id)
    }

    /// Enters `actor` into giveaway `id`, returning the acknowledgment and the
    /// button label to show afterwards.
    ///
    /// The membership check, the insert and the label are computed under one
    /// lock, so concurrent presses cannot both be admitted for the same actor.
    pub fn enter(&self, id: u64, actor: ActorId) -> (Acknowledgment, Option<String>) {
        let Some(giveaway) = self.get(id) else {
            return (Acknowledgment::Ended, None);
        };

        let mut giveaway = lock(&giveaway);
        let acknowledgment = giveaway.enter(actor);
        (acknowledgment, Some(giveaway.entry_label()))
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<u64, SharedGiveaway>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[must_use]
pub fn custom_id(id: u64) -> String {
    format!("{CUSTOM_ID_PREFIX}{id}")
}

#[must_use]
pub fn parse_custom_id(custom_id: &str) -> Option<u64> {
    custom_id.strip_prefix(CUSTOM_ID_PREFIX)?.parse().ok()
}
