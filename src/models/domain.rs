use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stated gender on an attendee profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "male")]
    Man,
    #[serde(alias = "female")]
    Woman,
    Other,
}

/// Who an attendee wants to be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestedIn {
    Men,
    Women,
    Both,
}

impl InterestedIn {
    /// Whether a candidate of the given gender satisfies this preference.
    ///
    /// A candidate without a stated gender is always compatible.
    pub fn accepts(self, gender: Option<Gender>) -> bool {
        match (self, gender) {
            (_, None) | (InterestedIn::Both, _) => true,
            (InterestedIn::Men, Some(Gender::Man)) => true,
            (InterestedIn::Women, Some(Gender::Woman)) => true,
            _ => false,
        }
    }
}

/// Inclusive accepted age range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

impl AgeRange {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, age: u8) -> bool {
        age >= self.min && age <= self.max
    }
}

impl Default for AgeRange {
    fn default() -> Self {
        Self { min: 18, max: 99 }
    }
}

/// A user's profile within the scope of one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(rename = "interestedIn", default)]
    pub interested_in: Option<InterestedIn>,
    #[serde(rename = "ageRange", default)]
    pub age_range: Option<AgeRange>,
    #[serde(rename = "photoIds", default)]
    pub photo_ids: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Attendee {
    pub fn new(user_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            event_id: event_id.into(),
            name: String::new(),
            gender: None,
            age: None,
            interested_in: None,
            age_range: None,
            photo_ids: Vec::new(),
            bio: None,
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_age(mut self, age: u8) -> Self {
        self.age = Some(age);
        self
    }

    pub fn interested_in(mut self, interest: InterestedIn) -> Self {
        self.interested_in = Some(interest);
        self
    }

    pub fn with_age_range(mut self, min: u8, max: u8) -> Self {
        self.age_range = Some(AgeRange::new(min, max));
        self
    }

    /// Onboarding is complete once gender and interest are both set
    pub fn is_onboarded(&self) -> bool {
        self.gender.is_some() && self.interested_in.is_some()
    }
}

/// Direction of a swipe decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Like,
    Pass,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Like => "like",
            SwipeDirection::Pass => "pass",
        }
    }
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwipeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "like" | "liked" => Ok(SwipeDirection::Like),
            "pass" | "passed" => Ok(SwipeDirection::Pass),
            other => Err(format!("unknown swipe direction '{}', expected like or pass", other)),
        }
    }
}

/// One directional action by `actor_id` against `target_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeDecision {
    pub id: Uuid,
    #[serde(rename = "actorId")]
    pub actor_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub direction: SwipeDirection,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl SwipeDecision {
    pub fn new(
        actor_id: impl Into<String>,
        target_id: impl Into<String>,
        event_id: impl Into<String>,
        direction: SwipeDirection,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id: actor_id.into(),
            target_id: target_id.into(),
            event_id: event_id.into(),
            direction,
            created_at,
        }
    }

    pub fn is_like(&self) -> bool {
        self.direction == SwipeDirection::Like
    }
}

/// Unordered pair of user ids normalized so that `low < high`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalPair {
    low: String,
    high: String,
}

impl CanonicalPair {
    /// Returns `None` when both ids are the same user
    pub fn new(a: &str, b: &str) -> Option<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(Self { low: a.to_string(), high: b.to_string() }),
            std::cmp::Ordering::Greater => Some(Self { low: b.to_string(), high: a.to_string() }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn high(&self) -> &str {
        &self.high
    }
}

/// Confirmed mutual like for a canonical pair within one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "userLow")]
    pub user_low: String,
    #[serde(rename = "userHigh")]
    pub user_high: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn new(event_id: impl Into<String>, pair: &CanonicalPair, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: event_id.into(),
            user_low: pair.low().to_string(),
            user_high: pair.high().to_string(),
            created_at,
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.user_low == user_id || self.user_high == user_id
    }

    /// The other member of the pair, if `user_id` is part of it
    pub fn partner_of(&self, user_id: &str) -> Option<&str> {
        if self.user_low == user_id {
            Some(&self.user_high)
        } else if self.user_high == user_id {
            Some(&self.user_low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionKind {
    Unmatch,
    Block,
    /// Any kind this service does not know by name; it still excludes
    #[serde(other)]
    Other,
}

/// Permanent exclusion decided outside the engine (report, unmatch, block)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRecord {
    #[serde(rename = "actorId")]
    pub actor_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub kind: ExclusionKind,
}

impl ExclusionRecord {
    pub fn new(
        actor_id: impl Into<String>,
        target_id: impl Into<String>,
        event_id: impl Into<String>,
        kind: ExclusionKind,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            target_id: target_id.into(),
            event_id: event_id.into(),
            kind,
        }
    }

    /// The user hidden from `user_id` by this record, if any
    pub fn excluded_for(&self, user_id: &str) -> Option<&str> {
        if self.actor_id == user_id {
            Some(&self.target_id)
        } else if self.target_id == user_id {
            Some(&self.actor_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Scheduled,
    Active,
    Closed,
}

/// Where an event's matchmaking window stands at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPhase {
    NotYetOpen,
    Open,
    Closed,
}

/// Matchmaking window as supplied by the event lifecycle service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWindow {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub status: EventStatus,
    #[serde(rename = "opensAt", default)]
    pub opens_at: Option<DateTime<Utc>>,
    #[serde(rename = "closesAt", default)]
    pub closes_at: Option<DateTime<Utc>>,
}

impl EventWindow {
    pub fn always_open(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            status: EventStatus::Active,
            opens_at: None,
            closes_at: None,
        }
    }

    pub fn phase(&self, now: DateTime<Utc>) -> WindowPhase {
        if self.status == EventStatus::Closed {
            return WindowPhase::Closed;
        }
        if matches!(self.closes_at, Some(close) if now >= close) {
            return WindowPhase::Closed;
        }
        match self.opens_at {
            Some(open) if now < open => WindowPhase::NotYetOpen,
            None if self.status == EventStatus::Scheduled => WindowPhase::NotYetOpen,
            _ => WindowPhase::Open,
        }
    }
}

/// Tunables for the candidate pipeline and the undo window
#[derive(Debug, Clone, Copy)]
pub struct MatchingPolicy {
    pub reshow_cooldown: Duration,
    pub max_decisions_per_pair: usize,
    pub default_age_range: AgeRange,
    pub undo_grace: Duration,
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        Self {
            reshow_cooldown: Duration::hours(24),
            max_decisions_per_pair: 3,
            default_age_range: AgeRange::default(),
            undo_grace: Duration::seconds(5),
        }
    }
}

/// Why a candidate queue looks the way it does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    NotYetOpen,
    Closed,
    NoAttendees,
    Exhausted,
    Ready,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateQueue {
    pub state: QueueState,
    pub candidates: Vec<Attendee>,
}

impl CandidateQueue {
    pub fn empty(state: QueueState) -> Self {
        Self { state, candidates: Vec::new() }
    }

    pub fn next(&self) -> Option<&Attendee> {
        self.candidates.first()
    }
}

/// Result of a recorded swipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeOutcome {
    pub decision: SwipeDecision,
    #[serde(rename = "match")]
    pub matched: Option<MatchRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UndoOutcome {
    /// The undone target, now queued as the actor's next candidate
    Reinstated(Attendee),
    NothingToUndo,
}
