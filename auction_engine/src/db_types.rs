use std::{fmt::Display, str::FromStr};

pub use auction_common::Tokens;
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlite")]
use sqlx::{sqlite::SqliteRow, types::Json, Row};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

//--------------------------------------     Identifiers       ---------------------------------------------------------
string_id!(
    /// The identifier of a job post, as assigned by the marketplace application.
    PostId
);
string_id!(
    /// A settlement address on the ledger.
    AccountId
);
string_id!(
    /// The external identifier of a message channel topic.
    TopicId
);
string_id!(
    /// The ledger identifier of the token used for bids, refunds and awards.
    TokenId
);

//--------------------------------------      SkillLevel       ---------------------------------------------------------
/// Textual proficiency levels used by posts and candidate profiles. Anything unrecognised is treated as a beginner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    /// The numeric weight of the level, on a 1 to 5 scale.
    pub fn weight(&self) -> f64 {
        match self {
            SkillLevel::Beginner => 1.0,
            SkillLevel::Intermediate => 3.0,
            SkillLevel::Advanced => 4.0,
            SkillLevel::Expert => 5.0,
        }
    }
}

impl Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkillLevel::Beginner => write!(f, "Beginner"),
            SkillLevel::Intermediate => write!(f, "Intermediate"),
            SkillLevel::Advanced => write!(f, "Advanced"),
            SkillLevel::Expert => write!(f, "Expert"),
        }
    }
}

impl FromStr for SkillLevel {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "expert" => Ok(Self::Expert),
            s => Err(ConversionError(format!("Invalid skill level: {s}"))),
        }
    }
}

impl From<String> for SkillLevel {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<SkillLevel> for String {
    fn from(value: SkillLevel) -> Self {
        value.to_string()
    }
}

//--------------------------------------        Skills         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub name: String,
    #[serde(default)]
    pub level: SkillLevel,
}

impl SkillRequirement {
    pub fn new<S: Into<String>>(name: S, level: SkillLevel) -> Self {
        Self { name: name.into(), level }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSkill {
    pub name: String,
    #[serde(default)]
    pub proficiency_level: SkillLevel,
}

impl CandidateSkill {
    pub fn new<S: Into<String>>(name: S, proficiency_level: SkillLevel) -> Self {
        Self { name: name.into(), proficiency_level }
    }
}

//--------------------------------------         Post          ---------------------------------------------------------
/// A job opening. Posts are owned by the marketplace application and are read-only to the auction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub required_skills: Vec<SkillRequirement>,
    pub created_at: DateTime<Utc>,
}

#[cfg(feature = "sqlite")]
impl FromRow<'_, SqliteRow> for Post {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let required_skills: Json<Vec<SkillRequirement>> = row.try_get("required_skills")?;
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            required_skills: required_skills.0,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: PostId,
    pub title: String,
    pub required_skills: Vec<SkillRequirement>,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    pub fn new<S: Into<String>>(id: PostId, title: S, required_skills: Vec<SkillRequirement>) -> Self {
        Self { id, title: title.into(), required_skills, created_at: Utc::now() }
    }
}

//--------------------------------------   CandidateProfile    ---------------------------------------------------------
/// A candidate's profile. Only the skills and the settlement account are of interest to the auction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: i64,
    pub candidate_id: String,
    pub account_id: AccountId,
    pub skills: Vec<CandidateSkill>,
}

#[cfg(feature = "sqlite")]
impl FromRow<'_, SqliteRow> for CandidateProfile {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let skills: Json<Vec<CandidateSkill>> = row.try_get("skills")?;
        Ok(Self {
            id: row.try_get("id")?,
            candidate_id: row.try_get("candidate_id")?,
            account_id: row.try_get("account_id")?,
            skills: skills.0,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewCandidateProfile {
    pub candidate_id: String,
    pub account_id: AccountId,
    pub skills: Vec<CandidateSkill>,
}

impl NewCandidateProfile {
    pub fn new<S: Into<String>>(candidate_id: S, account_id: AccountId, skills: Vec<CandidateSkill>) -> Self {
        Self { candidate_id: candidate_id.into(), account_id, skills }
    }
}

//--------------------------------------      BidStatus        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    /// The bid has been created by the matching job and has not been evaluated yet.
    Pending,
    /// The bid is the current highest bid for the post. At most one bid per post has this status.
    Active,
    /// The bid was displaced by a higher bid and its amount was returned to the bidder.
    Refunded,
    /// The auction closed with this bid in the lead and the award transfer succeeded.
    Won,
}

impl Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BidStatus::Pending => write!(f, "pending"),
            BidStatus::Active => write!(f, "active"),
            BidStatus::Refunded => write!(f, "refunded"),
            BidStatus::Won => write!(f, "won"),
        }
    }
}

impl FromStr for BidStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "refunded" => Ok(Self::Refunded),
            "won" => Ok(Self::Won),
            s => Err(ConversionError(format!("Invalid bid status: {s}"))),
        }
    }
}

impl From<String> for BidStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid bid status: {value}. But this conversion cannot fail. Defaulting to pending");
            BidStatus::Pending
        })
    }
}

//--------------------------------------          Bid          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub post_id: PostId,
    pub bidder_id: String,
    pub bidder_account: AccountId,
    pub amount: Tokens,
    pub score: f64,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Display for Bid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bid #{} [{}] {} by {} on post {}", self.id, self.status, self.amount, self.bidder_id, self.post_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewBid {
    pub post_id: PostId,
    pub bidder_id: String,
    pub bidder_account: AccountId,
    pub amount: Tokens,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

impl NewBid {
    pub fn new<S: Into<String>>(
        post_id: PostId,
        bidder_id: S,
        bidder_account: AccountId,
        amount: Tokens,
        score: f64,
    ) -> Self {
        Self { post_id, bidder_id: bidder_id.into(), bidder_account, amount, score, created_at: Utc::now() }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------     TopicStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    /// The auction is open and accepting bids.
    Active,
    /// The auction has closed. This is terminal.
    Closed,
}

impl Display for TopicStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopicStatus::Active => write!(f, "active"),
            TopicStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for TopicStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            s => Err(ConversionError(format!("Invalid topic status: {s}"))),
        }
    }
}

//--------------------------------------         Topic         ---------------------------------------------------------
/// The communication channel bound to one post's auction. There is exactly one topic per post.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub post_id: PostId,
    pub topic_id: TopicId,
    pub status: TopicStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Topic {
    pub fn is_closed(&self) -> bool {
        self.status == TopicStatus::Closed
    }
}

//--------------------------------------         Agent         ---------------------------------------------------------
/// A named identity on the ledger. Post agents own their post's topic; the main agent pays refunds and awards.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    pub account_id: AccountId,
    pub public_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAgent {
    pub name: String,
    pub account_id: AccountId,
    pub public_key: String,
}

impl NewAgent {
    pub fn new<S: Into<String>>(name: S, account_id: AccountId, public_key: String) -> Self {
        Self { name: name.into(), account_id, public_key }
    }
}

//--------------------------------------        JobKind        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    PostMatching,
    ProcessBids,
}

impl Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::PostMatching => write!(f, "post matching"),
            JobKind::ProcessBids => write!(f, "process bids"),
        }
    }
}

//--------------------------------------       JobRecord       ---------------------------------------------------------
/// A persisted recurring job registration. The `context` column holds the JSON-serialized job context.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct JobRecord {
    pub id: i64,
    pub post_id: PostId,
    pub job_kind: JobKind,
    pub context: String,
    pub interval_secs: i64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub disabled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewJobRecord {
    pub post_id: PostId,
    pub job_kind: JobKind,
    pub context: String,
    pub interval_secs: i64,
}

impl NewJobRecord {
    pub fn new(post_id: PostId, job_kind: JobKind, context: String, interval_secs: i64) -> Self {
        Self { post_id, job_kind, context, interval_secs }
    }
}
