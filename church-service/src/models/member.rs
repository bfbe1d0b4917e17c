use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
    Visitor,
    Member,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "ACTIVE",
            MemberStatus::Inactive => "INACTIVE",
            MemberStatus::Visitor => "VISITOR",
            MemberStatus::Member => "MEMBER",
        }
    }
}

impl std::str::FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(MemberStatus::Active),
            "INACTIVE" => Ok(MemberStatus::Inactive),
            "VISITOR" => Ok(MemberStatus::Visitor),
            "MEMBER" => Ok(MemberStatus::Member),
            _ => Err(format!("Invalid member status: {}", s)),
        }
    }
}

/// Member row. Always scoped to exactly one church.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub church_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub baptism_date: Option<NaiveDate>,
    #[schema(example = "ACTIVE")]
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub baptism_date: Option<NaiveDate>,
    pub status: MemberStatus,
    pub notes: Option<String>,
}

impl NewMember {
    pub fn into_member(self, church_id: &str, now: DateTime<Utc>) -> Member {
        Member {
            id: Uuid::new_v4().to_string(),
            church_id: church_id.to_string(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            birth_date: self.birth_date,
            baptism_date: self.baptism_date,
            status: self.status.as_str().to_string(),
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub baptism_date: Option<NaiveDate>,
    pub status: Option<MemberStatus>,
    pub notes: Option<String>,
}

impl MemberUpdate {
    pub fn apply(self, member: &mut Member, now: DateTime<Utc>) {
        if let Some(v) = self.first_name {
            member.first_name = v;
        }
        if let Some(v) = self.last_name {
            member.last_name = v;
        }
        if let Some(v) = self.email {
            member.email = Some(v);
        }
        if let Some(v) = self.phone {
            member.phone = Some(v);
        }
        if let Some(v) = self.address {
            member.address = Some(v);
        }
        if let Some(v) = self.birth_date {
            member.birth_date = Some(v);
        }
        if let Some(v) = self.baptism_date {
            member.baptism_date = Some(v);
        }
        if let Some(v) = self.status {
            member.status = v.as_str().to_string();
        }
        if let Some(v) = self.notes {
            member.notes = Some(v);
        }
        member.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MemberStats {
    pub total: i64,
    pub active: i64,
    pub visitors: i64,
    pub members: i64,
    pub inactive: i64,
}

impl MemberStats {
    /// `inactive` is everything that is not ACTIVE.
    pub fn new(total: i64, active: i64, visitors: i64, members: i64) -> Self {
        Self {
            total,
            active,
            visitors,
            members,
            inactive: total - active,
        }
    }

    pub fn from_members<'a>(members: impl IntoIterator<Item = &'a Member>) -> Self {
        let (mut total, mut active, mut visitors, mut regular) = (0, 0, 0, 0);
        for m in members {
            total += 1;
            match m.status.parse::<MemberStatus>() {
                Ok(MemberStatus::Active) => active += 1,
                Ok(MemberStatus::Visitor) => visitors += 1,
                Ok(MemberStatus::Member) => regular += 1,
                _ => {}
            }
        }
        Self::new(total, active, visitors, regular)
    }
}
