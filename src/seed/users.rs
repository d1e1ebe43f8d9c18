//! Users and their login sessions

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::Postgres;
use sqlx::query_builder::Separated;
use sqlx::types::Json;
use uuid::Uuid;

use super::IdPool;
use crate::database::Insertable;
use crate::error::Result;
use crate::fake::FakeData;
use crate::schema::{self, Table};

pub const DEVICES: &[&str] = &["Desktop", "Mobile", "Tablet"];

/// Share of sessions generated already revoked
const REVOKED_RATIO: f64 = 0.1;

const SESSION_LIFETIME_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
}

impl Insertable for NewUser {
    const TABLE: Table = schema::USERS;
    const COLUMNS: &'static [&'static str] = &["login", "password_hash"];

    fn push_binds<'args>(self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.login).push_bind(self.password_hash);
    }
}

/// Session metadata JSON object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub browser: String,
    pub device: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub session_id: Uuid,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub revoked_at: Option<DateTime<Utc>>,
    pub metadata: SessionMetadata,
}

impl Insertable for NewSession {
    const TABLE: Table = schema::SESSIONS;
    const COLUMNS: &'static [&'static str] = &[
        "session_id",
        "user_id",
        "created_at",
        "last_active_at",
        "expires_at",
        "ip_address",
        "user_agent",
        "revoked_at",
        "metadata",
    ];

    fn push_binds<'args>(self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.session_id)
            .push_bind(self.user_id)
            .push_bind(self.created_at)
            .push_bind(self.last_active_at)
            .push_bind(self.expires_at)
            .push_bind(self.ip_address)
            .push_bind(self.user_agent)
            .push_bind(self.revoked_at)
            .push_bind(Json(self.metadata));
    }
}

/// `count` users with distinct e-mail logins
pub fn generate_users(fake: &mut FakeData, count: usize) -> Vec<NewUser> {
    let mut seen = HashSet::with_capacity(count);
    let mut users = Vec::with_capacity(count);

    while users.len() < count {
        let login = fake.email();
        if !seen.insert(login.clone()) {
            continue;
        }
        users.push(NewUser {
            login,
            password_hash: fake.sha256_hex(),
        });
    }

    users
}

/// `count` sessions owned by users drawn from `user_ids`
pub fn generate_sessions(
    fake: &mut FakeData,
    user_ids: &IdPool,
    count: usize,
) -> Result<Vec<NewSession>> {
    let mut sessions = Vec::with_capacity(count);

    for _ in 0..count {
        let user_id = user_ids.pick(fake.rng())?;
        let created_at = fake.date_time_within_days(30);
        let expires_at = created_at + Duration::days(SESSION_LIFETIME_DAYS);
        let revoked_at = if fake.chance(REVOKED_RATIO) {
            let offset = fake.int_between(0, SESSION_LIFETIME_DAYS * 86_400);
            Some(created_at + Duration::seconds(offset))
        } else {
            None
        };
        let metadata = SessionMetadata {
            browser: fake.chrome(),
            device: fake.one_of(DEVICES).to_string(),
            location: fake.city().to_string(),
        };

        sessions.push(NewSession {
            session_id: fake.uuid(),
            user_id,
            created_at,
            last_active_at: created_at + Duration::hours(fake.int_between(1, 48)),
            expires_at,
            ip_address: fake.ipv4(),
            user_agent: fake.user_agent(),
            revoked_at,
            metadata,
        });
    }

    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeedError;

    #[test]
    fn test_generate_users_unique_logins() {
        let mut fake = FakeData::from_seed(11);
        let users = generate_users(&mut fake, 200);
        let logins: HashSet<_> = users.iter().map(|u| u.login.as_str()).collect();
        assert_eq!(users.len(), 200);
        assert_eq!(logins.len(), 200);
        assert!(users.iter().all(|u| u.login.contains('@') && u.login.contains('.')));
    }

    #[test]
    fn test_generate_sessions_without_users_fails() {
        let mut fake = FakeData::from_seed(12);
        let empty = IdPool::new(schema::USERS, vec![]);
        let err = generate_sessions(&mut fake, &empty, 3).unwrap_err();
        assert!(matches!(err, SeedError::EmptyDependency { .. }));
    }

    #[test]
    fn test_session_timeline_is_ordered() {
        let mut fake = FakeData::from_seed(13);
        let user_ids = IdPool::new(schema::USERS, vec![1, 2, 3]);
        let sessions = generate_sessions(&mut fake, &user_ids, 100).unwrap();

        for session in &sessions {
            assert!(user_ids.ids().contains(&session.user_id));
            assert!(session.last_active_at > session.created_at);
            assert!(session.last_active_at <= session.created_at + Duration::hours(48));
            assert_eq!(session.expires_at - session.created_at, Duration::days(30));
            if let Some(revoked) = session.revoked_at {
                assert!(revoked >= session.created_at && revoked <= session.expires_at);
            }
            assert!(DEVICES.contains(&session.metadata.device.as_str()));
        }
    }

    #[test]
    fn test_session_metadata_serializes_as_object() {
        let metadata = SessionMetadata {
            browser: "Chrome".to_string(),
            device: "Mobile".to_string(),
            location: "Port Michael".to_string(),
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert!(value.is_object());
        assert_eq!(value["device"], "Mobile");
    }
}
