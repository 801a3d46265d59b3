/// All internal database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Externally-issued user identity (from the identity service token).
pub type UserId = uuid::Uuid;

/// Externally-issued tenant identity (from the identity service token).
pub type CompanyId = uuid::Uuid;
