//! SQL schema for the Tensei SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS entities (
    entity_id         TEXT PRIMARY KEY,
    login             TEXT NOT NULL,   -- always stored lowercase
    display_name      TEXT NOT NULL,
    profile_image_url TEXT NOT NULL DEFAULT '',
    stream_start_time TEXT NOT NULL,   -- RFC 3339 UTC
    stream_end_time   TEXT NOT NULL,   -- RFC 3339 UTC
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

-- Rewritten wholesale on every entity upsert; `position` keeps list order.
CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id       TEXT PRIMARY KEY,
    entity_id             TEXT NOT NULL REFERENCES entities(entity_id),
    position              INTEGER NOT NULL,
    destination_channel   TEXT NOT NULL,
    destination_community TEXT NOT NULL,
    last_message_handle   TEXT,
    UNIQUE (entity_id, destination_channel)
);

CREATE TABLE IF NOT EXISTS communities (
    community_id          TEXT PRIMARY KEY,
    owner_id              TEXT NOT NULL,
    admin_role_id         TEXT,
    command_cooldown_secs INTEGER NOT NULL DEFAULT 3
);

CREATE INDEX IF NOT EXISTS entities_login_idx      ON entities(login);
CREATE INDEX IF NOT EXISTS subscriptions_entity_idx ON subscriptions(entity_id);

PRAGMA user_version = 1;
";
