pub const SCHEMA: &str = r#"
-- Principals that authenticate with Basic credentials
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,       -- argon2id hash with embedded salt
    admin INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Groups aggregate grants for their members
CREATE TABLE IF NOT EXISTS principal_groups (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id INTEGER NOT NULL REFERENCES principal_groups(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (group_id, user_id)
);

-- Grants; the owner is either a user or a group
CREATE TABLE IF NOT EXISTS permissions (
    id INTEGER PRIMARY KEY,
    type TEXT NOT NULL,                -- registry, catalog, namespace, repository
    class TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL,
    action TEXT NOT NULL,              -- pull, push, admin
    owner_kind TEXT NOT NULL CHECK (owner_kind IN ('user', 'group')),
    owner_id INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(owner_kind, owner_id, type, class, name)
);

-- Signing credentials; the id is also the certificate serial
CREATE TABLE IF NOT EXISTS pki (
    id INTEGER PRIMARY KEY,
    algorithm TEXT NOT NULL,           -- EC, RSA
    bits INTEGER NOT NULL,
    private_key TEXT NOT NULL,
    certificate TEXT NOT NULL,
    not_before TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Issued tokens; reserved, issuance does not record here
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,               -- jti
    subject TEXT NOT NULL,
    audience TEXT,
    issued_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_group_members_user ON group_members(user_id);
CREATE INDEX IF NOT EXISTS idx_permissions_owner ON permissions(owner_kind, owner_id);
CREATE INDEX IF NOT EXISTS idx_pki_active ON pki(active, expires_at);
"#;
