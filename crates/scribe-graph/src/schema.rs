//! Schema definition.
//!
//! Scheduling lives in the views at the bottom: `undocumented_call_counts`
//! ranks undocumented symbols by outgoing fan-out, and
//! `next_symbol_to_document` picks the first of them deterministically.

use rusqlite::Connection;

use crate::error::StoreError;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id          INTEGER PRIMARY KEY,
    root_path   TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS scan_state (
    project_id        INTEGER PRIMARY KEY REFERENCES projects(id) ON DELETE CASCADE,
    aggregate_digest  TEXT,
    scan_complete     INTEGER NOT NULL DEFAULT 0,
    updated_at        TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS folders (
    id          INTEGER PRIMARY KEY,
    project_id  INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    parent_id   INTEGER REFERENCES folders(id) ON DELETE CASCADE,
    name        TEXT NOT NULL
);

-- NULL parents would otherwise compare unequal to each other.
CREATE UNIQUE INDEX IF NOT EXISTS folders_identity
    ON folders(project_id, name, COALESCE(parent_id, 0));

CREATE TABLE IF NOT EXISTS files (
    id          INTEGER PRIMARY KEY,
    project_id  INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    folder_id   INTEGER REFERENCES folders(id) ON DELETE SET NULL,
    rel_path    TEXT NOT NULL,
    language    TEXT NOT NULL,
    digest      TEXT NOT NULL,
    failed      INTEGER NOT NULL DEFAULT 0,
    documented  INTEGER NOT NULL DEFAULT 0,
    doc_json    TEXT,
    UNIQUE (project_id, rel_path)
);

CREATE TABLE IF NOT EXISTS symbols (
    id              INTEGER PRIMARY KEY,
    file_id         INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    kind            TEXT NOT NULL,
    detail          TEXT,
    start_line      INTEGER NOT NULL,
    start_char      INTEGER NOT NULL,
    end_line        INTEGER NOT NULL,
    end_char        INTEGER NOT NULL,
    sel_start_line  INTEGER NOT NULL,
    sel_start_char  INTEGER NOT NULL,
    sel_end_line    INTEGER NOT NULL,
    sel_end_char    INTEGER NOT NULL,
    parent_id       INTEGER REFERENCES symbols(id) ON DELETE CASCADE,
    documented      INTEGER NOT NULL DEFAULT 0,
    doc_json        TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS symbols_identity
    ON symbols(file_id, name, kind, start_line, COALESCE(parent_id, 0));

CREATE INDEX IF NOT EXISTS symbols_by_file ON symbols(file_id);

CREATE TABLE IF NOT EXISTS relationships (
    id         INTEGER PRIMARY KEY,
    caller_id  INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    callee_id  INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    kind       TEXT NOT NULL DEFAULT 'calls',
    UNIQUE (caller_id, callee_id, kind),
    CHECK (caller_id <> callee_id)
);

CREATE INDEX IF NOT EXISTS relationships_by_caller ON relationships(caller_id);
CREATE INDEX IF NOT EXISTS relationships_by_callee ON relationships(callee_id);

-- Outgoing fan-out of every undocumented symbol. The count is static:
-- documenting a callee does not change its caller's count. Only call
-- edges count; inherits/uses relations do not affect scheduling.
CREATE VIEW IF NOT EXISTS undocumented_call_counts AS
    SELECT s.id AS symbol_id, COUNT(r.callee_id) AS calls
    FROM symbols s
    LEFT JOIN relationships r ON r.caller_id = s.id AND r.kind = 'calls'
    WHERE s.documented = 0
    GROUP BY s.id;

CREATE VIEW IF NOT EXISTS min_undocumented_call_count AS
    SELECT MIN(calls) AS calls FROM undocumented_call_counts;

-- Leaves first; symbol id breaks ties so the order is reproducible.
CREATE VIEW IF NOT EXISTS next_symbol_to_document AS
    SELECT symbol_id, calls
    FROM undocumented_call_counts
    ORDER BY calls ASC, symbol_id ASC
    LIMIT 1;

-- The full shape the generation step is fed: the symbol, its file,
-- its parent, and callee summaries as a JSON array.
CREATE VIEW IF NOT EXISTS symbol_context AS
    SELECT s.id AS symbol_id,
           s.name,
           s.kind,
           f.rel_path,
           p.name AS parent_name,
           (SELECT json_group_array(json_object(
                       'name', c.name,
                       'kind', c.kind,
                       'summary', json_extract(c.doc_json, '$.summary')))
            FROM relationships r
            JOIN symbols c ON c.id = r.callee_id
            WHERE r.caller_id = s.id) AS callees_json
    FROM symbols s
    JOIN files f ON f.id = s.file_id
    LEFT JOIN symbols p ON p.id = s.parent_id;
";

pub fn init(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
