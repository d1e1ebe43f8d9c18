//! Schema contract shared by the resetter, the seeders and the verifier
//!
//! Every table the generator writes and every relationship the verifier
//! checks is declared here once. Identifiers in generated SQL only ever come
//! from these constants.

use std::fmt;

// ============================================================================
// Tables
// ============================================================================

/// A table in one of the schema namespaces, with its primary key column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Table {
    pub schema: &'static str,
    pub name: &'static str,
    pub key: &'static str,
}

impl Table {
    pub const fn new(schema: &'static str, name: &'static str, key: &'static str) -> Self {
        Self { schema, name, key }
    }

    /// `schema.name`, as used in SQL
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

// Reference namespace
pub const TECH_STACK: Table = Table::new("reference", "tech_stack_reference", "tech_id");
pub const FEATURE: Table = Table::new("reference", "feature_reference", "feature_id");
pub const ACCESS_ROLE: Table = Table::new("reference", "access_role_reference", "role_id");
pub const LICENSE: Table = Table::new("reference", "license_reference", "license_id");
pub const PHASE: Table = Table::new("reference", "phase_reference", "phase_id");
pub const DECISION_TYPE: Table = Table::new("reference", "decision_type_reference", "type_id");
pub const TAG: Table = Table::new("reference", "tag_reference", "tag_id");
pub const FILETYPE: Table = Table::new("reference", "filetype_reference", "filetype_id");
pub const STORAGE: Table = Table::new("reference", "storage_reference", "storage_id");
pub const PRIORITY: Table = Table::new("reference", "priority_reference", "priority_id");

// Users namespace
pub const USERS: Table = Table::new("users", "users", "user_id");
pub const SESSIONS: Table = Table::new("users", "sessions", "session_id");

// Projects namespace
pub const PROJECTS: Table = Table::new("projects", "projects", "project_id");
pub const PROJECT_FEATURE: Table = Table::new("projects", "project_feature", "project_feature_id");
pub const PROJECT_TECH_STACK: Table =
    Table::new("projects", "project_tech_stack", "project_tech_id");
pub const PROJECT_TAG: Table = Table::new("projects", "project_tag", "project_tag_id");
pub const DECISION_LOG: Table = Table::new("projects", "project_decision_log", "decision_id");

// Documents namespace
pub const DOCUMENTS: Table = Table::new("documents", "documents", "document_id");

// Audit namespace
pub const PROJECT_HISTORY: Table = Table::new("audit", "project_history", "history_id");
pub const DOCUMENT_HISTORY: Table = Table::new("audit", "document_history", "history_id");

pub const REFERENCE_TABLES: [Table; 10] = [
    TECH_STACK,
    FEATURE,
    ACCESS_ROLE,
    LICENSE,
    PHASE,
    DECISION_TYPE,
    TAG,
    FILETYPE,
    STORAGE,
    PRIORITY,
];

/// Every table of the contract, parents before dependents
pub const ALL_TABLES: [Table; 20] = [
    TECH_STACK,
    FEATURE,
    ACCESS_ROLE,
    LICENSE,
    PHASE,
    DECISION_TYPE,
    TAG,
    FILETYPE,
    STORAGE,
    PRIORITY,
    USERS,
    SESSIONS,
    PROJECTS,
    PROJECT_FEATURE,
    PROJECT_TECH_STACK,
    PROJECT_TAG,
    DOCUMENTS,
    DECISION_LOG,
    PROJECT_HISTORY,
    DOCUMENT_HISTORY,
];

// ============================================================================
// Column-level contract
// ============================================================================

/// A foreign key column and the table it must resolve into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: Table,
    pub column: &'static str,
    pub references: Table,
    pub nullable: bool,
}

const fn fk(table: Table, column: &'static str, references: Table) -> ForeignKey {
    ForeignKey {
        table,
        column,
        references,
        nullable: false,
    }
}

const fn nullable_fk(table: Table, column: &'static str, references: Table) -> ForeignKey {
    ForeignKey {
        table,
        column,
        references,
        nullable: true,
    }
}

pub const FOREIGN_KEYS: &[ForeignKey] = &[
    fk(SESSIONS, "user_id", USERS),
    fk(PROJECTS, "owner_id", USERS),
    nullable_fk(PROJECTS, "updated_by", USERS),
    fk(PROJECTS, "phase_id", PHASE),
    fk(PROJECTS, "license_id", LICENSE),
    fk(PROJECTS, "priority_id", PRIORITY),
    fk(PROJECT_FEATURE, "project_id", PROJECTS),
    fk(PROJECT_FEATURE, "feature_id", FEATURE),
    fk(PROJECT_TECH_STACK, "project_id", PROJECTS),
    fk(PROJECT_TECH_STACK, "tech_id", TECH_STACK),
    fk(PROJECT_TAG, "project_id", PROJECTS),
    fk(PROJECT_TAG, "tag_id", TAG),
    fk(DECISION_LOG, "project_id", PROJECTS),
    fk(DECISION_LOG, "decided_by", USERS),
    fk(DECISION_LOG, "type_id", DECISION_TYPE),
    nullable_fk(DECISION_LOG, "related_feature_id", FEATURE),
    nullable_fk(DECISION_LOG, "related_document_id", DOCUMENTS),
    fk(DOCUMENTS, "project_id", PROJECTS),
    fk(DOCUMENTS, "filetype_id", FILETYPE),
    fk(DOCUMENTS, "storage_id", STORAGE),
    fk(DOCUMENTS, "priority_id", PRIORITY),
    fk(DOCUMENTS, "phase_id", PHASE),
    fk(PROJECT_HISTORY, "project_id", PROJECTS),
    fk(PROJECT_HISTORY, "changed_by", USERS),
    fk(PROJECT_HISTORY, "owner_id", USERS),
    fk(PROJECT_HISTORY, "priority_id", PRIORITY),
    fk(DOCUMENT_HISTORY, "document_id", DOCUMENTS),
    fk(DOCUMENT_HISTORY, "changed_by", USERS),
    nullable_fk(DOCUMENT_HISTORY, "priority_id", PRIORITY),
    nullable_fk(DOCUMENT_HISTORY, "phase_id", PHASE),
    nullable_fk(DOCUMENT_HISTORY, "filetype_id", FILETYPE),
    nullable_fk(DOCUMENT_HISTORY, "storage_id", STORAGE),
];

/// A plain column reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub table: Table,
    pub name: &'static str,
}

const fn col(table: Table, name: &'static str) -> Column {
    Column { table, name }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

/// Columns that must hold a JSON object
pub const JSON_COLUMNS: &[Column] = &[
    col(SESSIONS, "metadata"),
    col(PROJECTS, "endpoints"),
    col(PROJECTS, "settings"),
    col(DOCUMENTS, "custom_properties"),
    col(PROJECT_HISTORY, "change_summary"),
    col(PROJECT_HISTORY, "settings"),
    col(PROJECT_HISTORY, "endpoints"),
];

/// Columns that must decode as a timestamp
pub const TIMESTAMP_COLUMNS: &[Column] = &[
    col(SESSIONS, "created_at"),
    col(SESSIONS, "last_active_at"),
    col(SESSIONS, "expires_at"),
    col(SESSIONS, "revoked_at"),
    col(PROJECTS, "created_at"),
    col(PROJECTS, "updated_at"),
    col(PROJECTS, "deleted_at"),
    col(DECISION_LOG, "decided_at"),
    col(DOCUMENTS, "uploaded_at"),
    col(DOCUMENTS, "deleted_at"),
    col(PROJECT_HISTORY, "changed_at"),
    col(PROJECT_HISTORY, "deleted_at"),
    col(DOCUMENT_HISTORY, "changed_at"),
];

/// Inclusive bound on a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub column: Column,
    pub min: i64,
    pub max: i64,
}

pub const VERSION_MIN: i64 = 0;
pub const VERSION_MAX: i64 = 10;

pub const BOUNDED_COLUMNS: &[Bound] = &[
    Bound {
        column: col(PROJECT_HISTORY, "version"),
        min: VERSION_MIN,
        max: VERSION_MAX,
    },
    Bound {
        column: col(DOCUMENT_HISTORY, "version"),
        min: VERSION_MIN,
        max: VERSION_MAX,
    },
];

/// Tables expected to hold rows after a full run
pub const POPULATED_TABLES: [Table; 3] = [USERS, SESSIONS, PROJECTS];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_qualified_name() {
        assert_eq!(USERS.qualified(), "users.users");
        assert_eq!(DECISION_LOG.to_string(), "projects.project_decision_log");
    }

    #[test]
    fn test_all_tables_unique() {
        let unique: HashSet<_> = ALL_TABLES.iter().collect();
        assert_eq!(unique.len(), ALL_TABLES.len());
    }

    #[test]
    fn test_parents_listed_before_dependents() {
        let position = |t: &Table| ALL_TABLES.iter().position(|x| x == t);
        for key in FOREIGN_KEYS {
            // decision log points at documents, which is seeded before it
            let child = position(&key.table).expect("child table in catalog");
            let parent = position(&key.references).expect("parent table in catalog");
            assert!(
                parent < child,
                "{} listed before its parent {}",
                key.table,
                key.references
            );
        }
    }

    #[test]
    fn test_reference_tables_have_no_foreign_keys() {
        for key in FOREIGN_KEYS {
            assert!(!REFERENCE_TABLES.contains(&key.table));
        }
    }
}
