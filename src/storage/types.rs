use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of dexterm appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify a sqlx error, mapping SQLite lock conditions to `InstanceLocked`.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }

    /// Classify a schema setup failure. Lock conditions stay `InstanceLocked`.
    pub(crate) fn from_migration(err: sqlx::Error) -> Self {
        match Self::from_sqlx(err) {
            DatabaseError::Other(e) => DatabaseError::Migration(e.to_string()),
            locked => locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_lock_error_is_other() {
        let err = DatabaseError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::Other(_)));
    }

    #[test]
    fn test_migration_failure_keeps_lock_detection() {
        let locked = sqlx::Error::Protocol("database is locked".to_string());
        assert!(matches!(
            DatabaseError::from_migration(locked),
            DatabaseError::InstanceLocked
        ));
        assert!(matches!(
            DatabaseError::from_migration(sqlx::Error::RowNotFound),
            DatabaseError::Migration(_)
        ));
    }

    #[test]
    fn test_messages_name_the_app() {
        assert!(DatabaseError::InstanceLocked.to_string().contains("dexterm"));
        assert_eq!(
            DatabaseError::Migration("disk full".into()).to_string(),
            "Database migration failed: disk full"
        );
    }
}
