//! Shared helpers for the Diesel repositories.
//!
//! Error mapping is generic over the port error so each repository passes its
//! own `connection`/`query` constructors. Database messages are forwarded
//! unchanged; the domain reports them as `StoreUnavailable` verbatim.

use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure onto a port's connection error.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    connection(error.into_message())
}

/// Map a Diesel failure onto a port's query or connection error.
///
/// `operation` names the statement in the debug log.
pub(crate) fn map_diesel_error<E>(
    error: diesel::result::Error,
    operation: &'static str,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), operation, "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            operation,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            connection(info.message().to_owned())
        }
        DieselError::DatabaseError(_, info) => query(info.message().to_owned()),
        DieselError::NotFound => query("record not found".to_owned()),
        other => query(other.to_string()),
    }
}

/// Convert an affected-row or element count to the port's `u64`.
pub(crate) fn count_to_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

/// Convert a stored rater list length to the domain's `u32` count.
pub(crate) fn rater_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Probe {
        Query(String),
        Connection(String),
    }

    fn map(error: DieselError) -> Probe {
        map_diesel_error(error, "probe", Probe::Query, Probe::Connection)
    }

    #[rstest]
    fn closed_connection_is_a_connection_error() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert_eq!(
            map(error),
            Probe::Connection("server closed the connection".to_owned())
        );
    }

    #[rstest]
    fn other_database_errors_keep_their_message() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_owned()),
        );
        assert_eq!(map(error), Probe::Query("duplicate key value".to_owned()));
    }

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let mapped = map_pool_error(PoolError::checkout("timed out"), Probe::Connection);
        assert_eq!(mapped, Probe::Connection("timed out".to_owned()));
    }
}
