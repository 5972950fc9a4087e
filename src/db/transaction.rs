/*!
 * Transaction Helper Utilities
 *
 * Runs a unit of work inside a database transaction: commit on `Ok`,
 * rollback on `Err`, with the closure's own `ServiceError` preserved.
 */

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;

use crate::errors::ServiceError;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// # Example
///
/// ```rust,ignore
/// let job = with_transaction(&db, move |txn| {
///     Box::pin(async move {
///         let job = job::Entity::find_by_id(id).one(txn).await?;
///         // ... more writes through `txn`
///         Ok(job)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T>(db: &DatabaseConnection, f: F) -> Result<T, ServiceError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>> + Send,
    T: Send,
{
    db.transaction::<F, T, ServiceError>(f)
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            TransactionError::Transaction(err) => err,
        })
}
