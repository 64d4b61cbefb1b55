//! Explicit transaction boundary for repository mutations.

use crate::error::MetadataResult;
use sqlx::{Sqlite, SqliteConnection, Transaction};

/// A batch of repository mutations that commit or roll back together.
///
/// Obtained from [`MetadataStore::begin`](crate::MetadataStore::begin). Every
/// mutating repository call borrows it mutably; nothing is visible to other
/// connections until [`commit`](Self::commit). Dropping an uncommitted unit
/// rolls it back.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
    affected: u64,
}

impl UnitOfWork {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx, affected: 0 }
    }

    /// Connection bound to this transaction.
    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    /// Count rows touched by a statement run inside this unit.
    pub(crate) fn record(&mut self, rows: u64) {
        self.affected += rows;
    }

    /// Rows touched so far.
    pub fn affected(&self) -> u64 {
        self.affected
    }

    /// Persist every change made in this unit and return the number of rows
    /// written.
    pub async fn commit(self) -> MetadataResult<u64> {
        let affected = self.affected;
        self.tx.commit().await?;
        tracing::debug!(rows = affected, "unit of work committed");
        Ok(affected)
    }

    /// Discard every change made in this unit.
    pub async fn rollback(self) -> MetadataResult<()> {
        self.tx.rollback().await?;
        tracing::debug!(rows = self.affected, "unit of work rolled back");
        Ok(())
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("affected", &self.affected)
            .finish_non_exhaustive()
    }
}
