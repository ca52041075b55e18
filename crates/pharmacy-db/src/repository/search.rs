//! # Search Repository
//!
//! Name search across pharmacies and masks.
//!
//! SQLite has no trigram operator, so candidates are loaded in id order and
//! scored with [`pharmacy_core::search`]. The stable ranking keeps
//! pharmacies ahead of masks (then lower ids first) when scores tie.

use sqlx::SqlitePool;
use tracing::debug;

use pharmacy_core::search::{paginate, rank};
use pharmacy_core::{EntityKind, Mask, PageRequest, Pharmacy, SearchHit, SearchType};

use crate::error::DbResult;

/// Repository for ranked name search.
#[derive(Debug, Clone)]
pub struct SearchRepository {
    pool: SqlitePool,
}

impl SearchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SearchRepository { pool }
    }

    /// Ranked `{id, name, type}` hits for `term` within `scope`.
    ///
    /// Ranking covers every match; `page` is applied afterwards.
    pub async fn search(
        &self,
        term: &str,
        scope: SearchType,
        page: PageRequest,
    ) -> DbResult<Vec<SearchHit>> {
        debug!(term, ?scope, skip = page.skip, limit = page.limit, "Searching");

        let mut candidates = Vec::new();

        if scope.includes(EntityKind::Pharmacy) {
            candidates.extend(self.all_pharmacies().await?.into_iter().map(|p| SearchHit {
                id: p.id,
                name: p.name,
                kind: EntityKind::Pharmacy,
            }));
        }

        if scope.includes(EntityKind::Mask) {
            candidates.extend(self.all_masks().await?.into_iter().map(|m| SearchHit {
                id: m.id,
                name: m.name,
                kind: EntityKind::Mask,
            }));
        }

        let ranked = rank(term, candidates);
        debug!(matches = ranked.len(), "Search ranked");

        Ok(paginate(ranked, page))
    }

    /// Ranked pharmacies matching `term`.
    pub async fn pharmacies(&self, term: &str) -> DbResult<Vec<Pharmacy>> {
        Ok(rank(term, self.all_pharmacies().await?))
    }

    /// Ranked masks matching `term`.
    pub async fn masks(&self, term: &str) -> DbResult<Vec<Mask>> {
        Ok(rank(term, self.all_masks().await?))
    }

    async fn all_pharmacies(&self) -> DbResult<Vec<Pharmacy>> {
        let rows = sqlx::query_as::<_, Pharmacy>(
            "SELECT id, name, cash_balance_cents FROM pharmacies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn all_masks(&self) -> DbResult<Vec<Mask>> {
        let rows = sqlx::query_as::<_, Mask>("SELECT id, name FROM masks ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
