//! Space-move helper.
//!
//! Reassigns every document of a set of domains from one container (space) to
//! another and removes the source container once nothing references it.
//! Safe to use as a migration step: a second invocation finds nothing to move
//! and no container to remove.

use super::client::MigrationClient;
use crate::document::{Domain, Filter, SpaceRef};
use crate::error::Result;
use std::collections::BTreeMap;

/// What a space move did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpaceMoveReport {
    /// Documents reassigned per requested domain
    pub moved: BTreeMap<Domain, u64>,
    /// Documents still referencing the old space, per domain
    pub residual: BTreeMap<Domain, u64>,
    /// Whether the old container document was removed by this call
    pub container_removed: bool,
}

impl SpaceMoveReport {
    pub fn total_moved(&self) -> u64 {
        self.moved.values().sum()
    }

    pub fn has_residual(&self) -> bool {
        !self.residual.is_empty()
    }
}

/// Moves all documents of `domains` from `from` to `to`, then removes the `from`
/// container if no document in any domain still references it.
///
/// Residual references (e.g. a domain the caller forgot to list) keep the
/// container alive and are logged as a warning.
pub async fn migrate_space(
    client: &dyn MigrationClient,
    from: &SpaceRef,
    to: &SpaceRef,
    domains: &[Domain],
) -> Result<SpaceMoveReport> {
    let mut report = SpaceMoveReport::default();

    if from == to {
        tracing::debug!(space = %from, "Source and target space are identical, nothing to move");
        return Ok(report);
    }

    let filter = Filter::in_space(from);

    for domain in domains {
        let moved = client.move_to(domain, &filter, to).await?;
        tracing::debug!(
            domain = %domain,
            "Moved {} documents from {} to {}",
            moved,
            from,
            to
        );
        report.moved.insert(domain.clone(), moved);
    }

    for domain in client.domains().await? {
        if domain.is_reserved() {
            continue;
        }
        let remaining = client.count(&domain, &filter).await?;
        if remaining > 0 {
            report.residual.insert(domain, remaining);
        }
    }

    if report.has_residual() {
        let residual: Vec<String> = report
            .residual
            .iter()
            .map(|(domain, count)| format!("{}={}", domain, count))
            .collect();
        tracing::warn!(
            space = %from,
            "Space still referenced after move, keeping container: [{}]",
            residual.join(", ")
        );
        return Ok(report);
    }

    let removed = client
        .remove(&Domain::space(), &Filter::by_id(from))
        .await?;
    report.container_removed = removed > 0;

    tracing::info!(
        from = %from,
        to = %to,
        "Space migrated: {} documents moved, container removed: {}",
        report.total_moved(),
        report.container_removed
    );

    Ok(report)
}
