//! Go-to-definition.
//!
//! Definitions are looked up in two stages. The local stage asks each bundle
//! for the definitions it recorded at the position. Only when no bundle has
//! any does the federated stage follow import monikers to the bundle that
//! exports the symbol.

use tokio_util::sync::CancellationToken;

use super::QueryResolver;
use super::resolver::BundleTarget;
use crate::base::Position;
use crate::error::Result;
use crate::model::{
    AdjustedLocation, Moniker, MonikerKind, MonikerTable, ResolvedLocation, linked_monikers,
    resolve_locations,
};

impl QueryResolver {
    /// Definitions of the symbol at `line:character` of the requested document.
    ///
    /// Returns the first non-empty definition set in bundle order, or an
    /// empty list when no bundle knows the symbol.
    pub fn definitions(
        &self,
        cancel: &CancellationToken,
        line: u32,
        character: u32,
    ) -> Result<Vec<AdjustedLocation>> {
        self.observe("definitions", || {
            tracing::debug!(line, character, "resolving definitions");
            let position = Position::new(line, character);
            let targets = self.adjust_position_per_bundle(cancel, position)?;

            for target in &targets {
                let locations = self.collaborators.index.definitions(
                    cancel,
                    target.bundle.id,
                    target.relative_path(),
                    target.position,
                )?;
                if !locations.is_empty() {
                    let resolved = resolve_locations(target.bundle, locations);
                    return self.adjust_locations(cancel, resolved);
                }
            }

            for target in &targets {
                let locations = self.federated_definitions(cancel, target)?;
                if !locations.is_empty() {
                    return self.adjust_locations(cancel, locations);
                }
            }

            Ok(Vec::new())
        })
    }

    /// Definitions reachable through the import monikers at the target position.
    fn federated_definitions(
        &self,
        cancel: &CancellationToken,
        target: &BundleTarget<'_>,
    ) -> Result<Vec<ResolvedLocation>> {
        let groups = self.collaborators.index.monikers_by_position(
            cancel,
            target.bundle.id,
            target.relative_path(),
            target.position,
        )?;

        for moniker in linked_monikers(groups.into_iter().flatten(), MonikerKind::Import) {
            let locations = self.exported_definitions(cancel, target, &moniker)?;
            if !locations.is_empty() {
                return Ok(locations);
            }
        }
        Ok(Vec::new())
    }

    fn exported_definitions(
        &self,
        cancel: &CancellationToken,
        target: &BundleTarget<'_>,
        moniker: &Moniker,
    ) -> Result<Vec<ResolvedLocation>> {
        let Some(package_id) = moniker.package_information_id.as_deref() else {
            return Ok(Vec::new());
        };
        let Some(package) = self.collaborators.index.package_information(
            cancel,
            target.bundle.id,
            target.relative_path(),
            package_id,
        )?
        else {
            tracing::trace!(
                identifier = %moniker.identifier,
                "no package information for import moniker"
            );
            return Ok(Vec::new());
        };
        let Some(exporter) = self
            .collaborators
            .packages
            .resolve_export(cancel, &moniker.scheme, &package)?
        else {
            tracing::trace!(package = %package.name, "no bundle exports package");
            return Ok(Vec::new());
        };

        let limit = self.config.definition_moniker_limit;
        let mut page = self.collaborators.index.moniker_results(
            cancel,
            exporter.id,
            MonikerTable::Definitions,
            &moniker.scheme,
            &moniker.identifier,
            0,
            limit,
        )?;
        page.items.truncate(limit);
        Ok(resolve_locations(&exporter, page.items))
    }
}
