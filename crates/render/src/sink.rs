use crate::error::{RenderError, Result};
use crate::tables::{
    BreakdownRow, DirectPolicyRow, InitiativeRow, MemberPolicyRow, BREAKDOWN_FILE,
    BREAKDOWN_HEADERS, DIRECT_POLICIES_FILE, DIRECT_POLICY_HEADERS, INITIATIVES_FILE,
    INITIATIVE_HEADERS, INITIATIVE_POLICIES_FILE, MEMBER_POLICY_HEADERS,
};
use catalog_model::{ResolvedInitiative, ResolvedPolicy, ScopedKey, SelectionSet};
use catalog_resolver::compose_breakdown;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Write the four catalog tables into `dir`, creating it if needed. The
/// include flags come from `selection`; a fresh extract passes an empty
/// selection, so every flag starts at `No`.
pub fn write_catalog(
    dir: &Path,
    initiatives: &[ResolvedInitiative],
    direct_policies: &[ResolvedPolicy],
    initiative_policies: &[ResolvedPolicy],
    selection: &SelectionSet,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    write_rows(
        &dir.join(INITIATIVES_FILE),
        INITIATIVE_HEADERS,
        initiatives.iter().map(|init| {
            Ok(InitiativeRow::from_resolved(
                init,
                selection.initiatives.contains(&init.scoped_key()),
            ))
        }),
    )?;
    write_rows(
        &dir.join(DIRECT_POLICIES_FILE),
        DIRECT_POLICY_HEADERS,
        direct_policies.iter().map(|policy| {
            DirectPolicyRow::from_resolved(
                policy,
                selection.direct_policies.contains(&policy.scoped_key()),
            )
        }),
    )?;
    write_rows(
        &dir.join(INITIATIVE_POLICIES_FILE),
        MEMBER_POLICY_HEADERS,
        initiative_policies.iter().map(MemberPolicyRow::from_resolved),
    )?;

    let breakdown = compose_breakdown(initiatives, direct_policies, selection);
    write_breakdown(dir, &breakdown)?;

    log::info!(
        "Wrote catalog to {}: {} initiatives, {} direct policies, {} expanded policies, {} breakdown rows",
        dir.display(),
        initiatives.len(),
        direct_policies.len(),
        initiative_policies.len(),
        breakdown.len()
    );
    Ok(())
}

/// Re-read the analyst's include flags from the listing tables.
pub fn read_selection(dir: &Path) -> Result<SelectionSet> {
    let initiative_rows: Vec<InitiativeRow> = read_rows(&dir.join(INITIATIVES_FILE))?;
    let direct_rows: Vec<DirectPolicyRow> = read_rows(&dir.join(DIRECT_POLICIES_FILE))?;

    let mut selection = SelectionSet::default();
    for row in initiative_rows.iter().filter(|r| r.included()) {
        selection.include_initiative(row.scoped_key());
    }
    for row in direct_rows.iter().filter(|r| r.included()) {
        selection.include_direct_policy(row.scoped_key());
    }
    Ok(selection)
}

/// Recompute `breakdown.csv` from the persisted tables and the edited
/// include flags. Entirely offline: selection changes are read, not
/// fetched. Returns the number of breakdown rows written.
pub fn recompute_breakdown(dir: &Path) -> Result<usize> {
    let selection = read_selection(dir)?;
    if selection.is_empty() {
        log::warn!("No rows are marked include=Yes; the breakdown will be empty");
    }

    let initiative_rows: Vec<InitiativeRow> = read_rows(&dir.join(INITIATIVES_FILE))?;
    let direct_rows: Vec<DirectPolicyRow> = read_rows(&dir.join(DIRECT_POLICIES_FILE))?;
    let member_rows: Vec<MemberPolicyRow> = read_rows(&dir.join(INITIATIVE_POLICIES_FILE))?;

    // Re-attach member rows to their initiative instances so the composer
    // sees the same shape the extract run produced.
    let mut members_by_parent: HashMap<ScopedKey, Vec<ResolvedPolicy>> = HashMap::new();
    for row in member_rows {
        let key = row.parent_key();
        members_by_parent.entry(key).or_default().push(row.into_resolved()?);
    }

    let initiatives: Vec<ResolvedInitiative> = initiative_rows
        .into_iter()
        .map(|row| {
            let mut init = row.into_resolved();
            init.members = members_by_parent.remove(&init.scoped_key()).unwrap_or_default();
            init
        })
        .collect();
    let direct_policies: Vec<ResolvedPolicy> = direct_rows
        .into_iter()
        .map(DirectPolicyRow::into_resolved)
        .collect::<Result<_>>()?;

    let breakdown = compose_breakdown(&initiatives, &direct_policies, &selection);
    write_breakdown(dir, &breakdown)?;
    log::info!("Recomputed breakdown: {} row(s)", breakdown.len());
    Ok(breakdown.len())
}

fn write_breakdown(dir: &Path, breakdown: &[ResolvedPolicy]) -> Result<()> {
    write_rows(
        &dir.join(BREAKDOWN_FILE),
        BREAKDOWN_HEADERS,
        breakdown.iter().map(BreakdownRow::from_resolved),
    )
}

/// Write one table: explicit header row first (so empty tables still carry
/// their columns), then the serialized records.
fn write_rows<R: Serialize>(
    path: &Path,
    headers: &[&str],
    rows: impl Iterator<Item = Result<R>>,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row?)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    if !path.exists() {
        return Err(RenderError::MissingTable(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}
