//! Edit application with merge/conflict rules.
//!
//! Given the cells of a classified entity-targeting line and the resolved
//! entity, dispatches on the second cell's marker and mutates the entity
//! in place. Idempotence rules: identical fingerprint/site-link values are
//! no-ops, differing ones are conflicts; aliases dedup by exact text;
//! qualifiers never dedup; references accumulate per line and are appended
//! without dedup against existing references.

use crate::error::BatchError;
use crate::model::{EntityDocument, Reference, Snak, Statement};
use crate::parser::{
    language_tag, parse_property_id_cell, parse_string_cell, parse_value_cell, site_tag,
};

/// Applies one entity-targeting line to its resolved entity.
///
/// `cells` is the whole line; the classifier guarantees an odd length of
/// at least three.
pub(crate) fn apply_edit(entity: &mut EntityDocument, cells: &[&str]) -> Result<(), BatchError> {
    let marker = cells[1];
    match marker.chars().next() {
        Some('L') => apply_label(entity, marker, cells[2]),
        Some('A') => apply_alias(entity, marker, cells[2]),
        Some('D') => apply_description(entity, marker, cells[2]),
        Some('S') => apply_site_link(entity, marker, cells[2]),
        Some('P') => apply_statement(entity, cells),
        _ => Err(BatchError::syntax(format!(
            "unknown property marker: {marker}"
        ))),
    }
}

/// How the entity is named in error messages. Fresh CREATE items have no
/// id yet.
fn target_name(entity: &EntityDocument) -> String {
    match entity.id() {
        Some(id) => id.to_string(),
        None => "new item".to_string(),
    }
}

fn apply_label(entity: &mut EntityDocument, marker: &str, cell: &str) -> Result<(), BatchError> {
    let target = target_name(entity);
    let Some(fingerprint) = entity.fingerprint_mut() else {
        return Err(BatchError::capability(format!(
            "{target} cannot carry labels"
        )));
    };
    let language = language_tag(marker, 'L')?;
    let text = parse_string_cell(cell)?;
    match fingerprint.labels.get(language) {
        Some(existing) if *existing != text => Err(BatchError::conflict(format!(
            "label already set to a different value in {language} for {target}"
        ))),
        Some(_) => Ok(()),
        None => {
            fingerprint.labels.insert(language.to_string(), text);
            Ok(())
        }
    }
}

fn apply_alias(entity: &mut EntityDocument, marker: &str, cell: &str) -> Result<(), BatchError> {
    let target = target_name(entity);
    let Some(fingerprint) = entity.fingerprint_mut() else {
        return Err(BatchError::capability(format!(
            "{target} cannot carry aliases"
        )));
    };
    let language = language_tag(marker, 'A')?;
    let text = parse_string_cell(cell)?;
    let aliases = fingerprint.aliases.entry(language.to_string()).or_default();
    if !aliases.contains(&text) {
        aliases.push(text);
    }
    Ok(())
}

// The description extractor uses its own `D` prefix. The system this
// replaces reused the label prefix here, which made every description line
// fail; `LAST<tab>Den<tab>"y"` is required to work.
fn apply_description(
    entity: &mut EntityDocument,
    marker: &str,
    cell: &str,
) -> Result<(), BatchError> {
    let target = target_name(entity);
    let Some(fingerprint) = entity.fingerprint_mut() else {
        return Err(BatchError::capability(format!(
            "{target} cannot carry descriptions"
        )));
    };
    let language = language_tag(marker, 'D')?;
    let text = parse_string_cell(cell)?;
    match fingerprint.descriptions.get(language) {
        Some(existing) if *existing != text => Err(BatchError::conflict(format!(
            "description already set to a different value in {language} for {target}"
        ))),
        Some(_) => Ok(()),
        None => {
            fingerprint.descriptions.insert(language.to_string(), text);
            Ok(())
        }
    }
}

fn apply_site_link(
    entity: &mut EntityDocument,
    marker: &str,
    cell: &str,
) -> Result<(), BatchError> {
    let target = target_name(entity);
    let Some(site_links) = entity.site_links_mut() else {
        return Err(BatchError::capability(format!(
            "site links can only be set on items, not {target}"
        )));
    };
    let site = site_tag(marker)?;
    let title = parse_string_cell(cell)?;
    match site_links.get(site) {
        Some(existing) if *existing != title => Err(BatchError::conflict(format!(
            "site link for {site} already set to a different title on {target}"
        ))),
        Some(_) => Ok(()),
        None => {
            site_links.insert(site.to_string(), title);
            Ok(())
        }
    }
}

fn apply_statement(entity: &mut EntityDocument, cells: &[&str]) -> Result<(), BatchError> {
    let target = target_name(entity);
    let Some(statements) = entity.statements_mut() else {
        return Err(BatchError::capability(format!(
            "{target} cannot carry statements"
        )));
    };
    let main_snak = Snak {
        property: parse_property_id_cell(cells[1])?,
        value: parse_value_cell(cells[2])?,
    };

    // An exact main-snak match selects the edit target, so later lines can
    // attach more qualifiers and references to an earlier statement by
    // repeating its main snak. The engine never creates duplicates itself;
    // more than one match means the entity arrived malformed.
    let matching: Vec<usize> = statements
        .iter()
        .enumerate()
        .filter(|(_, statement)| statement.main_snak == main_snak)
        .map(|(slot, _)| slot)
        .collect();
    let slot = match matching.as_slice() {
        [] => {
            statements.push(Statement::new(main_snak));
            statements.len() - 1
        }
        [slot] => *slot,
        _ => {
            return Err(BatchError::conflict(format!(
                "ambiguous target: multiple statements share this main snak on {target}"
            )));
        }
    };
    let statement = &mut statements[slot];

    let mut reference = Reference::default();
    for pair in cells[3..].chunks(2) {
        let (marker, cell) = (pair[0], pair[1]);
        match marker.chars().next() {
            Some('P') => {
                statement.qualifiers.push(Snak {
                    property: parse_property_id_cell(marker)?,
                    value: parse_value_cell(cell)?,
                });
            }
            Some('S') => {
                // The reference marker is a property id behind an `S`;
                // rewrite it to a plain property token before parsing.
                let as_property = format!("P{}", &marker[1..]);
                reference.snaks.push(Snak {
                    property: parse_property_id_cell(&as_property)?,
                    value: parse_value_cell(cell)?,
                });
            }
            _ => {
                return Err(BatchError::syntax(format!(
                    "unknown qualifier/reference marker: {marker}"
                )));
            }
        }
    }
    if !reference.snaks.is_empty() {
        statement.references.push(reference);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataValue, EntityId, Item, ItemId, Property, PropertyId};

    fn item() -> EntityDocument {
        EntityDocument::Item(Item::with_id(ItemId(1)))
    }

    fn apply(entity: &mut EntityDocument, line: &str) -> Result<(), BatchError> {
        let cells: Vec<&str> = line.split('\t').collect();
        apply_edit(entity, &cells)
    }

    #[test]
    fn test_label_set_and_idempotent() {
        let mut entity = item();
        apply(&mut entity, "Q1\tLen\t\"Example\"").unwrap();
        apply(&mut entity, "Q1\tLen\t\"Example\"").unwrap();
        assert_eq!(
            entity.fingerprint().unwrap().labels.get("en").unwrap(),
            "Example"
        );
        assert_eq!(entity.fingerprint().unwrap().labels.len(), 1);
    }

    #[test]
    fn test_label_conflict_leaves_value_untouched() {
        let mut entity = item();
        apply(&mut entity, "Q1\tLen\t\"first\"").unwrap();
        match apply(&mut entity, "Q1\tLen\t\"second\"") {
            Err(BatchError::Conflict(message)) => {
                assert!(message.contains("label already set"), "{message}")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(
            entity.fingerprint().unwrap().labels.get("en").unwrap(),
            "first"
        );
    }

    #[test]
    fn test_alias_dedups_by_exact_text() {
        let mut entity = item();
        apply(&mut entity, "Q1\tAen\t\"one\"").unwrap();
        apply(&mut entity, "Q1\tAen\t\"two\"").unwrap();
        apply(&mut entity, "Q1\tAen\t\"one\"").unwrap();
        assert_eq!(
            entity.fingerprint().unwrap().aliases.get("en").unwrap(),
            &vec!["one".to_string(), "two".to_string()]
        );
    }

    #[test]
    fn test_description_uses_d_prefixed_language_marker() {
        let mut entity = item();
        apply(&mut entity, "Q1\tDen\t\"a thing\"").unwrap();
        assert_eq!(
            entity.fingerprint().unwrap().descriptions.get("en").unwrap(),
            "a thing"
        );
        // The label-style marker is not accepted on description lines.
        // (Label lines still are: cells starting with L dispatch as labels.)
        assert!(apply(&mut entity, "Q1\tDLen\t\"x\"").is_err());
    }

    #[test]
    fn test_description_conflict() {
        let mut entity = item();
        apply(&mut entity, "Q1\tDen\t\"a\"").unwrap();
        apply(&mut entity, "Q1\tDen\t\"a\"").unwrap();
        assert!(matches!(
            apply(&mut entity, "Q1\tDen\t\"b\""),
            Err(BatchError::Conflict(_))
        ));
    }

    #[test]
    fn test_site_link_merge_rules() {
        let mut entity = item();
        apply(&mut entity, "Q1\tSenwiki\t\"Example\"").unwrap();
        apply(&mut entity, "Q1\tSenwiki\t\"Example\"").unwrap();
        assert!(matches!(
            apply(&mut entity, "Q1\tSenwiki\t\"Other\""),
            Err(BatchError::Conflict(_))
        ));
        assert_eq!(entity.site_links().unwrap().get("enwiki").unwrap(), "Example");
    }

    #[test]
    fn test_site_link_requires_item() {
        let mut entity = EntityDocument::Property(Property::with_id(PropertyId(31)));
        match apply(&mut entity, "P31\tSenwiki\t\"Example\"") {
            Err(BatchError::Capability(message)) => {
                assert!(message.contains("items"), "{message}")
            }
            other => panic!("expected capability error, got {other:?}"),
        }
    }

    #[test]
    fn test_fingerprint_edits_work_on_properties() {
        let mut entity = EntityDocument::Property(Property::with_id(PropertyId(31)));
        apply(&mut entity, "P31\tLen\t\"instance of\"").unwrap();
        assert_eq!(
            entity.fingerprint().unwrap().labels.get("en").unwrap(),
            "instance of"
        );
    }

    #[test]
    fn test_quoted_string_required_for_fingerprint_cells() {
        let mut entity = item();
        match apply(&mut entity, "Q1\tLen\tExample") {
            Err(BatchError::Syntax(message)) => {
                assert!(message.contains("expected a quoted string"), "{message}")
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_statement_created_with_qualifiers_and_reference() {
        let mut entity = item();
        apply(
            &mut entity,
            "Q1\tP31\tQ5\tP580\t+2020-01-01T00:00:00Z/9\tS248\tQ7",
        )
        .unwrap();

        let statements = entity.statements().unwrap();
        assert_eq!(statements.len(), 1);
        let statement = &statements[0];
        assert_eq!(statement.main_snak.property, PropertyId(31));
        assert_eq!(
            statement.main_snak.value,
            DataValue::EntityId(EntityId::Item(ItemId(5)))
        );
        assert_eq!(statement.qualifiers.len(), 1);
        assert_eq!(statement.qualifiers[0].property, PropertyId(580));
        assert_eq!(statement.references.len(), 1);
        assert_eq!(statement.references[0].snaks.len(), 1);
        assert_eq!(statement.references[0].snaks[0].property, PropertyId(248));
    }

    #[test]
    fn test_statement_reuse_by_main_snak() {
        let mut entity = item();
        apply(&mut entity, "Q1\tP31\tQ5\tP580\t+2020-01-01T00:00:00Z/9").unwrap();
        apply(&mut entity, "Q1\tP31\tQ5\tP582\t+2021-01-01T00:00:00Z/9").unwrap();

        let statements = entity.statements().unwrap();
        assert_eq!(statements.len(), 1);
        let qualifiers: Vec<PropertyId> = statements[0]
            .qualifiers
            .iter()
            .map(|snak| snak.property)
            .collect();
        assert_eq!(qualifiers, vec![PropertyId(580), PropertyId(582)]);
    }

    #[test]
    fn test_qualifiers_are_never_deduplicated() {
        let mut entity = item();
        apply(&mut entity, "Q1\tP31\tQ5\tP580\t42").unwrap();
        apply(&mut entity, "Q1\tP31\tQ5\tP580\t42").unwrap();
        assert_eq!(entity.statements().unwrap()[0].qualifiers.len(), 2);
    }

    #[test]
    fn test_references_are_appended_without_dedup() {
        let mut entity = item();
        apply(&mut entity, "Q1\tP31\tQ5\tS248\tQ7").unwrap();
        apply(&mut entity, "Q1\tP31\tQ5\tS248\tQ7").unwrap();

        let statement = &entity.statements().unwrap()[0];
        assert_eq!(statement.references.len(), 2);
        assert_eq!(statement.references[0], statement.references[1]);
    }

    #[test]
    fn test_reference_snaks_accumulate_into_one_reference_per_line() {
        let mut entity = item();
        apply(&mut entity, "Q1\tP31\tQ5\tS248\tQ7\tS854\t\"http\"").unwrap();
        let statement = &entity.statements().unwrap()[0];
        assert_eq!(statement.references.len(), 1);
        assert_eq!(statement.references[0].snaks.len(), 2);
    }

    #[test]
    fn test_ambiguous_main_snak_target() {
        let mut entity = item();
        let snak = Snak {
            property: PropertyId(31),
            value: DataValue::EntityId(EntityId::Item(ItemId(5))),
        };
        let statements = entity.statements_mut().unwrap();
        statements.push(Statement::new(snak.clone()));
        statements.push(Statement::new(snak));

        match apply(&mut entity, "Q1\tP31\tQ5\tP580\t42") {
            Err(BatchError::Conflict(message)) => {
                assert!(message.contains("ambiguous target"), "{message}")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_markers() {
        let mut entity = item();
        assert!(matches!(
            apply(&mut entity, "Q1\tXen\t\"x\""),
            Err(BatchError::Syntax(_))
        ));
        match apply(&mut entity, "Q1\tP31\tQ5\tX580\t42") {
            Err(BatchError::Syntax(message)) => {
                assert!(
                    message.contains("unknown qualifier/reference marker"),
                    "{message}"
                )
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
