//! Turning id-converter response records into identifier clusters.
//!
//! One record describes one article: identifier fields keyed by type name
//! (`"pmid": "22368089"`), metadata fields (ignored), and a `versions`
//! array whose entries describe the article's versions the same way, plus
//! an optional `current` flag. [`read_record`] builds the whole cluster,
//! or rejects the record with the first problem found.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::db::IdDb;
use crate::error::IngestError;
use crate::idtype::IdType;
use crate::set::{ClusterBuilder, IdSet};

/// Builds the identifier cluster described by one converter record.
///
/// # Errors
///
/// Rejects the record if it is not a JSON object, reports a status other
/// than `"success"`, carries an identifier value that does not parse as
/// its field's type, or misuses the `current` flag. A rejected record
/// contributes nothing.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use litid::IdDb;
/// use litid::resolver::read_record;
///
/// let db = Arc::new(IdDb::literature());
/// let record = serde_json::json!({
///     "status": "success",
///     "pmid": "22368089",
///     "pmcid": "PMC3539452",
///     "versions": [ { "pmcid": "PMC3539452.1", "current": true } ]
/// });
/// let set = read_record(&db, &record)?;
/// assert_eq!(set.curies(), vec!["pmid:22368089", "pmcid:PMC3539452"]);
/// assert!(set.current().unwrap().is_current());
/// # Ok::<(), litid::IngestError>(())
/// ```
pub fn read_record(db: &Arc<IdDb>, record: &Value) -> Result<IdSet, IngestError> {
    let fields = object_fields(record)?;
    check_status(fields)?;

    let mut builder = ClusterBuilder::new(Arc::clone(db));
    read_fields(db, &mut builder, None, fields)?;

    if let Some(versions) = fields.get("versions").and_then(Value::as_array) {
        for entry in versions {
            let kid_fields = object_fields(entry)?;
            check_status(kid_fields)?;
            let version = builder.new_version();
            read_fields(db, &mut builder, Some(version), kid_fields)?;
        }
    }
    Ok(builder.finish())
}

/// Dispatches every field of one record object into the builder; `version`
/// is `None` for the work-level record.
fn read_fields(
    db: &IdDb,
    builder: &mut ClusterBuilder,
    version: Option<usize>,
    fields: &Map<String, Value>,
) -> Result<(), IngestError> {
    for (key, value) in fields {
        match key.as_str() {
            "status" | "versions" => {}
            "current" => match version {
                None => return Err(IngestError::CurrentOnWork),
                Some(slot) => {
                    if read_flag(value)? {
                        builder.mark_current(slot)?;
                    }
                }
            },
            key => {
                let Some(ty) = db.get_type(key) else {
                    // metadata like "live", "errmsg", or "release-date"
                    continue;
                };
                // the work-level record repeats the current version's aiid;
                // the version entry carries the authoritative copy
                if version.is_none() && ty.name() == "aiid" {
                    continue;
                }
                let Some(raw) = scalar_text(value) else {
                    return Err(IngestError::BadIdValue {
                        id_type: key.to_string(),
                        value: value.to_string(),
                    });
                };
                let Some(id) = IdType::make_id(ty, &raw) else {
                    return Err(IngestError::BadIdValue {
                        id_type: key.to_string(),
                        value: raw,
                    });
                };
                match version {
                    None => builder.add_work_id(id)?,
                    Some(slot) => builder.add_version_id(slot, id)?,
                }
            }
        }
    }
    Ok(())
}

/// A record without a status field counts as successful.
fn check_status(fields: &Map<String, Value>) -> Result<(), IngestError> {
    match fields.get("status") {
        None => Ok(()),
        Some(Value::String(status)) if status == "success" => Ok(()),
        Some(Value::String(status)) => Err(IngestError::RecordStatus {
            status: status.clone(),
        }),
        Some(other) => Err(IngestError::RecordStatus {
            status: other.to_string(),
        }),
    }
}

/// The `current` flag comes as a JSON boolean or as the strings `"true"`
/// and `"false"`.
fn read_flag(value: &Value) -> Result<bool, IngestError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) if text == "true" => Ok(true),
        Value::String(text) if text == "false" => Ok(false),
        other => Err(IngestError::BadCurrent {
            value: other.to_string(),
        }),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn object_fields(value: &Value) -> Result<&Map<String, Value>, IngestError> {
    value.as_object().ok_or_else(|| IngestError::NotAnObject {
        found: json_kind(value).to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetError;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn lit() -> Arc<IdDb> {
        Arc::new(IdDb::literature())
    }

    #[test]
    fn test_reads_a_full_record() {
        let db = lit();
        let record = json!({
            "status": "success",
            "requested-id": "22368089",
            "pmid": "22368089",
            "pmcid": "PMC3539452",
            "doi": "10.1093/nar/gks179",
            "aiid": "3539453",
            "versions": [
                { "pmcid": "PMC3539452.1", "mid": "NIHMS414932", "aiid": "3539452" },
                { "pmcid": "PMC3539452.2", "aiid": "3539453", "current": "true" }
            ]
        });
        let set = read_record(&db, &record).unwrap();
        assert_eq!(
            set.curies(),
            vec!["pmid:22368089", "pmcid:PMC3539452", "doi:10.1093/nar/gks179"]
        );

        let versions = set.versions();
        assert_eq!(versions.len(), 2);
        assert_eq!(
            versions[0].curies(),
            vec!["pmcid:PMC3539452.1", "mid:NIHMS414932", "aiid:3539452"]
        );
        assert_eq!(
            versions[1].curies(),
            vec!["pmcid:PMC3539452.2", "aiid:3539453"]
        );
        assert!(!versions[0].is_current());
        assert!(versions[1].is_current());
    }

    #[test]
    fn test_missing_status_means_success() {
        let db = lit();
        let set = read_record(&db, &json!({ "pmid": "499268" })).unwrap();
        assert_eq!(set.curies(), vec!["pmid:499268"]);
    }

    #[test]
    fn test_numeric_id_values_are_read() {
        let db = lit();
        let set = read_record(&db, &json!({ "pmid": 22368089 })).unwrap();
        assert_eq!(set.curies(), vec!["pmid:22368089"]);
    }

    #[test]
    fn test_metadata_fields_are_ignored() {
        let db = lit();
        let record = json!({
            "pmid": "499268",
            "live": "false",
            "release-date": "2013-01-15",
            "errmsg": ""
        });
        let set = read_record(&db, &record).unwrap();
        assert_eq!(set.curies(), vec!["pmid:499268"]);
    }

    #[test]
    fn test_work_level_aiid_is_skipped() {
        let db = lit();
        let record = json!({
            "pmid": "499268",
            "aiid": "77",
            "versions": [ { "aiid": "77" } ]
        });
        let set = read_record(&db, &record).unwrap();
        assert_eq!(set.curies(), vec!["pmid:499268"]);
        assert_eq!(set.versions()[0].curies(), vec!["aiid:77"]);
    }

    #[test]
    fn test_false_current_is_not_marked() {
        let db = lit();
        let record = json!({
            "versions": [
                { "pmcid": "PMC3539452.1", "current": false },
                { "pmcid": "PMC3539452.2", "current": "false" }
            ]
        });
        let set = read_record(&db, &record).unwrap();
        assert!(set.current().is_none());
    }

    #[test]
    fn test_empty_record_makes_an_empty_cluster() {
        let db = lit();
        let set = read_record(&db, &json!({})).unwrap();
        assert_eq!(set.ids().count(), 0);
        assert!(set.versions().is_empty());
    }

    #[rstest]
    #[case::error_status(
        json!({ "status": "error", "errmsg": "invalid article id" }),
        IngestError::RecordStatus { status: "error".into() }
    )]
    #[case::version_error_status(
        json!({ "pmid": "1", "versions": [ { "status": "error" } ] }),
        IngestError::RecordStatus { status: "error".into() }
    )]
    #[case::unparsable_id(
        json!({ "status": "success", "pmid": "PMC123" }),
        IngestError::BadIdValue { id_type: "pmid".into(), value: "PMC123".into() }
    )]
    #[case::structured_id_value(
        json!({ "pmid": ["1"] }),
        IngestError::BadIdValue { id_type: "pmid".into(), value: "[\"1\"]".into() }
    )]
    #[case::current_on_work(
        json!({ "pmid": "1", "current": true }),
        IngestError::CurrentOnWork
    )]
    #[case::bad_current(
        json!({ "versions": [ { "pmcid": "PMC1.1", "current": "yes" } ] }),
        IngestError::BadCurrent { value: "\"yes\"".into() }
    )]
    #[case::null_current(
        json!({ "versions": [ { "pmcid": "PMC1.1", "current": null } ] }),
        IngestError::BadCurrent { value: "null".into() }
    )]
    #[case::not_an_object(
        json!("PMC123"),
        IngestError::NotAnObject { found: "a string".into() }
    )]
    #[case::version_not_an_object(
        json!({ "pmid": "1", "versions": [ "PMC1.1" ] }),
        IngestError::NotAnObject { found: "a string".into() }
    )]
    fn test_rejected_records(#[case] record: Value, #[case] expected: IngestError) {
        let db = lit();
        assert_eq!(read_record(&db, &record).unwrap_err(), expected);
    }

    #[test]
    fn test_two_current_versions_are_rejected() {
        let db = lit();
        let record = json!({
            "pmcid": "PMC3539452",
            "versions": [
                { "pmcid": "PMC3539452.1", "current": true },
                { "pmcid": "PMC3539452.2", "current": "true" }
            ]
        });
        assert_eq!(
            read_record(&db, &record).unwrap_err(),
            IngestError::Set(SetError::DoubleCurrent {
                existing: "{ pmcid:PMC3539452.1 }".into(),
                candidate: "{ pmcid:PMC3539452.2 }".into(),
            })
        );
    }

    #[test]
    fn test_versioned_id_under_a_work_key_is_rejected() {
        let db = lit();
        let record = json!({ "pmcid": "PMC3539452.1" });
        assert_eq!(
            read_record(&db, &record).unwrap_err(),
            IngestError::Set(SetError::VersionedIntoWork {
                curie: "pmcid:PMC3539452.1".into()
            })
        );
    }
}
