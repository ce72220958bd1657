use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Medication;

const MEDICATION_COLUMNS: &str = "id, patient_id, name, taken_at, is_administered, created_at";

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, patient_id, name, taken_at, is_administered, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            med.id.to_string(),
            med.patient_id.to_string(),
            med.name,
            format_timestamp(&med.taken_at),
            med.is_administered as i32,
            format_timestamp(&med.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_medication(conn: &Connection, id: &Uuid) -> Result<Option<Medication>, DatabaseError> {
    let sql = format!("SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id.to_string()], row_to_medication)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Medications for a patient, alphabetical.
pub fn get_medications_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Medication>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE patient_id = ?1
         ORDER BY name ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id.to_string()], row_to_medication)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Medications scheduled at or after `since`, newest first.
pub fn get_medications_since(
    conn: &Connection,
    patient_id: &Uuid,
    since: &NaiveDateTime,
) -> Result<Vec<Medication>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE patient_id = ?1 AND taken_at >= ?2
         ORDER BY taken_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), format_timestamp(since)],
        row_to_medication,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn set_medication_administered(
    conn: &Connection,
    id: &Uuid,
    administered: bool,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE medications SET is_administered = ?1 WHERE id = ?2",
        params![administered as i32, id.to_string()],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medication".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_medication(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM medications WHERE id = ?1", params![id.to_string()])?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medication".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Replace a patient's whole medication list in one transaction.
///
/// Names are trimmed; blanks and duplicates are dropped. Returns the
/// medications now on file.
pub fn replace_medications(
    conn: &mut Connection,
    patient_id: &Uuid,
    names: &[String],
) -> Result<Vec<Medication>, DatabaseError> {
    let mut unique: Vec<&str> = Vec::with_capacity(names.len());
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }

    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM medications WHERE patient_id = ?1",
        params![patient_id.to_string()],
    )?;
    for name in &unique {
        insert_medication(&tx, &Medication::new(*patient_id, name))?;
    }
    tx.commit()?;

    get_medications_for_patient(conn, patient_id)
}

fn row_to_medication(row: &rusqlite::Row) -> Result<Medication, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let patient_str: String = row.get(1)?;
    let taken_str: String = row.get(3)?;
    let administered: i32 = row.get(4)?;
    let created_str: String = row.get(5)?;

    Ok(Medication {
        id: parse_uuid(0, &id_str)?,
        patient_id: parse_uuid(1, &patient_str)?,
        name: row.get(2)?,
        taken_at: parse_timestamp(3, &taken_str)?,
        is_administered: administered != 0,
        created_at: parse_timestamp(5, &created_str)?,
    })
}
