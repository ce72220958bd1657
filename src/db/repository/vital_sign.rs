use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid, read_count};
use crate::db::DatabaseError;
use crate::models::{VitalReading, VitalValues};

const READING_COLUMNS: &str = "id, patient_id, systolic_bp, diastolic_bp, blood_sugar, \
     fluid_input, fluid_output, taken_at, created_at";

/// Append a vital reading. Historical rows are never updated.
pub fn insert_vital_reading(conn: &Connection, reading: &VitalReading) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO vital_signs (id, patient_id, systolic_bp, diastolic_bp, blood_sugar,
         fluid_input, fluid_output, taken_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            reading.id.to_string(),
            reading.patient_id.to_string(),
            reading.values.systolic_bp,
            reading.values.diastolic_bp,
            reading.values.blood_sugar,
            reading.values.fluid_input,
            reading.values.fluid_output,
            format_timestamp(&reading.taken_at),
            format_timestamp(&reading.created_at),
        ],
    )?;
    Ok(())
}

/// Most recent reading for a patient, by capture time.
pub fn get_latest_vital_reading(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Option<VitalReading>, DatabaseError> {
    let sql = format!(
        "SELECT {READING_COLUMNS} FROM vital_signs
         WHERE patient_id = ?1
         ORDER BY taken_at DESC, rowid DESC
         LIMIT 1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![patient_id.to_string()], row_to_vital_reading)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Most recent reading taken at or after `since`.
pub fn get_latest_vital_reading_since(
    conn: &Connection,
    patient_id: &Uuid,
    since: &NaiveDateTime,
) -> Result<Option<VitalReading>, DatabaseError> {
    let sql = format!(
        "SELECT {READING_COLUMNS} FROM vital_signs
         WHERE patient_id = ?1 AND taken_at >= ?2
         ORDER BY taken_at DESC, rowid DESC
         LIMIT 1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(
        params![patient_id.to_string(), format_timestamp(since)],
        row_to_vital_reading,
    )?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// All readings for a patient, newest first.
pub fn list_vital_readings(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<VitalReading>, DatabaseError> {
    let sql = format!(
        "SELECT {READING_COLUMNS} FROM vital_signs
         WHERE patient_id = ?1
         ORDER BY taken_at DESC, rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id.to_string()], row_to_vital_reading)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_vital_reading(row: &rusqlite::Row) -> Result<VitalReading, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let patient_str: String = row.get(1)?;
    let taken_str: String = row.get(7)?;
    let created_str: String = row.get(8)?;

    Ok(VitalReading {
        id: parse_uuid(0, &id_str)?,
        patient_id: parse_uuid(1, &patient_str)?,
        values: VitalValues {
            systolic_bp: read_count(row, 2)?,
            diastolic_bp: read_count(row, 3)?,
            blood_sugar: read_count(row, 4)?,
            fluid_input: read_count(row, 5)?,
            fluid_output: read_count(row, 6)?,
        },
        taken_at: parse_timestamp(7, &taken_str)?,
        created_at: parse_timestamp(8, &created_str)?,
    })
}
