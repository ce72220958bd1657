use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Patient;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![
            patient.id.to_string(),
            patient.name,
            format_timestamp(&patient.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM patients WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id.to_string()], row_to_patient)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// All patients, newest first.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, created_at FROM patients ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map([], row_to_patient)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn rename_patient(conn: &Connection, id: &Uuid, name: &str) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE patients SET name = ?1 WHERE id = ?2",
        params![name, id.to_string()],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Delete a patient. Readings and medications cascade.
pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn row_to_patient(row: &rusqlite::Row) -> Result<Patient, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let created_str: String = row.get(2)?;
    Ok(Patient {
        id: parse_uuid(0, &id_str)?,
        name: row.get(1)?,
        created_at: parse_timestamp(2, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_and_get() {
        let conn = open_memory_database().unwrap();
        let patient = Patient::new("  Ada Lovelace ");
        insert_patient(&conn, &patient).unwrap();

        let loaded = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Ada Lovelace");
        assert_eq!(loaded, patient);
    }

    #[test]
    fn get_unknown_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_patient(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn list_is_newest_first() {
        let conn = open_memory_database().unwrap();
        let first = Patient::new("First");
        let second = Patient::new("Second");
        insert_patient(&conn, &first).unwrap();
        insert_patient(&conn, &second).unwrap();

        let names: Vec<String> = list_patients(&conn).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[test]
    fn rename_updates_name() {
        let conn = open_memory_database().unwrap();
        let patient = Patient::new("Old");
        insert_patient(&conn, &patient).unwrap();
        rename_patient(&conn, &patient.id, "New").unwrap();
        assert_eq!(get_patient(&conn, &patient.id).unwrap().unwrap().name, "New");
    }

    #[test]
    fn rename_unknown_fails() {
        let conn = open_memory_database().unwrap();
        let result = rename_patient(&conn, &Uuid::new_v4(), "Nobody");
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn delete_removes_patient() {
        let conn = open_memory_database().unwrap();
        let patient = Patient::new("Temp");
        insert_patient(&conn, &patient).unwrap();
        delete_patient(&conn, &patient.id).unwrap();
        assert!(get_patient(&conn, &patient.id).unwrap().is_none());
        assert!(matches!(
            delete_patient(&conn, &patient.id),
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
