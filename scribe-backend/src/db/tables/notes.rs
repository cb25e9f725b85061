//! Note database operations
//!
//! Listing is always in ascending id order (creation order). The slug
//! column is UNIQUE; `slug_exists` is the validation-time probe and the
//! constraint itself is the backstop for races.

use chrono::Utc;
use rusqlite::{Result as SqliteResult, Row, params};

use super::super::Database;
use crate::models::Note;

fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
    let created_at_str: String = row.get(5)?;

    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        slug: row.get(3)?,
        author_id: row.get(4)?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .unwrap()
            .with_timezone(&Utc),
    })
}

impl Database {
    pub fn create_note(
        &self,
        title: &str,
        text: &str,
        slug: &str,
        author_id: i64,
    ) -> SqliteResult<Note> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO notes (title, text, slug, author_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![title, text, slug, author_id, created_at.to_rfc3339()],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Note {
            id,
            title: title.to_string(),
            text: text.to_string(),
            slug: slug.to_string(),
            author_id,
            created_at,
        })
    }

    pub fn slug_exists(&self, slug: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE slug = ?1",
            params![slug],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn get_note_by_slug(&self, slug: &str) -> SqliteResult<Option<Note>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, text, slug, author_id, created_at FROM notes WHERE slug = ?1",
        )?;

        let note = stmt.query_row(params![slug], row_to_note).ok();
        Ok(note)
    }

    /// All notes by one author, ascending id (creation order).
    pub fn list_notes_by_author(&self, author_id: i64) -> SqliteResult<Vec<Note>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, text, slug, author_id, created_at FROM notes
             WHERE author_id = ?1 ORDER BY id ASC",
        )?;

        let notes = stmt
            .query_map(params![author_id], row_to_note)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(notes)
    }

    /// Update title and text. Slug and author are immutable.
    pub fn update_note(&self, slug: &str, title: &str, text: &str) -> SqliteResult<Option<Note>> {
        {
            let conn = self.conn.lock().unwrap();
            let updated = conn.execute(
                "UPDATE notes SET title = ?1, text = ?2 WHERE slug = ?3",
                params![title, text, slug],
            )?;
            if updated == 0 {
                return Ok(None);
            }
        }

        self.get_note_by_slug(slug)
    }

    pub fn delete_note(&self, slug: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM notes WHERE slug = ?1", params![slug])?;
        Ok(deleted > 0)
    }

    pub fn count_notes(&self) -> SqliteResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, is_unique_violation};
    use crate::models::User;

    fn db_with_user() -> (Database, User) {
        let db = Database::new(":memory:").expect("Failed to open in-memory database");
        let user = db.create_user("person", "hash").expect("Failed to create user");
        (db, user)
    }

    #[test]
    fn test_notes_list_in_creation_order() {
        let (db, user) = db_with_user();

        for i in 0..7 {
            db.create_note(
                &format!("Note {}", i),
                &format!("text of note {}", i),
                &format!("note-{}", i),
                user.id,
            )
            .expect("Failed to create note");
        }

        let notes = db.list_notes_by_author(user.id).unwrap();
        let ids: Vec<i64> = notes.iter().map(|n| n.id).collect();
        assert_eq!(ids, (1..=7).collect::<Vec<i64>>());
    }

    #[test]
    fn test_duplicate_slug_rejected_by_constraint() {
        let (db, user) = db_with_user();

        db.create_note("Note 1", "text", "note-1", user.id).unwrap();
        let err = db
            .create_note("Another", "text", "note-1", user.id)
            .unwrap_err();
        assert!(is_unique_violation(&err));
        assert_eq!(db.count_notes().unwrap(), 1);
    }

    #[test]
    fn test_update_preserves_slug_and_author() {
        let (db, user) = db_with_user();

        db.create_note("Old Title", "old text", "a-note", user.id)
            .unwrap();
        let updated = db
            .update_note("a-note", "New Title", "new text")
            .unwrap()
            .expect("note should exist");

        assert_eq!(updated.title, "New Title");
        assert_eq!(updated.text, "new text");
        assert_eq!(updated.slug, "a-note");
        assert_eq!(updated.author_id, user.id);

        assert!(db.update_note("missing", "t", "t").unwrap().is_none());
    }

    #[test]
    fn test_delete_note() {
        let (db, user) = db_with_user();

        db.create_note("Note", "text", "a-note", user.id).unwrap();
        assert!(db.delete_note("a-note").unwrap());
        assert!(!db.delete_note("a-note").unwrap());
        assert_eq!(db.count_notes().unwrap(), 0);
    }
}
