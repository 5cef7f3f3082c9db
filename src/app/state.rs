use std::cmp::Reverse;

use indexmap::IndexMap;

use crate::storage::{FolderRecord, NoteRecord};

/// Client-side copy of the folder and note collections plus the selection.
#[derive(Debug, Default)]
pub struct AppState {
    folders: IndexMap<i64, FolderRecord>,
    notes: IndexMap<i64, NoteRecord>,
    selected_note_id: Option<i64>,
}

/// What a folder removal took out of the state, kept for rollback.
#[derive(Debug)]
pub struct RemovedFolder {
    pub folder: FolderRecord,
    pub notes: Vec<NoteRecord>,
}

impl AppState {
    /// Folders in creation order.
    pub fn folders(&self) -> Vec<&FolderRecord> {
        let mut folders: Vec<_> = self.folders.values().collect();
        folders.sort_by_key(|f| (f.created_at, f.id));
        folders
    }

    pub fn folder(&self, folder_id: i64) -> Option<&FolderRecord> {
        self.folders.get(&folder_id)
    }

    /// Notes of one folder, newest first.
    pub fn notes_in(&self, folder_id: i64) -> Vec<&NoteRecord> {
        let mut notes: Vec<_> = self
            .notes
            .values()
            .filter(|n| n.folder_id == folder_id)
            .collect();
        notes.sort_by_key(|n| Reverse((n.created_at, n.id)));
        notes
    }

    pub fn note(&self, note_id: i64) -> Option<&NoteRecord> {
        self.notes.get(&note_id)
    }

    pub fn note_mut(&mut self, note_id: i64) -> Option<&mut NoteRecord> {
        self.notes.get_mut(&note_id)
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn selected_note_id(&self) -> Option<i64> {
        self.selected_note_id
    }

    pub fn selected_note(&self) -> Option<&NoteRecord> {
        self.selected_note_id.and_then(|id| self.notes.get(&id))
    }

    pub fn select(&mut self, note_id: Option<i64>) {
        self.selected_note_id = note_id;
    }

    /// Replaces both collections, dropping the selection if its note is gone.
    pub fn replace_all(&mut self, folders: Vec<FolderRecord>, notes: Vec<NoteRecord>) {
        self.folders = folders.into_iter().map(|f| (f.id, f)).collect();
        self.notes = notes.into_iter().map(|n| (n.id, n)).collect();
        if let Some(id) = self.selected_note_id {
            if !self.notes.contains_key(&id) {
                self.selected_note_id = None;
            }
        }
    }

    pub fn upsert_folder(&mut self, folder: FolderRecord) {
        self.folders.insert(folder.id, folder);
    }

    pub fn upsert_note(&mut self, note: NoteRecord) {
        self.notes.insert(note.id, note);
    }

    pub fn remove_folder(&mut self, folder_id: i64) -> Option<RemovedFolder> {
        let folder = self.folders.shift_remove(&folder_id)?;
        let note_ids: Vec<i64> = self
            .notes
            .values()
            .filter(|n| n.folder_id == folder_id)
            .map(|n| n.id)
            .collect();
        let notes = note_ids
            .into_iter()
            .filter_map(|id| self.remove_note(id))
            .collect();
        Some(RemovedFolder { folder, notes })
    }

    pub fn restore_folder(&mut self, removed: RemovedFolder) {
        self.upsert_folder(removed.folder);
        for note in removed.notes {
            self.upsert_note(note);
        }
    }

    pub fn remove_note(&mut self, note_id: i64) -> Option<NoteRecord> {
        let note = self.notes.shift_remove(&note_id)?;
        if self.selected_note_id == Some(note_id) {
            self.selected_note_id = None;
        }
        Some(note)
    }
}
