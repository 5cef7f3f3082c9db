use crate::storage::{
    FolderRecord, NewNote, NotePatch, NoteRecord, StorageHandle, StorageResult,
};

/// Row-level operations the workspace needs from the persistence layer.
pub trait NotesGateway {
    fn list_folders(&self) -> StorageResult<Vec<FolderRecord>>;
    fn create_folder(&self, name: &str) -> StorageResult<FolderRecord>;
    fn rename_folder(&self, folder_id: i64, name: &str) -> StorageResult<FolderRecord>;
    fn delete_folder(&self, folder_id: i64) -> StorageResult<()>;
    fn list_notes(&self, folder_id: i64) -> StorageResult<Vec<NoteRecord>>;
    fn create_note(&self, note: &NewNote) -> StorageResult<NoteRecord>;
    fn update_note(&self, note_id: i64, patch: &NotePatch) -> StorageResult<NoteRecord>;
    fn delete_note(&self, note_id: i64) -> StorageResult<()>;
}

impl NotesGateway for StorageHandle {
    fn list_folders(&self) -> StorageResult<Vec<FolderRecord>> {
        StorageHandle::list_folders(self)
    }

    fn create_folder(&self, name: &str) -> StorageResult<FolderRecord> {
        StorageHandle::create_folder(self, name)
    }

    fn rename_folder(&self, folder_id: i64, name: &str) -> StorageResult<FolderRecord> {
        StorageHandle::rename_folder(self, folder_id, name)
    }

    fn delete_folder(&self, folder_id: i64) -> StorageResult<()> {
        StorageHandle::delete_folder(self, folder_id)
    }

    fn list_notes(&self, folder_id: i64) -> StorageResult<Vec<NoteRecord>> {
        StorageHandle::list_notes(self, folder_id)
    }

    fn create_note(&self, note: &NewNote) -> StorageResult<NoteRecord> {
        StorageHandle::create_note(self, note)
    }

    fn update_note(&self, note_id: i64, patch: &NotePatch) -> StorageResult<NoteRecord> {
        StorageHandle::update_note(self, note_id, patch)
    }

    fn delete_note(&self, note_id: i64) -> StorageResult<()> {
        StorageHandle::delete_note(self, note_id)
    }
}
