use std::time::Instant;

use crate::config::AutoSaveConfig;
use crate::editor::{EditorStatus, NoteEditor, SaveOutcome, SaveRequest};
use crate::storage::{
    FolderRecord, NewNote, NotePatch, NoteRecord, StorageError, StorageResult,
};

pub mod actions;
pub mod state;

pub use actions::NotesGateway;
pub use state::AppState;

/// The list/selection shell: owns the collections, the selection, and the
/// editor for the selected note, and routes every mutation through a gateway.
///
/// Mutations patch local state first and then settle on whatever the gateway
/// returns; a failed call rolls the patch back.
pub struct Workspace<G> {
    gateway: G,
    state: AppState,
    editor: NoteEditor,
}

impl<G: NotesGateway> Workspace<G> {
    pub fn new(gateway: G, auto_save: &AutoSaveConfig) -> Self {
        Self {
            gateway,
            state: AppState::default(),
            editor: NoteEditor::new(auto_save),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn editor(&self) -> &NoteEditor {
        &self.editor
    }

    pub fn selected_note(&self) -> Option<&NoteRecord> {
        self.state.selected_note()
    }

    pub fn editor_status(&self) -> EditorStatus {
        self.editor.status()
    }

    pub fn load(&mut self, now: Instant) -> StorageResult<()> {
        let folders = self.gateway.list_folders()?;
        let mut notes = Vec::new();
        for folder in &folders {
            notes.extend(self.gateway.list_notes(folder.id)?);
        }
        tracing::debug!(folders = folders.len(), notes = notes.len(), "workspace loaded");
        self.state.replace_all(folders, notes);
        if self.state.selected_note_id().is_none() && self.editor.note_id().is_some() {
            self.editor.discard();
        }
        self.sync_editor(now);
        Ok(())
    }

    pub fn create_folder(&mut self, name: &str) -> StorageResult<FolderRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::validation("folder name is required"));
        }
        let folder = self.gateway.create_folder(name)?;
        self.state.upsert_folder(folder.clone());
        Ok(folder)
    }

    pub fn rename_folder(&mut self, folder_id: i64, name: &str) -> StorageResult<FolderRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::validation("folder name is required"));
        }
        let previous = self
            .state
            .folder(folder_id)
            .cloned()
            .ok_or_else(|| StorageError::folder_not_found(folder_id))?;
        if previous.name == name {
            return Ok(previous);
        }

        let mut patched = previous.clone();
        patched.name = name.to_string();
        self.state.upsert_folder(patched);

        match self.gateway.rename_folder(folder_id, name) {
            Ok(folder) => {
                self.state.upsert_folder(folder.clone());
                Ok(folder)
            }
            Err(err) => {
                tracing::error!(?err, folder_id, "failed to rename folder");
                if err.is_not_found() {
                    self.state.remove_folder(folder_id);
                } else {
                    self.state.upsert_folder(previous);
                }
                Err(err)
            }
        }
    }

    /// Deletes a folder and every note in it. Once the delete has gone
    /// through, an open note inside the folder is closed without saving.
    pub fn delete_folder(&mut self, folder_id: i64) -> StorageResult<()> {
        if self.state.folder(folder_id).is_none() {
            return Err(StorageError::folder_not_found(folder_id));
        }
        let open_inside = self
            .editor
            .note_id()
            .and_then(|id| self.state.note(id))
            .is_some_and(|note| note.folder_id == folder_id);
        let selected = self.state.selected_note_id();
        let removed = self.state.remove_folder(folder_id);

        match self.gateway.delete_folder(folder_id) {
            Err(err) if !err.is_not_found() => {
                tracing::error!(?err, folder_id, "failed to delete folder");
                if let Some(removed) = removed {
                    self.state.restore_folder(removed);
                }
                self.state.select(selected);
                Err(err)
            }
            result => {
                if open_inside {
                    self.editor.discard();
                }
                result
            }
        }
    }

    /// Creates a note and selects it.
    pub fn create_note(
        &mut self,
        folder_id: i64,
        title: &str,
        content: &str,
        now: Instant,
    ) -> StorageResult<NoteRecord> {
        let note = self.gateway.create_note(&NewNote {
            folder_id,
            title: Some(title.to_string()),
            content: Some(content.to_string()),
        })?;
        self.state.upsert_note(note.clone());
        self.select_note(Some(note.id), now)?;
        Ok(note)
    }

    pub fn rename_note(
        &mut self,
        note_id: i64,
        title: &str,
        now: Instant,
    ) -> StorageResult<NoteRecord> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StorageError::validation("note title is required"));
        }
        let current = self
            .state
            .note(note_id)
            .cloned()
            .ok_or_else(|| StorageError::note_not_found(note_id))?;
        if current.display_title() == title {
            return Ok(current);
        }
        self.patch_note(note_id, NotePatch::title(title), now)
    }

    /// Persists both fields of a note and refreshes the local copy.
    pub fn update_note(
        &mut self,
        note_id: i64,
        title: &str,
        content: &str,
        now: Instant,
    ) -> StorageResult<NoteRecord> {
        self.patch_note(note_id, NotePatch::fields(title, content), now)
    }

    pub fn delete_note(&mut self, note_id: i64) -> StorageResult<()> {
        let selected = self.state.selected_note_id();
        let removed = self.state.remove_note(note_id);
        match self.gateway.delete_note(note_id) {
            Err(err) if !err.is_not_found() => {
                tracing::error!(?err, note_id, "failed to delete note");
                if let Some(note) = removed {
                    self.state.upsert_note(note);
                }
                self.state.select(selected);
                Err(err)
            }
            result => {
                if self.editor.note_id() == Some(note_id) {
                    self.editor.discard();
                }
                result
            }
        }
    }

    /// Changes the selection. Pending edits of the previously open note are
    /// saved first; if that save fails the selection stays where it was and
    /// the edits stay in the editor.
    pub fn select_note(&mut self, note_id: Option<i64>, now: Instant) -> StorageResult<()> {
        if let Some(id) = note_id {
            if self.state.note(id).is_none() {
                return Err(StorageError::note_not_found(id));
            }
        }
        if self.editor.note_id() != note_id {
            self.flush_open_note(now)?;
        }

        let note = note_id.and_then(|id| self.state.note(id));
        let leftover = self.editor.open(note, now);
        self.state.select(note_id);
        if let Some(request) = leftover {
            if let SaveOutcome::Failed { note_id, message } = self.execute_save(request, now) {
                return Err(StorageError::Backend(anyhow::anyhow!(
                    "saving note {note_id} failed: {message}"
                )));
            }
        }
        Ok(())
    }

    pub fn edit_title(&mut self, title: &str, now: Instant) {
        self.editor.edit_title(title, now);
    }

    pub fn edit_content(&mut self, content: &str, now: Instant) {
        self.editor.edit_content(content, now);
    }

    /// Drives the editor's timers, executing a save when one comes due.
    pub fn tick(&mut self, now: Instant) -> Option<SaveOutcome> {
        let request = self.editor.poll(now)?;
        Some(self.execute_save(request, now))
    }

    /// Saves pending edits of the open note without waiting for the debounce window.
    pub fn save_now(&mut self, now: Instant) -> Option<SaveOutcome> {
        let request = self.editor.flush()?;
        Some(self.execute_save(request, now))
    }

    /// Teardown: saves whatever is pending and closes the editor. When that
    /// save fails the editor stays open in `Error` with the edits intact.
    pub fn close(&mut self, now: Instant) -> Option<SaveOutcome> {
        let outcome = self.save_now(now);
        if matches!(outcome, Some(SaveOutcome::Failed { .. })) && self.editor.note_id().is_some() {
            return outcome;
        }
        match self.editor.close() {
            Some(request) => Some(self.execute_save(request, now)),
            None => outcome,
        }
    }

    /// Saves the open note's pending edits while its session is still live.
    fn flush_open_note(&mut self, now: Instant) -> StorageResult<()> {
        let Some(request) = self.editor.flush() else {
            return Ok(());
        };
        match self.run_save(request, now) {
            (_, Err(err)) if !err.is_not_found() => Err(err),
            _ => Ok(()),
        }
    }

    fn execute_save(&mut self, request: SaveRequest, now: Instant) -> SaveOutcome {
        let note_id = request.note_id;
        // The editor no longer tracks a closed session; report what the write did.
        match self.run_save(request, now) {
            (SaveOutcome::Stale { .. } | SaveOutcome::Orphaned { .. }, Ok(())) => {
                SaveOutcome::Saved { note_id }
            }
            (SaveOutcome::Stale { .. } | SaveOutcome::Orphaned { .. }, Err(err)) => {
                tracing::warn!(%err, note_id, "saving edits of a closed note failed");
                SaveOutcome::Failed {
                    note_id,
                    message: err.to_string(),
                }
            }
            (outcome, _) => outcome,
        }
    }

    fn run_save(&mut self, request: SaveRequest, now: Instant) -> (SaveOutcome, StorageResult<()>) {
        let note_id = request.note_id;
        let patch = NotePatch::fields(request.title(), request.content());
        let result = self.apply_patch(note_id, &patch).map(|_| ());
        let outcome = self
            .editor
            .complete_save(request.ticket, result.as_ref().map(|_| ()), now);
        match &result {
            Ok(()) => self.sync_editor(now),
            Err(err) if err.is_not_found() && self.editor.note_id() == Some(note_id) => {
                tracing::warn!(note_id, "open note no longer exists, dropping its edits");
                self.editor.discard();
            }
            Err(_) => {}
        }
        (outcome, result)
    }

    fn patch_note(
        &mut self,
        note_id: i64,
        patch: NotePatch,
        now: Instant,
    ) -> StorageResult<NoteRecord> {
        let note = self.apply_patch(note_id, &patch)?;
        self.sync_editor(now);
        Ok(note)
    }

    /// Optimistically applies `patch` locally, then settles on the server row.
    fn apply_patch(&mut self, note_id: i64, patch: &NotePatch) -> StorageResult<NoteRecord> {
        let previous = self.state.note(note_id).cloned();
        if let Some(local) = self.state.note_mut(note_id) {
            if let Some(title) = &patch.title {
                local.title.clone_from(title);
            }
            if let Some(content) = &patch.content {
                local.content.clone_from(content);
            }
            if let Some(folder_id) = patch.folder_id {
                local.folder_id = folder_id;
            }
        }

        match self.gateway.update_note(note_id, patch) {
            Ok(note) => {
                self.state.upsert_note(note.clone());
                Ok(note)
            }
            Err(err) => {
                if err.is_not_found() {
                    self.state.remove_note(note_id);
                } else if let Some(previous) = previous {
                    self.state.upsert_note(previous);
                }
                Err(err)
            }
        }
    }

    /// Hands the editor the current server copy of the selected note.
    fn sync_editor(&mut self, now: Instant) {
        let Some(note) = self.state.selected_note() else {
            return;
        };
        if self.editor.note_id() != Some(note.id) {
            return;
        }
        if let Some(request) = self.editor.open(Some(note), now) {
            tracing::warn!(
                note_id = request.note_id,
                "unexpected flush while refreshing the open note"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    use super::*;
    use crate::editor::{EditFields, EditorPhase};
    use crate::storage::tests::init_storage;
    use crate::storage::StorageHandle;
    use assert_matches::assert_matches;

    /// Storage wrapper that records note updates and can be told to fail mutations.
    struct RecordingGateway {
        inner: StorageHandle,
        fail_mutations: Cell<bool>,
        updates: RefCell<Vec<(i64, NotePatch)>>,
    }

    impl RecordingGateway {
        fn new(inner: StorageHandle) -> Self {
            Self {
                inner,
                fail_mutations: Cell::new(false),
                updates: RefCell::new(Vec::new()),
            }
        }

        fn check(&self) -> StorageResult<()> {
            if self.fail_mutations.get() {
                return Err(StorageError::Backend(anyhow::anyhow!("backend unavailable")));
            }
            Ok(())
        }
    }

    impl NotesGateway for RecordingGateway {
        fn list_folders(&self) -> StorageResult<Vec<FolderRecord>> {
            self.inner.list_folders()
        }

        fn create_folder(&self, name: &str) -> StorageResult<FolderRecord> {
            self.check()?;
            self.inner.create_folder(name)
        }

        fn rename_folder(&self, folder_id: i64, name: &str) -> StorageResult<FolderRecord> {
            self.check()?;
            self.inner.rename_folder(folder_id, name)
        }

        fn delete_folder(&self, folder_id: i64) -> StorageResult<()> {
            self.check()?;
            self.inner.delete_folder(folder_id)
        }

        fn list_notes(&self, folder_id: i64) -> StorageResult<Vec<NoteRecord>> {
            self.inner.list_notes(folder_id)
        }

        fn create_note(&self, note: &NewNote) -> StorageResult<NoteRecord> {
            self.check()?;
            self.inner.create_note(note)
        }

        fn update_note(&self, note_id: i64, patch: &NotePatch) -> StorageResult<NoteRecord> {
            self.updates.borrow_mut().push((note_id, patch.clone()));
            self.check()?;
            self.inner.update_note(note_id, patch)
        }

        fn delete_note(&self, note_id: i64) -> StorageResult<()> {
            self.check()?;
            self.inner.delete_note(note_id)
        }
    }

    fn auto_save() -> AutoSaveConfig {
        AutoSaveConfig {
            debounce_ms: 1000,
            saved_display_ms: 500,
            retry_failed_saves: true,
        }
    }

    fn workspace() -> anyhow::Result<(tempfile::TempDir, Workspace<RecordingGateway>)> {
        let (temp, storage) = init_storage()?;
        Ok((temp, Workspace::new(RecordingGateway::new(storage), &auto_save())))
    }

    fn after(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn typed_content_is_persisted_once_after_pause() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let folder = ws.create_folder("Inbox")?;
        let note = ws.create_note(folder.id, "Draft", "", start)?;

        ws.edit_content("H", after(start, 10));
        ws.edit_content("Hello", after(start, 200));
        assert_eq!(ws.tick(after(start, 1100)), None);
        assert_eq!(
            ws.tick(after(start, 1200)),
            Some(SaveOutcome::Saved { note_id: note.id })
        );
        assert_eq!(ws.tick(after(start, 5000)), None);

        let updates = ws.gateway().updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, NotePatch::fields("Draft", "Hello"));
        drop(updates);

        let stored = ws.gateway().inner.fetch_note(note.id)?;
        assert_eq!(stored.content.as_deref(), Some("Hello"));
        assert_eq!(ws.state().note(note.id), Some(&stored));
        Ok(())
    }

    #[test]
    fn switching_notes_saves_pending_edits_first() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let folder = ws.create_folder("Inbox")?;
        let x = ws.create_note(folder.id, "X", "x", start)?;
        let y = ws.create_note(folder.id, "Y", "y", start)?;

        ws.select_note(Some(x.id), start)?;
        ws.edit_content("x edited", after(start, 100));
        ws.select_note(Some(y.id), after(start, 200))?;

        {
            let updates = ws.gateway().updates.borrow();
            assert_eq!(updates.len(), 1);
            assert_eq!(updates[0].0, x.id);
            assert_eq!(updates[0].1, NotePatch::fields("X", "x edited"));
        }
        assert_eq!(ws.editor().fields(), Some(&EditFields::new("Y", "y")));
        assert_eq!(ws.tick(after(start, 5000)), None);
        assert_eq!(
            ws.state().note(x.id).and_then(|n| n.content.as_deref()),
            Some("x edited")
        );
        Ok(())
    }

    #[test]
    fn failed_switch_flush_keeps_selection_and_edits() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let folder = ws.create_folder("Inbox")?;
        let x = ws.create_note(folder.id, "X", "x", start)?;
        let y = ws.create_note(folder.id, "Y", "y", start)?;
        ws.select_note(Some(x.id), start)?;
        ws.edit_content("x edited", after(start, 100));

        ws.gateway().fail_mutations.set(true);
        assert_matches!(
            ws.select_note(Some(y.id), after(start, 200)),
            Err(StorageError::Backend(_))
        );
        assert_eq!(ws.state().selected_note_id(), Some(x.id));
        assert_eq!(ws.editor().note_id(), Some(x.id));
        assert_eq!(ws.editor().fields(), Some(&EditFields::new("X", "x edited")));
        assert_eq!(ws.editor().phase(), EditorPhase::Error);

        ws.gateway().fail_mutations.set(false);
        ws.select_note(Some(y.id), after(start, 300))?;
        assert_eq!(ws.editor().note_id(), Some(y.id));
        assert_eq!(
            ws.gateway().inner.fetch_note(x.id)?.content.as_deref(),
            Some("x edited")
        );
        Ok(())
    }

    #[test]
    fn close_with_failing_save_keeps_editor_open() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let folder = ws.create_folder("Inbox")?;
        let note = ws.create_note(folder.id, "T", "", start)?;
        ws.edit_content("unsaved", start);

        ws.gateway().fail_mutations.set(true);
        assert_matches!(ws.close(start), Some(SaveOutcome::Failed { .. }));
        assert_eq!(ws.editor().note_id(), Some(note.id));
        assert!(ws.editor().has_pending_changes());

        ws.gateway().fail_mutations.set(false);
        assert_eq!(ws.close(start), Some(SaveOutcome::Saved { note_id: note.id }));
        assert_eq!(ws.editor_status(), EditorStatus::Empty);
        Ok(())
    }

    #[test]
    fn renaming_open_note_keeps_pending_content() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let folder = ws.create_folder("Inbox")?;
        let note = ws.create_note(folder.id, "Old", "body", start)?;

        ws.edit_content("body edited", start);
        ws.rename_note(note.id, "New", after(start, 100))?;
        assert_eq!(
            ws.editor().fields(),
            Some(&EditFields::new("New", "body edited"))
        );

        assert_eq!(
            ws.tick(after(start, 5000)),
            Some(SaveOutcome::Saved { note_id: note.id })
        );
        let stored = ws.gateway().inner.fetch_note(note.id)?;
        assert_eq!(stored.title.as_deref(), Some("New"));
        assert_eq!(stored.content.as_deref(), Some("body edited"));
        Ok(())
    }

    #[test]
    fn failed_delete_of_open_note_restores_selection_and_edits() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let folder = ws.create_folder("Inbox")?;
        let note = ws.create_note(folder.id, "T", "", start)?;
        ws.edit_content("still mine", start);

        ws.gateway().fail_mutations.set(true);
        assert_matches!(ws.delete_note(note.id), Err(StorageError::Backend(_)));
        assert_matches!(ws.delete_folder(folder.id), Err(StorageError::Backend(_)));
        assert_eq!(ws.state().selected_note_id(), Some(note.id));
        assert!(ws.state().note(note.id).is_some());
        assert!(ws.state().folder(folder.id).is_some());
        assert_eq!(ws.editor().fields().map(|f| f.content.as_str()), Some("still mine"));

        ws.gateway().fail_mutations.set(false);
        assert_eq!(
            ws.tick(after(start, 1000)),
            Some(SaveOutcome::Saved { note_id: note.id })
        );
        assert_eq!(
            ws.gateway().inner.fetch_note(note.id)?.content.as_deref(),
            Some("still mine")
        );
        Ok(())
    }

    #[test]
    fn failed_save_keeps_local_edits_and_rolls_back_collection() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let folder = ws.create_folder("Inbox")?;
        let note = ws.create_note(folder.id, "T", "server", start)?;

        ws.edit_content("local", start);
        ws.gateway().fail_mutations.set(true);
        assert_matches!(ws.tick(after(start, 1000)), Some(SaveOutcome::Failed { .. }));
        assert_eq!(ws.editor().phase(), EditorPhase::Error);
        assert_eq!(
            ws.state().note(note.id).and_then(|n| n.content.as_deref()),
            Some("server")
        );
        assert_eq!(ws.editor().fields().map(|f| f.content.as_str()), Some("local"));

        ws.gateway().fail_mutations.set(false);
        assert_eq!(
            ws.tick(after(start, 2000)),
            Some(SaveOutcome::Saved { note_id: note.id })
        );
        assert_eq!(
            ws.gateway().inner.fetch_note(note.id)?.content.as_deref(),
            Some("local")
        );
        Ok(())
    }

    #[test]
    fn rename_folder_rolls_back_on_failure() -> anyhow::Result<()> {
        let (_temp, mut ws) = workspace()?;
        let folder = ws.create_folder("Before")?;

        ws.gateway().fail_mutations.set(true);
        assert_matches!(
            ws.rename_folder(folder.id, "After"),
            Err(StorageError::Backend(_))
        );
        assert_eq!(ws.state().folder(folder.id).map(|f| f.name.as_str()), Some("Before"));

        ws.gateway().fail_mutations.set(false);
        let renamed = ws.rename_folder(folder.id, "  After ")?;
        assert_eq!(renamed.name, "After");
        assert_eq!(ws.state().folder(folder.id), Some(&renamed));
        Ok(())
    }

    #[test]
    fn blank_names_are_rejected_before_reaching_the_gateway() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        assert_matches!(ws.create_folder("  "), Err(StorageError::Validation(_)));
        assert!(ws.state().folders().is_empty());

        let folder = ws.create_folder("Inbox")?;
        let note = ws.create_note(folder.id, "", "", start)?;
        assert_matches!(ws.rename_note(note.id, " ", start), Err(StorageError::Validation(_)));
        let unchanged = ws.rename_note(note.id, "Untitled Note", start)?;
        assert_eq!(unchanged.title, None);
        assert!(ws.gateway().updates.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn renaming_open_note_updates_editor_snapshot() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let folder = ws.create_folder("Inbox")?;
        let note = ws.create_note(folder.id, "Old", "body", start)?;

        ws.rename_note(note.id, "New", start)?;
        assert_eq!(ws.editor().fields(), Some(&EditFields::new("New", "body")));
        assert!(!ws.editor().has_pending_changes());
        assert_eq!(ws.tick(after(start, 5000)), None);
        Ok(())
    }

    #[test]
    fn deleting_folder_closes_its_open_note() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let doomed = ws.create_folder("Doomed")?;
        let kept = ws.create_folder("Kept")?;
        ws.create_note(kept.id, "stay", "", start)?;
        let note = ws.create_note(doomed.id, "bye", "", start)?;
        ws.edit_content("unsaved", start);

        assert_eq!(ws.selected_note().map(|n| n.id), Some(note.id));
        ws.delete_folder(doomed.id)?;
        assert_eq!(ws.editor().note_id(), None);
        assert_eq!(ws.state().selected_note_id(), None);
        assert_eq!(ws.state().note(note.id), None);
        assert!(ws.gateway().updates.borrow().is_empty());

        ws.load(start)?;
        let folders: Vec<_> = ws.state().folders().iter().map(|f| f.id).collect();
        assert_eq!(folders, vec![kept.id]);
        assert_eq!(ws.state().note_count(), 1);
        Ok(())
    }

    #[test]
    fn deleting_missing_folder_reports_not_found() -> anyhow::Result<()> {
        let (_temp, mut ws) = workspace()?;
        assert_matches!(ws.delete_folder(404), Err(StorageError::NotFound { .. }));
        Ok(())
    }

    #[test]
    fn close_saves_pending_edits() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let folder = ws.create_folder("Inbox")?;
        let note = ws.create_note(folder.id, "T", "", start)?;
        ws.edit_title("Final title", start);

        assert_eq!(ws.close(start), Some(SaveOutcome::Saved { note_id: note.id }));
        assert_eq!(
            ws.gateway().inner.fetch_note(note.id)?.title.as_deref(),
            Some("Final title")
        );
        assert_eq!(ws.editor_status(), EditorStatus::Empty);
        Ok(())
    }

    #[test]
    fn load_picks_up_rows_created_elsewhere() -> anyhow::Result<()> {
        let start = Instant::now();
        let (_temp, mut ws) = workspace()?;
        let folder = ws.gateway().inner.create_folder("Remote")?;
        ws.gateway().inner.create_note(&NewNote {
            folder_id: folder.id,
            title: Some("remote note".into()),
            content: None,
        })?;

        ws.load(start)?;
        assert_eq!(ws.state().folders().len(), 1);
        assert_eq!(ws.state().notes_in(folder.id).len(), 1);
        Ok(())
    }
}
