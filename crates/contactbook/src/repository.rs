//! Contact repository.
//!
//! Every operation reloads the collection from the [`RecordStore`], works on
//! it in memory and, for mutations, saves it back. Nothing is cached between
//! calls.
//!
//! Lookups come in two flavours on purpose. [`ContactRepository::find_by_name`]
//! ignores case (it serves URLs typed by people), while
//! [`ContactRepository::find_exact`], [`ContactRepository::exists_by_name`] and
//! the mutations compare names exactly.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::contact::{Collection, Contact};
use crate::error::{Error, Result};
use crate::storage::RecordStore;

/// Result of a write that re-checks names under the write lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedWrite {
    /// The collection was saved.
    Written,
    /// Another contact already holds the requested name; nothing was saved.
    NameTaken,
    /// No contact holds the name being replaced; nothing was saved.
    Missing,
}

/// Read-modify-write operations over the stored collection.
#[derive(Debug)]
pub struct ContactRepository {
    store: RecordStore,
    /// Serializes load-mutate-save cycles within this process.
    write_lock: Mutex<()>,
}

impl ContactRepository {
    /// Create a repository on top of a store.
    #[must_use]
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Load the full collection in stored order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or parsed.
    pub fn all(&self) -> Result<Collection> {
        self.store.load()
    }

    /// First contact whose name matches ignoring case, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or parsed.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Contact>> {
        Ok(self
            .store
            .load()?
            .into_iter()
            .find(|c| c.name_matches_ignore_case(name)))
    }

    /// First contact whose name is exactly `name`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or parsed.
    pub fn find_exact(&self, name: &str) -> Result<Option<Contact>> {
        Ok(self.store.load()?.into_iter().find(|c| c.has_name(name)))
    }

    /// Whether a contact with exactly this name is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or parsed.
    pub fn exists_by_name(&self, name: &str) -> Result<bool> {
        Ok(self.store.load()?.iter().any(|c| c.has_name(name)))
    }

    /// Append a contact to the end of the collection.
    ///
    /// No validation happens here; the caller must have checked uniqueness.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read, parsed or written.
    pub fn add(&self, contact: Contact) -> Result<()> {
        let _guard = self.lock()?;
        let mut contacts = self.store.load()?;
        info!("Adding contact {:?}", contact.name);
        contacts.push(contact);
        self.store.save(&contacts)
    }

    /// Remove every contact whose name is exactly `name`.
    ///
    /// Returns how many were removed; zero is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read, parsed or written.
    pub fn delete(&self, name: &str) -> Result<usize> {
        let _guard = self.lock()?;
        let mut contacts = self.store.load()?;
        let before = contacts.len();
        contacts.retain(|c| !c.has_name(name));
        let removed = before - contacts.len();
        if removed == 0 {
            debug!("No contact named {name:?} to delete");
            return Ok(0);
        }
        self.store.save(&contacts)?;
        info!("Deleted {removed} contact(s) named {name:?}");
        Ok(removed)
    }

    /// Replace the contact named exactly `old_name` with `contact`.
    ///
    /// The old entry is dropped and the new one appended, so an updated
    /// contact moves to the end of the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read, parsed or written.
    pub fn update(&self, old_name: &str, contact: Contact) -> Result<()> {
        let _guard = self.lock()?;
        let mut contacts = self.store.load()?;
        contacts.retain(|c| !c.has_name(old_name));
        info!("Updating contact {old_name:?} -> {:?}", contact.name);
        contacts.push(contact);
        self.store.save(&contacts)
    }

    /// Append `contact` unless its name is already stored.
    ///
    /// The duplicate check and the save happen under the write lock, so two
    /// overlapping submissions of the same name cannot both land.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read, parsed or written.
    pub fn add_if_absent(&self, contact: Contact) -> Result<GuardedWrite> {
        let _guard = self.lock()?;
        let mut contacts = self.store.load()?;
        if contacts.iter().any(|c| c.has_name(&contact.name)) {
            debug!("Contact {:?} was added concurrently", contact.name);
            return Ok(GuardedWrite::NameTaken);
        }
        info!("Adding contact {:?}", contact.name);
        contacts.push(contact);
        self.store.save(&contacts)?;
        Ok(GuardedWrite::Written)
    }

    /// Replace the contact named exactly `old_name`, as [`Self::update`],
    /// provided it still exists and a new name is not held by someone else.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read, parsed or written.
    pub fn update_if_available(&self, old_name: &str, contact: Contact) -> Result<GuardedWrite> {
        let _guard = self.lock()?;
        let mut contacts = self.store.load()?;
        if !contacts.iter().any(|c| c.has_name(old_name)) {
            debug!("Contact {old_name:?} disappeared before update");
            return Ok(GuardedWrite::Missing);
        }
        if contact.name != old_name && contacts.iter().any(|c| c.has_name(&contact.name)) {
            debug!("Contact {:?} was added concurrently", contact.name);
            return Ok(GuardedWrite::NameTaken);
        }
        contacts.retain(|c| !c.has_name(old_name));
        info!("Updating contact {old_name:?} -> {:?}", contact.name);
        contacts.push(contact);
        self.store.save(&contacts)?;
        Ok(GuardedWrite::Written)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| Error::internal("contact repository write lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    fn create_test_repository() -> (TempDir, ContactRepository) {
        let dir = tempdir().expect("failed to create temp dir");
        let store = RecordStore::open(dir.path().join("contacts.json"))
            .expect("failed to create test store");
        (dir, ContactRepository::new(store))
    }

    fn contact(name: &str) -> Contact {
        Contact::new(name, format!("{}@x.com", name.to_lowercase()), "081234567890")
    }

    fn names(repo: &ContactRepository) -> Vec<String> {
        repo.all().unwrap().into_iter().map(|c| c.name).collect()
    }

    #[test]
    fn test_add_appends_in_order() {
        let (_dir, repo) = create_test_repository();
        for (i, name) in ["Amy", "Bo", "Cy"].iter().enumerate() {
            repo.add(contact(name)).unwrap();
            assert_eq!(repo.all().unwrap().len(), i + 1);
        }
        assert_eq!(names(&repo), vec!["Amy", "Bo", "Cy"]);
    }

    #[test]
    fn test_add_does_not_check_duplicates() {
        let (_dir, repo) = create_test_repository();
        repo.add(contact("Amy")).unwrap();
        repo.add(contact("Amy")).unwrap();
        assert_eq!(repo.all().unwrap().len(), 2);
    }

    #[test]
    fn test_find_by_name_ignores_case() {
        let (_dir, repo) = create_test_repository();
        repo.add(contact("Amy")).unwrap();

        let found = repo.find_by_name("AMY").unwrap();
        assert_eq!(found, Some(contact("Amy")));
        assert!(repo.find_by_name("Bo").unwrap().is_none());
    }

    #[test]
    fn test_find_by_name_returns_first_match() {
        let (_dir, repo) = create_test_repository();
        repo.add(Contact::new("amy", "first@x.com", "081234567890"))
            .unwrap();
        repo.add(Contact::new("Amy", "second@x.com", "081234567890"))
            .unwrap();

        let found = repo.find_by_name("AMY").unwrap().unwrap();
        assert_eq!(found.email, "first@x.com");
    }

    #[test]
    fn test_find_exact_is_case_sensitive() {
        let (_dir, repo) = create_test_repository();
        repo.add(contact("Amy")).unwrap();

        assert!(repo.find_exact("Amy").unwrap().is_some());
        assert!(repo.find_exact("amy").unwrap().is_none());
    }

    #[test]
    fn test_exists_by_name_is_case_sensitive() {
        let (_dir, repo) = create_test_repository();
        repo.add(contact("Amy")).unwrap();

        assert!(repo.exists_by_name("Amy").unwrap());
        assert!(!repo.exists_by_name("amy").unwrap());
        assert!(!repo.exists_by_name("Bo").unwrap());
    }

    #[test]
    fn test_delete_removes_exact_match() {
        let (_dir, repo) = create_test_repository();
        repo.add(contact("Amy")).unwrap();
        repo.add(contact("Bo")).unwrap();

        assert_eq!(repo.delete("Amy").unwrap(), 1);
        assert_eq!(names(&repo), vec!["Bo"]);
    }

    #[test]
    fn test_delete_nonexistent_is_noop() {
        let (_dir, repo) = create_test_repository();
        repo.add(contact("Amy")).unwrap();

        assert_eq!(repo.delete("amy").unwrap(), 0);
        assert_eq!(repo.delete("Zed").unwrap(), 0);
        assert_eq!(names(&repo), vec!["Amy"]);
    }

    #[test]
    fn test_delete_removes_all_duplicates() {
        let (_dir, repo) = create_test_repository();
        repo.add(contact("Amy")).unwrap();
        repo.add(contact("Bo")).unwrap();
        repo.add(contact("Amy")).unwrap();

        assert_eq!(repo.delete("Amy").unwrap(), 2);
        assert_eq!(names(&repo), vec!["Bo"]);
    }

    #[test]
    fn test_update_in_place_fields() {
        let (_dir, repo) = create_test_repository();
        repo.add(contact("Amy")).unwrap();

        let changed = Contact::new("Amy", "new@x.com", "085712345678");
        repo.update("Amy", changed.clone()).unwrap();

        assert_eq!(repo.all().unwrap(), vec![changed]);
    }

    #[test]
    fn test_update_rename_moves_to_end() {
        let (_dir, repo) = create_test_repository();
        repo.add(contact("Amy")).unwrap();
        repo.add(contact("Bo")).unwrap();

        repo.update("Amy", contact("Ann")).unwrap();

        assert_eq!(names(&repo), vec!["Bo", "Ann"]);
        assert!(repo.find_exact("Amy").unwrap().is_none());
        assert!(repo.find_exact("Ann").unwrap().is_some());
    }

    #[test]
    fn test_store_accessor() {
        let (dir, repo) = create_test_repository();
        assert_eq!(repo.store().path(), dir.path().join("contacts.json"));
    }

    #[test]
    fn test_add_if_absent() {
        let (_dir, repo) = create_test_repository();
        assert_eq!(
            repo.add_if_absent(contact("Amy")).unwrap(),
            GuardedWrite::Written
        );
        assert_eq!(
            repo.add_if_absent(Contact::new("Amy", "other@x.com", "085712345678"))
                .unwrap(),
            GuardedWrite::NameTaken
        );
        assert_eq!(repo.all().unwrap(), vec![contact("Amy")]);

        assert_eq!(
            repo.add_if_absent(contact("amy")).unwrap(),
            GuardedWrite::Written
        );
        assert_eq!(names(&repo), vec!["Amy", "amy"]);
    }

    #[test]
    fn test_concurrent_add_if_absent_keeps_names_unique() {
        let (_dir, repo) = create_test_repository();
        let repo = Arc::new(repo);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                std::thread::spawn(move || repo.add_if_absent(contact("Amy")).unwrap())
            })
            .collect();
        let written = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|w| *w == GuardedWrite::Written)
            .count();

        assert_eq!(written, 1);
        assert_eq!(names(&repo), vec!["Amy"]);
    }

    #[test]
    fn test_update_if_available() {
        let (_dir, repo) = create_test_repository();
        repo.add(contact("Amy")).unwrap();
        repo.add(contact("Bo")).unwrap();

        assert_eq!(
            repo.update_if_available("Bo", contact("Amy")).unwrap(),
            GuardedWrite::NameTaken
        );
        assert_eq!(
            repo.update_if_available("Zed", contact("Zoe")).unwrap(),
            GuardedWrite::Missing
        );
        assert_eq!(names(&repo), vec!["Amy", "Bo"]);

        let changed = Contact::new("Amy", "new@x.com", "081234567890");
        assert_eq!(
            repo.update_if_available("Amy", changed.clone()).unwrap(),
            GuardedWrite::Written
        );
        assert_eq!(
            repo.update_if_available("Bo", contact("Ben")).unwrap(),
            GuardedWrite::Written
        );
        assert_eq!(repo.all().unwrap(), vec![changed, contact("Ben")]);
    }

    #[test]
    fn test_corrupt_store_propagates() {
        let (dir, repo) = create_test_repository();
        std::fs::write(dir.path().join("contacts.json"), "garbage").unwrap();

        assert!(repo.all().unwrap_err().is_storage_corrupt());
        assert!(repo.find_by_name("Amy").unwrap_err().is_storage_corrupt());
        assert!(repo.add(contact("Amy")).unwrap_err().is_storage_corrupt());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("contacts.json")).unwrap(),
            "garbage"
        );
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let (_dir, repo) = create_test_repository();
        let repo = Arc::new(repo);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = Arc::clone(&repo);
                std::thread::spawn(move || repo.add(contact(&format!("Person{i}"))))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(repo.all().unwrap().len(), 8);
    }
}
