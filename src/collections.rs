//! Collection operations
//!
//! Every mutation works on a copy and returns the new snapshot, which the
//! caller persists whole. Validation failures leave the input untouched.

use thiserror::Error;

use crate::constants::{DEFAULT_COLLECTION_NAME, DEFAULT_REQUEST_NAME};
use crate::models::{new_id, ApiRequest, Collection};

/// Validation errors surfaced to the user as notifications
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("Please enter a collection name")]
    EmptyName,
    #[error("Please select a valid collection")]
    UnknownCollection,
}

/// Where a request gets saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    Existing(String),
    New(String),
}

/// Result of a successful save
#[derive(Debug, Clone)]
pub struct Saved {
    pub collections: Vec<Collection>,
    pub collection_name: String,
    pub request: ApiRequest,
}

pub fn create_collection(
    collections: &[Collection],
    name: &str,
) -> Result<Vec<Collection>, CollectionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CollectionError::EmptyName);
    }
    let mut updated = collections.to_vec();
    updated.push(Collection::new(name));
    Ok(updated)
}

/// Remove a collection; `None` when no collection has that id
pub fn delete_collection(collections: &[Collection], id: &str) -> Option<Vec<Collection>> {
    if !collections.iter().any(|c| c.id == id) {
        return None;
    }
    Some(collections.iter().filter(|c| c.id != id).cloned().collect())
}

/// Remove a request from a collection or any of its folders
pub fn remove_request(
    collections: &[Collection],
    collection_id: &str,
    request_id: &str,
) -> Option<Vec<Collection>> {
    let mut updated = collections.to_vec();
    let collection = updated.iter_mut().find(|c| c.id == collection_id)?;
    if remove_from_tree(collection, request_id) {
        Some(updated)
    } else {
        None
    }
}

/// Find a saved request in a collection or any of its folders
pub fn find_request<'a>(
    collections: &'a [Collection],
    collection_id: &str,
    request_id: &str,
) -> Option<&'a ApiRequest> {
    let collection = collections.iter().find(|c| c.id == collection_id)?;
    find_in_tree(collection, request_id)
}

fn find_in_tree<'a>(folder: &'a Collection, request_id: &str) -> Option<&'a ApiRequest> {
    folder
        .requests
        .iter()
        .find(|r| r.id == request_id)
        .or_else(|| {
            folder
                .folders
                .iter()
                .find_map(|child| find_in_tree(child, request_id))
        })
}

fn remove_from_tree(folder: &mut Collection, request_id: &str) -> bool {
    if let Some(pos) = folder.requests.iter().position(|r| r.id == request_id) {
        folder.requests.remove(pos);
        return true;
    }
    folder
        .folders
        .iter_mut()
        .any(|child| remove_from_tree(child, request_id))
}

/// Save a copy of `request` under `name`. The copy gets a fresh id so the
/// saved entry is independent of the active request.
pub fn save_request(
    collections: &[Collection],
    request: &ApiRequest,
    name: &str,
    target: SaveTarget,
) -> Result<Saved, CollectionError> {
    let mut updated = collections.to_vec();

    let target_id = match target {
        SaveTarget::New(collection_name) => {
            let collection_name = collection_name.trim();
            if collection_name.is_empty() {
                return Err(CollectionError::EmptyName);
            }
            let collection = Collection::new(collection_name);
            let id = collection.id.clone();
            updated.push(collection);
            id
        }
        SaveTarget::Existing(id) => id,
    };

    let collection = updated
        .iter_mut()
        .find(|c| c.id == target_id)
        .ok_or(CollectionError::UnknownCollection)?;

    let name = name.trim();
    let saved = ApiRequest {
        id: new_id(),
        name: if name.is_empty() {
            DEFAULT_REQUEST_NAME.to_string()
        } else {
            name.to_string()
        },
        ..request.clone()
    };
    collection.requests.push(saved.clone());
    let collection_name = collection.name.clone();

    Ok(Saved {
        collections: updated,
        collection_name,
        request: saved,
    })
}

/// Save into the first collection, creating a default one if there is none
pub fn quick_save(collections: &[Collection], request: &ApiRequest) -> Saved {
    let target = match collections.first() {
        Some(first) => SaveTarget::Existing(first.id.clone()),
        None => SaveTarget::New(DEFAULT_COLLECTION_NAME.to_string()),
    };
    match save_request(collections, request, &request.name, target) {
        Ok(saved) => saved,
        // Both targets above are valid by construction
        Err(_) => Saved {
            collections: collections.to_vec(),
            collection_name: String::new(),
            request: request.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_request(name: &str) -> Collection {
        let mut collection = Collection::new(name);
        collection.requests.push(ApiRequest::default());
        collection
    }

    #[test]
    fn create_rejects_blank_names() {
        assert_eq!(
            create_collection(&[], "   ").unwrap_err(),
            CollectionError::EmptyName
        );
        let created = create_collection(&[], " Users ").unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "Users");
    }

    #[test]
    fn save_to_new_collection() {
        let request = ApiRequest::default();
        let saved = save_request(&[], &request, "List users", SaveTarget::New("Api".into())).unwrap();

        assert_eq!(saved.collection_name, "Api");
        assert_eq!(saved.collections[0].requests.len(), 1);
        let stored = &saved.collections[0].requests[0];
        assert_eq!(stored.name, "List users");
        assert_ne!(stored.id, request.id);
    }

    #[test]
    fn save_validation_leaves_input_unchanged() {
        let existing = vec![Collection::new("Api")];
        let request = ApiRequest::default();

        let err = save_request(&existing, &request, "x", SaveTarget::New("".into())).unwrap_err();
        assert_eq!(err, CollectionError::EmptyName);
        assert_eq!(err.to_string(), "Please enter a collection name");

        let err = save_request(&existing, &request, "x", SaveTarget::Existing("missing".into()))
            .unwrap_err();
        assert_eq!(err, CollectionError::UnknownCollection);
        assert!(existing[0].requests.is_empty());
    }

    #[test]
    fn quick_save_creates_default_collection() {
        let saved = quick_save(&[], &ApiRequest::default());
        assert_eq!(saved.collection_name, DEFAULT_COLLECTION_NAME);
        assert_eq!(saved.collections[0].request_count(), 1);

        let again = quick_save(&saved.collections, &ApiRequest::default());
        assert_eq!(again.collections.len(), 1);
        assert_eq!(again.collections[0].requests.len(), 2);
    }

    #[test]
    fn remove_request_searches_folders() {
        let mut collection = with_request("Api");
        let mut folder = Collection::new("Nested");
        let nested = ApiRequest::default();
        let nested_id = nested.id.clone();
        folder.requests.push(nested);
        collection.folders.push(folder);
        let collections = vec![collection];

        assert!(find_request(&collections, &collections[0].id, &nested_id).is_some());
        let updated = remove_request(&collections, &collections[0].id, &nested_id).unwrap();
        assert_eq!(updated[0].request_count(), 1);
        assert!(remove_request(&collections, &collections[0].id, "missing").is_none());
    }

    #[test]
    fn delete_collection_by_id() {
        let collections = vec![with_request("A"), with_request("B")];
        let updated = delete_collection(&collections, &collections[0].id).unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].name, "B");
        assert!(delete_collection(&collections, "nope").is_none());
    }
}
