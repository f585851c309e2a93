//! Folder and routine lookup against the remote service.
//!
//! Listings are paged. A listing stops at the advertised `page_count`, on a
//! page shorter than the requested size (the server may omit `page_count`),
//! or at the configured page ceiling, whichever comes first.

use crate::remote::{ApiRequest, Transport};
use crate::retry::RetryPolicy;
use crate::{Error, Folder, RemoteRoutine, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::ops::ControlFlow;

pub const FOLDERS_PATH: &str = "/v1/routine_folders";
pub const ROUTINES_PATH: &str = "/v1/routines";

/// One page of a listing endpoint
trait Page: DeserializeOwned {
    type Item;
    fn into_parts(self) -> (Vec<Self::Item>, Option<u32>);
}

#[derive(Debug, Deserialize)]
struct FolderPage {
    #[serde(default)]
    routine_folders: Option<Vec<Folder>>,
    #[serde(default)]
    page_count: Option<u32>,
}

impl Page for FolderPage {
    type Item = Folder;
    fn into_parts(self) -> (Vec<Folder>, Option<u32>) {
        (self.routine_folders.unwrap_or_default(), self.page_count)
    }
}

#[derive(Debug, Deserialize)]
struct RoutinePage {
    #[serde(default)]
    routines: Option<Vec<RemoteRoutine>>,
    #[serde(default)]
    page_count: Option<u32>,
}

impl Page for RoutinePage {
    type Item = RemoteRoutine;
    fn into_parts(self) -> (Vec<RemoteRoutine>, Option<u32>) {
        (self.routines.unwrap_or_default(), self.page_count)
    }
}

#[derive(Debug, Deserialize)]
struct CreatedFolder {
    routine_folder: Folder,
}

/// Resolves folders and routines by title
pub struct RemoteResolver<'a, T: Transport> {
    transport: &'a T,
    retry: &'a RetryPolicy,
    page_size: u32,
    max_pages: u32,
}

impl<'a, T: Transport> RemoteResolver<'a, T> {
    pub fn new(transport: &'a T, retry: &'a RetryPolicy, page_size: u32, max_pages: u32) -> Self {
        Self {
            transport,
            retry,
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
        }
    }

    /// Walk a listing page by page until `visit` breaks or pages run out
    fn walk<P, R>(
        &self,
        path: &str,
        mut visit: impl FnMut(Vec<P::Item>) -> ControlFlow<R>,
    ) -> Result<Option<R>>
    where
        P: Page,
    {
        let mut page = 1;
        loop {
            let request = ApiRequest::get(path)
                .with_query("page", page)
                .with_query("pageSize", self.page_size);
            let value = self.transport.send(&request)?.into_result()?;
            let parsed: P = serde_json::from_value(value).map_err(|e| {
                Error::UnexpectedResponse(format!("{} page {}: {}", path, page, e))
            })?;
            let (items, page_count) = parsed.into_parts();
            let short_page = (items.len() as u32) < self.page_size;
            tracing::debug!(
                "{} page {}: {} items (page_count {:?})",
                path,
                page,
                items.len(),
                page_count
            );

            if let ControlFlow::Break(found) = visit(items) {
                return Ok(Some(found));
            }

            // A short page ends the walk even if page_count promises more
            let last = short_page || page_count.is_some_and(|count| page >= count);
            if last {
                return Ok(None);
            }
            if page >= self.max_pages {
                tracing::warn!(
                    "{}: stopped after {} pages without reaching the end",
                    path,
                    self.max_pages
                );
                return Ok(None);
            }
            page += 1;
        }
    }

    /// Find the folder titled `title`, creating it when no page has it
    pub fn ensure_folder(&self, title: &str) -> Result<Folder> {
        let existing = self.walk::<FolderPage, Folder>(FOLDERS_PATH, |folders| {
            match folders.into_iter().find(|f| f.title == title) {
                Some(folder) => ControlFlow::Break(folder),
                None => ControlFlow::Continue(()),
            }
        })?;

        if let Some(folder) = existing {
            tracing::debug!("Using folder '{}' ({})", folder.title, folder.id);
            return Ok(folder);
        }

        let body = json!({"routine_folder": {"title": title}});
        let value = self
            .retry
            .run(|| self.transport.send(&ApiRequest::post(FOLDERS_PATH, body.clone())))?;
        let created: CreatedFolder = serde_json::from_value(value)
            .map_err(|e| Error::UnexpectedResponse(format!("created folder: {}", e)))?;

        tracing::info!(
            "Created folder '{}' ({})",
            created.routine_folder.title,
            created.routine_folder.id
        );
        Ok(created.routine_folder)
    }

    /// Every routine on the account, across all pages
    pub fn list_routines(&self) -> Result<Vec<RemoteRoutine>> {
        let mut all = Vec::new();
        self.walk::<RoutinePage, ()>(ROUTINES_PATH, |routines| {
            all.extend(routines);
            ControlFlow::Continue(())
        })?;
        tracing::debug!("Listed {} remote routines", all.len());
        Ok(all)
    }

    /// First routine matching both title and folder, without memoization
    pub fn find_routine(&self, folder_id: u64, title: &str) -> Result<Option<RemoteRoutine>> {
        self.walk::<RoutinePage, RemoteRoutine>(ROUTINES_PATH, |routines| {
            match routines
                .into_iter()
                .find(|r| r.title == title && r.folder_id == Some(folder_id))
            {
                Some(found) => ControlFlow::Break(found),
                None => ControlFlow::Continue(()),
            }
        })
    }
}

/// Memoized full routine listing for one synchronization run
///
/// Populated on first use. Creates are added with [`RoutineListing::insert`]
/// so the listing stays current without a refetch; when a create's id is
/// unknown, callers [`RoutineListing::invalidate`] instead.
#[derive(Clone, Debug, Default)]
pub struct RoutineListing {
    routines: Option<Vec<RemoteRoutine>>,
}

impl RoutineListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.routines.is_some()
    }

    /// Look up a routine by (folder, title), fetching the listing if needed
    pub fn find<T: Transport>(
        &mut self,
        resolver: &RemoteResolver<'_, T>,
        folder_id: u64,
        title: &str,
    ) -> Result<Option<RemoteRoutine>> {
        if self.routines.is_none() {
            self.routines = Some(resolver.list_routines()?);
        }

        Ok(self.routines.as_ref().and_then(|routines| {
            routines
                .iter()
                .find(|r| r.title == title && r.folder_id == Some(folder_id))
                .cloned()
        }))
    }

    /// Add a routine this run created; no-op until the listing is loaded
    pub fn insert(&mut self, routine: RemoteRoutine) {
        if let Some(routines) = self.routines.as_mut() {
            routines.push(routine);
        }
    }

    pub fn invalidate(&mut self) {
        if self.routines.take().is_some() {
            tracing::debug!("Routine listing invalidated");
        }
    }
}
