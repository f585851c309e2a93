//! Idempotent routine synchronization.
//!
//! Routines are identified remotely by (folder id, title). Existing
//! routines are only rewritten when the hash of their sanitized body
//! differs from the last body written for them.

use crate::config::Config;
use crate::hash_cache::{content_hash, RoutineHashCache};
use crate::remote::{ApiRequest, HttpTransport, Transport};
use crate::resolver::{RemoteResolver, RoutineListing, ROUTINES_PATH};
use crate::retry::RetryPolicy;
use crate::types::deserialize_remote_id;
use crate::{CompiledPlan, Error, ExerciseBlock, Folder, RemoteRoutine, Result, Routine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Routine body in the remote write schema
///
/// Carries only writable fields: no server-assigned ids or ordinal
/// indices, and no folder reference on updates.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RoutineWrite<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<u64>,
    pub notes: &'a str,
    pub exercises: &'a [ExerciseBlock],
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RoutineEnvelope<'a> {
    pub routine: RoutineWrite<'a>,
}

/// Body for `POST /v1/routines`
pub fn sanitize_for_create(routine: &Routine) -> RoutineEnvelope<'_> {
    RoutineEnvelope {
        routine: RoutineWrite {
            title: &routine.title,
            folder_id: routine.folder_id,
            notes: &routine.notes,
            exercises: &routine.exercises,
        },
    }
}

/// Body for `PUT /v1/routines/{id}`; the update endpoint rejects `folder_id`
pub fn sanitize_for_update(routine: &Routine) -> RoutineEnvelope<'_> {
    RoutineEnvelope {
        routine: RoutineWrite {
            folder_id: None,
            ..sanitize_for_create(routine).routine
        },
    }
}

/// What `upsert` did with a routine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The id is absent when the create response did not include it
    Created { id: Option<String> },
    Updated { id: String },
    Skipped { id: String },
}

impl UpsertOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            UpsertOutcome::Created { .. } => "created",
            UpsertOutcome::Updated { .. } => "updated",
            UpsertOutcome::Skipped { .. } => "skipped",
        }
    }
}

/// Result of syncing one routine in a plan
#[derive(Debug)]
pub struct RoutineSync {
    pub title: String,
    pub result: Result<UpsertOutcome>,
}

/// Summary of a plan-wide synchronization run
#[derive(Debug)]
pub struct SyncReport {
    pub folder: Folder,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub routines: Vec<RoutineSync>,
}

impl SyncReport {
    fn count(&self, label: &str) -> usize {
        self.routines
            .iter()
            .filter(|r| matches!(&r.result, Ok(outcome) if outcome.label() == label))
            .count()
    }

    pub fn created(&self) -> usize {
        self.count("created")
    }

    pub fn updated(&self) -> usize {
        self.count("updated")
    }

    pub fn skipped(&self) -> usize {
        self.count("skipped")
    }

    pub fn failed(&self) -> usize {
        self.routines.iter().filter(|r| r.result.is_err()).count()
    }
}

/// Tunables for a [`SyncEngine`]
#[derive(Clone, Debug)]
pub struct SyncSettings {
    pub page_size: u32,
    pub max_pages: u32,
    pub write_delay: Duration,
    pub retry: RetryPolicy,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.api.page_size,
            max_pages: config.api.max_pages,
            write_delay: config.sync.write_delay(),
            retry: RetryPolicy::from_config(&config.retry),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Deserialize)]
struct CreatedId {
    #[serde(deserialize_with = "deserialize_remote_id")]
    id: String,
}

/// Pulls the new routine id out of a create response
///
/// The service answers `{"routine": [{...}]}`; a bare object is accepted too.
/// Ids follow the same string-or-number shape as the listing.
fn created_routine_id(value: &Value) -> Option<String> {
    let routine = value.get("routine")?;
    let routine = match routine {
        Value::Array(items) => items.first()?,
        other => other,
    };
    CreatedId::deserialize(routine).ok().map(|created| created.id)
}

/// Create-or-update engine for one run
pub struct SyncEngine<T: Transport> {
    transport: T,
    settings: SyncSettings,
    hashes: RoutineHashCache,
    listing: RoutineListing,
}

impl SyncEngine<HttpTransport> {
    /// Engine talking HTTP to the configured service, hashes loaded from
    /// the configured cache file
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.api)?;
        let hashes = RoutineHashCache::load(&config.hash_cache_path())?;
        Ok(Self::new(transport, SyncSettings::from_config(config), hashes))
    }
}

/// Sync a compiled plan into the configured folder
pub fn sync_with_config(config: &Config, plan: &CompiledPlan) -> Result<SyncReport> {
    SyncEngine::<HttpTransport>::from_config(config)?.sync_plan(plan, &config.sync.folder_title)
}

impl<T: Transport> SyncEngine<T> {
    pub fn new(transport: T, settings: SyncSettings, hashes: RoutineHashCache) -> Self {
        Self {
            transport,
            settings,
            hashes,
            listing: RoutineListing::new(),
        }
    }

    pub fn hashes(&self) -> &RoutineHashCache {
        &self.hashes
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn resolver(&self) -> RemoteResolver<'_, T> {
        RemoteResolver::new(
            &self.transport,
            &self.settings.retry,
            self.settings.page_size,
            self.settings.max_pages,
        )
    }

    /// Resolve (or create) the destination folder
    pub fn ensure_folder(&self, title: &str) -> Result<Folder> {
        self.resolver().ensure_folder(title)
    }

    fn write(&self, request: ApiRequest) -> Result<Value> {
        let value = self
            .settings
            .retry
            .run(|| self.transport.send(&request))?;
        if !self.settings.write_delay.is_zero() {
            std::thread::sleep(self.settings.write_delay);
        }
        Ok(value)
    }

    /// Create the routine, or update it when its content changed
    ///
    /// The routine must carry a title and a folder id; otherwise this is a
    /// configuration error and nothing is sent.
    ///
    /// Updates record the hash of the body they sent. A create records the
    /// hash of the update-form body (the create body minus `folder_id`)
    /// under the new id, so an unchanged re-run is skipped rather than
    /// rewritten once.
    pub fn upsert(&mut self, routine: &Routine) -> Result<UpsertOutcome> {
        if routine.title.trim().is_empty() {
            return Err(Error::InvalidRoutine("routine must include a title".into()));
        }
        let folder_id = routine.folder_id.ok_or_else(|| {
            Error::InvalidRoutine(format!("routine '{}' has no folder_id", routine.title))
        })?;

        let existing = {
            let resolver = RemoteResolver::new(
                &self.transport,
                &self.settings.retry,
                self.settings.page_size,
                self.settings.max_pages,
            );
            self.listing.find(&resolver, folder_id, &routine.title)?
        };

        let update_body = sanitize_for_update(routine);
        let new_hash = content_hash(&update_body)?;

        match existing {
            Some(remote) => {
                let id = remote.id;
                if self.hashes.get(&id) == Some(new_hash.as_str()) {
                    tracing::debug!("'{}' unchanged ({}), skipping", routine.title, new_hash);
                    return Ok(UpsertOutcome::Skipped { id });
                }

                let body = serde_json::to_value(&update_body)?;
                self.write(ApiRequest::put(format!("{}/{}", ROUTINES_PATH, id), body))?;
                self.hashes.record(&id, &new_hash)?;
                tracing::info!("Updated routine '{}' ({})", routine.title, id);
                Ok(UpsertOutcome::Updated { id })
            }
            None => {
                let body = serde_json::to_value(sanitize_for_create(routine))?;
                let response = self.write(ApiRequest::post(ROUTINES_PATH, body))?;

                let id = created_routine_id(&response);
                match &id {
                    Some(id) => {
                        self.listing.insert(RemoteRoutine {
                            id: id.clone(),
                            title: routine.title.clone(),
                            folder_id: Some(folder_id),
                        });
                        self.hashes.record(id, &new_hash)?;
                    }
                    None => {
                        self.listing.invalidate();
                        tracing::debug!(
                            "Create response for '{}' carried no id; hash not recorded",
                            routine.title
                        );
                    }
                }
                tracing::info!("Created routine '{}' ({:?})", routine.title, id);
                Ok(UpsertOutcome::Created { id })
            }
        }
    }

    /// Upload every routine of a compiled plan into `folder_title`
    ///
    /// Failures scoped to a single write are recorded and the run moves on;
    /// anything else aborts the run.
    pub fn sync_plan(&mut self, plan: &CompiledPlan, folder_title: &str) -> Result<SyncReport> {
        let started_at = Utc::now();
        self.listing.invalidate();
        let folder = self.ensure_folder(folder_title)?;
        let mut routines = Vec::new();

        for routine in plan.routines() {
            let routine = routine.with_folder(folder.id);
            let result = match self.upsert(&routine) {
                Ok(outcome) => {
                    tracing::info!("{}: {}", routine.title, outcome.label());
                    Ok(outcome)
                }
                Err(e) if e.is_write_scoped() => {
                    tracing::error!("{}: {}", routine.title, e);
                    Err(e)
                }
                Err(e) => return Err(e),
            };

            routines.push(RoutineSync {
                title: routine.title,
                result,
            });
        }

        let report = SyncReport {
            folder,
            started_at,
            finished_at: Utc::now(),
            routines,
        };
        tracing::info!(
            "Sync finished: {} created, {} updated, {} skipped, {} failed",
            report.created(),
            report.updated(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }
}
