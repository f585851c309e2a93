//! Exercise template catalog.
//!
//! Parses the remote service's template export and indexes it by title
//! (program definitions refer to exercises by title) and by template id
//! (compiled blocks only carry the id).

use crate::{Error, ExerciseTemplate, Implement, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Export file format: `{"exercise_templates": [...]}`
#[derive(Debug, Deserialize)]
struct TemplateExport {
    #[serde(default)]
    exercise_templates: Vec<RawTemplate>,
}

#[derive(Debug, Deserialize)]
struct RawTemplate {
    id: String,
    title: String,
    #[serde(default)]
    equipment: Option<String>,
    #[serde(default)]
    primary_muscle_group: Option<String>,
    #[serde(default)]
    secondary_muscle_groups: Option<Vec<String>>,
}

impl From<RawTemplate> for ExerciseTemplate {
    fn from(raw: RawTemplate) -> Self {
        let implement = Implement::classify(&raw.title, raw.equipment.as_deref());
        ExerciseTemplate {
            id: raw.id,
            title: raw.title,
            implement,
            primary_muscle_group: raw.primary_muscle_group.unwrap_or_else(|| "other".into()),
            secondary_muscle_groups: raw
                .secondary_muscle_groups
                .unwrap_or_default()
                .into_iter()
                .collect::<BTreeSet<_>>(),
        }
    }
}

/// Immutable exercise reference data
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    by_title: HashMap<String, ExerciseTemplate>,
    title_by_id: HashMap<String, String>,
    duplicate_ids: Vec<String>,
}

impl Catalog {
    /// Build a catalog from already-classified templates
    pub fn from_templates(templates: impl IntoIterator<Item = ExerciseTemplate>) -> Self {
        let mut catalog = Catalog::default();
        for template in templates {
            if catalog.title_by_id.contains_key(&template.id) {
                catalog.duplicate_ids.push(template.id.clone());
            }
            catalog
                .title_by_id
                .insert(template.id.clone(), template.title.clone());
            catalog.by_title.insert(template.title.clone(), template);
        }
        catalog
    }

    /// Parse a template export document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let export: TemplateExport = serde_json::from_str(json)?;
        let catalog = Self::from_templates(
            export
                .exercise_templates
                .into_iter()
                .map(ExerciseTemplate::from),
        );
        tracing::debug!("Parsed {} exercise templates", catalog.len());
        Ok(catalog)
    }

    /// Load a template export from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&contents)?;
        tracing::info!("Loaded {} exercise templates from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&ExerciseTemplate> {
        self.by_title.get(title)
    }

    /// Look up a template by title, failing with a catalog error
    pub fn require(&self, title: &str) -> Result<&ExerciseTemplate> {
        self.get(title)
            .ok_or_else(|| Error::Catalog(format!("No exercise template titled '{}'", title)))
    }

    pub fn get_by_id(&self, id: &str) -> Option<&ExerciseTemplate> {
        self.title_by_id
            .get(id)
            .and_then(|title| self.by_title.get(title))
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (title, template) in &self.by_title {
            if template.id.is_empty() {
                errors.push(format!("Template '{}' has empty ID", title));
            }
            if title.is_empty() {
                errors.push(format!("Template '{}' has empty title", template.id));
            }
            if template.primary_muscle_group.is_empty() {
                errors.push(format!("Template '{}' has no primary muscle group", title));
            }
        }

        for id in &self.duplicate_ids {
            errors.push(format!("Template ID '{}' appears more than once", id));
        }

        errors
    }
}
