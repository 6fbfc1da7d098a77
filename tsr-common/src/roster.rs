//! Reference rosters: canonical people and projects
//!
//! Rosters are loaded once by the caller and passed by reference into every
//! resolver call. The reconciliation/resolution path only reads them; the
//! mutating methods here are administrative operations (curating members,
//! projects and aliases) followed by an explicit `save`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Normalize a project code for comparison: strip whitespace, uppercase
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

// ============================================================================
// People
// ============================================================================

/// Canonical team members plus curated OCR-variant aliases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonRoster {
    #[serde(default, rename = "team_members")]
    members: BTreeSet<String>,
    /// Raw OCR spelling → canonical member name
    #[serde(default, rename = "name_aliases")]
    aliases: BTreeMap<String, String>,
}

impl PersonRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roster from a list of canonical names (blank names ignored)
    pub fn from_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let members = members
            .into_iter()
            .map(|m| m.as_ref().trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        Self {
            members,
            aliases: BTreeMap::new(),
        }
    }

    /// Load `{ "team_members": [...], "name_aliases": {...} }`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let roster: PersonRoster = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            members = roster.members.len(),
            aliases = roster.aliases.len(),
            "Loaded person roster"
        );
        Ok(roster)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    /// Canonical name registered for an alias spelling
    pub fn alias_target(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Canonical names in sorted order
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Returns `false` if the member already existed or the name is blank
    pub fn add_member(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.members.insert(name.to_string())
    }

    /// Removes the member and every alias pointing at it
    pub fn remove_member(&mut self, name: &str) -> bool {
        let removed = self.members.remove(name);
        if removed {
            self.aliases.retain(|_, canonical| canonical != name);
        }
        removed
    }

    /// Map an observed spelling to an existing canonical member
    ///
    /// # Errors
    /// `Error::NotFound` when `canonical` is not a roster member.
    pub fn add_alias(&mut self, alias: &str, canonical: &str) -> Result<()> {
        if !self.members.contains(canonical) {
            return Err(Error::NotFound(format!("Team member '{}'", canonical)));
        }
        debug!(alias = %alias, canonical = %canonical, "Adding person alias");
        self.aliases.insert(alias.trim().to_string(), canonical.to_string());
        Ok(())
    }

    pub fn remove_alias(&mut self, alias: &str) -> bool {
        self.aliases.remove(alias).is_some()
    }
}

// ============================================================================
// Projects
// ============================================================================

/// Which side of a project an alias applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasType {
    Code,
    Name,
}

/// Observed variants that map to one canonical project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAliases {
    #[serde(default)]
    pub codes: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
}

/// Canonical project entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalProject {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub aliases: ProjectAliases,
}

impl CanonicalProject {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            aliases: ProjectAliases::default(),
        }
    }
}

/// Project master list, kept sorted by code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProjectRosterDocument")]
pub struct ProjectRoster {
    projects: Vec<CanonicalProject>,
}

/// On-disk shape; re-sorted on the way in
#[derive(Deserialize)]
struct ProjectRosterDocument {
    #[serde(default)]
    projects: Vec<CanonicalProject>,
}

impl From<ProjectRosterDocument> for ProjectRoster {
    fn from(document: ProjectRosterDocument) -> Self {
        ProjectRoster::from_projects(document.projects)
    }
}

impl ProjectRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_projects(projects: impl IntoIterator<Item = CanonicalProject>) -> Self {
        let mut roster = Self {
            projects: projects
                .into_iter()
                .map(|mut project| {
                    project.code = normalize_code(&project.code);
                    project
                })
                .collect(),
        };
        roster.projects.sort_by(|a, b| a.code.cmp(&b.code));
        roster.projects.dedup_by(|a, b| a.code == b.code);
        roster
    }

    /// Load `{ "projects": [{ "code", "name", "aliases": { "codes", "names" } }] }`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let roster: ProjectRoster = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            projects = roster.projects.len(),
            "Loaded project roster"
        );
        Ok(roster)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalProject> {
        self.projects.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.projects.iter().map(|p| p.code.as_str())
    }

    /// Exact lookup by canonical code
    pub fn get(&self, code: &str) -> Option<&CanonicalProject> {
        self.projects
            .binary_search_by(|p| p.code.as_str().cmp(code))
            .ok()
            .map(|idx| &self.projects[idx])
    }

    /// Project whose registered alias codes include `code` (after normalization)
    pub fn find_by_alias_code(&self, code: &str) -> Option<&CanonicalProject> {
        let wanted = normalize_code(code);
        self.projects
            .iter()
            .find(|p| p.aliases.codes.iter().any(|alias| normalize_code(alias) == wanted))
    }

    /// Returns `false` if a project with this code already exists
    pub fn add_project(&mut self, code: &str, name: &str) -> bool {
        let code = normalize_code(code);
        match self.projects.binary_search_by(|p| p.code.cmp(&code)) {
            Ok(_) => false,
            Err(idx) => {
                self.projects.insert(idx, CanonicalProject::new(code, name.trim()));
                true
            }
        }
    }

    pub fn remove_project(&mut self, code: &str) -> bool {
        let code = normalize_code(code);
        match self.projects.binary_search_by(|p| p.code.cmp(&code)) {
            Ok(idx) => {
                self.projects.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    /// Register an observed code or name variant for a canonical project
    ///
    /// Returns `Ok(false)` when the alias was already present.
    ///
    /// # Errors
    /// `Error::NotFound` when no project has `code`.
    pub fn add_alias(&mut self, code: &str, alias_type: AliasType, value: &str) -> Result<bool> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.code == code)
            .ok_or_else(|| Error::NotFound(format!("Project '{}'", code)))?;

        let list = match alias_type {
            AliasType::Code => &mut project.aliases.codes,
            AliasType::Name => &mut project.aliases.names,
        };
        if list.iter().any(|v| v == value) {
            return Ok(false);
        }
        debug!(code = %code, alias = %value, kind = ?alias_type, "Adding project alias");
        list.push(value.to_string());
        Ok(true)
    }

    pub fn remove_alias(&mut self, code: &str, alias_type: AliasType, value: &str) -> Result<bool> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.code == code)
            .ok_or_else(|| Error::NotFound(format!("Project '{}'", code)))?;

        let list = match alias_type {
            AliasType::Code => &mut project.aliases.codes,
            AliasType::Name => &mut project.aliases.names,
        };
        let before = list.len();
        list.retain(|v| v != value);
        Ok(list.len() != before)
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// Read-only snapshot of both rosters, handed to the pipeline per call
#[derive(Debug, Clone, Default)]
pub struct Rosters {
    pub people: PersonRoster,
    pub projects: ProjectRoster,
}

impl Rosters {
    pub fn new(people: PersonRoster, projects: ProjectRoster) -> Self {
        Self { people, projects }
    }

    /// Load whichever roster files are given; an absent path yields an empty roster
    pub fn load(people: Option<&Path>, projects: Option<&Path>) -> Result<Self> {
        let people = match people {
            Some(path) => PersonRoster::load(path)?,
            None => PersonRoster::new(),
        };
        let projects = match projects {
            Some(path) => ProjectRoster::load(path)?,
            None => ProjectRoster::new(),
        };
        Ok(Self { people, projects })
    }
}
