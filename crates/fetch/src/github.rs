use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::pacing::Pacer;
use catalog_model::{Archetype, RawAssignment};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

const GITHUB_API: &str = "https://api.github.com";

/// Terraform template interpolations inside the library documents. They are
/// not valid JSON, so they get scrubbed to a fixed placeholder before
/// parsing.
static TEMPLATE_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{[^}]+\}").expect("valid template regex"));

#[derive(Debug, Deserialize)]
struct DirEntry {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

/// Fetches archetype definitions and the assignment documents they
/// reference from the landing-zone repository via the GitHub contents API.
pub struct GithubFetcher {
    client: Client,
    config: FetchConfig,
    pacer: Pacer,
}

impl GithubFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        let pacer = Pacer::new(config.github_min_interval);
        Ok(Self {
            client,
            config,
            pacer,
        })
    }

    /// Enumerate every archetype (scope) and its raw assignments.
    ///
    /// Assignment documents that cannot be located or parsed become raw
    /// records with an empty target id, so the resolver can count them in
    /// the skipped-items report instead of losing them silently.
    pub fn fetch_archetypes(&self) -> Result<Vec<Archetype>> {
        log::info!(
            "Fetching archetype definitions from {}",
            self.config.github_repo
        );
        let archetype_map = self.fetch_archetype_assignment_names()?;
        let total: usize = archetype_map.values().map(Vec::len).sum();
        log::info!(
            "Discovered {} archetype(s), {} assignment reference(s)",
            archetype_map.len(),
            total
        );

        let assignments = self.fetch_assignment_documents(&archetype_map)?;

        let archetypes = archetype_map
            .into_iter()
            .map(|(name, assignment_names)| Archetype {
                assignments: assignment_names
                    .iter()
                    .map(|assignment_name| {
                        assignments.get(assignment_name).cloned().unwrap_or_else(|| {
                            RawAssignment {
                                name: assignment_name.clone(),
                                ..RawAssignment::default()
                            }
                        })
                    })
                    .collect(),
                name,
            })
            .collect();
        Ok(archetypes)
    }

    /// Map of archetype name -> ordered assignment names.
    fn fetch_archetype_assignment_names(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut out = BTreeMap::new();
        for entry in self.list_dir(&self.config.archetype_dir)? {
            if entry.kind != "file" || !entry.name.ends_with(".json") {
                continue;
            }
            if entry.name.contains("default_empty") {
                continue;
            }
            let Some(url) = entry.download_url.as_deref() else {
                continue;
            };
            let Some(text) = self.get_text(url)? else {
                log::warn!("Archetype file {} disappeared, skipping", entry.name);
                continue;
            };
            match parse_archetype_doc(&text) {
                Ok(parsed) => {
                    for (archetype, names) in parsed {
                        log::debug!("  {archetype}: {} assignment(s)", names.len());
                        out.insert(archetype, names);
                    }
                }
                Err(err) => log::warn!("Skipping unparseable archetype file {}: {err}", entry.name),
            }
        }
        Ok(out)
    }

    /// Fetch each unique referenced assignment document once.
    fn fetch_assignment_documents(
        &self,
        archetype_map: &BTreeMap<String, Vec<String>>,
    ) -> Result<BTreeMap<String, RawAssignment>> {
        let file_map: BTreeMap<String, DirEntry> = self
            .list_dir(&self.config.assignment_dir)?
            .into_iter()
            .filter(|e| e.kind == "file")
            .map(|e| (e.name.clone(), e))
            .collect();

        let mut unique_names: Vec<&String> = archetype_map.values().flatten().collect();
        unique_names.sort();
        unique_names.dedup();
        log::info!("Fetching {} unique assignment document(s)", unique_names.len());

        let mut out = BTreeMap::new();
        for name in unique_names {
            let Some(entry) = locate_assignment_file(&file_map, name) else {
                log::warn!("No assignment document found for '{name}'");
                continue;
            };
            let Some(url) = entry.download_url.as_deref() else {
                continue;
            };
            let Some(text) = self.get_text(url)? else {
                log::warn!("Assignment document for '{name}' disappeared");
                continue;
            };
            match parse_assignment_doc(name, &text, entry.html_url.clone()) {
                Ok(raw) => {
                    out.insert(name.clone(), raw);
                }
                Err(err) => log::warn!("Skipping unparseable assignment '{name}': {err}"),
            }
        }
        Ok(out)
    }

    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let url = format!(
            "{GITHUB_API}/repos/{}/contents/{path}",
            self.config.github_repo
        );
        let Some(text) = self.get_text(&url)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&text).map_err(|source| FetchError::Json { url, source })
    }

    fn get_text(&self, url: &str) -> Result<Option<String>> {
        self.pacer.wait();
        let response = self.client.get(url).send()?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(Some(response.text()?))
    }
}

/// Replace terraform `${...}` interpolations with a fixed placeholder so
/// the document parses as JSON.
fn scrub_templates(content: &str) -> String {
    TEMPLATE_VAR.replace_all(content, "TEMPLATE_VAR").into_owned()
}

/// Parse one archetype library file: a map of archetype id to its declared
/// `policy_assignments` names. Archetypes without assignments are dropped.
fn parse_archetype_doc(content: &str) -> serde_json::Result<Vec<(String, Vec<String>)>> {
    let doc: BTreeMap<String, Value> = serde_json::from_str(&scrub_templates(content))?;
    Ok(doc
        .into_iter()
        .filter_map(|(archetype, data)| {
            let names: Vec<String> = data
                .get("policy_assignments")?
                .as_array()?
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            (!names.is_empty()).then_some((archetype, names))
        })
        .collect())
}

/// Parse one assignment document into a raw record.
fn parse_assignment_doc(
    fallback_name: &str,
    content: &str,
    source_url: Option<String>,
) -> serde_json::Result<RawAssignment> {
    let doc: Value = serde_json::from_str(&scrub_templates(content))?;
    let properties = doc.get("properties").cloned().unwrap_or(Value::Null);
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(fallback_name)
        .to_string();

    Ok(RawAssignment {
        display_name: properties
            .get("displayName")
            .and_then(Value::as_str)
            .map(str::to_string),
        target_id: properties
            .get("policyDefinitionId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        enforcement_mode: properties
            .get("enforcementMode")
            .and_then(Value::as_str)
            .map(str::to_string),
        kind_hint: None,
        overrides: unwrap_parameter_envelopes(properties.get("parameters")),
        source_url,
        name,
    })
}

/// Assignment parameters arrive as `{"name": {"value": ...}}`; unwrap the
/// envelope, keeping bare values as-is.
fn unwrap_parameter_envelopes(parameters: Option<&Value>) -> BTreeMap<String, Value> {
    let Some(Value::Object(map)) = parameters else {
        return BTreeMap::new();
    };
    map.iter()
        .map(|(name, value)| {
            let unwrapped = value.get("value").cloned().unwrap_or_else(|| value.clone());
            (name.clone(), unwrapped)
        })
        .collect()
}

/// Find the library file for an assignment name: exact candidate filenames
/// first, then a normalized case-insensitive match (the library's naming is
/// not perfectly uniform).
fn locate_assignment_file<'a>(
    file_map: &'a BTreeMap<String, DirEntry>,
    assignment_name: &str,
) -> Option<&'a DirEntry> {
    let stem = assignment_name.to_lowercase().replace('-', "_");
    let candidates = [
        format!("policy_assignment_es_{stem}.tmpl.json"),
        format!("policy_assignment_es_{stem}.json"),
    ];
    for candidate in &candidates {
        if let Some(entry) = file_map.get(candidate) {
            return Some(entry);
        }
    }
    file_map
        .values()
        .find(|entry| normalized_assignment_stem(&entry.name).eq_ignore_ascii_case(assignment_name))
}

fn normalized_assignment_stem(filename: &str) -> String {
    filename
        .trim_start_matches("policy_assignment_es_")
        .trim_end_matches(".tmpl.json")
        .trim_end_matches(".json")
        .replace('_', "-")
}
