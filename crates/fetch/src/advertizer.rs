use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::pacing::Pacer;
use catalog_model::{
    extract_definition_id, Definition, DefinitionKey, DefinitionSource, Fetched,
    InitiativeDefinition, InitiativeMember, MemberParam, PolicyDefinition, SourceError, TargetKind,
};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// The definition pages embed the full definition JSON inside a
/// `copyDef()` script function.
static COPY_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"function\s+copyDef\s*\(\s*\)\s*\{\s*const\s+obj\s*=\s*(\{[\s\S]*?\});")
        .expect("valid copyDef regex")
});

/// A parameterized effect: `[parameters('effectName')]`.
static EFFECT_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[parameters\('([^']+)'\)\]").expect("valid effect regex"));

/// Definition source backed by AzAdvertizer pages. Lookups are paced and
/// memoized keyed by [`DefinitionKey`], so each id is fetched at most once
/// per run; absence (404, missing embed, parse failure) is a normal
/// `NotFound` outcome rather than an error.
pub struct AdvertizerSource {
    client: Client,
    base: String,
    pacer: Pacer,
    cache: RefCell<HashMap<DefinitionKey, Fetched>>,
}

impl AdvertizerSource {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base: config.advertizer_base.clone(),
            pacer: Pacer::new(config.advertizer_min_interval),
            cache: RefCell::new(HashMap::new()),
        })
    }

    fn page_url(&self, id: &str, kind: TargetKind) -> String {
        match kind {
            TargetKind::Policy => format!("{}/azpolicyadvertizer/{id}.html", self.base),
            TargetKind::Initiative => {
                format!("{}/azpolicyinitiativesadvertizer/{id}.html", self.base)
            }
        }
    }

    fn fetch_uncached(&self, id: &str, kind: TargetKind) -> Result<Fetched> {
        self.pacer.wait();
        let url = self.page_url(id, kind);
        log::debug!("Fetching definition page {url}");
        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            log::debug!("Definition '{id}' not found ({})", response.status());
            return Ok(Fetched::NotFound);
        }
        let html = response.text()?;
        let Some(doc) = extract_embedded_definition(&html) else {
            log::debug!("Definition page for '{id}' has no embedded JSON");
            return Ok(Fetched::NotFound);
        };
        let definition = match kind {
            TargetKind::Policy => Definition::Policy(parse_policy_definition(id, &doc)),
            TargetKind::Initiative => {
                Definition::Initiative(parse_initiative_definition(id, &doc))
            }
        };
        Ok(Fetched::Found(definition))
    }
}

impl DefinitionSource for AdvertizerSource {
    fn fetch(&self, id: &str, kind: TargetKind) -> catalog_model::Result<Fetched> {
        let key = DefinitionKey::new(id);
        if let Some(hit) = self.cache.borrow().get(&key) {
            return Ok(hit.clone());
        }
        // Transient failures are not cached; a retry within the run is
        // allowed to succeed.
        let fetched = self
            .fetch_uncached(id, kind)
            .map_err(|err| SourceError::new(id, err.to_string()))?;
        self.cache.borrow_mut().insert(key, fetched.clone());
        Ok(fetched)
    }
}

/// Pull the definition JSON out of the page's `copyDef()` script.
fn extract_embedded_definition(html: &str) -> Option<Value> {
    let caps = COPY_DEF.captures(html)?;
    serde_json::from_str(&caps[1]).ok()
}

fn properties(doc: &Value) -> &Value {
    doc.get("properties").unwrap_or(doc)
}

fn str_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn metadata_field(props: &Value, field: &str) -> String {
    props
        .get("metadata")
        .and_then(|m| m.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_policy_definition(id: &str, doc: &Value) -> PolicyDefinition {
    let props = properties(doc);
    let display_name = match str_field(props, "displayName") {
        s if s.is_empty() => id.to_string(),
        s => s,
    };
    let (parameter_defaults, parameter_names) = parse_parameters(props);
    PolicyDefinition {
        id: id.to_string(),
        display_name,
        description: str_field(props, "description"),
        category: metadata_field(props, "category"),
        version: metadata_field(props, "version"),
        policy_type: str_field(props, "policyType"),
        effect: extract_effect(props),
        parameter_defaults,
        parameter_names,
    }
}

fn parse_initiative_definition(id: &str, doc: &Value) -> InitiativeDefinition {
    let props = properties(doc);
    let display_name = match str_field(props, "displayName") {
        s if s.is_empty() => id.to_string(),
        s => s,
    };
    let members: Vec<InitiativeMember> = props
        .get("policyDefinitions")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let policy_id =
                        extract_definition_id(entry.get("policyDefinitionId")?.as_str()?);
                    (!policy_id.is_empty()).then(|| InitiativeMember {
                        policy_id: policy_id.to_string(),
                        parameters: parse_member_parameters(entry.get("parameters")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    // Some documents carry their own member count; when present it is kept
    // so the expander can flag a disagreement with the parsed list.
    let declared_count = props
        .get("policyDefinitionsCount")
        .or_else(|| props.get("metadata").and_then(|m| m.get("policyDefinitionsCount")))
        .and_then(Value::as_u64)
        .map(|n| n as usize);

    InitiativeDefinition {
        id: id.to_string(),
        display_name,
        description: str_field(props, "description"),
        category: metadata_field(props, "category"),
        version: metadata_field(props, "version"),
        policy_type: str_field(props, "policyType"),
        declared_count,
        members,
    }
}

fn parse_member_parameters(parameters: Option<&Value>) -> BTreeMap<String, MemberParam> {
    let Some(Value::Object(map)) = parameters else {
        return BTreeMap::new();
    };
    map.iter()
        .map(|(name, value)| {
            let inner = value.get("value").cloned().unwrap_or_else(|| value.clone());
            (name.clone(), MemberParam::from_value(inner))
        })
        .collect()
}

/// Parameter schema: defaults for parameters that declare one, plus the
/// full sorted name list for display.
fn parse_parameters(props: &Value) -> (BTreeMap<String, Value>, Vec<String>) {
    let Some(Value::Object(map)) = props.get("parameters") else {
        return (BTreeMap::new(), Vec::new());
    };
    let defaults = map
        .iter()
        .filter_map(|(name, def)| Some((name.clone(), def.get("defaultValue")?.clone())))
        .collect();
    let mut names: Vec<String> = map.keys().cloned().collect();
    names.sort();
    (defaults, names)
}

/// The rule's `then.effect`. A parameterized effect is followed to the
/// parameter's default value; a parameterized effect with no default reads
/// as "Parameterized", a non-string effect as "Unknown".
fn extract_effect(props: &Value) -> String {
    let effect = props
        .get("policyRule")
        .and_then(|r| r.get("then"))
        .and_then(|t| t.get("effect"));
    let Some(effect) = effect else {
        return String::new();
    };
    let Some(effect) = effect.as_str() else {
        return "Unknown".to_string();
    };
    let Some(caps) = EFFECT_PARAM.captures(effect) else {
        return effect.to_string();
    };

    let param_name = &caps[1];
    let params = props.get("parameters");
    let default = params
        .and_then(|p| p.get(param_name))
        .or_else(|| params.and_then(|p| p.get(param_name.to_lowercase())))
        .and_then(|def| def.get("defaultValue"));
    match default {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "Parameterized".to_string(),
    }
}
