use catalog_model::{LinkBuilder, TargetKind};

/// Best-effort reference URLs for catalog rows: AzAdvertizer pages for
/// definitions, repository blobs for assignment documents. Pure; never
/// fails, at worst a link that may not resolve.
#[derive(Debug, Clone)]
pub struct CatalogLinks {
    advertizer_base: String,
    github_repo: String,
    assignment_dir: String,
}

impl CatalogLinks {
    pub fn new(
        advertizer_base: impl Into<String>,
        github_repo: impl Into<String>,
        assignment_dir: impl Into<String>,
    ) -> Self {
        Self {
            advertizer_base: advertizer_base.into(),
            github_repo: github_repo.into(),
            assignment_dir: assignment_dir.into(),
        }
    }
}

impl LinkBuilder for CatalogLinks {
    fn definition_url(&self, id: &str, kind: TargetKind) -> String {
        if id.is_empty() {
            return String::new();
        }
        match kind {
            TargetKind::Policy => format!("{}/azpolicyadvertizer/{id}.html", self.advertizer_base),
            TargetKind::Initiative => format!(
                "{}/azpolicyinitiativesadvertizer/{id}.html",
                self.advertizer_base
            ),
        }
    }

    fn assignment_url(&self, _scope: &str, assignment_name: &str) -> String {
        if assignment_name.is_empty() {
            return String::new();
        }
        let stem = assignment_name.to_lowercase().replace('-', "_");
        format!(
            "https://github.com/{}/blob/main/{}/policy_assignment_es_{stem}.tmpl.json",
            self.github_repo, self.assignment_dir
        )
    }
}
