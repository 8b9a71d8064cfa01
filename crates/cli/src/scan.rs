use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing::info;
use vigil_api::Finding;
use vigil_core::config::VigilConfig;

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Installed")]
    version: String,
    #[tabled(rename = "Fixed In")]
    fixed_in: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Vulnerability")]
    id: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Location")]
    location: String,
}

impl From<&Finding> for FindingRow {
    fn from(finding: &Finding) -> Self {
        Self {
            package: finding.artifact.name.clone(),
            version: finding.artifact.version.clone(),
            fixed_in: finding.fixed_in(),
            kind: finding.artifact.kind.clone(),
            id: finding.vulnerability.id.clone(),
            severity: finding.vulnerability.severity.clone(),
            location: finding.first_location().unwrap_or_default().to_string(),
        }
    }
}

pub async fn run(
    config: &VigilConfig,
    path: PathBuf,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = vigil_runtime::build_provider(config)?;
    let grype = provider.get().await?;

    info!("Scanning {}...", path.display());
    let report = grype.scan(&path).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.is_empty() {
        println!("No vulnerable packages found.");
    } else {
        let rows: Vec<FindingRow> = report.iter().map(FindingRow::from).collect();
        println!("{}", Table::new(rows));
        println!("{}", report.summary());
    }
    Ok(())
}
