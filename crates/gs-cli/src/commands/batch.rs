//! Group commands: run, get and put

use anyhow::Result;

use gs_core::config::OutputFormat;
use gs_core::{BatchSummary, EndpointResult};
use gs_orchestrator::Group;

use crate::output::print_results;

/// Execute a shell command on every endpoint
pub async fn run_command(group: &Group, command: &str, format: OutputFormat) -> Result<()> {
    tracing::info!("Running {:?} on {} endpoints", command, group.len());
    let results = group.run(command).await;
    report(&results, format)
}

/// Fetch a remote file from every endpoint
///
/// `local_pattern` may contain `{host}` and `{port}`; without them every
/// endpoint writes the same local path.
pub async fn get_command(group: &Group, remote: &str, local_pattern: &str, format: OutputFormat) -> Result<()> {
    if group.len() > 1 && !gs_core::template::is_templated(local_pattern) {
        crate::output::print_warning(&format!(
            "{} has no {{host}} or {{port}}; every endpoint writes the same file",
            local_pattern
        ));
    }
    let results = group.get(remote, local_pattern).await;
    report(&results, format)
}

/// Upload a local file to every endpoint
pub async fn put_command(group: &Group, local: &str, remote: &str, format: OutputFormat) -> Result<()> {
    let results = group.put(local, remote).await;
    report(&results, format)
}

fn report(results: &[EndpointResult], format: OutputFormat) -> Result<()> {
    print_results(results, format)?;

    let summary = BatchSummary::of(results);
    if !summary.all_succeeded() {
        anyhow::bail!("{} of {} endpoints failed", summary.failed, summary.total);
    }
    Ok(())
}
