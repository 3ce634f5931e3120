use anyhow::{bail, Result};
use esdsl::cluster::{HealthRequest, HealthStatus};
use esdsl_client::ElasticsearchClient;

/// Show cluster name and version
pub async fn run_info(client: &ElasticsearchClient) -> Result<()> {
    let info = client.info().await?;
    println!("Cluster: {} ({})", info.cluster_name, info.cluster_uuid);
    println!("Node:    {}", info.name);
    println!("Version: {}", info.version.number);
    if let Some(lucene) = &info.version.lucene_version {
        println!("Lucene:  {}", lucene);
    }
    Ok(())
}

pub fn parse_status(status: &str) -> Result<HealthStatus> {
    match status.to_ascii_lowercase().as_str() {
        "green" => Ok(HealthStatus::Green),
        "yellow" => Ok(HealthStatus::Yellow),
        "red" => Ok(HealthStatus::Red),
        other => bail!("Unknown health status '{}', expected green, yellow or red", other),
    }
}

/// Show cluster health
pub async fn run_health(
    client: &ElasticsearchClient,
    indices: &[String],
    wait_for: Option<&str>,
    timeout: Option<&str>,
) -> Result<()> {
    let mut request = HealthRequest::new().with_indices(indices);
    if let Some(status) = wait_for {
        request = request.with_wait_for_status(parse_status(status)?);
    }
    if let Some(timeout) = timeout {
        request = request.with_timeout(timeout);
    }

    let health = client.cluster_health(&request).await?;

    println!("Cluster Health");
    println!("==============");
    println!("Cluster:     {}", health.cluster_name);
    println!("Status:      {}", health.status);
    println!(
        "Nodes:       {} ({} data)",
        health.number_of_nodes, health.number_of_data_nodes
    );
    println!(
        "Shards:      {} active, {} primary, {} unassigned",
        health.active_shards, health.active_primary_shards, health.unassigned_shards
    );
    println!(
        "Active:      {:.1}%",
        health.active_shards_percent_as_number
    );
    if health.timed_out {
        tracing::warn!("Health request timed out before reaching the requested status");
    }
    Ok(())
}
