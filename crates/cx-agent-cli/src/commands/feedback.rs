use anyhow::{bail, Result};
use console::style;
use cx_agent::models::feedback::FeedbackData;
use cx_agent::providers::factory::{select_client, ClientFactory};
use cx_agent::settings::Settings;

use super::session::build_backend;
use crate::ChatArgs;

/// Rate an earlier reply by run id, outside of an interactive session.
pub async fn execute(settings: &Settings, args: &ChatArgs, feedback: FeedbackData) -> Result<()> {
    let backend = build_backend(settings, args).await?;
    let client = backend.factory.create(select_client(&backend.settings))?;
    tracing::info!(client = client.name(), run_id = %feedback.run_id, "submitting feedback");

    if !client.submit_feedback(&feedback).await {
        bail!("feedback for run {} was not accepted", feedback.run_id);
    }
    println!("{}", style("Thank you for your feedback!").green());
    Ok(())
}
