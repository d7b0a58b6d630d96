use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use crf_cli::replay::{ReplayOutcome, replay};
use crf_cli::script::{load_datasets, load_script};
use crf_model::{ConfigurationReport, FormModel, check_form_model};
use crf_visibility::EngineConfig;

use crate::cli::{CheckArgs, ReplayArgs};

pub fn run_check(args: &CheckArgs) -> Result<ConfigurationReport> {
    let form = FormModel::load(&args.form)
        .with_context(|| format!("load form model {}", args.form.display()))?;
    let span = info_span!("check", form = %form.id);
    let _guard = span.enter();
    let report = check_form_model(&form);
    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "form model checked"
    );
    Ok(report)
}

pub fn run_replay(args: &ReplayArgs, log_data: bool) -> Result<ReplayOutcome> {
    let form = FormModel::load(&args.form)
        .with_context(|| format!("load form model {}", args.form.display()))?;
    let datasets = load_datasets(&args.datasets)?;
    let steps = load_script(&args.script)?;
    let config = match &args.config {
        Some(path) => EngineConfig::load(path).context("load engine configuration")?,
        None => EngineConfig::default(),
    };
    let disabled = config.disabled || args.disabled;
    let log_values = config.log_values || log_data;
    let config = config.with_disabled(disabled).with_log_values(log_values);
    replay(Arc::new(form), datasets, &steps, config).context("replay script")
}
