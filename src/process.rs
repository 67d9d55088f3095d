use crate::importer::ConversationRecord;
use crate::linearizer;
use crate::renderer;
use crate::utils::{ExportConfig, TranscriptStats};
use eyre::{Context, Result, eyre};
use std::fs::{self, File};
use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of exporting one conversation file.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub output_path: PathBuf,
    pub stats: TranscriptStats,
}

pub fn load_record(path: &Path) -> Result<ConversationRecord> {
    let json = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read: {}", path.display()))?;
    serde_json::from_str(&json)
        .wrap_err_with(|| format!("Failed to parse conversation JSON: {}", path.display()))
}

/// Read one exported conversation and write its transcript.
pub fn export_file(input: &Path, config: &ExportConfig) -> Result<ExportOutcome> {
    let record = load_record(input)?;
    debug!(
        file = %input.display(),
        conversation_id = ?record.conversation_id(),
        nodes = record.mapping.as_ref().map_or(0, |m| m.len()),
        created = ?record.created_at(),
        updated = ?record.updated_at(),
        "loaded conversation"
    );

    let messages = linearizer::linearize(&record)
        .wrap_err_with(|| format!("Cannot flatten {}", input.display()))?;

    if let Some(dir) = &config.output_dir {
        fs::create_dir_all(dir).wrap_err_with(|| {
            format!("Failed to create output directory: {}", dir.display())
        })?;
    }

    let output_path = renderer::output_path(input, config.output_dir.as_deref());
    if output_path == input {
        return Err(eyre!(
            "Refusing to overwrite the input file: {}",
            input.display()
        ));
    }

    let file = File::create(&output_path)
        .wrap_err_with(|| format!("Failed to create: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    renderer::write_transcript(&mut writer, record.title.as_deref(), &messages)
        .wrap_err_with(|| format!("Failed to write: {}", output_path.display()))?;
    writer.flush().wrap_err("Failed to flush transcript file")?;

    Ok(ExportOutcome {
        output_path,
        stats: TranscriptStats::collect(&messages),
    })
}

/// Export every input in turn. A failing file does not stop the batch, and
/// no transcript written earlier in the batch is overwritten by a later input.
pub fn execute(inputs: &[PathBuf], config: &ExportConfig) -> Result<()> {
    if let [input] = inputs {
        let outcome = export_file(input, config)?;
        report(&outcome, config);
        return Ok(());
    }

    let mut written: HashSet<PathBuf> = HashSet::new();
    let mut count_exported = 0usize;
    let mut count_errors = 0usize;

    for input in inputs {
        let planned = renderer::output_path(input, config.output_dir.as_deref());
        let result = if written.contains(&planned) {
            Err(eyre!(
                "{} was already written by an earlier input",
                planned.display()
            ))
        } else {
            export_file(input, config)
        };

        match result {
            Ok(outcome) => {
                count_exported += 1;
                written.insert(outcome.output_path.clone());
                report(&outcome, config);
            }
            Err(e) => {
                count_errors += 1;
                eprintln!("Error [{}]: {:#}", input.display(), e);
            }
        }
    }

    if !config.quiet {
        let mut summary = format!("Done. {} exported.", count_exported);
        if count_errors > 0 {
            summary.push_str(&format!(" Completed with {} error(s).", count_errors));
        }
        eprintln!("{}", summary);
    }

    if count_errors > 0 {
        return Err(eyre!(
            "{} of {} file(s) failed to export",
            count_errors,
            inputs.len()
        ));
    }
    Ok(())
}

fn report(outcome: &ExportOutcome, config: &ExportConfig) {
    if config.quiet {
        return;
    }
    println!("Output exported to {}", outcome.output_path.display());
    if config.verbose {
        eprintln!("  {}", outcome.stats.describe());
    }
}
