//! Command implementations for the shardstat CLI.

use std::time::Instant;

use log::info;

use crate::analyzer::NodeAnalyzer;
use crate::cli::args::ShardStatArgs;
use crate::cli::output::output_report;
use crate::error::{Result, ShardStatError};
use crate::report::NodeReport;

/// Execute a CLI invocation.
pub fn execute_command(args: &ShardStatArgs) -> Result<()> {
    let report = run_analysis(args)?;
    output_report(&report, args)
}

/// Run the analysis selected by the arguments.
pub fn run_analysis(args: &ShardStatArgs) -> Result<NodeReport> {
    let config = args.analysis_config()?;
    let analyzer = NodeAnalyzer::new(config);
    let start = Instant::now();

    let report = match (&args.index_directory, &args.segment_store) {
        (_, Some(segment_store)) => analyzer.analyze_segment_store(segment_store)?,
        (Some(state_dir), None) => analyzer.analyze(state_dir)?,
        (None, None) => {
            return Err(ShardStatError::input_shape(
                "either --index-directory or --segment-store is required",
            ));
        }
    };

    info!(
        "Analyzed {} groups in {} ms",
        report.groups.len(),
        start.elapsed().as_millis()
    );
    Ok(report)
}

/// A short suggestion printed after a fatal error, when one applies.
pub fn error_hint(error: &ShardStatError) -> Option<&'static str> {
    match error {
        ShardStatError::InputShape(_) => Some(
            "pass the node's state directory, e.g. -d /var/lib/search/nodes/0/_state, \
             or a segment store with --segment-store",
        ),
        ShardStatError::EmptyResult(_) => {
            Some("the state directory holds no index metadata; run with -v to see what was read")
        }
        ShardStatError::Config(_) => Some("check the configuration file and the sampling flags"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_run_analysis_rejects_bad_state_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nodes");
        let args =
            ShardStatArgs::try_parse_from(["shardstat", "-d", path.to_str().unwrap()]).unwrap();

        let err = run_analysis(&args).unwrap_err();
        assert!(err.is_fatal());
        assert!(error_hint(&err).is_some());
    }

    #[test]
    fn test_error_hint() {
        assert!(error_hint(&ShardStatError::empty_result("none")).is_some());
        assert!(error_hint(&ShardStatError::segment("bad")).is_none());
    }
}
