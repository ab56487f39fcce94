use crate::cli::DryRunArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use meld_core::core::io::restraint_file::RestraintSet;
use meld_core::core::restraints::kinds::RestraintKind;
use meld_core::engine::config::{DryRunConfig, DryRunConfigBuilder};
use meld_core::engine::progress::ProgressReporter;
use meld_core::workflows::dry_run::{self, DryRunReport};
use tracing::info;

pub fn run(args: DryRunArgs) -> Result<()> {
    let config = build_config(&args)?;

    info!("Loading restraint file from {:?}", &args.file);
    let set = RestraintSet::load(&args.file)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Replaying {} step(s)...", config.steps);
    let report = dry_run::run(set, &config, &reporter)?;
    println!("{}", render(&report));
    Ok(())
}

fn build_config(args: &DryRunArgs) -> Result<DryRunConfig> {
    Ok(DryRunConfigBuilder::new()
        .steps(args.steps)
        .alpha_start(args.alpha_start)
        .alpha_end(args.alpha_end)
        .timestep_stride(args.stride)
        .build()?)
}

fn render(report: &DryRunReport) -> String {
    let summary = &report.summary;
    let mut lines = vec![format!("Registered restraints: {}", summary.total_restraints())];
    for kind in RestraintKind::ALL {
        let count = summary.restraints_of(kind);
        if count > 0 {
            lines.push(format!("  {:<20} {}", kind.as_str(), count));
        }
    }
    lines.push(format!(
        "Groups:      {} tracked, {} fixed",
        summary.tracked_groups, summary.fixed_groups
    ));
    lines.push(format!(
        "Collections: {} tracked, {} fixed",
        summary.tracked_collections, summary.fixed_collections
    ));
    if report.unclaimed > 0 {
        lines.push(format!("Unclaimed restraints: {}", report.unclaimed));
    }
    lines.push(format!(
        "Steps: {}  restraint updates: {}  group updates: {}  collection updates: {}",
        report.steps,
        report.counts.total_restraint_updates(),
        report.counts.group_updates,
        report.counts.collection_updates
    ));
    lines.push(format!("Final group num_active:      {:?}", report.group_num_active));
    lines.push(format!("Final collection num_active: {:?}", report.collection_num_active));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use meld_core::engine::config::ConfigError;
    use std::io::Write;
    use std::path::PathBuf;

    const FILE: &str = r#"
[[parameters]]
type = "discrete"
name = "n"
initial = 1
min = 0
max = 2

[[collections]]
num-active = 1

[[collections.groups]]
num-active = { parameter = "n" }

[[collections.groups.restraints]]
type = "torsion"
atoms = [0, 1, 2, 3]
phi = 60.0
delta-phi = 20.0
k = 5.0

[[collections.groups.restraints]]
type = "torsion"
atoms = [1, 2, 3, 4]
phi = -60.0
delta-phi = 20.0
k = 5.0
"#;

    fn args(file: PathBuf, steps: u64) -> DryRunArgs {
        DryRunArgs {
            file,
            steps,
            alpha_start: 0.0,
            alpha_end: 1.0,
            stride: 2,
        }
    }

    #[test]
    fn build_config_rejects_alpha_outside_unit_interval() {
        let mut bad = args(PathBuf::from("unused.toml"), 1);
        bad.alpha_end = 1.5;
        assert!(matches!(
            build_config(&bad),
            Err(CliError::Config(ConfigError::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn build_config_rejects_overflowing_stride() {
        let mut bad = args(PathBuf::from("unused.toml"), 4);
        bad.stride = u64::MAX;
        assert!(matches!(
            build_config(&bad),
            Err(CliError::Config(ConfigError::InvalidParameter {
                name: "timestep_stride",
                ..
            }))
        ));
    }

    #[test]
    fn render_reports_registered_entities() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FILE.as_bytes()).unwrap();
        let set = RestraintSet::load(file.path()).unwrap();
        let config = build_config(&args(file.path().to_path_buf(), 3)).unwrap();

        let report = dry_run::run(set, &config, &ProgressReporter::new()).unwrap();
        let text = render(&report);

        assert!(text.contains("Registered restraints: 2"));
        assert!(text.contains("torsion"));
        assert!(text.contains("Groups:      1 tracked, 0 fixed"));
        assert!(text.contains("Collections: 1 tracked, 0 fixed"));
        assert!(text.contains("restraint updates: 6"));
        assert!(!text.contains("Unclaimed"));
    }

    #[test]
    fn run_succeeds_on_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FILE.as_bytes()).unwrap();
        assert!(run(args(file.path().to_path_buf(), 2)).is_ok());
    }
}
