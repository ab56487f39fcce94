use crate::cli::CheckArgs;
use crate::error::Result;
use meld_core::core::io::restraint_file::RestraintSet;
use std::collections::BTreeMap;
use tracing::info;

pub fn run(args: CheckArgs) -> Result<()> {
    info!("Loading restraint file from {:?}", &args.file);
    let set = RestraintSet::load(&args.file)?;
    println!("{}", render(&set));
    Ok(())
}

fn kind_counts(set: &RestraintSet) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for restraint in &set.always_active {
        *counts.entry(restraint.kind_name()).or_insert(0) += 1;
    }
    for group in set.collections.iter().flat_map(|c| c.groups()) {
        for restraint in group.restraints() {
            *counts.entry(restraint.kind().as_str()).or_insert(0) += 1;
        }
    }
    counts
}

fn render(set: &RestraintSet) -> String {
    let mut lines = vec![
        format!("Parameters:    {}", set.parameters.len()),
        format!("Always active: {}", set.always_active.len()),
        format!("Collections:   {}", set.collections.len()),
        format!("Groups:        {}", set.group_count()),
        format!("Restraints:    {}", set.restraint_count()),
    ];
    for (kind, count) in kind_counts(set) {
        lines.push(format!("  {:<20} {}", kind, count));
    }
    lines.join("\n")
}
