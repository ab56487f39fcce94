pub mod check;
pub mod dry_run;
