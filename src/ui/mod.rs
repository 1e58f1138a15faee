pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    error, genome_existing, genome_new, header, info, section, status, success, summary_row,
    timing, warn,
};
pub use progress::Spinner;
pub use table::{
    comparisons_table, genomes_table, run_genome_table, runs_table, stats_table, TableBuilder,
};
pub use theme::{theme, Theme};
