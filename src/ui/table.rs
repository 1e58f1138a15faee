use crate::comparison::Comparison;
use crate::genome::Genome;
use crate::run::{Run, RunGenomeRow};
use crate::storage::DbStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Genomes", &stats.genomes.to_string());
    builder.add_row("Runs", &stats.runs.to_string());
    builder.add_row("Run/genome links", &stats.run_genomes.to_string());
    builder.add_row("Comparisons", &stats.comparisons.to_string());
    builder.build()
}

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "run ID")]
    run_id: i64,
    method: String,
    #[tabled(rename = "date run")]
    date: String,
    status: String,
    #[tabled(rename = "command-line")]
    cmdline: String,
}

#[derive(Tabled)]
struct GenomeRow {
    #[tabled(rename = "genome ID")]
    genome_id: i64,
    description: String,
    path: String,
    hash: String,
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "run ID")]
    run_id: i64,
    method: String,
    #[tabled(rename = "date run")]
    date: String,
    #[tabled(rename = "genome ID")]
    genome_id: i64,
    description: String,
    path: String,
    hash: String,
}

#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "query ID")]
    query_id: i64,
    #[tabled(rename = "subject ID")]
    subject_id: i64,
    #[tabled(rename = "aligned length")]
    aligned_length: String,
    mismatches: String,
    identity: String,
    coverage: String,
    program: String,
    version: String,
    fragsize: String,
    maxmatch: String,
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn runs_table(runs: &[Run]) -> String {
    render(
        runs.iter()
            .map(|r| RunRow {
                run_id: r.run_id,
                method: r.method.clone(),
                date: r.date.clone(),
                status: r.status.clone(),
                cmdline: r.cmdline.clone(),
            })
            .collect(),
    )
}

pub fn genomes_table(genomes: &[Genome]) -> String {
    render(
        genomes
            .iter()
            .map(|g| GenomeRow {
                genome_id: g.genome_id,
                description: g.description.clone(),
                path: g.path.clone(),
                hash: g.short_hash().to_string(),
            })
            .collect(),
    )
}

pub fn run_genome_table(rows: &[RunGenomeRow]) -> String {
    render(
        rows.iter()
            .map(|r| LinkRow {
                run_id: r.run_id,
                method: r.method.clone(),
                date: r.date.clone(),
                genome_id: r.genome_id,
                description: r.description.clone(),
                path: r.path.clone(),
                hash: r.hash.chars().take(12).collect(),
            })
            .collect(),
    )
}

pub fn comparisons_table(comparisons: &[Comparison]) -> String {
    render(
        comparisons
            .iter()
            .map(|c| ComparisonRow {
                query_id: c.key.query_id,
                subject_id: c.key.subject_id,
                aligned_length: format!("{:.0}", c.stats.aligned_length),
                mismatches: format!("{:.0}", c.stats.mismatches),
                identity: format!("{:.4}", c.stats.identity),
                coverage: format!("{:.4}", c.stats.coverage),
                program: c.key.program.clone(),
                version: c.key.version.clone(),
                fragsize: c.key.fragsize.to_string(),
                maxmatch: c.key.maxmatch.to_string(),
            })
            .collect(),
    )
}
