use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Page through a query's results and print every record as a JSON line
    Read {
        #[arg(long, help = "Reader settings file (JSON)")]
        settings: String,

        #[arg(
            long,
            help = "Result fixture served by the in-memory query service (JSON)"
        )]
        fixture: String,

        #[arg(long, help = "Override the page size from the settings file")]
        page_size: Option<usize>,
    },
    /// Load and validate a reader settings file
    Validate {
        #[arg(long, help = "Reader settings file (JSON)")]
        settings: String,
    },
}
