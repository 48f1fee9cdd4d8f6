use stderrlog::LogLevelNum;

/// Logging setup arg group.
#[derive(clap::Args, Debug)]
pub struct LogArgs {
    /// Verbosity: 0 silent, 1 errors, 2 warnings, 3 info, 4 debug.
    #[arg(
        short = 'v',
        long = "verbosity",
        value_name = "N",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=4)
    )]
    verbosity: u8,

    /// Silence diagnostics and the progress bar.
    #[clap(short = 'q', long)]
    pub quiet: bool,
}

impl LogArgs {
    /// The verbosity level after the quiet override.
    pub fn effective_verbosity(&self) -> u8 {
        if self.quiet { 0 } else { self.verbosity }
    }

    pub fn setup_logging(&self) -> Result<(), Box<dyn std::error::Error>> {
        let log_level = match self.effective_verbosity() {
            0 => LogLevelNum::Off,
            1 => LogLevelNum::Error,
            2 => LogLevelNum::Warn,
            3 => LogLevelNum::Info,
            _ => LogLevelNum::Debug,
        };

        stderrlog::new()
            .quiet(self.quiet)
            .verbosity(log_level)
            .init()?;

        Ok(())
    }
}
