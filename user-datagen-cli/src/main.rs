use std::error::Error;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use log::info;

use user_datagen::fetch::RandomUserClient;
use user_datagen::generator::Generator;

/// Create test data for the user data service
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// The name of the CSV file to write to
    #[clap(short, long, default_value = "user_data.csv")]
    pub(crate) filename: String,

    /// The number of records needed
    #[clap(short, long, default_value_t = 25000)]
    pub(crate) needed: usize,

    /// The number of seconds to sleep between calls to the service
    /// (records are retrieved in batches of up to 5000)
    #[clap(short, long, default_value_t = 45)]
    pub(crate) sleep: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let path = Path::new(&cli.filename);

    info!("Reading existing email addresses from {}...", cli.filename);
    let mut generator = Generator::load(path, cli.needed)?;
    info!(
        "Read {} email addresses from {}",
        generator.count(),
        cli.filename
    );
    info!(
        "Collecting remaining {} records",
        cli.needed.saturating_sub(generator.count())
    );

    let mut source = RandomUserClient::new();
    generator.run(&mut source, path, Duration::from_secs(cli.sleep))?;

    println!("Done... Data saved to {}.", cli.filename);
    Ok(())
}
