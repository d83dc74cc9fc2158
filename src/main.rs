use clap::Parser;
use hapi_etl::utils::{logger, validation::Validate};
use hapi_etl::{
    CollectingErrorSink, EtlEngine, HapiPipeline, HdxCountryLookup, LocalStorage, Retriever,
    TomlConfig,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hapi-etl")]
#[command(about = "Reshapes UNHCR refugee and returnee statistics into HDX HAPI CSV resources")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "hapi-etl.toml")]
    config: String,

    /// Override the configured output directory
    #[arg(long)]
    output_path: Option<String>,

    /// Directory for saved source files
    #[arg(long, default_value = "saved_data")]
    saved_dir: String,

    /// Save downloaded files for later offline runs
    #[arg(long)]
    save: bool,

    /// Use previously saved files instead of downloading
    #[arg(long)]
    use_saved: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log CPU/memory usage per phase
    #[arg(long)]
    monitor: bool,

    /// Show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting hapi-etl");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Some(output_path) = args.output_path {
        config.load.output_path = output_path;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated");
    tracing::info!(
        "Source: dataset '{}', resource '{}' on {}",
        config.source.dataset,
        config.source.resource,
        config.source.base_url
    );

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        for data_type in hapi_etl::core::DataType::ALL {
            let dataset = config.datasets.get(data_type);
            let resource = config.resources.get(data_type);
            tracing::info!(
                "{}: dataset '{}' -> {}",
                data_type,
                dataset.name,
                resource.filename
            );
        }
        return Ok(());
    }

    if args.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.source.timeout_seconds.unwrap_or(300)))
        .build()?;
    let retriever = Retriever::new(
        client,
        &args.saved_dir,
        std::env::temp_dir().join("hapi-etl"),
        args.save,
        args.use_saved,
    );

    let lookup = match HdxCountryLookup::load(&retriever, &config.countries.url).await {
        Ok(lookup) => lookup,
        Err(e) => {
            tracing::error!("❌ Could not load country classification data: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    tracing::info!("Loaded classification flags for {} countries", lookup.len());

    let errors = Arc::new(CollectingErrorSink::new());
    let storage = LocalStorage::new(config.output_path().to_string());
    let output_path = config.output_path().to_string();
    let pipeline = HapiPipeline::new(storage, config, retriever, lookup, errors.clone());

    let engine = EtlEngine::new_with_monitoring(pipeline, args.monitor);

    let result = engine.run().await;
    errors.flush();

    match result {
        Ok(outputs) => {
            tracing::info!("✅ ETL process completed successfully!");
            println!("✅ ETL process completed successfully!");
            for output in outputs {
                println!("📁 {}/{}", output_path, output);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ ETL process failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    }
}
