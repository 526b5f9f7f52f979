use clap::Parser;
use disaster_data::config::{parse_source, CatalogCommand, Command};
use disaster_data::core::gdal::partial_item;
use disaster_data::domain::model::{CoastIndex, DataSource};
use disaster_data::domain::ports::{MessageQueue, Storage};
use disaster_data::sources::dg_open_data::{thumbnails, OamUploader};
use disaster_data::sources::file_stem;
use disaster_data::utils::error::ErrorSeverity;
use disaster_data::utils::{logger, validation::Validate};
use disaster_data::{
    CliConfig, DgOpenDataPipeline, DgSummaryPipeline, DisasterDataCatalog, DisasterDataError,
    EtlEngine, FileQueue, LocalStorage, NoaaCoastPipeline, NoaaStormPipeline, OamPipeline,
    Result, ScrapeContext, Settings,
};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting disaster-data CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let settings = match load_settings(&config) {
        Ok(settings) => settings,
        Err(e) => fail_validation(&e),
    };
    let config = config.with_concurrency(settings.http.concurrent_requests);

    if let Err(e) = config.validate() {
        fail_validation(&e);
    }

    match dispatch(config, settings).await {
        Ok(message) => {
            tracing::info!("✅ {}", message);
            if !message.is_empty() {
                println!("✅ {}", message);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn fail_validation(e: &DisasterDataError) -> ! {
    tracing::error!("❌ Configuration validation failed: {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    std::process::exit(1);
}

fn load_settings(config: &CliConfig) -> Result<Settings> {
    let settings = match &config.settings {
        Some(path) => {
            tracing::info!("Loading settings from {}", path);
            Settings::from_file(path)?
        }
        None => Settings::default(),
    };
    settings.validate()?;
    Ok(settings)
}

async fn dispatch(config: CliConfig, settings: Settings) -> Result<String> {
    #[cfg(feature = "aws")]
    if config.s3 {
        let storage = disaster_data::S3Storage::from_settings(&settings.storage).await;
        return run(storage, config, settings).await;
    }

    let storage = LocalStorage::new(config.output_path.clone());
    run(storage, config, settings).await
}

async fn thumbnail_queue(config: &CliConfig, settings: &Settings) -> Result<Box<dyn MessageQueue>> {
    #[cfg(feature = "aws")]
    if config.s3 {
        let queue = disaster_data::SqsQueue::connect(
            &settings.storage.region,
            &settings.queue.thumbnail_queue,
        )
        .await?;
        return Ok(Box::new(queue));
    }

    let path = Path::new(&config.output_path).join(&settings.queue.local_file);
    tracing::info!("Queueing thumbnails into {}", path.display());
    Ok(Box::new(FileQueue::new(path)))
}

async fn run<S: Storage>(storage: S, config: CliConfig, settings: Settings) -> Result<String> {
    let command = config.command.clone();
    match command {
        Command::IndexNoaaCollections { outfile } => {
            let context = ScrapeContext::with_gdal(settings)?;
            let pipeline = NoaaCoastPipeline::new(storage, config, context, outfile);
            let location = EtlEngine::new(pipeline).run().await?;
            Ok(format!("NOAA Coast projects saved to: {}", location))
        }
        Command::NoaaStorm { outfile, workdir } => {
            let context = ScrapeContext::with_gdal(settings)?;
            let pipeline = NoaaStormPipeline::new(storage, config, context, outfile, workdir);
            let location = EtlEngine::new(pipeline).run().await?;
            Ok(format!("NOAA Storm events saved to: {}", location))
        }
        Command::DgOpenData => {
            let context = ScrapeContext::with_gdal(settings)?;
            let pipeline = DgOpenDataPipeline::new(storage, config, context);
            let location = EtlEngine::new(pipeline).run().await?;
            Ok(format!("DigitalGlobe catalog saved to: {}", location))
        }
        Command::DgSummary { format } => {
            let context = ScrapeContext::with_gdal(settings)?;
            let pipeline = DgSummaryPipeline::new(storage, config, context, format.parse()?);
            let location = EtlEngine::new(pipeline).run().await?;
            Ok(format!("DigitalGlobe summary saved to: {}", location))
        }
        Command::DgOam => {
            let context = ScrapeContext::with_gdal(settings)?;
            let pipeline = OamPipeline::new(storage, config, context)?;
            let location = EtlEngine::new(pipeline).run().await?;
            Ok(format!("OpenAerialMap uploads saved to: {}", location))
        }
        Command::OamUpload { cookie, payload } => {
            let context = ScrapeContext::with_gdal(settings)?;
            let body = tokio::fs::read(&payload).await?;
            let uploader = OamUploader::new(
                context.http.inner().clone(),
                context.settings.oam.upload_url.clone(),
            );
            let response = uploader.upload(&cookie, &body).await?;
            Ok(format!("Uploaded {}: {}", payload, response))
        }
        Command::Catalog(catalog_command) => {
            let catalog = DisasterDataCatalog::new(storage);
            run_catalog(&catalog, catalog_command).await
        }
        Command::RebuildThumbnails { collection, sensor } => {
            let context = ScrapeContext::with_gdal(settings)?;
            let queue = thumbnail_queue(&config, &context.settings).await?;
            let queued = thumbnails::rebuild_thumbnails(
                &context.http,
                queue.as_ref(),
                &context.settings.storage.public_root,
                &collection,
                sensor.as_deref(),
            )
            .await?;
            Ok(format!("Queued {} items of {} for new thumbnails", queued, collection))
        }
        Command::GdalInfo { path } => {
            let context = ScrapeContext::with_gdal(settings)?;
            let info = context.inspector.info(&path).await?;
            let item = partial_item(file_stem(&path), &info);
            println!("{}", serde_json::to_string_pretty(&item)?);
            Ok(String::new())
        }
    }
}

async fn run_catalog<S: Storage>(
    catalog: &DisasterDataCatalog<S>,
    command: CatalogCommand,
) -> Result<String> {
    match command {
        CatalogCommand::Init => {
            let root = catalog.create_root_catalog().await?;
            for source in DataSource::all() {
                catalog.create_datasource_catalog(source).await?;
            }
            Ok(format!("Catalog initialised at: {}", catalog.storage().location(&root)))
        }
        CatalogCommand::Years { source, years } => {
            let source = parse_source(&source)?;
            let written = catalog.create_year_catalogs(&years, source).await?;
            Ok(format!("Wrote {} year catalogs below {}", written.len(), source.id()))
        }
        CatalogCommand::Collections { source, projects } => {
            let source = parse_source(&source)?;
            let index: CoastIndex = serde_json::from_slice(&tokio::fs::read(&projects).await?)?;
            let written = catalog
                .create_project_collections(&index.collections, source)
                .await?;
            Ok(format!("Wrote {} collections below {}", written.len(), source.id()))
        }
    }
}
