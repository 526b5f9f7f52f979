pub mod cli;
pub mod settings;

#[cfg(feature = "aws")]
pub mod aws;

#[cfg(feature = "cli")]
pub use self::command::{parse_source, CatalogCommand, CliConfig, Command};

#[cfg(feature = "cli")]
mod command {
    use crate::domain::ports::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::{Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "disaster-data")]
    #[command(about = "Scrape disaster imagery metadata into STAC catalogs")]
    pub struct CliConfig {
        /// Optional TOML settings file
        #[arg(long, global = true)]
        pub settings: Option<String>,

        /// Local output root (catalogs, scrape results, thumbnails)
        #[arg(long, global = true, default_value = "./output")]
        pub output_path: String,

        /// Publish to the configured S3 bucket instead of the local output root
        #[cfg(feature = "aws")]
        #[arg(long, global = true)]
        pub s3: bool,

        /// Maximum number of concurrent network/GDAL calls
        #[arg(long, global = true)]
        pub concurrent_requests: Option<usize>,

        /// Restrict scraping to these event/collection ids
        #[arg(long = "id", global = true)]
        pub ids: Vec<String>,

        /// Also scrape and build items
        #[arg(long, global = true)]
        pub items: bool,

        #[arg(long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit JSON logs")]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: Command,

        #[arg(skip = 8usize)]
        pub resolved_concurrency: usize,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Index NOAA Coast imagery projects as STAC collections
        #[command(name = "index-noaa-collections")]
        IndexNoaaCollections {
            #[arg(long, default_value = "output.json")]
            outfile: String,
        },
        /// Scrape NOAA Storm events (and build items from their archives with --items)
        NoaaStorm {
            #[arg(long, default_value = "noaa-storm.json")]
            outfile: String,
            /// Directory receiving downloaded archives and thumbnails
            #[arg(long, default_value = "./work")]
            workdir: String,
        },
        /// Scrape DigitalGlobe Open Data events into the catalog
        DgOpenData,
        /// Count DigitalGlobe Open Data items per event
        DgSummary {
            #[arg(long, default_value = "json")]
            format: String,
        },
        /// Build OpenAerialMap upload definitions for DigitalGlobe events
        DgOam,
        /// Submit one OpenAerialMap upload definition
        OamUpload {
            #[arg(long, env = "OAM_SESSION")]
            cookie: String,
            #[arg(long)]
            payload: String,
        },
        /// Create or extend the static catalog tree
        #[command(subcommand)]
        Catalog(CatalogCommand),
        /// Queue published items for thumbnail regeneration
        RebuildThumbnails {
            #[arg(long)]
            collection: String,
            /// Only items whose eo:platform matches
            #[arg(long)]
            sensor: Option<String>,
        },
        /// Print the partial STAC item GDAL derives for a raster
        GdalInfo { path: String },
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum CatalogCommand {
        /// Write the root catalog and one catalog per data source
        Init,
        /// Add year catalogs below a data source
        Years {
            #[arg(long)]
            source: String,
            years: Vec<String>,
        },
        /// Add project collections (from index-noaa-collections output) below their year
        Collections {
            #[arg(long)]
            source: String,
            #[arg(long)]
            projects: String,
        },
    }

    impl CliConfig {
        pub fn with_concurrency(mut self, fallback: usize) -> Self {
            self.resolved_concurrency = self.concurrent_requests.unwrap_or(fallback);
            self
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("output_path", &self.output_path)?;
            if let Some(concurrency) = self.concurrent_requests {
                validation::validate_range("concurrent_requests", concurrency, 1, 256)?;
            }
            for id in &self.ids {
                validation::validate_non_empty_string("id", id)?;
            }

            match &self.command {
                Command::IndexNoaaCollections { outfile } => {
                    validation::validate_file_extension("outfile", outfile, &["json"])?;
                }
                Command::NoaaStorm { outfile, workdir } => {
                    validation::validate_file_extension("outfile", outfile, &["json"])?;
                    validation::validate_path("workdir", workdir)?;
                }
                Command::DgSummary { format } => {
                    format.parse::<crate::app::pipelines::SummaryFormat>()?;
                }
                Command::OamUpload { cookie, payload } => {
                    validation::validate_non_empty_string("cookie", cookie)?;
                    validation::validate_file_extension("payload", payload, &["json"])?;
                }
                Command::Catalog(CatalogCommand::Years { source, years }) => {
                    parse_source(source)?;
                    for year in years {
                        validation::validate_range("year", year.parse::<u32>().unwrap_or(0), 1900, 2100)?;
                    }
                }
                Command::Catalog(CatalogCommand::Collections { source, projects }) => {
                    parse_source(source)?;
                    validation::validate_file_extension("projects", projects, &["json"])?;
                }
                Command::RebuildThumbnails { collection, .. } => {
                    validation::validate_non_empty_string("collection", collection)?;
                }
                Command::GdalInfo { path } => validation::validate_path("path", path)?,
                Command::DgOpenData | Command::DgOam | Command::Catalog(CatalogCommand::Init) => {}
            }

            tracing::debug!("✅ CLI configuration validation passed");
            Ok(())
        }
    }

    /// `--source` value as a data source.
    pub fn parse_source(source: &str) -> Result<crate::domain::model::DataSource> {
        source
            .parse()
            .map_err(|reason| crate::utils::error::DisasterDataError::InvalidConfigValueError {
                field: "source".to_string(),
                value: source.to_string(),
                reason,
            })
    }

    impl ConfigProvider for CliConfig {
        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn ids(&self) -> &[String] {
            &self.ids
        }

        fn include_items(&self) -> bool {
            self.items
        }

        fn concurrent_requests(&self) -> usize {
            self.resolved_concurrency
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::domain::model::DataSource;
    use crate::domain::ports::ConfigProvider;
    use crate::utils::validation::Validate;
    use clap::Parser;

    #[test]
    fn test_global_options_after_subcommand() {
        let config = CliConfig::try_parse_from([
            "disaster-data",
            "dg-open-data",
            "--id",
            "hurricane-harvey",
            "--id",
            "hurricane-irma",
            "--items",
            "--concurrent-requests",
            "4",
        ])
        .unwrap()
        .with_concurrency(8);

        assert!(matches!(config.command, Command::DgOpenData));
        assert!(config.include_items());
        assert_eq!(config.concurrent_requests(), 4);
        assert!(config.wants("hurricane-irma"));
        assert!(!config.wants("california-wildfires"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_concurrency_falls_back_to_settings() {
        let config = CliConfig::try_parse_from(["disaster-data", "dg-summary"])
            .unwrap()
            .with_concurrency(8);
        assert_eq!(config.concurrent_requests(), 8);
        assert!(config.wants("anything"));
    }

    #[test]
    fn test_catalog_commands() {
        let config = CliConfig::try_parse_from([
            "disaster-data",
            "catalog",
            "years",
            "--source",
            "NOAACoast",
            "2017",
            "2018",
        ])
        .unwrap();
        match &config.command {
            Command::Catalog(CatalogCommand::Years { source, years }) => {
                assert_eq!(parse_source(source).unwrap(), DataSource::NoaaCoast);
                assert_eq!(years, &vec!["2017".to_string(), "2018".to_string()]);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(config.validate().is_ok());

        let bad_year = CliConfig::try_parse_from([
            "disaster-data", "catalog", "years", "--source", "NOAACoast", "20x8",
        ])
        .unwrap();
        assert!(bad_year.validate().is_err());
    }

    #[test]
    fn test_invalid_options_fail_validation() {
        let bad_format = CliConfig::try_parse_from(["disaster-data", "dg-summary", "--format", "xml"]).unwrap();
        assert!(bad_format.validate().is_err());

        let bad_payload = CliConfig::try_parse_from([
            "disaster-data", "oam-upload", "--cookie", "abc", "--payload", "scene.txt",
        ])
        .unwrap();
        assert!(bad_payload.validate().is_err());

        let bad_source = CliConfig::try_parse_from([
            "disaster-data", "catalog", "collections", "--source", "landsat", "--projects", "output.json",
        ])
        .unwrap();
        assert!(bad_source.validate().is_err());
    }
}
