use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// HTML parsing and HTTP plumbing log every token and connection at debug.
const QUIET_DEPENDENCIES: &[&str] = &[
    "html5ever=warn",
    "selectors=warn",
    "hyper=warn",
    "hyper_util=warn",
    "h2=warn",
    "aws_smithy_runtime=warn",
    "aws_config=warn",
];

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> String {
    let mut directives = vec![if verbose {
        "disaster_data=debug,info"
    } else {
        "disaster_data=info,warn"
    }];
    directives.extend_from_slice(QUIET_DEPENDENCIES);
    directives.join(",")
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON output for batch runs whose logs are shipped to CloudWatch.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet_parsers() {
        let verbose = default_directives(true);
        assert!(verbose.starts_with("disaster_data=debug,"));
        assert!(verbose.contains("html5ever=warn"));
        assert!(verbose.contains("selectors=warn"));
        assert!(verbose.contains("hyper=warn"));

        let quiet = default_directives(false);
        assert!(quiet.starts_with("disaster_data=info,"));

        assert!(EnvFilter::try_new(&verbose).is_ok());
        assert!(EnvFilter::try_new(&quiet).is_ok());
    }
}
