use tracing_subscriber::EnvFilter;

/// Picks the default filter for the CLI verbosity flags.
///
/// `--quiet` wins over `--verbose`; warnings and errors always get through.
pub fn default_directive(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "img_budget=warn"
    } else if verbose {
        "img_budget=debug"
    } else {
        "img_budget=info"
    }
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` overrides the flags when set. Calling this twice is harmless:
/// the second subscriber is simply not installed.
pub fn init(quiet: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(quiet, verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "img_budget=info");
        assert_eq!(default_directive(false, true), "img_budget=debug");
        assert_eq!(default_directive(true, true), "img_budget=warn");
    }

    #[test]
    fn test_init_twice() {
        init(true, false);
        init(false, true);
    }
}
