use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 預設日誌等級 (函式庫與兩個執行檔的 target)
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "tax_prescription=debug,prescription_rules=debug,info"
    } else {
        "tax_prescription=info,prescription_rules=info"
    }
}

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// 終端機用的精簡格式
pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON 格式輸出 (給日誌收集系統)
pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
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
    fn test_default_directive_covers_both_binaries() {
        for verbose in [false, true] {
            let directive = default_directive(verbose);
            assert!(directive.contains("tax_prescription="));
            assert!(directive.contains("prescription_rules="));
            assert!(directive.parse::<EnvFilter>().is_ok());
        }
        assert!(default_directive(false).contains("prescription_rules=info"));
        assert!(default_directive(true).contains("prescription_rules=debug"));
    }
}
