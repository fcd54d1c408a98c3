use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "binder")]
#[command(version, about = "Bind web-serial series into EPUB books", long_about = None)]
#[command(after_help = "EXAMPLES:
    binder https://tamil.pratilipi.com/series/nila-kaalam-abc123
    binder -o books --config site.ron URL1 URL2")]
pub struct Cli {
    /// Series landing page URLs
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,

    /// Directory the books are written to
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// RON file overriding site settings and timeouts
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write the log to ./binder.log
    #[arg(long)]
    pub log_file: bool,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Trimmed, non-empty URLs with duplicates removed, first occurrence kept.
    pub fn unique_urls(&self) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        for url in &self.urls {
            let url = url.trim();
            if url.is_empty() || seen.iter().any(|s| same_series(s, url)) {
                continue;
            }
            seen.push(url.to_string());
        }
        seen
    }
}

fn same_series(a: &str, b: &str) -> bool {
    a.trim_end_matches('/').eq_ignore_ascii_case(b.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_flags_and_urls() {
        let cli = Cli::try_parse_from([
            "binder",
            "-v",
            "--log-file",
            "-o",
            "books",
            "https://a.example/series/x",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.log_file);
        assert_eq!(cli.output, Some(PathBuf::from("books")));
        assert_eq!(cli.urls, vec!["https://a.example/series/x".to_string()]);
    }

    #[test]
    fn at_least_one_url_is_required() {
        assert!(Cli::try_parse_from(["binder"]).is_err());
    }

    #[test]
    fn duplicate_urls_are_bound_once() {
        let cli = Cli::try_parse_from([
            "binder",
            "https://a.example/series/x",
            " https://a.example/series/x/ ",
            "https://a.example/series/y",
        ])
        .unwrap();
        assert_eq!(
            cli.unique_urls(),
            vec![
                "https://a.example/series/x".to_string(),
                "https://a.example/series/y".to_string(),
            ]
        );
    }
}
