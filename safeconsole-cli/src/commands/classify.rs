//! Classify command - show how calls would be counted.

use anyhow::Result;
use clap::Args;
use safeconsole_core::CallClassifier;

use super::request::HttpMethod;
use crate::context::load_settings;
use crate::output::{ClassifyOutput, JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// URLs to classify, exactly as a caller would pass them.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// HTTP method of the calls.
    #[arg(long, short = 'X', default_value = "get")]
    pub method: HttpMethod,
}

/// Runs the classify command.
pub async fn run(args: &ClassifyArgs, cli: &Cli) -> Result<()> {
    let settings = load_settings(cli).await.get().await;
    let classifier = CallClassifier::new(&settings.classifier_config());
    let method = reqwest::Method::from(args.method);

    let results = classify_all(&classifier, method.as_str(), &args.urls);

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_classifications(&results));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&results)?);
        }
    }

    Ok(())
}

fn classify_all(classifier: &CallClassifier, method: &str, urls: &[String]) -> Vec<ClassifyOutput> {
    urls.iter()
        .map(|url| {
            let (classification, error) = match classifier.classify(method, url) {
                Ok(class) => (Some(class), None),
                Err(e) => (None, Some(e.to_string())),
            };
            ClassifyOutput {
                method: method.to_string(),
                url: url.clone(),
                classification,
                error,
            }
        })
        .collect()
}
