use beanfeed_core::AppConfig;
use beanfeed_scraper::extract::{clean_title, parse_weight_grams};
use beanfeed_scraper::{Extractor, ProductText};

use crate::sources::load_vocabulary;

#[derive(Debug)]
pub(crate) struct ExtractArgs {
    pub title: String,
    pub tags: Vec<String>,
    pub body: Option<String>,
    pub variant: Option<String>,
}

pub(crate) fn run_extract(config: &AppConfig, args: &ExtractArgs) -> anyhow::Result<()> {
    let extractor = Extractor::new(load_vocabulary(config)?);
    for line in describe(&extractor, args) {
        println!("{line}");
    }
    Ok(())
}

fn describe(extractor: &Extractor, args: &ExtractArgs) -> Vec<String> {
    let attrs = extractor.extract(&ProductText {
        title: &args.title,
        tags: &args.tags,
        body_html: args.body.as_deref(),
    });
    let weight = args
        .variant
        .as_deref()
        .and_then(parse_weight_grams)
        .or_else(|| parse_weight_grams(&args.title));

    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    vec![
        format!("name:          {}", clean_title(&args.title)),
        format!("roast level:   {}", or_dash(attrs.roast_level.map(|r| r.to_string()))),
        format!("process:       {}", or_dash(attrs.process)),
        format!("origin:        {}", or_dash(attrs.origin)),
        format!("weight (g):    {}", or_dash(weight.map(|w| w.to_string()))),
        format!(
            "tasting notes: {}",
            if attrs.tasting_notes.is_empty() {
                "-".to_string()
            } else {
                attrs.tasting_notes.join(", ")
            }
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_reports_every_field() {
        let args = ExtractArgs {
            title: "Monsoon Malabar (Whole Bean)".to_string(),
            tags: vec!["dark roast".to_string()],
            body: Some("<p>Notes of cocoa</p>".to_string()),
            variant: Some("1kg".to_string()),
        };
        let lines = describe(&Extractor::default(), &args);

        assert_eq!(lines[0], "name:          Monsoon Malabar");
        assert_eq!(lines[1], "roast level:   Dark");
        assert_eq!(lines[2], "process:       -");
        assert_eq!(lines[4], "weight (g):    1000");
        assert_eq!(lines[5], "tasting notes: cocoa");
    }
}
