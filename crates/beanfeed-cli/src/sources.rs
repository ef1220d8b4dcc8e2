use beanfeed_core::{AppConfig, SourcesFile, Vocabulary};

/// Loads the configured sources, failing on any validation error.
pub(crate) fn load_sources(config: &AppConfig) -> anyhow::Result<SourcesFile> {
    let sources = beanfeed_core::load_sources(&config.sources_path)?;
    tracing::debug!(
        path = %config.sources_path.display(),
        count = sources.sources.len(),
        "sources loaded"
    );
    Ok(sources)
}

/// Loads the vocabulary override, or the built-in lists when none is set.
pub(crate) fn load_vocabulary(config: &AppConfig) -> anyhow::Result<Vocabulary> {
    match &config.vocabulary_path {
        Some(path) => Ok(beanfeed_core::load_vocabulary(path)?),
        None => Ok(Vocabulary::default()),
    }
}

pub(crate) fn run_sources(config: &AppConfig) -> anyhow::Result<()> {
    let file = load_sources(config)?;
    let collections: usize = file.sources.iter().map(|s| s.collections.len()).sum();

    println!(
        "{} sources, {collections} collections ({})",
        file.sources.len(),
        config.sources_path.display()
    );
    for source in &file.sources {
        println!("{}", source.name);
        for url in &source.collections {
            println!("  {url}");
        }
        if let Some(notes) = &source.notes {
            println!("  # {notes}");
        }
    }
    Ok(())
}
