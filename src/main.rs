use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use movie_recs::{
    config::Config,
    models::MovieId,
    services::{metadata_loader, EmbeddingFormat, Recommender, WordVectors},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "movie-recs", about = "Recommend movies similar to a given movie")]
struct Cli {
    /// Movie to find similar titles for
    #[arg(long, conflicts_with = "title", required_unless_present = "title")]
    movie_id: Option<MovieId>,

    /// Look the movie up by title instead of id
    #[arg(long)]
    title: Option<String>,

    /// Number of recommendations (overrides TOP_N)
    #[arg(long)]
    top_n: Option<usize>,

    /// Movies table (overrides MOVIES_PATH)
    #[arg(long)]
    movies: Option<PathBuf>,

    /// Tags table (overrides TAGS_PATH)
    #[arg(long)]
    tags: Option<PathBuf>,

    /// Pretrained word vectors (overrides EMBEDDINGS_PATH)
    #[arg(long)]
    embeddings: Option<PathBuf>,

    /// Word vector file layout (overrides EMBEDDINGS_FORMAT)
    #[arg(long, value_enum)]
    embeddings_format: Option<EmbeddingFormat>,

    /// Load at most this many words (overrides EMBEDDINGS_LIMIT)
    #[arg(long)]
    embeddings_limit: Option<usize>,

    /// Print recommendations as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(path) = &self.movies {
            config.movies_path = path.clone();
        }
        if let Some(path) = &self.tags {
            config.tags_path = path.clone();
        }
        if let Some(path) = &self.embeddings {
            config.embeddings_path = path.clone();
        }
        if let Some(format) = self.embeddings_format {
            config.embeddings_format = format;
        }
        if self.embeddings_limit.is_some() {
            config.embeddings_limit = self.embeddings_limit;
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.apply(Config::from_env()?);

    let movies = metadata_loader::load_movies_from_path(&config.movies_path, &config.tags_path)
        .with_context(|| {
            format!(
                "Failed to load movies from {} and {}",
                config.movies_path.display(),
                config.tags_path.display()
            )
        })?;

    let embeddings = WordVectors::load(
        &config.embeddings_path,
        config.embeddings_format,
        config.embeddings_limit,
    )
    .with_context(|| {
        format!(
            "Failed to load embeddings from {}",
            config.embeddings_path.display()
        )
    })?;

    let recommender = Recommender::build(movies, &embeddings)?;

    let movie_id = match (cli.movie_id, cli.title.as_deref()) {
        (Some(id), _) => id,
        (None, Some(title)) => recommender.find_by_title(title)?,
        (None, None) => anyhow::bail!("Either --movie-id or --title is required"),
    };

    let recommendations = recommender.recommend(movie_id, config.top_n)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
        return Ok(());
    }

    if let Some(movie) = recommender.movie(movie_id) {
        println!("Movies similar to {} ({}):", movie.title, movie.movie_id);
    }
    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "{:>3}. {} ({})  {:.3}",
            rank + 1,
            rec.title,
            rec.movie_id,
            rec.score
        );
    }

    Ok(())
}
