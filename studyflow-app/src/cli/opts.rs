use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum)]
pub enum StoreKind {
    Json,
    Sqlite,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "studyflow", version, about = "StudyFlow flashcards, quizzes and tutor CLI/API")]
pub struct Cli {
    /// Storage backend
    #[arg(long, value_enum, env = "STUDYFLOW_STORE", default_value_t = StoreKind::Json)]
    pub store: StoreKind,

    /// Data directory (defaults to the platform app data dir)
    #[arg(long, env = "STUDYFLOW_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// SQLite DB path when --store sqlite (defaults to the data dir)
    #[arg(long, env = "STUDYFLOW_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Remote tutor backend; the local question bank is used when unset
    #[arg(long, env = "STUDYFLOW_TUTOR_URL")]
    pub tutor_url: Option<String>,

    /// Request timeout for the remote tutor, in seconds
    #[arg(long, env = "STUDYFLOW_TUTOR_TIMEOUT_SECS", default_value_t = 20)]
    pub tutor_timeout_secs: u64,

    /// Question bank JSON for the local tutor
    #[arg(long, env = "STUDYFLOW_QUESTION_BANK")]
    pub question_bank: Option<PathBuf>,

    /// Log filter, e.g. `info` or `studyflow_app=debug`
    #[arg(long, env = "STUDYFLOW_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Deck operations
    #[command(subcommand)]
    Deck(DeckCmd),
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// Interactive study session over a deck
    Study(StudyCmd),
    /// Review and session statistics
    Stats(StatsCmd),
    /// Export data
    #[command(subcommand)]
    Export(ExportCmd),
    /// Import data
    #[command(subcommand)]
    Import(ImportCmd),
    /// Ask the tutor for lecture context on a question
    Ask(AskCmd),
    /// Practice quizzes from the tutor
    #[command(subcommand)]
    Quiz(QuizCmd),
    /// Launch Axum HTTP API
    Serve(ServeCmd),
}

#[derive(Debug, Subcommand, Clone)]
pub enum DeckCmd {
    Add {
        name: String,
        #[arg(long)]
        subject: Option<String>,
    },
    List,
    Rm {
        deck: String,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    List {
        #[arg(long)]
        deck: Option<String>,
    },
    Rm {
        card_id: String,
    },
    Edit(CardEdit),
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub deck: String,
    #[arg(long)]
    pub front: String,
    #[arg(long)]
    pub back: String,
    #[arg(long)]
    pub hint: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CardEdit {
    pub card_id: String,
    #[arg(long)]
    pub front: Option<String>,
    #[arg(long)]
    pub back: Option<String>,
    #[arg(long)]
    pub hint: Option<String>,
    #[arg(long)]
    pub clear_hint: bool,
    #[arg(long = "add-tag")]
    pub add_tags: Vec<String>,
    #[arg(long = "rm-tag")]
    pub rm_tags: Vec<String>,
    #[arg(long, conflicts_with = "unsuspend")]
    pub suspend: bool,
    #[arg(long)]
    pub unsuspend: bool,
}

#[derive(Debug, Args, Clone)]
pub struct StudyCmd {
    #[arg(long)]
    pub deck: String,
    /// Only study cards carrying this tag
    #[arg(long)]
    pub tag: Option<String>,
    #[arg(long, default_value_t = 50)]
    pub max: usize,
}

#[derive(Debug, Args, Clone)]
pub struct StatsCmd {
    #[arg(long)]
    pub deck: Option<String>,
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExportCmd {
    Json {
        path: PathBuf,
    },
    Csv {
        path: PathBuf,
        #[arg(long)]
        deck: Option<String>,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImportCmd {
    Json {
        path: PathBuf,
    },
    Csv {
        path: PathBuf,
        #[arg(long)]
        deck: Option<String>,
    },
}

#[derive(Debug, Args, Clone)]
pub struct AskCmd {
    pub question: String,
    #[arg(long)]
    pub subject: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum QuizCmd {
    /// Draw a practice quiz for a topic
    Generate {
        #[arg(long)]
        topic: String,
        #[arg(long, default_value = "Medium")]
        difficulty: String,
        #[arg(long, default_value_t = studyflow_core::DEFAULT_QUIZ_SIZE)]
        count: usize,
    },
    /// Feedback for a JSON file of `{question_id, topic, is_correct}` results
    Analyze { path: PathBuf },
}

#[derive(Debug, Args, Clone)]
pub struct ServeCmd {
    /// Bind address (host:port)
    #[arg(long, env = "STUDYFLOW_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: String,
}
