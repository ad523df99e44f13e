// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::{Parser, Subcommand};
use graffiti_cli::commands::{history, keygen, post, react, watch};
use graffiti_cli::ConnectArgs;
use graffiti_kernel::MessageId;

#[derive(Parser)]
#[command(name = "graffiti")]
#[command(about = "Threaded comments on shared-writer feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new signing identity
    Keygen,
    /// Follow a topic and print comments and reactions as they arrive
    Watch {
        #[command(flatten)]
        connect: ConnectArgs,
    },
    /// Post a comment, or a reply with --thread
    Post {
        #[command(flatten)]
        connect: ConnectArgs,

        #[arg(long, short)]
        body: String,

        /// Id of the message to reply to
        #[arg(long)]
        thread: Option<String>,
    },
    /// Toggle a reaction on a message
    React {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Id of the message to react to
        #[arg(long)]
        target: String,

        #[arg(long, short)]
        emoji: String,
    },
    /// Print the newest comments, plus older pages on request
    History {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Additional pages to load below the newest one
        #[arg(long, default_value_t = 0)]
        pages: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    graffiti_node::telemetry::init_logging("graffiti_node=warn,graffiti_cli=info");

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen => keygen::run().map(|_| ()),
        Commands::Watch { connect } => watch::run(connect.into_config()?).await,
        Commands::Post { connect, body, thread } => {
            post::run(connect.into_config()?, body, thread.map(MessageId)).await.map(|_| ())
        }
        Commands::React { connect, target, emoji } => {
            react::run(connect.into_config()?, MessageId(target), emoji).await.map(|_| ())
        }
        Commands::History { connect, pages } => {
            history::run(connect.into_config()?, pages).await.map(|_| ())
        }
    }
}
