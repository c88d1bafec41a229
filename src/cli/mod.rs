//! CLI argument parsing using clap 4.x derive macros

use clap::{Parser, Subcommand};
use folio_core::llm::Provider;
use std::path::PathBuf;

/// Portfolio chat assistant
///
/// Answers visitor questions in the site owner's voice using Gemini, with
/// template replies when the model is unavailable.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (defaults to ./folio.toml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile TOML overriding `profile_path`
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// Print version information
    #[arg(long)]
    pub version: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP chat endpoint
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Interactive chat in the terminal
    Chat {
        #[command(flatten)]
        backend: BackendArgs,

        /// Start with the chat window collapsed
        #[arg(long)]
        collapsed: bool,
    },

    /// Ask a single question and print the reply
    Ask {
        /// The question
        #[arg(num_args = 1.., required = true)]
        question: Vec<String>,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Print the offline template reply for a question
    Template {
        #[arg(num_args = 1.., required = true)]
        question: Vec<String>,
    },

    /// Show the loaded profile
    Profile {
        /// Print the system prompt sent to the model instead
        #[arg(long)]
        prompt: bool,
    },

    /// Write a config file with every default filled in
    Init {
        /// Destination (defaults to the user config dir)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct BackendArgs {
    /// Backend answering chat turns (gemini or endpoint)
    #[arg(long)]
    pub provider: Option<Provider>,

    /// Chat endpoint URL for the `endpoint` provider
    #[arg(long)]
    pub endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["folio", "ask", "what", "do", "you", "build?", "--provider", "endpoint"]);
        match cli.command {
            Some(Commands::Ask { question, backend }) => {
                assert_eq!(question.join(" "), "what do you build?");
                assert_eq!(backend.provider, Some(Provider::Endpoint));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["folio", "serve", "--port", "8080", "-c", "custom.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Serve {
                port: Some(8080),
                host: None
            })
        ));
    }
}
