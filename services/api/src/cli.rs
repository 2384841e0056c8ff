use crate::demo::{run_demo, run_reconcile, DemoArgs, ReconcileArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use internhub::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "InternHub",
    about = "Run the internship marketplace API or walk through its application lifecycle",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run an end-to-end walkthrough: post, apply, review, interview, notify
    Demo(DemoArgs),
    /// Seed a demo store and print one mirror reconciliation report
    Reconcile(ReconcileArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Reconcile(args) => run_reconcile(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["internhub-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn demo_flags_parse() {
        let cli = Cli::try_parse_from(["internhub-api", "demo", "--applicants", "10", "--force"])
            .expect("parses");
        match cli.command {
            Some(Command::Demo(args)) => {
                assert_eq!(args.applicants, 10);
                assert!(args.force);
                assert_eq!(args.retention, 50);
            }
            other => panic!("expected demo command, got {other:?}"),
        }
    }

    #[test]
    fn serve_overrides_parse() {
        let cli = Cli::try_parse_from(["internhub-api", "serve", "--port", "8088"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8088));
                assert!(args.host.is_none());
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
