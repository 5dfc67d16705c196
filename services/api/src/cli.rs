use crate::demo::{run_demo, run_report, DemoArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use volley_eval::config::ServerConfig;
use volley_eval::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Volleyball Evaluation Engine",
    about = "Run and demonstrate the player evaluation scoring service",
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
    /// Score a plan offline from a CSV export and print the results
    Report(ReportArgs),
    /// Walk a sample tryout from registration to badges
    Demo(DemoArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Serve(ServeArgs::default())
    }
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

impl ServeArgs {
    /// Flags win over the environment.
    pub(crate) fn apply(self, server: &mut ServerConfig) {
        if let Some(host) = self.host {
            server.host = host;
        }
        if let Some(port) = self.port {
            server.port = port;
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    match Cli::parse().command.unwrap_or_default() {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_flags_override_configured_binding() {
        let cli = Cli::try_parse_from(["volley-eval-api", "serve", "--port", "8181"])
            .expect("serve flags parse");
        let mut server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        match cli.command {
            Some(Command::Serve(args)) => args.apply(&mut server),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 8181);
    }

    #[test]
    fn report_rejects_player_with_all_players() {
        let parsed = Cli::try_parse_from([
            "volley-eval-api",
            "report",
            "--plan",
            "plan.json",
            "--player",
            "p-01",
            "--all-players",
        ]);
        assert!(parsed.is_err());
    }
}
