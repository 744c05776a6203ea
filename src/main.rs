mod commands;
mod config;
mod logging;

use clap::Parser;
use commands::{Command, Outcome};
use std::path::PathBuf;
use std::process::ExitCode;
use x_api_client::{ApiClient, ReqwestTransport};

/// xcli - A minimal command-line client for the X API
#[derive(Parser, Debug)]
#[command(name = "xcli", version, about, long_about = None, arg_required_else_help = true)]
struct Args {
    /// Path to the token file (default: auth_tokens.json, or $XCLI_TOKEN_FILE)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    /// Path to a JSON file with consumer_key and consumer_secret
    /// (default: $XCLI_CONSUMER_KEY and $XCLI_CONSUMER_SECRET)
    #[arg(long, global = true)]
    credentials_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    logging::init_tracing("info");

    let config = config::resolve(
        |name| std::env::var(name).ok(),
        args.token_file,
        args.credentials_file.as_deref(),
    )?;

    let transport = ReqwestTransport::new()?;
    let mut client = ApiClient::new(config, transport);

    let is_auth = args.command == Command::Auth;
    match commands::run(args.command, &mut client).await {
        Ok(Outcome::Authenticated) => println!("Authentication successful."),
        Ok(Outcome::Response(body)) => println!("{}", body),
        Err(e) if is_auth => {
            eprintln!("Authentication failed: {}", e);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_no_subcommand_prints_usage() {
        let err = Args::try_parse_from(["xcli"]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_unknown_command() {
        let err = Args::try_parse_from(["xcli", "tweet"]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_positionals() {
        let err = Args::try_parse_from(["xcli", "get"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);

        let err = Args::try_parse_from(["xcli", "space"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_get_collects_params() {
        let args = Args::try_parse_from(["xcli", "get", "/2/x", "k=v", "plain"]).unwrap();

        assert_eq!(
            args.command,
            Command::Get {
                endpoint: "/2/x".to_string(),
                params: vec!["k=v".to_string(), "plain".to_string()],
            }
        );
        if let Command::Get { params, .. } = args.command {
            let params = commands::parse_params(&params);
            assert_eq!(params.len(), 1);
            assert_eq!(params["k"], "v");
        }
    }

    #[test]
    fn test_global_flags_after_get_params() {
        let args =
            Args::try_parse_from(["xcli", "get", "/2/x", "a=1", "--token-file", "t.json"])
                .unwrap();
        assert_eq!(args.token_file, Some(PathBuf::from("t.json")));
        assert_eq!(
            args.command,
            Command::Get {
                endpoint: "/2/x".to_string(),
                params: vec!["a=1".to_string()],
            }
        );

        let args = Args::try_parse_from([
            "xcli",
            "get",
            "/2/x",
            "a=1",
            "--token-file=t.json",
            "--credentials-file",
            "creds.json",
        ])
        .unwrap();
        assert_eq!(args.token_file, Some(PathBuf::from("t.json")));
        assert_eq!(args.credentials_file, Some(PathBuf::from("creds.json")));
        if let Command::Get { params, .. } = args.command {
            assert_eq!(params, vec!["a=1".to_string()]);
        }
    }

    #[test]
    fn test_global_flag_before_subcommand() {
        let args = Args::try_parse_from(["xcli", "--token-file", "t.json", "space", "42"]).unwrap();

        assert_eq!(args.token_file, Some(PathBuf::from("t.json")));
        assert_eq!(
            args.command,
            Command::Space {
                space_id: "42".to_string()
            }
        );
    }

    #[test]
    fn test_stray_flag_is_rejected() {
        let err = Args::try_parse_from(["xcli", "get", "/2/x", "a=1", "--verbose"]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_eq!(err.exit_code(), 2);
    }
}
