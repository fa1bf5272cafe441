use std::{env, env::VarError};

/// The scheduler takes no arguments. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "PAS_DATABASE_URL",
        "PAS_DB_MAX_CONNECTIONS",
        "PAS_MATCHING_INTERVAL",
        "PAS_BID_PROCESSING_INTERVAL",
        "PAS_AUCTION_DURATION",
        "PAS_QUALIFICATION_THRESHOLD",
        "PAS_CANDIDATE_PAGE_SIZE",
        "PAS_WATCH_NEW_POSTS",
        "PAS_NEW_POST_POLL_INTERVAL",
        "PAS_MAIN_AGENT_NAME",
        "PAS_OPERATOR_ACCOUNT_ID",
        "PAS_TOKEN_ID",
        "PAS_EVENT_BUFFER_SIZE",
    ];

    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
