use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "CANTEEN_HOST",
        "CANTEEN_PORT",
        "CANTEEN_DATABASE_URL",
        "CANTEEN_RAZORPAY_KEY_ID",
        "CANTEEN_RAZORPAY_API_URL",
        "CANTEEN_RAZORPAY_TIMEOUT_SECS",
        "CANTEEN_FIREBASE_PROJECT_ID",
        "CANTEEN_FIREBASE_TIMEOUT_SECS",
        "CANTEEN_UTC_OFFSET_MINUTES",
        "CANTEEN_ALLOCATION_MAX_ATTEMPTS",
        "CANTEEN_FEED_POLL_INTERVAL_MS",
        "CANTEEN_REAP_INTERVAL_SECS",
        "CANTEEN_REAP_MAX_ATTEMPTS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
