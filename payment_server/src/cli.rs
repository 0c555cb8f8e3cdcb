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
    // Only variables without secrets in them
    const DISPLAY_ENVS: [&str; 9] = [
        "RUST_LOG",
        "POD_HOST",
        "POD_PORT",
        "POD_DATABASE_URL",
        "POD_RAZORPAY_API_URL",
        "POD_RAZORPAY_KEY_ID",
        "POD_RAZORPAY_HMAC_CHECKS",
        "POD_USE_X_FORWARDED_FOR",
        "POD_USE_FORWARDED",
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
